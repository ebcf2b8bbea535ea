use sqlx::{SqliteConnection, SqlitePool};

use crate::ledger::LedgerError;
use crate::model::expense::{Expense, ExpenseStatus};

/// Outcome of the submission-time budget check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetDecision {
    /// Sum of the user's non-Rejected expense amounts before this submission.
    pub current_spend: f64,
    pub is_over_budget: bool,
}

/// Reads the user's running non-rejected spend and decides whether the
/// proposed amount pushes them over their monthly budget. Pure read; the
/// caller owns the transaction so the decision and the insert that follows
/// see the same state.
pub async fn evaluate(
    conn: &mut SqliteConnection,
    user_id: &str,
    proposed_amount: f64,
) -> Result<BudgetDecision, LedgerError> {
    // Upstream validation already checked this; re-check anyway.
    if proposed_amount <= 0.0 {
        return Err(LedgerError::InvalidAmount);
    }

    let monthly_budget: Option<f64> =
        sqlx::query_scalar("SELECT COALESCE(monthly_budget, 1000.0) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    let monthly_budget = match monthly_budget {
        Some(b) => b,
        None => return Err(LedgerError::UserNotFound(user_id.to_string())),
    };

    // Pending and Approved both consume budget; Rejected does not.
    let current_spend: f64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount), 0.0)
        FROM expenses
        WHERE user_id = ? AND status != 'Rejected'
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(BudgetDecision {
        current_spend,
        is_over_budget: current_spend + proposed_amount > monthly_budget,
    })
}

/// Admits a new expense: budget check and insert run on one transaction, so
/// concurrent submissions for the same user serialize at the store instead
/// of double-counting against the budget. The over-budget flag is frozen
/// here and never recomputed.
pub async fn submit_expense(
    pool: &SqlitePool,
    user_id: &str,
    amount: f64,
    category: &str,
) -> Result<Expense, LedgerError> {
    if amount <= 0.0 {
        return Err(LedgerError::InvalidAmount);
    }
    if category.chars().count() < 3 {
        return Err(LedgerError::InvalidCategory);
    }

    let mut tx = pool.begin().await?;

    let decision = evaluate(&mut tx, user_id, amount).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO expenses (user_id, amount, category, status, is_over_budget)
        VALUES (?, ?, ?, 'Pending', ?)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(category)
    .bind(decision.is_over_budget)
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_rowid();

    tx.commit().await?;

    tracing::debug!(
        user_id,
        expense_id = id,
        current_spend = decision.current_spend,
        over_budget = decision.is_over_budget,
        "Expense admitted"
    );

    Ok(Expense {
        id,
        user_id: user_id.to_string(),
        amount,
        category: category.to_string(),
        status: ExpenseStatus::Pending.to_string(),
        is_over_budget: decision.is_over_budget,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::{memory_pool, seed_expense, seed_user};

    #[actix_web::test]
    async fn pending_and_approved_spend_counts_toward_budget() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", Some(1000.0)).await;
        seed_expense(&pool, "u1", 700.0, "Travel", "Approved").await;

        let expense = submit_expense(&pool, "u1", 400.0, "Meals").await.unwrap();

        assert!(expense.is_over_budget);
        assert_eq!(expense.status, "Pending");
    }

    #[actix_web::test]
    async fn rejected_spend_is_ignored() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", Some(1000.0)).await;
        seed_expense(&pool, "u1", 700.0, "Travel", "Rejected").await;

        let mut conn = pool.acquire().await.unwrap();
        let decision = evaluate(&mut conn, "u1", 400.0).await.unwrap();

        assert_eq!(decision.current_spend, 0.0);
        assert!(!decision.is_over_budget);
    }

    #[actix_web::test]
    async fn exactly_reaching_the_budget_is_not_an_overrun() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", Some(1000.0)).await;
        seed_expense(&pool, "u1", 700.0, "Travel", "Pending").await;

        let mut conn = pool.acquire().await.unwrap();
        let decision = evaluate(&mut conn, "u1", 300.0).await.unwrap();

        assert_eq!(decision.current_spend, 700.0);
        assert!(!decision.is_over_budget);
    }

    #[actix_web::test]
    async fn missing_budget_falls_back_to_default() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;
        seed_expense(&pool, "u1", 900.0, "Travel", "Approved").await;

        let mut conn = pool.acquire().await.unwrap();
        let decision = evaluate(&mut conn, "u1", 200.0).await.unwrap();

        // 900 + 200 > 1000 default
        assert!(decision.is_over_budget);
    }

    #[actix_web::test]
    async fn unknown_user_is_rejected() {
        let pool = memory_pool().await;

        let err = submit_expense(&pool, "ghost", 10.0, "Misc").await.unwrap_err();
        assert!(matches!(err, LedgerError::UserNotFound(ref id) if id == "ghost"));
    }

    #[actix_web::test]
    async fn non_positive_amounts_are_rejected() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;

        assert!(matches!(
            submit_expense(&pool, "u1", 0.0, "Misc").await.unwrap_err(),
            LedgerError::InvalidAmount
        ));
        assert!(matches!(
            submit_expense(&pool, "u1", -5.0, "Misc").await.unwrap_err(),
            LedgerError::InvalidAmount
        ));
    }

    #[actix_web::test]
    async fn short_category_is_rejected_before_any_write() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;

        let err = submit_expense(&pool, "u1", 10.0, "ab").await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCategory));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[actix_web::test]
    async fn over_budget_flag_is_frozen_at_submission() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", Some(1000.0)).await;
        let prior = seed_expense(&pool, "u1", 700.0, "Travel", "Approved").await;

        let flagged = submit_expense(&pool, "u1", 400.0, "Meals").await.unwrap();
        assert!(flagged.is_over_budget);

        // Rejecting the earlier expense frees budget, but the snapshot stays.
        crate::ledger::workflow::set_status(&pool, prior, "Rejected")
            .await
            .unwrap();

        let still_flagged: bool =
            sqlx::query_scalar("SELECT is_over_budget FROM expenses WHERE id = ?")
                .bind(flagged.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(still_flagged);
    }
}
