use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

use crate::ledger::LedgerError;

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[schema(example = "Alice")]
    pub staff_name: String,
    #[schema(example = 1200.0)]
    pub approved_total: f64,
    #[schema(example = 300.0)]
    pub pending_total: f64,
    #[schema(example = 80.0)]
    pub rejected_total: f64,
    /// All of the user's expenses regardless of status.
    #[schema(example = 9)]
    pub transaction_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    #[schema(example = "Travel")]
    pub category: String,
    #[schema(example = 950.0)]
    pub total: f64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    #[schema(example = 12)]
    pub id: i64,
    #[schema(example = 42.5)]
    pub amount: f64,
    #[schema(example = "Meals")]
    pub category: String,
    #[schema(example = "Pending")]
    pub status: String,
    #[schema(example = "Alice")]
    pub staff_name: String,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetrics {
    #[schema(example = 4100.0)]
    pub total_spent: f64,
    /// Money avoided by rejecting submissions.
    #[schema(example = 600.0)]
    pub total_saved: f64,
    #[schema(example = 900.0)]
    pub pending_review: f64,
}

/// Per-user totals split by status, one row per user with at least one
/// expense. Recomputed on every call; nothing here is cached or stored.
pub async fn user_summaries(pool: &SqlitePool) -> Result<Vec<UserSummary>, LedgerError> {
    let rows = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT
            users.name AS staff_name,
            COALESCE(SUM(CASE WHEN expenses.status = 'Approved' THEN expenses.amount ELSE 0.0 END), 0.0) AS approved_total,
            COALESCE(SUM(CASE WHEN expenses.status = 'Pending'  THEN expenses.amount ELSE 0.0 END), 0.0) AS pending_total,
            COALESCE(SUM(CASE WHEN expenses.status = 'Rejected' THEN expenses.amount ELSE 0.0 END), 0.0) AS rejected_total,
            COUNT(expenses.id) AS transaction_count
        FROM expenses
        JOIN users ON expenses.user_id = users.id
        GROUP BY users.id, users.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Approved spend per category, largest first. Pending and Rejected
/// expenses never contribute.
pub async fn category_breakdown(pool: &SqlitePool) -> Result<Vec<CategoryTotal>, LedgerError> {
    let rows = sqlx::query_as::<_, CategoryTotal>(
        r#"
        SELECT category, SUM(amount) AS total
        FROM expenses
        WHERE status = 'Approved'
        GROUP BY category
        ORDER BY total DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every expense with its owner's display name, most recent first.
pub async fn all_transactions(pool: &SqlitePool) -> Result<Vec<TransactionRow>, LedgerError> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        r#"
        SELECT
            expenses.id,
            expenses.amount,
            expenses.category,
            expenses.status,
            users.name AS staff_name
        FROM expenses
        JOIN users ON expenses.user_id = users.id
        ORDER BY expenses.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Company-wide figures are derived from the per-user rows the caller
/// already holds, not re-queried.
pub fn company_metrics(summaries: &[UserSummary]) -> CompanyMetrics {
    CompanyMetrics {
        total_spent: summaries.iter().map(|s| s.approved_total).sum(),
        total_saved: summaries.iter().map(|s| s.rejected_total).sum(),
        pending_review: summaries.iter().map(|s| s.pending_total).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::{memory_pool, seed_expense, seed_user};

    async fn seeded_pool() -> SqlitePool {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", Some(1000.0)).await;
        seed_user(&pool, "u2", "Bob", Some(2000.0)).await;

        seed_expense(&pool, "u1", 300.0, "Travel", "Approved").await;
        seed_expense(&pool, "u1", 120.0, "Meals", "Approved").await;
        seed_expense(&pool, "u1", 80.0, "Meals", "Rejected").await;
        seed_expense(&pool, "u2", 500.0, "Travel", "Approved").await;
        seed_expense(&pool, "u2", 200.0, "Office", "Pending").await;
        pool
    }

    #[actix_web::test]
    async fn summaries_split_totals_by_status() {
        let pool = seeded_pool().await;

        let mut rows = user_summaries(&pool).await.unwrap();
        rows.sort_by(|a, b| a.staff_name.cmp(&b.staff_name));

        assert_eq!(rows.len(), 2);
        let alice = &rows[0];
        assert_eq!(alice.staff_name, "Alice");
        assert_eq!(alice.approved_total, 420.0);
        assert_eq!(alice.pending_total, 0.0);
        assert_eq!(alice.rejected_total, 80.0);
        assert_eq!(alice.transaction_count, 3);

        let bob = &rows[1];
        assert_eq!(bob.approved_total, 500.0);
        assert_eq!(bob.pending_total, 200.0);
        assert_eq!(bob.rejected_total, 0.0);
        assert_eq!(bob.transaction_count, 2);
    }

    #[actix_web::test]
    async fn users_without_expenses_do_not_appear() {
        let pool = seeded_pool().await;
        seed_user(&pool, "u3", "Carol", None).await;

        let rows = user_summaries(&pool).await.unwrap();
        assert!(rows.iter().all(|r| r.staff_name != "Carol"));
    }

    #[actix_web::test]
    async fn company_metrics_are_the_sum_of_summary_rows() {
        let pool = seeded_pool().await;

        let summaries = user_summaries(&pool).await.unwrap();
        let metrics = company_metrics(&summaries);

        assert_eq!(metrics.total_spent, 920.0);
        assert_eq!(metrics.total_saved, 80.0);
        assert_eq!(metrics.pending_review, 200.0);
    }

    #[actix_web::test]
    async fn category_breakdown_is_approved_only_and_descending() {
        let pool = seeded_pool().await;

        let rows = category_breakdown(&pool).await.unwrap();

        assert_eq!(rows.len(), 2); // Office is Pending-only, Rejected Meals excluded
        assert_eq!(rows[0].category, "Travel");
        assert_eq!(rows[0].total, 800.0);
        assert_eq!(rows[1].category, "Meals");
        assert_eq!(rows[1].total, 120.0);

        let approved_sum: f64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE status = 'Approved'")
                .fetch_one(&pool)
                .await
                .unwrap();
        let breakdown_sum: f64 = rows.iter().map(|r| r.total).sum();
        assert_eq!(breakdown_sum, approved_sum);
    }

    #[actix_web::test]
    async fn transactions_are_listed_most_recent_first_with_owner_names() {
        let pool = seeded_pool().await;

        let rows = all_transactions(&pool).await.unwrap();

        assert_eq!(rows.len(), 5);
        assert!(rows.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(rows[0].staff_name, "Bob");
        assert_eq!(rows[0].category, "Office");
    }
}
