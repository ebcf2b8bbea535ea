use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::ledger::LedgerError;
use crate::model::expense::ExpenseStatus;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "Approved")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdate {
    #[schema(example = 3)]
    pub updated_count: u64,
    #[schema(example = json!([1, 2, 3]))]
    pub ids: Vec<i64>,
}

/// Applies a single validated status change. The status value is checked
/// against the canonical set before any write; a zero-row update means the
/// expense does not exist.
pub async fn set_status(
    pool: &SqlitePool,
    expense_id: i64,
    new_status: &str,
) -> Result<StatusUpdate, LedgerError> {
    let status: ExpenseStatus = new_status
        .parse()
        .map_err(|_| LedgerError::InvalidStatus(new_status.to_string()))?;

    let result = sqlx::query("UPDATE expenses SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(expense_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::ExpenseNotFound(expense_id));
    }

    Ok(StatusUpdate {
        id: expense_id,
        status: status.to_string(),
    })
}

/// Applies one status to every given id in a single transaction: either all
/// matching rows change or none do. Ids with no matching expense are simply
/// absent from the count. Failures are reported coarsely; callers get
/// atomicity, not a diagnosis.
pub async fn bulk_set_status(
    pool: &SqlitePool,
    ids: &[i64],
    new_status: &str,
) -> Result<BulkUpdate, LedgerError> {
    let status: ExpenseStatus = new_status.parse().map_err(|_| {
        tracing::warn!(status = new_status, "Bulk update with non-canonical status");
        LedgerError::BulkUpdateFailed
    })?;

    if ids.is_empty() {
        return Ok(BulkUpdate {
            updated_count: 0,
            ids: Vec::new(),
        });
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("UPDATE expenses SET status = ? WHERE id IN ({placeholders})");

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open bulk update transaction");
        LedgerError::BulkUpdateFailed
    })?;

    let mut query = sqlx::query(&sql).bind(status.to_string());
    for id in ids {
        query = query.bind(id);
    }

    let result = query.execute(&mut *tx).await.map_err(|e| {
        tracing::error!(error = %e, "Bulk status update failed, rolling back");
        LedgerError::BulkUpdateFailed
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Bulk update commit failed");
        LedgerError::BulkUpdateFailed
    })?;

    Ok(BulkUpdate {
        updated_count: result.rows_affected(),
        ids: ids.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::{expense_status, memory_pool, seed_expense, seed_user};

    #[actix_web::test]
    async fn set_status_updates_the_row() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;
        let id = seed_expense(&pool, "u1", 50.0, "Meals", "Pending").await;

        let updated = set_status(&pool, id, "Approved").await.unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.status, "Approved");
        assert_eq!(expense_status(&pool, id).await, "Approved");
    }

    #[actix_web::test]
    async fn transitions_are_unrestricted_within_the_canonical_set() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;
        let id = seed_expense(&pool, "u1", 50.0, "Meals", "Approved").await;

        // Approved -> Rejected and back to Pending are both allowed.
        set_status(&pool, id, "Rejected").await.unwrap();
        set_status(&pool, id, "Pending").await.unwrap();
        assert_eq!(expense_status(&pool, id).await, "Pending");
    }

    #[actix_web::test]
    async fn non_canonical_status_fails_without_writing() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;
        let id = seed_expense(&pool, "u1", 50.0, "Meals", "Pending").await;

        let err = set_status(&pool, id, "Archived").await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidStatus(ref s) if s == "Archived"));
        assert_eq!(expense_status(&pool, id).await, "Pending");
    }

    #[actix_web::test]
    async fn missing_expense_is_reported() {
        let pool = memory_pool().await;

        let err = set_status(&pool, 999, "Approved").await.unwrap_err();
        assert!(matches!(err, LedgerError::ExpenseNotFound(999)));
    }

    #[actix_web::test]
    async fn bulk_update_skips_unknown_ids_silently() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;
        let a = seed_expense(&pool, "u1", 10.0, "Meals", "Pending").await;
        let b = seed_expense(&pool, "u1", 20.0, "Travel", "Pending").await;

        let result = bulk_set_status(&pool, &[a, b, 999], "Rejected").await.unwrap();

        assert_eq!(result.updated_count, 2);
        assert_eq!(result.ids, vec![a, b, 999]);
        assert_eq!(expense_status(&pool, a).await, "Rejected");
        assert_eq!(expense_status(&pool, b).await, "Rejected");
    }

    #[actix_web::test]
    async fn bulk_update_with_bad_status_changes_nothing() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1", "Alice", None).await;
        let id = seed_expense(&pool, "u1", 10.0, "Meals", "Pending").await;

        let err = bulk_set_status(&pool, &[id], "Shredded").await.unwrap_err();

        assert!(matches!(err, LedgerError::BulkUpdateFailed));
        assert_eq!(expense_status(&pool, id).await, "Pending");
    }

    #[actix_web::test]
    async fn bulk_update_with_no_ids_is_a_noop() {
        let pool = memory_pool().await;

        let result = bulk_set_status(&pool, &[], "Approved").await.unwrap();
        assert_eq!(result.updated_count, 0);
        assert!(result.ids.is_empty());
    }
}
