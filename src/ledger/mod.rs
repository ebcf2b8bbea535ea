pub mod budget;
pub mod reports;
pub mod workflow;

use derive_more::Display;

/// Failures the ledger engine reports to its callers. Handlers translate
/// these into user-facing responses; `Database` stays opaque on the wire.
#[derive(Debug, Display)]
pub enum LedgerError {
    #[display(fmt = "no user found with id {}", _0)]
    UserNotFound(String),

    #[display(fmt = "amount must be greater than zero")]
    InvalidAmount,

    #[display(fmt = "category must be at least 3 characters")]
    InvalidCategory,

    #[display(fmt = "invalid status: {}", _0)]
    InvalidStatus(String),

    #[display(fmt = "expense record {} not found", _0)]
    ExpenseNotFound(i64),

    #[display(fmt = "bulk update transaction failed")]
    BulkUpdateFailed,

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Database(e)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection in-memory database with the production schema.
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory sqlite");

        crate::db::create_schema(&pool)
            .await
            .expect("Failed to create schema");

        pool
    }

    pub async fn seed_user(pool: &SqlitePool, id: &str, name: &str, monthly_budget: Option<f64>) {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, role, monthly_budget)
            VALUES (?, ?, ?, 'not-a-real-hash', 'Staff', ?)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(format!("{id}@example.com"))
        .bind(monthly_budget)
        .execute(pool)
        .await
        .expect("Failed to seed user");
    }

    pub async fn seed_expense(
        pool: &SqlitePool,
        user_id: &str,
        amount: f64,
        category: &str,
        status: &str,
    ) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO expenses (user_id, amount, category, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(category)
        .bind(status)
        .execute(pool)
        .await
        .expect("Failed to seed expense")
        .last_insert_rowid()
    }

    pub async fn expense_status(pool: &SqlitePool, id: i64) -> String {
        sqlx::query_scalar("SELECT status FROM expenses WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .expect("Failed to read expense status")
    }
}
