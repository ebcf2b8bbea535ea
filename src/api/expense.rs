use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::ledger::{LedgerError, budget};
use crate::model::expense::Expense;

#[derive(Deserialize, ToSchema)]
pub struct CreateExpense {
    #[schema(example = 249.99)]
    pub amount: f64,

    #[schema(example = "Travel")]
    pub category: String,
}

/* =========================
Submit expense
========================= */
/// Swagger doc for submit_expense endpoint
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body(
        content = CreateExpense,
        description = "Expense submission payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Expense admitted", body = Expense),
        (status = 400, description = "Invalid amount/category or unknown user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Expenses"
)]
pub async fn submit_expense(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateExpense>,
) -> actix_web::Result<impl Responder> {
    // The owner is always the caller; clients cannot submit on behalf of
    // someone else.
    match budget::submit_expense(
        pool.get_ref(),
        &auth.user_id,
        payload.amount,
        &payload.category,
    )
    .await
    {
        Ok(expense) => Ok(HttpResponse::Created().json(expense)),
        Err(
            e @ (LedgerError::UserNotFound(_)
            | LedgerError::InvalidAmount
            | LedgerError::InvalidCategory),
        ) => Ok(HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))),
        Err(e) => {
            tracing::error!(error = %e, user_id = %auth.user_id, "Failed to submit expense");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}
