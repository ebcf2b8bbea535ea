use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::ledger::reports::{CompanyMetrics, TransactionRow, UserSummary};
use crate::ledger::workflow::BulkUpdate;
use crate::ledger::{LedgerError, reports, workflow};

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    #[schema(example = "Approved")]
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkUpdateReq {
    #[schema(example = json!([1, 2, 3]))]
    pub ids: Vec<i64>,
    #[schema(example = "Rejected")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct AdminReport {
    #[schema(example = "Executive Expense Overview")]
    pub title: String,
    pub metrics: CompanyMetrics,
    pub summary: Vec<UserSummary>,
    pub all_transactions: Vec<TransactionRow>,
}

/* =========================
Single status change (Admin)
========================= */
/// Swagger doc for update_status endpoint
#[utoipa::path(
    patch,
    path = "/api/admin/expenses/{expense_id}/status",
    params(
        ("expense_id" = i64, Path, description = "ID of the expense to update")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "Expense 7 has been approved",
            "data": { "id": 7, "status": "Approved" }
        })),
        (status = 400, description = "Status outside the canonical set"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Expense record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let expense_id = path.into_inner();

    match workflow::set_status(pool.get_ref(), expense_id, &body.status).await {
        Ok(updated) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("Expense {} has been {}", updated.id, updated.status.to_lowercase()),
            "data": updated
        }))),
        Err(LedgerError::InvalidStatus(_)) => Ok(HttpResponse::BadRequest().json(json!({
            "error": "Invalid status. Use Pending, Approved, or Rejected."
        }))),
        Err(LedgerError::ExpenseNotFound(_)) => Ok(HttpResponse::NotFound().json(json!({
            "error": "Expense record not found."
        }))),
        Err(e) => {
            tracing::error!(error = %e, expense_id, "Status update failed");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Bulk status change (Admin)
========================= */
/// Swagger doc for bulk_update endpoint
#[utoipa::path(
    post,
    path = "/api/admin/expenses/bulk-update",
    request_body = BulkUpdateReq,
    responses(
        (status = 200, description = "All matching rows updated", body = BulkUpdate),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Transaction failed; nothing was changed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn bulk_update(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    body: web::Json<BulkUpdateReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    match workflow::bulk_set_status(pool.get_ref(), &body.ids, &body.status).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "message": "Bulk update successful",
            "updatedCount": result.updated_count,
            "ids": result.ids
        }))),
        // atomicity is the guarantee; no partial-failure diagnosis on the wire
        Err(_) => Ok(HttpResponse::InternalServerError().json(json!({
            "error": "Transaction failed. No changes were made."
        }))),
    }
}

/* =========================
Executive report (Admin)
========================= */
/// Swagger doc for admin_reports endpoint
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    responses(
        (status = 200, description = "Company metrics, per-user summaries and the raw listing", body = AdminReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn admin_reports(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let summary = reports::user_summaries(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to compute user summaries");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let all_transactions = reports::all_transactions(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch transaction listing");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // derived in process from the rows above, never queried separately
    let metrics = reports::company_metrics(&summary);

    Ok(HttpResponse::Ok().json(AdminReport {
        title: "Executive Expense Overview".to_string(),
        metrics,
        summary,
        all_transactions,
    }))
}

/* =========================
Category analytics (Admin)
========================= */
/// Swagger doc for category_analytics endpoint
#[utoipa::path(
    get,
    path = "/api/admin/analytics/categories",
    responses(
        (status = 200, description = "Approved spend per category, descending", body = [crate::ledger::reports::CategoryTotal]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn category_analytics(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let data = reports::category_breakdown(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to compute category breakdown");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(data))
}
