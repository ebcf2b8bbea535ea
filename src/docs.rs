use crate::api::admin::{AdminReport, BulkUpdateReq, UpdateStatusReq};
use crate::api::expense::CreateExpense;
use crate::ledger::reports::{CategoryTotal, CompanyMetrics, TransactionRow, UserSummary};
use crate::ledger::workflow::{BulkUpdate, StatusUpdate};
use crate::model::expense::{Expense, ExpenseStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Expense Management API",
        version = "1.0.0",
        description = r#"
## Staff Expense Management System

Tracks staff expense submissions against per-user monthly budgets and routes
them through an approval workflow.

### 🔹 Key Features
- **Expense Submission**
  - Submit expenses; overruns against the monthly budget are flagged at submission time
- **Approval Workflow**
  - Admins approve/reject single expenses or whole batches atomically
- **Reporting**
  - Per-user summaries, category analytics and company-wide metrics

### 🔐 Security
Endpoints under `/api` are protected using **JWT Bearer authentication**.
Workflow and reporting operations require the **Admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::expense::submit_expense,

        crate::api::admin::update_status,
        crate::api::admin::bulk_update,
        crate::api::admin::admin_reports,
        crate::api::admin::category_analytics
    ),
    components(
        schemas(
            CreateExpense,
            Expense,
            ExpenseStatus,
            UpdateStatusReq,
            BulkUpdateReq,
            StatusUpdate,
            BulkUpdate,
            AdminReport,
            CompanyMetrics,
            UserSummary,
            CategoryTotal,
            TransactionRow
        )
    ),
    tags(
        (name = "Expenses", description = "Expense submission APIs"),
        (name = "Admin", description = "Approval workflow and reporting APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
