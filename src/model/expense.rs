use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Canonical status set for an expense. Transitions are unrestricted within
/// the set; anything outside it is rejected before any write.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "u_7f9c2ba4")]
    pub user_id: String,

    #[schema(example = 249.99)]
    pub amount: f64,

    #[schema(example = "Travel")]
    pub category: String,

    #[schema(example = "Pending")]
    pub status: String,

    /// Snapshot taken at submission time; never recomputed on later status
    /// changes.
    #[schema(example = false)]
    pub is_over_budget: bool,
}
