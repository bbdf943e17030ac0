use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Hour {
    #[schema(example = 1)]
    pub id: i64,

    /// Free-form label, only unique per section in practice.
    #[schema(example = "9-10")]
    pub time_slot: String,

    #[serde(skip_serializing)]
    pub section_id: i64,
}
