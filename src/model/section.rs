use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Section {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "IT-A")]
    pub name: String,
}
