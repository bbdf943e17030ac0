use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Student {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "22331A1201")]
    pub reg_no: String,

    #[schema(example = "Aditya")]
    pub name: String,
}
