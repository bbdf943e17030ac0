use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

/// Rendered form of the boolean status column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
pub enum Presence {
    Present,
    Absent,
}

impl From<bool> for Presence {
    fn from(status: bool) -> Self {
        if status {
            Presence::Present
        } else {
            Presence::Absent
        }
    }
}

/// One attendance mark as submitted by the client.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    #[schema(example = 1)]
    pub student_id: i64,

    #[schema(example = 1)]
    pub hour_id: i64,

    #[schema(example = true)]
    pub status: bool,
}

/// Today's record for an hour, joined with its student.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 12)]
    pub id: i64,

    #[schema(example = 1)]
    pub student_id: i64,

    #[schema(example = "Aditya")]
    pub name: String,

    #[schema(example = "22331A1201")]
    pub reg_no: String,

    #[schema(example = true)]
    pub status: bool,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub present: Vec<crate::model::student::Student>,
    pub absent: Vec<crate::model::student::Student>,
}
