use crate::api::attendance::{MarkAttendance, SubmitEntry};
use crate::model::attendance::{AttendanceRecord, AttendanceSummary};
use crate::model::{hour::Hour, section::Section, student::Student};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "0.1.0",
        description = r#"
## Classroom Attendance Tracker

Select a section and hour, mark students present or absent, review the day's
summary and produce PDF reports that are emailed to a fixed recipient list.

### Key Features
- **Catalog**: sections, their hours and their students
- **Attendance**: per-student marks and whole-hour submissions for today
- **Reports**: per-hour (with tally) or whole-section PDF downloads

### Response Format
- JSON for every endpoint except the report download
- Errors carry a `message` field
"#,
    ),
    paths(
        crate::api::catalog::get_sections,
        crate::api::catalog::get_hours,
        crate::api::catalog::get_students,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::submit_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::attendance_summary,

        crate::api::report::generate_report
    ),
    components(
        schemas(
            Section,
            Hour,
            Student,
            AttendanceRecord,
            AttendanceSummary,
            MarkAttendance,
            SubmitEntry
        )
    ),
    tags(
        (name = "Catalog", description = "Sections, hours and students"),
        (name = "Attendance", description = "Attendance marking APIs"),
        (name = "Report", description = "PDF attendance reports"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_json_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/sections",
            "/hours/{section_id}",
            "/students/{section_id}",
            "/mark_attendance",
            "/submit_attendance",
            "/get_attendance/{hour_id}",
            "/attendance_summary/{section_id}/{hour_id}",
            "/generate_report/{section_id}/{date}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
