pub mod attendance;
pub mod hour;
pub mod section;
pub mod student;
pub mod user;
