pub mod attendance;
pub mod mail;
pub mod report;
