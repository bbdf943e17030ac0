pub mod attendance;
pub mod catalog;
pub mod pages;
pub mod report;
