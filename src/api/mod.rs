pub mod account;
pub mod attendance;
pub mod report;
pub mod student;
