pub mod attendance;
pub mod role;
pub mod student;
pub mod user;
