pub mod ranking;
pub mod user;
