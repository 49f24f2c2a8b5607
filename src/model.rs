pub mod contest;
pub mod problem;
pub mod submission;
pub mod testcase;
pub mod user;
