pub mod auth;
pub mod contests;
pub mod leaderboard;
pub mod problems;
pub mod submissions;
pub mod testcases;

mod helper;
