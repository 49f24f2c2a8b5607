use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateProblemPayload {
    pub contest_id: Option<i32>,
    pub title: String,
    pub statement: String,
    pub time_limit: Option<i32>,
    pub memory_limit: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct ProblemsParams {
    pub contest_id: i32,
}
