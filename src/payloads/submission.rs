use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmitCodePayload {
    pub problem_id: i32,
    pub contest_id: Option<i32>,
    pub language: String,
    pub code: String,
}

#[derive(Deserialize, Debug)]
pub struct SubmissionsParams {
    pub contest_id: i32,
}
