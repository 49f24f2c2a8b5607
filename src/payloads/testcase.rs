use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateTestcasePayload {
    pub problem_id: i32,
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_sample: bool,
}

#[derive(Deserialize, Debug)]
pub struct TestcasesParams {
    pub problem_id: i32,
}
