use crate::schema::testcases;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct Testcase {
    pub id: i32,
    pub problem_id: i32,
    pub input: String,
    pub expected_output: String,
    pub is_sample: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = testcases)]
pub struct NewTestcase {
    pub problem_id: i32,
    pub input: String,
    pub expected_output: String,
    pub is_sample: bool,
    pub created_at: NaiveDateTime,
}

/// Creation acknowledgement; hidden testcase data is not echoed back.
#[derive(Serialize, Deserialize, Debug)]
pub struct TestcaseCreated {
    pub id: i32,
    pub problem_id: i32,
    pub is_sample: bool,
}
