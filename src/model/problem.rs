use crate::schema::problems;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct Problem {
    pub id: i32,
    pub contest_id: Option<i32>,
    pub title: String,
    pub statement: String,
    /// Per-testcase wall-clock limit, milliseconds.
    pub time_limit: i32,
    /// Address-space ceiling, MB.
    pub memory_limit: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = problems)]
pub struct NewProblem {
    pub contest_id: Option<i32>,
    pub title: String,
    pub statement: String,
    pub time_limit: i32,
    pub memory_limit: i32,
    pub created_at: NaiveDateTime,
}
