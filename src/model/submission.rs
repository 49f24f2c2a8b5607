use crate::schema::submissions;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct Submission {
    pub id: i32,
    pub user_id: i32,
    pub problem_id: i32,
    pub contest_id: Option<i32>,
    pub language: String,
    pub code: String,
    pub status: String,
    pub score: i32,
    pub runtime: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = submissions)]
pub struct NewSubmission {
    pub user_id: i32,
    pub problem_id: i32,
    pub contest_id: Option<i32>,
    pub language: String,
    pub code: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// List view; omits the source text.
#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct SubmissionSummary {
    pub id: i32,
    pub user_id: i32,
    pub problem_id: i32,
    pub contest_id: Option<i32>,
    pub language: String,
    pub status: String,
    pub score: i32,
    pub runtime: i32,
    pub created_at: NaiveDateTime,
}

/// Returned by intake; the client polls `GET /api/submission/{id}` with this id.
#[derive(Serialize, Deserialize, Debug)]
pub struct SubmissionReceipt {
    pub submission_id: i32,
    pub status: String,
}
