use crate::schema::contests;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Serialize, Deserialize, Debug)]
pub struct Contest {
    pub id: i32,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}

impl Contest {
    /// A contest is open iff `now` lies in [start_time, end_time).
    pub fn is_open_at(&self, now: NaiveDateTime) -> bool {
        self.start_time <= now && now < self.end_time
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = contests)]
pub struct NewContest {
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}
