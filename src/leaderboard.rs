use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minutes charged for every non-accepted attempt made before a problem's
/// first accept.
const WRONG_ATTEMPT_PENALTY_MINUTES: i64 = 20;

/// One scored submission row, as loaded from the submission snapshot.
#[derive(Queryable, Debug, Clone)]
pub struct SubmissionRow {
    pub user_id: i32,
    pub user_name: String,
    pub problem_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: i32,
    pub user_name: String,
    pub solved_count: i64,
    /// Minutes: time-to-first-accept per solved problem, plus 20 per wrong
    /// attempt before that accept. Unsolved problems contribute nothing.
    pub penalty: i64,
    /// Latest first-accept instant across the user's solved problems.
    pub last_submission_time: Option<NaiveDateTime>,
}

#[derive(Default)]
struct ProblemScore {
    wrong_before_accept: i64,
    accepted_at: Option<NaiveDateTime>,
}

/// Derives standings from a snapshot of a contest's submissions. Pure: ranking
/// is recomputed from scratch on every call, never incrementally patched.
///
/// Only terminal submissions score; `pending`/`running` rows are invisible.
/// Order: solved_count desc, penalty asc, earliest last-accept asc (users who
/// solved nothing sort after everyone in their tie group by name for
/// determinism).
pub fn standings(contest_start: NaiveDateTime, mut rows: Vec<SubmissionRow>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.problem_id.cmp(&b.problem_id)));

    let mut names: BTreeMap<i32, String> = BTreeMap::new();
    let mut scores: BTreeMap<(i32, i32), ProblemScore> = BTreeMap::new();

    for row in rows {
        match row.status.as_str() {
            "pending" | "running" => continue,
            _ => {}
        }

        names.entry(row.user_id).or_insert(row.user_name);
        let score = scores.entry((row.user_id, row.problem_id)).or_default();
        if score.accepted_at.is_some() {
            // Attempts after the first accept never change the standings.
            continue;
        }
        if row.status == "accepted" {
            score.accepted_at = Some(row.created_at);
        } else {
            score.wrong_before_accept += 1;
        }
    }

    let mut entries: Vec<LeaderboardEntry> = names
        .into_iter()
        .map(|(user_id, user_name)| {
            let mut solved_count = 0;
            let mut penalty = 0;
            let mut last_accept: Option<NaiveDateTime> = None;

            for ((uid, _), score) in scores.range((user_id, i32::MIN)..=(user_id, i32::MAX)) {
                debug_assert_eq!(*uid, user_id);
                let Some(accepted_at) = score.accepted_at else {
                    continue;
                };
                solved_count += 1;
                penalty += (accepted_at - contest_start).num_minutes()
                    + WRONG_ATTEMPT_PENALTY_MINUTES * score.wrong_before_accept;
                last_accept = last_accept.max(Some(accepted_at));
            }

            LeaderboardEntry {
                user_id,
                user_name,
                solved_count,
                penalty,
                last_submission_time: last_accept,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.solved_count
            .cmp(&a.solved_count)
            .then_with(|| a.penalty.cmp(&b.penalty))
            .then_with(|| {
                let a_t = a.last_submission_time.unwrap_or(NaiveDateTime::MAX);
                let b_t = b.last_submission_time.unwrap_or(NaiveDateTime::MAX);
                a_t.cmp(&b_t)
            })
            .then_with(|| a.user_name.cmp(&b.user_name))
    });

    entries
}
