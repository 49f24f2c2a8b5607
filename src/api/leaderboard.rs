use super::helper;
use crate::errors::AppError;
use crate::leaderboard::{self, LeaderboardEntry, SubmissionRow};
use crate::response::ApiResponse;
use crate::schema::contests::dsl as contests_dsl;
use crate::schema::submissions::dsl as subs_dsl;
use crate::schema::users;
use axum::extract::{Path, State};
use deadpool_diesel::sqlite::Pool;
use diesel::prelude::*;
use tracing::instrument;

/// Current standings for a contest, recomputed from the submission snapshot
/// on every request (the client re-polls every 10 seconds; nothing is
/// cached server-side).
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<LeaderboardEntry>`, best rank first (200 OK).
/// * `404 Not Found`: If the contest does not exist.
#[instrument(skip(pool))]
pub async fn get_leaderboard(
    State(pool): State<Pool>,
    Path(contest_id): Path<i32>,
) -> Result<ApiResponse<Vec<LeaderboardEntry>>, AppError> {
    let contest_start = helper::run_query(&pool, move |conn_sync| {
        contests_dsl::contests
            .find(contest_id)
            .select(contests_dsl::start_time)
            .first::<chrono::NaiveDateTime>(conn_sync)
            .optional()
    })
    .await?;
    let Some(contest_start) = contest_start else {
        return Err(AppError::NotFound("Contest not found".to_string()));
    };

    let rows = helper::run_query(&pool, move |conn_sync| {
        subs_dsl::submissions
            .inner_join(users::table)
            .filter(subs_dsl::contest_id.eq(Some(contest_id)))
            .select((
                subs_dsl::user_id,
                users::name,
                subs_dsl::problem_id,
                subs_dsl::status,
                subs_dsl::created_at,
            ))
            .load::<SubmissionRow>(conn_sync)
    })
    .await?;

    Ok(ApiResponse::ok(leaderboard::standings(contest_start, rows)))
}
