use super::helper;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::model::contest::{Contest, NewContest};
use crate::payloads::contest::CreateContestPayload;
use crate::response::ApiResponse;
use crate::schema::contests::dsl as contests_dsl;
use axum::extract::{Path, State};
use axum::response::Json;
use chrono::Utc;
use deadpool_diesel::sqlite::Pool;
use diesel::prelude::*;
use tracing::{info, instrument};

/// Creates a contest owned by the calling user.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Contest`: the created contest (200 OK).
/// * `400 Bad Request`: If the title is empty or end_time precedes start_time.
#[instrument(skip(pool, payload))]
pub async fn create_contest(
    State(pool): State<Pool>,
    user: AuthUser,
    Json(payload): Json<CreateContestPayload>,
) -> Result<ApiResponse<Contest>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if payload.end_time < payload.start_time {
        return Err(AppError::BadRequest(
            "End time must be after start time".to_string(),
        ));
    }

    let new_contest = NewContest {
        title: payload.title,
        start_time: payload.start_time.naive_utc(),
        end_time: payload.end_time.naive_utc(),
        created_by: user.0.sub,
        created_at: Utc::now().naive_utc(),
    };

    let contest = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(contests_dsl::contests)
            .values(&new_contest)
            .get_result::<Contest>(conn_sync)
    })
    .await?;

    info!("User {} created contest {}", user.0.sub, contest.id);
    Ok(ApiResponse::ok(contest))
}

/// Lists all contests, newest first.
#[instrument(skip(pool))]
pub async fn list_contests(State(pool): State<Pool>) -> Result<ApiResponse<Vec<Contest>>, AppError> {
    let contests = helper::run_query(&pool, |conn_sync| {
        contests_dsl::contests
            .order(contests_dsl::created_at.desc())
            .load::<Contest>(conn_sync)
    })
    .await?;

    Ok(ApiResponse::ok(contests))
}

/// Fetches a single contest.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Contest` (200 OK).
/// * `404 Not Found`: If no contest has the given id.
#[instrument(skip(pool))]
pub async fn get_contest(
    State(pool): State<Pool>,
    Path(contest_id): Path<i32>,
) -> Result<ApiResponse<Contest>, AppError> {
    let contest = helper::run_query(&pool, move |conn_sync| {
        contests_dsl::contests
            .find(contest_id)
            .first::<Contest>(conn_sync)
            .optional()
    })
    .await?;

    contest
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
}
