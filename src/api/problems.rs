use super::helper;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::model::problem::{NewProblem, Problem};
use crate::payloads::problem::{CreateProblemPayload, ProblemsParams};
use crate::response::ApiResponse;
use crate::schema::contests::dsl as contests_dsl;
use crate::schema::problems::dsl as problems_dsl;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use deadpool_diesel::sqlite::Pool;
use diesel::prelude::*;
use tracing::{info, instrument};

const DEFAULT_TIME_LIMIT_MS: i32 = 1000;
const DEFAULT_MEMORY_LIMIT_MB: i32 = 256;

/// Creates a problem, optionally attached to a contest.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Problem`: the created problem (200 OK).
/// * `400 Bad Request`: If title or statement is empty.
/// * `404 Not Found`: If contest_id is given but unknown.
///
/// Non-positive or missing limits fall back to 1000 ms / 256 MB.
#[instrument(skip(pool, payload))]
pub async fn create_problem(
    State(pool): State<Pool>,
    _user: AuthUser,
    Json(payload): Json<CreateProblemPayload>,
) -> Result<ApiResponse<Problem>, AppError> {
    if payload.title.trim().is_empty() || payload.statement.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Title and statement are required".to_string(),
        ));
    }

    if let Some(contest_id) = payload.contest_id {
        let exists = helper::run_query(&pool, move |conn_sync| {
            contests_dsl::contests
                .find(contest_id)
                .select(contests_dsl::id)
                .first::<i32>(conn_sync)
                .optional()
        })
        .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Contest not found".to_string()));
        }
    }

    let new_problem = NewProblem {
        contest_id: payload.contest_id,
        title: payload.title,
        statement: payload.statement,
        time_limit: payload.time_limit.filter(|v| *v > 0).unwrap_or(DEFAULT_TIME_LIMIT_MS),
        memory_limit: payload
            .memory_limit
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MEMORY_LIMIT_MB),
        created_at: Utc::now().naive_utc(),
    };

    let problem = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(problems_dsl::problems)
            .values(&new_problem)
            .get_result::<Problem>(conn_sync)
    })
    .await?;

    info!("Created problem {}", problem.id);
    Ok(ApiResponse::ok(problem))
}

/// Lists a contest's problems in id order.
#[instrument(skip(pool))]
pub async fn list_contest_problems(
    State(pool): State<Pool>,
    _user: AuthUser,
    Query(params): Query<ProblemsParams>,
) -> Result<ApiResponse<Vec<Problem>>, AppError> {
    let problems = helper::run_query(&pool, move |conn_sync| {
        problems_dsl::problems
            .filter(problems_dsl::contest_id.eq(Some(params.contest_id)))
            .order(problems_dsl::id.asc())
            .load::<Problem>(conn_sync)
    })
    .await?;

    Ok(ApiResponse::ok(problems))
}

/// Fetches a single problem (statement included).
#[instrument(skip(pool))]
pub async fn get_problem(
    State(pool): State<Pool>,
    Path(problem_id): Path<i32>,
) -> Result<ApiResponse<Problem>, AppError> {
    let problem = helper::run_query(&pool, move |conn_sync| {
        problems_dsl::problems
            .find(problem_id)
            .first::<Problem>(conn_sync)
            .optional()
    })
    .await?;

    problem
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))
}
