use super::helper;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::judge::language::Language;
use crate::judge::{JudgeJob, JudgeQueue, Verdict};
use crate::model::contest::Contest;
use crate::model::submission::{NewSubmission, Submission, SubmissionReceipt, SubmissionSummary};
use crate::payloads::submission::{SubmissionsParams, SubmitCodePayload};
use crate::response::ApiResponse;
use crate::schema::contests::dsl as contests_dsl;
use crate::schema::problems::dsl as problems_dsl;
use crate::schema::submissions::dsl as subs_dsl;
use crate::schema::testcases::dsl as testcases_dsl;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use deadpool_diesel::sqlite::Pool;
use diesel::dsl::count_star;
use diesel::prelude::*;
use tracing::{info, instrument};

/// Accepts a submission, enqueues it for judging and returns a tracking id.
/// Intake never blocks on execution: the verdict arrives later via
/// `GET /api/submission/{id}`.
///
/// Validation, all before any row or judge job is created:
/// * `400 Bad Request`: unsupported language, empty code, contest outside its
///   [start, end) window, or a problem with no hidden testcases.
/// * `404 Not Found`: unknown problem or contest.
#[instrument(skip(pool, queue, payload))]
pub async fn submit_code(
    State(pool): State<Pool>,
    State(queue): State<JudgeQueue>,
    user: AuthUser,
    Json(payload): Json<SubmitCodePayload>,
) -> Result<ApiResponse<SubmissionReceipt>, AppError> {
    if Language::from_key(&payload.language).is_none() {
        return Err(AppError::BadRequest(format!(
            "Unsupported language: {}",
            payload.language
        )));
    }
    if payload.code.trim().is_empty() {
        return Err(AppError::BadRequest("Code is required".to_string()));
    }

    let problem_id = payload.problem_id;
    let problem_exists = helper::run_query(&pool, move |conn_sync| {
        problems_dsl::problems
            .find(problem_id)
            .select(problems_dsl::id)
            .first::<i32>(conn_sync)
            .optional()
    })
    .await?;
    if problem_exists.is_none() {
        return Err(AppError::NotFound("Problem not found".to_string()));
    }

    if let Some(contest_id) = payload.contest_id {
        let contest = helper::run_query(&pool, move |conn_sync| {
            contests_dsl::contests
                .find(contest_id)
                .first::<Contest>(conn_sync)
                .optional()
        })
        .await?;
        let Some(contest) = contest else {
            return Err(AppError::NotFound("Contest not found".to_string()));
        };
        if !contest.is_open_at(Utc::now().naive_utc()) {
            return Err(AppError::BadRequest("Contest closed".to_string()));
        }
    }

    let hidden_cases = helper::run_query(&pool, move |conn_sync| {
        testcases_dsl::testcases
            .filter(
                testcases_dsl::problem_id
                    .eq(problem_id)
                    .and(testcases_dsl::is_sample.eq(false)),
            )
            .select(count_star())
            .get_result::<i64>(conn_sync)
    })
    .await?;
    if hidden_cases == 0 {
        return Err(AppError::BadRequest(
            "No testcases found for this problem".to_string(),
        ));
    }

    let new_submission = NewSubmission {
        user_id: user.0.sub,
        problem_id: payload.problem_id,
        contest_id: payload.contest_id,
        language: payload.language,
        code: payload.code,
        status: Verdict::Pending.as_str().to_string(),
        created_at: Utc::now().naive_utc(),
    };

    let submission_id = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(subs_dsl::submissions)
            .values(&new_submission)
            .returning(crate::schema::submissions::id)
            .get_result::<i32>(conn_sync)
    })
    .await?;

    queue.enqueue(JudgeJob { submission_id })?;

    info!(
        "User {} submitted {} for problem {}",
        user.0.sub, submission_id, payload.problem_id
    );
    Ok(ApiResponse::ok(SubmissionReceipt {
        submission_id,
        status: Verdict::Pending.as_str().to_string(),
    }))
}

/// Fetches one submission (code included). The client polls this until the
/// status is terminal; reads of a terminal submission are stable.
#[instrument(skip(pool))]
pub async fn get_submission(
    State(pool): State<Pool>,
    Path(submission_id): Path<i32>,
) -> Result<ApiResponse<Submission>, AppError> {
    let submission = helper::run_query(&pool, move |conn_sync| {
        subs_dsl::submissions
            .find(submission_id)
            .first::<Submission>(conn_sync)
            .optional()
    })
    .await?;

    submission
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
}

/// Lists the calling user's submissions in a contest, newest first. Source
/// text is omitted from the listing.
#[instrument(skip(pool))]
pub async fn list_user_submissions(
    State(pool): State<Pool>,
    user: AuthUser,
    Query(params): Query<SubmissionsParams>,
) -> Result<ApiResponse<Vec<SubmissionSummary>>, AppError> {
    let user_id = user.0.sub;
    let submissions = helper::run_query(&pool, move |conn_sync| {
        subs_dsl::submissions
            .filter(
                subs_dsl::user_id
                    .eq(user_id)
                    .and(subs_dsl::contest_id.eq(Some(params.contest_id))),
            )
            .order(subs_dsl::created_at.desc())
            .select((
                subs_dsl::id,
                subs_dsl::user_id,
                subs_dsl::problem_id,
                subs_dsl::contest_id,
                subs_dsl::language,
                subs_dsl::status,
                subs_dsl::score,
                subs_dsl::runtime,
                subs_dsl::created_at,
            ))
            .load::<SubmissionSummary>(conn_sync)
    })
    .await?;

    Ok(ApiResponse::ok(submissions))
}
