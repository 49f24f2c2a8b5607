use super::helper;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::model::testcase::{NewTestcase, Testcase, TestcaseCreated};
use crate::payloads::testcase::{CreateTestcasePayload, TestcasesParams};
use crate::response::ApiResponse;
use crate::schema::problems::dsl as problems_dsl;
use crate::schema::testcases::dsl as testcases_dsl;
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::Utc;
use deadpool_diesel::sqlite::Pool;
use diesel::prelude::*;
use tracing::{info, instrument};

/// Adds a testcase to a problem.
///
/// Returns (wrapped in `ApiResponse`)
/// * `TestcaseCreated`: id/problem/visibility only; hidden data is not
///   echoed back (200 OK).
/// * `400 Bad Request`: If input or expected_output is empty.
/// * `404 Not Found`: If the problem does not exist.
#[instrument(skip(pool, payload))]
pub async fn create_testcase(
    State(pool): State<Pool>,
    _user: AuthUser,
    Json(payload): Json<CreateTestcasePayload>,
) -> Result<ApiResponse<TestcaseCreated>, AppError> {
    if payload.input.is_empty() || payload.expected_output.is_empty() {
        return Err(AppError::BadRequest(
            "Input and expected_output are required".to_string(),
        ));
    }

    let problem_id = payload.problem_id;
    let exists = helper::run_query(&pool, move |conn_sync| {
        problems_dsl::problems
            .find(problem_id)
            .select(problems_dsl::id)
            .first::<i32>(conn_sync)
            .optional()
    })
    .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Problem not found".to_string()));
    }

    let new_testcase = NewTestcase {
        problem_id: payload.problem_id,
        input: payload.input,
        expected_output: payload.expected_output,
        is_sample: payload.is_sample,
        created_at: Utc::now().naive_utc(),
    };

    let testcase_id = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(testcases_dsl::testcases)
            .values(&new_testcase)
            .returning(crate::schema::testcases::id)
            .get_result::<i32>(conn_sync)
    })
    .await?;

    info!(
        "Created {} testcase {} for problem {}",
        if payload.is_sample { "sample" } else { "hidden" },
        testcase_id,
        payload.problem_id
    );
    Ok(ApiResponse::ok(TestcaseCreated {
        id: testcase_id,
        problem_id: payload.problem_id,
        is_sample: payload.is_sample,
    }))
}

/// Lists a problem's sample testcases. Hidden testcases never leave the
/// server, regardless of who asks.
#[instrument(skip(pool))]
pub async fn list_sample_testcases(
    State(pool): State<Pool>,
    Query(params): Query<TestcasesParams>,
) -> Result<ApiResponse<Vec<Testcase>>, AppError> {
    let samples = helper::run_query(&pool, move |conn_sync| {
        testcases_dsl::testcases
            .filter(
                testcases_dsl::problem_id
                    .eq(params.problem_id)
                    .and(testcases_dsl::is_sample.eq(true)),
            )
            .order(testcases_dsl::id.asc())
            .load::<Testcase>(conn_sync)
    })
    .await?;

    Ok(ApiResponse::ok(samples))
}
