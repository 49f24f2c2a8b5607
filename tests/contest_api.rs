use axum::http::StatusCode;
use codesprint_server::model::contest::Contest;
use codesprint_server::model::problem::Problem;
use codesprint_server::model::testcase::{Testcase, TestcaseCreated};
use codesprint_server::response::ApiResponse;
use serde_json::json;

mod helpers;
use helpers::{
    create_test_contest, create_test_problem, create_test_testcase, setup_test_environment,
    signup_user,
};

// contests

#[tokio::test]
async fn test_create_contest_success() {
    let app = setup_test_environment().await;
    let (user_id, token) = signup_user(&app.server, "Ada", "ada@example.com").await;

    let response = app
        .server
        .post("/api/contests")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Autumn Round",
            "start_time": "2026-09-01T10:00:00Z",
            "end_time": "2026-09-01T12:00:00Z",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<Contest> = response.json();
    let contest = body.data.unwrap();
    assert_eq!(contest.title, "Autumn Round");
    assert_eq!(contest.created_by, user_id);
    assert!(contest.start_time < contest.end_time);
}

#[tokio::test]
async fn test_create_contest_end_before_start_bad_request() {
    let app = setup_test_environment().await;
    let (_, token) = signup_user(&app.server, "Ada", "ada@example.com").await;

    let response = app
        .server
        .post("/api/contests")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Backwards Round",
            "start_time": "2026-09-01T12:00:00Z",
            "end_time": "2026-09-01T10:00:00Z",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_contest_empty_title_bad_request() {
    let app = setup_test_environment().await;
    let (_, token) = signup_user(&app.server, "Ada", "ada@example.com").await;

    let response = app
        .server
        .post("/api/contests")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "   ",
            "start_time": "2026-09-01T10:00:00Z",
            "end_time": "2026-09-01T12:00:00Z",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_contests_public_and_newest_first() {
    let app = setup_test_environment().await;
    let (user_id, _) = signup_user(&app.server, "Ada", "ada@example.com").await;
    let first = create_test_contest(&app.pool, user_id, "First", -120, -60).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    let second = create_test_contest(&app.pool, user_id, "Second", -30, 30).await;

    // No bearer token: listings are public.
    let response = app.server.get("/api/contests").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<Vec<Contest>> = response.json();
    let contests = body.data.unwrap();
    assert_eq!(contests.len(), 2);
    assert_eq!(contests[0].id, second);
    assert_eq!(contests[1].id, first);
}

#[tokio::test]
async fn test_get_contest_not_found() {
    let app = setup_test_environment().await;

    let response = app.server.get("/api/contest/9999").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: ApiResponse<Contest> = response.json();
    assert_eq!(body.status_message, "Contest not found");
}

// problems

#[tokio::test]
async fn test_create_problem_applies_default_limits() {
    let app = setup_test_environment().await;
    let (user_id, token) = signup_user(&app.server, "Ada", "ada@example.com").await;
    let contest_id = create_test_contest(&app.pool, user_id, "Round", -30, 60).await;

    let response = app
        .server
        .post("/api/problems")
        .authorization_bearer(&token)
        .json(&json!({
            "contest_id": contest_id,
            "title": "Echo",
            "statement": "Print the input.",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<Problem> = response.json();
    let problem = body.data.unwrap();
    assert_eq!(problem.contest_id, Some(contest_id));
    assert_eq!(problem.time_limit, 1000);
    assert_eq!(problem.memory_limit, 256);
}

#[tokio::test]
async fn test_create_problem_rejects_non_positive_limits() {
    let app = setup_test_environment().await;
    let (_, token) = signup_user(&app.server, "Ada", "ada@example.com").await;

    let response = app
        .server
        .post("/api/problems")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Echo",
            "statement": "Print the input.",
            "time_limit": 0,
            "memory_limit": -5,
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<Problem> = response.json();
    let problem = body.data.unwrap();
    // Unusable limits fall back to the defaults instead of being stored.
    assert_eq!(problem.time_limit, 1000);
    assert_eq!(problem.memory_limit, 256);
}

#[tokio::test]
async fn test_create_problem_unknown_contest_not_found() {
    let app = setup_test_environment().await;
    let (_, token) = signup_user(&app.server, "Ada", "ada@example.com").await;

    let response = app
        .server
        .post("/api/problems")
        .authorization_bearer(&token)
        .json(&json!({
            "contest_id": 9999,
            "title": "Echo",
            "statement": "Print the input.",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_contest_problems_requires_auth_and_filters() {
    let app = setup_test_environment().await;
    let (user_id, token) = signup_user(&app.server, "Ada", "ada@example.com").await;
    let contest_a = create_test_contest(&app.pool, user_id, "A", -30, 60).await;
    let contest_b = create_test_contest(&app.pool, user_id, "B", -30, 60).await;
    let p1 = create_test_problem(&app.pool, Some(contest_a), "P1").await;
    let p2 = create_test_problem(&app.pool, Some(contest_a), "P2").await;
    let _other = create_test_problem(&app.pool, Some(contest_b), "P3").await;

    let unauthorized = app
        .server
        .get("/api/problems")
        .add_query_param("contest_id", contest_a)
        .await;
    assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get("/api/problems")
        .add_query_param("contest_id", contest_a)
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<Vec<Problem>> = response.json();
    let problems = body.data.unwrap();
    assert_eq!(
        problems.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![p1, p2]
    );
}

#[tokio::test]
async fn test_get_problem_not_found() {
    let app = setup_test_environment().await;

    let response = app.server.get("/api/problem/424242").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// testcases

#[tokio::test]
async fn test_create_testcase_does_not_echo_data() {
    let app = setup_test_environment().await;
    let (_, token) = signup_user(&app.server, "Ada", "ada@example.com").await;
    let problem_id = create_test_problem(&app.pool, None, "Echo").await;

    let response = app
        .server
        .post("/api/testcases")
        .authorization_bearer(&token)
        .json(&json!({
            "problem_id": problem_id,
            "input": "1 2\n",
            "expected_output": "3\n",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<TestcaseCreated> = response.json();
    let created = body.data.unwrap();
    assert_eq!(created.problem_id, problem_id);
    // is_sample defaults to false: a testcase is hidden unless marked.
    assert!(!created.is_sample);
    assert!(!response.text().contains("expected_output"));
}

#[tokio::test]
async fn test_create_testcase_empty_fields_bad_request() {
    let app = setup_test_environment().await;
    let (_, token) = signup_user(&app.server, "Ada", "ada@example.com").await;
    let problem_id = create_test_problem(&app.pool, None, "Echo").await;

    let response = app
        .server
        .post("/api/testcases")
        .authorization_bearer(&token)
        .json(&json!({
            "problem_id": problem_id,
            "input": "",
            "expected_output": "3\n",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_testcases_returns_samples_only() {
    let app = setup_test_environment().await;
    let problem_id = create_test_problem(&app.pool, None, "Echo").await;
    let sample = create_test_testcase(&app.pool, problem_id, "1\n", "1\n", true).await;
    let _hidden = create_test_testcase(&app.pool, problem_id, "secret\n", "secret\n", false).await;

    let response = app
        .server
        .get("/api/testcases")
        .add_query_param("problem_id", problem_id)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<Vec<Testcase>> = response.json();
    let cases = body.data.unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].id, sample);
    assert!(!response.text().contains("secret"));
}
