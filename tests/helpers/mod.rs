use async_trait::async_trait;
use axum::Router;
pub(crate) use axum_test::TestServer;
use chrono::{Duration, NaiveDateTime, Utc};
use codesprint_server::auth::JwtKeys;
use codesprint_server::judge::language::Language;
use codesprint_server::judge::sandbox::{
    Compiled, ExecLimits, RunOutcome, RunStatus, Sandbox, SandboxError,
};
use codesprint_server::judge::{self, JudgeQueue};
use codesprint_server::model::submission::Submission;
use codesprint_server::model::user::AuthResponse;
use codesprint_server::response::ApiResponse;
use codesprint_server::{AppState, apply_schema, init_test_router, schema};
use deadpool_diesel::Runtime;
use deadpool_diesel::sqlite::{Manager, Pool};
use diesel::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// scripted sandbox

/// Sandbox stand-in that reads its behavior out of the submitted "code"
/// instead of executing anything. Directives are whitespace-separated
/// `<key> <n>` pairs:
///
/// * `compile_error`           compilation fails
/// * `wrong_at <n>`            nth run prints the wrong answer
/// * `tle_at <n>` / `mle_at <n>` / `rte_at <n>`   nth run ends with that status
/// * `infra_times <k>`         the first k run calls fail at the sandbox level
///
/// Anything else echoes stdin to stdout, so a testcase whose expected output
/// equals its input is accepted.
#[derive(Clone, Default)]
pub struct ScriptSandbox {
    infra_used: Arc<Mutex<HashMap<String, u32>>>,
    total_runs: Arc<Mutex<HashMap<String, u32>>>,
}

pub struct ScriptArtifact {
    code: String,
    runs: AtomicU32,
}

fn directive(code: &str, key: &str) -> Option<u32> {
    let mut tokens = code.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == key {
            return tokens.next().and_then(|v| v.parse().ok());
        }
    }
    None
}

impl ScriptSandbox {
    /// Total number of `run` calls ever made for this code string, across
    /// compiles and retries.
    pub fn run_count(&self, code: &str) -> u32 {
        *self.total_runs.lock().unwrap().get(code).unwrap_or(&0)
    }
}

#[async_trait]
impl Sandbox for ScriptSandbox {
    type Artifact = ScriptArtifact;

    async fn compile(
        &self,
        _language: Language,
        code: &str,
    ) -> Result<Compiled<ScriptArtifact>, SandboxError> {
        if code.contains("compile_error") {
            return Ok(Compiled::Error {
                stderr: "scripted compile failure".to_string(),
            });
        }
        Ok(Compiled::Ok(ScriptArtifact {
            code: code.to_string(),
            runs: AtomicU32::new(0),
        }))
    }

    async fn run(
        &self,
        artifact: &ScriptArtifact,
        input: &str,
        limits: ExecLimits,
    ) -> Result<RunOutcome, SandboxError> {
        *self
            .total_runs
            .lock()
            .unwrap()
            .entry(artifact.code.clone())
            .or_insert(0) += 1;

        if let Some(budget) = directive(&artifact.code, "infra_times") {
            let mut used = self.infra_used.lock().unwrap();
            let spent = used.entry(artifact.code.clone()).or_insert(0);
            if *spent < budget {
                *spent += 1;
                return Err(SandboxError::Io(std::io::Error::other(
                    "scripted infra failure",
                )));
            }
        }

        let n = artifact.runs.fetch_add(1, Ordering::SeqCst) + 1;

        if directive(&artifact.code, "tle_at") == Some(n) {
            return Ok(RunOutcome {
                status: RunStatus::TimeLimitExceeded,
                stdout: String::new(),
                time_ms: limits.time_limit_ms,
            });
        }
        if directive(&artifact.code, "mle_at") == Some(n) {
            return Ok(RunOutcome {
                status: RunStatus::MemoryLimitExceeded,
                stdout: String::new(),
                time_ms: 5,
            });
        }
        if directive(&artifact.code, "rte_at") == Some(n) {
            return Ok(RunOutcome {
                status: RunStatus::RuntimeError,
                stdout: String::new(),
                time_ms: 5,
            });
        }

        let stdout = if directive(&artifact.code, "wrong_at") == Some(n) {
            "scripted wrong output\n".to_string()
        } else {
            input.to_string()
        };

        Ok(RunOutcome {
            status: RunStatus::Ok,
            stdout,
            time_ms: 5,
        })
    }
}

// test infra setup

pub struct TestApp {
    pub server: TestServer,
    pub pool: Pool,
    pub sandbox: ScriptSandbox,
    pub judge: JudgeQueue,
    _db_dir: TempDir,
}

pub async fn setup_test_environment() -> TestApp {
    let db_dir = TempDir::new().expect("Failed to create temp dir for test db");
    let db_path = db_dir.path().join("test.db");
    let manager = Manager::new(db_path.to_string_lossy(), Runtime::Tokio1);
    let pool = Pool::builder(manager)
        .max_size(5)
        .build()
        .expect("Failed to create test database pool");

    apply_schema(&pool).await.expect("Failed to apply schema");

    let sandbox = ScriptSandbox::default();
    let (queue, jobs) = judge::queue();
    judge::spawn_workers(pool.clone(), jobs, sandbox.clone(), 2);

    let state = AppState {
        pool: pool.clone(),
        jwt: JwtKeys::new("test-secret", 60),
        judge: queue.clone(),
    };
    let app: Router = init_test_router(state);
    let server = TestServer::new(app).expect("Failed to create TestServer");

    TestApp {
        server,
        pool,
        sandbox,
        judge: queue,
        _db_dir: db_dir,
    }
}

// endpoint helpers

/// Registers a user through the API and returns (user_id, bearer token).
/// The password is always "password123".
pub async fn signup_user(server: &TestServer, name: &str, email: &str) -> (i32, String) {
    let response = server
        .post("/api/signup")
        .json(&json!({
            "name": name,
            "email": email,
            "password": "password123",
        }))
        .await;
    assert_eq!(response.status_code(), 200, "signup failed: {}", response.text());
    let body: ApiResponse<AuthResponse> = response.json();
    let auth = body.data.expect("signup returned no data");
    (auth.user.id, auth.token)
}

/// Polls the submission endpoint until the status is terminal.
pub async fn wait_for_verdict(server: &TestServer, submission_id: i32) -> Submission {
    for _ in 0..500 {
        let response = server
            .get(&format!("/api/submission/{}", submission_id))
            .await;
        assert_eq!(response.status_code(), 200);
        let body: ApiResponse<Submission> = response.json();
        let submission = body.data.expect("submission endpoint returned no data");
        if !matches!(submission.status.as_str(), "pending" | "running") {
            return submission;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
    panic!("submission {} never reached a terminal verdict", submission_id);
}

// fixture helpers (direct inserts)

pub async fn create_test_contest(
    pool: &Pool,
    created_by: i32,
    title: &'static str,
    start_offset_min: i64,
    end_offset_min: i64,
) -> i32 {
    let start = Utc::now().naive_utc() + Duration::minutes(start_offset_min);
    let end = Utc::now().naive_utc() + Duration::minutes(end_offset_min);
    let conn = pool.get().await.expect("Failed to get conn for contest insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::contests::table)
            .values((
                schema::contests::title.eq(title),
                schema::contests::start_time.eq(start),
                schema::contests::end_time.eq(end),
                schema::contests::created_by.eq(created_by),
                schema::contests::created_at.eq(Utc::now().naive_utc()),
            ))
            .returning(schema::contests::id)
            .get_result::<i32>(conn)
    })
    .await
    .expect("Interact failed for contest insert")
    .expect("Diesel contest insert failed")
}

pub async fn create_test_problem(pool: &Pool, contest_id: Option<i32>, title: &'static str) -> i32 {
    let conn = pool.get().await.expect("Failed to get conn for problem insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::problems::table)
            .values((
                schema::problems::contest_id.eq(contest_id),
                schema::problems::title.eq(title),
                schema::problems::statement.eq("Echo the input."),
                schema::problems::time_limit.eq(1000),
                schema::problems::memory_limit.eq(256),
                schema::problems::created_at.eq(Utc::now().naive_utc()),
            ))
            .returning(schema::problems::id)
            .get_result::<i32>(conn)
    })
    .await
    .expect("Interact failed for problem insert")
    .expect("Diesel problem insert failed")
}

pub async fn create_test_testcase(
    pool: &Pool,
    problem_id: i32,
    input: &'static str,
    expected_output: &'static str,
    is_sample: bool,
) -> i32 {
    let conn = pool.get().await.expect("Failed to get conn for testcase insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::testcases::table)
            .values((
                schema::testcases::problem_id.eq(problem_id),
                schema::testcases::input.eq(input),
                schema::testcases::expected_output.eq(expected_output),
                schema::testcases::is_sample.eq(is_sample),
                schema::testcases::created_at.eq(Utc::now().naive_utc()),
            ))
            .returning(schema::testcases::id)
            .get_result::<i32>(conn)
    })
    .await
    .expect("Interact failed for testcase insert")
    .expect("Diesel testcase insert failed")
}

/// Inserts a submission row directly, bypassing intake and the judge, so
/// leaderboard tests can craft exact verdict timelines.
pub async fn insert_submission_at(
    pool: &Pool,
    user_id: i32,
    problem_id: i32,
    contest_id: i32,
    status: &'static str,
    created_at: NaiveDateTime,
) -> i32 {
    let conn = pool.get().await.expect("Failed to get conn for submission insert");
    conn.interact(move |conn| {
        diesel::insert_into(schema::submissions::table)
            .values((
                schema::submissions::user_id.eq(user_id),
                schema::submissions::problem_id.eq(problem_id),
                schema::submissions::contest_id.eq(Some(contest_id)),
                schema::submissions::language.eq("python3"),
                schema::submissions::code.eq("print(input())"),
                schema::submissions::status.eq(status),
                schema::submissions::score.eq(if status == "accepted" { 100 } else { 0 }),
                schema::submissions::runtime.eq(0),
                schema::submissions::created_at.eq(created_at),
            ))
            .returning(schema::submissions::id)
            .get_result::<i32>(conn)
    })
    .await
    .expect("Interact failed for submission insert")
    .expect("Diesel submission insert failed")
}

pub async fn submission_count(pool: &Pool) -> i64 {
    let conn = pool.get().await.expect("Failed to get conn for count");
    conn.interact(|conn| {
        schema::submissions::table
            .count()
            .get_result::<i64>(conn)
    })
    .await
    .expect("Interact failed for count")
    .expect("Diesel count failed")
}
