use crate::auth::JwtKeys;
use crate::cli::Args;
use crate::judge::JudgeQueue;
use crate::judge::sandbox::ProcessSandbox;
use anyhow::Context;
use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};
use deadpool_diesel::Runtime;
use deadpool_diesel::sqlite::{Manager, Pool};
use diesel::connection::SimpleConnection;
use tracing::info;

pub mod auth;
pub mod cli;
pub mod errors;
pub mod judge;
pub mod leaderboard;
pub mod model;
pub mod payloads;
pub mod response;
pub mod schema;

mod api;

/// Applied on startup; `IF NOT EXISTS` throughout, so re-running is a no-op.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Everything the handlers need, carried explicitly in router state rather
/// than in ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub jwt: JwtKeys,
    pub judge: JudgeQueue,
}

impl FromRef<AppState> for Pool {
    fn from_ref(state: &AppState) -> Pool {
        state.pool.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> JwtKeys {
        state.jwt.clone()
    }
}

impl FromRef<AppState> for JudgeQueue {
    fn from_ref(state: &AppState) -> JudgeQueue {
        state.judge.clone()
    }
}

/// Builds the production application: pool, schema, judge workers, router.
pub async fn init_app(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.database_url, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Applying database schema...");
    apply_schema(&pool)
        .await
        .context("Failed to apply database schema")?;

    info!("Starting {} judge worker(s)...", args.judge_workers);
    let (queue, jobs) = judge::queue();
    judge::spawn_workers(pool.clone(), jobs, ProcessSandbox, args.judge_workers);
    judge::recover_stranded(&pool, &queue)
        .await
        .context("Failed to recover stranded submissions")?;

    let state = AppState {
        pool,
        jwt: JwtKeys::new(&args.jwt_secret, args.jwt_duration_minutes),
        judge: queue,
    };

    info!("Initializing router...");
    Ok(init_router_internal(state))
}

/// Router over caller-supplied state; tests wire in their own pool, keys and
/// judge queue (typically backed by a scripted sandbox).
pub fn init_test_router(state: AppState) -> Router {
    init_router_internal(state)
}

fn init_router_internal(state: AppState) -> Router {
    Router::new().nest("/api", api_routes()).with_state(state)
}

pub fn init_pool(database_url: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(database_url, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

pub async fn apply_schema(pool: &Pool) -> anyhow::Result<()> {
    let conn = pool.get().await.context("Failed to get connection for schema")?;
    conn.interact(|conn| conn.batch_execute(SCHEMA_SQL))
        .await
        .map_err(|e| anyhow::anyhow!("Schema interaction failed: {}", e))?
        .context("Failed to execute schema SQL")?;
    Ok(())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // public routes
        .route("/signup", post(api::auth::signup))
        .route("/login", post(api::auth::login))
        .route("/contest/{id}", get(api::contests::get_contest))
        .route("/problem/{id}", get(api::problems::get_problem))
        .route("/submission/{id}", get(api::submissions::get_submission))
        .route("/leaderboard/{contest_id}", get(api::leaderboard::get_leaderboard))
        // mixed: GET public, POST requires a bearer token (enforced by the
        // AuthUser extractor on the handler)
        .route(
            "/contests",
            get(api::contests::list_contests).post(api::contests::create_contest),
        )
        .route(
            "/testcases",
            get(api::testcases::list_sample_testcases).post(api::testcases::create_testcase),
        )
        // protected routes
        .route(
            "/problems",
            get(api::problems::list_contest_problems).post(api::problems::create_problem),
        )
        .route("/submission", post(api::submissions::submit_code))
        .route("/submissions", get(api::submissions::list_user_submissions))
}
