use clap::Parser;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the SQLite database file (created on first start).
    /// Can also be set using the DATABASE_URL environment variable.
    #[arg(long, env = "DATABASE_URL", default_value = "codesprint.db")]
    pub database_url: String,

    /// Database connection pool size.
    /// Can also be set using the DB_POOL_MAX_SIZE environment variable.
    /// Default value: 10
    #[arg(long, env = "DB_POOL_MAX_SIZE", default_value = "10")]
    pub db_pool_max_size: u32,

    /// Server listen address and port (e.g., "127.0.0.1:8080").
    /// Can also be set using the SERVER_ADDRESS environment variable.
    /// Default value: 127.0.0.1:8080
    #[arg(long, env = "SERVER_ADDRESS", default_value = "127.0.0.1:8080")]
    pub server_address: SocketAddr,

    /// Secret used to sign and verify session tokens (HS256).
    /// Can also be set using the JWT_SECRET environment variable.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// Session token lifetime, in minutes.
    /// Can also be set using the JWT_DURATION_MINUTES environment variable.
    /// Default value: 1440 (one day)
    #[arg(long, env = "JWT_DURATION_MINUTES", default_value = "1440")]
    pub jwt_duration_minutes: i64,

    /// Number of judge worker tasks executing submissions in parallel.
    /// Can also be set using the JUDGE_WORKERS environment variable.
    /// Default value: 2
    #[arg(long, env = "JUDGE_WORKERS", default_value = "2")]
    pub judge_workers: usize,

    /// Log level (e.g., "info").
    /// Can also be set using the RUST_LOG environment variable.
    /// Default value: info
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
