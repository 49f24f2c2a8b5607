use crate::errors::AppError;
use deadpool_diesel::sqlite::Pool;
use tracing::debug;

/// Checks a connection out of the pool and runs a blocking diesel query on it.
pub(super) async fn run_query<T, F>(pool: &Pool, query: F) -> Result<T, AppError>
where
    F: FnOnce(&mut diesel::SqliteConnection) -> Result<T, diesel::result::Error> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get().await?;
    debug!("DB connection object obtained from pool for interaction");

    let result = conn.interact(query).await?;
    Ok(result?)
}
