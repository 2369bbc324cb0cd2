pub mod auth;
pub mod comments;
pub mod error;
pub mod middleware;
pub mod moderation;
pub mod notifications;
pub mod password;
pub mod posts;
pub mod roles;
pub mod routes;
pub mod session;
pub mod votes;

use tracing::error;

use crate::error::{ApiError, ApiResult};

/// Run blocking ledger work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Storage(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
