//! Shared tokio runtime
//!
//! The public API is synchronous; only the feed tickers and the ingest
//! pump need an executor. One lazily created multi-thread runtime backs
//! them all.

use std::sync::OnceLock;

use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The process-wide runtime, created on first use
pub fn get_runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("buswatch-runtime")
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Spawn a future onto the shared runtime
pub fn spawn_in_tokio<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    get_runtime().spawn(future)
}
