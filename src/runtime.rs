//! Process-wide tokio runtime backing the real HTTP transport.
//!
//! The engine itself is poll-based (the public API never blocks), but real
//! network I/O still needs an async executor underneath; this is that
//! executor, lazily started on first use.

use std::sync::OnceLock;

use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Initialize the runtime. Safe to call more than once; only the first call
/// does anything.
pub fn init() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime")
    })
}

/// Get a reference to the runtime, initializing it if needed.
pub fn get() -> &'static Runtime {
    init()
}

/// Spawn a future on the runtime without waiting for it.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    get().spawn(future)
}
