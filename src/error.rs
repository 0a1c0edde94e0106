use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failures surfaced by [`LocalServer`](crate::server::LocalServer)
/// construction and startup.
///
/// None of these leave the server unusable; `start()` can be retried.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("resource root {} is unusable: {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("failed to create server runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    #[error("listener did not report a port within {0:?}")]
    StartupTimeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),
}
