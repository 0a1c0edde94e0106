/// Lifecycle of a [`LocalServer`](super::LocalServer).
///
/// ```text
/// NotStarted --start--> Starting --port known--> Ready(port) --stop--> Stopped
///                          |
///                          +--bind error / timeout--> Failed
/// ```
///
/// `Failed` and `Stopped` both behave like `NotStarted` for the next
/// `start()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Starting,
    Ready(u16),
    Failed(String),
    Stopped,
}

impl ServerState {
    /// The bound port, or 0 when not ready.
    pub fn port(&self) -> u16 {
        match self {
            ServerState::Ready(port) => *port,
            _ => 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ServerState::Ready(_))
    }
}
