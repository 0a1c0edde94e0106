//! Listener lifecycle and connection bookkeeping.

pub mod listener;
pub mod registry;
pub mod state;

pub use listener::LocalServer;
pub use state::ServerState;
