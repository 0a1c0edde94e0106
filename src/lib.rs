//! localserve - embedded static asset server
//!
//! Serves a directory of static files to a local client over loopback TCP
//! on an OS-assigned port. The HTTP layer is deliberately small: one GET
//! request per connection, a fixed header set, no keep-alive.

pub mod assets;
pub mod config;
pub mod error;
pub mod http;
pub mod launch;
pub mod server;

pub use assets::ResourceRoot;
pub use config::{Config, ServerConfig};
pub use error::ServerError;
pub use launch::launch_url;
pub use server::{LocalServer, ServerState};
