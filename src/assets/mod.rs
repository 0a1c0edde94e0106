//! Static asset lookup.
//!
//! - **`root`**: the directory the server is confined to
//! - **`resolve`**: turns a request target into a file under that directory

pub mod resolve;
pub mod root;

pub use resolve::{ResolveError, sanitize_request_path};
pub use root::ResourceRoot;
