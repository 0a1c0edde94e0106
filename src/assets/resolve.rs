use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::assets::root::ResourceRoot;
use crate::http::response::StatusCode;

/// Document served for `/`.
pub const DEFAULT_DOCUMENT: &str = "/index.html";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailure { path: PathBuf, source: io::Error },
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::NotFound(_) => StatusCode::NotFound,
            ResolveError::ReadFailure { .. } => StatusCode::InternalServerError,
        }
    }
}

/// Normalizes a raw request target into the path used for lookup.
///
/// The query string is dropped, the rest is percent-decoded (left as sent if
/// the decoded bytes are not UTF-8), `/` becomes [`DEFAULT_DOCUMENT`], and
/// every literal `../` is removed in a single pass.
///
/// # Example
///
/// ```
/// # use localserve::assets::sanitize_request_path;
/// assert_eq!(sanitize_request_path("/?foo=bar"), "/index.html");
/// assert_eq!(sanitize_request_path("/a%20b/../c.js"), "/a b/c.js");
/// ```
pub fn sanitize_request_path(raw_path: &str) -> String {
    let path = match raw_path.split_once('?') {
        Some((path, _)) => path,
        None => raw_path,
    };

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| path.to_string());

    let path = if decoded == "/" {
        DEFAULT_DOCUMENT.to_string()
    } else {
        decoded
    };

    path.replace("../", "")
}

/// True when `relative` cannot climb above the directory it is joined onto.
///
/// The `../` removal above is single pass, so inputs such as `....//` still
/// collapse into a parent reference; this catches what it leaves behind.
fn stays_within(relative: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

impl ResourceRoot {
    /// Candidate file path for a request target, or `None` if the sanitized
    /// path would escape the root.
    pub fn candidate(&self, raw_path: &str) -> Option<PathBuf> {
        let sanitized = sanitize_request_path(raw_path);
        let relative = Path::new(sanitized.trim_start_matches('/'));

        if !stays_within(relative) {
            return None;
        }

        Some(self.path().join(relative))
    }

    /// Resolves a request target and reads the file it names.
    pub async fn load(&self, raw_path: &str) -> Result<(PathBuf, Bytes), ResolveError> {
        let path = self
            .candidate(raw_path)
            .ok_or_else(|| ResolveError::NotFound(PathBuf::from(raw_path)))?;

        if tokio::fs::metadata(&path).await.is_err() {
            return Err(ResolveError::NotFound(path));
        }

        match tokio::fs::read(&path).await {
            Ok(contents) => Ok((path, Bytes::from(contents))),
            Err(source) => Err(ResolveError::ReadFailure { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_dropped_before_decoding() {
        assert_eq!(sanitize_request_path("/app.js?v=1"), "/app.js");
        // an encoded '?' is part of the file name
        assert_eq!(sanitize_request_path("/a%3Fb.txt"), "/a?b.txt");
    }

    #[test]
    fn invalid_utf8_escape_is_kept_verbatim() {
        assert_eq!(sanitize_request_path("/%FF.png"), "/%FF.png");
    }

    #[test]
    fn root_maps_to_index_only_when_exact() {
        assert_eq!(sanitize_request_path("/"), "/index.html");
        assert_eq!(sanitize_request_path("/sub/"), "/sub/");
    }

    #[test]
    fn traversal_is_removed_in_one_pass() {
        assert_eq!(sanitize_request_path("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(sanitize_request_path("/%2E%2E/secret"), "/secret");
        assert_eq!(sanitize_request_path("/....//x"), "/../x");
    }

    #[test]
    fn stays_within_tracks_depth() {
        assert!(stays_within(Path::new("a/b/../c")));
        assert!(stays_within(Path::new("./a")));
        assert!(!stays_within(Path::new("../x")));
        assert!(!stays_within(Path::new("a/../../x")));
    }
}
