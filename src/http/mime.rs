//! Content-Type lookup by file extension.

use std::path::Path;

/// Fallback for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type used for generated error pages.
pub const HTML: &str = "text/html; charset=utf-8";

/// Extension (lowercase, no leading dot) to content type.
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("html", HTML),
    ("htm", HTML),
    ("js", "application/javascript; charset=utf-8"),
    ("mjs", "application/javascript; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("json", "application/json; charset=utf-8"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    // shader sources
    ("glsl", "text/plain; charset=utf-8"),
    ("wgsl", "text/plain; charset=utf-8"),
    ("vert", "text/plain; charset=utf-8"),
    ("frag", "text/plain; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("xml", "application/xml; charset=utf-8"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
];

/// Looks up the content type for a bare extension, case-insensitively.
///
/// # Example
///
/// ```
/// # use localserve::http::mime::for_extension;
/// assert_eq!(for_extension("PNG"), "image/png");
/// assert_eq!(for_extension("bin"), "application/octet-stream");
/// ```
pub fn for_extension(ext: &str) -> &'static str {
    let ext = ext.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
        .unwrap_or(OCTET_STREAM)
}

/// Content type for a file path, based on its extension.
pub fn for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(for_extension)
        .unwrap_or(OCTET_STREAM)
}
