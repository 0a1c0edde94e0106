use bytes::Bytes;

use crate::http::mime;

/// HTTP status codes used by the server.
///
/// - `Ok` (200): File served
/// - `BadRequest` (400): Request line could not be read
/// - `NotFound` (404): No file at the resolved path
/// - `MethodNotAllowed` (405): Anything other than GET
/// - `InternalServerError` (500): File exists but could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
    /// Any other code, reported with the reason phrase "Unknown"
    Other(u16),
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use localserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
            StatusCode::Other(code) => *code,
        }
    }

    /// Returns the reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use localserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::Other(418).reason_phrase(), "Unknown");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::Other(_) => "Unknown",
        }
    }
}

/// A complete response ready to be written.
///
/// The header set is fixed, so only the content type is carried here; the
/// writer adds the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Value of the Content-Type header
    pub content_type: &'static str,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Creates a 200 OK response carrying a file's contents.
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type,
            body: body.into(),
        }
    }

    /// Creates an HTML error page for `status`, using its reason phrase as
    /// the message.
    pub fn error(status: StatusCode) -> Self {
        Self::error_with_message(status, status.reason_phrase())
    }

    /// Creates an HTML error page of the form
    /// `<html><body><h1>{status} {message}</h1></body></html>`.
    pub fn error_with_message(status: StatusCode, message: &str) -> Self {
        let body = format!(
            "<html><body><h1>{} {}</h1></body></html>",
            status.as_u16(),
            message
        );
        Self {
            status,
            content_type: mime::HTML,
            body: Bytes::from(body),
        }
    }
}
