use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request is not valid UTF-8")]
    InvalidEncoding,
    #[error("malformed request line")]
    MalformedRequest,
    #[error("method {} not allowed", .0.as_str())]
    MethodNotAllowed(Method),
}

impl ParseError {
    /// Status code the client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::InvalidEncoding | ParseError::MalformedRequest => StatusCode::BadRequest,
            ParseError::MethodNotAllowed(_) => StatusCode::MethodNotAllowed,
        }
    }
}

/// Decodes the raw bytes of a request and parses its request line.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let text = std::str::from_utf8(buf).map_err(|_| ParseError::InvalidEncoding)?;
    parse_request_line(text)
}

/// Parses `METHOD SP PATH [SP VERSION]` from the first CRLF-terminated line.
///
/// Tokens are separated by single spaces, so repeated spaces produce empty
/// tokens rather than being collapsed. Everything after the first line is
/// ignored.
pub fn parse_request_line(text: &str) -> Result<Request, ParseError> {
    let request_line = text.split("\r\n").next().unwrap_or_default();
    let mut parts = request_line.split(' ');

    let method_str = parts.next().unwrap_or_default();
    let path = parts.next().ok_or(ParseError::MalformedRequest)?;
    let version = parts.next().map(str::to_string);

    let method = Method::parse(method_str);
    if method != Method::GET {
        return Err(ParseError::MethodNotAllowed(method));
    }

    Ok(Request {
        method,
        raw_path: path.to_string(),
        version,
    })
}
