//! HTTP protocol implementation.
//!
//! A reduced HTTP/1.1 server side: one GET request per connection, answered
//! with a fixed header set and then closed.
//!
//! # Architecture
//!
//! - **`connection`**: Drives one accepted connection through its state machine
//! - **`parser`**: Decodes the request bytes and parses the request line
//! - **`request`**: Method and request line representation
//! - **`response`**: Status codes, file responses and HTML error pages
//! - **`writer`**: Serializes and writes responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Single read of the request
//!        └──────┬──────┘
//!               │ Bytes received (EOF → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Parse, resolve file, pick content type
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```
//!
//! # Wire format
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type: text/html; charset=utf-8
//! Content-Length: 11
//! Connection: close
//! Access-Control-Allow-Origin: *
//! Cache-Control: no-cache
//!
//! hello world
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
