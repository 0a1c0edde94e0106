use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::assets::ResourceRoot;
use crate::http::mime;
use crate::http::parser::parse_http_request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Read limits applied to every connection.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Capacity of the single read.
    pub max_request_bytes: usize,
    /// Time allowed for the first byte to arrive.
    pub read_timeout: Duration,
}

/// One accepted client connection, answered exactly once.
pub struct Connection<S> {
    stream: S,
    root: Arc<ResourceRoot>,
    limits: ReadLimits,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Bytes),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, root: Arc<ResourceRoot>, limits: ReadLimits) -> Self {
        Self {
            stream,
            root,
            limits,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(raw) => {
                        self.state = ConnectionState::Processing(raw);
                    }
                    None => {
                        // nothing was sent, so there is nothing to answer
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Processing(raw) => {
                    let response = Self::handle_request(&self.root, raw).await;
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(writer) => {
                    writer
                        .write_to_stream(&mut self.stream)
                        .await
                        .context("failed to send response")?;

                    // one response per connection
                    let _ = self.stream.shutdown().await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Issues the connection's only read. `None` means the peer closed
    /// without sending anything.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Bytes>> {
        let mut buf = BytesMut::with_capacity(self.limits.max_request_bytes);

        let n = timeout(self.limits.read_timeout, self.stream.read_buf(&mut buf))
            .await
            .context("timed out waiting for request")?
            .context("failed to read request")?;

        if n == 0 {
            return Ok(None);
        }

        Ok(Some(buf.freeze()))
    }

    async fn handle_request(root: &ResourceRoot, raw: &[u8]) -> Response {
        let request = match parse_http_request(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting request");
                return Response::error(e.status());
            }
        };

        match root.load(&request.raw_path).await {
            Ok((path, body)) => {
                tracing::debug!(
                    path = %request.path(),
                    bytes = body.len(),
                    "Serving file"
                );
                Response::ok(mime::for_path(&path), body)
            }
            Err(e) => {
                let status = e.status();
                tracing::debug!(
                    path = %request.path(),
                    status = status.as_u16(),
                    error = %e,
                    "Request failed"
                );
                Response::error(status)
            }
        }
    }
}
