use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::error::{self, Error};
use crate::http::headers::CONTENT_TYPE_TEXT_HTML;
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers, error_page};
use crate::http::writer::{ResponseWriter, WriterState};

/// Writer half handed to handlers, erased over the concrete stream type.
pub type DynWriter<'a> = ResponseWriter<&'a mut (dyn AsyncWrite + Unpin + Send)>;

/// Failure reported by a [`Handler`]. Rendered as an HTML page with
/// `status` when the handler has not written anything yet.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} {}: {message}", .status.as_u16(), .status.reason_phrase())]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InternalServerError, message)
    }
}

impl From<Error> for HandlerError {
    fn from(err: Error) -> Self {
        Self::internal(err.to_string())
    }
}

/// Application logic invoked once per parsed request.
///
/// A handler either buffers a body with [`ResponseSink::write`], which the
/// connection then sends as a `200 OK`, or takes over the response by
/// driving [`ResponseSink::writer`] itself (needed for chunked bodies).
pub trait Handler: Send + Sync + 'static {
    fn handle(
        &self,
        req: &Request,
        sink: &mut ResponseSink<'_>,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}

/// Where a handler puts its response.
pub struct ResponseSink<'a> {
    writer: DynWriter<'a>,
    body: Vec<u8>,
}

impl<'a> ResponseSink<'a> {
    pub fn new(stream: &'a mut (dyn AsyncWrite + Unpin + Send)) -> Self {
        Self {
            writer: ResponseWriter::new(stream),
            body: Vec::new(),
        }
    }

    /// Appends to the buffered body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Direct access to the response writer.
    pub fn writer(&mut self) -> &mut DynWriter<'a> {
        &mut self.writer
    }

    /// True once anything has gone out through the writer.
    pub fn started(&self) -> bool {
        self.writer.state() != WriterState::StatusLine
    }
}

/// Writes a complete HTML response with a known length.
pub async fn write_html<W>(
    writer: &mut ResponseWriter<W>,
    status: StatusCode,
    body: &[u8],
) -> error::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_status_line(status).await?;
    let mut headers = default_headers(Some(body.len()));
    headers.set_content_type(CONTENT_TYPE_TEXT_HTML);
    writer.write_headers(&headers).await?;
    writer.write_body(body).await
}

/// Reads and parses one request from `reader`.
///
/// Bytes are read into a buffer of `initial_capacity` bytes that doubles
/// whenever it fills up. After every parse attempt the consumed prefix is
/// dropped and the leftover bytes moved to the front. Reaching end of stream
/// before the request is complete is an `UnexpectedEof` I/O error.
pub async fn request_from_reader<R>(
    reader: &mut R,
    initial_capacity: usize,
) -> error::Result<Request>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; initial_capacity.max(1)];
    let mut read_to = 0;
    let mut req = Request::new();

    while !req.is_done() {
        if read_to == buf.len() {
            buf.resize(buf.len() * 2, 0);
        }

        let n = reader.read(&mut buf[read_to..]).await?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before request was complete",
            )));
        }
        read_to += n;

        let parsed = req.parse(&buf[..read_to])?;
        if !req.is_done() {
            buf.copy_within(parsed..read_to, 0);
            read_to -= parsed;
            buf[read_to..].fill(0);
        }
    }

    Ok(req)
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Rejecting(Error),
    Closed,
}

/// One request/response exchange over an accepted stream.
///
/// ```text
/// Reading ─┬─ parsed ────▶ Processing ─▶ Closed
///          └─ malformed ─▶ Rejecting ──▶ Closed
/// ```
///
/// There is no keep-alive: every exit path shuts the stream down.
pub struct Connection<S, H> {
    stream: S,
    handler: Arc<H>,
    read_buffer_size: usize,
    state: ConnectionState,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler,
{
    pub fn new(stream: S, handler: Arc<H>, read_buffer_size: usize) -> Self {
        Self {
            stream,
            handler,
            read_buffer_size,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after response failed");
        }
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    match request_from_reader(&mut self.stream, self.read_buffer_size).await {
                        Ok(req) => self.state = ConnectionState::Processing(req),
                        Err(e) if e.is_protocol() => self.state = ConnectionState::Rejecting(e),
                        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                            tracing::debug!(error = %e, "Peer closed the connection");
                            return Ok(());
                        }
                        Err(e) => return Err(e).context("failed to read request"),
                    }
                }

                ConnectionState::Processing(req) => {
                    tracing::info!(
                        method = %req.method(),
                        target = %req.target(),
                        body_len = req.body.len(),
                        "Request received"
                    );
                    self.respond(&req).await?;
                }

                ConnectionState::Rejecting(err) => {
                    tracing::warn!(error = %err, "Malformed request");
                    let mut writer = ResponseWriter::new(&mut self.stream);
                    let page = error_page(StatusCode::BadRequest, &err.to_string());
                    write_html(&mut writer, StatusCode::BadRequest, page.as_bytes())
                        .await
                        .context("failed to write bad request response")?;
                }

                ConnectionState::Closed => return Ok(()),
            }
        }
    }

    async fn respond(&mut self, req: &Request) -> anyhow::Result<()> {
        let handler = Arc::clone(&self.handler);
        let mut sink = ResponseSink::new(&mut self.stream);
        let outcome = handler.handle(req, &mut sink).await;

        match outcome {
            Ok(()) if sink.started() => Ok(()),
            Ok(()) => {
                let body = std::mem::take(&mut sink.body);
                write_html(sink.writer(), StatusCode::Ok, &body)
                    .await
                    .context("failed to write response")?;
                tracing::info!(status = 200, "Response sent");
                Ok(())
            }
            Err(e) if sink.started() => {
                tracing::warn!(error = %e, "Handler failed after the response was started");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(status = e.status.as_u16(), error = %e.message, "Handler failed");
                let page = error_page(e.status, &e.message);
                write_html(sink.writer(), e.status, page.as_bytes())
                    .await
                    .context("failed to write error response")?;
                Ok(())
            }
        }
    }
}
