//! Phased response writer.
//!
//! A response is written in a fixed order:
//!
//! ```text
//! StatusLine ─▶ Headers ─▶ Body ─┬─ write_body ──────────────────┬─▶ Trailers ─▶ Done
//!                                └─ write_chunked_body* ─ done ──┘
//! ```
//!
//! Every call checks that the writer is in exactly the phase it writes.
//! Anything else is an [`Error::OutOfOrderWrite`], since bytes written out
//! of order would corrupt the message framing. A writer is meant to use one
//! body discipline per response.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::error::{Error, OrderViolation, Result};
use crate::http::headers::{CRLF, Headers};
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
    Trailers,
    Done,
}

pub struct ResponseWriter<W> {
    inner: W,
    state: WriterState,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: WriterState::StatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<()> {
        self.expect_phase(WriterState::StatusLine, "write_status_line")?;
        let line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        self.send(line.as_bytes()).await?;
        self.state = WriterState::Headers;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &Headers) -> Result<()> {
        self.expect_phase(WriterState::Headers, "write_headers")?;
        self.send(&headers.to_bytes()).await?;
        self.state = WriterState::Body;
        Ok(())
    }

    /// Writes a complete, non-chunked body.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<()> {
        self.expect_phase(WriterState::Body, "write_body")?;
        self.send(body).await?;
        self.state = WriterState::Trailers;
        Ok(())
    }

    /// Writes one chunk. May be called any number of times before
    /// [`write_chunked_body_done`](Self::write_chunked_body_done).
    ///
    /// An empty slice writes nothing: a zero-length chunk is the terminator.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<()> {
        self.expect_phase(WriterState::Body, "write_chunked_body")?;
        if chunk.is_empty() {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(chunk.len() + 12);
        buf.extend_from_slice(format!("{:x}", chunk.len()).as_bytes());
        buf.extend_from_slice(CRLF);
        buf.extend_from_slice(chunk);
        buf.extend_from_slice(CRLF);
        self.send(&buf).await
    }

    pub async fn write_chunked_body_done(&mut self) -> Result<()> {
        self.expect_phase(WriterState::Body, "write_chunked_body_done")?;
        self.send(b"0\r\n").await?;
        self.state = WriterState::Trailers;
        Ok(())
    }

    /// Writes the trailer block. Required after a chunked body even when
    /// `trailers` is empty, because the blank line closes the message.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<()> {
        self.expect_phase(WriterState::Trailers, "write_trailers")?;
        self.send(&trailers.to_bytes()).await?;
        self.state = WriterState::Done;
        Ok(())
    }

    fn expect_phase(&self, phase: WriterState, op: &'static str) -> Result<()> {
        if self.state == phase {
            return Ok(());
        }
        let reason = if self.state < phase {
            OrderViolation::BeforePredecessor
        } else {
            OrderViolation::AlreadyWritten
        };
        Err(Error::OutOfOrderWrite { op, reason })
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_line_format() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::BadRequest).await.unwrap();
        assert_eq!(writer.into_inner(), b"HTTP/1.1 400 Bad Request\r\n");
    }

    #[tokio::test]
    async fn empty_chunk_is_skipped() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::Ok).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        let before = writer.inner.len();
        writer.write_chunked_body(b"").await.unwrap();
        assert_eq!(writer.inner.len(), before);
        assert_eq!(writer.state(), WriterState::Body);
    }
}
