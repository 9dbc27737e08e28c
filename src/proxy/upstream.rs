//! Upstream passthrough
//!
//! Forwards a request to a plain-HTTP upstream and streams the upstream
//! body back to the client as a chunked response. The response carries
//! `X-Content-SHA256` and `X-Content-Length` trailers computed over the
//! streamed bytes.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::BytesMut;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::http::connection::HandlerError;
use crate::http::headers::{CONTENT_TYPE_TEXT_HTML, Headers};
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;

pub const HASH_TRAILER: &str = "X-Content-SHA256";
pub const LENGTH_TRAILER: &str = "X-Content-Length";

/// Read size for the upstream body; each read becomes one chunk.
const BUFFER_SIZE: usize = 1024;

/// Upper bound on the upstream status line and headers.
const MAX_HEAD_SIZE: usize = 64 * 1024;

pub struct Upstream {
    base: Url,
    connect_timeout: Duration,
}

impl Upstream {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).context("Invalid upstream URL")?;
        if base.scheme() != "http" {
            anyhow::bail!("Unsupported upstream scheme '{}'", base.scheme());
        }
        base.host_str().context("Upstream URL missing host")?;
        Ok(Self {
            base,
            connect_timeout,
        })
    }

    /// Resolves `path` (with any query) against the upstream base URL.
    pub fn target_url(&self, path: &str) -> Result<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Url::parse(&format!("{base}{path}")).context("Invalid upstream target")
    }

    /// Builds the request sent upstream.
    ///
    /// HTTP/1.0 keeps the upstream from answering with its own chunked
    /// framing, so the body is simply everything until the upstream closes.
    pub fn build_http_request(&self, url: &Url) -> Vec<u8> {
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        let mut buffer = format!("GET {target} HTTP/1.0\r\n").into_bytes();

        let mut headers = Headers::new();
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => headers.add_header("Host", format!("{host}:{port}")),
            None => headers.add_header("Host", host),
        }
        headers.add_header("Connection", "close");
        buffer.extend_from_slice(&headers.to_bytes());

        buffer
    }

    /// Streams the upstream response for `path` through `writer`.
    ///
    /// Failures before the status line goes out are returned as a 500 so
    /// the caller can still answer. Once streaming has begun, an upstream
    /// read error ends the body early but the chunked framing and trailers
    /// are still completed.
    pub async fn forward<W>(
        &self,
        path: &str,
        writer: &mut ResponseWriter<W>,
    ) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let (mut stream, mut buffer) = self
            .open(path)
            .await
            .map_err(|e| HandlerError::internal(format!("{e:#}")))?;

        writer.write_status_line(StatusCode::Ok).await?;
        let mut headers = default_headers(None);
        headers.set_content_type(CONTENT_TYPE_TEXT_HTML);
        headers.add_header("Transfer-Encoding", "chunked");
        headers.add_trailers(&[HASH_TRAILER, LENGTH_TRAILER]);
        writer.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut total = 0usize;
        loop {
            if !buffer.is_empty() {
                hasher.update(&buffer);
                total += buffer.len();
                writer.write_chunked_body(&buffer).await?;
                buffer.clear();
            }

            buffer.reserve(BUFFER_SIZE);
            match stream.read_buf(&mut buffer).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Upstream read failed, ending body early");
                    break;
                }
            }
        }
        writer.write_chunked_body_done().await?;

        let mut trailers = Headers::new();
        trailers.add_header(HASH_TRAILER, format!("{:x}", hasher.finalize()));
        trailers.add_header(LENGTH_TRAILER, total.to_string());
        writer.write_trailers(&trailers).await?;

        tracing::info!(path = %path, bytes = total, "Upstream response streamed");
        Ok(())
    }

    /// Connects, sends the request and reads the upstream head. Returns the
    /// stream and any body bytes that arrived together with the head.
    async fn open(&self, path: &str) -> Result<(TcpStream, BytesMut)> {
        let url = self.target_url(path)?;
        let host = url.host_str().context("Upstream URL missing host")?;
        let port = url.port_or_known_default().unwrap_or(80);
        let addr = format!("{}:{}", host, port);

        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to upstream")?;
        tracing::debug!(upstream = %addr, "Connected to upstream");

        stream.write_all(&self.build_http_request(&url)).await?;
        stream.flush().await?;

        let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);
        let status = read_head(&mut stream, &mut buffer).await?;
        tracing::debug!(status, url = %url, "Upstream responded");

        Ok((stream, buffer))
    }
}

/// Reads until the end of the upstream header block, leaving any body
/// bytes in `buffer`. Returns the upstream status code.
async fn read_head(stream: &mut TcpStream, buffer: &mut BytesMut) -> Result<u16> {
    loop {
        if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = buffer.split_to(end + 4);
            return parse_status_code(&head);
        }
        if buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("Upstream response headers too large");
        }

        buffer.reserve(BUFFER_SIZE);
        if stream.read_buf(buffer).await? == 0 {
            anyhow::bail!("Upstream closed before complete response head received");
        }
    }
}

fn parse_status_code(head: &[u8]) -> Result<u16> {
    let text = std::str::from_utf8(head).context("Invalid UTF-8 in upstream response head")?;
    let status_line = text.lines().next().context("Empty upstream response")?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        anyhow::bail!("Invalid upstream status line: {}", status_line);
    }
    parts
        .next()
        .context("Upstream status line missing code")?
        .parse()
        .context("Invalid upstream status code")
}
