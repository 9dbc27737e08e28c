//! Demo application served by the binary.
//!
//! | target            | response                                     |
//! |-------------------|----------------------------------------------|
//! | `/yourproblem`    | 400 page                                     |
//! | `/myproblem`      | 500 page                                     |
//! | `/httpbin/<rest>` | `<rest>` streamed from the upstream, chunked |
//! | anything else     | 200 page                                     |

use std::time::Duration;

use crate::config::Config;
use crate::http::connection::{Handler, HandlerError, ResponseSink, write_html};
use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::proxy::Upstream;

pub const BAD_REQUEST_PAGE: &str = "<html><head><title>400 Bad Request</title></head><body><h1>Bad Request</h1><p>Your request honestly kinda sucked.</p></body></html>";
pub const INTERNAL_ERROR_PAGE: &str = "<html><head><title>500 Internal Server Error</title></head><body><h1>Internal Server Error</h1><p>Okay, you know what? This one is on me.</p></body></html>";
pub const OK_PAGE: &str = "<html><head><title>200 OK</title></head><body><h1>Success!</h1><p>Your request was an absolute banger.</p></body></html>";

pub const PASSTHROUGH_PREFIX: &str = "/httpbin";

pub struct DemoHandler {
    upstream: Upstream,
}

impl DemoHandler {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let upstream = Upstream::new(
            &cfg.upstream_url,
            Duration::from_secs(cfg.upstream_timeout_secs),
        )?;
        Ok(Self::new(upstream))
    }
}

impl Handler for DemoHandler {
    async fn handle(&self, req: &Request, sink: &mut ResponseSink<'_>) -> Result<(), HandlerError> {
        let target = req.target();
        match target {
            "/yourproblem" => {
                write_html(sink.writer(), StatusCode::BadRequest, BAD_REQUEST_PAGE.as_bytes()).await?;
            }
            "/myproblem" => {
                write_html(
                    sink.writer(),
                    StatusCode::InternalServerError,
                    INTERNAL_ERROR_PAGE.as_bytes(),
                )
                .await?;
            }
            _ => match target.strip_prefix(PASSTHROUGH_PREFIX) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                    self.upstream.forward(rest, sink.writer()).await?;
                }
                _ => sink.write(OK_PAGE.as_bytes()),
            },
        }
        Ok(())
    }
}
