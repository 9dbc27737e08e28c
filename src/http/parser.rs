//! Resumable request parser.
//!
//! Parsing never blocks: [`Request::parse`] consumes whatever complete
//! pieces it finds in the given slice and reports how many bytes it used.
//! The caller keeps the unconsumed tail and offers it again, with more
//! bytes appended, on the next call.

use crate::http::error::{Error, Result};
use crate::http::headers::{CRLF, find_crlf};
use crate::http::request::{CONTENT_LENGTH, ParseState, Request, RequestLine};

const HTTP_NAME: &str = "HTTP";
const SUPPORTED_VERSION: &str = "1.1";

impl Request {
    /// Feeds `data` to the state machine until it needs more input or the
    /// request is done. Returns the number of bytes consumed.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize> {
        if self.state == ParseState::Done {
            return Err(Error::AlreadyParsed);
        }

        let mut parsed = 0;
        while self.state != ParseState::Done {
            let n = self.step(&data[parsed..])?;
            parsed += n;
            if n == 0 {
                break;
            }
        }
        Ok(parsed)
    }

    /// Runs a single state transition against `data`.
    ///
    /// Returns zero when the current state needs more bytes (or, for a
    /// request without a body, when it finished without consuming any).
    pub fn step(&mut self, data: &[u8]) -> Result<usize> {
        match self.state {
            ParseState::Done => Err(Error::AlreadyParsed),
            ParseState::Initialized => match parse_request_line(data)? {
                Some((n, line)) => {
                    self.request_line = line;
                    self.state = ParseState::ParsingHeaders;
                    Ok(n)
                }
                None => Ok(0),
            },
            ParseState::ParsingHeaders => {
                let (n, done) = self.headers.parse(data)?;
                if done {
                    self.state = ParseState::ParsingBody;
                }
                Ok(n)
            }
            ParseState::ParsingBody => {
                let Ok(raw) = self.headers.get(CONTENT_LENGTH) else {
                    self.state = ParseState::Done;
                    return Ok(0);
                };
                let declared: usize = raw
                    .parse()
                    .map_err(|_| Error::InvalidContentLength(raw.to_string()))?;

                self.body.extend_from_slice(data);
                if self.body.len() > declared {
                    return Err(Error::BodyLengthMismatch {
                        declared,
                        actual: self.body.len(),
                    });
                }
                if self.body.len() == declared {
                    self.state = ParseState::Done;
                }
                Ok(data.len())
            }
        }
    }
}

/// Parses a CRLF-terminated request line from the front of `data`.
///
/// Returns `None` when no complete line is available yet, otherwise the
/// number of bytes the line occupies (including CRLF) and its parts.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(usize, RequestLine)>> {
    let Some(index) = find_crlf(data) else {
        return Ok(None);
    };
    let line = std::str::from_utf8(&data[..index])
        .map_err(|_| Error::MalformedRequestLine("request line is not valid UTF-8".into()))?;

    let (method, rest) = line
        .split_once(' ')
        .ok_or_else(|| Error::MalformedRequestLine(format!("no request target in '{line}'")))?;
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::MalformedRequestLine(format!("invalid method '{method}'")));
    }

    // Split from the right so a target containing spaces is reported as a
    // bad target rather than a bad version.
    let (target, version) = rest
        .rsplit_once(' ')
        .ok_or_else(|| Error::MalformedRequestLine(format!("no version in '{line}'")))?;

    let version = match version.split_once('/') {
        Some((HTTP_NAME, number)) if !number.contains('/') => number,
        _ => {
            return Err(Error::MalformedRequestLine(format!(
                "invalid version string '{version}'"
            )));
        }
    };
    if version != SUPPORTED_VERSION {
        return Err(Error::UnsupportedVersion(version.to_string()));
    }

    if target.is_empty() || target.contains(' ') {
        return Err(Error::MalformedRequestLine(format!(
            "invalid request target '{target}'"
        )));
    }

    let request_line = RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
    };
    Ok(Some((index + CRLF.len(), request_line)))
}
