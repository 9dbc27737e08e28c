use crate::http::headers::Headers;

pub const CONTENT_LENGTH: &str = "content-length";

/// Progress of a [`Request`] through the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Waiting for the request line.
    Initialized,
    /// Request line seen, reading field lines.
    ParsingHeaders,
    /// Header block finished, accumulating the body.
    ParsingBody,
    /// Fully parsed. No further bytes are accepted.
    Done,
}

/// The first line of a request: `METHOD TARGET HTTP/VERSION`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Uppercase method token (e.g. "GET").
    pub method: String,
    /// Request target exactly as sent (e.g. "/search?q=rust").
    pub target: String,
    /// Version number without the `HTTP/` prefix. Always "1.1".
    pub version: String,
}

/// An HTTP request, filled in incrementally by the parser.
///
/// A request starts out empty in [`ParseState::Initialized`] and is only
/// mutated by [`Request::parse`]. Once it reaches [`ParseState::Done`] it is
/// complete and further parsing is rejected.
#[derive(Debug, Clone)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub(crate) state: ParseState,
}

impl Request {
    pub fn new() -> Self {
        Self {
            request_line: RequestLine::default(),
            headers: Headers::new(),
            body: Vec::new(),
            state: ParseState::Initialized,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).ok()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
