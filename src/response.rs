//! Outbound message: status code, headers, cookies, and a finite body chunk
//! sequence, plus the status-phrase table shared with error rendering.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::cookies::CookieJar;
use crate::error::HandlerError;
use crate::headers::HeaderSet;
use crate::wire::ResponseSink;

/// Reason phrase for a standard status code.
///
/// Fixed table of the common 1xx–5xx codes, shared by response and error
/// rendering. Returns `None` for unrecognized codes.
#[must_use]
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    let phrase = match status {
        // Information codes
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",

        // Success codes
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",

        // Redirection codes
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",

        // Client error codes
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        449 => "Retry With",
        451 => "Unavailable For Legal Reasons",

        // Server error codes
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        507 => "Insufficient Storage",
        510 => "Not Extended",

        _ => return None,
    };
    Some(phrase)
}

/// Status-line rendering failure for a code missing from the phrase table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownStatus(pub u16);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no reason phrase for status code {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// Body variants a response can be constructed from. Each variant implies
/// its own auto-generated headers.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// No body, no auto headers.
    Empty,
    /// Trimmed, newline-terminated plain text. Adds `Content-Type:
    /// text/plain` and `Content-Length`.
    Text(String),
    /// JSON-encoded document. Adds `Content-Type: application/json` and
    /// `Content-Length`.
    Json(serde_json::Value),
    /// Pre-built chunk sequence, used verbatim with no auto headers.
    Raw(Vec<Vec<u8>>),
}

/// Outbound response message.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code. Defaults to 200.
    pub status: u16,
    pub headers: HeaderSet,
    pub cookies: CookieJar,
    chunks: Vec<Vec<u8>>,
}

impl Default for Response {
    fn default() -> Self {
        Self::empty()
    }
}

impl Response {
    pub const DEFAULT_STATUS: u16 = 200;

    /// Construct a response from a body variant, applying the variant's auto
    /// headers.
    #[must_use]
    pub fn new(body: ResponseBody) -> Self {
        let mut response = Response {
            status: Self::DEFAULT_STATUS,
            headers: HeaderSet::new(),
            cookies: CookieJar::new(),
            chunks: Vec::new(),
        };
        match body {
            ResponseBody::Empty => {}
            ResponseBody::Text(text) => {
                let mut bytes = text.trim().as_bytes().to_vec();
                bytes.push(b'\n');
                response.chunks.push(bytes);
                response.headers.add("Content-Type", "text/plain");
                response
                    .headers
                    .add("Content-Length", response.content_length().to_string());
            }
            ResponseBody::Json(value) => {
                response.chunks.push(value.to_string().into_bytes());
                response.headers.add("Content-Type", "application/json");
                response
                    .headers
                    .add("Content-Length", response.content_length().to_string());
            }
            ResponseBody::Raw(chunks) => response.chunks = chunks,
        }
        response
    }

    /// Empty 200 response.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ResponseBody::Empty)
    }

    /// Plain-text response; the text is trimmed and newline-terminated.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ResponseBody::Text(text.into()))
    }

    /// JSON response from any serializable structure.
    pub fn json<T: Serialize>(body: &T) -> Result<Self, HandlerError> {
        let value = serde_json::to_value(body)?;
        Ok(Self::new(ResponseBody::Json(value)))
    }

    /// Response from a pre-built chunk sequence, used verbatim.
    #[must_use]
    pub fn raw(chunks: Vec<Vec<u8>>) -> Self {
        Self::new(ResponseBody::Raw(chunks))
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Append one header pair.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Append every pair of another header set.
    ///
    /// Construction-time auto headers stay in front, so they keep winning
    /// first-match lookups.
    #[must_use]
    pub fn with_headers(mut self, headers: &HeaderSet) -> Self {
        for (name, value) in headers.iter() {
            self.headers.add(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    /// Body chunk sequence.
    #[must_use]
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Total body length in bytes.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// `"{code} {phrase}"` status line.
    ///
    /// Fails for codes missing from the phrase table.
    pub fn status_line(&self) -> Result<String, UnknownStatus> {
        let phrase = reason_phrase(self.status).ok_or(UnknownStatus(self.status))?;
        Ok(format!("{} {}", self.status, phrase))
    }

    /// Header pair list as emitted on the wire: the header set in insertion
    /// order, with the cookie-encoded pair appended iff the jar is non-empty.
    #[must_use]
    pub fn wire_headers(&self) -> Vec<(String, String)> {
        let mut pairs = self.headers.to_pairs();
        if !self.cookies.is_empty() {
            pairs.push(("Set-Cookie".to_string(), self.cookies.encode()));
        }
        pairs
    }

    /// Render through the emission callback: one `start` call with the
    /// status line and header pairs, then the body chunks in order.
    ///
    /// The status line is resolved before anything is emitted, so a failure
    /// here leaves the sink untouched.
    pub fn send(&self, sink: &mut dyn ResponseSink) -> Result<(), UnknownStatus> {
        let status_line = self.status_line()?;
        let headers = self.wire_headers();
        debug!(
            status = self.status,
            header_count = headers.len(),
            body_bytes = self.content_length(),
            "Response rendered to wire"
        );
        sink.start(&status_line, &headers);
        for chunk in &self.chunks {
            sink.write_chunk(chunk);
        }
        Ok(())
    }
}
