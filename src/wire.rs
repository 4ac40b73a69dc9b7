//! The external-interface seam: the inbound wire environment handed over by
//! the host transport, and the outbound emission callback the rendered
//! response is delivered through.

use std::fmt;
use std::io::{self, Read};

/// Host-supplied representation of one inbound request.
///
/// The transport layer fills this in from whatever it parsed off the socket
/// (or received from a gateway) and hands it to [`App::handle`]. Header
/// entries arrive in raw prefixed key/value form (e.g. `HTTP_USER_AGENT`);
/// the request wrapper normalizes them on first access.
///
/// [`App::handle`]: crate::app::App::handle
pub struct WireEnv {
    /// HTTP method string, uppercase by convention (e.g. `"GET"`).
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query_string: String,
    /// Raw header entries in prefixed key/value form.
    pub headers: Vec<(String, String)>,
    /// Declared body length, when the transport carries it out of band.
    /// Falls back to the `content-length` header when absent.
    pub content_length: Option<usize>,
    /// Readable body stream. Read at most once, for exactly the declared
    /// number of bytes.
    pub input: Box<dyn Read>,
}

impl WireEnv {
    /// Create an environment with no query string, headers, or body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query_string: String::new(),
            headers: Vec::new(),
            content_length: None,
            input: Box::new(io::empty()),
        }
    }

    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = query.into();
        self
    }

    /// Append one raw prefixed header entry.
    pub fn with_wire_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Attach the body stream and its declared length.
    pub fn with_input(mut self, input: Box<dyn Read>, content_length: Option<usize>) -> Self {
        self.input = input;
        self.content_length = content_length;
        self
    }
}

impl fmt::Debug for WireEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireEnv")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_string", &self.query_string)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Emission side of the wire contract.
///
/// Rendering follows the host gateway's start-callback-then-chunks
/// convention: exactly one `start` call with the status line and the ordered
/// header pair list, followed by zero or more body chunks.
pub trait ResponseSink {
    fn start(&mut self, status_line: &str, headers: &[(String, String)]);
    fn write_chunk(&mut self, chunk: &[u8]);
}
