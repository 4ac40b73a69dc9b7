//! Shared test support: wire-environment builders and a recording sink.
#![allow(dead_code)]

use std::io::Cursor;

use gantry::{ResponseSink, WireEnv};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once per process; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Base wire environment the way a transport would hand it over.
pub fn request_env(method: &str, path: &str) -> WireEnv {
    WireEnv::new(method, path)
        .with_wire_header("HTTP_HOST", "localhost:8080")
        .with_wire_header("HTTP_USER_AGENT", "test client")
}

/// Attach a query string built from pairs (no encoding, by design).
pub fn with_params(env: WireEnv, params: &[(&str, &str)]) -> WireEnv {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    env.with_query_string(query)
}

/// Attach a body and declare its length the way a gateway does, via the
/// content-length header entry.
pub fn with_body(env: WireEnv, body: &[u8]) -> WireEnv {
    let len = body.len();
    env.with_wire_header("HTTP_CONTENT_LENGTH", len.to_string())
        .with_input(Box::new(Cursor::new(body.to_vec())), None)
}

/// Attach a raw cookie header entry.
pub fn with_cookies(env: WireEnv, raw: &str) -> WireEnv {
    env.with_wire_header("HTTP_COOKIE", raw)
}

/// Sink that records everything the dispatcher emits.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub status_line: Option<String>,
    pub headers: Vec<(String, String)>,
    pub chunks: Vec<Vec<u8>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numeric status code parsed off the status line.
    pub fn status_code(&self) -> u16 {
        self.status_line
            .as_deref()
            .and_then(|line| line.split_whitespace().next())
            .and_then(|code| code.parse().ok())
            .unwrap_or(0)
    }

    /// First header value matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Vec<u8> {
        self.chunks.concat()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }
}

impl ResponseSink for RecordingSink {
    fn start(&mut self, status_line: &str, headers: &[(String, String)]) {
        self.status_line = Some(status_line.to_string());
        self.headers = headers.to_vec();
    }

    fn write_chunk(&mut self, chunk: &[u8]) {
        self.chunks.push(chunk.to_vec());
    }
}
