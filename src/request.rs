//! Inbound message: a typed view over the wire environment with lazily
//! memoized derived fields.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use serde_json::Value;
use tracing::debug;

use crate::cookies::CookieJar;
use crate::error::{HandlerError, HttpError};
use crate::headers::HeaderSet;
use crate::runtime_config::RuntimeConfig;
use crate::wire::WireEnv;

/// Split a raw query string into an argument mapping.
///
/// Pairs split on `&`, names and values on the first `=`; duplicate names
/// keep the last value. No percent-decoding is performed, so values
/// containing `&`, `=`, or percent-escapes parse incorrectly. This is a
/// known limitation kept for wire-format stability.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            (
                parts.next().unwrap_or("").to_string(),
                parts.next().unwrap_or("").to_string(),
            )
        })
        .collect()
}

/// One inbound request plus a back-reference to the shared application
/// state `S`.
///
/// Wraps the wire environment without copying it; every derived field
/// (headers, cookies, body, text, JSON, query arguments) is computed at most
/// once and cached for the single-threaded lifetime of the request. The body
/// stream is physically read at most once; repeated access returns the
/// cached bytes.
pub struct Request<S> {
    method: String,
    path: String,
    query_string: String,
    raw_headers: Vec<(String, String)>,
    declared_length: Option<usize>,
    input: RefCell<Box<dyn Read>>,
    max_body_bytes: usize,
    app: Arc<S>,
    headers: OnceCell<HeaderSet>,
    cookies: OnceCell<CookieJar>,
    body: OnceCell<Vec<u8>>,
    text: OnceCell<String>,
    json: OnceCell<Value>,
    args: OnceCell<HashMap<String, String>>,
}

impl<S> Request<S> {
    /// Build a request from a wire environment with default runtime limits.
    #[must_use]
    pub fn new(env: WireEnv, app: Arc<S>) -> Self {
        Self::with_config(env, app, RuntimeConfig::from_env())
    }

    /// Build a request with explicit runtime limits.
    #[must_use]
    pub fn with_config(env: WireEnv, app: Arc<S>, config: RuntimeConfig) -> Self {
        Request {
            method: env.method,
            path: env.path,
            query_string: env.query_string,
            raw_headers: env.headers,
            declared_length: env.content_length,
            input: RefCell::new(env.input),
            max_body_bytes: config.max_body_bytes,
            app,
            headers: OnceCell::new(),
            cookies: OnceCell::new(),
            body: OnceCell::new(),
            text: OnceCell::new(),
            json: OnceCell::new(),
            args: OnceCell::new(),
        }
    }

    /// Request path, straight off the wire.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP method string, straight off the wire.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Raw query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Shared application state.
    #[must_use]
    pub fn app(&self) -> &S {
        &self.app
    }

    /// Headers, built once from the raw wire entries.
    pub fn headers(&self) -> &HeaderSet {
        self.headers
            .get_or_init(|| HeaderSet::from_wire(&self.raw_headers))
    }

    /// Cookies, parsed once from the headers.
    pub fn cookies(&self) -> &CookieJar {
        self.cookies
            .get_or_init(|| CookieJar::from_headers(self.headers()))
    }

    /// Query arguments, parsed once. Duplicate names keep the last value and
    /// no percent-decoding is performed.
    pub fn args(&self) -> &HashMap<String, String> {
        self.args.get_or_init(|| {
            debug!(query = %self.query_string, "Parsing query arguments");
            parse_query(&self.query_string)
        })
    }

    /// Declared body length: the transport's out-of-band value when present,
    /// otherwise the `content-length` header. Missing or invalid means zero.
    fn content_length(&self) -> usize {
        self.declared_length.unwrap_or_else(|| {
            self.headers()
                .get("content-length")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0)
        })
    }

    /// Raw body bytes.
    ///
    /// Reads exactly the declared number of bytes from the input stream the
    /// first time it is called and caches them; the stream is never read
    /// twice. A declared length beyond the configured cap fails with 413
    /// before touching the stream.
    pub fn body(&self) -> Result<&[u8], HandlerError> {
        if let Some(bytes) = self.body.get() {
            return Ok(bytes);
        }
        let length = self.content_length();
        if length > self.max_body_bytes {
            return Err(HttpError::payload_too_large().into());
        }
        let mut buf = Vec::with_capacity(length);
        {
            let mut input = self.input.borrow_mut();
            let stream: &mut dyn Read = &mut **input;
            stream.take(length as u64).read_to_end(&mut buf)?;
        }
        debug!(declared = length, read = buf.len(), "Request body read");
        Ok(self.body.get_or_init(|| buf))
    }

    /// Body decoded as UTF-8, cached after the first successful decode.
    pub fn text(&self) -> Result<&str, HandlerError> {
        if let Some(text) = self.text.get() {
            return Ok(text);
        }
        let text = std::str::from_utf8(self.body()?)?.to_string();
        Ok(self.text.get_or_init(|| text))
    }

    /// Body parsed as a JSON document, cached after the first successful
    /// parse. Malformed input is a parse failure the dispatcher turns into
    /// a 500.
    pub fn json(&self) -> Result<&Value, HandlerError> {
        if let Some(value) = self.json.get() {
            return Ok(value);
        }
        let value: Value = serde_json::from_str(self.text()?)?;
        Ok(self.json.get_or_init(|| value))
    }
}

impl<S> fmt::Debug for Request<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_string", &self.query_string)
            .finish_non_exhaustive()
    }
}
