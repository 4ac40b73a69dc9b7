//! Error taxonomy: the uniform HTTP-failure carrier and the handler-level
//! error type the dispatcher funnels every failure through.

use std::borrow::Cow;
use std::fmt;

use crate::response::{reason_phrase, Response, ResponseBody};

/// Escape `&`, `<`, `>`, and `"` for embedding in the HTML error body.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Uniform carrier for HTTP-level failures.
///
/// Renderable through the same wire contract as a normal [`Response`] via
/// [`HttpError::into_response`], so the dispatcher finalizes a caught error
/// and a handler result identically. Constructed when a failure is detected,
/// consumed once at finalization, never reused.
#[derive(Debug)]
pub struct HttpError {
    code: u16,
    description: Cow<'static, str>,
    /// Offending request path, carried by 404s for logging.
    path: Option<String>,
    /// Pre-built response that bypasses default rendering entirely.
    response: Option<Response>,
}

impl HttpError {
    /// Generic HTTP failure with an arbitrary status code.
    #[must_use]
    pub fn new(code: u16, description: impl Into<Cow<'static, str>>) -> Self {
        HttpError {
            code,
            description: description.into(),
            path: None,
            response: None,
        }
    }

    /// 404 for the given request path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        let mut err = Self::new(404, "The requested URL was not found on the server.");
        err.path = Some(path.into());
        err
    }

    /// 405: the path exists but not for this method.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(405, "The method is not allowed for the requested URL.")
    }

    /// 500, deliberately generic: internal detail never reaches the body.
    #[must_use]
    pub fn internal_server_error() -> Self {
        Self::new(
            500,
            "The server encountered an internal error and was unable to complete your request.",
        )
    }

    /// 413: declared body length exceeds the configured cap.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(413, "The request body exceeds the configured size limit.")
    }

    /// Attach a pre-built response that replaces the default rendering.
    #[must_use]
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Status name from the shared phrase table.
    #[must_use]
    pub fn name(&self) -> &'static str {
        reason_phrase(self.code).unwrap_or("Unknown Error")
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Offending path, present on 404s.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Consume the error into its render target.
    ///
    /// The override response wins when present; otherwise a minimal HTML
    /// page titled `"{code} {name}"` with the escaped description.
    #[must_use]
    pub fn into_response(self) -> Response {
        if let Some(response) = self.response {
            return response;
        }
        let name = escape(self.name());
        let body = format!(
            "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n\
             <title>{code} {name}</title>\n\
             <h1>{name}</h1>\n\
             <p>{description}</p>\n",
            code = self.code,
            name = name,
            description = escape(&self.description),
        );
        let length = body.len();
        Response::new(ResponseBody::Raw(vec![body.into_bytes()]))
            .with_status(self.code)
            .with_header("Content-Type", "text/html")
            .with_header("Content-Length", length.to_string())
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.name(), self.description)?;
        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

/// Any failure escaping a handler, a hook, or request decoding.
///
/// The dispatcher renders `Http` errors as-is and converts everything else
/// into a generic 500 after logging it server-side.
#[derive(Debug)]
pub enum HandlerError {
    /// An HTTP-level failure with its own render target.
    Http(HttpError),
    /// Anything else; internal detail stays out of the response body.
    Other(anyhow::Error),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Http(err) => err.fmt(f),
            HandlerError::Other(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Http(err) => Some(err),
            HandlerError::Other(err) => Some(err.as_ref()),
        }
    }
}

impl From<HttpError> for HandlerError {
    fn from(err: HttpError) -> Self {
        HandlerError::Http(err)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        HandlerError::Other(err)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        HandlerError::Other(err.into())
    }
}

impl From<std::str::Utf8Error> for HandlerError {
    fn from(err: std::str::Utf8Error) -> Self {
        HandlerError::Other(err.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::Other(err.into())
    }
}
