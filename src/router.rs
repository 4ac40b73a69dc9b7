//! Pattern-matching route table and dispatch resolution.
//!
//! Patterns are regular expressions, anchored on registration and compiled
//! once. Resolution scans the table in registration order: the path filter
//! runs first and the method filter second, so a known path hit with the
//! wrong method reports 405, never 404. Among method matches the earliest
//! registered route wins, independent of specificity.

use std::fmt;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::HandlerError;
use crate::request::Request;
use crate::response::Response;

/// Maximum inline path captures before heap allocation.
/// Most route patterns bind ≤4 names.
pub const MAX_INLINE_PARAMS: usize = 8;

/// A request handler: takes the request and the captured path arguments,
/// returns a response or a failure for the dispatcher to render.
pub type Handler<S> =
    Arc<dyn Fn(&Request<S>, &PathArgs) -> Result<Response, HandlerError> + Send + Sync>;

/// Arguments captured from the path pattern's named groups.
///
/// Unmatched optional groups are absent. Lookups use last-write-wins
/// semantics when a name somehow repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    params: SmallVec<[(String, String); MAX_INLINE_PARAMS]>,
}

impl PathArgs {
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn push(&mut self, name: String, value: String) {
        self.params.push((name, value));
    }
}

/// One registered route. Immutable once registered.
pub struct Route<S> {
    method: Method,
    pattern: Regex,
    pattern_source: String,
    capture_names: Vec<String>,
    handler: Handler<S>,
}

impl<S> Route<S> {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The anchored pattern source the route was registered under.
    #[must_use]
    pub fn pattern_source(&self) -> &str {
        &self.pattern_source
    }

    /// Names of the captures the pattern implies.
    #[must_use]
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }
}

impl<S> fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern_source", &self.pattern_source)
            .field("capture_names", &self.capture_names)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving a (path, method) pair against the route table.
pub enum RouteOutcome<S> {
    /// A route matched; the handler and the captured arguments.
    Found { handler: Handler<S>, args: PathArgs },
    /// No pattern matched the path.
    NotFound { path: String },
    /// The path is known but not for this method.
    MethodNotAllowed,
}

impl<S> fmt::Debug for RouteOutcome<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteOutcome::Found { args, .. } => {
                f.debug_struct("Found").field("args", args).finish_non_exhaustive()
            }
            RouteOutcome::NotFound { path } => {
                f.debug_struct("NotFound").field("path", path).finish()
            }
            RouteOutcome::MethodNotAllowed => f.write_str("MethodNotAllowed"),
        }
    }
}

/// Registration-time failure. Intended to abort startup, not to be recovered
/// at request time.
#[derive(Debug)]
pub enum RouteError {
    /// An identical (pattern, method) pair is already registered. Detection
    /// is syntactic on the anchored pattern string, not semantic.
    Conflict { pattern: String, method: Method },
    /// The pattern failed to compile.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Conflict { pattern, method } => {
                write!(f, "route {method} {pattern} is already registered")
            }
            RouteError::InvalidPattern { pattern, source } => {
                write!(f, "invalid route pattern {pattern}: {source}")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Conflict { .. } => None,
            RouteError::InvalidPattern { source, .. } => Some(source),
        }
    }
}

/// Anchor a pattern so it matches whole paths only.
fn anchor(pattern: &str) -> String {
    let mut anchored = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(pattern);
    if !pattern.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

/// Insertion-ordered route table with first-match-wins resolution.
///
/// Routes are registered during application setup and the table is read-only
/// at request time; lookup is a linear scan over the registered patterns.
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Router<S> {
    #[must_use]
    pub fn new() -> Self {
        Router { routes: Vec::new() }
    }

    /// Register a handler for a (method, pattern) pair.
    ///
    /// The pattern is anchored if not already (`^` prepended, `$` appended)
    /// and compiled once.
    ///
    /// # Errors
    ///
    /// `RouteError::Conflict` when the identical anchored pattern is already
    /// registered for the method; `RouteError::InvalidPattern` when the
    /// pattern does not compile.
    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request<S>, &PathArgs) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        let source = anchor(pattern);
        if self
            .routes
            .iter()
            .any(|route| route.pattern_source == source && route.method == method)
        {
            return Err(RouteError::Conflict {
                pattern: source,
                method,
            });
        }
        let compiled = Regex::new(&source).map_err(|err| RouteError::InvalidPattern {
            pattern: source.clone(),
            source: err,
        })?;
        let capture_names = compiled
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect();
        debug!(method = %method, pattern = %source, "Route registered");
        self.routes.push(Route {
            method,
            pattern: compiled,
            pattern_source: source,
            capture_names,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    pub fn add_get<F>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request<S>, &PathArgs) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn add_post<F>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request<S>, &PathArgs) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::POST, pattern, handler)
    }

    pub fn add_put<F>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request<S>, &PathArgs) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::PUT, pattern, handler)
    }

    pub fn add_patch<F>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request<S>, &PathArgs) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::PATCH, pattern, handler)
    }

    /// Resolve a (path, method) pair.
    ///
    /// Every pattern is evaluated against the path first, regardless of
    /// method; only path matches are then filtered by method. The first
    /// surviving route in registration order wins and its named captures
    /// become the handler's arguments.
    #[must_use]
    pub fn search_route(&self, path: &str, method: &str) -> RouteOutcome<S> {
        let mut path_matched = false;
        for route in &self.routes {
            let Some(caps) = route.pattern.captures(path) else {
                continue;
            };
            path_matched = true;
            if route.method.as_str() != method {
                continue;
            }
            let mut args = PathArgs::default();
            for name in &route.capture_names {
                if let Some(m) = caps.name(name) {
                    args.push(name.clone(), m.as_str().to_string());
                }
            }
            debug!(
                method = %method,
                path = %path,
                pattern = %route.pattern_source,
                args = ?args,
                "Route matched"
            );
            return RouteOutcome::Found {
                handler: Arc::clone(&route.handler),
                args,
            };
        }
        if path_matched {
            warn!(method = %method, path = %path, "Method not allowed for path");
            RouteOutcome::MethodNotAllowed
        } else {
            warn!(path = %path, "Path not found");
            RouteOutcome::NotFound {
                path: path.to_string(),
            }
        }
    }

    /// Registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route<S>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S> fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes).finish()
    }
}
