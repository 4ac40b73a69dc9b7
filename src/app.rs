//! The dispatcher: composes the router, the message wrappers, and the error
//! taxonomy into one synchronous request-response cycle.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::{HandlerError, HttpError};
use crate::request::Request;
use crate::response::Response;
use crate::router::{RouteOutcome, Router};
use crate::runtime_config::RuntimeConfig;
use crate::wire::{ResponseSink, WireEnv};

/// Hook applied to every request before routing. May replace the request.
pub type BeforeResponseHook<S> =
    Box<dyn Fn(Request<S>) -> Result<Request<S>, HandlerError> + Send + Sync>;

/// Hook applied to every handler response before rendering. May replace the
/// response.
pub type AfterResponseHook =
    Box<dyn Fn(Response) -> Result<Response, HandlerError> + Send + Sync>;

/// Best-effort text out of a panic payload, for the server-side log.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// One application instance: owns the route table, the shared state `S`,
/// and the optional request/response hooks.
///
/// Dispatch is synchronous and stateless across calls: one wire environment
/// in, one rendered output out. Concurrency is the host transport's business:
/// it may call [`App::handle`] from many threads at once, because the route
/// table is read-only after setup and the shared state is behind an `Arc`
/// (mutation is the application's responsibility, via interior mutability).
pub struct App<S> {
    router: Router<S>,
    state: Arc<S>,
    config: RuntimeConfig,
    before_response: Option<BeforeResponseHook<S>>,
    after_response: Option<AfterResponseHook>,
}

impl<S> App<S> {
    /// Create an application around the given shared state, with runtime
    /// limits read from the environment.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self::with_config(state, RuntimeConfig::from_env())
    }

    /// Create an application with explicit runtime limits.
    #[must_use]
    pub fn with_config(state: S, config: RuntimeConfig) -> Self {
        App {
            router: Router::new(),
            state: Arc::new(state),
            config,
            before_response: None,
            after_response: None,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router<S> {
        &self.router
    }

    /// Mutable route table access, for registration during setup.
    pub fn router_mut(&mut self) -> &mut Router<S> {
        &mut self.router
    }

    /// The shared state handle injected into every request.
    #[must_use]
    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Install a hook that runs before routing and may replace the request.
    pub fn set_before_response<F>(&mut self, hook: F)
    where
        F: Fn(Request<S>) -> Result<Request<S>, HandlerError> + Send + Sync + 'static,
    {
        self.before_response = Some(Box::new(hook));
    }

    /// Install a hook that runs after the handler and may replace the
    /// response.
    pub fn set_after_response<F>(&mut self, hook: F)
    where
        F: Fn(Response) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.after_response = Some(Box::new(hook));
    }

    /// Serve one request: build the response (or the error's render target)
    /// and emit it through the sink.
    ///
    /// Every code path ends in a rendered response. HTTP failures render
    /// themselves; anything else, including a handler panic, is logged and
    /// replaced with a generic 500. Nothing propagates to the caller.
    pub fn handle(&self, env: WireEnv, sink: &mut dyn ResponseSink) {
        let method = env.method.clone();
        let path = env.path.clone();

        let response = match catch_unwind(AssertUnwindSafe(|| self.respond(env))) {
            Ok(Ok(response)) => response,
            Ok(Err(HandlerError::Http(err))) => {
                warn!(
                    method = %method,
                    path = %path,
                    code = err.code(),
                    error = %err,
                    "Request failed"
                );
                err.into_response()
            }
            Ok(Err(HandlerError::Other(err))) => {
                error!(
                    method = %method,
                    path = %path,
                    error = ?err,
                    "Unhandled failure while serving request"
                );
                HttpError::internal_server_error().into_response()
            }
            Err(payload) => {
                error!(
                    method = %method,
                    path = %path,
                    panic = %panic_message(payload.as_ref()),
                    "Handler panicked"
                );
                HttpError::internal_server_error().into_response()
            }
        };

        if let Err(err) = response.send(sink) {
            error!(error = %err, "Status line rendering failed; substituting 500");
            // 500 is always in the phrase table, so this send cannot fail.
            let _ = HttpError::internal_server_error().into_response().send(sink);
        }
    }

    fn respond(&self, env: WireEnv) -> Result<Response, HandlerError> {
        debug!(method = %env.method, path = %env.path, "Building request from wire environment");
        let mut request = Request::with_config(env, Arc::clone(&self.state), self.config);

        if let Some(hook) = &self.before_response {
            debug!("Preprocessing request with before_response hook");
            request = hook(request)?;
        }

        let (handler, args) = match self.router.search_route(request.path(), request.method()) {
            RouteOutcome::Found { handler, args } => (handler, args),
            RouteOutcome::NotFound { path } => return Err(HttpError::not_found(path).into()),
            RouteOutcome::MethodNotAllowed => return Err(HttpError::method_not_allowed().into()),
        };

        let mut response = handler(&request, &args)?;

        if let Some(hook) = &self.after_response {
            debug!("Postprocessing response with after_response hook");
            response = hook(response)?;
        }

        Ok(response)
    }
}
