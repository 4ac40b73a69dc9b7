//! # gantry
//!
//! **gantry** is a minimal request-dispatch core for HTTP-style services:
//! it maps an incoming (path, method) pair to a registered handler, extracts
//! path-captured arguments, and wraps the raw wire-level environment in typed
//! request/response messages with uniform error-to-response translation.
//!
//! The transport layer (sockets, gateways, process management) is
//! deliberately out of scope. A host hands each request over as a
//! [`WireEnv`] and receives the rendered output through a [`ResponseSink`];
//! everything in between is this crate.
//!
//! ## Architecture
//!
//! - **[`headers`]** - case-insensitive, multi-value header collection
//! - **[`cookies`]** - cookie jar with wire (de)serialization
//! - **[`wire`]** - the inbound wire environment and the outbound emission callback
//! - **[`request`]** - typed request view with lazily memoized derived fields
//! - **[`response`]** - response construction variants and wire rendering
//! - **[`error`]** - the HTTP error taxonomy and handler-level error type
//! - **[`router`]** - pattern-based route table with method-aware resolution
//! - **[`app`]** - the dispatcher tying the pieces into one request cycle
//! - **[`runtime_config`]** - environment-variable runtime tuning
//!
//! ## Request Handling Flow
//!
//! 1. The host builds a [`WireEnv`] and calls [`App::handle`]
//! 2. The dispatcher wraps it in a [`Request`], injecting the shared state
//! 3. [`Router::search_route`] resolves the (path, method) pair, path first
//!    then method, so a wrong-method hit on a known path is 405, never 404
//! 4. The handler runs with the request and the captured path arguments
//! 5. The resulting [`Response`] (or the rendering of whatever failure
//!    occurred along the way) is emitted through the [`ResponseSink`]
//!
//! Routing failures, handler errors, and handler panics all funnel through
//! the same finalization step; no request-time failure escapes to the host.
//!
//! ## Quick Start
//!
//! ```
//! use gantry::{App, Response, WireEnv, ResponseSink};
//!
//! struct NoSink;
//! impl ResponseSink for NoSink {
//!     fn start(&mut self, _status: &str, _headers: &[(String, String)]) {}
//!     fn write_chunk(&mut self, _chunk: &[u8]) {}
//! }
//!
//! let mut app = App::new(());
//! app.router_mut()
//!     .add_get(r"/hello/(?P<name>[a-z]+)", |_req, args| {
//!         let name = args.get("name").unwrap_or("world");
//!         Ok(Response::text(format!("Hello {name}!")))
//!     })
//!     .unwrap();
//!
//! app.handle(WireEnv::new("GET", "/hello/rust"), &mut NoSink);
//! ```
//!
//! ## Concurrency
//!
//! Dispatch is synchronous and stateless across calls. The route table is
//! built during setup and read-only while serving, so the host may invoke
//! [`App::handle`] from as many threads as it likes; shared application
//! state travels behind an `Arc` and owns its own synchronization.

pub mod app;
pub mod cookies;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod wire;

pub use app::{AfterResponseHook, App, BeforeResponseHook};
pub use cookies::CookieJar;
pub use error::{HandlerError, HttpError};
pub use headers::HeaderSet;
pub use request::Request;
pub use response::{reason_phrase, Response, ResponseBody, UnknownStatus};
pub use router::{Handler, PathArgs, Route, RouteError, RouteOutcome, Router};
pub use runtime_config::RuntimeConfig;
pub use wire::{ResponseSink, WireEnv};
