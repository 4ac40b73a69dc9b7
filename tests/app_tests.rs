//! End-to-end dispatch tests: wire environment in, rendered output out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gantry::{App, HttpError, Request, Response, RuntimeConfig, WireEnv};
use serde_json::json;

mod common;
use common::{init_tracing, request_env, with_body, with_cookies, with_params, RecordingSink};

/// Shared application state; mutation goes through the mutex, not the core.
#[derive(Default)]
struct AppData {
    data: Mutex<HashMap<String, String>>,
}

fn make_app() -> App<AppData> {
    init_tracing();
    let mut app = App::new(AppData::default());
    let router = app.router_mut();

    router
        .add_get(r"/$", |_req, _args| Ok(Response::text("Hello World!!!")))
        .unwrap();

    router
        .add_post(r"/data$", |req: &Request<AppData>, _args| {
            let mut count = 0;
            let mut data = req.app().data.lock().unwrap();
            for (key, val) in req.args() {
                data.insert(key.clone(), val.clone());
                count += 1;
            }
            Ok(Response::text(format!("Added {count} arguments")))
        })
        .unwrap();

    router
        .add_get(r"^/data$", |req: &Request<AppData>, _args| {
            let data = req.app().data.lock().unwrap();
            Ok(Response::json(&*data)?)
        })
        .unwrap();

    router
        .add_get(r"^/body$", |req: &Request<AppData>, _args| {
            Ok(Response::text(format!(
                "Received text data: \"{}\"",
                req.text()?
            )))
        })
        .unwrap();

    router
        .add_get(r"^/headers$", |req: &Request<AppData>, _args| {
            let value = req.headers().get("i-am").unwrap_or("nobody");
            Ok(Response::text(format!("I am: {value}")).with_headers(req.headers()))
        })
        .unwrap();

    router
        .add_get(r"^/json$", |req: &Request<AppData>, _args| {
            Ok(Response::json(req.json()?)?)
        })
        .unwrap();

    router
        .add_get(r"^/error$", |_req: &Request<AppData>, _args| {
            panic!("intentional failure")
        })
        .unwrap();

    router
        .add_get(r"^/teapot$", |_req: &Request<AppData>, _args| {
            Err(HttpError::new(418, "short and stout").into())
        })
        .unwrap();

    router
        .add_get(r"^/cookies$", |req: &Request<AppData>, _args| {
            let cookies = req.cookies();
            let mut response = Response::text(format!("Received {} cookies", cookies.len()));
            response.cookies = cookies.clone();
            Ok(response)
        })
        .unwrap();

    router
        .add_get(r"/prod/(?P<id>\d+)/(?P<action>[a-zA-Z]+)", |_req, args| {
            Ok(Response::text(format!(
                "Received action {} to id {}",
                args.get("action").unwrap_or(""),
                args.get("id").unwrap_or("")
            )))
        })
        .unwrap();

    app
}

fn dispatch(app: &App<AppData>, env: WireEnv) -> RecordingSink {
    let mut sink = RecordingSink::new();
    app.handle(env, &mut sink);
    sink
}

#[test]
fn test_index() {
    let app = make_app();
    let sink = dispatch(&app, request_env("GET", "/"));
    assert_eq!(sink.status_line.as_deref(), Some("200 OK"));
    assert_eq!(sink.body_text(), "Hello World!!!\n");
    assert_eq!(sink.header("content-type"), Some("text/plain"));
    assert_eq!(sink.header("content-length"), Some("15"));
}

#[test]
fn test_shared_state_across_requests() {
    let app = make_app();

    let env = with_params(request_env("POST", "/data"), &[("add", "data"), ("and", "more")]);
    let sink = dispatch(&app, env);
    assert_eq!(sink.status_code(), 200);
    assert!(sink.body_text().contains("Added 2 arguments"));

    let sink = dispatch(&app, request_env("GET", "/data"));
    assert_eq!(sink.header("content-type"), Some("application/json"));
    let stored: serde_json::Value = serde_json::from_slice(&sink.body()).unwrap();
    assert_eq!(stored, json!({ "add": "data", "and": "more" }));
}

#[test]
fn test_request_body_round_trip() {
    let app = make_app();
    let sink = dispatch(&app, with_body(request_env("GET", "/body"), b"hello!!!"));
    assert_eq!(sink.body_text(), "Received text data: \"hello!!!\"\n");
}

#[test]
fn test_json_echo() {
    let app = make_app();
    let payload = json!({ "some": "interesting data", "and": "more" });
    let body = serde_json::to_vec(&payload).unwrap();
    let sink = dispatch(&app, with_body(request_env("GET", "/json"), &body));
    assert_eq!(sink.status_code(), 200);
    let echoed: serde_json::Value = serde_json::from_slice(&sink.body()).unwrap();
    assert_eq!(echoed, payload);
}

#[test]
fn test_malformed_json_is_500() {
    let app = make_app();
    let sink = dispatch(&app, with_body(request_env("GET", "/json"), b"not json"));
    assert_eq!(sink.status_code(), 500);
    assert!(sink.body_text().contains("500 Internal Server Error"));
}

#[test]
fn test_header_lookup_is_case_insensitive_end_to_end() {
    let app = make_app();
    let env = request_env("GET", "/headers").with_wire_header("HTTP_I_AM", "terminator!!!");
    let sink = dispatch(&app, env);
    assert!(sink.body_text().contains("terminator!!!"));
    // Request headers were echoed back after the auto headers.
    assert_eq!(sink.header("i-am"), Some("terminator!!!"));
    assert_eq!(sink.header("content-type"), Some("text/plain"));
}

#[test]
fn test_cookies_round_trip() {
    let app = make_app();
    let env = with_cookies(request_env("GET", "/cookies"), "user=me;token=abc");
    let sink = dispatch(&app, env);
    assert!(sink.body_text().contains("2 cookies"));
    assert_eq!(sink.header("set-cookie"), Some("token=abc; user=me"));
}

#[test]
fn test_no_cookie_header_without_cookies() {
    let app = make_app();
    let sink = dispatch(&app, request_env("GET", "/"));
    assert_eq!(sink.header("set-cookie"), None);
}

#[test]
fn test_panicking_handler_yields_500() {
    let app = make_app();
    let sink = dispatch(&app, request_env("GET", "/error"));
    assert_eq!(sink.status_code(), 500);
    assert_eq!(sink.header("content-type"), Some("text/html"));
    let body = sink.body_text();
    assert!(body.contains("500 Internal Server Error"));
    // Internal detail never reaches the body.
    assert!(!body.contains("intentional failure"));
}

#[test]
fn test_http_error_from_handler_renders_itself() {
    let app = make_app();
    let sink = dispatch(&app, request_env("GET", "/teapot"));
    assert_eq!(sink.status_line.as_deref(), Some("418 I'm a teapot"));
    assert!(sink.body_text().contains("short and stout"));
}

#[test]
fn test_unknown_path_is_404() {
    let app = make_app();
    let sink = dispatch(&app, request_env("GET", "/not_found"));
    assert_eq!(sink.status_code(), 404);
    assert!(sink.body_text().contains("404 Not Found"));
}

#[test]
fn test_wrong_method_is_405() {
    let app = make_app();
    let sink = dispatch(&app, request_env("PUT", "/"));
    assert_eq!(sink.status_code(), 405);
    assert!(sink.body_text().contains("405 Method Not Allowed"));
}

#[test]
fn test_captured_path_arguments() {
    let app = make_app();
    let sink = dispatch(&app, request_env("GET", "/prod/11/read"));
    assert_eq!(sink.body_text(), "Received action read to id 11\n");
}

#[test]
fn test_query_values_are_not_percent_decoded() {
    let app = make_app();
    let env = with_params(request_env("POST", "/data"), &[("key", "a%20b")]);
    dispatch(&app, env);
    let sink = dispatch(&app, request_env("GET", "/data"));
    let stored: serde_json::Value = serde_json::from_slice(&sink.body()).unwrap();
    assert_eq!(stored["key"], "a%20b");
}

#[test]
fn test_before_response_hook_replaces_request() {
    let mut app = make_app();
    let state = Arc::clone(app.state());
    app.set_before_response(move |req| {
        if req.path() == "/rewritten" {
            Ok(Request::new(WireEnv::new("GET", "/"), Arc::clone(&state)))
        } else {
            Ok(req)
        }
    });

    let sink = dispatch(&app, request_env("GET", "/rewritten"));
    assert_eq!(sink.body_text(), "Hello World!!!\n");

    // Untouched requests still route normally.
    let sink = dispatch(&app, request_env("GET", "/prod/1/go"));
    assert_eq!(sink.status_code(), 200);
}

#[test]
fn test_after_response_hook_augments_response() {
    let mut app = make_app();
    app.set_after_response(|response| Ok(response.with_header("X-Processed", "1")));
    let sink = dispatch(&app, request_env("GET", "/"));
    assert_eq!(sink.header("x-processed"), Some("1"));
}

#[test]
fn test_failing_hook_renders_like_a_handler_failure() {
    let mut app = make_app();
    app.set_after_response(|_response| Err(HttpError::new(403, "hook says no").into()));
    let sink = dispatch(&app, request_env("GET", "/"));
    assert_eq!(sink.status_code(), 403);
    assert!(sink.body_text().contains("hook says no"));
}

#[test]
fn test_unknown_status_code_falls_back_to_500() {
    let mut app = App::new(AppData::default());
    app.router_mut()
        .add_get("/odd", |_req: &Request<AppData>, _args| {
            Ok(Response::text("x").with_status(999))
        })
        .unwrap();
    let sink = dispatch(&app, request_env("GET", "/odd"));
    assert_eq!(sink.status_code(), 500);
}

#[test]
fn test_oversized_body_yields_413() {
    let mut app = App::with_config(AppData::default(), RuntimeConfig { max_body_bytes: 8 });
    app.router_mut()
        .add_get("/body", |req: &Request<AppData>, _args| {
            Ok(Response::text(req.text()?))
        })
        .unwrap();
    let sink = dispatch(&app, with_body(request_env("GET", "/body"), b"way more than eight"));
    assert_eq!(sink.status_code(), 413);
}
