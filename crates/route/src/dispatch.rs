use crate::{
    DirectiveSet, DispatchError, RequestScope, ResponseWriter, RouteError, RouteTarget, Router,
};
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Map, Value};
use std::io::{self, Write};
use tracing::{error, warn};

const RESPONDER_FLAG: &str = "jsonresponder";
const EXTRA_VARS_FLAG: &str = "extravars";
const HEADER_TAG: &str = "header";

/// Drives one request from route resolution to a single response write.
///
/// Routing failures and application failures both end up as the uniform
/// JSON envelope `{"success": false, "message": ...}`; nothing propagates
/// past this boundary except I/O errors from the sink itself.
#[derive(Debug)]
pub struct Dispatcher {
    router: Router,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn handle<W: Write>(
        &self,
        scope: &mut RequestScope<'_>,
        writer: &mut ResponseWriter<W>,
    ) -> io::Result<()> {
        let method = scope.request().method().clone();
        let path = scope.request().path().to_owned();

        let outcome = match self.router.dispatch_request(&method, &path) {
            Ok(target) => respond(&target, scope, writer),
            Err(e) => Err(DispatchError::Route(e)),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(DispatchError::Route(e)) => {
                let status = e.status();

                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %e, "dispatch failed");
                }

                let body = serialize(&failure_envelope(&e.to_string()))?;
                writer.send(status, &response_headers(&DirectiveSet::empty()), &body)?;
                Ok(())
            }
            Err(DispatchError::Io { source }) => Err(source),
        }
    }
}

/// The responder state machine for one resolved target.
///
/// The merged directive set must enable the JSON responder mode, or the
/// target is not dispatchable and the handler is never invoked. The
/// `extravars` flag decides whether the handler sees every captured route
/// variable or only the last one (the default).
pub fn respond<W: Write>(
    target: &RouteTarget,
    scope: &mut RequestScope<'_>,
    writer: &mut ResponseWriter<W>,
) -> Result<(), DispatchError> {
    let directives = target.directives();

    if !directives.has_flag(RESPONDER_FLAG, false) {
        return Err(RouteError::invalid_route(
            target.controller(),
            target.action(),
            "target does not enable a responder mode",
        )
        .into());
    }

    let vars = if directives.has_flag(EXTRA_VARS_FLAG, false) {
        target.vars().clone()
    } else {
        target.vars().last_var()
    };

    let (status, envelope) = match (target.handler())(scope, &vars) {
        Ok(payload) => (StatusCode::OK, success_envelope(payload)),
        Err(e) => {
            let status = e.resolved_status();

            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(
                    controller = target.controller(),
                    action = target.action(),
                    error = %e,
                    "handler failed"
                );
            }

            (status, failure_envelope(e.message()))
        }
    };

    let body = serialize(&envelope)?;
    writer.send(status, &response_headers(directives), &body)?;

    Ok(())
}

/// `{"success": true}` merged with the payload; an object merges key by key
/// (the payload may override `success`), a bare value lands under `result`.
fn success_envelope(payload: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_owned(), Value::Bool(true));

    match payload {
        Value::Object(fields) => envelope.extend(fields),
        Value::Null => {}
        other => {
            envelope.insert("result".to_owned(), other);
        }
    }

    Value::Object(envelope)
}

fn failure_envelope(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

fn serialize(envelope: &Value) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Headers from `@header <name> <value>` directives, applied in order with
/// the last registration for a name winning; content-type defaults to JSON
/// unless a directive set it.
fn response_headers(directives: &DirectiveSet) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for line in directives.values(HEADER_TAG) {
        let Some((name, value)) = line.split_once(|c: char| c.is_whitespace()) else {
            warn!(directive = line.as_str(), "ignoring header directive without a value");
            continue;
        };

        match (name.parse::<HeaderName>(), value.trim().parse::<HeaderValue>()) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(directive = line.as_str(), "ignoring malformed header directive"),
        }
    }

    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::action_fn;
    use crate::{ControllerTable, Request, Route};
    use http::Method;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn dispatcher(route: Route) -> Dispatcher {
        Dispatcher::new(Router::builder().route(route).build().unwrap())
    }

    fn run(dispatcher: &Dispatcher, method: Method, path: &str) -> (String, Value) {
        let request = Request::builder(method, path).build();
        let mut scope = RequestScope::new(&request);
        let mut writer = ResponseWriter::new(Vec::new());

        dispatcher.handle(&mut scope, &mut writer).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let (head, body) = output.split_once("\r\n\r\n").unwrap();
        let envelope = serde_json::from_str(body).unwrap();

        (head.to_owned(), envelope)
    }

    fn widget_controller() -> Arc<ControllerTable> {
        Arc::new(
            ControllerTable::new("widget", DirectiveSet::empty()).action(
                "show",
                DirectiveSet::parse("@jsonResponder"),
                action_fn(|_, vars| {
                    assert_eq!(vars.len(), 1);
                    assert_eq!(vars.last(), Some(("id", "42")));
                    Ok(json!({ "name": "x" }))
                }),
            ),
        )
    }

    #[test]
    fn success_payload_merges_into_the_envelope() {
        let dispatcher = dispatcher(Route::fixed(
            Method::GET,
            "/widgets/{id}",
            widget_controller(),
            "show",
        ));

        let (head, envelope) = run(&dispatcher, Method::GET, "/widgets/42");

        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("content-type: application/json"));
        assert_eq!(envelope, json!({ "success": true, "name": "x" }));
    }

    #[test]
    fn handler_failure_without_a_status_maps_to_500() {
        let controller = Arc::new(ControllerTable::new("widget", DirectiveSet::empty()).action(
            "show",
            DirectiveSet::parse("@jsonResponder"),
            action_fn(|_, _| Err(crate::HandlerError::new("nope"))),
        ));
        let dispatcher = dispatcher(Route::fixed(Method::GET, "/widgets/{id}", controller, "show"));

        let (head, envelope) = run(&dispatcher, Method::GET, "/widgets/42");

        assert!(head.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(envelope, json!({ "success": false, "message": "nope" }));
    }

    #[test]
    fn handler_failure_keeps_its_own_status() {
        let controller = Arc::new(ControllerTable::new("widget", DirectiveSet::empty()).action(
            "show",
            DirectiveSet::parse("@jsonResponder"),
            action_fn(|_, _| Err(crate::HandlerError::forbidden("members only"))),
        ));
        let dispatcher = dispatcher(Route::fixed(Method::GET, "/widgets/{id}", controller, "show"));

        let (head, envelope) = run(&dispatcher, Method::GET, "/widgets/42");

        assert!(head.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert_eq!(envelope, json!({ "success": false, "message": "members only" }));
    }

    #[test]
    fn missing_responder_directive_is_invalid_route_before_invocation() {
        let invoked = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&invoked);
        let controller = Arc::new(ControllerTable::new("widget", DirectiveSet::empty()).action(
            "show",
            DirectiveSet::empty(),
            action_fn(move |_, _| {
                seen.store(true, Ordering::SeqCst);
                Ok(Value::Null)
            }),
        ));
        let router = Router::builder()
            .route(Route::fixed(Method::GET, "/widgets/{id}", controller, "show"))
            .build()
            .unwrap();

        let request = Request::builder(Method::GET, "/widgets/42").build();
        let mut scope = RequestScope::new(&request);
        let mut writer = ResponseWriter::new(Vec::new());
        let target = router.dispatch_request(&Method::GET, "/widgets/42").unwrap();

        let result = respond(&target, &mut scope, &mut writer);

        assert!(matches!(
            result,
            Err(DispatchError::Route(RouteError::InvalidRoute { .. }))
        ));
        assert!(!invoked.load(Ordering::SeqCst));
        assert!(!writer.is_sent());
    }

    #[test]
    fn extra_vars_forwards_every_capture() {
        let controller = Arc::new(ControllerTable::new("widget", DirectiveSet::empty()).action(
            "show",
            DirectiveSet::parse("@jsonResponder\n@extraVars"),
            action_fn(|_, vars| {
                assert_eq!(vars.len(), 2);
                assert_eq!(vars.get("group"), Some("a"));
                assert_eq!(vars.get("id"), Some("42"));
                Ok(Value::Null)
            }),
        ));
        let dispatcher = dispatcher(Route::fixed(
            Method::GET,
            "/widgets/{group}/{id}",
            controller,
            "show",
        ));

        let (_, envelope) = run(&dispatcher, Method::GET, "/widgets/a/42");

        assert_eq!(envelope, json!({ "success": true }));
    }

    #[test]
    fn header_directives_shape_the_response() {
        let controller = Arc::new(ControllerTable::new("widget", DirectiveSet::empty()).action(
            "show",
            DirectiveSet::parse(
                "@jsonResponder\n@header X-Frame-Options DENY\n@header Content-Type text/json",
            ),
            action_fn(|_, _| Ok(Value::Null)),
        ));
        let dispatcher = dispatcher(Route::fixed(Method::GET, "/widgets/{id}", controller, "show"));

        let (head, _) = run(&dispatcher, Method::GET, "/widgets/42");

        assert!(head.contains("x-frame-options: DENY"));
        assert!(head.contains("content-type: text/json"));
        assert!(!head.contains("application/json"));
    }

    #[test]
    fn bare_payloads_land_under_result() {
        let controller = Arc::new(ControllerTable::new("widget", DirectiveSet::empty()).action(
            "count",
            DirectiveSet::parse("@jsonResponder"),
            action_fn(|_, _| Ok(json!(3))),
        ));
        let dispatcher = dispatcher(Route::fixed(Method::GET, "/widgets", controller, "count"));

        let (_, envelope) = run(&dispatcher, Method::GET, "/widgets");

        assert_eq!(envelope, json!({ "success": true, "result": 3 }));
    }

    #[test]
    fn unknown_routes_produce_the_error_envelope() {
        let dispatcher = dispatcher(Route::fixed(
            Method::GET,
            "/widgets/{id}",
            widget_controller(),
            "show",
        ));

        let (head, envelope) = run(&dispatcher, Method::GET, "/nope");

        assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["message"].as_str().unwrap().contains("/nope"));
    }

    #[test]
    fn wrong_method_produces_a_405_envelope() {
        let dispatcher = dispatcher(Route::fixed(
            Method::GET,
            "/widgets/{id}",
            widget_controller(),
            "show",
        ));

        let (head, envelope) = run(&dispatcher, Method::POST, "/widgets/42");

        assert!(head.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert_eq!(envelope["success"], json!(false));
    }
}
