use crate::router::RouteVars;
use crate::{DirectiveSet, HandlerError, Request, Session};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A dispatchable handler: takes the request-scoped context and the route
/// variables chosen for it, returns a JSON payload or an application failure.
pub type Handler =
    dyn Fn(&mut RequestScope<'_>, &RouteVars) -> Result<serde_json::Value, HandlerError> + Send + Sync;

pub fn action_fn<F>(f: F) -> Arc<Handler>
where
    F: Fn(&mut RequestScope<'_>, &RouteVars) -> Result<serde_json::Value, HandlerError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Everything a handler may touch during one request: the request itself and
/// an optionally attached session. Constructed once per request and passed
/// down the call chain.
pub struct RequestScope<'a> {
    request: &'a Request,
    session: Option<&'a mut Session>,
}

impl<'a> RequestScope<'a> {
    pub fn new(request: &'a Request) -> Self {
        Self { request, session: None }
    }

    pub fn with_session(request: &'a Request, session: &'a mut Session) -> Self {
        Self { request, session: Some(session) }
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn session(&mut self) -> Option<&mut Session> {
        self.session.as_deref_mut()
    }
}

impl fmt::Debug for RequestScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("request", &self.request)
            .field("session", &self.session.is_some())
            .finish()
    }
}

/// One registered action: its directive set plus the function to invoke.
#[derive(Clone)]
pub struct Action {
    directives: DirectiveSet,
    handler: Arc<Handler>,
}

impl Action {
    pub fn directives(&self) -> &DirectiveSet {
        &self.directives
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("directives", &self.directives).finish()
    }
}

/// The declarative per-controller dispatch table: a controller-level
/// directive set plus named actions, built once at startup. This replaces
/// runtime reflection over doc comments; the directive sets can still be
/// sourced from documentation text via [`DirectiveSet::parse`].
///
/// Action names are case-insensitive, matching the method lookup the table
/// stands in for.
#[derive(Debug, Clone)]
pub struct ControllerTable {
    name: String,
    directives: DirectiveSet,
    actions: HashMap<String, Action>,
}

impl ControllerTable {
    pub fn new(name: impl Into<String>, directives: DirectiveSet) -> Self {
        Self {
            name: name.into(),
            directives,
            actions: HashMap::new(),
        }
    }

    pub fn action(mut self, name: &str, directives: DirectiveSet, handler: Arc<Handler>) -> Self {
        self.actions
            .insert(name.to_ascii_lowercase(), Action { directives, handler });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directives(&self) -> &DirectiveSet {
        &self.directives
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(&name.to_ascii_lowercase())
    }

    /// The action's directives merged over the controller's, action-level
    /// winning for overlapping tags.
    pub fn merged_directives(&self, action: &Action) -> DirectiveSet {
        self.directives.merge(&action.directives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ControllerTable {
        ControllerTable::new("widget", DirectiveSet::parse("@jsonResponder\n@extraVars"))
            .action(
                "show",
                DirectiveSet::parse("@extraVars no"),
                action_fn(|_, _| Ok(json!({}))),
            )
    }

    #[test]
    fn action_lookup_is_case_insensitive() {
        let table = table();

        assert!(table.get("show").is_some());
        assert!(table.get("Show").is_some());
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn merged_directives_prefer_the_action() {
        let table = table();
        let action = table.get("show").unwrap();
        let merged = table.merged_directives(action);

        assert!(merged.has_flag("jsonresponder", false));
        assert!(!merged.has_flag("extravars", false));
    }
}
