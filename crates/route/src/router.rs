use crate::controller::{ControllerTable, Handler};
use crate::{DirectiveSet, RouteError};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type InnerRouter<T> = matchit::Router<T>;

/// Ordered path variables captured while matching a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteVars {
    vars: Vec<(String, String)>,
}

impl RouteVars {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn last(&self) -> Option<(&str, &str)> {
        self.vars.last().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Just the last captured variable, the default argument set for a
    /// dispatch target.
    pub fn last_var(&self) -> RouteVars {
        Self { vars: self.vars.last().cloned().into_iter().collect() }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl From<matchit::Params<'_, '_>> for RouteVars {
    fn from(params: matchit::Params<'_, '_>) -> Self {
        Self {
            vars: params.iter().map(|(n, v)| (n.to_owned(), v.to_owned())).collect(),
        }
    }
}

impl FromIterator<(String, String)> for RouteVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().collect() }
    }
}

/// One registered (method, URI pattern, target) entry.
pub struct Route {
    method: Method,
    pattern: String,
    target: Target,
}

enum Target {
    /// A fixed controller/action pair, checked when the router is built.
    Fixed {
        controller: Arc<ControllerTable>,
        action: String,
    },
    /// The action name comes from a path variable at match time.
    Dynamic {
        controller: Arc<ControllerTable>,
        var_name: String,
    },
    /// An arbitrary callback with explicitly registered directives.
    Custom {
        name: String,
        directives: DirectiveSet,
        handler: Arc<Handler>,
    },
}

impl Route {
    pub fn fixed(
        method: Method,
        pattern: impl Into<String>,
        controller: Arc<ControllerTable>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            target: Target::Fixed { controller, action: action.into() },
        }
    }

    /// The path variable `var_name` names the action; hyphens in its value
    /// are dropped before lookup.
    pub fn dynamic(
        method: Method,
        pattern: impl Into<String>,
        controller: Arc<ControllerTable>,
        var_name: impl Into<String>,
    ) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            target: Target::Dynamic { controller, var_name: var_name.into() },
        }
    }

    pub fn custom(
        method: Method,
        pattern: impl Into<String>,
        name: impl Into<String>,
        directives: DirectiveSet,
        handler: Arc<Handler>,
    ) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            target: Target::Custom { name: name.into(), directives, handler },
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn validate(&self) -> Result<(), RouteError> {
        if let Target::Fixed { controller, action } = &self.target {
            if controller.get(action).is_none() {
                return Err(RouteError::invalid_route(
                    controller.name(),
                    action,
                    "action is not registered in the controller table",
                ));
            }
        }

        Ok(())
    }

    fn resolve(&self, vars: RouteVars) -> Result<RouteTarget, RouteError> {
        match &self.target {
            Target::Fixed { controller, action } => {
                let registered = controller.get(action).ok_or_else(|| {
                    RouteError::invalid_route(controller.name(), action, "unknown action")
                })?;

                Ok(RouteTarget {
                    controller: controller.name().to_owned(),
                    action: action.clone(),
                    directives: controller.merged_directives(registered),
                    handler: Arc::clone(registered.handler()),
                    vars,
                })
            }
            Target::Dynamic { controller, var_name } => {
                let raw = vars.get(var_name).ok_or_else(|| {
                    RouteError::invalid_route(
                        controller.name(),
                        var_name,
                        format!("route variable '{var_name}' was not captured"),
                    )
                })?;

                let action = raw.replace('-', "");
                let registered = controller
                    .get(&action)
                    .ok_or_else(|| RouteError::not_found(format!("unknown endpoint: {raw}")))?;

                Ok(RouteTarget {
                    controller: controller.name().to_owned(),
                    directives: controller.merged_directives(registered),
                    handler: Arc::clone(registered.handler()),
                    action,
                    vars,
                })
            }
            Target::Custom { name, directives, handler } => Ok(RouteTarget {
                controller: name.clone(),
                action: self.pattern.clone(),
                directives: directives.clone(),
                handler: Arc::clone(handler),
                vars,
            }),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Target::Fixed { controller, action } => format!("{}::{}", controller.name(), action),
            Target::Dynamic { controller, var_name } => format!("{}::{{{}}}", controller.name(), var_name),
            Target::Custom { name, .. } => format!("custom {name}"),
        };

        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("target", &target)
            .finish()
    }
}

/// The resolved bundle for one dispatched request: the callable, the
/// captured path variables and the merged directive set.
pub struct RouteTarget {
    controller: String,
    action: String,
    directives: DirectiveSet,
    handler: Arc<Handler>,
    vars: RouteVars,
}

impl RouteTarget {
    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn directives(&self) -> &DirectiveSet {
        &self.directives
    }

    pub fn vars(&self) -> &RouteVars {
        &self.vars
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTarget")
            .field("controller", &self.controller)
            .field("action", &self.action)
            .field("vars", &self.vars)
            .finish()
    }
}

/// An immutable route table over URI patterns, built once at startup.
/// Pattern syntax and matching are delegated to [`matchit`].
#[derive(Debug)]
pub struct Router {
    inner: InnerRouter<Vec<Route>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder { routes: Vec::new() }
    }

    /// Resolves a request to a [`RouteTarget`] or fails with `NotFound` /
    /// `MethodNotAllowed` / `InvalidRoute`.
    pub fn dispatch_request(&self, method: &Method, path: &str) -> Result<RouteTarget, RouteError> {
        let matched = self.inner.at(path).map_err(|_| RouteError::not_found(path))?;
        let vars = RouteVars::from(matched.params);

        let route = matched
            .value
            .iter()
            .find(|route| route.method == *method)
            .ok_or_else(|| RouteError::method_not_allowed(method.clone(), path))?;

        route.resolve(vars)
    }
}

#[derive(Debug)]
pub struct RouterBuilder {
    routes: Vec<Route>,
}

impl RouterBuilder {
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Fixed targets are checked against their controller tables here, so a
    /// mis-registered action fails at startup rather than at match time.
    pub fn build(self) -> Result<Router, RouteError> {
        let mut grouped: HashMap<String, Vec<Route>> = HashMap::new();

        for route in self.routes {
            route.validate()?;
            grouped.entry(route.pattern.clone()).or_default().push(route);
        }

        let mut inner = InnerRouter::new();

        for (pattern, routes) in grouped {
            inner
                .insert(pattern.clone(), routes)
                .map_err(|e| RouteError::invalid_pattern(pattern, e))?;
        }

        Ok(Router { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::action_fn;
    use serde_json::json;

    fn controller() -> Arc<ControllerTable> {
        Arc::new(
            ControllerTable::new("widget", DirectiveSet::parse("@jsonResponder"))
                .action("show", DirectiveSet::empty(), action_fn(|_, _| Ok(json!({"op": "show"}))))
                .action("list", DirectiveSet::empty(), action_fn(|_, _| Ok(json!({"op": "list"})))),
        )
    }

    fn router() -> Router {
        Router::builder()
            .route(Route::fixed(Method::GET, "/widgets/{id}", controller(), "show"))
            .route(Route::dynamic(Method::GET, "/widget/{method}", controller(), "method"))
            .route(Route::custom(
                Method::POST,
                "/ping",
                "ping",
                DirectiveSet::builder().tag("jsonresponder").build(),
                action_fn(|_, _| Ok(json!({"pong": true}))),
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn fixed_routes_capture_vars_and_merge_directives() {
        let target = router().dispatch_request(&Method::GET, "/widgets/42").unwrap();

        assert_eq!(target.controller(), "widget");
        assert_eq!(target.action(), "show");
        assert_eq!(target.vars().get("id"), Some("42"));
        assert!(target.directives().has_flag("jsonresponder", false));
    }

    #[test]
    fn dynamic_routes_resolve_the_action_from_a_path_variable() {
        let target = router().dispatch_request(&Method::GET, "/widget/list").unwrap();

        assert_eq!(target.action(), "list");
    }

    #[test]
    fn dynamic_action_names_drop_hyphens_and_fold_case() {
        let controller = Arc::new(
            ControllerTable::new("widget", DirectiveSet::empty()).action(
                "recentitems",
                DirectiveSet::empty(),
                action_fn(|_, _| Ok(json!({}))),
            ),
        );
        let router = Router::builder()
            .route(Route::dynamic(Method::GET, "/widget/{method}", controller, "method"))
            .build()
            .unwrap();

        let target = router.dispatch_request(&Method::GET, "/widget/Recent-Items").unwrap();
        assert_eq!(target.action(), "RecentItems");
    }

    #[test]
    fn unknown_dynamic_action_is_not_found() {
        let result = router().dispatch_request(&Method::GET, "/widget/missing");

        assert!(matches!(result, Err(RouteError::NotFound { .. })));
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let result = router().dispatch_request(&Method::GET, "/nope");

        assert!(matches!(result, Err(RouteError::NotFound { .. })));
    }

    #[test]
    fn wrong_method_is_method_not_allowed() {
        let result = router().dispatch_request(&Method::DELETE, "/ping");

        assert!(matches!(result, Err(RouteError::MethodNotAllowed { .. })));
    }

    #[test]
    fn unregistered_fixed_action_fails_at_build() {
        let result = Router::builder()
            .route(Route::fixed(Method::GET, "/widgets", controller(), "missing"))
            .build();

        assert!(matches!(result, Err(RouteError::InvalidRoute { .. })));
    }

    #[test]
    fn conflicting_patterns_fail_at_build() {
        let result = Router::builder()
            .route(Route::fixed(Method::GET, "/widgets/{id}", controller(), "show"))
            .route(Route::fixed(Method::GET, "/widgets/{name}", controller(), "show"))
            .build();

        assert!(matches!(result, Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn last_var_keeps_only_the_final_capture() {
        let target = router().dispatch_request(&Method::GET, "/widgets/7").unwrap();
        let vars = target.vars().last_var();

        assert_eq!(vars.len(), 1);
        assert_eq!(vars.last(), Some(("id", "7")));
    }
}
