use http::Method;
use micro_record::ValueMap;
use micro_route::{
    action_fn, ControllerTable, DirectiveSet, Dispatcher, MemorySessionStore, Request, RequestScope,
    ResponseWriter, Route, Router, Session,
};
use serde_json::json;
use std::io::stdout;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn user_controller() -> Arc<ControllerTable> {
    Arc::new(
        ControllerTable::new("user", DirectiveSet::parse("@jsonResponder"))
            .action(
                "show",
                DirectiveSet::parse("@header X-Frame-Options DENY"),
                action_fn(|scope, vars| {
                    let id = vars
                        .last()
                        .map(|(_, v)| v.to_owned())
                        .unwrap_or_default();
                    let detail = scope.request().query().get_nullable_bool("detail")?;

                    Ok(json!({ "id": id, "detail": detail.unwrap_or(false) }))
                }),
            )
            .action(
                "whoami",
                DirectiveSet::empty(),
                action_fn(|scope, _| {
                    let name = scope
                        .session()
                        .and_then(|session| session.get("name").cloned())
                        .unwrap_or_else(|| json!("anonymous"));

                    Ok(json!({ "name": name }))
                }),
            ),
    )
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .route(Route::fixed(Method::GET, "/users/{id}", user_controller(), "show"))
        .route(Route::dynamic(Method::GET, "/user/{method}", user_controller(), "method"))
        .build()
        .expect("route table is statically known");
    let dispatcher = Dispatcher::new(router);

    let request = Request::builder(Method::GET, "/users/42")
        .query(ValueMap::from_pairs([("detail", "yes")]))
        .build();

    let mut session = Session::open(MemorySessionStore::new());
    session.set("name", json!("alice")).expect("session is open");

    let mut scope = RequestScope::with_session(&request, &mut session);
    let mut writer = ResponseWriter::new(stdout());

    dispatcher.handle(&mut scope, &mut writer).expect("stdout write failed");
}
