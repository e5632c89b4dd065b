mod controller;
mod directive;
mod dispatch;
mod error;
mod request;
mod response;
mod router;
mod session;

pub use controller::{action_fn, Action, ControllerTable, Handler, RequestScope};
pub use directive::{DirectiveSet, DirectiveSetBuilder};
pub use dispatch::{respond, Dispatcher};
pub use error::{DispatchError, HandlerError, LogicError, RouteError};
pub use request::{Request, RequestBuilder};
pub use response::ResponseWriter;
pub use router::{Route, RouteTarget, RouteVars, Router, RouterBuilder};
pub use session::{MemorySessionStore, Session, SessionStore};
