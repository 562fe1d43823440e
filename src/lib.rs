//! Regex path router with hot reloadable routes.
//!
//! Routes pair a name, a set of methods and a pattern with a handler. The
//! [`Router`] owns the definitions; [`Router::reload`] publishes them as an
//! immutable table that any number of [`Dispatcher`]s read without locking.

pub mod config;
pub mod decorator;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use decorator::Decorator;
pub use error::{DispatchError, Rejection, RouteError};
pub use handler::Handler;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use middleware::Middleware;
pub use routing::{Dispatcher, ReloadReport, RemovalPolicy, Route, Router};
