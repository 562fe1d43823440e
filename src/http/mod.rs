//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, timeout, trace layers)
//!     → request.rs (assign x-request-id)
//!     → routing::Dispatcher (match, middlewares, decorated handler)
//!     → response.rs (configured fixed responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, MakeRequestUuid, X_REQUEST_ID};
pub use response::StaticResponse;
pub use server::HttpServer;
