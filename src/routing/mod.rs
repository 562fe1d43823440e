//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     Route (builder, pattern compiled on set)
//!     → Router::add_route / set_routes (validated, marked Dirty)
//!     → Router::reload
//!         → reconcile by name against the live table
//!         → decorate new/changed routes once
//!         → publish new RouteTable (atomic swap)
//!
//! Incoming Request (method, path)
//!     → Dispatcher (load current RouteTable)
//!     → matcher.rs (first match wins, 404 vs 405)
//!     → middleware chain
//!     → decorated handler
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once, never per request
//! - Deterministic: same table and input always select the same route
//! - Dispatch reads are lock-free; reload never exposes a partial table

pub mod matcher;
pub mod route;
pub mod router;
pub mod table;

pub use matcher::{Pattern, RouteMiss};
pub use route::{Route, RouteInfo};
pub use router::{Dispatcher, ReloadReport, RemovalPolicy, Router};
pub use table::{ActiveRoute, RouteTable};
