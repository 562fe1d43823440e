//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router / Dispatcher / decorators produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (request counters, latency histogram, reload outcomes)
//!
//! Consumers:
//!     → stdout (fmt layer, filter from RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every dispatch log line
//! - Metric macros are no-ops until a recorder is installed, so the router
//!   can be embedded without the exporter

pub mod logging;
pub mod metrics;
