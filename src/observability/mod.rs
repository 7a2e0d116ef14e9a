//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, payload echo in verbose mode)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request cycle number flows through correlator and slot log events
//! - x-request-id is set and propagated on every HTTP response
//! - Observability never changes protocol behaviour

pub mod logging;
pub mod metrics;
