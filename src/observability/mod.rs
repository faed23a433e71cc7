//! Observability subsystem.
//!
//! All subsystems emit structured `tracing` events (node marked
//! unavailable/available, access denied, backend exhausted) and cheap
//! atomic metrics, exposed via a Prometheus scrape endpoint when
//! enabled.

pub mod logging;
pub mod metrics;
