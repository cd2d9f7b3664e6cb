//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! server / blockchain / client produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters through the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host application installs
//! ```

pub mod logging;
pub mod metrics;
