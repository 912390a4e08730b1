//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! network/client.rs, sync/, bridge/ produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Observability never influences control flow
//! - Request ID (uuid v4) attached to every outbound call's events

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
