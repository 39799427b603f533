//! Observability module
//!
//! Logging, metrics, and the JSONL event stream used to watch a duel
//! from outside the engine.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventEmitter, SessionEvent, StopReason};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
