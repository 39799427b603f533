//! Configuration module
//!
//! Handles loading and validation of duel configuration files: health,
//! damage tiers, countdown delay ranges, and the stun/draw/round timers.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
