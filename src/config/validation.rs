//! Configuration validation
//!
//! Semantic checks on a fully deserialized [`DuelConfig`]. Validation
//! collects ALL issues (doesn't stop at first) so a config author sees
//! everything wrong in one pass.

use std::time::Duration;

use crate::config::schema::{DelayRange, DuelConfig};
use crate::error::{Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Longest duration any timing field may hold.
pub const MAX_DURATION: Duration = Duration::from_secs(3600);

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns the result.
    pub fn validate(&mut self, config: &DuelConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_health_and_damage(config);
        self.validate_delay_range(&config.start_delay, "start_delay");
        self.validate_delay_range(&config.alert_delay, "alert_delay");
        self.validate_window(config.draw_window, "draw_window");
        self.validate_window(config.stun_duration, "stun_duration");
        self.validate_upper_bound(config.round_end_grace, "round_end_grace");
        self.validate_upper_bound(config.round_end_delay, "round_end_delay");

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Checks
    // ========================================================================

    fn validate_health_and_damage(&mut self, config: &DuelConfig) {
        if config.initial_health == 0 {
            self.add_error("initial_health", "Initial health must be greater than zero");
        }

        if config.clean_damage == 0 {
            self.add_error("clean_damage", "Clean shot damage must be greater than zero");
        } else if config.initial_health > 0 && config.clean_damage >= config.initial_health {
            self.add_warning(
                "clean_damage",
                "A single clean shot ends the match (clean_damage >= initial_health)",
            );
        }

        let dirty = config.dirty_damage;
        if dirty.min > dirty.max {
            self.add_error(
                "dirty_damage",
                &format!("min ({}) exceeds max ({})", dirty.min, dirty.max),
            );
            return;
        }
        if dirty.min == 0 {
            self.add_warning("dirty_damage.min", "Dirty shots may deal no damage");
        }
        if dirty.max > config.clean_damage {
            self.add_warning(
                "dirty_damage.max",
                "Dirty shots can out-damage clean shots",
            );
        }
    }

    fn validate_delay_range(&mut self, range: &DelayRange, path: &str) {
        if range.min > range.max {
            self.add_error(
                path,
                &format!(
                    "min ({}) exceeds max ({})",
                    humantime::format_duration(range.min),
                    humantime::format_duration(range.max)
                ),
            );
        }
        self.validate_upper_bound(range.min.max(range.max), path);
    }

    fn validate_window(&mut self, duration: Duration, path: &str) {
        if duration.is_zero() {
            self.add_error(path, "Duration must be greater than zero");
        }
        self.validate_upper_bound(duration, path);
    }

    fn validate_upper_bound(&mut self, duration: Duration, path: &str) {
        if duration > MAX_DURATION {
            self.add_error(
                path,
                &format!(
                    "Duration {} exceeds the maximum of {}",
                    humantime::format_duration(duration),
                    humantime::format_duration(MAX_DURATION)
                ),
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
