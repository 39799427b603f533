//! Metrics collection for `Quickdraw`.
//!
//! Provides Prometheus-compatible metrics and typed convenience functions
//! for recording duel activity. All label values come from closed enums
//! (phases, shot tiers, timer kinds), so cardinality is bounded.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::QuickdrawError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `QuickdrawError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), QuickdrawError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| QuickdrawError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!("quickdraw_shots_total", "Total number of shots fired by tier");
    describe_counter!(
        "quickdraw_phase_transitions_total",
        "Total number of phase transitions"
    );
    describe_gauge!(
        "quickdraw_current_phase",
        "Currently active phase (1 = active)"
    );
    describe_counter!("quickdraw_rounds_total", "Total number of rounds ended");
    describe_counter!("quickdraw_matches_total", "Total number of matches started");
    describe_counter!(
        "quickdraw_stale_timers_total",
        "Timer callbacks skipped by the phase guard or cancellation"
    );
    describe_counter!(
        "quickdraw_errors_total",
        "Total number of errors by category"
    );
}

/// Records a resolved shot.
pub fn record_shot(tier: &'static str) {
    counter!("quickdraw_shots_total", "tier" => tier).increment(1);
}

/// Records a phase transition and moves the current-phase gauge.
pub fn record_phase_transition(from: &'static str, to: &'static str) {
    counter!("quickdraw_phase_transitions_total", "from" => from, "to" => to).increment(1);
    set_current_phase(to, Some(from));
}

/// Sets the currently active phase gauge.
///
/// Zeros out the previous phase label (if any) before setting the new one.
pub fn set_current_phase(phase: &'static str, previous: Option<&'static str>) {
    if let Some(prev) = previous {
        gauge!("quickdraw_current_phase", "phase" => prev).set(0.0);
    }
    gauge!("quickdraw_current_phase", "phase" => phase).set(1.0);
}

/// Records the end of a round.
pub fn record_round_ended() {
    counter!("quickdraw_rounds_total").increment(1);
}

/// Records the start of a match.
pub fn record_match_started() {
    counter!("quickdraw_matches_total").increment(1);
}

/// Records a timer callback that fired but did nothing.
pub fn record_stale_timer(task: &'static str) {
    counter!("quickdraw_stale_timers_total", "task" => task).increment(1);
}

/// Records an error by category.
pub fn record_error(category: &'static str) {
    counter!("quickdraw_errors_total", "category" => category).increment(1);
}
