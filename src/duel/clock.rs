//! Round countdown clock
//!
//! [`PhaseClock`] turns one round into four scheduled countdown steps
//! (`Ready → Alert3 → Alert2 → Alert1 → Draw`) at cumulative randomized
//! offsets, plus the draw-window expiry armed on entering `Draw`.
//!
//! Every step carries its expected predecessor phase. When a step fires it
//! advances the phase only if the phase still equals that predecessor, so a
//! step that outlives an abort or a fast-path round end changes nothing.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{DelayRange, DuelConfig, millis};
use crate::error::DuelError;
use crate::observability::metrics;

use super::notify::{DuelEvent, Notifier};
use super::random::{RandomSource, sample_delay};
use super::state::{DuelState, Phase};
use super::stun::remaining_fraction;
use super::timer::{Effects, TimerTask};

/// Result of delivering a countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The phase advanced.
    Applied,
    /// The phase had already moved on; nothing changed.
    Stale,
}

/// Schedules and guards one round's phase transitions.
#[derive(Debug)]
pub struct PhaseClock {
    start_delay: DelayRange,
    alert_delay: DelayRange,
    draw_window: Duration,
    parent: CancellationToken,
    round_token: Option<CancellationToken>,
    draw_token: Option<CancellationToken>,
    draw_started_at: Option<Instant>,
    last_delays: Option<[Duration; 4]>,
}

impl PhaseClock {
    /// Creates a clock whose round tokens are children of `parent`.
    #[must_use]
    pub fn new(config: &DuelConfig, parent: CancellationToken) -> Self {
        Self {
            start_delay: config.start_delay,
            alert_delay: config.alert_delay,
            draw_window: config.draw_window,
            parent,
            round_token: None,
            draw_token: None,
            draw_started_at: None,
            last_delays: None,
        }
    }

    /// Rebinds future rounds to a new match token.
    pub fn set_parent(&mut self, parent: CancellationToken) {
        self.parent = parent;
    }

    /// Whether a countdown is armed and has not been aborted.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.round_token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Token of the running round, if any.
    #[must_use]
    pub const fn round_token(&self) -> Option<&CancellationToken> {
        self.round_token.as_ref()
    }

    /// Delays `[d0, d1, d2, d3]` drawn by the most recent [`start`](Self::start).
    #[must_use]
    pub const fn last_delays(&self) -> Option<[Duration; 4]> {
        self.last_delays
    }

    /// Aborts any previous round, then schedules this round's countdown.
    ///
    /// `d0` comes from the start-delay range and `d1..d3` from the
    /// alert-delay range. Steps fire at `d0`, `d0+d1`, `d0+d1+d2`, and
    /// `d0+d1+d2+d3`.
    pub fn start(&mut self, rng: &mut dyn RandomSource, fx: &Effects<'_>) -> [Duration; 4] {
        self.abort();

        let delays = [
            sample_delay(&self.start_delay, rng),
            sample_delay(&self.alert_delay, rng),
            sample_delay(&self.alert_delay, rng),
            sample_delay(&self.alert_delay, rng),
        ];

        let token = self.parent.child_token();
        let mut at = Duration::ZERO;
        let mut from = Phase::Ready;
        for delay in delays {
            let Some(to) = from.next_countdown() else {
                break;
            };
            at = at.saturating_add(delay);
            fx.scheduler
                .schedule(at, token.child_token(), TimerTask::Advance { from, to });
            from = to;
        }

        debug!(
            d0_ms = millis(delays[0]),
            d1_ms = millis(delays[1]),
            d2_ms = millis(delays[2]),
            d3_ms = millis(delays[3]),
            draw_at_ms = millis(at),
            "countdown scheduled"
        );

        self.round_token = Some(token);
        self.last_delays = Some(delays);
        delays
    }

    /// Delivers a countdown step.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::InvariantViolation`] if `(from, to)` is not a
    /// consecutive countdown step. The state is left untouched.
    pub fn on_transition(
        &mut self,
        state: &mut DuelState,
        from: Phase,
        to: Phase,
        fx: &Effects<'_>,
    ) -> Result<Transition, DuelError> {
        if from.next_countdown() != Some(to) {
            return Err(DuelError::InvariantViolation(format!(
                "countdown step {from} -> {to} is not consecutive"
            )));
        }

        if state.phase != from {
            debug!(expected = %from, actual = %state.phase, "stale countdown step ignored");
            return Ok(Transition::Stale);
        }

        enter_phase(state, to, fx.notifier);
        if to == Phase::Draw {
            self.arm_draw_timer(fx);
        }
        Ok(Transition::Applied)
    }

    fn arm_draw_timer(&mut self, fx: &Effects<'_>) {
        let Some(round) = &self.round_token else {
            return;
        };
        let token = round.child_token();
        fx.scheduler
            .schedule(self.draw_window, token.clone(), TimerTask::DrawExpired);
        self.draw_token = Some(token);
        self.draw_started_at = Some(fx.now);
    }

    /// Handles draw-window expiry. Returns `true` if the round must end.
    pub fn on_draw_expired(&mut self, state: &DuelState) -> bool {
        self.draw_token = None;
        self.draw_started_at = None;
        state.phase == Phase::Draw
    }

    /// Settles the draw window after a clean shot.
    ///
    /// The expiry timer and the progress readout are disarmed, and a
    /// round-end deadline takes their place at the instant the window would
    /// have closed. A stunned target can still answer before then, but the
    /// round never outlives the window.
    pub fn settle_draw(&mut self, round: u32, fx: &Effects<'_>) {
        let elapsed = self
            .draw_started_at
            .map_or(Duration::ZERO, |started| fx.now.saturating_duration_since(started));
        self.cancel_draw_timer();

        let Some(token) = &self.round_token else {
            return;
        };
        let remaining = self.draw_window.saturating_sub(elapsed);
        fx.scheduler
            .schedule(remaining, token.child_token(), TimerTask::EndRound { round });
        debug!(round, remaining_ms = millis(remaining), "draw settled; round end deadline armed");
    }

    /// Disarms only the draw-window timer.
    pub fn cancel_draw_timer(&mut self) {
        if let Some(token) = self.draw_token.take() {
            token.cancel();
        }
        self.draw_started_at = None;
    }

    /// Invalidates every pending timer of the current round. Idempotent.
    pub fn abort(&mut self) {
        self.cancel_draw_timer();
        if let Some(token) = self.round_token.take() {
            token.cancel();
        }
    }

    /// Fraction of the draw window remaining at `now`.
    ///
    /// Zero outside `Draw` and once the draw timer has been disarmed.
    #[must_use]
    pub fn draw_remaining_fraction(&self, phase: Phase, now: Instant) -> f64 {
        match (phase, self.draw_started_at) {
            (Phase::Draw, Some(started)) => {
                remaining_fraction(self.draw_window, now.saturating_duration_since(started))
            }
            _ => 0.0,
        }
    }
}

/// Moves `state` into `to`, logging, counting, and publishing the change.
pub(crate) fn enter_phase(state: &mut DuelState, to: Phase, notifier: &Notifier) {
    let from = state.phase;
    state.phase = to;
    info!(%from, %to, round = state.round, "phase transition");
    metrics::record_phase_transition(from.as_str(), to.as_str());
    notifier.emit(DuelEvent::PhaseChanged {
        phase: to,
        round: state.round,
    });
}
