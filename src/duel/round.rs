//! Round lifecycle
//!
//! [`RoundController`] owns the start → resolve → end → advance loop of a
//! single round and the terminal game-over latch:
//!
//! - `start_round` arms the countdown when the phase is `Ready` and the
//!   start gate is open
//! - after every shot, game over is checked first; only then does "both
//!   players fired" schedule a round end after a short grace period
//! - `end_round` runs at most once per round and schedules the advance to
//!   the next round
//! - once `GameOver` latches, nothing moves the phase again

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{DuelConfig, TieBreak};
use crate::error::DuelError;
use crate::observability::metrics;

use super::clock::{PhaseClock, enter_phase};
use super::gate::StartGate;
use super::notify::{DuelEvent, Notifier};
use super::random::RandomSource;
use super::shot::ShotOutcome;
use super::state::{DuelState, Phase, PlayerId};
use super::stun::StunScheduler;
use super::timer::{Effects, TimerTask};

/// Drives one round at a time and latches game over.
#[derive(Debug)]
pub struct RoundController {
    grace: Duration,
    round_end_delay: Duration,
    tie_break: TieBreak,
    parent: CancellationToken,
    end_scheduled_for: Option<u32>,
    winner: Option<PlayerId>,
}

impl RoundController {
    /// Creates a controller whose post-round timers are children of `parent`.
    #[must_use]
    pub fn new(config: &DuelConfig, parent: CancellationToken) -> Self {
        Self {
            grace: config.round_end_grace,
            round_end_delay: config.round_end_delay,
            tie_break: config.tie_break,
            parent,
            end_scheduled_for: None,
            winner: None,
        }
    }

    /// Forgets the previous match and rebinds to a new match token.
    pub fn reset(&mut self, parent: CancellationToken) {
        self.parent = parent;
        self.end_scheduled_for = None;
        self.winner = None;
    }

    /// Winner of the match, once game over has latched.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Starts the countdown for the current round.
    ///
    /// No-op unless the phase is `Ready`, no countdown is already armed,
    /// and `gate` is not blocking. Returns whether the round started.
    pub fn start_round(
        &mut self,
        state: &DuelState,
        clock: &mut PhaseClock,
        gate: &dyn StartGate,
        rng: &mut dyn RandomSource,
        fx: &Effects<'_>,
    ) -> bool {
        if state.phase != Phase::Ready {
            debug!(phase = %state.phase, "start ignored: not ready");
            return false;
        }
        if clock.is_running() {
            debug!(round = state.round, "start ignored: countdown already armed");
            return false;
        }
        if gate.is_blocked() {
            debug!(round = state.round, "start ignored: gate is blocking");
            return false;
        }

        self.end_scheduled_for = None;
        clock.start(rng, fx);
        info!(round = state.round, "round started");
        true
    }

    /// Post-shot bookkeeping: game over first, then round end.
    ///
    /// # Errors
    ///
    /// Propagates [`DuelError::InvariantViolation`] from
    /// [`check_game_over`](Self::check_game_over).
    pub fn on_shot_fired(
        &mut self,
        state: &mut DuelState,
        outcome: &ShotOutcome,
        clock: &mut PhaseClock,
        stuns: &mut StunScheduler,
        fx: &Effects<'_>,
    ) -> Result<(), DuelError> {
        if self.check_game_over(state, clock, stuns, Some(outcome.shooter), fx.notifier)? {
            return Ok(());
        }

        if !state.both_fired() || state.phase == Phase::RoundEnd {
            return Ok(());
        }
        if self.end_scheduled_for == Some(state.round) {
            debug!(round = state.round, "round end already scheduled");
            return Ok(());
        }

        self.end_scheduled_for = Some(state.round);
        let token = clock
            .round_token()
            .map_or_else(|| self.parent.child_token(), CancellationToken::child_token);
        fx.scheduler
            .schedule(self.grace, token, TimerTask::EndRound { round: state.round });
        debug!(round = state.round, "both players fired; round end scheduled");
        Ok(())
    }

    /// Ends the current round.
    ///
    /// No-op on `GameOver` or when the round has already ended. Otherwise
    /// aborts every round timer, enters `RoundEnd`, and schedules the
    /// advance to the next round. Returns whether the round ended.
    pub fn end_round(
        &mut self,
        state: &mut DuelState,
        clock: &mut PhaseClock,
        fx: &Effects<'_>,
    ) -> bool {
        if matches!(state.phase, Phase::GameOver | Phase::RoundEnd) {
            debug!(phase = %state.phase, round = state.round, "end of round ignored");
            return false;
        }

        clock.abort();
        enter_phase(state, Phase::RoundEnd, fx.notifier);

        let round = state.round;
        info!(round, "round ended");
        metrics::record_round_ended();
        fx.notifier.emit(DuelEvent::RoundEnded { round });

        fx.scheduler.schedule(
            self.round_end_delay,
            self.parent.child_token(),
            TimerTask::NextRound { round },
        );
        true
    }

    /// Moves from the end of `round` to a fresh `Ready` for the next one.
    ///
    /// Skipped if game over latched in the meantime or the round no longer
    /// matches. Returns whether the state advanced.
    pub fn advance(&mut self, state: &mut DuelState, round: u32, notifier: &Notifier) -> bool {
        if state.phase == Phase::GameOver {
            debug!(round, "advance skipped: game over");
            return false;
        }
        if state.phase != Phase::RoundEnd || state.round != round {
            debug!(round, current = state.round, phase = %state.phase, "stale advance ignored");
            return false;
        }

        state.round += 1;
        enter_phase(state, Phase::Ready, notifier);
        state.reset_round();
        self.end_scheduled_for = None;
        true
    }

    /// Latches `GameOver` if either player is down.
    ///
    /// On the first resolution: aborts every round timer, clears all
    /// stuns, resolves the winner, and publishes `GameOver`. Returns
    /// whether the match is over.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::InvariantViolation`] if a player is down while
    /// game over has already been resolved. The first result is kept.
    pub fn check_game_over(
        &mut self,
        state: &mut DuelState,
        clock: &mut PhaseClock,
        stuns: &mut StunScheduler,
        shooter: Option<PlayerId>,
        notifier: &Notifier,
    ) -> Result<bool, DuelError> {
        let any_dead = PlayerId::ALL.iter().any(|&id| state.is_dead(id));
        if !any_dead {
            return Ok(false);
        }

        if state.phase == Phase::GameOver {
            return Err(DuelError::InvariantViolation(format!(
                "game over resolved twice (kept winner {})",
                self.winner.map_or_else(|| "none".to_string(), |w| w.to_string())
            )));
        }

        let winner = resolve_winner(state, self.tie_break, shooter);

        clock.abort();
        enter_phase(state, Phase::GameOver, notifier);
        stuns.clear_all(state, notifier);
        self.winner = Some(winner);

        info!(
            %winner,
            round = state.round,
            health_one = state.player(PlayerId::One).health,
            health_two = state.player(PlayerId::Two).health,
            "game over"
        );
        notifier.emit(DuelEvent::GameOver { winner });
        Ok(true)
    }

    /// Recovers from an internal defect by returning the round to `Ready`.
    ///
    /// Leaves a latched `GameOver` alone.
    pub fn force_ready(&mut self, state: &mut DuelState, clock: &mut PhaseClock, notifier: &Notifier) {
        if state.phase == Phase::GameOver {
            return;
        }
        error!(round = state.round, phase = %state.phase, "forcing round back to ready");
        clock.abort();
        self.end_scheduled_for = None;
        enter_phase(state, Phase::Ready, notifier);
        state.reset_round();
    }
}

/// Picks the winner once at least one player is down.
///
/// A lone survivor wins. If both are down, higher remaining health wins,
/// and `tie_break` settles equal health.
#[must_use]
pub fn resolve_winner(state: &DuelState, tie_break: TieBreak, shooter: Option<PlayerId>) -> PlayerId {
    match (state.is_dead(PlayerId::One), state.is_dead(PlayerId::Two)) {
        (true, false) => PlayerId::Two,
        (false, true) => PlayerId::One,
        _ => {
            let one = state.player(PlayerId::One).health;
            let two = state.player(PlayerId::Two).health;
            match one.cmp(&two) {
                std::cmp::Ordering::Greater => PlayerId::One,
                std::cmp::Ordering::Less => PlayerId::Two,
                std::cmp::Ordering::Equal => match tie_break {
                    TieBreak::PlayerOne => PlayerId::One,
                    TieBreak::PlayerTwo => PlayerId::Two,
                    TieBreak::Shooter => shooter.unwrap_or(PlayerId::One),
                },
            }
        }
    }
}
