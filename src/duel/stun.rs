//! Per-player stun timers
//!
//! A hit player cannot fire for a fixed window. The remaining fraction of
//! that window is a pure function of elapsed time so a display can poll it
//! at whatever cadence it likes.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::millis;

use super::notify::{DuelEvent, Notifier};
use super::state::{DuelState, PlayerId};
use super::timer::{Effects, TimerTask};

/// Arms, expires, and clears player stuns.
#[derive(Debug)]
pub struct StunScheduler {
    duration: Duration,
    parent: CancellationToken,
    tokens: [Option<CancellationToken>; 2],
}

impl StunScheduler {
    /// Creates a scheduler for stuns of `duration`.
    ///
    /// Expiry timers are children of `parent`, so cancelling the match
    /// also cancels any live stun.
    #[must_use]
    pub fn new(duration: Duration, parent: CancellationToken) -> Self {
        Self {
            duration,
            parent,
            tokens: [None, None],
        }
    }

    /// Rebinds expiry timers to a new match token.
    pub fn set_parent(&mut self, parent: CancellationToken) {
        self.parent = parent;
    }

    /// Configured stun length.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Stuns `target`, restarting the window if already stunned.
    pub fn stun(&mut self, state: &mut DuelState, target: PlayerId, fx: &Effects<'_>) {
        if let Some(previous) = self.tokens[target.index()].take() {
            previous.cancel();
        }

        let player = state.player_mut(target);
        player.stunned = true;
        player.stun_started_at = Some(fx.now);

        let token = self.parent.child_token();
        fx.scheduler
            .schedule(self.duration, token.clone(), TimerTask::StunExpired(target));
        self.tokens[target.index()] = Some(token);

        info!(player = %target, duration_ms = millis(self.duration), "player stunned");
        fx.notifier.emit(DuelEvent::StunChanged {
            player: target,
            stunned: true,
        });
    }

    /// Ends `target`'s stun. Called when the expiry timer fires.
    pub fn expire(&mut self, state: &mut DuelState, target: PlayerId, notifier: &Notifier) {
        self.tokens[target.index()] = None;
        let player = state.player_mut(target);
        if !player.stunned {
            debug!(player = %target, "stun expiry for a player that is not stunned");
            return;
        }
        player.stunned = false;
        player.stun_started_at = None;

        debug!(player = %target, "stun expired");
        notifier.emit(DuelEvent::StunChanged {
            player: target,
            stunned: false,
        });
    }

    /// Fraction of `id`'s stun window still remaining at `now`, in `0.0..=1.0`.
    #[must_use]
    pub fn remaining_fraction(&self, state: &DuelState, id: PlayerId, now: Instant) -> f64 {
        let player = state.player(id);
        match player.stun_started_at {
            Some(started) if player.stunned => {
                remaining_fraction(self.duration, now.saturating_duration_since(started))
            }
            _ => 0.0,
        }
    }

    /// Cancels every outstanding stun and clears both players' stun flags.
    pub fn clear_all(&mut self, state: &mut DuelState, notifier: &Notifier) {
        for id in PlayerId::ALL {
            if let Some(token) = self.tokens[id.index()].take() {
                token.cancel();
            }
            let player = state.player_mut(id);
            if player.stunned {
                player.stunned = false;
                player.stun_started_at = None;
                notifier.emit(DuelEvent::StunChanged {
                    player: id,
                    stunned: false,
                });
            }
        }
    }
}

/// `max(0, (window - elapsed) / window)`; zero for an empty window.
#[must_use]
pub fn remaining_fraction(window: Duration, elapsed: Duration) -> f64 {
    if window.is_zero() {
        return 0.0;
    }
    let remaining = window.saturating_sub(elapsed);
    (remaining.as_secs_f64() / window.as_secs_f64()).clamp(0.0, 1.0)
}
