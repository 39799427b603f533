//! Shot resolution
//!
//! A shot during `Draw` is clean and deals fixed damage. A shot during an
//! alert phase is dirty and deals a random amount. Either way the target
//! is stunned. Ineligible shots are silent no-ops.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DamageRange, DuelConfig};
use crate::observability::metrics;

use super::clock::PhaseClock;
use super::notify::DuelEvent;
use super::random::{RandomSource, sample_damage};
use super::state::{DuelState, Phase, PlayerId};
use super::stun::StunScheduler;
use super::timer::Effects;

/// Damage tier of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotTier {
    /// Fired during the draw window
    Clean,
    /// Fired during an alert phase
    Dirty,
}

impl ShotTier {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Dirty => "dirty",
        }
    }
}

impl std::fmt::Display for ShotTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an eligible shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotOutcome {
    /// Player who fired
    pub shooter: PlayerId,
    /// Player who was hit
    pub target: PlayerId,
    /// Damage dealt
    pub damage: u32,
    /// Clean or dirty
    pub tier: ShotTier,
    /// Target health after the hit
    pub target_health_after: u32,
}

/// Turns fire actions into damage and stuns.
#[derive(Debug, Clone)]
pub struct ShotResolver {
    clean_damage: u32,
    dirty_damage: DamageRange,
    early_fire: bool,
}

impl ShotResolver {
    /// Creates a resolver from the duel configuration.
    #[must_use]
    pub const fn new(config: &DuelConfig) -> Self {
        Self {
            clean_damage: config.clean_damage,
            dirty_damage: config.dirty_damage,
            early_fire: config.early_fire,
        }
    }

    /// Whether `phase` accepts shots under this resolver's rules.
    #[must_use]
    pub const fn is_firing_window(&self, phase: Phase) -> bool {
        if self.early_fire {
            phase.is_firing_window()
        } else {
            matches!(phase, Phase::Draw)
        }
    }

    /// Whether `shooter` may fire right now.
    #[must_use]
    pub const fn can_fire(&self, state: &DuelState, shooter: PlayerId) -> bool {
        self.is_firing_window(state.phase) && state.player(shooter).can_fire()
    }

    /// Resolves a fire action by `shooter`.
    ///
    /// Returns `None` and changes nothing when the shooter is stunned, has
    /// already fired this round, or the phase does not accept shots.
    /// A clean shot settles the draw window: the expiry timer gives way to a
    /// round-end deadline at the same instant.
    pub fn fire(
        &self,
        state: &mut DuelState,
        shooter: PlayerId,
        stuns: &mut StunScheduler,
        clock: &mut PhaseClock,
        rng: &mut dyn RandomSource,
        fx: &Effects<'_>,
    ) -> Option<ShotOutcome> {
        if !self.can_fire(state, shooter) {
            let player = state.player(shooter);
            debug!(
                player = %shooter,
                phase = %state.phase,
                stunned = player.stunned,
                shot_fired = player.shot_fired,
                "fire ignored"
            );
            return None;
        }

        state.player_mut(shooter).shot_fired = true;

        let (damage, tier) = if state.phase == Phase::Draw {
            (self.clean_damage, ShotTier::Clean)
        } else {
            (sample_damage(self.dirty_damage, rng), ShotTier::Dirty)
        };

        let target = shooter.opponent();
        let victim = state.player_mut(target);
        victim.health = victim.health.saturating_sub(damage);
        let health_after = victim.health;

        info!(
            shooter = %shooter,
            %target,
            damage,
            %tier,
            health_after,
            "shot resolved"
        );
        metrics::record_shot(tier.as_str());
        fx.notifier.emit(DuelEvent::Damage {
            target,
            amount: damage,
            tier,
            health_after,
        });

        stuns.stun(state, target, fx);

        if tier == ShotTier::Clean {
            clock.settle_draw(state.round, fx);
        }

        Some(ShotOutcome {
            shooter,
            target,
            damage,
            tier,
            target_health_after: health_after,
        })
    }
}
