//! Duel state representation
//!
//! [`DuelState`] is the single authoritative record of a match: current
//! phase, round number, and per-player health/stun/shot status. It is a
//! plain data container owned by the match controller; the resolver, stun
//! scheduler, and round controller are the only writers.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One of the two duelists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerId {
    /// First player
    One,
    /// Second player
    Two,
}

impl PlayerId {
    /// Both players, in id order.
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// Returns the other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Zero-based slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Parses the `1` / `2` notation used by input layers.
    #[must_use]
    pub fn from_number(n: &str) -> Option<Self> {
        match n.trim() {
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "player-1"),
            Self::Two => write!(f, "player-2"),
        }
    }
}

/// Stage of a round's countdown/draw sequence.
///
/// Ordered: `Ready → Alert3 → Alert2 → Alert1 → Draw → RoundEnd →
/// (Ready | GameOver)`. A round may jump straight to `RoundEnd` or
/// `GameOver` when it is cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Waiting for a round to be started
    Ready,
    /// First alert ("3")
    #[serde(rename = "alert-3")]
    Alert3,
    /// Second alert ("2")
    #[serde(rename = "alert-2")]
    Alert2,
    /// Third alert ("1")
    #[serde(rename = "alert-1")]
    Alert1,
    /// The draw window: clean shots only
    Draw,
    /// Round finished, waiting to advance
    RoundEnd,
    /// Terminal: a player has been knocked out
    GameOver,
}

impl Phase {
    /// The phase that follows `self` in the countdown, if any.
    #[must_use]
    pub const fn next_countdown(self) -> Option<Self> {
        match self {
            Self::Ready => Some(Self::Alert3),
            Self::Alert3 => Some(Self::Alert2),
            Self::Alert2 => Some(Self::Alert1),
            Self::Alert1 => Some(Self::Draw),
            Self::Draw | Self::RoundEnd | Self::GameOver => None,
        }
    }

    /// Whether a shot may be fired in this phase.
    #[must_use]
    pub const fn is_firing_window(self) -> bool {
        matches!(self, Self::Alert3 | Self::Alert2 | Self::Alert1 | Self::Draw)
    }

    /// Whether this is one of the alert phases (dirty-shot territory).
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Alert3 | Self::Alert2 | Self::Alert1)
    }

    /// Stable lowercase label, used for logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Alert3 => "alert-3",
            Self::Alert2 => "alert-2",
            Self::Alert1 => "alert-1",
            Self::Draw => "draw",
            Self::RoundEnd => "round-end",
            Self::GameOver => "game-over",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-player duel record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Remaining health, `0..=initial_health`
    pub health: u32,
    /// Whether the player is currently unable to fire
    pub stunned: bool,
    /// Whether the player has already fired this round
    pub shot_fired: bool,
    /// When the current stun began
    pub stun_started_at: Option<Instant>,
}

impl Player {
    /// A fresh player at full health.
    #[must_use]
    pub const fn new(health: u32) -> Self {
        Self {
            health,
            stunned: false,
            shot_fired: false,
            stun_started_at: None,
        }
    }

    /// Whether this player could fire right now, phase permitting.
    #[must_use]
    pub const fn can_fire(&self) -> bool {
        !self.stunned && !self.shot_fired
    }
}

/// Authoritative duel state for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuelState {
    /// Current phase
    pub phase: Phase,
    /// Current round number, starting at 1
    pub round: u32,
    players: [Player; 2],
    initial_health: u32,
}

impl DuelState {
    /// Creates a fresh match state.
    #[must_use]
    pub const fn new(initial_health: u32) -> Self {
        Self {
            phase: Phase::Ready,
            round: 1,
            players: [Player::new(initial_health), Player::new(initial_health)],
            initial_health,
        }
    }

    /// Resets to a fresh match: round 1, both players at full health.
    pub const fn reset_match(&mut self) {
        *self = Self::new(self.initial_health);
    }

    /// Resets per-round flags. Health and stun persist across rounds.
    pub const fn reset_round(&mut self) {
        self.phase = Phase::Ready;
        self.players[0].shot_fired = false;
        self.players[1].shot_fired = false;
    }

    /// Returns the player record for `id`.
    #[must_use]
    pub const fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    /// Returns a mutable player record for `id`.
    pub const fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    /// Health both players start the match with.
    #[must_use]
    pub const fn initial_health(&self) -> u32 {
        self.initial_health
    }

    /// Whether both players have fired this round.
    #[must_use]
    pub const fn both_fired(&self) -> bool {
        self.players[0].shot_fired && self.players[1].shot_fired
    }

    /// Whether `id` has been knocked out.
    #[must_use]
    pub const fn is_dead(&self, id: PlayerId) -> bool {
        self.players[id.index()].health == 0
    }
}
