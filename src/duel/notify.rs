//! Push events for the presentation layer
//!
//! Every observable state change is published as a [`DuelEvent`] on a
//! broadcast channel. A lagging or absent subscriber never blocks the
//! engine; events sent with no receivers are dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::shot::ShotTier;
use super::state::{Phase, PlayerId};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// An observable change in duel state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DuelEvent {
    /// A new match began.
    MatchStarted {
        /// Unique id of the match
        match_id: Uuid,
    },
    /// The phase changed.
    PhaseChanged {
        /// Phase entered
        phase: Phase,
        /// Round number at the time of the change
        round: u32,
    },
    /// A shot landed.
    Damage {
        /// Player that was hit
        target: PlayerId,
        /// Damage dealt
        amount: u32,
        /// Clean or dirty
        tier: ShotTier,
        /// Target health after the hit
        health_after: u32,
    },
    /// A player's stun started or ended.
    StunChanged {
        /// Affected player
        player: PlayerId,
        /// New stun status
        stunned: bool,
    },
    /// A round ended.
    RoundEnded {
        /// Round that ended
        round: u32,
    },
    /// The match is over.
    GameOver {
        /// Winning player
        winner: PlayerId,
    },
}

impl DuelEvent {
    /// Returns the event type name as it appears in the serialized form.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::MatchStarted { .. } => "MatchStarted",
            Self::PhaseChanged { .. } => "PhaseChanged",
            Self::Damage { .. } => "Damage",
            Self::StunChanged { .. } => "StunChanged",
            Self::RoundEnded { .. } => "RoundEnded",
            Self::GameOver { .. } => "GameOver",
        }
    }
}

/// Broadcasts [`DuelEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<DuelEvent>,
}

impl Notifier {
    /// Creates a notifier with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publishes an event.
    pub fn emit(&self, event: DuelEvent) {
        tracing::trace!(event = event.type_name(), "duel event");
        // No receivers is fine
        let _ = self.tx.send(event);
    }

    /// Returns a new receiver for subsequent events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DuelEvent> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
