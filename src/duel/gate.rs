//! Round start gating
//!
//! The presentation layer may hold round starts while an overlay (such as a
//! rules panel) is open. The engine only asks a yes/no question through
//! [`StartGate`]; it never knows what the overlay is.

use std::sync::atomic::{AtomicBool, Ordering};

use super::state::PlayerId;

/// Predicate consulted before a round starts.
pub trait StartGate: Send + Sync {
    /// Returns `true` while round starts must be ignored.
    fn is_blocked(&self) -> bool;
}

impl<F> StartGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_blocked(&self) -> bool {
        self()
    }
}

/// Gate that never blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl StartGate for OpenGate {
    fn is_blocked(&self) -> bool {
        false
    }
}

/// Per-player rules panel state. Blocks while either panel is open.
#[derive(Debug, Default)]
pub struct RulesGate {
    open: [AtomicBool; 2],
}

impl RulesGate {
    /// Creates a gate with both panels closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `player`'s panel as open.
    pub fn open(&self, player: PlayerId) {
        self.open[player.index()].store(true, Ordering::Release);
    }

    /// Marks `player`'s panel as closed.
    pub fn close(&self, player: PlayerId) {
        self.open[player.index()].store(false, Ordering::Release);
    }

    /// Whether `player`'s panel is open.
    #[must_use]
    pub fn is_open(&self, player: PlayerId) -> bool {
        self.open[player.index()].load(Ordering::Acquire)
    }
}

impl StartGate for RulesGate {
    fn is_blocked(&self) -> bool {
        PlayerId::ALL.iter().any(|&id| self.is_open(id))
    }
}
