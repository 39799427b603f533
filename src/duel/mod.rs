//! Duel engine
//!
//! Phase/timer core of a two-player reaction duel. Components, leaves
//! first:
//!
//! - [`state`]: the authoritative [`DuelState`]
//! - [`stun`] and [`shot`]: per-player stun timers and shot resolution
//! - [`clock`]: randomized, phase-guarded countdown scheduling
//! - [`round`]: one round's lifecycle and the game-over latch
//! - [`controller`]: the [`MatchController`] facade driven by a UI
//!
//! Supporting seams: [`timer`] (scheduled tasks and cancellation),
//! [`random`] (injectable randomness), [`notify`] (push events), and
//! [`gate`] (external start predicate).

pub mod clock;
pub mod controller;
pub mod gate;
pub mod notify;
pub mod random;
pub mod round;
pub mod shot;
pub mod state;
pub mod stun;
pub mod timer;

pub use clock::{PhaseClock, Transition};
pub use controller::{MatchController, MatchSnapshot, PlayerView};
pub use gate::{OpenGate, RulesGate, StartGate};
pub use notify::{DuelEvent, Notifier};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use round::RoundController;
pub use shot::{ShotOutcome, ShotResolver, ShotTier};
pub use state::{DuelState, Phase, Player, PlayerId};
pub use stun::StunScheduler;
pub use timer::{Effects, Scheduler, TimerSink, TimerTask, TokioScheduler};
