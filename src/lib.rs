//! `Quickdraw` - two-player reaction duel timing engine
//!
//! This library provides the phase/timer core of a real-time reaction duel:
//! randomized countdown scheduling, phase-guarded timer callbacks, per-player
//! stun timers, and the round-end/game-over path. Presentation layers drive
//! it through [`duel::MatchController`] and observe it through
//! [`duel::DuelEvent`]s.

pub mod cli;
pub mod config;
pub mod duel;
pub mod error;
pub mod observability;
