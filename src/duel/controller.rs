//! Match controller
//!
//! [`MatchController`] is the API the presentation layer talks to. It owns
//! one match's [`DuelState`] and components behind a single lock, and it is
//! the [`TimerSink`] every scheduled task is delivered to. Because every
//! API call and every timer body runs under that lock, each one is atomic
//! with respect to the others.
//!
//! Cancellation tokens form a tree:
//!
//! ```text
//! session ─ match ─┬─ round ─┬─ countdown steps
//!                  │         ├─ round-end grace
//!                  │         └─ draw ── draw expiry
//!                  ├─ stun expiry (per player)
//!                  └─ next round
//! ```
//!
//! Restarting a match cancels the match token; [`MatchController::shutdown`]
//! cancels the session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

use crate::config::DuelConfig;
use crate::error::DuelError;
use crate::observability::metrics;

use super::clock::{PhaseClock, Transition};
use super::gate::{OpenGate, StartGate};
use super::notify::{DuelEvent, Notifier};
use super::random::{RandomSource, SeededRandom};
use super::round::RoundController;
use super::shot::{ShotOutcome, ShotResolver};
use super::state::{DuelState, Phase, PlayerId};
use super::stun::StunScheduler;
use super::timer::{Effects, TimerSink, TimerTask, TokioScheduler};

/// Read-only view of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    /// Remaining health
    pub health: u32,
    /// Whether the player is stunned
    pub stunned: bool,
    /// Whether the player has fired this round
    pub shot_fired: bool,
}

/// Serializable view of a whole match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSnapshot {
    /// Match id
    pub match_id: Uuid,
    /// Current phase
    pub phase: Phase,
    /// Current round
    pub round: u32,
    /// Player one
    pub player_one: PlayerView,
    /// Player two
    pub player_two: PlayerView,
    /// Stun fraction remaining, indexed by player
    pub stun_remaining: [f64; 2],
    /// Draw-window fraction remaining
    pub draw_remaining: f64,
    /// Most recent shot
    pub last_shot: Option<ShotOutcome>,
    /// Winner, once the match is over
    pub winner: Option<PlayerId>,
}

/// Runs matches of rounds until a player is knocked out.
///
/// Must be created inside a Tokio runtime; timers are spawned on it.
/// Dropping the controller cancels every pending timer.
pub struct MatchController {
    core: Arc<Core>,
}

struct Core {
    session: CancellationToken,
    scheduler: TokioScheduler,
    notifier: Notifier,
    arena: Mutex<Arena>,
}

struct Arena {
    match_id: Uuid,
    match_token: CancellationToken,
    state: DuelState,
    clock: PhaseClock,
    stuns: StunScheduler,
    resolver: ShotResolver,
    rounds: RoundController,
    rng: Box<dyn RandomSource>,
    gate: Arc<dyn StartGate>,
    last_outcome: Option<ShotOutcome>,
}

impl MatchController {
    /// Creates a controller, seeding randomness from `config.seed` (or OS
    /// entropy when absent).
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::NoRuntime`] when called outside a Tokio runtime.
    pub fn new(config: Arc<DuelConfig>) -> Result<Self, DuelError> {
        let rng = SeededRandom::from_seed(config.seed);
        Self::with_random(config, Box::new(rng))
    }

    /// Creates a controller with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::NoRuntime`] when called outside a Tokio runtime.
    pub fn with_random(
        config: Arc<DuelConfig>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, DuelError> {
        let handle = Handle::try_current().map_err(|_| DuelError::NoRuntime)?;
        let session = CancellationToken::new();
        let match_token = session.child_token();

        let arena = Arena {
            match_id: Uuid::new_v4(),
            state: DuelState::new(config.initial_health),
            clock: PhaseClock::new(&config, match_token.clone()),
            stuns: StunScheduler::new(config.stun_duration, match_token.clone()),
            resolver: ShotResolver::new(&config),
            rounds: RoundController::new(&config, match_token.clone()),
            match_token,
            rng,
            gate: Arc::new(OpenGate),
            last_outcome: None,
        };

        let core = Arc::new_cyclic(|weak: &Weak<Core>| {
            let sink: Weak<dyn TimerSink> = weak.clone();
            Core {
                session,
                scheduler: TokioScheduler::new(handle, sink),
                notifier: Notifier::new(),
                arena: Mutex::new(arena),
            }
        });

        let controller = Self { core };
        controller.new_match();
        Ok(controller)
    }

    /// Installs the predicate consulted by [`start_round`](Self::start_round).
    #[must_use]
    pub fn with_gate(self, gate: Arc<dyn StartGate>) -> Self {
        self.core.lock().gate = gate;
        self
    }

    /// Returns a receiver for subsequent [`DuelEvent`]s.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DuelEvent> {
        self.core.notifier.subscribe()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Discards the current match and starts a fresh one. Returns the new
    /// match id.
    pub fn new_match(&self) -> Uuid {
        let mut guard = self.core.lock();
        self.core.reset_match(&mut guard)
    }

    /// Full reset to a fresh match. Player identity and cosmetics live
    /// outside the engine and are untouched.
    pub fn restart_match(&self) -> Uuid {
        let mut guard = self.core.lock();
        let previous = guard.match_id;
        let match_id = self.core.reset_match(&mut guard);
        info!(%previous, %match_id, "match restarted");
        match_id
    }

    /// Starts the current round's countdown. Returns whether it started.
    ///
    /// No-op unless the phase is `Ready`, no countdown is armed, and the
    /// installed gate is not blocking.
    pub fn start_round(&self) -> bool {
        let mut guard = self.core.lock();
        let arena = &mut *guard;
        let _span = info_span!("match", match_id = %arena.match_id).entered();
        let fx = self.core.effects();
        arena.rounds.start_round(
            &arena.state,
            &mut arena.clock,
            arena.gate.as_ref(),
            arena.rng.as_mut(),
            &fx,
        )
    }

    /// Fires `player`'s shot. Returns the outcome, or `None` if the player
    /// was not eligible (stunned, already fired, or outside the firing
    /// window).
    pub fn fire(&self, player: PlayerId) -> Option<ShotOutcome> {
        let mut guard = self.core.lock();
        let arena = &mut *guard;
        let _span = info_span!("match", match_id = %arena.match_id).entered();
        let fx = self.core.effects();

        let outcome = arena.resolver.fire(
            &mut arena.state,
            player,
            &mut arena.stuns,
            &mut arena.clock,
            arena.rng.as_mut(),
            &fx,
        )?;
        arena.last_outcome = Some(outcome);

        if let Err(err) = arena.rounds.on_shot_fired(
            &mut arena.state,
            &outcome,
            &mut arena.clock,
            &mut arena.stuns,
            &fx,
        ) {
            report_invariant(&err);
        }
        Some(outcome)
    }

    /// Cancels every pending timer. Subsequent operations schedule nothing
    /// that can fire.
    pub fn shutdown(&self) {
        if !self.core.session.is_cancelled() {
            debug!("duel session shut down");
            self.core.session.cancel();
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.core.session.is_cancelled()
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Current phase.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.core.lock().state.phase
    }

    /// Current round number.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.core.lock().state.round
    }

    /// Id of the current match.
    #[must_use]
    pub fn match_id(&self) -> Uuid {
        self.core.lock().match_id
    }

    /// View of `id`'s health and flags.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> PlayerView {
        player_view(&self.core.lock().state, id)
    }

    /// Fraction of `id`'s stun remaining at `now`.
    #[must_use]
    pub fn stun_remaining_fraction(&self, id: PlayerId, now: Instant) -> f64 {
        let arena = self.core.lock();
        arena.stuns.remaining_fraction(&arena.state, id, now)
    }

    /// Fraction of the draw window remaining at `now`.
    #[must_use]
    pub fn draw_remaining_fraction(&self, now: Instant) -> f64 {
        let arena = self.core.lock();
        arena.clock.draw_remaining_fraction(arena.state.phase, now)
    }

    /// Most recent eligible shot of this match.
    #[must_use]
    pub fn last_shot_outcome(&self) -> Option<ShotOutcome> {
        self.core.lock().last_outcome
    }

    /// Winner of the match. `None` until the phase is `GameOver`.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        let arena = self.core.lock();
        if arena.state.phase == Phase::GameOver {
            arena.rounds.winner()
        } else {
            None
        }
    }

    /// Serializable view of the whole match at the current instant.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        let now = Instant::now();
        let arena = self.core.lock();
        let state = &arena.state;
        MatchSnapshot {
            match_id: arena.match_id,
            phase: state.phase,
            round: state.round,
            player_one: player_view(state, PlayerId::One),
            player_two: player_view(state, PlayerId::Two),
            stun_remaining: PlayerId::ALL.map(|id| arena.stuns.remaining_fraction(state, id, now)),
            draw_remaining: arena.clock.draw_remaining_fraction(state.phase, now),
            last_shot: arena.last_outcome,
            winner: (state.phase == Phase::GameOver)
                .then(|| arena.rounds.winner())
                .flatten(),
        }
    }
}

impl Drop for MatchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for MatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arena = self.core.lock();
        f.debug_struct("MatchController")
            .field("match_id", &arena.match_id)
            .field("state", &arena.state)
            .finish_non_exhaustive()
    }
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn effects(&self) -> Effects<'_> {
        Effects {
            scheduler: &self.scheduler,
            notifier: &self.notifier,
            now: Instant::now(),
        }
    }

    /// Cancels everything tied to the current match and installs a fresh
    /// one under a new match token.
    fn reset_match(&self, arena: &mut Arena) -> Uuid {
        arena.match_token.cancel();
        arena.clock.abort();
        arena.stuns.clear_all(&mut arena.state, &self.notifier);

        let token = self.session.child_token();
        arena.clock.set_parent(token.clone());
        arena.stuns.set_parent(token.clone());
        arena.rounds.reset(token.clone());
        arena.match_token = token;

        let previous_phase = arena.state.phase;
        arena.state.reset_match();
        arena.last_outcome = None;
        arena.match_id = Uuid::new_v4();

        info!(match_id = %arena.match_id, "match started");
        metrics::record_match_started();
        metrics::set_current_phase(Phase::Ready.as_str(), Some(previous_phase.as_str()));
        self.notifier.emit(DuelEvent::MatchStarted {
            match_id: arena.match_id,
        });
        self.notifier.emit(DuelEvent::PhaseChanged {
            phase: Phase::Ready,
            round: arena.state.round,
        });
        arena.match_id
    }
}

impl TimerSink for Core {
    fn fire(&self, task: TimerTask, token: &CancellationToken) {
        let mut guard = self.lock();
        if token.is_cancelled() {
            debug!(task = task.label(), "cancelled timer ignored");
            metrics::record_stale_timer(task.label());
            return;
        }

        let arena = &mut *guard;
        let _span = info_span!("match", match_id = %arena.match_id).entered();
        let fx = self.effects();

        let applied = match task {
            TimerTask::Advance { from, to } => {
                match arena.clock.on_transition(&mut arena.state, from, to, &fx) {
                    Ok(Transition::Applied) => true,
                    Ok(Transition::Stale) => false,
                    Err(err) => {
                        report_invariant(&err);
                        arena
                            .rounds
                            .force_ready(&mut arena.state, &mut arena.clock, &self.notifier);
                        true
                    }
                }
            }
            TimerTask::DrawExpired => {
                if arena.clock.on_draw_expired(&arena.state) {
                    info!(round = arena.state.round, "draw window expired");
                    arena.rounds.end_round(&mut arena.state, &mut arena.clock, &fx)
                } else {
                    false
                }
            }
            TimerTask::StunExpired(player) => {
                arena.stuns.expire(&mut arena.state, player, &self.notifier);
                true
            }
            TimerTask::EndRound { round } => {
                round == arena.state.round
                    && arena.rounds.end_round(&mut arena.state, &mut arena.clock, &fx)
            }
            TimerTask::NextRound { round } => {
                arena.rounds.advance(&mut arena.state, round, &self.notifier)
            }
        };

        if !applied {
            debug!(task = task.label(), phase = %arena.state.phase, "stale timer ignored");
            metrics::record_stale_timer(task.label());
        }
    }
}

fn player_view(state: &DuelState, id: PlayerId) -> PlayerView {
    let player = state.player(id);
    PlayerView {
        health: player.health,
        stunned: player.stunned,
        shot_fired: player.shot_fired,
    }
}

fn report_invariant(err: &DuelError) {
    error!(error = %err, "invariant violation");
    metrics::record_error("invariant");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{DamageRange, DelayRange};
    use crate::duel::gate::RulesGate;
    use crate::duel::random::ScriptedRandom;
    use crate::duel::shot::ShotTier;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Fixed 1s steps: Alert3 @1s, Alert2 @2s, Alert1 @3s, Draw @4s,
    /// draw expiry @5s.
    fn fixed_config() -> Arc<DuelConfig> {
        Arc::new(DuelConfig {
            start_delay: DelayRange::fixed(ms(1000)),
            alert_delay: DelayRange::fixed(ms(1000)),
            ..DuelConfig::default()
        })
    }

    fn controller(script: &[u64]) -> MatchController {
        let rng = ScriptedRandom::new(script.iter().copied());
        MatchController::with_random(fixed_config(), Box::new(rng)).unwrap()
    }

    #[test]
    fn test_requires_runtime() {
        let err = MatchController::new(Arc::new(DuelConfig::default())).unwrap_err();
        assert!(matches!(err, DuelError::NoRuntime));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state() {
        let duel = controller(&[]);
        assert_eq!(duel.current_phase(), Phase::Ready);
        assert_eq!(duel.round(), 1);
        assert_eq!(
            duel.player(PlayerId::One),
            PlayerView {
                health: 100,
                stunned: false,
                shot_fired: false
            }
        );
        assert!(duel.winner().is_none());
        assert!(duel.last_shot_outcome().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_draw() {
        let duel = controller(&[]);
        assert!(duel.start_round());

        tokio::time::sleep(ms(500)).await;
        assert_eq!(duel.current_phase(), Phase::Ready);
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(duel.current_phase(), Phase::Alert3);
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(duel.current_phase(), Phase::Alert2);
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(duel.current_phase(), Phase::Alert1);
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(duel.current_phase(), Phase::Draw);
    }

    #[tokio::test(start_paused = true)]
    async fn test_draw_expiry_is_mutual_miss() {
        let duel = controller(&[]);
        duel.start_round();

        tokio::time::sleep(ms(5100)).await;
        assert_eq!(duel.current_phase(), Phase::RoundEnd);

        tokio::time::sleep(ms(2000)).await;
        assert_eq!(duel.current_phase(), Phase::Ready);
        assert_eq!(duel.round(), 2);
        assert_eq!(duel.player(PlayerId::One).health, 100);
        assert_eq!(duel.player(PlayerId::Two).health, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_shot_scenario() {
        let duel = controller(&[]);
        duel.start_round();
        tokio::time::sleep(ms(4100)).await;

        let outcome = duel.fire(PlayerId::One).unwrap();

        assert_eq!(outcome.tier, ShotTier::Clean);
        assert_eq!(outcome.damage, 30);
        assert_eq!(duel.player(PlayerId::Two).health, 70);
        assert!(duel.player(PlayerId::Two).stunned);
        assert_eq!(duel.last_shot_outcome(), Some(outcome));
        assert!(duel.draw_remaining_fraction(Instant::now()).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_clean_shot_ends_round_with_window() {
        let duel = controller(&[]);
        let mut rx = duel.subscribe();
        duel.start_round();
        tokio::time::sleep(ms(4100)).await;
        duel.fire(PlayerId::One).unwrap();

        // Draw opened at 4s; the window would have closed at 5s
        tokio::time::sleep(ms(850)).await;
        assert_eq!(duel.current_phase(), Phase::Draw);
        tokio::time::sleep(ms(100)).await;
        assert_eq!(duel.current_phase(), Phase::RoundEnd);
        assert!(duel.fire(PlayerId::Two).is_none());

        tokio::time::sleep(ms(2000)).await;
        assert_eq!(duel.current_phase(), Phase::Ready);
        assert_eq!(duel.round(), 2);
        assert_eq!(duel.player(PlayerId::Two).health, 70);

        let ended = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, DuelEvent::RoundEnded { round: 1 }))
            .count();
        assert_eq!(ended, 1);
        assert!(duel.start_round());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dirty_knockout_scenario() {
        // Four delay rolls, then the damage roll
        let duel = controller(&[1000, 1000, 1000, 1000, 20]);
        {
            let mut arena = duel.core.lock();
            arena.state.player_mut(PlayerId::Two).health = 15;
        }
        duel.start_round();
        tokio::time::sleep(ms(2100)).await;
        assert_eq!(duel.current_phase(), Phase::Alert2);

        let outcome = duel.fire(PlayerId::One).unwrap();

        assert_eq!(outcome.tier, ShotTier::Dirty);
        assert_eq!(outcome.damage, 20);
        assert_eq!(outcome.target_health_after, 0);
        assert_eq!(duel.current_phase(), Phase::GameOver);
        assert_eq!(duel.winner(), Some(PlayerId::One));

        // Stale countdown steps cannot leave game over
        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(duel.current_phase(), Phase::GameOver);
        assert_eq!(duel.round(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_fire_ends_round_after_grace() {
        let duel = controller(&[1000, 1000, 1000, 1000, 12, 14]);
        let mut rx = duel.subscribe();
        duel.start_round();
        tokio::time::sleep(ms(1100)).await;
        duel.fire(PlayerId::One).unwrap();
        assert!(duel.fire(PlayerId::Two).is_none());

        // Player two recovers from the stun at 3.1s, during Alert1
        tokio::time::sleep(ms(2100)).await;
        assert_eq!(duel.current_phase(), Phase::Alert1);
        duel.fire(PlayerId::Two).unwrap();
        assert!(duel.fire(PlayerId::Two).is_none());

        tokio::time::sleep(ms(400)).await;
        assert_eq!(duel.current_phase(), Phase::Alert1);
        tokio::time::sleep(ms(200)).await;
        assert_eq!(duel.current_phase(), Phase::RoundEnd);

        // The aborted Draw step never lands
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(duel.current_phase(), Phase::RoundEnd);

        let ended: usize = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, DuelEvent::RoundEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stun_blocks_until_expiry() {
        let config = Arc::new(DuelConfig {
            start_delay: DelayRange::fixed(ms(100)),
            alert_delay: DelayRange::fixed(ms(100)),
            draw_window: ms(5000),
            ..DuelConfig::default()
        });
        let duel = MatchController::with_random(config, Box::new(ScriptedRandom::default())).unwrap();
        duel.start_round();
        tokio::time::sleep(ms(450)).await;
        assert_eq!(duel.current_phase(), Phase::Draw);

        duel.fire(PlayerId::One).unwrap();
        let stunned_at = Instant::now();
        assert!(duel.fire(PlayerId::Two).is_none());

        tokio::time::sleep(ms(1000)).await;
        let fraction = duel.stun_remaining_fraction(PlayerId::Two, Instant::now());
        let expected = 1.0 - (Instant::now() - stunned_at).as_secs_f64() / 2.0;
        assert!((fraction - expected).abs() < 1e-9);
        assert!(duel.fire(PlayerId::Two).is_none());

        tokio::time::sleep(ms(1100)).await;
        assert!(!duel.player(PlayerId::Two).stunned);
        let answer = duel.fire(PlayerId::Two).unwrap();
        assert_eq!(answer.tier, ShotTier::Clean);
        assert_eq!(duel.player(PlayerId::One).health, 70);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_blocks_start() {
        let gate = Arc::new(RulesGate::new());
        let duel = controller(&[]).with_gate(gate.clone());

        gate.open(PlayerId::Two);
        assert!(!duel.start_round());
        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(duel.current_phase(), Phase::Ready);

        gate.close(PlayerId::Two);
        assert!(duel.start_round());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_pending_timers() {
        let duel = controller(&[]);
        let first = duel.match_id();
        duel.start_round();
        tokio::time::sleep(ms(4100)).await;
        duel.fire(PlayerId::One).unwrap();

        let second = duel.restart_match();

        assert_ne!(first, second);
        assert_eq!(duel.current_phase(), Phase::Ready);
        assert_eq!(duel.player(PlayerId::Two).health, 100);
        assert!(!duel.player(PlayerId::Two).stunned);
        assert!(duel.last_shot_outcome().is_none());

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(duel.current_phase(), Phase::Ready);
        assert_eq!(duel.round(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers() {
        let duel = controller(&[]);
        duel.start_round();
        duel.shutdown();
        assert!(duel.is_shut_down());

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(duel.current_phase(), Phase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_serializes() {
        let config = Arc::new(DuelConfig {
            dirty_damage: DamageRange { min: 10, max: 10 },
            ..(*fixed_config()).clone()
        });
        let duel = MatchController::with_random(config, Box::new(ScriptedRandom::default())).unwrap();
        duel.start_round();
        tokio::time::sleep(ms(1100)).await;
        duel.fire(PlayerId::Two).unwrap();

        let snapshot = duel.snapshot();
        assert_eq!(snapshot.phase, Phase::Alert3);
        assert_eq!(snapshot.player_one.health, 90);
        assert!(snapshot.player_one.stunned);
        assert!((snapshot.stun_remaining[0] - 1.0).abs() < f64::EPSILON);
        assert!(snapshot.winner.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "alert-3");
        assert_eq!(json["last_shot"]["tier"], "dirty");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_match_emits_events() {
        let duel = controller(&[]);
        let mut rx = duel.subscribe();
        let id = duel.new_match();

        assert_eq!(rx.try_recv().unwrap(), DuelEvent::MatchStarted { match_id: id });
        assert_eq!(
            rx.try_recv().unwrap(),
            DuelEvent::PhaseChanged {
                phase: Phase::Ready,
                round: 1
            }
        );
    }
}
