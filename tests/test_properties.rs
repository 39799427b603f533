//! Property tests for delay bounds, damage bounds, and health clamping.

use std::sync::Mutex;
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use quickdraw::config::{DamageRange, DelayRange, DuelConfig};
use quickdraw::duel::random::{sample_damage, sample_delay};
use quickdraw::duel::{
    DuelState, Effects, Notifier, Phase, PhaseClock, PlayerId, Scheduler, SeededRandom,
    ShotResolver, ShotTier, StunScheduler, TimerTask,
};

/// Scheduler that only records what it was asked to do.
#[derive(Default)]
struct Recorder(Mutex<Vec<(Duration, TimerTask)>>);

impl Scheduler for Recorder {
    fn schedule(&self, after: Duration, _token: CancellationToken, task: TimerTask) {
        self.0.lock().unwrap().push((after, task));
    }
}

fn delay_range() -> impl Strategy<Value = DelayRange> {
    (0u64..10_000, 0u64..10_000).prop_map(|(a, b)| DelayRange::from_millis(a.min(b), a.max(b)))
}

fn damage_range() -> impl Strategy<Value = DamageRange> {
    (0u32..200, 0u32..200).prop_map(|(a, b)| DamageRange {
        min: a.min(b),
        max: a.max(b),
    })
}

proptest! {
    #[test]
    fn sampled_delays_stay_in_bounds(seed: u64, range in delay_range()) {
        let mut rng = SeededRandom::new(seed);
        for _ in 0..16 {
            let delay = sample_delay(&range, &mut rng);
            prop_assert!(range.contains(delay), "{delay:?} outside {range:?}");
        }
    }

    #[test]
    fn sampled_damage_stays_in_bounds(seed: u64, range in damage_range()) {
        let mut rng = SeededRandom::new(seed);
        for _ in 0..16 {
            let damage = sample_damage(range, &mut rng);
            prop_assert!((range.min..=range.max).contains(&damage));
        }
    }

    #[test]
    fn countdown_steps_use_configured_ranges(
        seed: u64,
        start in delay_range(),
        alert in delay_range(),
    ) {
        let config = DuelConfig {
            start_delay: start,
            alert_delay: alert,
            ..DuelConfig::default()
        };
        let recorder = Recorder::default();
        let notifier = Notifier::new();
        let fx = Effects { scheduler: &recorder, notifier: &notifier, now: Instant::now() };
        let mut clock = PhaseClock::new(&config, CancellationToken::new());
        let mut rng = SeededRandom::new(seed);

        let delays = clock.start(&mut rng, &fx);

        prop_assert!(start.contains(delays[0]));
        for delay in &delays[1..] {
            prop_assert!(alert.contains(*delay));
        }

        // Steps are scheduled at cumulative offsets, in countdown order
        let scheduled = recorder.0.lock().unwrap().clone();
        let expected_steps = [
            (Phase::Ready, Phase::Alert3),
            (Phase::Alert3, Phase::Alert2),
            (Phase::Alert2, Phase::Alert1),
            (Phase::Alert1, Phase::Draw),
        ];
        prop_assert_eq!(scheduled.len(), 4);
        let mut at = Duration::ZERO;
        for (i, (after, task)) in scheduled.iter().enumerate() {
            at += delays[i];
            prop_assert_eq!(*after, at);
            let (from, to) = expected_steps[i];
            prop_assert_eq!(*task, TimerTask::Advance { from, to });
        }
    }

    #[test]
    fn health_never_leaves_bounds(
        seed: u64,
        initial_health in 1u32..300,
        clean_damage in 1u32..400,
        dirty in damage_range(),
        shots in prop::collection::vec((any::<bool>(), 0usize..4), 1..40),
    ) {
        let config = DuelConfig {
            initial_health,
            clean_damage,
            dirty_damage: dirty,
            ..DuelConfig::default()
        };
        let recorder = Recorder::default();
        let notifier = Notifier::new();
        let fx = Effects { scheduler: &recorder, notifier: &notifier, now: Instant::now() };
        let token = CancellationToken::new();
        let mut clock = PhaseClock::new(&config, token.clone());
        let mut stuns = StunScheduler::new(config.stun_duration, token);
        let resolver = ShotResolver::new(&config);
        let mut rng = SeededRandom::new(seed);
        let mut state = DuelState::new(initial_health);

        let windows = [Phase::Alert3, Phase::Alert2, Phase::Alert1, Phase::Draw];
        for (player_one, window) in shots {
            let shooter = if player_one { PlayerId::One } else { PlayerId::Two };
            state.reset_round();
            stuns.expire(&mut state, shooter, &notifier);
            state.phase = windows[window];

            let before = state.player(shooter.opponent()).health;
            let outcome = resolver.fire(&mut state, shooter, &mut stuns, &mut clock, &mut rng, &fx);
            let outcome = outcome.expect("eligible shooter must fire");

            match outcome.tier {
                ShotTier::Clean => prop_assert_eq!(outcome.damage, clean_damage),
                ShotTier::Dirty => prop_assert!((dirty.min..=dirty.max).contains(&outcome.damage)),
            }
            prop_assert_eq!(outcome.target_health_after, before.saturating_sub(outcome.damage));
            for id in PlayerId::ALL {
                prop_assert!(state.player(id).health <= initial_health);
            }
            prop_assert!(state.player(shooter.opponent()).stunned);
        }
    }
}
