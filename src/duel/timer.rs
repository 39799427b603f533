//! Scheduled duel tasks
//!
//! Every delayed action in a match is an explicit [`TimerTask`] value paired
//! with a [`CancellationToken`]. A [`Scheduler`] arranges for the task to be
//! handed back to a [`TimerSink`] once its delay has elapsed, unless the
//! token is cancelled first.
//!
//! The production [`TokioScheduler`] computes the deadline when the task is
//! scheduled and spawns a one-shot task on the runtime. The sink re-checks
//! the token after taking the engine lock, so a task that loses the race
//! with a cancellation never runs any part of its body.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::notify::Notifier;
use super::state::{Phase, PlayerId};

/// A delayed duel action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Countdown step. Runs only while the phase still equals `from`.
    Advance {
        /// Expected predecessor phase
        from: Phase,
        /// Phase to enter
        to: Phase,
    },
    /// The draw window elapsed.
    DrawExpired,
    /// A player's stun elapsed.
    StunExpired(PlayerId),
    /// Both players fired and the grace period is over.
    EndRound {
        /// Round the task was scheduled for
        round: u32,
    },
    /// The pause after a round end is over.
    NextRound {
        /// Round that just ended
        round: u32,
    },
}

impl TimerTask {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::DrawExpired => "draw-expired",
            Self::StunExpired(_) => "stun-expired",
            Self::EndRound { .. } => "end-round",
            Self::NextRound { .. } => "next-round",
        }
    }
}

/// Arranges for tasks to run after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run `after` from now, unless `token` is
    /// cancelled first.
    fn schedule(&self, after: Duration, token: CancellationToken, task: TimerTask);
}

/// Receives tasks whose delay has elapsed.
pub trait TimerSink: Send + Sync {
    /// Runs `task`. Implementations must re-check `token` under their own
    /// lock before touching any state.
    fn fire(&self, task: TimerTask, token: &CancellationToken);
}

/// Side-effect context handed to duel components while the engine lock is
/// held: where to schedule follow-up tasks, where to publish events, and
/// the instant the current operation observed.
#[derive(Clone, Copy)]
pub struct Effects<'a> {
    /// Scheduler for follow-up tasks
    pub scheduler: &'a dyn Scheduler,
    /// Event sink
    pub notifier: &'a Notifier,
    /// Time of the current operation
    pub now: Instant,
}

/// Scheduler backed by one-shot Tokio tasks.
pub struct TokioScheduler {
    handle: Handle,
    sink: Weak<dyn TimerSink>,
}

impl TokioScheduler {
    /// Creates a scheduler that spawns on `handle` and delivers to `sink`.
    ///
    /// The sink is held weakly so pending timers never keep a dropped
    /// match alive.
    #[must_use]
    pub fn new(handle: Handle, sink: Weak<dyn TimerSink>) -> Self {
        Self { handle, sink }
    }
}

impl std::fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioScheduler").finish_non_exhaustive()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, after: Duration, token: CancellationToken, task: TimerTask) {
        let sleep = if let Some(deadline) = Instant::now().checked_add(after) {
            tokio::time::sleep_until(deadline)
        } else {
            warn!(task = task.label(), ?after, "timer delay overflows the clock; parking it");
            tokio::time::sleep(after)
        };
        let sink = self.sink.clone();
        self.handle.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = sleep => {
                    if let Some(sink) = sink.upgrade() {
                        sink.fire(task, &token);
                    }
                }
            }
        });
    }
}
