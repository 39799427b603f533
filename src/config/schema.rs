//! Duel configuration schema
//!
//! Every field is optional in YAML; omitted fields fall back to the classic
//! quickdraw constants. Durations are human-readable strings such as
//! `"500ms"` or `"2s"`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Starting health for both players.
pub const DEFAULT_INITIAL_HEALTH: u32 = 100;

/// Fixed damage of a shot fired during the draw window.
pub const DEFAULT_CLEAN_DAMAGE: u32 = 30;

/// Lower bound of the damage roll for a shot fired during an alert phase.
pub const DEFAULT_DIRTY_MIN: u32 = 10;

/// Upper bound of the damage roll for a shot fired during an alert phase.
pub const DEFAULT_DIRTY_MAX: u32 = 20;

/// How long a hit player is unable to fire.
pub const DEFAULT_STUN_DURATION: Duration = Duration::from_millis(2000);

/// How long the draw window stays open before the round is forced to end.
pub const DEFAULT_DRAW_WINDOW: Duration = Duration::from_millis(1000);

/// Delay between "both players fired" and the round actually ending.
pub const DEFAULT_ROUND_END_GRACE: Duration = Duration::from_millis(500);

/// Pause between round end and the next round becoming ready.
pub const DEFAULT_ROUND_END_DELAY: Duration = Duration::from_millis(2000);

/// Inclusive range of durations a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayRange {
    /// Shortest possible delay
    #[serde(with = "duration_str")]
    pub min: Duration,
    /// Longest possible delay
    #[serde(with = "duration_str")]
    pub max: Duration,
}

impl DelayRange {
    /// Creates a range from millisecond bounds.
    #[must_use]
    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    /// Creates a degenerate range that always yields `delay`.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    /// Returns `(min, max)` in whole milliseconds.
    #[must_use]
    pub fn as_millis(&self) -> (u64, u64) {
        (millis(self.min), millis(self.max))
    }

    /// Returns `true` if `delay` lies within the range (inclusive).
    #[must_use]
    pub fn contains(&self, delay: Duration) -> bool {
        self.min <= delay && delay <= self.max
    }
}

/// Inclusive integer damage range for dirty shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DamageRange {
    /// Smallest damage roll
    pub min: u32,
    /// Largest damage roll
    pub max: u32,
}

/// Winner rule when both players reach zero health in the same resolution
/// step with equal remaining health.
///
/// `PlayerOne` reproduces the classic rule (player one wins ties).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Player one wins ties.
    #[default]
    PlayerOne,
    /// Player two wins ties.
    PlayerTwo,
    /// The player who fired the deciding shot wins ties.
    Shooter,
}

/// Complete duel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DuelConfig {
    /// Starting (and maximum) health for each player
    pub initial_health: u32,
    /// Damage of a shot fired during the draw window
    pub clean_damage: u32,
    /// Damage roll range of a shot fired during an alert phase
    pub dirty_damage: DamageRange,
    /// Range for the delay between round start and the first alert
    pub start_delay: DelayRange,
    /// Range for each of the three delays between alerts
    pub alert_delay: DelayRange,
    /// How long the draw window stays open
    #[serde(with = "duration_str")]
    pub draw_window: Duration,
    /// How long a hit player cannot fire
    #[serde(with = "duration_str")]
    pub stun_duration: Duration,
    /// Delay between both players having fired and the round ending
    #[serde(with = "duration_str")]
    pub round_end_grace: Duration,
    /// Pause between round end and the next ready state
    #[serde(with = "duration_str")]
    pub round_end_delay: Duration,
    /// Whether shots are accepted during the alert phases (dirty shots)
    pub early_fire: bool,
    /// Winner rule for simultaneous knock-outs with equal health
    pub tie_break: TieBreak,
    /// Seed for the random source; OS entropy when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            initial_health: DEFAULT_INITIAL_HEALTH,
            clean_damage: DEFAULT_CLEAN_DAMAGE,
            dirty_damage: DamageRange {
                min: DEFAULT_DIRTY_MIN,
                max: DEFAULT_DIRTY_MAX,
            },
            start_delay: DelayRange::from_millis(500, 3000),
            alert_delay: DelayRange::from_millis(500, 5000),
            draw_window: DEFAULT_DRAW_WINDOW,
            stun_duration: DEFAULT_STUN_DURATION,
            round_end_grace: DEFAULT_ROUND_END_GRACE,
            round_end_delay: DEFAULT_ROUND_END_DELAY,
            early_fire: true,
            tie_break: TieBreak::default(),
            seed: None,
        }
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Serde adapter for human-readable durations (`"500ms"`, `"2s"`).
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
