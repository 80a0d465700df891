//! Leveling arithmetic.
//!
//! # Responsibility
//! - Map a profile plus an XP delta to the next profile state.
//! - Derive the progress values shown on the home screen ring.
//!
//! # Invariants
//! - The threshold is flat: every level costs the same amount of XP.
//! - Level never drops below 1 and XP never drops below 0.
//! - With `LevelPolicy::SingleStep` at most one level transition happens per
//!   call, so a delta larger than the threshold can leave `xp >= threshold`.
//!   `LevelPolicy::Cascade` always lands inside `[0, threshold)`.

use crate::model::profile::Profile;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_XP_THRESHOLD: i64 = 500;

/// How many level transitions one XP change may cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelPolicy {
    /// One level up or down per change.
    #[default]
    SingleStep,
    /// Keep transitioning until XP fits the current level.
    Cascade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelingRules {
    /// XP required to advance one level.
    pub threshold: i64,
    pub policy: LevelPolicy,
}

impl Default for LevelingRules {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_XP_THRESHOLD,
            policy: LevelPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidThreshold(pub i64);

impl Display for InvalidThreshold {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "xp threshold must be positive, got {}", self.0)
    }
}

impl Error for InvalidThreshold {}

impl LevelingRules {
    pub fn new(threshold: i64, policy: LevelPolicy) -> Result<Self, InvalidThreshold> {
        let rules = Self { threshold, policy };
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), InvalidThreshold> {
        if self.threshold <= 0 {
            return Err(InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Returns the profile after applying `delta` XP.
///
/// Positive deltas level up once `xp` reaches the threshold; negative deltas
/// (reversals) borrow from the previous level. At level 1 a negative result
/// is clamped to 0. Arithmetic runs in `i128`; results beyond `i64` saturate.
pub fn apply_xp(profile: Profile, delta: i64, rules: &LevelingRules) -> Profile {
    let threshold = i128::from(rules.threshold.max(1));
    let level = i128::from(profile.level.max(1));
    let raw = i128::from(profile.xp) + i128::from(delta);
    let (level, xp) = match rules.policy {
        LevelPolicy::SingleStep => single_step(level, raw, threshold),
        LevelPolicy::Cascade => cascade(level, raw, threshold),
    };
    Profile {
        id: profile.id,
        level: narrow(level),
        xp: narrow(xp),
    }
}

fn single_step(level: i128, raw: i128, threshold: i128) -> (i128, i128) {
    if raw >= threshold {
        (level + 1, raw - threshold)
    } else if raw < 0 {
        if level > 1 {
            (level - 1, (threshold + raw).max(0))
        } else {
            (1, 0)
        }
    } else {
        (level, raw)
    }
}

fn cascade(level: i128, raw: i128, threshold: i128) -> (i128, i128) {
    if raw >= 0 {
        return (level + raw / threshold, raw % threshold);
    }

    // ceil(-raw / threshold) levels are needed to absorb the deficit.
    let levels_down = (-raw + threshold - 1) / threshold;
    if levels_down >= level {
        return (1, 0);
    }
    (level - levels_down, raw + levels_down * threshold)
}

fn narrow(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Display values for the current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: i64,
    pub xp: i64,
    pub threshold: i64,
    /// XP still missing for the next level.
    pub remaining: i64,
    /// `xp / threshold`, clamped to `[0, 1]`.
    pub fraction: f64,
}

impl LevelProgress {
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

pub fn progress(profile: &Profile, rules: &LevelingRules) -> LevelProgress {
    let threshold = rules.threshold.max(1);
    let fraction = (profile.xp as f64 / threshold as f64).clamp(0.0, 1.0);
    LevelProgress {
        level: profile.level,
        xp: profile.xp,
        threshold,
        remaining: (threshold - profile.xp).max(0),
        fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_xp, progress, LevelPolicy, LevelingRules};
    use crate::model::profile::Profile;
    use crate::model::task::MAX_XP_VALUE;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn profile(level: i64, xp: i64) -> Profile {
        Profile {
            id: Uuid::nil(),
            level,
            xp,
        }
    }

    fn single() -> LevelingRules {
        LevelingRules::default()
    }

    fn cascade() -> LevelingRules {
        LevelingRules::new(500, LevelPolicy::Cascade).unwrap()
    }

    #[test]
    fn crossing_threshold_levels_up_with_remainder() {
        let next = apply_xp(profile(1, 480), 50, &single());
        assert_eq!((next.level, next.xp), (2, 30));
    }

    #[test]
    fn reversal_below_zero_borrows_from_previous_level() {
        let next = apply_xp(profile(2, 10), -50, &single());
        assert_eq!((next.level, next.xp), (1, 460));
    }

    #[test]
    fn reversal_at_level_one_clamps_to_zero() {
        let next = apply_xp(profile(1, 20), -50, &single());
        assert_eq!((next.level, next.xp), (1, 0));
    }

    #[test]
    fn exact_threshold_levels_up_to_zero() {
        let next = apply_xp(profile(3, 400), 100, &single());
        assert_eq!((next.level, next.xp), (4, 0));
    }

    #[test]
    fn single_step_applies_only_one_transition() {
        let next = apply_xp(profile(1, 0), 1_200, &single());
        assert_eq!((next.level, next.xp), (2, 700));

        let down = apply_xp(profile(5, 0), -1_200, &single());
        assert_eq!((down.level, down.xp), (4, 0));
    }

    #[test]
    fn cascade_applies_multiple_transitions() {
        let next = apply_xp(profile(1, 100), 1_200, &cascade());
        assert_eq!((next.level, next.xp), (3, 300));

        let down = apply_xp(profile(4, 100), -700, &cascade());
        assert_eq!((down.level, down.xp), (2, 400));

        let floor = apply_xp(profile(2, 0), -5_000, &cascade());
        assert_eq!((floor.level, floor.xp), (1, 0));
    }

    #[test]
    fn delta_then_negated_delta_restores_profile() {
        for rules in [single(), cascade()] {
            let start = profile(3, 480);
            for delta in [0, 1, 20, 50, 499] {
                let after = apply_xp(start, delta, &rules);
                let back = apply_xp(after, -delta, &rules);
                assert_eq!(back, start, "delta {delta} with {:?}", rules.policy);
            }
        }
    }

    #[test]
    fn rejects_non_positive_threshold() {
        assert!(LevelingRules::new(0, LevelPolicy::SingleStep).is_err());
        assert!(LevelingRules::new(-10, LevelPolicy::Cascade).is_err());
    }

    #[test]
    fn progress_reports_fraction_and_remaining() {
        let view = progress(&profile(2, 125), &single());
        assert_eq!(view.level, 2);
        assert_eq!(view.remaining, 375);
        assert!((view.fraction - 0.25).abs() < f64::EPSILON);
        assert!((view.percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn huge_cascade_award_reverses_without_overflow() {
        let start = profile(1, 0);
        let after = apply_xp(start, i64::MAX, &cascade());
        assert_eq!(after.level, 1 + i64::MAX / 500);
        assert_eq!(after.xp, i64::MAX % 500);
        assert_eq!(apply_xp(after, -i64::MAX, &cascade()), start);
    }

    #[test]
    fn single_step_saturates_at_top_level() {
        let next = apply_xp(profile(i64::MAX, 499), 1, &single());
        assert_eq!((next.level, next.xp), (i64::MAX, 0));
    }

    proptest! {
        #[test]
        fn cascade_keeps_xp_inside_one_level(
            level in 1i64..=i64::MAX,
            threshold in 1i64..=i64::MAX,
            xp_seed in 0i64..=i64::MAX,
            delta in any::<i64>(),
        ) {
            let rules = LevelingRules::new(threshold, LevelPolicy::Cascade).unwrap();
            let next = apply_xp(profile(level, xp_seed % threshold), delta, &rules);
            prop_assert!(next.level >= 1);
            prop_assert!(next.xp >= 0 && next.xp < threshold);
        }

        #[test]
        fn single_step_never_drops_below_floor(
            level in 1i64..=i64::MAX,
            threshold in 1i64..=i64::MAX,
            xp_seed in 0i64..=i64::MAX,
            delta in any::<i64>(),
        ) {
            let rules = LevelingRules::new(threshold, LevelPolicy::SingleStep).unwrap();
            let next = apply_xp(profile(level, xp_seed % threshold), delta, &rules);
            prop_assert!(next.level >= 1);
            prop_assert!(next.xp >= 0);
        }

        #[test]
        fn award_then_reversal_restores_profile(
            level in 1i64..1_000_000,
            threshold in 1i64..100_000,
            xp_seed in 0i64..100_000,
            delta in 0i64..=MAX_XP_VALUE,
            use_cascade in any::<bool>(),
        ) {
            let policy = if use_cascade {
                LevelPolicy::Cascade
            } else {
                LevelPolicy::SingleStep
            };
            let rules = LevelingRules::new(threshold, policy).unwrap();
            let start = profile(level, xp_seed % threshold);
            let after = apply_xp(start, delta, &rules);
            prop_assert_eq!(apply_xp(after, -delta, &rules), start);
        }
    }
}
