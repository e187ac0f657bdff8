/// Pluggable per-round scoring policy.
///
/// Every preset is a pure function of the answer outcome, the countdown
/// position, and the current streak; the session applies the returned delta
/// and clamps the running total at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScoringStrategy {
    /// Fixed points per correct answer, nothing otherwise.
    Flat { points: i64 },
    /// Faster answers score more: `base + round(base * remaining/limit)`.
    TimeWeighted { base: i64 },
    /// Time-weighted plus a bonus per streak level beyond `threshold`.
    StreakBonus { base: i64, threshold: u32, bonus: i64 },
    /// Flat points per correct; wrong and timed-out answers subtract
    /// `penalty` (the session floors the total at zero).
    Penalty { points: i64, penalty: i64 },
}

impl ScoringStrategy {
    pub fn flat(points: i64) -> Self {
        Self::Flat { points }
    }

    pub fn time_weighted(base: i64) -> Self {
        Self::TimeWeighted { base }
    }

    pub fn streak_bonus(base: i64, threshold: u32, bonus: i64) -> Self {
        Self::StreakBonus {
            base,
            threshold,
            bonus,
        }
    }

    pub fn penalty(points: i64, penalty: i64) -> Self {
        Self::Penalty { points, penalty }
    }

    /// Streak level at which `on_level_up` fires, if this strategy has one.
    pub fn level_threshold(&self) -> Option<u32> {
        match self {
            Self::StreakBonus { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }

    /// Score delta for one resolved round. `streak` is the consecutive-correct
    /// count *including* the answer being scored.
    pub fn score_delta(
        &self,
        correct: bool,
        time_remaining_ms: u64,
        time_limit_ms: u64,
        streak: u32,
    ) -> i64 {
        match *self {
            Self::Flat { points } => {
                if correct {
                    points
                } else {
                    0
                }
            }
            Self::TimeWeighted { base } => {
                if correct {
                    base + time_fraction(base, time_remaining_ms, time_limit_ms)
                } else {
                    0
                }
            }
            Self::StreakBonus {
                base,
                threshold,
                bonus,
            } => {
                if correct {
                    let timed = base + time_fraction(base, time_remaining_ms, time_limit_ms);
                    let levels = streak.saturating_sub(threshold) as i64;
                    timed + bonus * levels
                } else {
                    0
                }
            }
            Self::Penalty { points, penalty } => {
                if correct {
                    points
                } else {
                    -penalty
                }
            }
        }
    }
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        Self::TimeWeighted { base: 100 }
    }
}

fn time_fraction(base: i64, remaining_ms: u64, limit_ms: u64) -> i64 {
    if limit_ms == 0 {
        return 0;
    }
    let frac = remaining_ms.min(limit_ms) as f64 / limit_ms as f64;
    (base as f64 * frac).round() as i64
}
