//! Signed delta to unit breakdown.
//!
//! # Invariants
//! - Divisors are fixed lengths, not calendar aware.
//! - Full decomposition never skips a unit; remainders carry downwards.
//! - Trimmed output drops leading zero units only.

/// Display unit, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// All units in decomposition order.
    pub const ORDERED: [Self; 6] = [
        Self::Years,
        Self::Months,
        Self::Days,
        Self::Hours,
        Self::Minutes,
        Self::Seconds,
    ];

    /// Fixed unit length in milliseconds.
    pub const fn divisor_ms(self) -> u64 {
        match self {
            Self::Years => 31_536_000_000,
            Self::Months => 2_628_000_000,
            Self::Days => 86_400_000,
            Self::Hours => 3_600_000,
            Self::Minutes => 60_000,
            Self::Seconds => 1_000,
        }
    }
}

/// One `(unit, magnitude)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPart {
    pub unit: TimeUnit,
    pub value: u64,
}

/// Direction and breakdown of `target - now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    /// `target > now`. Zero delta is not future.
    pub is_future: bool,
    /// Trimmed parts, never empty.
    pub parts: Vec<DurationPart>,
}

/// Breaks `abs(delta_ms)` into every unit, years to seconds.
///
/// Sub-second remainders are discarded.
pub fn decompose_full(delta_ms: i64) -> [DurationPart; 6] {
    let mut remaining = delta_ms.unsigned_abs();
    TimeUnit::ORDERED.map(|unit| {
        let divisor = unit.divisor_ms();
        let value = remaining / divisor;
        remaining -= value * divisor;
        DurationPart { unit, value }
    })
}

/// Full decomposition with leading zero units removed.
///
/// Returns a single zero-second part when every unit is zero.
pub fn decompose_trimmed(delta_ms: i64) -> Vec<DurationPart> {
    let parts: Vec<DurationPart> = decompose_full(delta_ms)
        .into_iter()
        .skip_while(|part| part.value == 0)
        .collect();

    if parts.is_empty() {
        return vec![DurationPart {
            unit: TimeUnit::Seconds,
            value: 0,
        }];
    }
    parts
}

/// Decomposes the distance from `now_ms` to `target_ms`.
pub fn decompose(target_ms: i64, now_ms: i64) -> Decomposition {
    let delta = i128::from(target_ms) - i128::from(now_ms);
    let clamped = i64::try_from(delta).unwrap_or(if delta > 0 { i64::MAX } else { i64::MIN });
    Decomposition {
        is_future: delta > 0,
        parts: decompose_trimmed(clamped),
    }
}

/// Sums the parts back into milliseconds.
pub fn reconstruct_ms(parts: &[DurationPart]) -> u64 {
    parts
        .iter()
        .map(|part| part.value * part.unit.divisor_ms())
        .sum()
}
