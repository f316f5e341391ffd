//! Water level estimate for rescue mode.

use sb_core::PhysicalCharacteristics;

/// Dead-reckoned water level, seeded from the last trusted reading.
///
/// Every open pump is assumed to deliver its full rated capacity; the
/// estimate drifts over time and is only kept inside `[0, capacity]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelEstimator {
    level: f64,
    capacity: f64,
}

impl LevelEstimator {
    pub fn seed(level: f64, chars: &PhysicalCharacteristics) -> Self {
        Self {
            level: level.clamp(0.0, chars.capacity),
            capacity: chars.capacity,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Integrate `inflow - steam` over `dt` seconds and return the new level.
    pub fn advance(&mut self, inflow: f64, steam: f64, dt: f64) -> f64 {
        let next = self.level + (inflow - steam) * dt;
        // NaN inputs leave the estimate where it was
        if next.is_finite() {
            self.level = next.clamp(0.0, self.capacity);
        }
        self.level
    }
}

/// Steam exhaust assumed over the last interval.
///
/// Mean of the two trusted readings around the interval; with only one, that
/// one; otherwise the most recent trusted reading, and as a last resort half
/// the maximal steam rate.
pub fn mean_steam(
    previous: Option<f64>,
    current: Option<f64>,
    last_trusted: Option<f64>,
    maximal_steam_rate: f64,
) -> f64 {
    match (previous, current) {
        (Some(a), Some(b)) => 0.5 * (a + b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => last_trusted.unwrap_or(0.5 * maximal_steam_rate),
    }
}

/// Total flow delivered by the pumps marked open.
pub fn delivered_flow(capacities: &[f64], open: &[bool]) -> f64 {
    capacities
        .iter()
        .zip(open)
        .filter(|(_, on)| **on)
        .map(|(c, _)| *c)
        .sum()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn estimate_stays_within_capacity(
            seed in -100.0_f64..700.0,
            steps in prop::collection::vec((0.0_f64..40.0, 0.0_f64..10.0), 1..50),
        ) {
            let chars = PhysicalCharacteristics::default();
            let mut est = LevelEstimator::seed(seed, &chars);
            for (inflow, steam) in steps {
                let l = est.advance(inflow, steam, 5.0);
                prop_assert!((0.0..=chars.capacity).contains(&l));
            }
        }
    }
}
