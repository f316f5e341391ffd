//! Pump selection.
//!
//! The planner enumerates a small, ordered list of candidate pump sets
//! (the current set, then closing open pumps lowest index first, then
//! opening closed pumps lowest index first), predicts the level each would
//! reach after one cycle and keeps the one closest to the middle of the
//! normal band. Earlier candidates win ties, which makes the choice
//! deterministic and biased towards leaving pumps alone.

use sb_core::{PhysicalCharacteristics, Tolerances, nearly_equal};

use crate::estimator::delivered_flow;

#[derive(Debug, Clone)]
pub struct PumpPlanner {
    capacities: Vec<f64>,
    min_normal: f64,
    max_normal: f64,
    target: f64,
    dt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Below,
    Inside,
    Above,
}

impl PumpPlanner {
    pub fn new(chars: &PhysicalCharacteristics, dt: f64) -> Self {
        Self {
            capacities: chars.pump_capacities.clone(),
            min_normal: chars.minimal_normal_level,
            max_normal: chars.maximal_normal_level,
            target: chars.normal_midpoint(),
            dt,
        }
    }

    /// Level expected one cycle from now with pumps `open`.
    ///
    /// `uncontrolled` is inflow the planner cannot switch off, such as a
    /// failed pump that still reports itself open.
    pub fn predict(&self, level: f64, steam: f64, uncontrolled: f64, open: &[bool]) -> f64 {
        level + (delivered_flow(&self.capacities, open) + uncontrolled - steam) * self.dt
    }

    fn band(&self, level: f64) -> Band {
        if level < self.min_normal {
            Band::Below
        } else if level > self.max_normal {
            Band::Above
        } else {
            Band::Inside
        }
    }

    /// Choose the pump set for the coming cycle.
    ///
    /// `current` is the set commanded last cycle, `eligible` marks pumps
    /// that may be opened. Ineligible pumps are always closed; whatever they
    /// still deliver is passed as `uncontrolled` inflow.
    pub fn plan(
        &self,
        level: f64,
        steam: f64,
        uncontrolled: f64,
        current: &[bool],
        eligible: &[bool],
    ) -> Vec<bool> {
        let n = self.capacities.len();
        let is_eligible = |i: usize| eligible.get(i).copied().unwrap_or(false);
        let base: Vec<bool> = (0..n)
            .map(|i| current.get(i).copied().unwrap_or(false) && is_eligible(i))
            .collect();

        let mut shrink = Vec::new();
        let mut set = base.clone();
        for i in 0..n {
            if set[i] {
                set[i] = false;
                shrink.push(set.clone());
            }
        }

        let mut grow = Vec::new();
        let mut set = base.clone();
        for i in 0..n {
            if !set[i] && is_eligible(i) {
                set[i] = true;
                grow.push(set.clone());
            }
        }

        let band = self.band(level);
        let mut candidates = vec![base.clone()];
        match band {
            Band::Below => candidates.extend(grow),
            Band::Above => candidates.extend(shrink),
            Band::Inside => {
                if self.band(self.predict(level, steam, uncontrolled, &base)) == Band::Inside {
                    return base;
                }
                candidates.extend(shrink);
                candidates.extend(grow);
            }
        }

        // Do not overshoot into the opposite side of the band when avoidable.
        let acceptable = |p: f64| match band {
            Band::Below => p <= self.max_normal,
            Band::Above => p >= self.min_normal,
            Band::Inside => self.band(p) == Band::Inside,
        };
        let preferred: Vec<&Vec<bool>> = candidates
            .iter()
            .filter(|c| acceptable(self.predict(level, steam, uncontrolled, c)))
            .collect();
        let pool = if preferred.is_empty() {
            candidates.iter().collect()
        } else {
            preferred
        };

        let tol = Tolerances::default();
        let mut best: Option<(&Vec<bool>, f64)> = None;
        for c in pool {
            let score = (self.predict(level, steam, uncontrolled, c) - self.target).abs();
            match best {
                Some((_, s)) if score >= s || nearly_equal(score, s, tol) => {}
                _ => best = Some((c, score)),
            }
        }
        best.map(|(c, _)| c.clone()).unwrap_or(base)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn never_opens_an_ineligible_pump(
            level in 0.0_f64..500.0,
            steam in 0.0_f64..10.0,
            current in prop::collection::vec(any::<bool>(), 4),
            eligible in prop::collection::vec(any::<bool>(), 4),
        ) {
            let p = PumpPlanner::new(&PhysicalCharacteristics::default(), 5.0);
            let plan = p.plan(level, steam, 0.0, &current, &eligible);
            prop_assert_eq!(plan.len(), 4);
            for i in 0..4 {
                prop_assert!(!plan[i] || eligible[i]);
            }
        }
    }
}
