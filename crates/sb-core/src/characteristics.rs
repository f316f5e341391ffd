//! Physical description of a steam boiler.
//!
//! A [`PhysicalCharacteristics`] snapshot is built once, validated, and then
//! shared read-only by the controller and the simulated hardware. All
//! volumes are litres and all flows litres per second.

use crate::error::{SbError, SbResult};
use crate::numeric::ensure_finite;

/// Immutable boiler description.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhysicalCharacteristics {
    /// Total boiler capacity (L).
    pub capacity: f64,
    /// Level at or below which the boiler is unsafe (L).
    pub minimal_limit_level: f64,
    /// Lower edge of the normal operating band (L).
    pub minimal_normal_level: f64,
    /// Upper edge of the normal operating band (L).
    pub maximal_normal_level: f64,
    /// Level at or above which the boiler is unsafe (L).
    pub maximal_limit_level: f64,
    /// Rated capacity of each pump (L/s). The pump count is the length.
    pub pump_capacities: Vec<f64>,
    /// Highest steam exhaust rate the boiler can produce (L/s).
    pub maximal_steam_rate: f64,
}

impl Default for PhysicalCharacteristics {
    /// Reference boiler: 500 L, normal band 150..350 L, limits 50..400 L,
    /// four 4 L/s pumps against at most 10 L/s of steam.
    fn default() -> Self {
        Self {
            capacity: 500.0,
            minimal_limit_level: 50.0,
            minimal_normal_level: 150.0,
            maximal_normal_level: 350.0,
            maximal_limit_level: 400.0,
            pump_capacities: vec![4.0; 4],
            maximal_steam_rate: 10.0,
        }
    }
}

impl PhysicalCharacteristics {
    /// Replace the pump set with `n` identical pumps.
    pub fn with_pumps(mut self, n: usize, capacity: f64) -> Self {
        self.pump_capacities = vec![capacity; n];
        self
    }

    /// Change the rated capacity of a single pump.
    pub fn with_pump_capacity(mut self, pump: usize, capacity: f64) -> SbResult<Self> {
        let len = self.pump_capacities.len();
        let slot = self.pump_capacities.get_mut(pump).ok_or(SbError::IndexOob {
            what: "pump",
            index: pump,
            len,
        })?;
        *slot = capacity;
        Ok(self)
    }

    pub fn pump_count(&self) -> usize {
        self.pump_capacities.len()
    }

    /// Rated capacity of `pump`, or zero for an unknown index.
    pub fn pump_capacity(&self, pump: usize) -> f64 {
        self.pump_capacities.get(pump).copied().unwrap_or(0.0)
    }

    /// Midpoint of the normal band, the level the pump logic aims for.
    pub fn normal_midpoint(&self) -> f64 {
        0.5 * (self.minimal_normal_level + self.maximal_normal_level)
    }

    pub fn in_normal_band(&self, level: f64) -> bool {
        level >= self.minimal_normal_level && level <= self.maximal_normal_level
    }

    /// True when `level` touches or crosses a limit level.
    pub fn breaches_limits(&self, level: f64) -> bool {
        level <= self.minimal_limit_level || level >= self.maximal_limit_level
    }

    /// Check `0 <= min limit < min normal < max normal < max limit <= capacity`,
    /// at least one pump, and finite non-negative rates.
    pub fn validate(&self) -> SbResult<()> {
        ensure_finite(self.capacity, "capacity")?;
        ensure_finite(self.minimal_limit_level, "minimal_limit_level")?;
        ensure_finite(self.minimal_normal_level, "minimal_normal_level")?;
        ensure_finite(self.maximal_normal_level, "maximal_normal_level")?;
        ensure_finite(self.maximal_limit_level, "maximal_limit_level")?;
        ensure_finite(self.maximal_steam_rate, "maximal_steam_rate")?;

        if self.minimal_limit_level < 0.0 {
            return Err(SbError::InvalidCharacteristics {
                what: "minimal limit level must be non-negative",
            });
        }
        if self.minimal_limit_level >= self.minimal_normal_level {
            return Err(SbError::InvalidCharacteristics {
                what: "minimal limit level must be below minimal normal level",
            });
        }
        if self.minimal_normal_level >= self.maximal_normal_level {
            return Err(SbError::InvalidCharacteristics {
                what: "minimal normal level must be below maximal normal level",
            });
        }
        if self.maximal_normal_level >= self.maximal_limit_level {
            return Err(SbError::InvalidCharacteristics {
                what: "maximal normal level must be below maximal limit level",
            });
        }
        if self.maximal_limit_level > self.capacity {
            return Err(SbError::InvalidCharacteristics {
                what: "maximal limit level must not exceed capacity",
            });
        }
        if self.pump_capacities.is_empty() {
            return Err(SbError::InvalidCharacteristics {
                what: "at least one pump is required",
            });
        }
        for &c in &self.pump_capacities {
            ensure_finite(c, "pump_capacity")?;
            if c <= 0.0 {
                return Err(SbError::InvalidCharacteristics {
                    what: "pump capacity must be positive",
                });
            }
        }
        if self.maximal_steam_rate < 0.0 {
            return Err(SbError::InvalidCharacteristics {
                what: "maximal steam rate must be non-negative",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_boiler_is_valid() {
        let c = PhysicalCharacteristics::default();
        c.validate().unwrap();
        assert_eq!(c.pump_count(), 4);
        assert_eq!(c.normal_midpoint(), 250.0);
    }

    #[test]
    fn levels_must_be_strictly_increasing() {
        let mut c = PhysicalCharacteristics::default();
        c.minimal_normal_level = c.maximal_normal_level;
        assert!(c.validate().is_err());

        let mut c = PhysicalCharacteristics::default();
        c.maximal_limit_level = c.capacity + 1.0;
        assert!(c.validate().is_err());

        let mut c = PhysicalCharacteristics::default();
        c.minimal_limit_level = -1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn pump_builders() {
        let c = PhysicalCharacteristics::default()
            .with_pumps(2, 4.0)
            .with_pump_capacity(1, 20.0)
            .unwrap();
        assert_eq!(c.pump_capacities, vec![4.0, 20.0]);
        assert!(
            PhysicalCharacteristics::default()
                .with_pump_capacity(9, 1.0)
                .is_err()
        );
        assert!(
            PhysicalCharacteristics::default()
                .with_pumps(0, 4.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn limit_and_band_helpers() {
        let c = PhysicalCharacteristics::default();
        assert!(c.breaches_limits(50.0));
        assert!(c.breaches_limits(400.0));
        assert!(!c.breaches_limits(51.0));
        assert!(c.in_normal_band(150.0));
        assert!(!c.in_normal_band(350.5));
    }

    #[test]
    fn non_finite_rejected() {
        let mut c = PhysicalCharacteristics::default();
        c.maximal_steam_rate = f64::NAN;
        assert!(matches!(c.validate(), Err(SbError::NonFinite { .. })));
    }
}
