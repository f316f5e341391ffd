//! Controller tuning.
//!
//! The physical-plausibility tolerances are not dictated by the message
//! protocol; the defaults are conservative for a 5 s cycle against the
//! reference boiler and every one of them is overridable.

use crate::error::{SbError, SbResult};
use crate::numeric::ensure_finite;

/// What a missing or garbled reading means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransmissionPolicy {
    /// Classify the silent unit as failed, exactly like a bad value.
    #[default]
    Degrade,
    /// Any transmission failure stops the boiler.
    EmergencyStop,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Time between two controller cycles (s).
    pub cycle_period_s: f64,
    /// Slack on the level/steam range checks (L, L/s).
    pub range_tolerance: f64,
    /// Slack on the predicted level interval (L).
    pub level_margin: f64,
    /// Slack on steam bounds used for prediction (L/s).
    pub steam_margin: f64,
    /// Consecutive pump/pump-controller discrepancies before a failure.
    pub mismatch_cycles: u32,
    /// Consecutive cycles carrying STOP before an emergency stop.
    pub stop_cycles: u32,
    pub transmission_policy: TransmissionPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cycle_period_s: 5.0,
            range_tolerance: 0.5,
            level_margin: 10.0,
            steam_margin: 0.5,
            mismatch_cycles: 2,
            stop_cycles: 3,
            transmission_policy: TransmissionPolicy::Degrade,
        }
    }
}

impl ControllerConfig {
    pub fn with_transmission_policy(mut self, policy: TransmissionPolicy) -> Self {
        self.transmission_policy = policy;
        self
    }

    pub fn validate(&self) -> SbResult<()> {
        ensure_finite(self.cycle_period_s, "cycle_period_s")?;
        ensure_finite(self.range_tolerance, "range_tolerance")?;
        ensure_finite(self.level_margin, "level_margin")?;
        ensure_finite(self.steam_margin, "steam_margin")?;
        if self.cycle_period_s <= 0.0 {
            return Err(SbError::InvalidArg {
                what: "cycle_period_s must be positive",
            });
        }
        if self.range_tolerance < 0.0 || self.level_margin < 0.0 || self.steam_margin < 0.0 {
            return Err(SbError::InvalidArg {
                what: "tolerances must be non-negative",
            });
        }
        if self.mismatch_cycles == 0 {
            return Err(SbError::InvalidArg {
                what: "mismatch_cycles must be at least 1",
            });
        }
        if self.stop_cycles == 0 {
            return Err(SbError::InvalidArg {
                what: "stop_cycles must be at least 1",
            });
        }
        Ok(())
    }
}
