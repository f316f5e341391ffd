//! Failure detection.
//!
//! Each cycle every trusted unit goes through independent checks:
//!
//! - transmission: the expected reading is missing or conflicting
//! - range: level outside `[0, capacity]`, steam outside `[0, max steam]`
//! - idle steam: steam reported before the boiler was released
//! - pump discrepancy: pump controller or pump disagrees with the command
//!   in effect for `mismatch_cycles` consecutive cycles
//! - plausibility: the level left the envelope of levels the pumps and the
//!   steam exhaust can physically explain
//!
//! The plausibility envelope is carried from cycle to cycle: it grows by the
//! flow bounds of each interval and is narrowed to `level_margin` around
//! every reading that passes. A reading can therefore never re-anchor it, so
//! a sensor frozen at an in-range value fails once the smallest possible
//! drift since the freeze exceeds the margin.
//!
//! A unit already classified as failed is not re-examined until it is
//! repaired, so each failure is reported exactly once.

use sb_core::{ControllerConfig, PhysicalCharacteristics, within};
use sb_protocol::Unit;

use crate::input::{CycleInput, Telemetry};
use crate::status::StatusBoard;

/// Controller-side facts the detector needs besides the readings.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// Pump commands in effect since the previous cycle.
    pub commanded: &'a [bool],
    /// Whether the evacuation valve was commanded open since the previous cycle.
    pub valve_open: bool,
    /// Trusted steam reading of the previous cycle.
    pub previous_steam: Option<f64>,
    /// Seconds since the previous cycle.
    pub elapsed: f64,
    /// The boiler has been released (PROGRAM_READY sent), so steam is possible.
    pub producing: bool,
}

/// Outcome of one cycle of detection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assessment {
    /// Level reading, if the sensor is trusted and the reading passed.
    pub level: Option<f64>,
    /// Steam reading, if the sensor is trusted and the reading passed.
    pub steam: Option<f64>,
    /// Physical pump states as reported this cycle, trusted or not.
    pub pump_reports: Vec<Option<bool>>,
    /// Units newly classified as failed this cycle, in detection order.
    pub detected: Vec<Unit>,
    /// Units whose reading was missing or conflicting.
    pub transmission_faults: Vec<Unit>,
}

/// Closed interval `[lo, hi]` of water levels, or of level changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelBounds {
    pub lo: f64,
    pub hi: f64,
}

impl LevelBounds {
    pub fn around(v: f64, margin: f64) -> Self {
        Self {
            lo: v - margin,
            hi: v + margin,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo && v <= self.hi
    }

    /// Shift by a change interval, then keep within `[0, capacity]`.
    pub fn advanced(&self, change: LevelBounds, capacity: f64) -> Self {
        Self {
            lo: (self.lo + change.lo).clamp(0.0, capacity),
            hi: (self.hi + change.hi).clamp(0.0, capacity),
        }
    }

    /// Overlap with `other`; callers make sure the two intersect.
    pub fn intersect(&self, other: LevelBounds) -> Self {
        let lo = self.lo.max(other.lo);
        Self {
            lo,
            hi: self.hi.min(other.hi).max(lo),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailureDetector {
    chars: PhysicalCharacteristics,
    config: ControllerConfig,
    pump_strikes: Vec<u32>,
    controller_strikes: Vec<u32>,
    envelope: Option<LevelBounds>,
}

impl FailureDetector {
    pub fn new(chars: &PhysicalCharacteristics, config: &ControllerConfig) -> Self {
        let n = chars.pump_count();
        Self {
            chars: chars.clone(),
            config: config.clone(),
            pump_strikes: vec![0; n],
            controller_strikes: vec![0; n],
            envelope: None,
        }
    }

    /// Forget accumulated discrepancies of a repaired unit.
    pub fn reset_unit(&mut self, unit: Unit) {
        match unit {
            Unit::Pump(n) => {
                if let Some(s) = self.pump_strikes.get_mut(n) {
                    *s = 0;
                }
            }
            Unit::PumpController(n) => {
                if let Some(s) = self.controller_strikes.get_mut(n) {
                    *s = 0;
                }
            }
            Unit::LevelSensor | Unit::SteamSensor => {}
        }
    }

    /// Levels the boiler can be at according to everything seen so far.
    /// `None` until a trusted level reading has been accepted.
    pub fn envelope(&self) -> Option<LevelBounds> {
        self.envelope
    }

    pub fn strikes(&self, unit: Unit) -> u32 {
        match unit {
            Unit::Pump(n) => self.pump_strikes.get(n).copied().unwrap_or(0),
            Unit::PumpController(n) => self.controller_strikes.get(n).copied().unwrap_or(0),
            Unit::LevelSensor | Unit::SteamSensor => 0,
        }
    }

    pub fn assess(
        &mut self,
        board: &mut StatusBoard,
        input: &CycleInput,
        obs: &Observation<'_>,
    ) -> Assessment {
        let pumps = self.chars.pump_count();
        let mut out = Assessment {
            pump_reports: (0..pumps).map(|i| input.pump_state(i).value()).collect(),
            ..Assessment::default()
        };

        self.check_transmissions(board, input, &mut out);
        let steam = self.check_steam(board, input, obs, &mut out);
        out.steam = steam;
        for i in 0..pumps {
            self.check_pump(board, input, obs, i, &mut out);
        }
        let level = self.check_level(board, input, obs, steam, &mut out);
        out.level = level;

        out
    }

    fn fail(&self, board: &mut StatusBoard, unit: Unit, reason: &'static str, out: &mut Assessment) {
        if board.mark_failed(unit) {
            tracing::warn!(
                target: "steamboiler.control",
                unit = ?unit,
                reason,
                "failure detected"
            );
            out.detected.push(unit);
        }
    }

    fn check_transmissions(&self, board: &mut StatusBoard, input: &CycleInput, out: &mut Assessment) {
        let mut faults = Vec::new();
        if input.level.is_transmission_fault() {
            faults.push(Unit::LevelSensor);
        }
        if input.steam.is_transmission_fault() {
            faults.push(Unit::SteamSensor);
        }
        for i in 0..self.chars.pump_count() {
            if input.pump_state(i).is_transmission_fault() {
                faults.push(Unit::Pump(i));
            }
            if input.controller_state(i).is_transmission_fault() {
                faults.push(Unit::PumpController(i));
            }
        }
        for &unit in &faults {
            self.fail(board, unit, "transmission", out);
        }
        out.transmission_faults = faults;
    }

    fn check_steam(
        &self,
        board: &mut StatusBoard,
        input: &CycleInput,
        obs: &Observation<'_>,
        out: &mut Assessment,
    ) -> Option<f64> {
        if !board.is_trusted(Unit::SteamSensor) {
            return None;
        }
        let v = input.steam.value()?;
        let tol = self.config.range_tolerance;
        if !within(v, 0.0, self.chars.maximal_steam_rate, tol) {
            self.fail(board, Unit::SteamSensor, "steam out of range", out);
            return None;
        }
        if !obs.producing && v > tol {
            self.fail(board, Unit::SteamSensor, "steam before release", out);
            return None;
        }
        Some(v.clamp(0.0, self.chars.maximal_steam_rate))
    }

    fn check_pump(
        &mut self,
        board: &mut StatusBoard,
        input: &CycleInput,
        obs: &Observation<'_>,
        i: usize,
        out: &mut Assessment,
    ) {
        let commanded = obs.commanded.get(i).copied().unwrap_or(false);
        let limit = self.config.mismatch_cycles;

        if board.is_trusted(Unit::PumpController(i)) {
            if let Telemetry::Received(reported) = input.controller_state(i) {
                if reported == commanded {
                    self.controller_strikes[i] = 0;
                } else {
                    self.controller_strikes[i] += 1;
                    if self.controller_strikes[i] >= limit {
                        self.controller_strikes[i] = 0;
                        self.fail(board, Unit::PumpController(i), "controller disobeys command", out);
                    }
                }
            }
        }

        // The pump can only be blamed when its controller is known to drive
        // it as commanded.
        let controller_agrees = board.is_trusted(Unit::PumpController(i))
            && input.controller_state(i) == Telemetry::Received(commanded);
        if !board.is_trusted(Unit::Pump(i)) || !controller_agrees {
            return;
        }
        if let Telemetry::Received(reported) = input.pump_state(i) {
            if reported == commanded {
                self.pump_strikes[i] = 0;
            } else {
                self.pump_strikes[i] += 1;
                if self.pump_strikes[i] >= limit {
                    self.pump_strikes[i] = 0;
                    self.fail(board, Unit::Pump(i), "pump disobeys controller", out);
                }
            }
        }
    }

    fn check_level(
        &mut self,
        board: &mut StatusBoard,
        input: &CycleInput,
        obs: &Observation<'_>,
        steam_now: Option<f64>,
        out: &mut Assessment,
    ) -> Option<f64> {
        if !board.is_trusted(Unit::LevelSensor) {
            self.envelope = None;
            return None;
        }
        let reachable = self
            .envelope
            .take()
            .map(|env| env.advanced(self.change_bounds(board, input, obs, steam_now), self.chars.capacity));
        let v = input.level.value()?;
        if !within(v, 0.0, self.chars.capacity, self.config.range_tolerance) {
            self.fail(board, Unit::LevelSensor, "level out of range", out);
            return None;
        }
        let around = LevelBounds::around(v, self.config.level_margin);
        match reachable {
            Some(bounds) if !bounds.contains(v) => {
                tracing::debug!(
                    target: "steamboiler.control",
                    level = v,
                    lo = bounds.lo,
                    hi = bounds.hi,
                    "level outside reachable envelope"
                );
                self.fail(board, Unit::LevelSensor, "level physically implausible", out);
                return None;
            }
            Some(bounds) => self.envelope = Some(bounds.intersect(around)),
            None => self.envelope = Some(around),
        }
        Some(v.clamp(0.0, self.chars.capacity))
    }

    /// Bounds on the level change over `obs.elapsed` seconds.
    ///
    /// A pump contributes exactly its rated flow when the whole chain agrees
    /// with the command, otherwise anything between nothing and its rated
    /// flow. Steam lies between the two trusted readings (widened by
    /// `steam_margin`), or anywhere in `[0, max]` when one is missing. An
    /// open valve removes the lower bound.
    pub fn change_bounds(
        &self,
        board: &StatusBoard,
        input: &CycleInput,
        obs: &Observation<'_>,
        steam_now: Option<f64>,
    ) -> LevelBounds {
        let mut inflow_lo = 0.0;
        let mut inflow_hi = 0.0;
        for (i, &cap) in self.chars.pump_capacities.iter().enumerate() {
            let commanded = obs.commanded.get(i).copied().unwrap_or(false);
            let confirmed = board.pump_chain_trusted(i)
                && input.pump_state(i) == Telemetry::Received(commanded)
                && input.controller_state(i) == Telemetry::Received(commanded);
            if confirmed {
                if commanded {
                    inflow_lo += cap;
                    inflow_hi += cap;
                }
            } else {
                inflow_hi += cap;
            }
        }

        let max_steam = self.chars.maximal_steam_rate;
        let (steam_lo, steam_hi) = match (obs.previous_steam, steam_now) {
            (Some(a), Some(b)) => (
                (a.min(b) - self.config.steam_margin).max(0.0),
                (a.max(b) + self.config.steam_margin).min(max_steam),
            ),
            _ => (0.0, max_steam),
        };

        let dt = obs.elapsed;
        let lo = if obs.valve_open {
            f64::NEG_INFINITY
        } else {
            (inflow_lo - steam_hi) * dt
        };
        LevelBounds {
            lo,
            hi: (inflow_hi - steam_lo) * dt,
        }
    }
}
