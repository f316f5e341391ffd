//! Water volume dynamics of the boiler vessel.

use serde::{Deserialize, Serialize};

use sb_core::{PhysicalCharacteristics, Volume, liters};

use crate::dynamics::{ForwardEuler, Integrator, TransientModel};
use crate::error::{SimError, SimResult};

/// Seconds for steam production to ramp from zero to its maximum.
pub const STEAM_RAMP_S: f64 = 60.0;
/// Flow through the evacuation valve when it is open.
pub const VALVE_RATE_LPS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoilerFault {
    #[default]
    Ideal,
    /// The valve drains at `rate` L/s whatever it is told.
    ValveStuckOpen { rate: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoilerState {
    /// Water volume in litres.
    pub water_l: f64,
}

/// The vessel: pump inflow in, steam and valve evacuation out.
///
/// Inputs are held constant over a step. The volume is kept within
/// `[0, capacity]`; anything beyond spills.
#[derive(Debug, Clone)]
pub struct Boiler {
    capacity: f64,
    maximal_steam_rate: f64,
    state: BoilerState,
    inflow: f64,
    valve_open: bool,
    running_since: Option<f64>,
    fault: BoilerFault,
}

impl Boiler {
    pub fn new(chars: &PhysicalCharacteristics) -> Self {
        Self {
            capacity: chars.capacity,
            maximal_steam_rate: chars.maximal_steam_rate,
            state: BoilerState { water_l: 0.0 },
            inflow: 0.0,
            valve_open: false,
            running_since: None,
            fault: BoilerFault::Ideal,
        }
    }

    pub fn water(&self) -> Volume {
        liters(self.state.water_l)
    }

    pub fn water_level(&self) -> f64 {
        self.state.water_l
    }

    /// Add `v` litres directly, e.g. to start from a pre-filled vessel.
    pub fn pump_in_water(&mut self, v: f64) -> SimResult<()> {
        if !v.is_finite() {
            return Err(SimError::InvalidArg {
                what: "water volume must be finite",
            });
        }
        self.state.water_l = (self.state.water_l + v).clamp(0.0, self.capacity);
        Ok(())
    }

    /// Pump inflow in L/s, held until changed.
    pub fn set_inflow(&mut self, rate: f64) {
        self.inflow = rate.max(0.0);
    }

    pub fn set_valve(&mut self, open: bool) {
        self.valve_open = open;
    }

    pub fn valve_open(&self) -> bool {
        self.valve_open
    }

    pub fn set_fault(&mut self, fault: BoilerFault) {
        self.fault = fault;
    }

    pub fn fault(&self) -> BoilerFault {
        self.fault
    }

    /// Start producing steam at time `t`. Later calls are ignored.
    pub fn start(&mut self, t: f64) {
        if self.running_since.is_none() {
            self.running_since = Some(t);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Steam leaving the boiler at time `t`, in L/s of water.
    pub fn steam_rate(&self, t: f64) -> f64 {
        match self.running_since {
            Some(t0) => (self.maximal_steam_rate * (t - t0) / STEAM_RAMP_S)
                .clamp(0.0, self.maximal_steam_rate),
            None => 0.0,
        }
    }

    /// Water leaving through the valve, L/s.
    pub fn evacuation_rate(&self) -> f64 {
        match self.fault {
            BoilerFault::ValveStuckOpen { rate } => rate,
            BoilerFault::Ideal if self.valve_open => VALVE_RATE_LPS,
            BoilerFault::Ideal => 0.0,
        }
    }

    /// Advance the water volume from `t` to `t + dt`.
    pub fn step(&mut self, t: f64, dt: f64) -> SimResult<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "time step must be positive",
            });
        }
        let x = self.state;
        let next = ForwardEuler.step(self, t, &x, dt)?;
        self.state.water_l = next.water_l.clamp(0.0, self.capacity);
        Ok(())
    }
}

impl TransientModel for Boiler {
    type State = BoilerState;

    fn initial_state(&self) -> BoilerState {
        self.state
    }

    fn rhs(&mut self, t: f64, x: &BoilerState) -> SimResult<BoilerState> {
        let outflow = self.steam_rate(t) + self.evacuation_rate();
        let dv = self.inflow - outflow;
        if !dv.is_finite() || !x.water_l.is_finite() {
            return Err(SimError::NonPhysical {
                what: "non-finite boiler flow",
            });
        }
        Ok(BoilerState { water_l: dv })
    }

    fn add(&self, a: &BoilerState, b: &BoilerState) -> BoilerState {
        BoilerState {
            water_l: a.water_l + b.water_l,
        }
    }

    fn scale(&self, a: &BoilerState, scale: f64) -> BoilerState {
        BoilerState {
            water_l: a.water_l * scale,
        }
    }
}
