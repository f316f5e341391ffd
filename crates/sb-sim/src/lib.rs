//! Simulated steam boiler hardware.
//!
//! Provides:
//! - boiler water dynamics integrated with a fixed-step forward Euler scheme
//! - level/steam sensors, pumps and pump controllers with fault models
//! - `PhysicalUnits`, the hardware side of the message protocol
//! - `Harness`, a driving loop pairing the units with a controller
//! - YAML scenarios with timed fault injection and repairs

pub mod boiler;
pub mod devices;
pub mod dynamics;
pub mod error;
pub mod harness;
pub mod peer;
pub mod scenario;
pub mod units;

pub use boiler::{Boiler, BoilerFault, BoilerState};
pub use devices::{Pump, PumpController, PumpControllerModel, PumpModel, SensorModel};
pub use dynamics::{ForwardEuler, Integrator, TransientModel};
pub use error::{SimError, SimResult};
pub use harness::{Exchange, Harness, HarnessOptions, SampleClock};
pub use peer::HardwarePeer;
pub use scenario::{
    Action, Detection, ModeChange, Scenario, ScenarioReport, TimedEvent, TranscriptLine, run_scenario,
};
pub use units::{PhysicalUnits, UnitsMode};
