//! Reactive steam boiler controller.
//!
//! Once per cycle the controller reads the units' mailbox and writes its
//! answer into another one. Inside a cycle the work is split over small,
//! separately testable pieces:
//!
//! - [`input`] turns the raw mailbox into a [`CycleInput`] (missing and
//!   conflicting readings become transmission faults, never errors)
//! - [`detector`] cross-checks readings against each other and against a
//!   bounded physical prediction, updating the [`StatusBoard`]
//! - [`estimator`] integrates a level estimate while the level sensor is
//!   untrusted
//! - [`mode`] picks the next operating mode by priority rules
//! - [`pumps`] chooses which pumps to open
//!
//! [`SteamBoilerController`] owns all cross-cycle state and wires the pieces
//! together. It is strictly sequential: one input batch in, one output batch
//! out, no clock of its own beyond the configured cycle period.

pub mod controller;
pub mod detector;
pub mod error;
pub mod estimator;
pub mod input;
pub mod mode;
pub mod pumps;
pub mod status;

pub use controller::SteamBoilerController;
pub use detector::{Assessment, FailureDetector, Observation};
pub use error::{ControlError, ControlResult};
pub use estimator::{LevelEstimator, mean_steam};
pub use input::{CycleInput, Telemetry};
pub use mode::{ModeFacts, ModeMachine};
pub use pumps::PumpPlanner;
pub use status::{ComponentStatus, StatusBoard};
