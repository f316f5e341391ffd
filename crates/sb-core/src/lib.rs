//! sb-core: shared foundation for the steam boiler controller.
//!
//! Contains:
//! - units (uom volume/time types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - characteristics (immutable physical description of a boiler)
//! - config (controller tuning: tolerances, cycle period, policies)
//! - error (shared error types)

pub mod characteristics;
pub mod config;
pub mod error;
pub mod numeric;
pub mod units;

pub use characteristics::PhysicalCharacteristics;
pub use config::{ControllerConfig, TransmissionPolicy};
pub use error::{SbError, SbResult};
pub use numeric::*;
pub use units::*;
