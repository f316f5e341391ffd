//! Sensors, pumps and pump controllers with their fault models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorModel {
    #[default]
    Ideal,
    /// Always reports `value`, whatever the true quantity.
    Stuck { value: f64 },
    /// Never transmits.
    TransmissionFailure,
}

impl SensorModel {
    /// Reading sent for the true value `truth`, `None` when silent.
    pub fn reading(&self, truth: f64) -> Option<f64> {
        match *self {
            SensorModel::Ideal => Some(truth),
            SensorModel::Stuck { value } => Some(value),
            SensorModel::TransmissionFailure => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PumpModel {
    #[default]
    Ideal,
    /// Never opens, and says so.
    StuckClosed,
    /// Open whatever it is driven to, and says so.
    SticksOpen,
    /// Works, but never reports its state.
    TransmissionFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PumpControllerModel {
    #[default]
    Ideal,
    /// Drives its pump off and reports no flow whatever it is commanded.
    StuckOff,
    /// Works, but never reports its state.
    TransmissionFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pump {
    capacity: f64,
    open: bool,
    model: PumpModel,
}

impl Pump {
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity,
            open: false,
            model: PumpModel::Ideal,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn model(&self) -> PumpModel {
        self.model
    }

    pub fn set_model(&mut self, model: PumpModel) {
        self.model = model;
        self.drive(self.open);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Apply the state requested by the pump's controller.
    pub fn drive(&mut self, on: bool) {
        self.open = match self.model {
            PumpModel::StuckClosed => false,
            PumpModel::SticksOpen => true,
            PumpModel::Ideal | PumpModel::TransmissionFailure => on,
        };
    }

    /// Water delivered, L/s.
    pub fn flow(&self) -> f64 {
        if self.open { self.capacity } else { 0.0 }
    }

    pub fn report(&self) -> Option<bool> {
        match self.model {
            PumpModel::TransmissionFailure => None,
            _ => Some(self.open),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpController {
    commanded: bool,
    model: PumpControllerModel,
}

impl PumpController {
    pub fn model(&self) -> PumpControllerModel {
        self.model
    }

    pub fn set_model(&mut self, model: PumpControllerModel) {
        self.model = model;
    }

    pub fn command(&mut self, on: bool) {
        self.commanded = on;
    }

    /// State the controller drives its pump to.
    pub fn output(&self) -> bool {
        match self.model {
            PumpControllerModel::StuckOff => false,
            PumpControllerModel::Ideal | PumpControllerModel::TransmissionFailure => {
                self.commanded
            }
        }
    }

    pub fn report(&self) -> Option<bool> {
        match self.model {
            PumpControllerModel::TransmissionFailure => None,
            _ => Some(self.output()),
        }
    }
}
