//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while simulating the hardware or driving a scenario.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Timeout after {after_s}s waiting for {what}")]
    Timeout { what: String, after_s: f64 },

    #[error("Unexpected event after {at_s}s: {mailbox}")]
    UnexpectedEvent { at_s: f64, mailbox: String },

    #[error("Invalid scenario: {message}")]
    Scenario { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<sb_core::SbError> for SimError {
    fn from(e: sb_core::SbError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<sb_protocol::ProtocolError> for SimError {
    fn from(e: sb_protocol::ProtocolError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<sb_control::ControlError> for SimError {
    fn from(e: sb_control::ControlError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for SimError {
    fn from(e: serde_yaml::Error) -> Self {
        SimError::Scenario {
            message: e.to_string(),
        }
    }
}
