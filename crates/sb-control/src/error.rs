//! Error types for controller construction.
//!
//! A running controller never fails: implausible data is classified into
//! component statuses and modes. Errors only come out of construction.

use thiserror::Error;

pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(#[from] sb_core::SbError),
}
