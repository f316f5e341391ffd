use thiserror::Error;

pub type SbResult<T> = Result<T, SbError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SbError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid characteristics: {what}")]
    InvalidCharacteristics { what: &'static str },
}
