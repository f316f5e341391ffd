//! Error types for the message protocol.

use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Unknown message kind: {kind}")]
    UnknownKind { kind: String },

    #[error("Malformed message text: {text}")]
    Malformed { text: String },

    #[error("Message {kind} expects {expected} parameter(s), got {got}")]
    Arity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Bad parameter for {kind}: {value}")]
    BadParameter { kind: &'static str, value: String },

    #[error("Unknown unit: {text}")]
    UnknownUnit { text: String },

    #[error("Unknown mode: {name}")]
    UnknownMode { name: String },

    #[error("Mailbox full (capacity={capacity})")]
    MailboxFull { capacity: usize },
}
