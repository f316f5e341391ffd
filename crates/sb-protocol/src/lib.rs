//! Message protocol spoken between the steam boiler controller and the
//! physical units.
//!
//! Every cycle the units post readings into one [`Mailbox`] and the
//! controller answers into another. Messages are a closed sum type
//! ([`Message`]) with a plain text wire form `KIND` or `KIND(arg,arg)`:
//!
//! ```
//! use sb_protocol::{Message, Mode};
//!
//! let m: Message = "PUMP_STATE(2,true)".parse().unwrap();
//! assert_eq!(m, Message::PumpState(2, true));
//! assert_eq!(Message::Mode(Mode::Rescue).to_string(), "MODE(rescue)");
//! ```

pub mod codec;
pub mod error;
pub mod mailbox;
pub mod message;

pub use error::{ProtocolError, ProtocolResult};
pub use mailbox::Mailbox;
pub use message::{Message, MessageKind, Mode, Parameter, Unit};
