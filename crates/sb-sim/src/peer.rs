//! The hardware side of the controller's message exchange.

use sb_core::Time;
use sb_protocol::Mailbox;

use crate::error::SimResult;

/// Anything that can stand in for the boiler hardware in a `Harness`.
pub trait HardwarePeer {
    /// Advance the physical state by `dt`.
    fn advance(&mut self, dt: Time) -> SimResult<()>;

    /// Append this cycle's readings and signals to `outgoing`.
    fn transmit(&mut self, outgoing: &mut Mailbox) -> SimResult<()>;

    /// Act on the controller's answer.
    fn receive(&mut self, incoming: &Mailbox);

    /// True water level, for checks that look past the sensors.
    fn water_level(&self) -> f64;
}
