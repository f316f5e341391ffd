//! Decoding one cycle's mailbox into a structured input.

use std::collections::BTreeSet;

use sb_protocol::{Mailbox, Message, Unit};

/// A reading that a unit is expected to send every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Telemetry<T> {
    Received(T),
    #[default]
    Missing,
    /// More than one reading for the same unit in a single cycle.
    Garbled,
}

impl<T: Copy> Telemetry<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Telemetry::Received(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_transmission_fault(&self) -> bool {
        !matches!(self, Telemetry::Received(_))
    }

    fn record(&mut self, v: T) {
        *self = match self {
            Telemetry::Missing => Telemetry::Received(v),
            _ => Telemetry::Garbled,
        };
    }
}

/// Everything the units told the controller during one cycle.
///
/// Built with set semantics so the order of messages in the mailbox never
/// matters.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInput {
    pub level: Telemetry<f64>,
    pub steam: Telemetry<f64>,
    pub pump_states: Vec<Telemetry<bool>>,
    pub controller_states: Vec<Telemetry<bool>>,
    pub boiler_waiting: bool,
    pub units_ready: bool,
    pub stop: bool,
    pub repaired: BTreeSet<Unit>,
    pub failure_acks: BTreeSet<Unit>,
    /// Messages that could not be attributed to anything.
    pub ignored: usize,
}

impl CycleInput {
    pub fn empty(pumps: usize) -> Self {
        Self {
            level: Telemetry::Missing,
            steam: Telemetry::Missing,
            pump_states: vec![Telemetry::Missing; pumps],
            controller_states: vec![Telemetry::Missing; pumps],
            boiler_waiting: false,
            units_ready: false,
            stop: false,
            repaired: BTreeSet::new(),
            failure_acks: BTreeSet::new(),
            ignored: 0,
        }
    }

    pub fn decode(mailbox: &Mailbox, pumps: usize) -> Self {
        let mut input = Self::empty(pumps);
        for message in mailbox {
            if !input.accept(*message, pumps) {
                input.ignored += 1;
                tracing::warn!(
                    target: "steamboiler.control",
                    message = %message,
                    "ignoring unattributable message"
                );
            }
        }
        input
    }

    fn accept(&mut self, message: Message, pumps: usize) -> bool {
        if message.pump().is_some_and(|n| n >= pumps) {
            return false;
        }
        match message {
            Message::Level(v) => self.level.record(v),
            Message::Steam(v) => self.steam.record(v),
            Message::PumpState(n, b) => self.pump_states[n].record(b),
            Message::PumpControlState(n, b) => self.controller_states[n].record(b),
            Message::SteamBoilerWaiting => self.boiler_waiting = true,
            Message::PhysicalUnitsReady => self.units_ready = true,
            Message::Stop => self.stop = true,
            other => {
                if let Some(unit) = other.repaired_unit() {
                    self.repaired.insert(unit);
                } else if let Some(unit) = other.acknowledged_unit() {
                    self.failure_acks.insert(unit);
                } else {
                    return false;
                }
            }
        }
        true
    }

    pub fn pump_state(&self, pump: usize) -> Telemetry<bool> {
        self.pump_states.get(pump).copied().unwrap_or_default()
    }

    pub fn controller_state(&self, pump: usize) -> Telemetry<bool> {
        self.controller_states.get(pump).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_protocol::Mode;

    fn mailbox(messages: &[Message]) -> Mailbox {
        messages.iter().copied().collect()
    }

    #[test]
    fn readings_are_collected() {
        let input = CycleInput::decode(
            &mailbox(&[
                Message::Level(200.0),
                Message::Steam(3.0),
                Message::PumpState(0, true),
                Message::PumpControlState(0, true),
                Message::PumpRepaired(1),
                Message::SteamFailureAcknowledgement,
                Message::Stop,
            ]),
            2,
        );
        assert_eq!(input.level, Telemetry::Received(200.0));
        assert_eq!(input.steam.value(), Some(3.0));
        assert_eq!(input.pump_state(0), Telemetry::Received(true));
        assert_eq!(input.pump_state(1), Telemetry::Missing);
        assert!(input.repaired.contains(&Unit::Pump(1)));
        assert!(input.failure_acks.contains(&Unit::SteamSensor));
        assert!(input.stop);
        assert_eq!(input.ignored, 0);
    }

    #[test]
    fn duplicates_are_garbled() {
        let input = CycleInput::decode(
            &mailbox(&[
                Message::Level(200.0),
                Message::Level(200.0),
                Message::PumpState(0, true),
                Message::PumpState(0, false),
            ]),
            1,
        );
        assert_eq!(input.level, Telemetry::Garbled);
        assert!(input.level.is_transmission_fault());
        assert_eq!(input.pump_state(0), Telemetry::Garbled);
    }

    #[test]
    fn unattributable_messages_are_counted() {
        let input = CycleInput::decode(
            &mailbox(&[
                Message::PumpState(5, true),
                Message::Mode(Mode::Normal),
                Message::OpenPump(0),
            ]),
            2,
        );
        assert_eq!(input.ignored, 3);
        assert!(input.pump_states.iter().all(|t| *t == Telemetry::Missing));
    }
}
