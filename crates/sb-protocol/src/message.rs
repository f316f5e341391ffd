//! Message, mode and unit definitions.

use serde::{Deserialize, Serialize};

/// Operating mode announced by the controller every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Initialisation,
    Normal,
    Degraded,
    Rescue,
    EmergencyStop,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Initialisation,
        Mode::Normal,
        Mode::Degraded,
        Mode::Rescue,
        Mode::EmergencyStop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Initialisation => "initialisation",
            Mode::Normal => "normal",
            Mode::Degraded => "degraded",
            Mode::Rescue => "rescue",
            Mode::EmergencyStop => "emergency_stop",
        }
    }

    /// Modes in which the boiler is producing steam under control.
    pub fn is_operational(self) -> bool {
        matches!(self, Mode::Normal | Mode::Degraded | Mode::Rescue)
    }
}

/// A physical unit that can fail and be repaired.
///
/// Pumps and pump controllers are numbered from zero.
///
/// Serialized as its text form, e.g. `"level_sensor"` or `"pump(2)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    LevelSensor,
    SteamSensor,
    Pump(usize),
    PumpController(usize),
}

impl Unit {
    /// Detection message the controller emits when it classifies this unit as failed.
    pub fn detection_message(self) -> Message {
        match self {
            Unit::LevelSensor => Message::LevelFailureDetection,
            Unit::SteamSensor => Message::SteamFailureDetection,
            Unit::Pump(n) => Message::PumpFailureDetection(n),
            Unit::PumpController(n) => Message::PumpControlFailureDetection(n),
        }
    }

    /// Acknowledgement the units send back for a detection.
    pub fn failure_ack_message(self) -> Message {
        match self {
            Unit::LevelSensor => Message::LevelFailureAcknowledgement,
            Unit::SteamSensor => Message::SteamFailureAcknowledgement,
            Unit::Pump(n) => Message::PumpFailureAcknowledgement(n),
            Unit::PumpController(n) => Message::PumpControlFailureAcknowledgement(n),
        }
    }

    /// Signal the units send once the unit has been repaired.
    pub fn repaired_message(self) -> Message {
        match self {
            Unit::LevelSensor => Message::LevelRepaired,
            Unit::SteamSensor => Message::SteamRepaired,
            Unit::Pump(n) => Message::PumpRepaired(n),
            Unit::PumpController(n) => Message::PumpControlRepaired(n),
        }
    }

    /// Controller answer to a repaired signal.
    pub fn repaired_ack_message(self) -> Message {
        match self {
            Unit::LevelSensor => Message::LevelRepairedAcknowledgement,
            Unit::SteamSensor => Message::SteamRepairedAcknowledgement,
            Unit::Pump(n) => Message::PumpRepairedAcknowledgement(n),
            Unit::PumpController(n) => Message::PumpControlRepairedAcknowledgement(n),
        }
    }

    /// Pump index for pump-related units.
    pub fn pump_index(self) -> Option<usize> {
        match self {
            Unit::Pump(n) | Unit::PumpController(n) => Some(n),
            Unit::LevelSensor | Unit::SteamSensor => None,
        }
    }
}

/// One protocol message. Each variant carries exactly the parameter its
/// kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Message {
    // controller -> units
    Mode(Mode),
    ProgramReady,
    Valve(bool),
    OpenPump(usize),
    ClosePump(usize),
    LevelFailureDetection,
    SteamFailureDetection,
    PumpFailureDetection(usize),
    PumpControlFailureDetection(usize),
    LevelRepairedAcknowledgement,
    SteamRepairedAcknowledgement,
    PumpRepairedAcknowledgement(usize),
    PumpControlRepairedAcknowledgement(usize),

    // units -> controller
    Level(f64),
    Steam(f64),
    PumpState(usize, bool),
    PumpControlState(usize, bool),
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    Stop,
    LevelRepaired,
    SteamRepaired,
    PumpRepaired(usize),
    PumpControlRepaired(usize),
    LevelFailureAcknowledgement,
    SteamFailureAcknowledgement,
    PumpFailureAcknowledgement(usize),
    PumpControlFailureAcknowledgement(usize),
}

/// Shape of the parameters carried by a message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    None,
    Mode,
    Bool,
    Pump,
    Real,
    PumpBool,
}

impl Parameter {
    pub fn arity(self) -> usize {
        match self {
            Parameter::None => 0,
            Parameter::PumpBool => 2,
            _ => 1,
        }
    }
}

/// Parameter-free tag of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Mode,
    ProgramReady,
    Valve,
    OpenPump,
    ClosePump,
    LevelFailureDetection,
    SteamFailureDetection,
    PumpFailureDetection,
    PumpControlFailureDetection,
    LevelRepairedAcknowledgement,
    SteamRepairedAcknowledgement,
    PumpRepairedAcknowledgement,
    PumpControlRepairedAcknowledgement,
    Level,
    Steam,
    PumpState,
    PumpControlState,
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    Stop,
    LevelRepaired,
    SteamRepaired,
    PumpRepaired,
    PumpControlRepaired,
    LevelFailureAcknowledgement,
    SteamFailureAcknowledgement,
    PumpFailureAcknowledgement,
    PumpControlFailureAcknowledgement,
}

impl MessageKind {
    pub const ALL: [MessageKind; 28] = [
        MessageKind::Mode,
        MessageKind::ProgramReady,
        MessageKind::Valve,
        MessageKind::OpenPump,
        MessageKind::ClosePump,
        MessageKind::LevelFailureDetection,
        MessageKind::SteamFailureDetection,
        MessageKind::PumpFailureDetection,
        MessageKind::PumpControlFailureDetection,
        MessageKind::LevelRepairedAcknowledgement,
        MessageKind::SteamRepairedAcknowledgement,
        MessageKind::PumpRepairedAcknowledgement,
        MessageKind::PumpControlRepairedAcknowledgement,
        MessageKind::Level,
        MessageKind::Steam,
        MessageKind::PumpState,
        MessageKind::PumpControlState,
        MessageKind::SteamBoilerWaiting,
        MessageKind::PhysicalUnitsReady,
        MessageKind::Stop,
        MessageKind::LevelRepaired,
        MessageKind::SteamRepaired,
        MessageKind::PumpRepaired,
        MessageKind::PumpControlRepaired,
        MessageKind::LevelFailureAcknowledgement,
        MessageKind::SteamFailureAcknowledgement,
        MessageKind::PumpFailureAcknowledgement,
        MessageKind::PumpControlFailureAcknowledgement,
    ];

    /// Wire name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Mode => "MODE",
            MessageKind::ProgramReady => "PROGRAM_READY",
            MessageKind::Valve => "VALVE",
            MessageKind::OpenPump => "OPEN_PUMP",
            MessageKind::ClosePump => "CLOSE_PUMP",
            MessageKind::LevelFailureDetection => "LEVEL_FAILURE_DETECTION",
            MessageKind::SteamFailureDetection => "STEAM_FAILURE_DETECTION",
            MessageKind::PumpFailureDetection => "PUMP_FAILURE_DETECTION",
            MessageKind::PumpControlFailureDetection => "PUMP_CONTROL_FAILURE_DETECTION",
            MessageKind::LevelRepairedAcknowledgement => "LEVEL_REPAIRED_ACKNOWLEDGEMENT",
            MessageKind::SteamRepairedAcknowledgement => "STEAM_REPAIRED_ACKNOWLEDGEMENT",
            MessageKind::PumpRepairedAcknowledgement => "PUMP_REPAIRED_ACKNOWLEDGEMENT",
            MessageKind::PumpControlRepairedAcknowledgement => {
                "PUMP_CONTROL_REPAIRED_ACKNOWLEDGEMENT"
            }
            MessageKind::Level => "LEVEL",
            MessageKind::Steam => "STEAM",
            MessageKind::PumpState => "PUMP_STATE",
            MessageKind::PumpControlState => "PUMP_CONTROL_STATE",
            MessageKind::SteamBoilerWaiting => "STEAM_BOILER_WAITING",
            MessageKind::PhysicalUnitsReady => "PHYSICAL_UNITS_READY",
            MessageKind::Stop => "STOP",
            MessageKind::LevelRepaired => "LEVEL_REPAIRED",
            MessageKind::SteamRepaired => "STEAM_REPAIRED",
            MessageKind::PumpRepaired => "PUMP_REPAIRED",
            MessageKind::PumpControlRepaired => "PUMP_CONTROL_REPAIRED",
            MessageKind::LevelFailureAcknowledgement => "LEVEL_FAILURE_ACKNOWLEDGEMENT",
            MessageKind::SteamFailureAcknowledgement => "STEAM_FAILURE_ACKNOWLEDGEMENT",
            MessageKind::PumpFailureAcknowledgement => "PUMP_FAILURE_ACKNOWLEDGEMENT",
            MessageKind::PumpControlFailureAcknowledgement => {
                "PUMP_CONTROL_FAILURE_ACKNOWLEDGEMENT"
            }
        }
    }

    /// Look a kind up by wire name. Accepts the historical
    /// `STEAM_OUTCOME_FAILURE_ACKNOWLEDGEMENT` spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "STEAM_OUTCOME_FAILURE_ACKNOWLEDGEMENT" {
            return Some(MessageKind::SteamFailureAcknowledgement);
        }
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn parameter(self) -> Parameter {
        use MessageKind as K;
        match self {
            K::Mode => Parameter::Mode,
            K::Valve => Parameter::Bool,
            K::Level | K::Steam => Parameter::Real,
            K::PumpState | K::PumpControlState => Parameter::PumpBool,
            K::OpenPump
            | K::ClosePump
            | K::PumpFailureDetection
            | K::PumpControlFailureDetection
            | K::PumpRepairedAcknowledgement
            | K::PumpControlRepairedAcknowledgement
            | K::PumpRepaired
            | K::PumpControlRepaired
            | K::PumpFailureAcknowledgement
            | K::PumpControlFailureAcknowledgement => Parameter::Pump,
            K::ProgramReady
            | K::LevelFailureDetection
            | K::SteamFailureDetection
            | K::LevelRepairedAcknowledgement
            | K::SteamRepairedAcknowledgement
            | K::SteamBoilerWaiting
            | K::PhysicalUnitsReady
            | K::Stop
            | K::LevelRepaired
            | K::SteamRepaired
            | K::LevelFailureAcknowledgement
            | K::SteamFailureAcknowledgement => Parameter::None,
        }
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        use MessageKind as K;
        match self {
            Message::Mode(_) => K::Mode,
            Message::ProgramReady => K::ProgramReady,
            Message::Valve(_) => K::Valve,
            Message::OpenPump(_) => K::OpenPump,
            Message::ClosePump(_) => K::ClosePump,
            Message::LevelFailureDetection => K::LevelFailureDetection,
            Message::SteamFailureDetection => K::SteamFailureDetection,
            Message::PumpFailureDetection(_) => K::PumpFailureDetection,
            Message::PumpControlFailureDetection(_) => K::PumpControlFailureDetection,
            Message::LevelRepairedAcknowledgement => K::LevelRepairedAcknowledgement,
            Message::SteamRepairedAcknowledgement => K::SteamRepairedAcknowledgement,
            Message::PumpRepairedAcknowledgement(_) => K::PumpRepairedAcknowledgement,
            Message::PumpControlRepairedAcknowledgement(_) => {
                K::PumpControlRepairedAcknowledgement
            }
            Message::Level(_) => K::Level,
            Message::Steam(_) => K::Steam,
            Message::PumpState(..) => K::PumpState,
            Message::PumpControlState(..) => K::PumpControlState,
            Message::SteamBoilerWaiting => K::SteamBoilerWaiting,
            Message::PhysicalUnitsReady => K::PhysicalUnitsReady,
            Message::Stop => K::Stop,
            Message::LevelRepaired => K::LevelRepaired,
            Message::SteamRepaired => K::SteamRepaired,
            Message::PumpRepaired(_) => K::PumpRepaired,
            Message::PumpControlRepaired(_) => K::PumpControlRepaired,
            Message::LevelFailureAcknowledgement => K::LevelFailureAcknowledgement,
            Message::SteamFailureAcknowledgement => K::SteamFailureAcknowledgement,
            Message::PumpFailureAcknowledgement(_) => K::PumpFailureAcknowledgement,
            Message::PumpControlFailureAcknowledgement(_) => {
                K::PumpControlFailureAcknowledgement
            }
        }
    }

    /// Unit a failure detection refers to, if this is a detection.
    pub fn detected_unit(&self) -> Option<Unit> {
        match *self {
            Message::LevelFailureDetection => Some(Unit::LevelSensor),
            Message::SteamFailureDetection => Some(Unit::SteamSensor),
            Message::PumpFailureDetection(n) => Some(Unit::Pump(n)),
            Message::PumpControlFailureDetection(n) => Some(Unit::PumpController(n)),
            _ => None,
        }
    }

    /// Unit a repaired signal refers to.
    pub fn repaired_unit(&self) -> Option<Unit> {
        match *self {
            Message::LevelRepaired => Some(Unit::LevelSensor),
            Message::SteamRepaired => Some(Unit::SteamSensor),
            Message::PumpRepaired(n) => Some(Unit::Pump(n)),
            Message::PumpControlRepaired(n) => Some(Unit::PumpController(n)),
            _ => None,
        }
    }

    /// Unit a failure acknowledgement refers to.
    pub fn acknowledged_unit(&self) -> Option<Unit> {
        match *self {
            Message::LevelFailureAcknowledgement => Some(Unit::LevelSensor),
            Message::SteamFailureAcknowledgement => Some(Unit::SteamSensor),
            Message::PumpFailureAcknowledgement(n) => Some(Unit::Pump(n)),
            Message::PumpControlFailureAcknowledgement(n) => Some(Unit::PumpController(n)),
            _ => None,
        }
    }

    /// Pump number carried by the message, if any.
    pub fn pump(&self) -> Option<usize> {
        match *self {
            Message::OpenPump(n)
            | Message::ClosePump(n)
            | Message::PumpFailureDetection(n)
            | Message::PumpControlFailureDetection(n)
            | Message::PumpRepairedAcknowledgement(n)
            | Message::PumpControlRepairedAcknowledgement(n)
            | Message::PumpState(n, _)
            | Message::PumpControlState(n, _)
            | Message::PumpRepaired(n)
            | Message::PumpControlRepaired(n)
            | Message::PumpFailureAcknowledgement(n)
            | Message::PumpControlFailureAcknowledgement(n) => Some(n),
            _ => None,
        }
    }
}
