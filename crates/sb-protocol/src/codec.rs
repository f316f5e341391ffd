//! Text wire form: `KIND` or `KIND(arg[,arg])`.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, MessageKind, Mode, Parameter, Unit};

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        let s = s.trim();
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownMode { name: s.to_string() })
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        MessageKind::from_name(s.trim()).ok_or_else(|| ProtocolError::UnknownKind {
            kind: s.trim().to_string(),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind().name();
        match *self {
            Message::Mode(m) => write!(f, "{name}({m})"),
            Message::Valve(b) => write!(f, "{name}({b})"),
            Message::Level(v) | Message::Steam(v) => write!(f, "{name}({v})"),
            Message::PumpState(n, b) | Message::PumpControlState(n, b) => {
                write!(f, "{name}({n},{b})")
            }
            _ => match self.pump() {
                Some(n) => write!(f, "{name}({n})"),
                None => f.write_str(name),
            },
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Unit::LevelSensor => f.write_str("level_sensor"),
            Unit::SteamSensor => f.write_str("steam_sensor"),
            Unit::Pump(n) => write!(f, "pump({n})"),
            Unit::PumpController(n) => write!(f, "pump_controller({n})"),
        }
    }
}

impl FromStr for Unit {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        let unknown = || ProtocolError::UnknownUnit {
            text: s.trim().to_string(),
        };
        let (name, args) = split(s).map_err(|_| unknown())?;
        let index = |args: &[&str]| -> ProtocolResult<usize> {
            match args {
                [n] => n.parse().map_err(|_| unknown()),
                _ => Err(unknown()),
            }
        };
        match (name.to_ascii_lowercase().as_str(), args.len()) {
            ("level_sensor", 0) => Ok(Unit::LevelSensor),
            ("steam_sensor", 0) => Ok(Unit::SteamSensor),
            ("pump", _) => Ok(Unit::Pump(index(&args[..])?)),
            ("pump_controller", _) => Ok(Unit::PumpController(index(&args[..])?)),
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = ProtocolError;

    fn try_from(s: String) -> ProtocolResult<Self> {
        s.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.to_string()
    }
}

fn parse_pump(kind: MessageKind, s: &str) -> ProtocolResult<usize> {
    s.parse().map_err(|_| ProtocolError::BadParameter {
        kind: kind.name(),
        value: s.to_string(),
    })
}

fn parse_bool(kind: MessageKind, s: &str) -> ProtocolResult<bool> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ProtocolError::BadParameter {
            kind: kind.name(),
            value: s.to_string(),
        }),
    }
}

fn parse_real(kind: MessageKind, s: &str) -> ProtocolResult<f64> {
    s.parse().map_err(|_| ProtocolError::BadParameter {
        kind: kind.name(),
        value: s.to_string(),
    })
}

/// Split `KIND(a,b)` into the kind name and its raw arguments.
fn split(text: &str) -> ProtocolResult<(&str, Vec<&str>)> {
    let text = text.trim();
    let Some(open) = text.find('(') else {
        return Ok((text, Vec::new()));
    };
    let inner = text[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| ProtocolError::Malformed {
            text: text.to_string(),
        })?;
    if inner.contains(['(', ')']) {
        return Err(ProtocolError::Malformed {
            text: text.to_string(),
        });
    }
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    Ok((text[..open].trim(), args))
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        let (name, args) = split(s)?;
        let kind: MessageKind = name.parse()?;
        let param = kind.parameter();
        if args.len() != param.arity() {
            return Err(ProtocolError::Arity {
                kind: kind.name(),
                expected: param.arity(),
                got: args.len(),
            });
        }

        use MessageKind as K;
        let msg = match param {
            Parameter::None => match kind {
                K::ProgramReady => Message::ProgramReady,
                K::LevelFailureDetection => Message::LevelFailureDetection,
                K::SteamFailureDetection => Message::SteamFailureDetection,
                K::LevelRepairedAcknowledgement => Message::LevelRepairedAcknowledgement,
                K::SteamRepairedAcknowledgement => Message::SteamRepairedAcknowledgement,
                K::SteamBoilerWaiting => Message::SteamBoilerWaiting,
                K::PhysicalUnitsReady => Message::PhysicalUnitsReady,
                K::Stop => Message::Stop,
                K::LevelRepaired => Message::LevelRepaired,
                K::SteamRepaired => Message::SteamRepaired,
                K::LevelFailureAcknowledgement => Message::LevelFailureAcknowledgement,
                _ => Message::SteamFailureAcknowledgement,
            },
            Parameter::Mode => Message::Mode(args[0].parse()?),
            Parameter::Bool => Message::Valve(parse_bool(kind, args[0])?),
            Parameter::Real => {
                let v = parse_real(kind, args[0])?;
                if kind == K::Level {
                    Message::Level(v)
                } else {
                    Message::Steam(v)
                }
            }
            Parameter::PumpBool => {
                let n = parse_pump(kind, args[0])?;
                let b = parse_bool(kind, args[1])?;
                if kind == K::PumpState {
                    Message::PumpState(n, b)
                } else {
                    Message::PumpControlState(n, b)
                }
            }
            Parameter::Pump => {
                let n = parse_pump(kind, args[0])?;
                match kind {
                    K::OpenPump => Message::OpenPump(n),
                    K::ClosePump => Message::ClosePump(n),
                    K::PumpFailureDetection => Message::PumpFailureDetection(n),
                    K::PumpControlFailureDetection => Message::PumpControlFailureDetection(n),
                    K::PumpRepairedAcknowledgement => Message::PumpRepairedAcknowledgement(n),
                    K::PumpControlRepairedAcknowledgement => {
                        Message::PumpControlRepairedAcknowledgement(n)
                    }
                    K::PumpRepaired => Message::PumpRepaired(n),
                    K::PumpControlRepaired => Message::PumpControlRepaired(n),
                    K::PumpFailureAcknowledgement => Message::PumpFailureAcknowledgement(n),
                    _ => Message::PumpControlFailureAcknowledgement(n),
                }
            }
        };
        Ok(msg)
    }
}
