//! Operating mode state machine.

use sb_core::PhysicalCharacteristics;
use sb_protocol::Mode;

/// Facts gathered during a cycle that the mode decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModeFacts {
    /// `STOP` has been received for the configured number of cycles.
    pub stop_requested: bool,
    /// A transmission failure occurred under the emergency-stop policy.
    pub transmission_abort: bool,
    pub level_failed: bool,
    pub steam_failed: bool,
    /// Some pump or pump controller is untrusted.
    pub actuator_failed: bool,
    /// Level used for control: the trusted reading or the rescue estimate.
    pub level: Option<f64>,
    /// `PROGRAM_READY` has been sent.
    pub program_ready: bool,
    /// `PHYSICAL_UNITS_READY` arrived this cycle.
    pub units_ready: bool,
}

/// Owns the current mode and applies the transition rules.
///
/// Rules are evaluated in priority order and the first match wins:
///
/// 1. emergency stop is terminal
/// 2. operator stop, or a transmission failure under the strict policy
/// 3. level and steam sensors both failed
/// 4. a sensor failed during initialisation
/// 5. outside initialisation: no usable level, or a limit level reached
/// 6. initialisation ends once the program is ready and the units answered
/// 7. level sensor failed: rescue; any other failure: degraded
/// 8. nothing outstanding: back to normal once the level is in band
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: Mode,
    chars: PhysicalCharacteristics,
}

impl ModeMachine {
    pub fn new(chars: &PhysicalCharacteristics) -> Self {
        Self {
            mode: Mode::Initialisation,
            chars: chars.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Decide and commit the mode for this cycle.
    pub fn step(&mut self, facts: &ModeFacts) -> Mode {
        let next = self.decide(facts);
        if next != self.mode {
            tracing::info!(
                target: "steamboiler.control",
                from = %self.mode,
                to = %next,
                "mode transition"
            );
            self.mode = next;
        }
        next
    }

    fn decide(&self, f: &ModeFacts) -> Mode {
        let current = self.mode;
        if current == Mode::EmergencyStop {
            return Mode::EmergencyStop;
        }
        if f.stop_requested || f.transmission_abort {
            return Mode::EmergencyStop;
        }
        if f.level_failed && f.steam_failed {
            return Mode::EmergencyStop;
        }

        if current == Mode::Initialisation {
            if f.level_failed || f.steam_failed {
                return Mode::EmergencyStop;
            }
            if f.program_ready && f.units_ready {
                return if f.actuator_failed {
                    Mode::Degraded
                } else {
                    Mode::Normal
                };
            }
            return Mode::Initialisation;
        }

        let Some(level) = f.level else {
            return Mode::EmergencyStop;
        };
        if self.chars.breaches_limits(level) {
            return Mode::EmergencyStop;
        }

        if f.level_failed {
            Mode::Rescue
        } else if f.steam_failed || f.actuator_failed {
            Mode::Degraded
        } else if current == Mode::Normal || self.chars.in_normal_band(level) {
            Mode::Normal
        } else {
            Mode::Degraded
        }
    }
}
