//! YAML scenarios: a boiler, a controller configuration and timed events.
//!
//! ```yaml
//! name: stuck level sensor
//! initial_water_l: 250
//! duration_s: 300
//! events:
//!   - at_s: 120
//!     action: {type: level_sensor, model: {kind: stuck, value: -1}}
//!   - at_s: 200
//!     action: {type: repair, unit: level_sensor}
//! ```

use serde::{Deserialize, Serialize};

use sb_control::SteamBoilerController;
use sb_core::{ControllerConfig, PhysicalCharacteristics};
use sb_protocol::{Message, Mode, Unit};

use crate::boiler::BoilerFault;
use crate::devices::{PumpControllerModel, PumpModel, SensorModel};
use crate::error::{SimError, SimResult};
use crate::harness::{Harness, HarnessOptions, to_ms};
use crate::peer::HardwarePeer;
use crate::units::{PhysicalUnits, UnitsMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub characteristics: PhysicalCharacteristics,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub initial_water_l: f64,
    /// Start with the units signalling `STEAM_BOILER_WAITING`.
    #[serde(default = "default_true")]
    pub waiting: bool,
    pub duration_s: f64,
    #[serde(default)]
    pub harness: HarnessOptions,
    /// End the run at the first emergency stop.
    #[serde(default = "default_true")]
    pub stop_on_emergency: bool,
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_s: f64,
    pub action: Action,
}

/// Something done to the hardware during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    LevelSensor { model: SensorModel },
    SteamSensor { model: SensorModel },
    Pump { pump: usize, model: PumpModel },
    PumpController { pump: usize, model: PumpControllerModel },
    Boiler { fault: BoilerFault },
    Repair { unit: Unit },
    Stop { active: bool },
    AddWater { liters: f64 },
}

impl Action {
    pub fn apply(&self, units: &mut PhysicalUnits) -> SimResult<()> {
        match *self {
            Action::LevelSensor { model } => units.set_level_sensor(model),
            Action::SteamSensor { model } => units.set_steam_sensor(model),
            Action::Pump { pump, model } => units.set_pump(pump, model)?,
            Action::PumpController { pump, model } => units.set_pump_controller(pump, model)?,
            Action::Boiler { fault } => units.set_boiler_fault(fault),
            Action::Repair { unit } => units.repair(unit)?,
            Action::Stop { active } => units.request_stop(active),
            Action::AddWater { liters } => units.pump_in_water(liters)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeChange {
    pub at_s: f64,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub at_s: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub at_s: f64,
    pub received: Vec<String>,
    pub sent: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub simulated_s: f64,
    pub exchanges: u64,
    pub final_mode: Option<Mode>,
    pub program_ready_at_s: Option<f64>,
    pub emergency_stop_at_s: Option<f64>,
    pub mode_changes: Vec<ModeChange>,
    pub detections: Vec<Detection>,
    pub final_level: f64,
    pub min_level: f64,
    pub max_level: f64,
    /// Lowest and highest true level while the controller was operational.
    pub operational_level_range: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<TranscriptLine>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> SimResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// A small scenario exercising a fault and its repair.
    pub fn template() -> Self {
        Self {
            name: "pump failure and repair".to_string(),
            characteristics: PhysicalCharacteristics::default(),
            controller: ControllerConfig::default(),
            initial_water_l: 0.0,
            waiting: true,
            duration_s: 300.0,
            harness: HarnessOptions::default(),
            stop_on_emergency: true,
            events: vec![
                TimedEvent {
                    at_s: 120.0,
                    action: Action::Pump {
                        pump: 0,
                        model: PumpModel::StuckClosed,
                    },
                },
                TimedEvent {
                    at_s: 200.0,
                    action: Action::Repair {
                        unit: Unit::Pump(0),
                    },
                },
            ],
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        self.characteristics.validate()?;
        self.controller.validate()?;
        if !(self.duration_s.is_finite() && self.duration_s > 0.0) {
            return Err(SimError::Scenario {
                message: "duration_s must be positive".to_string(),
            });
        }
        if !(self.initial_water_l.is_finite() && self.initial_water_l >= 0.0) {
            return Err(SimError::Scenario {
                message: "initial_water_l must be non-negative".to_string(),
            });
        }
        for (i, event) in self.events.iter().enumerate() {
            if !(event.at_s.is_finite() && event.at_s >= 0.0) {
                return Err(SimError::Scenario {
                    message: format!("event {i}: at_s must be non-negative"),
                });
            }
        }
        Ok(())
    }
}

impl ScenarioReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            simulated_s: 0.0,
            exchanges: 0,
            final_mode: None,
            program_ready_at_s: None,
            emergency_stop_at_s: None,
            mode_changes: Vec::new(),
            detections: Vec::new(),
            final_level: 0.0,
            min_level: 0.0,
            max_level: 0.0,
            operational_level_range: None,
            transcript: Vec::new(),
        }
    }

    fn observe(&mut self, at_s: f64, sent: &sb_protocol::Mailbox) {
        for message in sent {
            match *message {
                Message::Mode(mode) => {
                    if self.final_mode != Some(mode) {
                        self.mode_changes.push(ModeChange { at_s, mode });
                        if mode == Mode::EmergencyStop {
                            self.emergency_stop_at_s = Some(at_s);
                        }
                    }
                    self.final_mode = Some(mode);
                }
                Message::ProgramReady if self.program_ready_at_s.is_none() => {
                    self.program_ready_at_s = Some(at_s);
                }
                _ => {
                    if let Some(unit) = message.detected_unit() {
                        self.detections.push(Detection { at_s, unit });
                    }
                }
            }
        }
    }

    fn track_level(&mut self, level: f64) {
        self.operational_level_range = Some(match self.operational_level_range {
            Some((lo, hi)) => (lo.min(level), hi.max(level)),
            None => (level, level),
        });
    }
}

/// Run `scenario` to completion.
pub fn run_scenario(scenario: &Scenario) -> SimResult<ScenarioReport> {
    scenario.validate()?;
    let mut units = PhysicalUnits::new(&scenario.characteristics)?;
    units.pump_in_water(scenario.initial_water_l)?;
    if scenario.waiting {
        units.set_mode(UnitsMode::Waiting);
    }
    let controller =
        SteamBoilerController::new(scenario.characteristics.clone(), scenario.controller.clone())?;
    let mut harness = Harness::new(controller, units, scenario.harness)?;

    let mut events: Vec<&TimedEvent> = scenario.events.iter().collect();
    events.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
    let mut events = events.into_iter().peekable();

    tracing::info!(
        target: "steamboiler.sim",
        name = %scenario.name,
        duration_s = scenario.duration_s,
        events = scenario.events.len(),
        "scenario started"
    );

    let mut report = ScenarioReport::new(&scenario.name);
    let end_ms = to_ms(scenario.duration_s)?;
    while harness.elapsed_ms() < end_ms {
        let now = harness.elapsed_ms();
        while let Some(event) = events.next_if(|e| to_ms(e.at_s).is_ok_and(|t| t <= now)) {
            tracing::debug!(
                target: "steamboiler.sim",
                t = harness.elapsed_s(),
                action = ?event.action,
                "applying event"
            );
            event.action.apply(harness.peer_mut())?;
        }
        if let Some(sent) = harness.tick()? {
            report.observe(harness.elapsed_s(), &sent);
        }
        if harness.controller().mode().is_operational() {
            report.track_level(harness.peer().water_level());
        }
        if scenario.stop_on_emergency && report.emergency_stop_at_s.is_some() {
            break;
        }
    }

    report.simulated_s = harness.elapsed_s();
    report.exchanges = harness.exchanges();
    report.final_level = harness.peer().water_level();
    (report.min_level, report.max_level) = harness.peer().level_extremes();
    report.transcript = harness
        .take_transcript()
        .into_iter()
        .map(|x| TranscriptLine {
            at_s: x.at_s,
            received: x.received.iter().map(ToString::to_string).collect(),
            sent: x.sent.iter().map(ToString::to_string).collect(),
        })
        .collect();

    tracing::info!(
        target: "steamboiler.sim",
        name = %scenario.name,
        final_mode = ?report.final_mode,
        simulated_s = report.simulated_s,
        "scenario finished"
    );
    Ok(report)
}
