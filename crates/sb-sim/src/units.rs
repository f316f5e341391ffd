//! Simulated physical units: boiler, sensors, pumps and the operator desk.

use serde::{Deserialize, Serialize};

use sb_core::{PhysicalCharacteristics, Time, as_seconds};
use sb_protocol::{Mailbox, Message, Mode, Unit};

use crate::boiler::{Boiler, BoilerFault};
use crate::devices::{Pump, PumpController, PumpControllerModel, PumpModel, SensorModel};
use crate::error::{SimError, SimResult};
use crate::peer::HardwarePeer;

/// Start-up handshake state of the physical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitsMode {
    /// Readings only, no start-up signal.
    #[default]
    Off,
    /// Sends `STEAM_BOILER_WAITING` until the program is ready.
    Waiting,
    /// `PROGRAM_READY` seen; answers `PHYSICAL_UNITS_READY` once.
    Ready,
    /// Producing steam.
    Running,
}

#[derive(Debug, Clone)]
pub struct PhysicalUnits {
    chars: PhysicalCharacteristics,
    boiler: Boiler,
    time: f64,
    mode: UnitsMode,
    level_sensor: SensorModel,
    steam_sensor: SensorModel,
    pumps: Vec<Pump>,
    controllers: Vec<PumpController>,
    valve_command: bool,
    stop: bool,
    pending_acks: Vec<Unit>,
    pending_repairs: Vec<Unit>,
    controller_mode: Option<Mode>,
    extremes: (f64, f64),
}

impl PhysicalUnits {
    pub fn new(chars: &PhysicalCharacteristics) -> SimResult<Self> {
        chars.validate()?;
        let boiler = Boiler::new(chars);
        let level = boiler.water_level();
        Ok(Self {
            pumps: chars.pump_capacities.iter().map(|&c| Pump::new(c)).collect(),
            controllers: vec![PumpController::default(); chars.pump_count()],
            chars: chars.clone(),
            boiler,
            time: 0.0,
            mode: UnitsMode::Off,
            level_sensor: SensorModel::Ideal,
            steam_sensor: SensorModel::Ideal,
            valve_command: false,
            stop: false,
            pending_acks: Vec::new(),
            pending_repairs: Vec::new(),
            controller_mode: None,
            extremes: (level, level),
        })
    }

    pub fn characteristics(&self) -> &PhysicalCharacteristics {
        &self.chars
    }

    /// Simulated seconds since construction.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn mode(&self) -> UnitsMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: UnitsMode) {
        self.mode = mode;
        if mode == UnitsMode::Running {
            self.boiler.start(self.time);
        }
    }

    pub fn boiler(&self) -> &Boiler {
        &self.boiler
    }

    /// Add `v` litres to the boiler.
    pub fn pump_in_water(&mut self, v: f64) -> SimResult<()> {
        self.boiler.pump_in_water(v)?;
        self.reset_level_extremes();
        Ok(())
    }

    pub fn pump(&self, index: usize) -> Option<&Pump> {
        self.pumps.get(index)
    }

    /// Last mode announced by the controller.
    pub fn controller_mode(&self) -> Option<Mode> {
        self.controller_mode
    }

    /// Lowest and highest true level since the last reset.
    pub fn level_extremes(&self) -> (f64, f64) {
        self.extremes
    }

    pub fn reset_level_extremes(&mut self) {
        let level = self.boiler.water_level();
        self.extremes = (level, level);
    }

    pub fn set_level_sensor(&mut self, model: SensorModel) {
        self.level_sensor = model;
    }

    pub fn set_steam_sensor(&mut self, model: SensorModel) {
        self.steam_sensor = model;
    }

    pub fn set_pump(&mut self, index: usize, model: PumpModel) -> SimResult<()> {
        let pump = self.pumps.get_mut(index).ok_or(SimError::InvalidArg {
            what: "pump index out of range",
        })?;
        pump.set_model(model);
        self.actuate();
        Ok(())
    }

    pub fn set_pump_controller(&mut self, index: usize, model: PumpControllerModel) -> SimResult<()> {
        let controller = self.controllers.get_mut(index).ok_or(SimError::InvalidArg {
            what: "pump controller index out of range",
        })?;
        controller.set_model(model);
        self.actuate();
        Ok(())
    }

    pub fn set_boiler_fault(&mut self, fault: BoilerFault) {
        self.boiler.set_fault(fault);
    }

    /// Hold the operator's stop button while `active`.
    pub fn request_stop(&mut self, active: bool) {
        self.stop = active;
    }

    /// Restore `unit` to ideal behaviour and signal the repair at the next
    /// transmission.
    pub fn repair(&mut self, unit: Unit) -> SimResult<()> {
        match unit {
            Unit::LevelSensor => self.level_sensor = SensorModel::Ideal,
            Unit::SteamSensor => self.steam_sensor = SensorModel::Ideal,
            Unit::Pump(n) => self.set_pump(n, PumpModel::Ideal)?,
            Unit::PumpController(n) => self.set_pump_controller(n, PumpControllerModel::Ideal)?,
        }
        tracing::info!(target: "steamboiler.sim", unit = %unit, t = self.time, "unit repaired");
        self.pending_repairs.push(unit);
        Ok(())
    }

    /// Drive each pump to its controller's output.
    fn actuate(&mut self) {
        for (pump, controller) in self.pumps.iter_mut().zip(&self.controllers) {
            pump.drive(controller.output());
        }
        let inflow: f64 = self.pumps.iter().map(Pump::flow).sum();
        self.boiler.set_inflow(inflow);
        self.boiler.set_valve(self.valve_command);
    }
}

impl HardwarePeer for PhysicalUnits {
    fn advance(&mut self, dt: Time) -> SimResult<()> {
        let dt = as_seconds(dt);
        self.actuate();
        self.boiler.step(self.time, dt)?;
        self.time += dt;
        let level = self.boiler.water_level();
        self.extremes = (self.extremes.0.min(level), self.extremes.1.max(level));
        Ok(())
    }

    fn transmit(&mut self, outgoing: &mut Mailbox) -> SimResult<()> {
        match self.mode {
            UnitsMode::Waiting => outgoing.send(Message::SteamBoilerWaiting)?,
            UnitsMode::Ready => {
                outgoing.send(Message::PhysicalUnitsReady)?;
                self.set_mode(UnitsMode::Running);
            }
            UnitsMode::Off | UnitsMode::Running => {}
        }
        if let Some(level) = self.level_sensor.reading(self.boiler.water_level()) {
            outgoing.send(Message::Level(level))?;
        }
        if let Some(steam) = self.steam_sensor.reading(self.boiler.steam_rate(self.time)) {
            outgoing.send(Message::Steam(steam))?;
        }
        for (i, pump) in self.pumps.iter().enumerate() {
            if let Some(open) = pump.report() {
                outgoing.send(Message::PumpState(i, open))?;
            }
        }
        for (i, controller) in self.controllers.iter().enumerate() {
            if let Some(flow) = controller.report() {
                outgoing.send(Message::PumpControlState(i, flow))?;
            }
        }
        for unit in self.pending_acks.drain(..) {
            outgoing.send(unit.failure_ack_message())?;
        }
        for unit in self.pending_repairs.drain(..) {
            outgoing.send(unit.repaired_message())?;
        }
        if self.stop {
            outgoing.send(Message::Stop)?;
        }
        Ok(())
    }

    fn receive(&mut self, incoming: &Mailbox) {
        for message in incoming {
            match *message {
                Message::OpenPump(n) | Message::ClosePump(n) => {
                    match self.controllers.get_mut(n) {
                        Some(c) => c.command(matches!(message, Message::OpenPump(_))),
                        None => tracing::warn!(
                            target: "steamboiler.sim",
                            message = %message,
                            "command for unknown pump"
                        ),
                    }
                }
                Message::Valve(open) => self.valve_command = open,
                Message::ProgramReady if self.mode == UnitsMode::Waiting => {
                    self.mode = UnitsMode::Ready;
                }
                Message::Mode(mode) => {
                    if mode == Mode::EmergencyStop && self.controller_mode != Some(mode) {
                        tracing::warn!(target: "steamboiler.sim", t = self.time, "emergency stop");
                    }
                    self.controller_mode = Some(mode);
                }
                _ => {
                    if let Some(unit) = message.detected_unit() {
                        self.pending_acks.push(unit);
                    }
                }
            }
        }
        self.actuate();
    }

    fn water_level(&self) -> f64 {
        self.boiler.water_level()
    }
}
