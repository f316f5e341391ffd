//! Per-cycle entry point.

use sb_core::{ControllerConfig, PhysicalCharacteristics, TransmissionPolicy};
use sb_protocol::{Mailbox, Message, Mode, Unit};

use crate::detector::{Assessment, FailureDetector, Observation};
use crate::error::ControlResult;
use crate::estimator::{LevelEstimator, delivered_flow, mean_steam};
use crate::input::CycleInput;
use crate::mode::{ModeFacts, ModeMachine};
use crate::pumps::PumpPlanner;
use crate::status::{ComponentStatus, StatusBoard};

/// The steam boiler controller.
///
/// All state that survives a cycle lives here: the mode, the unit
/// statuses, the rescue estimate and the commands currently in effect.
#[derive(Debug, Clone)]
pub struct SteamBoilerController {
    chars: PhysicalCharacteristics,
    config: ControllerConfig,
    board: StatusBoard,
    detector: FailureDetector,
    modes: ModeMachine,
    planner: PumpPlanner,
    estimator: Option<LevelEstimator>,

    commanded: Vec<bool>,
    valve_open: bool,
    previous_level: Option<f64>,
    previous_steam: Option<f64>,
    last_trusted_steam: Option<f64>,
    control_level: Option<f64>,
    program_ready_sent: bool,
    boiler_waiting_seen: bool,
    stop_count: u32,
    cycles: u64,
}

impl SteamBoilerController {
    pub fn new(chars: PhysicalCharacteristics, config: ControllerConfig) -> ControlResult<Self> {
        chars.validate()?;
        config.validate()?;
        let n = chars.pump_count();
        Ok(Self {
            board: StatusBoard::new(n),
            detector: FailureDetector::new(&chars, &config),
            modes: ModeMachine::new(&chars),
            planner: PumpPlanner::new(&chars, config.cycle_period_s),
            estimator: None,
            commanded: vec![false; n],
            valve_open: false,
            previous_level: None,
            previous_steam: None,
            last_trusted_steam: None,
            control_level: None,
            program_ready_sent: false,
            boiler_waiting_seen: false,
            stop_count: 0,
            cycles: 0,
            chars,
            config,
        })
    }

    pub fn characteristics(&self) -> &PhysicalCharacteristics {
        &self.chars
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn status(&self, unit: Unit) -> Option<ComponentStatus> {
        self.board.get(unit)
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Level the last decision was based on, measured or estimated.
    pub fn control_level(&self) -> Option<f64> {
        self.control_level
    }

    /// Current rescue estimate, present only while the level sensor is untrusted.
    pub fn estimated_level(&self) -> Option<f64> {
        self.estimator.map(|e| e.level())
    }

    pub fn commanded_pumps(&self) -> &[bool] {
        &self.commanded
    }

    pub fn valve_open(&self) -> bool {
        self.valve_open
    }

    pub fn program_ready_sent(&self) -> bool {
        self.program_ready_sent
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one control cycle: read everything from `incoming`, append the
    /// answer to `outgoing`.
    pub fn clock(&mut self, incoming: &Mailbox, outgoing: &mut Mailbox) {
        self.cycles += 1;
        let input = CycleInput::decode(incoming, self.chars.pump_count());

        if self.modes.mode() == Mode::EmergencyStop {
            self.emit_emergency_stop(outgoing, &[]);
            return;
        }

        self.board.settle();
        for &unit in &input.failure_acks {
            self.board.acknowledge(unit);
        }
        let mut repaired = Vec::new();
        for &unit in &input.repaired {
            if self.board.repair(unit) {
                self.detector.reset_unit(unit);
                tracing::info!(target: "steamboiler.control", unit = ?unit, "unit repaired");
                repaired.push(unit);
            }
        }
        self.stop_count = if input.stop { self.stop_count + 1 } else { 0 };
        self.boiler_waiting_seen |= input.boiler_waiting;

        let obs = Observation {
            commanded: &self.commanded,
            valve_open: self.valve_open,
            previous_steam: self.previous_steam,
            elapsed: self.config.cycle_period_s,
            producing: self.program_ready_sent,
        };
        let assessment = self.detector.assess(&mut self.board, &input, &obs);

        let control_level = match assessment.level {
            Some(level) => {
                self.estimator = None;
                Some(level)
            }
            None => self.estimate(&assessment),
        };

        let facts = ModeFacts {
            stop_requested: self.stop_count >= self.config.stop_cycles,
            transmission_abort: self.config.transmission_policy
                == TransmissionPolicy::EmergencyStop
                && !assessment.transmission_faults.is_empty(),
            level_failed: !self.board.is_trusted(Unit::LevelSensor),
            steam_failed: !self.board.is_trusted(Unit::SteamSensor),
            actuator_failed: self.board.any_actuator_fault(),
            level: control_level,
            program_ready: self.program_ready_sent,
            units_ready: input.units_ready,
        };
        let mode = self.modes.step(&facts);

        if mode == Mode::EmergencyStop {
            self.emit_emergency_stop(outgoing, &assessment.detected);
        } else {
            emit(outgoing, Message::Mode(mode));
            for unit in &assessment.detected {
                emit(outgoing, unit.detection_message());
            }
            for unit in &repaired {
                emit(outgoing, unit.repaired_ack_message());
            }
            let uncontrolled = self.uncontrolled_inflow(&assessment.pump_reports);
            match (mode, control_level) {
                (Mode::Initialisation, Some(level)) => {
                    self.initialise(level, assessment.steam, uncontrolled, outgoing);
                }
                (Mode::Initialisation, None) => {}
                (_, Some(level)) => self.regulate(level, assessment.steam, uncontrolled, outgoing),
                (_, None) => {}
            }
        }

        tracing::debug!(
            target: "steamboiler.control",
            cycle = self.cycles,
            mode = %mode,
            level = ?control_level,
            steam = ?assessment.steam,
            pumps = ?self.commanded,
            "cycle complete"
        );

        self.previous_level = assessment.level;
        self.previous_steam = assessment.steam;
        if assessment.steam.is_some() {
            self.last_trusted_steam = assessment.steam;
        }
        self.control_level = control_level;
    }

    /// Advance (or seed) the rescue estimate. `None` when there is nothing
    /// to seed it from.
    fn estimate(&mut self, assessment: &Assessment) -> Option<f64> {
        let mut est = match self.estimator {
            Some(est) => est,
            None => LevelEstimator::seed(self.previous_level?, &self.chars),
        };
        let open: Vec<bool> = self
            .commanded
            .iter()
            .enumerate()
            .map(|(i, &cmd)| {
                if self.board.pump_chain_trusted(i) {
                    cmd
                } else {
                    assessment.pump_reports.get(i).copied().flatten().unwrap_or(cmd)
                }
            })
            .collect();
        let inflow = delivered_flow(&self.chars.pump_capacities, &open);
        let steam = mean_steam(
            self.previous_steam,
            assessment.steam,
            self.last_trusted_steam,
            self.chars.maximal_steam_rate,
        );
        let level = est.advance(inflow, steam, self.config.cycle_period_s);
        self.estimator = Some(est);
        Some(level)
    }

    fn eligible_pumps(&self) -> Vec<bool> {
        (0..self.chars.pump_count())
            .map(|i| self.board.pump_chain_trusted(i))
            .collect()
    }

    /// Flow from pumps that are out of service but report themselves open.
    fn uncontrolled_inflow(&self, pump_reports: &[Option<bool>]) -> f64 {
        let stuck: Vec<bool> = (0..self.chars.pump_count())
            .map(|i| {
                !self.board.pump_chain_trusted(i)
                    && pump_reports.get(i).copied().flatten() == Some(true)
            })
            .collect();
        delivered_flow(&self.chars.pump_capacities, &stuck)
    }

    fn planning_steam(&self, steam_now: Option<f64>) -> f64 {
        steam_now.unwrap_or_else(|| {
            mean_steam(
                self.previous_steam,
                None,
                self.last_trusted_steam,
                self.chars.maximal_steam_rate,
            )
        })
    }

    /// Bring the boiler into the normal band before releasing it.
    fn initialise(
        &mut self,
        level: f64,
        steam_now: Option<f64>,
        uncontrolled: f64,
        outgoing: &mut Mailbox,
    ) {
        if !self.boiler_waiting_seen {
            return;
        }
        if level > self.chars.maximal_normal_level {
            self.valve_open = true;
            self.commanded = vec![false; self.chars.pump_count()];
        } else {
            self.valve_open = false;
            let eligible = self.eligible_pumps();
            let steam = steam_now.unwrap_or(0.0);
            self.commanded = self
                .planner
                .plan(level, steam, uncontrolled, &self.commanded, &eligible);
        }
        emit(outgoing, Message::Valve(self.valve_open));
        self.emit_pumps(outgoing);

        if self.chars.in_normal_band(level) {
            if !self.program_ready_sent {
                tracing::info!(target: "steamboiler.control", level, "program ready");
            }
            self.program_ready_sent = true;
            emit(outgoing, Message::ProgramReady);
        }
    }

    fn regulate(
        &mut self,
        level: f64,
        steam_now: Option<f64>,
        uncontrolled: f64,
        outgoing: &mut Mailbox,
    ) {
        self.valve_open = false;
        let eligible = self.eligible_pumps();
        let steam = self.planning_steam(steam_now);
        self.commanded = self
            .planner
            .plan(level, steam, uncontrolled, &self.commanded, &eligible);
        self.emit_pumps(outgoing);
    }

    fn emit_pumps(&self, outgoing: &mut Mailbox) {
        for (i, &open) in self.commanded.iter().enumerate() {
            let message = if open {
                Message::OpenPump(i)
            } else {
                Message::ClosePump(i)
            };
            emit(outgoing, message);
        }
    }

    fn emit_emergency_stop(&mut self, outgoing: &mut Mailbox, detected: &[Unit]) {
        emit(outgoing, Message::Mode(Mode::EmergencyStop));
        for unit in detected {
            emit(outgoing, unit.detection_message());
        }
        self.commanded.iter_mut().for_each(|c| *c = false);
        self.valve_open = false;
        self.emit_pumps(outgoing);
    }
}

fn emit(outgoing: &mut Mailbox, message: Message) {
    if let Err(err) = outgoing.send(message) {
        tracing::warn!(
            target: "steamboiler.control",
            message = %message,
            error = %err,
            "dropping outgoing message"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_protocol::MessageKind;

    fn controller() -> SteamBoilerController {
        SteamBoilerController::new(
            PhysicalCharacteristics::default(),
            ControllerConfig::default(),
        )
        .unwrap()
    }

    fn readings(level: f64, steam: f64, pumps: &[bool]) -> Mailbox {
        let mut mb = Mailbox::unbounded();
        mb.send(Message::Level(level)).unwrap();
        mb.send(Message::Steam(steam)).unwrap();
        for (i, &p) in pumps.iter().enumerate() {
            mb.send(Message::PumpState(i, p)).unwrap();
            mb.send(Message::PumpControlState(i, p)).unwrap();
        }
        mb
    }

    fn cycle(c: &mut SteamBoilerController, incoming: Mailbox) -> Mailbox {
        let mut out = Mailbox::unbounded();
        c.clock(&incoming, &mut out);
        out
    }

    #[test]
    fn invalid_characteristics_are_rejected() {
        let chars = PhysicalCharacteristics::default().with_pumps(0, 4.0);
        assert!(SteamBoilerController::new(chars, ControllerConfig::default()).is_err());
    }

    #[test]
    fn only_mode_before_boiler_waiting() {
        let mut c = controller();
        let out = cycle(&mut c, readings(0.0, 0.0, &[false; 4]));
        assert_eq!(out.as_slice(), &[Message::Mode(Mode::Initialisation)]);
    }

    #[test]
    fn fills_then_announces_program_ready() {
        let mut c = controller();
        let mut mb = readings(100.0, 0.0, &[false; 4]);
        mb.send(Message::SteamBoilerWaiting).unwrap();
        let out = cycle(&mut c, mb);
        assert!(out.contains(&Message::Valve(false)));
        assert_eq!(out.count_kind(MessageKind::OpenPump), 4);
        assert!(!out.contains(&Message::ProgramReady));

        let mut mb = readings(180.0, 0.0, &[true; 4]);
        mb.send(Message::SteamBoilerWaiting).unwrap();
        let out = cycle(&mut c, mb);
        assert!(out.contains(&Message::ProgramReady));

        let mut mb = readings(250.0, 0.0, c.commanded_pumps());
        mb.send(Message::PhysicalUnitsReady).unwrap();
        let out = cycle(&mut c, mb);
        assert_eq!(out.read(0), Some(Message::Mode(Mode::Normal)));
        assert!(!out.contains_kind(MessageKind::Valve));
        assert_eq!(c.mode(), Mode::Normal);
    }

    #[test]
    fn drains_an_overfull_boiler() {
        let mut c = controller();
        let mut mb = readings(480.0, 0.0, &[false; 4]);
        mb.send(Message::SteamBoilerWaiting).unwrap();
        let out = cycle(&mut c, mb);
        assert!(out.contains(&Message::Valve(true)));
        assert_eq!(out.count_kind(MessageKind::ClosePump), 4);
        assert!(c.valve_open());
    }

    #[test]
    fn emergency_stop_closes_every_pump_forever() {
        let mut c = controller();
        let mut mb = Mailbox::unbounded();
        for i in 0..4 {
            mb.send(Message::PumpState(i, false)).unwrap();
            mb.send(Message::PumpControlState(i, false)).unwrap();
        }
        // neither sensor transmits
        let out = cycle(&mut c, mb);
        assert_eq!(c.mode(), Mode::EmergencyStop);
        assert!(out.contains(&Message::LevelFailureDetection));
        assert!(out.contains(&Message::SteamFailureDetection));
        assert_eq!(out.count_kind(MessageKind::ClosePump), 4);

        let out = cycle(&mut c, readings(250.0, 0.0, &[false; 4]));
        assert_eq!(out.read(0), Some(Message::Mode(Mode::EmergencyStop)));
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn stop_needs_consecutive_cycles() {
        let mut c = controller();
        for _ in 0..2 {
            let mut mb = readings(250.0, 0.0, &[false; 4]);
            mb.send(Message::Stop).unwrap();
            cycle(&mut c, mb);
            assert_eq!(c.mode(), Mode::Initialisation);
        }
        cycle(&mut c, readings(250.0, 0.0, &[false; 4]));
        let mut mb = readings(250.0, 0.0, &[false; 4]);
        mb.send(Message::Stop).unwrap();
        cycle(&mut c, mb);
        assert_eq!(c.mode(), Mode::Initialisation);
        for _ in 0..2 {
            let mut mb = readings(250.0, 0.0, &[false; 4]);
            mb.send(Message::Stop).unwrap();
            cycle(&mut c, mb);
        }
        assert_eq!(c.mode(), Mode::EmergencyStop);
    }

    #[test]
    fn silent_controller_with_open_pump_is_planned_around() {
        let mut c = controller();
        let mut mb = readings(160.0, 0.0, &[false; 4]);
        mb.send(Message::SteamBoilerWaiting).unwrap();
        cycle(&mut c, mb);
        assert!(c.program_ready_sent());
        assert_eq!(c.commanded_pumps(), &[false; 4]);

        // pump 0 runs although commanded closed and its controller went quiet
        let mut mb = Mailbox::unbounded();
        mb.send(Message::Level(160.0)).unwrap();
        mb.send(Message::Steam(4.0)).unwrap();
        mb.send(Message::PumpState(0, true)).unwrap();
        for i in 1..4 {
            mb.send(Message::PumpState(i, false)).unwrap();
            mb.send(Message::PumpControlState(i, false)).unwrap();
        }
        mb.send(Message::PhysicalUnitsReady).unwrap();
        let out = cycle(&mut c, mb);

        assert_eq!(c.mode(), Mode::Degraded);
        assert!(out.contains(&Message::PumpControlFailureDetection(0)));
        // 160 + (4 - 4) * 5 stays in band, so no pump is opened on top
        assert_eq!(c.commanded_pumps(), &[false; 4]);
        assert_eq!(out.count_kind(MessageKind::ClosePump), 4);
    }

    #[test]
    fn overflowing_outgoing_mailbox_does_not_panic() {
        let mut c = controller();
        let mut mb = readings(100.0, 0.0, &[false; 4]);
        mb.send(Message::SteamBoilerWaiting).unwrap();
        let mut out = Mailbox::bounded(2);
        c.clock(&mb, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out.read(0), Some(Message::Mode(Mode::Initialisation)));
    }
}
