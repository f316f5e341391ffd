//! Per-unit trust status.

use serde::{Deserialize, Serialize};

use sb_protocol::Unit;

/// Whether the last telemetry of a unit can be trusted.
///
/// `Repaired` is trusted; it only differs from `Ok` during the cycle the
/// repair signal arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    #[default]
    Ok,
    FailedDetected,
    FailedAcknowledged,
    Repaired,
}

impl ComponentStatus {
    pub fn is_trusted(self) -> bool {
        matches!(self, ComponentStatus::Ok | ComponentStatus::Repaired)
    }

    pub fn is_failed(self) -> bool {
        !self.is_trusted()
    }
}

/// Status of every sensor, pump and pump controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBoard {
    level: ComponentStatus,
    steam: ComponentStatus,
    pumps: Vec<ComponentStatus>,
    controllers: Vec<ComponentStatus>,
}

impl StatusBoard {
    pub fn new(pumps: usize) -> Self {
        Self {
            level: ComponentStatus::Ok,
            steam: ComponentStatus::Ok,
            pumps: vec![ComponentStatus::Ok; pumps],
            controllers: vec![ComponentStatus::Ok; pumps],
        }
    }

    pub fn pump_count(&self) -> usize {
        self.pumps.len()
    }

    fn slot(&mut self, unit: Unit) -> Option<&mut ComponentStatus> {
        match unit {
            Unit::LevelSensor => Some(&mut self.level),
            Unit::SteamSensor => Some(&mut self.steam),
            Unit::Pump(n) => self.pumps.get_mut(n),
            Unit::PumpController(n) => self.controllers.get_mut(n),
        }
    }

    /// Status of `unit`, `None` for a pump index the boiler does not have.
    pub fn get(&self, unit: Unit) -> Option<ComponentStatus> {
        match unit {
            Unit::LevelSensor => Some(self.level),
            Unit::SteamSensor => Some(self.steam),
            Unit::Pump(n) => self.pumps.get(n).copied(),
            Unit::PumpController(n) => self.controllers.get(n).copied(),
        }
    }

    pub fn is_trusted(&self, unit: Unit) -> bool {
        self.get(unit).is_some_and(ComponentStatus::is_trusted)
    }

    /// True when both the pump and its controller are trusted.
    pub fn pump_chain_trusted(&self, pump: usize) -> bool {
        self.is_trusted(Unit::Pump(pump)) && self.is_trusted(Unit::PumpController(pump))
    }

    /// Classify `unit` as failed. Returns `true` only for a new failure,
    /// which is when a detection message must be sent.
    pub fn mark_failed(&mut self, unit: Unit) -> bool {
        match self.slot(unit) {
            Some(s) if s.is_trusted() => {
                *s = ComponentStatus::FailedDetected;
                true
            }
            _ => false,
        }
    }

    /// Record the units' acknowledgement of a detection.
    pub fn acknowledge(&mut self, unit: Unit) {
        if let Some(s) = self.slot(unit) {
            if *s == ComponentStatus::FailedDetected {
                *s = ComponentStatus::FailedAcknowledged;
            }
        }
    }

    /// Record a repair signal. A unit that never failed stays `Ok`.
    /// Returns `false` for an unknown unit.
    pub fn repair(&mut self, unit: Unit) -> bool {
        match self.slot(unit) {
            Some(s) => {
                if s.is_failed() {
                    *s = ComponentStatus::Repaired;
                }
                true
            }
            None => false,
        }
    }

    /// Promote units that survived a cycle since their repair back to `Ok`.
    pub fn settle(&mut self) {
        for s in std::iter::once(&mut self.level)
            .chain(std::iter::once(&mut self.steam))
            .chain(self.pumps.iter_mut())
            .chain(self.controllers.iter_mut())
        {
            if *s == ComponentStatus::Repaired {
                *s = ComponentStatus::Ok;
            }
        }
    }

    /// Every unit in a fixed order: level, steam, then pumps and their
    /// controllers by ascending index.
    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        [Unit::LevelSensor, Unit::SteamSensor]
            .into_iter()
            .chain((0..self.pumps.len()).map(Unit::Pump))
            .chain((0..self.controllers.len()).map(Unit::PumpController))
    }

    /// Units currently failed.
    pub fn outstanding(&self) -> Vec<Unit> {
        self.units().filter(|u| !self.is_trusted(*u)).collect()
    }

    pub fn any_actuator_fault(&self) -> bool {
        (0..self.pumps.len()).any(|i| !self.pump_chain_trusted(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_reported_once() {
        let mut board = StatusBoard::new(2);
        assert!(board.mark_failed(Unit::Pump(1)));
        assert!(!board.mark_failed(Unit::Pump(1)));
        assert_eq!(board.get(Unit::Pump(1)), Some(ComponentStatus::FailedDetected));
        assert!(board.any_actuator_fault());
        assert_eq!(board.outstanding(), vec![Unit::Pump(1)]);
    }

    #[test]
    fn full_lifecycle() {
        let mut board = StatusBoard::new(1);
        board.mark_failed(Unit::SteamSensor);
        board.acknowledge(Unit::SteamSensor);
        assert_eq!(
            board.get(Unit::SteamSensor),
            Some(ComponentStatus::FailedAcknowledged)
        );
        assert!(board.repair(Unit::SteamSensor));
        assert_eq!(board.get(Unit::SteamSensor), Some(ComponentStatus::Repaired));
        assert!(board.is_trusted(Unit::SteamSensor));
        board.settle();
        assert_eq!(board.get(Unit::SteamSensor), Some(ComponentStatus::Ok));
    }

    #[test]
    fn repaired_unit_can_fail_again() {
        let mut board = StatusBoard::new(1);
        board.mark_failed(Unit::LevelSensor);
        board.repair(Unit::LevelSensor);
        assert!(board.mark_failed(Unit::LevelSensor));
    }

    #[test]
    fn unknown_units_are_not_trusted() {
        let mut board = StatusBoard::new(2);
        assert!(!board.is_trusted(Unit::Pump(7)));
        assert!(!board.mark_failed(Unit::PumpController(7)));
        assert!(!board.repair(Unit::Pump(7)));
        assert!(board.repair(Unit::Pump(0)));
        assert_eq!(board.get(Unit::Pump(0)), Some(ComponentStatus::Ok));
    }

    #[test]
    fn acknowledge_only_moves_detected() {
        let mut board = StatusBoard::new(1);
        board.acknowledge(Unit::LevelSensor);
        assert_eq!(board.get(Unit::LevelSensor), Some(ComponentStatus::Ok));
    }
}
