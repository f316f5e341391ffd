//! Integration test: conditions that must end in an emergency stop, and
//! the ones that must not.

use sb_core::{ControllerConfig, PhysicalCharacteristics, TransmissionPolicy};
use sb_protocol::{Mailbox, Message, Mode, Unit};
use sb_sim::harness::atleast;
use sb_sim::{
    BoilerFault, HardwarePeer, Harness, PumpControllerModel, PumpModel, SensorModel, SimError, UnitsMode,
};

fn harness_with(chars: PhysicalCharacteristics, config: ControllerConfig, water: f64) -> Harness {
    let mut h = Harness::with_units(chars, config).unwrap();
    h.peer_mut().pump_in_water(water).unwrap();
    h.peer_mut().set_mode(UnitsMode::Waiting);
    h
}

fn reference(water: f64) -> Harness {
    harness_with(PhysicalCharacteristics::default(), ControllerConfig::default(), water)
}

fn strict() -> Harness {
    harness_with(
        PhysicalCharacteristics::default(),
        ControllerConfig::default().with_transmission_policy(TransmissionPolicy::EmergencyStop),
        250.0,
    )
}

fn emergency(mb: &Mailbox) -> bool {
    mb.contains(&Message::Mode(Mode::EmergencyStop))
}

#[test]
fn broken_sensors_at_start_up_stop_immediately() {
    let faults: [(fn(&mut Harness, SensorModel), SensorModel); 3] = [
        (|h, m| h.peer_mut().set_level_sensor(m), SensorModel::Stuck { value: -1.0 }),
        (|h, m| h.peer_mut().set_steam_sensor(m), SensorModel::Stuck { value: -1.0 }),
        (|h, m| h.peer_mut().set_steam_sensor(m), SensorModel::Stuck { value: 500.0 }),
    ];
    for (install, model) in faults {
        let mut h = reference(250.0);
        install(&mut h, model);
        let out = h.clock_until(0.1, emergency).unwrap();
        assert!(!out.contains_kind(sb_protocol::MessageKind::OpenPump));
    }
}

#[test]
fn transmission_failures_stop_under_the_strict_policy() {
    type Install = fn(&mut Harness);
    let faults: [(&str, Install); 4] = [
        ("level", |h| h.peer_mut().set_level_sensor(SensorModel::TransmissionFailure)),
        ("steam", |h| h.peer_mut().set_steam_sensor(SensorModel::TransmissionFailure)),
        ("pump", |h| {
            h.peer_mut().set_pump(1, PumpModel::TransmissionFailure).unwrap()
        }),
        ("controller", |h| {
            h.peer_mut()
                .set_pump_controller(2, PumpControllerModel::TransmissionFailure)
                .unwrap()
        }),
    ];
    for (name, install) in faults {
        for t in [0.0, 60.0, 240.0] {
            let mut h = strict();
            h.clock_for(t).unwrap();
            install(&mut h);
            h.clock_until(10.0, emergency)
                .unwrap_or_else(|e| panic!("{name} at {t}s: {e}"));
        }
    }
}

#[test]
fn transmission_failures_degrade_under_the_default_policy() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_level_sensor(SensorModel::TransmissionFailure);
    h.clock_until(
        10.0,
        atleast(&[Message::Mode(Mode::Rescue), Message::LevelFailureDetection]),
    )
    .unwrap();
    h.clock_for_without(60.0, emergency).unwrap();
}

#[test]
fn valve_stuck_open_is_noticed() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut()
        .set_boiler_fault(BoilerFault::ValveStuckOpen { rate: 20.0 });
    h.clock_until(10.0, atleast(&[Message::Mode(Mode::Rescue)]))
        .unwrap();
}

#[test]
fn no_working_pump_ends_in_emergency_stop() {
    let mut h = reference(250.0);
    for i in 0..4 {
        h.peer_mut().set_pump(i, PumpModel::StuckClosed).unwrap();
    }
    h.clock_until(75.0, emergency).unwrap();
    assert!(h.peer().water_level() <= 50.0);
}

#[test]
fn pump_stuck_open_ends_in_emergency_stop() {
    let chars = PhysicalCharacteristics::default().with_pumps(1, 20.0);
    let mut h = harness_with(chars, ControllerConfig::default(), 250.0);
    h.peer_mut().set_pump(0, PumpModel::SticksOpen).unwrap();
    h.clock_until(40.0, emergency).unwrap();
    assert!(h.peer().water_level() >= 400.0);
}

#[test]
fn rescue_survives_until_the_steam_sensor_fails_too() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_level_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_for_without(120.0, emergency).unwrap();
    assert_eq!(h.controller().mode(), Mode::Rescue);
    h.peer_mut().set_steam_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_until(10.0, emergency).unwrap();
}

#[test]
fn degraded_survives_until_the_level_sensor_fails_too() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_steam_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_for_without(120.0, emergency).unwrap();
    assert_eq!(h.controller().mode(), Mode::Degraded);
    h.peer_mut().set_level_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_until(10.0, emergency).unwrap();
}

#[test]
fn operator_stop_needs_three_consecutive_cycles() {
    let mut h = reference(250.0);
    h.clock_for(60.0).unwrap();
    h.peer_mut().request_stop(true);
    h.clock_for_without(10.0, emergency).unwrap();
    h.clock_until(5.0, emergency).unwrap();
}

#[test]
fn emergency_stop_is_final() {
    let mut h = reference(250.0);
    h.peer_mut().set_level_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_until(0.1, emergency).unwrap();
    h.peer_mut().repair(Unit::LevelSensor).unwrap();
    h.clock_for_without(30.0, |mb| !emergency(mb)).unwrap();
    let err = h.clock_until(10.0, |mb| !emergency(mb)).unwrap_err();
    assert!(matches!(err, SimError::Timeout { .. }));
    assert_eq!(h.controller().mode(), Mode::EmergencyStop);
}

#[test]
fn both_sensors_failing_together_stop_within_one_cycle() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    assert_eq!(h.controller().mode(), Mode::Normal);
    h.peer_mut().set_level_sensor(SensorModel::Stuck { value: -1.0 });
    h.peer_mut().set_steam_sensor(SensorModel::Stuck { value: -1.0 });
    let out = h.clock_until(5.0, |_| true).unwrap();
    assert_eq!(out.read(0), Some(Message::Mode(Mode::EmergencyStop)));
    assert!(out.contains(&Message::LevelFailureDetection));
    assert!(out.contains(&Message::SteamFailureDetection));
}
