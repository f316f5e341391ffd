//! Integration test: the controller driving simulated hardware through
//! start-up, normal operation, degraded operation and rescue.

use sb_core::{ControllerConfig, PhysicalCharacteristics};
use sb_protocol::{Mailbox, Message, Mode, Unit};
use sb_sim::harness::{atleast, exactly};
use sb_sim::{Harness, HardwarePeer, PumpControllerModel, PumpModel, SensorModel, UnitsMode};

fn harness(chars: PhysicalCharacteristics, water: f64, waiting: bool) -> Harness {
    let mut h = Harness::with_units(chars, ControllerConfig::default()).unwrap();
    h.peer_mut().pump_in_water(water).unwrap();
    if waiting {
        h.peer_mut().set_mode(UnitsMode::Waiting);
    }
    h
}

fn reference(water: f64) -> Harness {
    harness(PhysicalCharacteristics::default(), water, true)
}

fn emergency(mb: &Mailbox) -> bool {
    mb.contains(&Message::Mode(Mode::EmergencyStop))
}

fn leaves_normal(mb: &Mailbox) -> bool {
    !mb.contains(&Message::Mode(Mode::Normal))
}

// ---------- initialisation ----------

#[test]
fn only_announces_initialisation_until_the_boiler_waits() {
    let mut h = harness(PhysicalCharacteristics::default(), 250.0, false);
    h.clock_until(5.0, exactly(&[Message::Mode(Mode::Initialisation)]))
        .unwrap();
    h.clock_for_without(60.0, atleast(&[Message::ProgramReady]))
        .unwrap();
}

#[test]
fn ready_immediately_with_a_level_in_band() {
    let mut h = reference(250.0);
    let out = h
        .clock_until(5.0, atleast(&[Message::Mode(Mode::Initialisation), Message::ProgramReady]))
        .unwrap();
    assert!(out.contains(&Message::Valve(false)));
    // the units answer without any time passing
    let out = h.exchange_once().unwrap();
    assert_eq!(out.read(0), Some(Message::Mode(Mode::Normal)));
    assert_eq!(h.peer().mode(), UnitsMode::Running);
}

#[test]
fn drains_an_overfull_boiler_before_release() {
    let mut h = reference(400.0);
    let out = h.clock_until(5.0, |_| true).unwrap();
    assert!(out.contains(&Message::Valve(true)));
    assert!(!out.contains(&Message::ProgramReady));

    h.clock_until(60.0, atleast(&[Message::ProgramReady])).unwrap();
    let chars = PhysicalCharacteristics::default();
    assert!(chars.in_normal_band(h.peer().water_level()));
    assert!(!h.peer().boiler().valve_open());
}

#[test]
fn fills_an_empty_boiler_before_release() {
    let mut h = reference(0.0);
    h.clock_until(60.0, atleast(&[Message::ProgramReady])).unwrap();
    let chars = PhysicalCharacteristics::default();
    assert!(chars.in_normal_band(h.peer().water_level()));
    h.clock_until(10.0, atleast(&[Message::Mode(Mode::Normal)]))
        .unwrap();
}

// ---------- normal operation ----------

#[test]
fn normal_operation_keeps_the_level_within_limits() {
    for pumps in 3..=6 {
        let chars = PhysicalCharacteristics::default().with_pumps(pumps, 4.0);
        let mut h = harness(chars.clone(), 0.0, true);
        h.clock_for(20.0).unwrap();
        h.peer_mut().reset_level_extremes();
        h.clock_for_without(540.0, leaves_normal)
            .unwrap_or_else(|e| panic!("{pumps} pumps: {e}"));
        let (lo, hi) = h.peer().level_extremes();
        assert!(!chars.breaches_limits(lo), "{pumps} pumps: low {lo}");
        assert!(!chars.breaches_limits(hi), "{pumps} pumps: high {hi}");
        assert_eq!(h.controller().mode(), Mode::Normal);
    }
}

// ---------- degraded operation ----------

#[test]
fn steam_sensor_stuck_low_degrades() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_steam_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_until(
        10.0,
        atleast(&[Message::Mode(Mode::Degraded), Message::SteamFailureDetection]),
    )
    .unwrap();
}

#[test]
fn steam_sensor_stuck_at_capacity_degrades() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_steam_sensor(SensorModel::Stuck { value: 500.0 });
    h.clock_until(
        10.0,
        atleast(&[Message::Mode(Mode::Degraded), Message::SteamFailureDetection]),
    )
    .unwrap();
}

#[test]
fn stuck_closed_pump_is_detected() {
    let chars = PhysicalCharacteristics::default().with_pumps(2, 4.0);
    let mut h = harness(chars, 250.0, true);
    h.clock_for(25.0).unwrap();
    h.peer_mut().set_pump(0, PumpModel::StuckClosed).unwrap();
    h.clock_until(
        60.0,
        atleast(&[Message::Mode(Mode::Degraded), Message::PumpFailureDetection(0)]),
    )
    .unwrap();
}

#[test]
fn stuck_pump_controller_is_detected() {
    let chars = PhysicalCharacteristics::default().with_pumps(2, 4.0);
    let mut h = harness(chars, 250.0, true);
    h.clock_for(25.0).unwrap();
    h.peer_mut()
        .set_pump_controller(0, PumpControllerModel::StuckOff)
        .unwrap();
    let out = h
        .clock_until(
            60.0,
            atleast(&[
                Message::Mode(Mode::Degraded),
                Message::PumpControlFailureDetection(0),
            ]),
        )
        .unwrap();
    // the pump did what its controller told it
    assert!(!out.contains(&Message::PumpFailureDetection(0)));
}

#[test]
fn stuck_pump_controller_with_three_pumps() {
    let chars = PhysicalCharacteristics::default().with_pumps(3, 4.0);
    let mut h = harness(chars, 250.0, true);
    h.clock_for(25.0).unwrap();
    h.peer_mut()
        .set_pump_controller(0, PumpControllerModel::StuckOff)
        .unwrap();
    h.clock_until(120.0, atleast(&[Message::Mode(Mode::Degraded)]))
        .unwrap();
}

#[test]
fn a_pump_stuck_from_the_start_is_survivable() {
    for pumps in 4..=6 {
        let chars = PhysicalCharacteristics::default().with_pumps(pumps, 4.0);
        for stuck in 0..pumps {
            let mut h = harness(chars.clone(), 0.0, true);
            h.peer_mut().set_pump(stuck, PumpModel::StuckClosed).unwrap();
            h.clock_for(20.0).unwrap();
            h.peer_mut().reset_level_extremes();
            h.clock_for_without(540.0, emergency)
                .unwrap_or_else(|e| panic!("{pumps} pumps, {stuck} stuck: {e}"));
            let (lo, hi) = h.peer().level_extremes();
            assert!(!chars.breaches_limits(lo) && !chars.breaches_limits(hi));
            assert_eq!(h.controller().mode(), Mode::Degraded);
            assert!(!h.controller().board().is_trusted(Unit::Pump(stuck)));
        }
    }
}

#[test]
fn repaired_pump_restores_normal_operation() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_pump(0, PumpModel::TransmissionFailure).unwrap();
    h.clock_until(
        10.0,
        atleast(&[Message::Mode(Mode::Degraded), Message::PumpFailureDetection(0)]),
    )
    .unwrap();
    // the failure is acknowledged by the units on the following exchange
    h.clock_for(60.0).unwrap();
    assert!(!h.controller().commanded_pumps()[0]);

    h.peer_mut().repair(Unit::Pump(0)).unwrap();
    h.clock_until(
        10.0,
        atleast(&[
            Message::Mode(Mode::Normal),
            Message::PumpRepairedAcknowledgement(0),
        ]),
    )
    .unwrap();
    assert!(h.controller().board().is_trusted(Unit::Pump(0)));
}

// ---------- rescue ----------

#[test]
fn level_sensor_stuck_low_enters_rescue() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_level_sensor(SensorModel::Stuck { value: -1.0 });
    h.clock_until(
        10.0,
        atleast(&[Message::Mode(Mode::Rescue), Message::LevelFailureDetection]),
    )
    .unwrap();
    let estimate = h.controller().estimated_level().unwrap();
    assert!((estimate - h.peer().water_level()).abs() < 20.0);
}

#[test]
fn level_sensor_stuck_at_capacity_enters_rescue() {
    let mut h = reference(250.0);
    h.clock_for(240.0).unwrap();
    h.peer_mut().set_level_sensor(SensorModel::Stuck { value: 500.0 });
    h.clock_until(
        10.0,
        atleast(&[Message::Mode(Mode::Rescue), Message::LevelFailureDetection]),
    )
    .unwrap();
}

#[test]
fn level_sensor_frozen_inside_the_band_enters_rescue() {
    for capacity in [4.0, 3.5] {
        let chars = PhysicalCharacteristics::default().with_pumps(3, capacity);
        let mut h = harness(chars.clone(), 250.0, true);
        h.clock_for(120.0).unwrap();
        assert_eq!(h.controller().mode(), Mode::Normal);

        let frozen = h.peer().water_level();
        h.peer_mut().set_level_sensor(SensorModel::Stuck { value: frozen });
        h.peer_mut().reset_level_extremes();
        h.clock_until(
            60.0,
            atleast(&[Message::Mode(Mode::Rescue), Message::LevelFailureDetection]),
        )
        .unwrap_or_else(|e| panic!("{capacity} L/s pumps: {e}"));

        h.clock_for_without(300.0, emergency)
            .unwrap_or_else(|e| panic!("{capacity} L/s pumps: {e}"));
        assert_eq!(h.controller().mode(), Mode::Rescue);
        let (lo, hi) = h.peer().level_extremes();
        assert!(!chars.breaches_limits(lo), "{capacity} L/s pumps: low {lo}");
        assert!(!chars.breaches_limits(hi), "{capacity} L/s pumps: high {hi}");
    }
}
