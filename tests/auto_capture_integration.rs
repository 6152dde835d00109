//! Auto-capture integration tests

use frontline::campaign::auto_capture::{AutoCaptureEvent, Selection};
use frontline::campaign::units::{MovementState, UnitDirectory, UnitRoster};
use frontline::core::config::SimulationConfig;
use frontline::core::error::{CaptureRejection, FrontlineError};
use frontline::core::types::{FactionId, GridCoord, UnitId, Vec2, WorldRect};
use frontline::simulation::{SimulationEvent, SimulationState};
use frontline::spatial::territory::TerritoryGrid;
use std::collections::BTreeSet;

const A: FactionId = FactionId(1);
const B: FactionId = FactionId(2);

fn center(x: usize, y: usize) -> Vec2 {
    Vec2::new(x as f32 * 10.0 + 5.0, y as f32 * 10.0 + 5.0)
}

fn simulation(rows: &[&str]) -> SimulationState {
    let territory = TerritoryGrid::from_ascii(rows, 10.0, Vec2::default());
    SimulationState::new(territory, UnitRoster::new(), SimulationConfig::default()).unwrap()
}

fn drafted_targets(sim: &SimulationState, units: &[UnitId]) -> Vec<GridCoord> {
    units
        .iter()
        .filter_map(|id| sim.units().get(*id).and_then(|u| u.auto_capture_target))
        .collect()
}

#[test]
fn test_two_units_split_four_targets() {
    let mut sim = simulation(&["AABB", "AABB"]);
    let u1 = sim.units_mut().spawn(A, center(0, 0), 10_000.0);
    let u2 = sim.units_mut().spawn(A, center(0, 1), 10_000.0);

    let op = sim
        .request_country_capture(&Selection::new(A, vec![u1, u2]), B)
        .unwrap();

    let targets = drafted_targets(&sim, &[u1, u2]);
    assert_eq!(targets.len(), 2);
    assert_ne!(targets[0], targets[1]);
    assert_eq!(sim.orchestrator().operation(op).unwrap().pending.len(), 2);
}

#[test]
fn test_country_without_cells_rejected_without_drafting() {
    let mut sim = simulation(&["AABB"]);
    let unit = sim.units_mut().spawn(A, center(0, 0), 10_000.0);

    let result = sim.request_country_capture(&Selection::new(A, vec![unit]), FactionId(7));
    assert!(matches!(
        result,
        Err(FrontlineError::CaptureRejected(CaptureRejection::NoTargets))
    ));
    assert!(!sim.orchestrator().is_drafted(unit));
    assert_eq!(sim.units().get(unit).unwrap().movement, MovementState::Idle);
    assert_eq!(sim.orchestrator().operations().count(), 0);
}

#[test]
fn test_area_without_capturable_land_rejected() {
    let mut sim = simulation(&["AA..", "AA.."]);
    let unit = sim.units_mut().spawn(A, center(0, 0), 10_000.0);

    let rect = WorldRect::from_corners(Vec2::new(0.0, 0.0), Vec2::new(39.0, 19.0));
    let result = sim.request_area_capture(&Selection::new(A, vec![unit]), rect);
    assert!(matches!(
        result,
        Err(FrontlineError::CaptureRejected(CaptureRejection::NoTargets))
    ));

    let outside = WorldRect::from_corners(Vec2::new(100.0, 100.0), Vec2::new(200.0, 200.0));
    assert!(sim
        .request_area_capture(&Selection::new(A, vec![unit]), outside)
        .is_err());
}

#[test]
fn test_cancel_mid_flight_freezes_unit() {
    let mut sim = simulation(&["A...B"]);
    let unit = sim.units_mut().spawn(A, center(0, 0), 10_000.0);
    sim.request_country_capture(&Selection::new(A, vec![unit]), B)
        .unwrap();

    sim.tick(100.0);
    sim.tick(100.0);
    assert!(sim.units().get(unit).unwrap().is_moving());
    assert!(sim.cancel_capture(unit));
    let frozen = sim.units().get(unit).unwrap().position;

    let mut later = Vec::new();
    for _ in 0..50 {
        later.extend(sim.tick(100.0));
    }
    assert_eq!(sim.units().get(unit).unwrap().position, frozen);
    assert!(!later.iter().any(|e| matches!(
        e,
        SimulationEvent::AutoCapture(AutoCaptureEvent::TargetAssigned { .. })
    )));
    assert_eq!(sim.units().get(unit).unwrap().auto_capture_target, None);
}

#[test]
fn test_operation_sweeps_area_and_disbands() {
    let mut sim = simulation(&["AABBB", "AABBB"]);
    let u1 = sim.units_mut().spawn(A, center(1, 0), 10_000.0);
    let u2 = sim.units_mut().spawn(A, center(1, 1), 10_000.0);
    let rect = WorldRect::from_corners(Vec2::new(20.0, 0.0), Vec2::new(49.0, 19.0));
    let op = sim
        .request_area_capture(&Selection::new(A, vec![u1, u2]), rect)
        .unwrap();

    let mut visited = BTreeSet::new();
    let mut finished = false;
    for _ in 0..200 {
        for event in sim.tick(100.0) {
            match event {
                SimulationEvent::AutoCapture(AutoCaptureEvent::TargetAssigned { target, .. }) => {
                    assert!(visited.insert(target), "cell {:?} assigned twice", target);
                }
                SimulationEvent::AutoCapture(AutoCaptureEvent::OperationFinished { operation }) => {
                    assert_eq!(operation, op);
                    finished = true;
                }
                _ => {}
            }
        }
        let targets = drafted_targets(&sim, &[u1, u2]);
        if targets.len() == 2 {
            assert_ne!(targets[0], targets[1]);
        }
    }

    assert!(finished);
    assert_eq!(visited.len(), 6);
    assert!(sim.orchestrator().operation(op).is_none());
}

#[test]
fn test_destroyed_unit_is_dropped() {
    let mut sim = simulation(&["AABB"]);
    let u1 = sim.units_mut().spawn(A, center(0, 0), 10_000.0);
    let op = sim
        .request_country_capture(&Selection::new(A, vec![u1]), B)
        .unwrap();

    sim.units_mut().remove(u1);
    let events = sim.tick(100.0);

    assert!(events.contains(&SimulationEvent::AutoCapture(AutoCaptureEvent::OperationFinished {
        operation: op
    })));
    assert!(!sim.orchestrator().is_drafted(u1));
}

#[test]
fn test_cancel_all_returns_units_to_manual_control() {
    let mut sim = simulation(&["AABB", "AABB"]);
    let units: Vec<UnitId> = (0..2)
        .map(|y| sim.units_mut().spawn(A, center(0, y), 10_000.0))
        .collect();
    sim.request_country_capture(&Selection::new(A, units.clone()), B)
        .unwrap();

    sim.cancel_all_captures();
    for id in &units {
        let unit = sim.units().get(*id).unwrap();
        assert!(!unit.is_moving());
        assert_eq!(unit.auto_capture_target, None);
    }

    let seq = sim.order_move(units[0], center(1, 1)).unwrap();
    assert_eq!(sim.units().unit(units[0]).unwrap().order_seq, seq);
}

#[test]
fn test_manual_order_during_hold_survives() {
    let mut sim = simulation(&["AABB"]);
    let unit = sim.units_mut().spawn(A, center(1, 0), 10_000.0);
    sim.request_country_capture(&Selection::new(A, vec![unit]), B)
        .unwrap();

    // Two frames to reach (2, 0), then the unit holds there
    sim.tick(100.0);
    sim.tick(100.0);
    assert!(!sim.units().get(unit).unwrap().is_moving());
    assert!(sim.orchestrator().is_drafted(unit));

    sim.units_mut().move_to(unit, center(0, 0), 50.0).unwrap();
    let mut events = Vec::new();
    for _ in 0..10 {
        events.extend(sim.tick(100.0));
    }

    assert!(!sim.orchestrator().is_drafted(unit));
    assert!(!events.iter().any(|e| matches!(
        e,
        SimulationEvent::AutoCapture(AutoCaptureEvent::TargetAssigned { .. })
    )));
    let moved = sim.units().get(unit).unwrap();
    assert_eq!(moved.position, center(0, 0));
    assert_eq!(moved.auto_capture_target, None);
}

#[test]
fn test_stop_during_hold_survives() {
    let mut sim = simulation(&["AABB"]);
    let unit = sim.units_mut().spawn(A, center(1, 0), 10_000.0);
    let op = sim
        .request_country_capture(&Selection::new(A, vec![unit]), B)
        .unwrap();

    sim.tick(100.0);
    sim.tick(100.0);
    let held = sim.units().get(unit).unwrap().position;
    assert!(sim.units_mut().stop(unit));

    let events = sim.tick(100.0);
    assert!(events.contains(&SimulationEvent::AutoCapture(AutoCaptureEvent::OperationFinished {
        operation: op
    })));
    sim.tick(100.0);
    let stopped = sim.units().get(unit).unwrap();
    assert_eq!(stopped.movement, MovementState::Idle);
    assert_eq!(stopped.position, held);
}
