//! Territorial control integration scenarios

use frontline::campaign::units::UnitRoster;
use frontline::core::config::SimulationConfig;
use frontline::core::types::{FactionId, GridCoord, Vec2};
use frontline::simulation::{SimulationEvent, SimulationState};
use frontline::spatial::territory::{CellOwner, TerritoryGrid};

const A: FactionId = FactionId(1);
const B: FactionId = FactionId(2);
const C: FactionId = FactionId(3);

fn center(x: usize, y: usize) -> Vec2 {
    Vec2::new(x as f32 * 10.0 + 5.0, y as f32 * 10.0 + 5.0)
}

fn simulation(rows: &[&str]) -> SimulationState {
    let territory = TerritoryGrid::from_ascii(rows, 10.0, Vec2::default());
    SimulationState::new(territory, UnitRoster::new(), SimulationConfig::default()).unwrap()
}

#[test]
fn test_lone_invader_takes_center_of_5x5() {
    let mut sim = simulation(&["AAAAA", "AAAAA", "AAAAA", "AAAAA", "AAAAA"]);
    let invader = sim.units_mut().spawn(B, center(2, 2), 10_000.0);

    let mut flips = Vec::new();
    for _ in 0..200 {
        for event in sim.tick(100.0) {
            if let SimulationEvent::CellOwnerChanged { change, .. } = event {
                flips.push(change);
            }
        }
    }

    assert_eq!(sim.current_tick(), 200);
    assert_eq!(sim.get_owner(2, 2).unwrap(), Some(B));
    assert_eq!(flips.len(), 1);
    assert_eq!(flips[0].coord, GridCoord::new(2, 2));

    for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
        let (x, y) = (2 + dx, 2 + dy);
        let control = sim.get_control(x, y).unwrap();
        assert_eq!(sim.get_owner(x, y).unwrap(), Some(A));
        assert!(control > 0.0 && control < 100.0, "cell ({x}, {y}) at {control}");
    }
    // Cells outside the kernel are untouched
    assert_eq!(sim.get_control(0, 0).unwrap(), 100.0);

    let troops = sim.units().get(invader).unwrap().troop_count;
    assert!(troops < 10_000.0 && troops >= 1.0);
}

#[test]
fn test_edge_cells_lose_more_than_diagonals() {
    let mut sim = simulation(&["AAAAA", "AAAAA", "AAAAA", "AAAAA", "AAAAA"]);
    sim.units_mut().spawn(B, center(2, 2), 10_000.0);
    for _ in 0..50 {
        sim.tick(100.0);
    }

    let edge = sim.get_control(2, 1).unwrap();
    let diagonal = sim.get_control(1, 1).unwrap();
    assert!(edge < diagonal);
    assert!(sim.get_control(2, 2).unwrap() < edge);
}

#[test]
fn test_garrison_holds_against_invader() {
    let mut sim = simulation(&["AAAAA", "AAAAA", "AAAAA", "AAAAA", "AAAAA"]);
    sim.units_mut().spawn(B, center(2, 2), 10_000.0);
    sim.units_mut().spawn(A, center(2, 2), 10_000.0);

    for _ in 0..300 {
        sim.tick(100.0);
    }
    // The defender's reinforcement outweighs the unsupplied attack
    assert_eq!(sim.get_owner(2, 2).unwrap(), Some(A));
    assert_eq!(sim.get_control(2, 2).unwrap(), 100.0);
}

#[test]
fn test_contested_loss_turns_cell_neutral() {
    let mut sim = simulation(&["A"]);
    sim.units_mut().spawn(B, center(0, 0), 12_000.0);
    sim.units_mut().spawn(C, center(0, 0), 10_000.0);

    for _ in 0..400 {
        sim.tick(100.0);
        if sim.get_cell(0, 0).unwrap() == Some(CellOwner::Neutral) {
            break;
        }
    }
    assert_eq!(sim.get_cell(0, 0).unwrap(), Some(CellOwner::Neutral));
    assert_eq!(sim.get_owner(0, 0).unwrap(), None);
}

#[test]
fn test_ocean_is_never_touched() {
    let mut sim = simulation(&["A.B"]);
    sim.units_mut().spawn(B, center(1, 0), 10_000.0);
    let unit = sim.units_mut().spawn(A, center(1, 0), 10_000.0);

    for _ in 0..100 {
        sim.tick(100.0);
    }
    assert_eq!(sim.get_cell(1, 0).unwrap(), None);
    assert_eq!(sim.get_control(1, 0).unwrap(), 0.0);
    // No attrition at sea
    assert_eq!(sim.units().get(unit).unwrap().troop_count, 10_000.0);
}

#[test]
fn test_overlay_tracks_contested_cells() {
    let mut sim = simulation(&["AAA", "AAA", "AAA"]);
    sim.units_mut().spawn(B, center(1, 1), 10_000.0);
    assert!(sim.control_overlay(A).is_empty());

    for _ in 0..20 {
        sim.tick(100.0);
    }
    let overlay = sim.control_overlay(A);
    assert_eq!(overlay.len(), 9);
    assert!(overlay.iter().all(|c| c.alpha > 0.0 && c.alpha <= 0.5));
}

#[test]
fn test_territory_counts_follow_flips() {
    let mut sim = simulation(&["AAB", "AAB"]);
    assert_eq!(sim.territory_counts().get(&A), Some(&4));
    sim.units_mut().spawn(B, center(1, 0), 20_000.0);

    for _ in 0..300 {
        sim.tick(100.0);
    }
    let counts = sim.territory_counts();
    assert!(counts.get(&B).copied().unwrap_or(0) >= 3);
}
