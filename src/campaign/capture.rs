//! Capture resolver
//!
//! Runs after all influence for a tick has been applied. A cell whose
//! control reached the capture threshold, or fell to the loss threshold,
//! is handed to its dominant occupant. Nothing else changes ownership.

use serde::{Deserialize, Serialize};

use super::units::UnitSnapshot;
use crate::core::config::SimulationConfig;
use crate::core::types::{FactionId, GridCoord};
use crate::spatial::occupation::OccupationIndex;
use crate::spatial::territory::{CellOwner, ControlField, TerritoryGrid};

/// Who, if anyone, decisively holds a cell by troop presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// Nobody stands on the cell; the current owner keeps it
    Unoccupied,
    Faction(FactionId),
    /// Several factions present, none with the required margin
    Contested,
}

/// Decide dominance from per-faction troop totals sorted strongest first
pub fn dominance(strengths: &[(FactionId, f64)], margin: f64) -> Dominance {
    match strengths {
        [] => Dominance::Unoccupied,
        [(only, _)] => Dominance::Faction(*only),
        [(top, first), (_, second), ..] => {
            if *first >= *second * margin {
                Dominance::Faction(*top)
            } else {
                Dominance::Contested
            }
        }
    }
}

/// A cell changing hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerChange {
    pub coord: GridCoord,
    pub previous: CellOwner,
    pub owner: CellOwner,
}

impl OwnerChange {
    pub fn new_faction(&self) -> Option<FactionId> {
        self.owner.faction()
    }

    pub fn previous_faction(&self) -> Option<FactionId> {
        self.previous.faction()
    }
}

/// What a threshold crossing resolves to for one cell
fn evaluate(owner: CellOwner, control: f64, dominant: Dominance, config: &SimulationConfig) -> Option<CellOwner> {
    let capture = &config.capture;
    let foreign = |d: Dominance| match d {
        Dominance::Faction(f) if !owner.is(f) => Some(CellOwner::Faction(f)),
        _ => None,
    };

    if control >= capture.capture_threshold {
        return foreign(dominant);
    }
    if control <= capture.loss_threshold {
        return match dominant {
            Dominance::Contested if owner != CellOwner::Neutral => Some(CellOwner::Neutral),
            other => foreign(other),
        };
    }
    None
}

/// Evaluate every land cell and apply the resulting ownership changes
pub fn resolve_captures(
    territory: &mut TerritoryGrid,
    control: &mut ControlField,
    occupation: &OccupationIndex,
    units: &[UnitSnapshot],
    config: &SimulationConfig,
) -> Vec<OwnerChange> {
    let capture = &config.capture;
    let triggered: Vec<(GridCoord, CellOwner, f64)> = territory
        .land_cells()
        .filter_map(|(coord, owner)| {
            let value = control.get(coord)?;
            (value >= capture.capture_threshold || value <= capture.loss_threshold)
                .then_some((coord, owner, value))
        })
        .collect();

    let mut changes = Vec::new();
    for (coord, owner, value) in triggered {
        let strengths = occupation.strength_by_faction(coord, units);
        let dominant = dominance(&strengths, capture.dominance_margin);
        let Some(new_owner) = evaluate(owner, value, dominant, config) else {
            continue;
        };

        if let Ok(Some(previous)) = territory.set_owner(coord, new_owner) {
            control.set(coord, config.control.midpoint);
            tracing::debug!(
                "Cell ({}, {}) changed hands: {:?} -> {:?} at control {:.1}",
                coord.x,
                coord.y,
                previous,
                new_owner,
                value
            );
            changes.push(OwnerChange {
                coord,
                previous,
                owner: new_owner,
            });
        }
    }
    changes
}
