//! Influence and attrition engine
//!
//! Each unit projects influence onto the 3x3 block around its cell:
//! friendly cells are reinforced, foreign land is attacked. Contributions
//! from every unit are summed into a scratch buffer first and only then
//! applied to the control field, so the result does not depend on unit
//! order. Units standing on land they do not own lose troops.

use serde::{Deserialize, Serialize};

use super::supply::SupplyNetwork;
use super::units::{UnitSnapshot, MIN_TROOPS};
use crate::core::config::SimulationConfig;
use crate::core::types::{GridCoord, UnitId};
use crate::spatial::grid::Grid;
use crate::spatial::territory::{ControlField, TerritoryGrid};

/// Troop loss suffered by one unit during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttritionReport {
    pub unit: UnitId,
    pub cell: GridCoord,
    pub supply: f64,
    pub before: f64,
    pub after: f64,
}

/// Attrition for one unit: `troops * rate * (1 - relief * supply) * dt`, floored
pub fn attrition_after(troops: f64, supply: f64, dt_secs: f64, config: &SimulationConfig) -> f64 {
    let influence = &config.influence;
    let rate = influence.base_attrition_rate * (1.0 - influence.supply_attrition_relief * supply);
    (troops - troops * rate * dt_secs).max(MIN_TROOPS)
}

/// Per-tick influence accumulator
#[derive(Debug, Clone)]
pub struct InfluenceEngine {
    scratch: Grid<f64>,
}

impl InfluenceEngine {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            scratch: Grid::new(width, height),
        }
    }

    /// Summed influence rate (control points per second) for a cell this tick
    pub fn pending(&self, coord: GridCoord) -> f64 {
        self.scratch.get(coord).copied().unwrap_or(0.0)
    }

    /// Supply, attrition and influence projection for every unit
    ///
    /// Troop counts in `units` are updated in place; the returned reports
    /// list every unit that lost troops so the caller can write them back.
    pub fn accumulate(
        &mut self,
        units: &mut [UnitSnapshot],
        territory: &TerritoryGrid,
        supply: &SupplyNetwork,
        config: &SimulationConfig,
        dt_secs: f64,
    ) -> Vec<AttritionReport> {
        self.scratch.clear();
        let mut reports = Vec::new();
        let geometry = territory.geometry();
        let kernel = config.influence.kernel;

        for unit in units.iter_mut() {
            let Some(cell) = geometry.world_to_cell(unit.position) else {
                continue;
            };

            let effectiveness = supply.effectiveness(unit.faction, cell, territory, &config.supply);

            if territory.is_land(cell) && !territory.is_owned_by(cell, unit.faction) {
                let before = unit.troop_count;
                let after = attrition_after(before, effectiveness, dt_secs, config);
                if after < before {
                    unit.troop_count = after;
                    reports.push(AttritionReport {
                        unit: unit.id,
                        cell,
                        supply: effectiveness,
                        before,
                        after,
                    });
                }
            }

            let strength = unit.troop_count * config.influence.per_troop * effectiveness;
            for (dx, dy, neighbor) in geometry.neighborhood(cell) {
                if !territory.is_land(neighbor) {
                    continue;
                }
                let influence = strength * kernel.weight(dx, dy);
                if let Some(slot) = self.scratch.get_mut(neighbor) {
                    if territory.is_owned_by(neighbor, unit.faction) {
                        *slot += influence;
                    } else {
                        *slot -= influence;
                    }
                }
            }
        }

        reports
    }

    /// Apply the accumulated influence, scaled by elapsed time, to every land cell
    pub fn apply(&self, territory: &TerritoryGrid, control: &mut ControlField, dt_secs: f64) {
        for (coord, rate) in self.scratch.iter() {
            if *rate != 0.0 && territory.is_land(coord) {
                control.apply_delta(coord, rate * dt_secs);
            }
        }
    }
}
