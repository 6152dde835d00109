//! Occupation index: which units stand on which cell
//!
//! Rebuilt from scratch every control tick from the unit snapshot. Entries
//! are indices into that snapshot so troop counts read during capture
//! evaluation reflect attrition applied earlier in the same tick.

use ahash::AHashMap;

use super::grid::GridGeometry;
use crate::campaign::units::UnitSnapshot;
use crate::core::types::{FactionId, GridCoord};

#[derive(Debug, Default)]
pub struct OccupationIndex {
    cells: AHashMap<GridCoord, Vec<usize>>,
}

impl OccupationIndex {
    pub fn new() -> Self {
        Self {
            cells: AHashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, coord: GridCoord, unit_index: usize) {
        self.cells.entry(coord).or_default().push(unit_index);
    }

    /// Rebuild from unit positions; units off the grid are not indexed
    pub fn rebuild(&mut self, units: &[UnitSnapshot], geometry: &GridGeometry) {
        self.clear();
        for (index, unit) in units.iter().enumerate() {
            if let Some(coord) = geometry.world_to_cell(unit.position) {
                self.insert(coord, index);
            }
        }
    }

    /// Snapshot indices of units on a cell
    pub fn units_at(&self, coord: GridCoord) -> &[usize] {
        self.cells.get(&coord).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        !self.units_at(coord).is_empty()
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.cells.keys().copied()
    }

    /// Total troops per faction on a cell, strongest first
    ///
    /// Ties are broken by faction id so the ordering is deterministic.
    pub fn strength_by_faction(&self, coord: GridCoord, units: &[UnitSnapshot]) -> Vec<(FactionId, f64)> {
        let mut totals: Vec<(FactionId, f64)> = Vec::new();
        for unit in self.units_at(coord).iter().filter_map(|&i| units.get(i)) {
            match totals.iter_mut().find(|(faction, _)| *faction == unit.faction) {
                Some((_, troops)) => *troops += unit.troop_count,
                None => totals.push((unit.faction, unit.troop_count)),
            }
        }
        totals.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        totals
    }
}
