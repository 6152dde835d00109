//! Territory ownership grid and the parallel control field
//!
//! The ownership grid is the ground truth for who holds which cell. Ocean
//! and other uncontrollable terrain is stored as `None`; every land cell
//! always carries a `CellOwner`, either a faction or the neutral marker
//! left behind when a contested cell is lost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::grid::{Grid, GridGeometry};
use crate::core::error::{FrontlineError, Result};
use crate::core::types::{FactionId, GridCoord, Vec2};

/// Holder of a land cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellOwner {
    Faction(FactionId),
    Neutral,
}

impl CellOwner {
    pub fn faction(&self) -> Option<FactionId> {
        match self {
            Self::Faction(id) => Some(*id),
            Self::Neutral => None,
        }
    }

    pub fn is(&self, faction: FactionId) -> bool {
        self.faction() == Some(faction)
    }
}

/// Ownership of every cell on the map
#[derive(Debug, Clone)]
pub struct TerritoryGrid {
    geometry: GridGeometry,
    cells: Grid<Option<CellOwner>>,
}

impl TerritoryGrid {
    /// An all-ocean grid; map preparation fills in the land
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            cells: Grid::new(geometry.width, geometry.height),
        }
    }

    /// Build a grid from text rows, one character per cell
    ///
    /// `.` is ocean, `n` is neutral land, `A`..=`Z` are factions 1..=26.
    /// Rows shorter than the widest row are padded with ocean.
    pub fn from_ascii(rows: &[&str], cell_size: f32, origin: Vec2) -> Self {
        let height = rows.len().max(1);
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0).max(1);
        let mut grid = Self::new(GridGeometry::new(width, height, cell_size, origin));

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let owner = match ch {
                    'A'..='Z' => Some(CellOwner::Faction(FactionId(ch as u32 - 'A' as u32 + 1))),
                    'n' => Some(CellOwner::Neutral),
                    _ => None,
                };
                grid.cells.set(GridCoord::new(x, y), owner);
            }
        }
        grid
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.geometry.height
    }

    fn out_of_bounds(&self, coord: GridCoord) -> FrontlineError {
        FrontlineError::OutOfBounds {
            x: coord.x as i64,
            y: coord.y as i64,
            width: self.width(),
            height: self.height(),
        }
    }

    /// Raw cell content, `Ok(None)` for ocean
    pub fn cell(&self, coord: GridCoord) -> Result<Option<CellOwner>> {
        self.cells
            .get(coord)
            .copied()
            .ok_or_else(|| self.out_of_bounds(coord))
    }

    /// Owning faction; ocean and neutral land both read as `None`
    pub fn owner(&self, coord: GridCoord) -> Result<Option<FactionId>> {
        Ok(self.cell(coord)?.and_then(|owner| owner.faction()))
    }

    pub fn is_land(&self, coord: GridCoord) -> bool {
        matches!(self.cells.get(coord), Some(Some(_)))
    }

    pub fn is_owned_by(&self, coord: GridCoord, faction: FactionId) -> bool {
        matches!(self.cells.get(coord), Some(Some(owner)) if owner.is(faction))
    }

    /// Mark a cell as land held by `owner` (map preparation)
    pub fn set_land(&mut self, coord: GridCoord, owner: CellOwner) -> Result<()> {
        if !self.cells.set(coord, Some(owner)) {
            return Err(self.out_of_bounds(coord));
        }
        Ok(())
    }

    /// Change the holder of an existing land cell, returning the previous holder
    ///
    /// Ocean cells are left untouched and yield `Ok(None)`.
    pub fn set_owner(&mut self, coord: GridCoord, owner: CellOwner) -> Result<Option<CellOwner>> {
        let oob = self.out_of_bounds(coord);
        let slot = self.cells.get_mut(coord).ok_or(oob)?;
        match slot {
            Some(previous) => {
                let old = *previous;
                *previous = owner;
                Ok(Some(old))
            }
            None => Ok(None),
        }
    }

    /// Land cells with their holders, row-major
    pub fn land_cells(&self) -> impl Iterator<Item = (GridCoord, CellOwner)> + '_ {
        self.cells
            .iter()
            .filter_map(|(coord, cell)| cell.map(|owner| (coord, owner)))
    }

    pub fn cells_owned_by(&self, faction: FactionId) -> Vec<GridCoord> {
        self.land_cells()
            .filter(|(_, owner)| owner.is(faction))
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Number of cells held by each faction
    pub fn territory_counts(&self) -> BTreeMap<FactionId, usize> {
        let mut counts = BTreeMap::new();
        for (_, owner) in self.land_cells() {
            if let Some(faction) = owner.faction() {
                *counts.entry(faction).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Per-cell control intensity in [0, 100]
///
/// Meaningful for land cells only; every write is clamped.
#[derive(Debug, Clone)]
pub struct ControlField {
    values: Grid<f64>,
}

impl ControlField {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Seed every land cell of `territory` with `initial` control
    pub fn for_territory(territory: &TerritoryGrid, initial: f64) -> Self {
        let mut values = Grid::new(territory.width(), territory.height());
        for (coord, _) in territory.land_cells() {
            values.set(coord, initial.clamp(Self::MIN, Self::MAX));
        }
        Self { values }
    }

    pub fn get(&self, coord: GridCoord) -> Option<f64> {
        self.values.get(coord).copied()
    }

    /// Overwrite a cell's control, clamped; returns false out of bounds
    pub fn set(&mut self, coord: GridCoord, value: f64) -> bool {
        self.values.set(coord, value.clamp(Self::MIN, Self::MAX))
    }

    /// Add a signed delta and clamp, returning the new value
    pub fn apply_delta(&mut self, coord: GridCoord, delta: f64) -> Option<f64> {
        let slot = self.values.get_mut(coord)?;
        *slot = (*slot + delta).clamp(Self::MIN, Self::MAX);
        Some(*slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, f64)> + '_ {
        self.values.iter().map(|(coord, v)| (coord, *v))
    }
}
