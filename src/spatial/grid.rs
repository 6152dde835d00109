//! Generic grid for spatial data

use crate::core::error::{FrontlineError, Result};
use crate::core::types::{GridCoord, Vec2, WorldRect};

/// World placement of a fixed-size cell grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub origin: Vec2,
}

impl GridGeometry {
    pub fn new(width: usize, height: usize, cell_size: f32, origin: Vec2) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin,
        }
    }

    /// Size the grid from the world-map pixel extent, one cell per `cell_size`
    pub fn from_world_size(world_width: f32, world_height: f32, cell_size: f32, origin: Vec2) -> Self {
        let width = (world_width / cell_size).floor().max(1.0) as usize;
        let height = (world_height / cell_size).floor().max(1.0) as usize;
        Self::new(width, height, cell_size, origin)
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Validate a signed coordinate against the grid
    pub fn checked(&self, x: i64, y: i64) -> Result<GridCoord> {
        if self.in_bounds(x, y) {
            Ok(GridCoord::new(x as usize, y as usize))
        } else {
            Err(FrontlineError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Convert world position to cell coordinates, `None` outside the grid
    /// or for non-finite positions
    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> Option<GridCoord> {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return None;
        }
        let x = ((pos.x - self.origin.x) / self.cell_size).floor() as i64;
        let y = ((pos.y - self.origin.y) / self.cell_size).floor() as i64;
        self.in_bounds(x, y).then(|| GridCoord::new(x as usize, y as usize))
    }

    /// Convert world position to the nearest cell, clamping to the grid edge
    #[inline]
    pub fn world_to_cell_clamped(&self, pos: Vec2) -> GridCoord {
        let x = ((pos.x - self.origin.x) / self.cell_size).floor() as i64;
        let y = ((pos.y - self.origin.y) / self.cell_size).floor() as i64;
        GridCoord::new(
            x.clamp(0, self.width as i64 - 1) as usize,
            y.clamp(0, self.height as i64 - 1) as usize,
        )
    }

    /// Cell center in world coordinates
    pub fn cell_center(&self, coord: GridCoord) -> Vec2 {
        Vec2::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.cell_size,
            self.origin.y + (coord.y as f32 + 0.5) * self.cell_size,
        )
    }

    /// Inclusive cell range covered by a world rectangle, clamped to the grid
    ///
    /// Returns `None` when the rectangle lies entirely outside the map.
    pub fn cell_range(&self, rect: &WorldRect) -> Option<(GridCoord, GridCoord)> {
        let right = self.origin.x + self.width as f32 * self.cell_size;
        let bottom = self.origin.y + self.height as f32 * self.cell_size;
        if rect.max.x < self.origin.x || rect.max.y < self.origin.y || rect.min.x >= right || rect.min.y >= bottom {
            return None;
        }
        Some((
            self.world_to_cell_clamped(rect.min),
            self.world_to_cell_clamped(rect.max),
        ))
    }

    /// Cells of the 3x3 block around `center` that fall inside the grid, with offsets
    pub fn neighborhood(&self, center: GridCoord) -> impl Iterator<Item = (i32, i32, GridCoord)> + '_ {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                let coord = center.offset(dx, dy)?;
                (coord.x < self.width && coord.y < self.height).then_some((dx, dy, coord))
            })
        })
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| GridCoord::new(x, y)))
    }
}

/// Generic dense 2D grid
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn get(&self, coord: GridCoord) -> Option<&T> {
        if coord.x < self.width && coord.y < self.height {
            Some(&self.data[coord.y * self.width + coord.x])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, coord: GridCoord) -> Option<&mut T> {
        if coord.x < self.width && coord.y < self.height {
            Some(&mut self.data[coord.y * self.width + coord.x])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, coord: GridCoord, value: T) -> bool {
        match self.get_mut(coord) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Reset every cell to its default value
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = T::default());
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (GridCoord::new(i % width, i / width), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry::new(5, 4, 10.0, Vec2::new(-20.0, 0.0))
    }

    #[test]
    fn test_from_world_size() {
        let g = GridGeometry::from_world_size(360.0, 170.0, 4.0, Vec2::default());
        assert_eq!(g.width, 90);
        assert_eq!(g.height, 42);
    }

    #[test]
    fn test_world_to_cell_rejects_outside() {
        let g = geometry();
        assert_eq!(g.world_to_cell(Vec2::new(-20.0, 0.0)), Some(GridCoord::new(0, 0)));
        assert_eq!(g.world_to_cell(Vec2::new(29.9, 39.9)), Some(GridCoord::new(4, 3)));
        assert_eq!(g.world_to_cell(Vec2::new(-20.1, 5.0)), None);
        assert_eq!(g.world_to_cell(Vec2::new(30.0, 5.0)), None);
    }

    #[test]
    fn test_world_to_cell_rejects_non_finite() {
        let g = geometry();
        assert_eq!(g.world_to_cell(Vec2::new(f32::NAN, 5.0)), None);
        assert_eq!(g.world_to_cell(Vec2::new(-15.0, f32::NAN)), None);
        assert_eq!(g.world_to_cell(Vec2::new(f32::INFINITY, 5.0)), None);
        assert_eq!(g.world_to_cell(Vec2::new(-15.0, f32::NEG_INFINITY)), None);
    }

    #[test]
    fn test_checked_reports_bounds() {
        let g = geometry();
        assert!(g.checked(4, 3).is_ok());
        assert!(matches!(
            g.checked(5, 0),
            Err(FrontlineError::OutOfBounds { x: 5, y: 0, .. })
        ));
        assert!(g.checked(-1, 0).is_err());
    }

    #[test]
    fn test_cell_center_round_trips() {
        let g = geometry();
        let c = GridCoord::new(3, 2);
        assert_eq!(g.world_to_cell(g.cell_center(c)), Some(c));
    }

    #[test]
    fn test_cell_range_clamps() {
        let g = geometry();
        let rect = WorldRect::from_corners(Vec2::new(-100.0, 15.0), Vec2::new(5.0, 500.0));
        let (min, max) = g.cell_range(&rect).unwrap();
        assert_eq!(min, GridCoord::new(0, 1));
        assert_eq!(max, GridCoord::new(2, 3));

        let off_map = WorldRect::from_corners(Vec2::new(100.0, 0.0), Vec2::new(200.0, 10.0));
        assert!(g.cell_range(&off_map).is_none());
    }

    #[test]
    fn test_neighborhood_at_corner() {
        let g = geometry();
        let cells: Vec<_> = g.neighborhood(GridCoord::new(0, 0)).collect();
        assert_eq!(cells.len(), 4);
        let center: Vec<_> = g.neighborhood(GridCoord::new(2, 2)).collect();
        assert_eq!(center.len(), 9);
    }

    #[test]
    fn test_grid_get_set() {
        let mut grid: Grid<u8> = Grid::new(3, 3);
        assert!(grid.set(GridCoord::new(2, 1), 7));
        assert_eq!(grid.get(GridCoord::new(2, 1)), Some(&7));
        assert!(!grid.set(GridCoord::new(3, 0), 1));
        assert_eq!(grid.get(GridCoord::new(0, 3)), None);
        grid.clear();
        assert_eq!(grid.get(GridCoord::new(2, 1)), Some(&0));
    }
}
