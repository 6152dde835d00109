//! Control overlay
//!
//! Read-only view of the control field for rendering. Only cells that are
//! actually in play (strictly between the two thresholds) are reported.
//! Opacity peaks at the midpoint and fades toward either extreme.

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, GridCoord};
use crate::spatial::territory::{CellOwner, ControlField, TerritoryGrid};

pub const FRIENDLY_TINT: u32 = 0x00aa00;
pub const HOSTILE_TINT: u32 = 0xaa0000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayCell {
    pub coord: GridCoord,
    pub control: f64,
    pub alpha: f64,
    /// RGB tint relative to the viewing faction
    pub tint: u32,
}

/// Opacity for a control value: 0.5 at 50, 0 at either end
pub fn overlay_alpha(control: f64) -> f64 {
    (0.5 - (control - 50.0).abs() / 100.0).clamp(0.0, 0.5)
}

/// Cells with partial control as seen by `viewer`
pub fn control_overlay(territory: &TerritoryGrid, control: &ControlField, viewer: FactionId) -> Vec<OverlayCell> {
    territory
        .land_cells()
        .filter_map(|(coord, owner)| {
            let value = control.get(coord)?;
            if value <= ControlField::MIN || value >= ControlField::MAX {
                return None;
            }
            let tint = match owner {
                CellOwner::Faction(f) if f == viewer => FRIENDLY_TINT,
                _ => HOSTILE_TINT,
            };
            Some(OverlayCell {
                coord,
                control: value,
                alpha: overlay_alpha(value),
                tint,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;

    #[test]
    fn test_alpha_curve() {
        assert_eq!(overlay_alpha(50.0), 0.5);
        assert_eq!(overlay_alpha(100.0), 0.0);
        assert_eq!(overlay_alpha(0.0), 0.0);
        assert!((overlay_alpha(75.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_overlay_reports_partial_cells_only() {
        let territory = TerritoryGrid::from_ascii(&["AB.", "nAB"], 1.0, Vec2::default());
        let mut control = ControlField::for_territory(&territory, 100.0);
        control.set(GridCoord::new(0, 0), 40.0);
        control.set(GridCoord::new(1, 0), 60.0);
        control.set(GridCoord::new(0, 1), 0.0);

        let overlay = control_overlay(&territory, &control, FactionId(1));
        assert_eq!(overlay.len(), 2);

        let own = overlay.iter().find(|c| c.coord == GridCoord::new(0, 0)).unwrap();
        assert_eq!(own.tint, FRIENDLY_TINT);
        assert!((own.alpha - 0.4).abs() < 1e-12);

        let enemy = overlay.iter().find(|c| c.coord == GridCoord::new(1, 0)).unwrap();
        assert_eq!(enemy.tint, HOSTILE_TINT);
    }
}
