//! Events produced by the simulation for the presentation layer

use serde::{Deserialize, Serialize};

use crate::campaign::auto_capture::AutoCaptureEvent;
use crate::campaign::influence::AttritionReport;
use crate::core::error::CaptureRejection;
use crate::core::types::{CityId, FactionId, GridCoord, Tick};
use crate::spatial::territory::CellOwner;

pub use crate::campaign::capture::OwnerChange;

/// Events generated during a simulation tick
///
/// Returned by `SimulationState::tick` in the order they happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    /// A cell changed hands; recolor it
    CellOwnerChanged { tick: Tick, change: OwnerChange },
    /// The cell under a city changed hands
    CityCaptured {
        tick: Tick,
        city: CityId,
        name: String,
        coord: GridCoord,
        previous: CellOwner,
        owner: CellOwner,
    },
    /// A unit lost troops outside friendly territory
    UnitAttrition { tick: Tick, report: AttritionReport },
    /// Orchestrator progress (operation start, assignments, releases)
    AutoCapture(AutoCaptureEvent),
    /// A capture request was refused before drafting
    CaptureRejected {
        faction: FactionId,
        reason: CaptureRejection,
    },
}

impl SimulationEvent {
    /// Whether this event should trigger a redraw of the territory layer
    pub fn changes_territory(&self) -> bool {
        matches!(self, Self::CellOwnerChanged { .. } | Self::CityCaptured { .. })
    }
}
