//! Campaign layer: units, supply, influence and capture on the world map

pub mod auto_capture;
pub mod capture;
pub mod influence;
pub mod overlay;
pub mod supply;
pub mod units;

pub use auto_capture::{AutoCaptureEvent, AutoCaptureOrchestrator, CaptureScope, Selection};
pub use capture::{resolve_captures, Dominance, OwnerChange};
pub use influence::{AttritionReport, InfluenceEngine};
pub use overlay::{control_overlay, OverlayCell};
pub use supply::{City, SupplyNetwork};
pub use units::{Arrival, MovementState, Unit, UnitDirectory, UnitRoster, UnitSnapshot};
