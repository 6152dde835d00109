pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{CaptureRejection, FrontlineError, Result};
pub use types::{CityId, FactionId, GridCoord, OperationId, Tick, UnitId, Vec2, WorldRect};
