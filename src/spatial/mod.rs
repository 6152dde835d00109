pub mod grid;
pub mod occupation;
pub mod territory;

pub use grid::{Grid, GridGeometry};
pub use occupation::OccupationIndex;
pub use territory::{CellOwner, ControlField, TerritoryGrid};
