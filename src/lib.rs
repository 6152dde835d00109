//! Frontline - territorial control simulation
//!
//! Factions own cells of a world grid. Units project influence onto the
//! cells around them and, once a cell's control is driven to an extreme,
//! the dominant occupant takes it over.

pub mod campaign;
pub mod core;
pub mod simulation;
pub mod spatial;
