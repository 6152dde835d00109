//! Simulation driver: fixed-interval control ticks and the external interface

pub mod events;
pub mod tick;

pub use events::{OwnerChange, SimulationEvent};
pub use tick::SimulationState;
