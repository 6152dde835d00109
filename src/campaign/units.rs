//! Units and the directory that owns them
//!
//! The simulation core never creates or destroys units. It reads an
//! enumerable snapshot each tick, writes back troop counts, and drives
//! movement through the `UnitDirectory` seam. `UnitRoster` is the
//! in-memory directory used by the headless runner and the tests.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::RosterConfig;
use crate::core::types::{FactionId, GridCoord, UnitId, Vec2};

/// Smallest troop count a unit can be reduced to
pub const MIN_TROOPS: f64 = 1.0;

/// Movement state machine: `Idle -> EnRoute -> Arrived -> Idle | EnRoute`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementState {
    Idle,
    EnRoute { destination: Vec2, speed: f32 },
    Arrived { at: Vec2 },
}

/// A unit on the world map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub faction: FactionId,
    pub troop_count: f64,
    pub position: Vec2,
    pub movement: MovementState,
    pub auto_capture_target: Option<GridCoord>,
    /// Bumped by every `move_to`/`stop`; arrivals carry the value they were issued under
    pub order_seq: u64,
}

impl Unit {
    pub fn new(id: UnitId, faction: FactionId, position: Vec2, troop_count: f64) -> Self {
        Self {
            id,
            faction,
            troop_count: troop_count.max(MIN_TROOPS),
            position,
            movement: MovementState::Idle,
            auto_capture_target: None,
            order_seq: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.movement, MovementState::EnRoute { .. })
    }

    /// Step toward the current destination; returns true on arrival
    fn advance(&mut self, dt_secs: f32) -> bool {
        let MovementState::EnRoute { destination, speed } = self.movement else {
            return false;
        };

        let remaining = self.position.distance(&destination);
        let step = speed * dt_secs;
        if remaining <= step {
            self.position = destination;
            self.movement = MovementState::Arrived { at: destination };
            return true;
        }

        let direction = (destination - self.position).normalize();
        self.position = self.position + direction * step;
        false
    }
}

/// Per-tick read-only view of a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub faction: FactionId,
    pub position: Vec2,
    pub troop_count: f64,
}

impl From<&Unit> for UnitSnapshot {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            faction: unit.faction,
            position: unit.position,
            troop_count: unit.troop_count,
        }
    }
}

/// Movement completion reported by `advance_movement`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    pub unit: UnitId,
    pub position: Vec2,
    pub order_seq: u64,
}

/// Owner of unit entities, consumed by the simulation core
pub trait UnitDirectory {
    /// All units as they stand right now
    fn snapshot(&self) -> Vec<UnitSnapshot>;

    fn unit(&self, id: UnitId) -> Option<&Unit>;

    /// Write a troop count back; implementations floor it at `MIN_TROOPS`
    fn set_troop_count(&mut self, id: UnitId, troops: f64) -> bool;

    fn set_auto_capture_target(&mut self, id: UnitId, target: Option<GridCoord>) -> bool;

    /// Start moving toward `destination`; returns the new order sequence
    fn move_to(&mut self, id: UnitId, destination: Vec2, speed: f32) -> Option<u64>;

    /// Halt immediately where the unit stands; pending arrivals are dropped
    fn stop(&mut self, id: UnitId) -> bool;

    /// Interpolate every moving unit and report the ones that arrived
    fn advance_movement(&mut self, dt_secs: f32) -> Vec<Arrival>;
}

/// In-memory unit directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRoster {
    units: Vec<Unit>,
    next_unit_id: u32,
}

impl UnitRoster {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            next_unit_id: 1,
        }
    }

    /// Spawn a new unit
    pub fn spawn(&mut self, faction: FactionId, position: Vec2, troops: f64) -> UnitId {
        let id = UnitId(self.next_unit_id.max(1));
        self.next_unit_id = id.0 + 1;
        self.units.push(Unit::new(id, faction, position, troops));
        id
    }

    /// Remove a unit (destroyed by the game layer)
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let idx = self.units.iter().position(|u| u.id == id)?;
        Some(self.units.remove(idx))
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units_of(&self, faction: FactionId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.faction == faction)
            .map(|u| u.id)
            .collect()
    }

    pub fn total_troops(&self, faction: FactionId) -> f64 {
        self.units
            .iter()
            .filter(|u| u.faction == faction)
            .map(|u| u.troop_count)
            .sum()
    }

    /// Split a unit roughly in half, in whole increments
    ///
    /// Needs at least two increments of troops and both halves must keep a
    /// full increment. The new unit is placed diagonally beside its parent.
    pub fn split_unit(&mut self, id: UnitId, config: &RosterConfig) -> Option<UnitId> {
        let unit = self.get(id)?;
        let total = unit.troop_count;
        let increment = config.split_increment;
        if total < increment * 2.0 {
            return None;
        }

        let first = (total / 2.0 / increment).floor() * increment;
        let second = total - first;
        if first < increment || second < increment {
            return None;
        }

        let faction = unit.faction;
        let position = unit.position + Vec2::new(config.split_offset, config.split_offset);
        if let Some(parent) = self.get_mut(id) {
            parent.troop_count = first;
        }
        Some(self.spawn(faction, position, second))
    }

    /// Break every unit of a faction into increment-sized groups
    ///
    /// Leftover troops below one increment stay with the original unit.
    /// New units are scattered within `split_offset` of their parent.
    pub fn split_all<R: Rng>(&mut self, faction: FactionId, config: &RosterConfig, rng: &mut R) -> Vec<UnitId> {
        let increment = config.split_increment;
        let spread = config.split_offset.abs();
        let mut spawned = Vec::new();

        for id in self.units_of(faction) {
            let Some(unit) = self.get(id) else { continue };
            let groups = (unit.troop_count / increment).floor() as u64;
            if groups <= 1 {
                continue;
            }

            let origin = unit.position;
            let remainder = unit.troop_count - groups as f64 * increment;
            if let Some(parent) = self.get_mut(id) {
                parent.troop_count = increment + remainder;
            }

            for _ in 1..groups {
                let offset = if spread > 0.0 {
                    Vec2::new(rng.gen_range(-spread..=spread), rng.gen_range(-spread..=spread))
                } else {
                    Vec2::default()
                };
                spawned.push(self.spawn(faction, origin + offset, increment));
            }
        }
        spawned
    }
}

impl UnitDirectory for UnitRoster {
    fn snapshot(&self) -> Vec<UnitSnapshot> {
        self.units.iter().map(UnitSnapshot::from).collect()
    }

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.get(id)
    }

    fn set_troop_count(&mut self, id: UnitId, troops: f64) -> bool {
        match self.get_mut(id) {
            Some(unit) => {
                unit.troop_count = troops.max(MIN_TROOPS);
                true
            }
            None => false,
        }
    }

    fn set_auto_capture_target(&mut self, id: UnitId, target: Option<GridCoord>) -> bool {
        match self.get_mut(id) {
            Some(unit) => {
                unit.auto_capture_target = target;
                true
            }
            None => false,
        }
    }

    fn move_to(&mut self, id: UnitId, destination: Vec2, speed: f32) -> Option<u64> {
        let unit = self.get_mut(id)?;
        unit.order_seq += 1;
        unit.movement = MovementState::EnRoute { destination, speed };
        Some(unit.order_seq)
    }

    fn stop(&mut self, id: UnitId) -> bool {
        match self.get_mut(id) {
            Some(unit) => {
                unit.order_seq += 1;
                unit.movement = MovementState::Idle;
                true
            }
            None => false,
        }
    }

    fn advance_movement(&mut self, dt_secs: f32) -> Vec<Arrival> {
        if dt_secs <= 0.0 {
            return Vec::new();
        }

        self.units
            .iter_mut()
            .filter_map(|unit| {
                unit.advance(dt_secs).then(|| Arrival {
                    unit: unit.id,
                    position: unit.position,
                    order_seq: unit.order_seq,
                })
            })
            .collect()
    }
}
