//! Auto-capture orchestrator
//!
//! Drafts a selection of units into an operation with a shared pending set
//! of target cells. Each drafted unit claims the nearest unclaimed target,
//! travels to its center at a constant speed, holds briefly on arrival and
//! then claims the next one. A claimed cell leaves the pending set at once,
//! so two units of one operation never chase the same cell.
//!
//! Per-unit state moves `EnRoute -> Holding -> EnRoute | released`. Both
//! moving and holding remember the order sequence the unit was under, so
//! any order issued by someone else in between releases the unit. All
//! transitions happen inside synchronous calls from the tick handler.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::capture::OwnerChange;
use super::units::UnitDirectory;
use crate::core::config::AutoCaptureConfig;
use crate::core::error::CaptureRejection;
use crate::core::types::{FactionId, GridCoord, OperationId, UnitId, WorldRect};
use crate::spatial::territory::TerritoryGrid;

/// Units chosen by a faction for an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub faction: FactionId,
    pub units: Vec<UnitId>,
}

impl Selection {
    pub fn new(faction: FactionId, units: Vec<UnitId>) -> Self {
        Self { faction, units }
    }
}

/// What an operation was started against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CaptureScope {
    Country(FactionId),
    Area(WorldRect),
}

/// One running operation
#[derive(Debug, Clone)]
pub struct CaptureOperation {
    pub id: OperationId,
    pub faction: FactionId,
    pub scope: CaptureScope,
    /// Targets not yet claimed by any unit
    pub pending: Vec<GridCoord>,
    pub drafted: BTreeSet<UnitId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DraftPhase {
    /// Drafted, first target not yet claimed
    Awaiting,
    EnRoute { target: GridCoord, order_seq: u64 },
    Holding {
        target: GridCoord,
        order_seq: u64,
        remaining: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Draft {
    operation: OperationId,
    phase: DraftPhase,
}

/// Notifications produced by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AutoCaptureEvent {
    OperationStarted {
        operation: OperationId,
        faction: FactionId,
        targets: usize,
        units: usize,
    },
    TargetAssigned {
        operation: OperationId,
        unit: UnitId,
        target: GridCoord,
    },
    UnitReleased {
        operation: OperationId,
        unit: UnitId,
    },
    OperationFinished {
        operation: OperationId,
    },
}

#[derive(Debug, Default)]
pub struct AutoCaptureOrchestrator {
    operations: BTreeMap<OperationId, CaptureOperation>,
    drafts: BTreeMap<UnitId, Draft>,
    next_operation_id: u32,
}

impl AutoCaptureOrchestrator {
    pub fn new() -> Self {
        Self {
            operations: BTreeMap::new(),
            drafts: BTreeMap::new(),
            next_operation_id: 1,
        }
    }

    pub fn operation(&self, id: OperationId) -> Option<&CaptureOperation> {
        self.operations.get(&id)
    }

    pub fn operations(&self) -> impl Iterator<Item = &CaptureOperation> {
        self.operations.values()
    }

    pub fn is_drafted(&self, unit: UnitId) -> bool {
        self.drafts.contains_key(&unit)
    }

    pub fn operation_of(&self, unit: UnitId) -> Option<OperationId> {
        self.drafts.get(&unit).map(|d| d.operation)
    }

    /// Target currently claimed by a drafted unit
    pub fn target_of(&self, unit: UnitId) -> Option<GridCoord> {
        self.drafts.get(&unit).and_then(|d| match d.phase {
            DraftPhase::Awaiting => None,
            DraftPhase::EnRoute { target, .. } | DraftPhase::Holding { target, .. } => Some(target),
        })
    }

    /// Draft `selection` into an operation against every cell of `target`
    pub fn start_country_capture<D: UnitDirectory>(
        &mut self,
        selection: &Selection,
        target: FactionId,
        territory: &TerritoryGrid,
        units: &mut D,
        config: &AutoCaptureConfig,
    ) -> Result<(OperationId, Vec<AutoCaptureEvent>), CaptureRejection> {
        if target == selection.faction {
            tracing::warn!("Faction {} asked to capture itself", target.0);
            return Err(CaptureRejection::OwnFaction(target));
        }
        let targets = territory.cells_owned_by(target);
        self.start(selection, CaptureScope::Country(target), targets, territory, units, config)
    }

    /// Draft `selection` into an operation against foreign land inside `rect`
    pub fn start_area_capture<D: UnitDirectory>(
        &mut self,
        selection: &Selection,
        rect: WorldRect,
        territory: &TerritoryGrid,
        units: &mut D,
        config: &AutoCaptureConfig,
    ) -> Result<(OperationId, Vec<AutoCaptureEvent>), CaptureRejection> {
        let targets = match territory.geometry().cell_range(&rect) {
            Some((min, max)) => (min.y..=max.y)
                .flat_map(|y| (min.x..=max.x).map(move |x| GridCoord::new(x, y)))
                .filter(|c| territory.is_land(*c) && !territory.is_owned_by(*c, selection.faction))
                .collect(),
            None => Vec::new(),
        };
        self.start(selection, CaptureScope::Area(rect), targets, territory, units, config)
    }

    fn start<D: UnitDirectory>(
        &mut self,
        selection: &Selection,
        scope: CaptureScope,
        targets: Vec<GridCoord>,
        territory: &TerritoryGrid,
        units: &mut D,
        config: &AutoCaptureConfig,
    ) -> Result<(OperationId, Vec<AutoCaptureEvent>), CaptureRejection> {
        let mut seen = BTreeSet::new();
        let eligible: Vec<UnitId> = selection
            .units
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| units.unit(*id).is_some_and(|u| u.faction == selection.faction))
            .collect();

        if eligible.is_empty() {
            tracing::warn!("Auto-capture for faction {} refused: no units", selection.faction.0);
            return Err(CaptureRejection::NoUnits);
        }
        if targets.is_empty() {
            tracing::warn!("Auto-capture for faction {} refused: no targets", selection.faction.0);
            return Err(CaptureRejection::NoTargets);
        }

        let mut events = Vec::new();
        for id in &eligible {
            events.extend(self.cancel(*id, units));
        }

        let id = OperationId(self.next_operation_id.max(1));
        self.next_operation_id = id.0 + 1;

        tracing::info!(
            "Operation {} started: faction {} drafts {} units against {} cells",
            id.0,
            selection.faction.0,
            eligible.len(),
            targets.len()
        );
        events.push(AutoCaptureEvent::OperationStarted {
            operation: id,
            faction: selection.faction,
            targets: targets.len(),
            units: eligible.len(),
        });

        self.operations.insert(
            id,
            CaptureOperation {
                id,
                faction: selection.faction,
                scope,
                pending: targets,
                drafted: eligible.iter().copied().collect(),
            },
        );
        for unit in &eligible {
            self.drafts.insert(
                *unit,
                Draft {
                    operation: id,
                    phase: DraftPhase::Awaiting,
                },
            );
        }
        for unit in eligible {
            events.extend(self.assign_next(unit, territory, units, config));
        }

        Ok((id, events))
    }

    /// Claim the nearest free target for `unit` and send it there, or release it
    fn assign_next<D: UnitDirectory>(
        &mut self,
        unit_id: UnitId,
        territory: &TerritoryGrid,
        units: &mut D,
        config: &AutoCaptureConfig,
    ) -> Vec<AutoCaptureEvent> {
        let Some(draft) = self.drafts.get(&unit_id).copied() else {
            return Vec::new();
        };
        let Some(unit) = units.unit(unit_id) else {
            tracing::warn!("Drafted unit {:?} no longer exists; dropping it", unit_id);
            return self.release(unit_id, units);
        };

        let geometry = territory.geometry();
        let origin = geometry.world_to_cell_clamped(unit.position);
        let position = unit.position;

        let Some(operation) = self.operations.get_mut(&draft.operation) else {
            return self.release(unit_id, units);
        };

        let nearest = operation
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| OrderedFloat(origin.distance(c)))
            .map(|(i, c)| (i, *c));

        let Some((index, target)) = nearest else {
            tracing::info!("Unit {:?} found no targets left; leaving operation {}", unit_id, draft.operation.0);
            return self.release(unit_id, units);
        };
        operation.pending.remove(index);
        let operation_id = operation.id;

        let destination = geometry.cell_center(target);
        let Some(order_seq) = units.move_to(unit_id, destination, config.travel_speed) else {
            return self.release(unit_id, units);
        };
        units.set_auto_capture_target(unit_id, Some(target));
        self.drafts.insert(
            unit_id,
            Draft {
                operation: operation_id,
                phase: DraftPhase::EnRoute { target, order_seq },
            },
        );

        tracing::debug!(
            "Unit {:?} assigned cell ({}, {}), {:.1} units away",
            unit_id,
            target.x,
            target.y,
            position.distance(&destination)
        );
        vec![AutoCaptureEvent::TargetAssigned {
            operation: operation_id,
            unit: unit_id,
            target,
        }]
    }

    /// Remove a unit from its operation and clear its target; discards emptied operations
    fn release<D: UnitDirectory>(&mut self, unit_id: UnitId, units: &mut D) -> Vec<AutoCaptureEvent> {
        let Some(draft) = self.drafts.remove(&unit_id) else {
            return Vec::new();
        };
        units.set_auto_capture_target(unit_id, None);

        let mut events = vec![AutoCaptureEvent::UnitReleased {
            operation: draft.operation,
            unit: unit_id,
        }];

        let finished = match self.operations.get_mut(&draft.operation) {
            Some(operation) => {
                operation.drafted.remove(&unit_id);
                operation.drafted.is_empty()
            }
            None => false,
        };
        if finished {
            self.operations.remove(&draft.operation);
            tracing::info!("Operation {} finished", draft.operation.0);
            events.push(AutoCaptureEvent::OperationFinished {
                operation: draft.operation,
            });
        }
        events
    }

    /// Movement completion for `unit`; stale or foreign orders drop the draft
    pub fn on_arrival<D: UnitDirectory>(
        &mut self,
        unit_id: UnitId,
        order_seq: u64,
        territory: &TerritoryGrid,
        units: &mut D,
        config: &AutoCaptureConfig,
    ) -> Vec<AutoCaptureEvent> {
        let Some(draft) = self.drafts.get_mut(&unit_id) else {
            return Vec::new();
        };

        match draft.phase {
            DraftPhase::EnRoute { target, order_seq: issued } if issued == order_seq => {
                draft.phase = DraftPhase::Holding {
                    target,
                    order_seq,
                    remaining: config.reassign_delay_secs,
                };
                if config.reassign_delay_secs <= 0.0 {
                    return self.assign_next(unit_id, territory, units, config);
                }
                Vec::new()
            }
            _ => {
                tracing::debug!("Unit {:?} arrived under a foreign order; releasing", unit_id);
                self.release(unit_id, units)
            }
        }
    }

    /// Count down holds and reassign units whose hold has expired
    pub fn update<D: UnitDirectory>(
        &mut self,
        dt_secs: f32,
        territory: &TerritoryGrid,
        units: &mut D,
        config: &AutoCaptureConfig,
    ) -> Vec<AutoCaptureEvent> {
        if dt_secs <= 0.0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        let vanished: Vec<UnitId> = self
            .drafts
            .keys()
            .copied()
            .filter(|id| units.unit(*id).is_none())
            .collect();
        for id in vanished {
            tracing::warn!("Drafted unit {:?} no longer exists; dropping it", id);
            events.extend(self.release(id, units));
        }

        let mut ready = Vec::new();
        for (id, draft) in self.drafts.iter_mut() {
            if let DraftPhase::Holding {
                remaining, order_seq, ..
            } = &mut draft.phase
            {
                *remaining -= dt_secs;
                if *remaining <= 0.0 {
                    ready.push((*id, *order_seq));
                }
            }
        }

        for (id, held_seq) in ready {
            if units.unit(id).map(|u| u.order_seq) != Some(held_seq) {
                tracing::debug!("Unit {:?} was given another order while holding; releasing", id);
                events.extend(self.release(id, units));
                continue;
            }
            events.extend(self.assign_next(id, territory, units, config));
        }
        events
    }

    /// Cancel one unit's draft, halting its movement immediately
    pub fn cancel<D: UnitDirectory>(&mut self, unit_id: UnitId, units: &mut D) -> Vec<AutoCaptureEvent> {
        if !self.drafts.contains_key(&unit_id) {
            return Vec::new();
        }
        units.stop(unit_id);
        self.release(unit_id, units)
    }

    /// Cancel every draft of every operation
    pub fn cancel_all<D: UnitDirectory>(&mut self, units: &mut D) -> Vec<AutoCaptureEvent> {
        let drafted: Vec<UnitId> = self.drafts.keys().copied().collect();
        drafted
            .into_iter()
            .flat_map(|id| self.cancel(id, units))
            .collect()
    }

    /// Drop a freshly captured cell from the pending set of the capturing faction
    pub fn on_cell_captured(&mut self, change: &OwnerChange) {
        let Some(faction) = change.new_faction() else {
            return;
        };
        for operation in self.operations.values_mut().filter(|o| o.faction == faction) {
            operation.pending.retain(|c| *c != change.coord);
        }
    }
}
