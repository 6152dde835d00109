//! Tick system - orchestrates territorial control updates
//!
//! Frame deltas drive unit movement and the auto-capture orchestrator
//! directly. Hold timers count down before movement advances, so a hold
//! that starts on an arrival first shrinks on the following frame; the
//! reassign delay is therefore frame-granular.
//!
//! Control work is gated to a fixed interval: elapsed time is accumulated
//! and, once it reaches the interval, one control tick runs:
//! occupation rebuild -> supply + attrition + influence accumulation ->
//! influence application -> capture resolution.
//!
//! All influence for a control tick is applied before any capture is
//! evaluated, and every capture of a tick resolves before the next one.

use rand::Rng;

use super::events::{OwnerChange, SimulationEvent};
use crate::campaign::auto_capture::{AutoCaptureEvent, AutoCaptureOrchestrator, Selection};
use crate::campaign::capture::resolve_captures;
use crate::campaign::influence::InfluenceEngine;
use crate::campaign::overlay::{control_overlay, OverlayCell};
use crate::campaign::supply::SupplyNetwork;
use crate::campaign::units::{UnitDirectory, UnitRoster};
use crate::core::config::SimulationConfig;
use crate::core::error::{CaptureRejection, FrontlineError, Result};
use crate::core::types::{CityId, FactionId, OperationId, Tick, UnitId, Vec2, WorldRect};
use crate::spatial::occupation::OccupationIndex;
use crate::spatial::territory::{CellOwner, ControlField, TerritoryGrid};

type OwnerListener = Box<dyn FnMut(&OwnerChange)>;

/// Complete territorial simulation state
///
/// Owns the grid, the control field and the per-tick scratch structures.
/// Units live in the directory `D`; the simulation only reads snapshots,
/// writes troop counts back and issues movement orders.
pub struct SimulationState<D: UnitDirectory = UnitRoster> {
    config: SimulationConfig,
    territory: TerritoryGrid,
    control: ControlField,
    occupation: OccupationIndex,
    engine: InfluenceEngine,
    supply: SupplyNetwork,
    orchestrator: AutoCaptureOrchestrator,
    units: D,
    /// Simulated milliseconds not yet consumed by a control tick
    accumulator_ms: f64,
    current_tick: Tick,
    /// Orchestrator events raised outside `tick`, returned with the next one
    queued: Vec<SimulationEvent>,
    listeners: Vec<OwnerListener>,
}

impl<D: UnitDirectory> SimulationState<D> {
    /// Build the simulation over a finished territory grid
    pub fn new(territory: TerritoryGrid, units: D, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let control = ControlField::for_territory(&territory, config.control.initial_control);
        let engine = InfluenceEngine::new(territory.width(), territory.height());

        tracing::info!(
            "Simulation ready: {}x{} grid, {} land cells",
            territory.width(),
            territory.height(),
            territory.land_cells().count()
        );

        Ok(Self {
            config,
            territory,
            control,
            occupation: OccupationIndex::new(),
            engine,
            supply: SupplyNetwork::new(),
            orchestrator: AutoCaptureOrchestrator::new(),
            units,
            accumulator_ms: 0.0,
            current_tick: 0,
            queued: Vec::new(),
            listeners: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn territory(&self) -> &TerritoryGrid {
        &self.territory
    }

    pub fn control(&self) -> &ControlField {
        &self.control
    }

    pub fn supply(&self) -> &SupplyNetwork {
        &self.supply
    }

    pub fn orchestrator(&self) -> &AutoCaptureOrchestrator {
        &self.orchestrator
    }

    pub fn units(&self) -> &D {
        &self.units
    }

    /// Direct access for the game layer (spawning, removing units)
    pub fn units_mut(&mut self) -> &mut D {
        &mut self.units
    }

    /// Number of control ticks run so far
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Found a city on cell (x, y)
    pub fn add_city(&mut self, name: &str, x: i64, y: i64, capital: bool) -> Result<CityId> {
        let coord = self.territory.geometry().checked(x, y)?;
        Ok(self.supply.add_city(name, coord, capital))
    }

    /// Owner of cell (x, y); `None` for ocean and neutral land
    pub fn get_owner(&self, x: i64, y: i64) -> Result<Option<FactionId>> {
        let coord = self.territory.geometry().checked(x, y)?;
        self.territory.owner(coord)
    }

    /// Full cell state of (x, y); `None` for ocean
    pub fn get_cell(&self, x: i64, y: i64) -> Result<Option<CellOwner>> {
        let coord = self.territory.geometry().checked(x, y)?;
        self.territory.cell(coord)
    }

    /// Control intensity of cell (x, y)
    pub fn get_control(&self, x: i64, y: i64) -> Result<f64> {
        let coord = self.territory.geometry().checked(x, y)?;
        Ok(self.control.get(coord).unwrap_or(ControlField::MIN))
    }

    /// Register a callback fired for every ownership change
    pub fn on_cell_owner_changed<F>(&mut self, callback: F)
    where
        F: FnMut(&OwnerChange) + 'static,
    {
        self.listeners.push(Box::new(callback));
    }

    /// Advance the simulation by `delta_ms` of frame time
    ///
    /// A zero or negative delta changes nothing. Returns the events of this
    /// call, preceded by any raised since the previous one.
    pub fn tick(&mut self, delta_ms: f64) -> Vec<SimulationEvent> {
        let mut events = std::mem::take(&mut self.queued);
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            return events;
        }

        let dt_secs = (delta_ms / 1000.0) as f32;
        let auto = self.config.auto_capture.clone();

        let produced = self
            .orchestrator
            .update(dt_secs, &self.territory, &mut self.units, &auto);
        events.extend(produced.into_iter().map(SimulationEvent::AutoCapture));

        for arrival in self.units.advance_movement(dt_secs) {
            let produced = self.orchestrator.on_arrival(
                arrival.unit,
                arrival.order_seq,
                &self.territory,
                &mut self.units,
                &auto,
            );
            events.extend(produced.into_iter().map(SimulationEvent::AutoCapture));
        }

        self.accumulator_ms += delta_ms;
        if self.accumulator_ms >= self.config.grid.tick_interval_ms {
            let control_dt = self.accumulator_ms / 1000.0;
            self.accumulator_ms = 0.0;
            events.extend(self.control_tick(control_dt));
        }

        events
    }

    /// One fixed-interval control update covering `dt_secs` of simulated time
    fn control_tick(&mut self, dt_secs: f64) -> Vec<SimulationEvent> {
        self.current_tick += 1;
        let tick = self.current_tick;
        let mut events = Vec::new();

        let mut snapshot = self.units.snapshot();
        self.occupation.rebuild(&snapshot, self.territory.geometry());

        let reports = self
            .engine
            .accumulate(&mut snapshot, &self.territory, &self.supply, &self.config, dt_secs);
        for report in reports {
            tracing::trace!(
                "Unit {:?} attrition {:.1} -> {:.1} (supply {:.2})",
                report.unit,
                report.before,
                report.after,
                report.supply
            );
            if !self.units.set_troop_count(report.unit, report.after) {
                tracing::warn!("Attrition for unknown unit {:?} skipped", report.unit);
                continue;
            }
            events.push(SimulationEvent::UnitAttrition { tick, report });
        }

        self.engine.apply(&self.territory, &mut self.control, dt_secs);

        let changes = resolve_captures(
            &mut self.territory,
            &mut self.control,
            &self.occupation,
            &snapshot,
            &self.config,
        );
        for change in changes {
            self.orchestrator.on_cell_captured(&change);
            for listener in self.listeners.iter_mut() {
                listener(&change);
            }
            if let Some(city) = self.supply.city_at(change.coord) {
                tracing::info!("City {} captured: {:?} -> {:?}", city.name, change.previous, change.owner);
                events.push(SimulationEvent::CityCaptured {
                    tick,
                    city: city.id,
                    name: city.name.clone(),
                    coord: change.coord,
                    previous: change.previous,
                    owner: change.owner,
                });
            }
            events.push(SimulationEvent::CellOwnerChanged { tick, change });
        }

        events
    }

    /// Draft `selection` into an operation against every cell of `target`
    pub fn request_country_capture(&mut self, selection: &Selection, target: FactionId) -> Result<OperationId> {
        let outcome = self.orchestrator.start_country_capture(
            selection,
            target,
            &self.territory,
            &mut self.units,
            &self.config.auto_capture,
        );
        self.record_start(selection.faction, outcome)
    }

    /// Draft `selection` into an operation against foreign land in `rect`
    pub fn request_area_capture(&mut self, selection: &Selection, rect: WorldRect) -> Result<OperationId> {
        let outcome = self.orchestrator.start_area_capture(
            selection,
            rect,
            &self.territory,
            &mut self.units,
            &self.config.auto_capture,
        );
        self.record_start(selection.faction, outcome)
    }

    fn record_start(
        &mut self,
        faction: FactionId,
        outcome: std::result::Result<(OperationId, Vec<AutoCaptureEvent>), CaptureRejection>,
    ) -> Result<OperationId> {
        match outcome {
            Ok((id, produced)) => {
                self.queued
                    .extend(produced.into_iter().map(SimulationEvent::AutoCapture));
                Ok(id)
            }
            Err(reason) => {
                self.queued.push(SimulationEvent::CaptureRejected { faction, reason });
                Err(reason.into())
            }
        }
    }

    /// Withdraw one unit from auto-capture, halting it where it stands
    pub fn cancel_capture(&mut self, unit: UnitId) -> bool {
        let produced = self.orchestrator.cancel(unit, &mut self.units);
        let cancelled = !produced.is_empty();
        self.queued
            .extend(produced.into_iter().map(SimulationEvent::AutoCapture));
        cancelled
    }

    /// Withdraw every drafted unit from auto-capture
    pub fn cancel_all_captures(&mut self) {
        let produced = self.orchestrator.cancel_all(&mut self.units);
        self.queued
            .extend(produced.into_iter().map(SimulationEvent::AutoCapture));
    }

    /// Manual move order; takes the unit out of any auto-capture operation
    pub fn order_move(&mut self, unit: UnitId, destination: Vec2) -> Result<u64> {
        if self.units.unit(unit).is_none() {
            return Err(FrontlineError::UnitNotFound(unit));
        }
        self.cancel_capture(unit);
        self.units
            .move_to(unit, destination, self.config.auto_capture.travel_speed)
            .ok_or(FrontlineError::UnitNotFound(unit))
    }

    /// Cells with partial control, tinted for `viewer`
    pub fn control_overlay(&self, viewer: FactionId) -> Vec<OverlayCell> {
        control_overlay(&self.territory, &self.control, viewer)
    }

    /// Land cells held per faction
    pub fn territory_counts(&self) -> std::collections::BTreeMap<FactionId, usize> {
        self.territory.territory_counts()
    }
}

impl SimulationState<UnitRoster> {
    /// Split a unit in two; a drafted unit leaves its operation first
    pub fn split_unit(&mut self, unit: UnitId) -> Result<Option<UnitId>> {
        if self.units.get(unit).is_none() {
            return Err(FrontlineError::UnitNotFound(unit));
        }
        self.cancel_capture(unit);
        Ok(self.units.split_unit(unit, &self.config.roster))
    }

    /// Break every unit of `faction` into increment-sized groups
    pub fn split_all<R: Rng>(&mut self, faction: FactionId, rng: &mut R) -> Vec<UnitId> {
        for id in self.units.units_of(faction) {
            self.cancel_capture(id);
        }
        let spawned = self.units.split_all(faction, &self.config.roster, rng);
        tracing::info!("Faction {} split into {} new units", faction.0, spawned.len());
        spawned
    }
}
