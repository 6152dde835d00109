//! Simulation configuration with documented constants
//!
//! All tuning numbers live here, grouped by the system that reads them.
//! Values can be overridden from a TOML file; missing keys keep defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{FrontlineError, Result};

/// Configuration for every territorial control system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub control: ControlConfig,
    pub supply: SupplyConfig,
    pub influence: InfluenceConfig,
    pub capture: CaptureConfig,
    pub auto_capture: AutoCaptureConfig,
    pub roster: RosterConfig,
}

/// Grid geometry and tick pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Size of one territory cell in world units
    ///
    /// Grid width/height are the world map size divided by this value.
    pub cell_size: f32,

    /// Simulated milliseconds between control updates
    ///
    /// Frame deltas accumulate until this much time has passed, then one
    /// control tick runs with the whole accumulated delta.
    pub tick_interval_ms: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            tick_interval_ms: 100.0,
        }
    }
}

/// Control field bounds and reset values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Control assigned to every land cell at world load
    pub initial_control: f64,

    /// Control a cell is reset to after it changes hands
    ///
    /// Must sit strictly between the loss and capture thresholds so a
    /// freshly flipped cell cannot re-trigger on the next tick.
    pub midpoint: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            initial_control: 100.0,
            midpoint: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    /// Search radius (cells, Euclidean) for friendly territory
    pub radius: f64,

    /// Effectiveness of a unit with no friendly territory in range
    ///
    /// Never zero: cut-off units are weakened, not neutralized.
    pub floor: f64,

    /// Radius (cells) within which a friendly city supplies a unit
    pub city_radius: f64,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            floor: 0.2,
            city_radius: 8.0,
        }
    }
}

/// Per-cell weights of the 3x3 influence footprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceKernel {
    pub center: f64,
    pub edge: f64,
    pub diagonal: f64,
}

impl Default for InfluenceKernel {
    fn default() -> Self {
        Self {
            center: 1.0,
            edge: 0.3,
            diagonal: 0.15,
        }
    }
}

impl InfluenceKernel {
    /// Weight for a neighbor offset in [-1, 1]²
    pub fn weight(&self, dx: i32, dy: i32) -> f64 {
        match (dx.abs(), dy.abs()) {
            (0, 0) => self.center,
            (0, _) | (_, 0) => self.edge,
            _ => self.diagonal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceConfig {
    /// Control points per second projected by one troop at full weight and supply
    ///
    /// At 0.003 a 10000-troop stack moves its own cell by 30 points per
    /// second when fully supplied, 6 when cut off.
    pub per_troop: f64,

    pub kernel: InfluenceKernel,

    /// Fraction of troops lost per second on non-friendly land
    pub base_attrition_rate: f64,

    /// How much full supply reduces attrition (0.5 = halves it)
    pub supply_attrition_relief: f64,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            per_troop: 0.003,
            kernel: InfluenceKernel::default(),
            base_attrition_rate: 0.005,
            supply_attrition_relief: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Control at or above which a capture evaluation runs
    pub capture_threshold: f64,

    /// Control at or below which a loss evaluation runs
    pub loss_threshold: f64,

    /// Ratio the strongest occupant needs over the runner-up to be dominant
    ///
    /// Prevents flip-flopping on marginal troop differences.
    pub dominance_margin: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_threshold: 100.0,
            loss_threshold: 0.0,
            dominance_margin: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCaptureConfig {
    /// Constant travel speed of drafted units (world units per second)
    pub travel_speed: f32,

    /// Seconds a unit waits on its target before the next assignment.
    /// Counted in whole frames starting with the frame after arrival.
    pub reassign_delay_secs: f32,
}

impl Default for AutoCaptureConfig {
    fn default() -> Self {
        Self {
            travel_speed: 50.0,
            reassign_delay_secs: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Smallest troop group produced by a split
    pub split_increment: f64,

    /// World-unit offset of a split-off unit from its parent
    pub split_offset: f32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            split_increment: 10_000.0,
            split_offset: 30.0,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Seconds per control tick
    pub fn tick_interval_secs(&self) -> f64 {
        self.grid.tick_interval_ms / 1000.0
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FrontlineError::InvalidConfig(msg));

        if self.grid.cell_size <= 0.0 || self.grid.tick_interval_ms <= 0.0 {
            return invalid("cell_size and tick_interval_ms must be positive".into());
        }

        let capture = &self.capture;
        if !(0.0..=100.0).contains(&capture.loss_threshold)
            || !(0.0..=100.0).contains(&capture.capture_threshold)
        {
            return invalid("thresholds must lie within [0, 100]".into());
        }
        if capture.loss_threshold >= capture.capture_threshold {
            return invalid(format!(
                "loss_threshold ({}) must be below capture_threshold ({})",
                capture.loss_threshold, capture.capture_threshold
            ));
        }
        let midpoint = self.control.midpoint;
        if midpoint <= capture.loss_threshold || midpoint >= capture.capture_threshold {
            return invalid(format!(
                "midpoint ({}) must lie strictly between the thresholds",
                midpoint
            ));
        }
        if !(0.0..=100.0).contains(&self.control.initial_control) {
            return invalid("initial_control must lie within [0, 100]".into());
        }
        if capture.dominance_margin < 1.0 {
            return invalid("dominance_margin must be at least 1.0".into());
        }

        if self.supply.radius <= 0.0 || self.supply.city_radius <= 0.0 {
            return invalid("supply radii must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.supply.floor) || self.supply.floor == 0.0 {
            return invalid("supply floor must lie within (0, 1]".into());
        }

        let influence = &self.influence;
        if influence.per_troop <= 0.0 || influence.base_attrition_rate < 0.0 {
            return invalid("per_troop must be positive and attrition non-negative".into());
        }
        if !(0.0..=1.0).contains(&influence.supply_attrition_relief) {
            return invalid("supply_attrition_relief must lie within [0, 1]".into());
        }

        if self.auto_capture.travel_speed <= 0.0 || self.auto_capture.reassign_delay_secs < 0.0 {
            return invalid("travel_speed must be positive and reassign delay non-negative".into());
        }
        if self.roster.split_increment < 1.0 {
            return invalid("split_increment must be at least one troop".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [capture]
            dominance_margin = 2.0

            [supply]
            radius = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.dominance_margin, 2.0);
        assert_eq!(config.supply.radius, 3.0);
        assert_eq!(config.supply.floor, 0.2);
        assert_eq!(config.grid.tick_interval_ms, 100.0);
    }

    #[test]
    fn test_midpoint_outside_thresholds_rejected() {
        let mut config = SimulationConfig::default();
        config.capture.loss_threshold = 10.0;
        config.capture.capture_threshold = 40.0;
        assert!(matches!(
            config.validate(),
            Err(FrontlineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_supply_floor_rejected() {
        let mut config = SimulationConfig::default();
        config.supply.floor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let result = SimulationConfig::from_toml_str("[capture\nloss_threshold = ");
        assert!(matches!(result, Err(FrontlineError::TomlError(_))));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = SimulationConfig::from_toml_str(include_str!("../../frontline.toml")).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_kernel_weights() {
        let kernel = InfluenceKernel::default();
        assert_eq!(kernel.weight(0, 0), 1.0);
        assert_eq!(kernel.weight(1, 0), 0.3);
        assert_eq!(kernel.weight(0, -1), 0.3);
        assert_eq!(kernel.weight(-1, 1), 0.15);
    }
}
