//! Configuration of the beacon binary.

use std::path::Path;

use beacon_core::config::{self, ConfigError, MAX_ENTITY_VIEW_DISTANCE, TrackingConfig};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/beacon_config.json5");

/// The whole config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub tracking: TrackingConfig,
    pub simulation: SimulationConfig,
}

impl BeaconConfig {
    /// Loads the config at `path`, creating it from the bundled defaults if
    /// missing, and validates it.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = config::load_or_create(path, DEFAULT_CONFIG)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking.validate()?;
        self.simulation.validate()
    }
}

/// Shape of the soak simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Worker threads, 0 for one per core.
    pub threads: usize,
    pub entities: u32,
    /// How many of the entities are observers.
    pub observers: u32,
    pub observer_view_distance: u8,
    pub ticks: u32,
    /// Half the side length of the square world, in blocks.
    pub world_radius: f64,
    /// Largest per-axis step of one entity in one tick.
    pub max_step: f64,
    pub respawn_chance: f64,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entities == 0 || self.entities > i32::MAX as u32 {
            return Err(ConfigError::Invalid("Entity count must be in range 1..=i32::MAX"));
        }
        if self.observers > self.entities {
            return Err(ConfigError::Invalid(
                "Observer count must not exceed the entity count",
            ));
        }
        if !(1..=MAX_ENTITY_VIEW_DISTANCE).contains(&self.observer_view_distance) {
            return Err(ConfigError::Invalid(
                "Observer view distance must be in range 1..=32",
            ));
        }
        if !(self.world_radius.is_finite() && self.world_radius > 0.0) {
            return Err(ConfigError::Invalid("World radius must be positive"));
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(ConfigError::Invalid("Max step must be positive"));
        }
        if !(0.0..=1.0).contains(&self.respawn_chance) {
            return Err(ConfigError::Invalid("Respawn chance must be in range 0..=1"));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            entities: 4000,
            observers: 200,
            observer_view_distance: 10,
            ticks: 200,
            world_radius: 2048.0,
            max_step: 12.0,
            respawn_chance: 0.002,
            seed: 12345,
        }
    }
}
