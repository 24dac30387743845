//! Host configuration.
//!
//! Controls shard layout, simulated population, timing and reporting.
//! Loaded from a TOML file; missing or invalid files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "wildspawn.toml";

/// Host configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    // === Data ===
    /// Directory holding `*.wsd` / `*.ron` spawn data
    pub data_dir: PathBuf,
    /// Spawn settings file (`.wss` or `.ron`)
    pub settings_path: PathBuf,

    // === Shards ===
    /// Number of shards, one map each
    pub shards: u8,
    /// Simulated players per shard
    pub players_per_shard: u32,
    /// Map width and height in tiles
    pub map_size: i32,

    // === Timing ===
    /// Seconds to run before shutting down
    pub run_seconds: u64,
    /// Milliseconds between engine updates
    pub update_ms: u64,
    /// Seconds between world saves (0 = never)
    pub world_save_interval_secs: u64,
    /// Milliseconds a world save keeps the engines suspended
    pub world_save_duration_ms: u64,

    // === Simulation ===
    /// Chance per update that a player kills a nearby spawn
    pub kill_chance: f64,
    /// Random seed (None = random)
    pub seed: Option<u64>,

    // === Reporting ===
    /// Seconds between metrics reports
    pub report_interval_secs: u64,
    /// Emit reports as JSON instead of a summary line
    pub json_reports: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("spawn_data"),
            settings_path: PathBuf::from("spawn_data/settings.wss"),

            shards: 2,
            players_per_shard: 8,
            map_size: 512,

            run_seconds: 30,
            update_ms: 50,
            world_save_interval_secs: 20,
            world_save_duration_ms: 500,

            kill_chance: 0.02,
            seed: None,

            report_interval_secs: 5,
            json_reports: true,
        }
    }
}

impl HostConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.shards = self.shards.clamp(1, 16);
        self.players_per_shard = self.players_per_shard.clamp(1, 1_000);
        self.map_size = self.map_size.clamp(128, 8_192);

        self.run_seconds = self.run_seconds.clamp(1, 86_400);
        self.update_ms = self.update_ms.clamp(5, 1_000);
        self.world_save_duration_ms = self.world_save_duration_ms.min(10_000);

        self.kill_chance = self.kill_chance.clamp(0.0, 1.0);
        self.report_interval_secs = self.report_interval_secs.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.shards, 2);
        assert_eq!(config.update_ms, 50);
        assert!(config.json_reports);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig {
            shards: 0,
            map_size: 10,
            kill_chance: 3.0,
            update_ms: 0,
            ..Default::default()
        };

        config.validate();

        assert_eq!(config.shards, 1);
        assert_eq!(config.map_size, 128);
        assert!((config.kill_chance - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.update_ms, 5);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("host.toml");

        let config = HostConfig {
            shards: 4,
            seed: Some(99),
            json_reports: false,
            ..Default::default()
        };
        config.save_to(&config_path).expect("Failed to save config");

        let loaded = HostConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "shards = 3\n").expect("write");

        let loaded = HostConfig::load_from(&config_path);
        assert_eq!(loaded.shards, 3);
        assert_eq!(loaded.players_per_shard, 8);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = HostConfig::load_from("/nonexistent/path/wildspawn.toml");
        assert_eq!(config, HostConfig::default());
    }
}
