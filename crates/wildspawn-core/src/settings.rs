//! Spawn settings and the dynamic scale modifier.
//!
//! `SpawnSettings` is the scalar configuration read by every tick. It is
//! persisted as a versioned record (see [`crate::persist`]) and only changes
//! through an explicit reload. `SettingsStore` pairs it with the scale
//! modifier that dynamic scaling recomputes from nearby player density.

use serde::{Deserialize, Serialize};

/// Scale step contributed by each nearby player.
pub const SCALE_PER_NEARBY_PLAYER: f64 = 0.1;

/// Multiplier applied to `max_range` for the attributed-spawn count query.
pub const MOB_COUNT_RANGE_FACTOR: f64 = 1.5;

/// Per-tier roll chances (0.0 - 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierChances {
    /// Water tier (only tier rolled on water)
    pub water: f64,
    /// Weather tier, when the source's weather trigger matches
    pub weather: f64,
    /// Timed tier, when the source's time trigger matches
    pub timed: f64,
    /// Common tier
    pub common: f64,
    /// Uncommon tier
    pub uncommon: f64,
    /// Rare tier
    pub rare: f64,
}

impl Default for TierChances {
    fn default() -> Self {
        Self {
            water: 0.5,
            weather: 0.75,
            timed: 0.75,
            common: 0.85,
            uncommon: 0.15,
            rare: 0.03,
        }
    }
}

impl TierChances {
    fn clamp(&mut self) {
        for chance in [
            &mut self.water,
            &mut self.weather,
            &mut self.timed,
            &mut self.common,
            &mut self.uncommon,
            &mut self.rare,
        ] {
            *chance = chance.clamp(0.0, 1.0);
        }
    }
}

/// Tunable spawn parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    // === Location search ===
    /// Minimum spawn distance from the player (also the crowd-check radius)
    pub min_range: i32,
    /// Maximum spawn distance from the player
    pub max_range: i32,
    /// Location attempts per pass before giving up
    pub max_spawn_checks: u32,
    /// Non-vendor creatures within `min_range` that make a spot too crowded
    pub max_crowd: u32,

    // === Limits ===
    /// Spawns attributed to one player before production stops
    pub max_mobs: u32,
    /// Pending decisions per player queue
    pub max_queue_size: usize,
    /// Players visited per spawn tick
    pub batch_size: usize,
    /// Recompute the scale modifier from nearby player count
    pub dynamic_scaling: bool,

    // === Selection ===
    /// Tier roll chances
    pub chances: TierChances,
    /// Chance that a rift-enabled region swaps the weather list for the rare list
    pub rift_chance: f64,

    // === Timers ===
    /// Spawn tick interval in milliseconds
    pub spawn_interval_ms: u64,
    /// Distance sweep interval in milliseconds
    pub distance_interval_ms: u64,
    /// Cleanup sweep interval in milliseconds
    pub cleanup_interval_ms: u64,
    /// Far range = scaled max range x this factor
    pub far_range_factor: f64,

    // === Recycling ===
    /// Pooled entities across all types
    pub global_recycle_cap: usize,
    /// Pooled entities per creature type
    pub per_type_recycle_cap: usize,

    // === Diagnostics ===
    /// Queue depth samples kept for metrics
    pub metrics_history: usize,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            min_range: 12,
            max_range: 24,
            max_spawn_checks: 10,
            max_crowd: 4,

            max_mobs: 15,
            max_queue_size: 4,
            batch_size: 10,
            dynamic_scaling: false,

            chances: TierChances::default(),
            rift_chance: 0.1,

            spawn_interval_ms: 250,
            distance_interval_ms: 1_000,
            cleanup_interval_ms: 10_000,
            far_range_factor: 1.5,

            global_recycle_cap: 500,
            per_type_recycle_cap: 25,

            metrics_history: 120,
        }
    }
}

impl SpawnSettings {
    /// Validate and clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.min_range = self.min_range.clamp(1, 256);
        self.max_range = self.max_range.clamp(self.min_range, 512);
        self.max_spawn_checks = self.max_spawn_checks.clamp(1, 100);
        self.max_crowd = self.max_crowd.max(1);
        self.max_mobs = self.max_mobs.max(1);
        self.max_queue_size = self.max_queue_size.max(1);
        self.batch_size = self.batch_size.max(1);

        self.chances.clamp();
        self.rift_chance = self.rift_chance.clamp(0.0, 1.0);

        self.spawn_interval_ms = self.spawn_interval_ms.max(10);
        self.distance_interval_ms = self.distance_interval_ms.max(10);
        self.cleanup_interval_ms = self.cleanup_interval_ms.max(10);
        self.far_range_factor = self.far_range_factor.clamp(1.0, 10.0);

        self.per_type_recycle_cap = self.per_type_recycle_cap.min(self.global_recycle_cap);
        self.metrics_history = self.metrics_history.clamp(1, 10_000);
    }
}

/// Scales a base limit: `base + floor(base x modifier)`.
#[must_use]
pub fn scale_limit(base: u32, modifier: f64) -> u32 {
    let extra = (f64::from(base) * modifier).floor();
    base.saturating_add(extra.max(0.0) as u32)
}

/// Scales a range the same way as [`scale_limit`].
#[must_use]
pub fn scale_range(base: i32, modifier: f64) -> i32 {
    let extra = (f64::from(base) * modifier).floor();
    base.saturating_add(extra.max(0.0) as i32)
}

/// Holds the live settings and the dynamic scale modifier.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: SpawnSettings,
    scale_modifier: f64,
}

impl SettingsStore {
    /// Creates a store from validated settings.
    #[must_use]
    pub fn new(mut settings: SpawnSettings) -> Self {
        settings.validate();
        Self {
            settings,
            scale_modifier: 0.0,
        }
    }

    /// Returns the current settings.
    #[must_use]
    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    /// Replaces the settings (reload). The scale modifier is reset.
    pub fn replace(&mut self, mut settings: SpawnSettings) {
        settings.validate();
        self.settings = settings;
        self.scale_modifier = 0.0;
    }

    /// Returns the current scale modifier.
    #[must_use]
    pub fn scale_modifier(&self) -> f64 {
        self.scale_modifier
    }

    /// Recomputes the modifier from the number of other players nearby.
    pub fn update_scale(&mut self, nearby_players: usize) -> f64 {
        self.scale_modifier = SCALE_PER_NEARBY_PLAYER * nearby_players as f64;
        self.scale_modifier
    }

    /// Resets the modifier to zero (scaling disabled).
    pub fn reset_scale(&mut self) {
        self.scale_modifier = 0.0;
    }

    /// Max mobs per player after scaling.
    #[must_use]
    pub fn effective_max_mobs(&self) -> u32 {
        scale_limit(self.settings.max_mobs, self.scale_modifier)
    }

    /// Crowd limit after scaling.
    #[must_use]
    pub fn effective_max_crowd(&self) -> u32 {
        scale_limit(self.settings.max_crowd, self.scale_modifier)
    }

    /// Max spawn range after scaling.
    #[must_use]
    pub fn effective_max_range(&self) -> i32 {
        scale_range(self.settings.max_range, self.scale_modifier)
    }

    /// Radius of the attributed-spawn count query.
    #[must_use]
    pub fn mob_count_range(&self) -> i32 {
        (f64::from(self.effective_max_range()) * MOB_COUNT_RANGE_FACTOR).round() as i32
    }

    /// Distance beyond which an active spawn counts as too far from any player.
    #[must_use]
    pub fn far_range(&self) -> i32 {
        (f64::from(self.effective_max_range()) * self.settings.far_range_factor).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_limit_matches_floor_rule() {
        assert_eq!(scale_limit(15, 0.0), 15);
        assert_eq!(scale_limit(15, 0.3), 19);
        assert_eq!(scale_limit(4, 0.1), 4);
        assert_eq!(scale_limit(10, 0.5), 15);
    }

    #[test]
    fn test_update_scale_from_three_players() {
        let mut store = SettingsStore::new(SpawnSettings::default());
        let modifier = store.update_scale(3);
        assert!((modifier - 0.3).abs() < 1e-9);
        assert_eq!(store.effective_max_mobs(), 19);

        store.reset_scale();
        assert_eq!(store.effective_max_mobs(), 15);
    }

    #[test]
    fn test_validate_clamps() {
        let mut settings = SpawnSettings {
            min_range: 30,
            max_range: 5,
            batch_size: 0,
            per_type_recycle_cap: 900,
            ..Default::default()
        };
        settings.chances.rare = 4.0;
        settings.validate();

        assert_eq!(settings.max_range, 30);
        assert_eq!(settings.batch_size, 1);
        assert_eq!(settings.per_type_recycle_cap, settings.global_recycle_cap);
        assert!((settings.chances.rare - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_limits_clamp_to_one() {
        let store = SettingsStore::new(SpawnSettings {
            max_crowd: 0,
            max_mobs: 0,
            ..Default::default()
        });
        assert_eq!(store.effective_max_crowd(), 1);
        assert_eq!(store.effective_max_mobs(), 1);
    }

    #[test]
    fn test_replace_resets_modifier() {
        let mut store = SettingsStore::new(SpawnSettings::default());
        store.update_scale(5);
        store.replace(SpawnSettings {
            max_mobs: 8,
            ..Default::default()
        });
        assert!(store.scale_modifier().abs() < f64::EPSILON);
        assert_eq!(store.effective_max_mobs(), 8);
    }

    #[test]
    fn test_far_range_uses_factor() {
        let store = SettingsStore::new(SpawnSettings::default());
        assert_eq!(store.far_range(), 36);
        assert_eq!(store.mob_count_range(), 36);
    }
}
