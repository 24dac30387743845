//! Loading of persisted spawn data and settings.
//!
//! Records are written by an external editor. Binary files carry four magic
//! bytes, a little-endian `SchemaVersion` and a bincode payload. RON files
//! with the same shape are accepted for hand authoring.
//!
//! Loading never aborts the engine: a missing directory yields empty data,
//! a bad file or an unknown map skips that file, and an unknown region
//! skips that region record.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use wildspawn_common::{MagicBytes, MapId, SchemaVersion};

use crate::settings::SpawnSettings;
use crate::sources::{MapSpawnData, SpawnDataSet};
use crate::world::WorldOracle;

/// Extension of binary per-map spawn data files.
pub const SPAWN_DATA_EXTENSION: &str = "wsd";

/// Extension of binary settings files.
pub const SETTINGS_EXTENSION: &str = "wss";

/// Extension of RON text files.
pub const TEXT_EXTENSION: &str = "ron";

/// Magic bytes plus three little-endian u16 version fields.
const HEADER_LEN: usize = 10;

/// Errors that can occur while reading or writing persisted records.
#[derive(Debug, Error)]
pub enum DataError {
    /// Failed to read or write a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record shorter than its header
    #[error("Record truncated: {0} bytes")]
    Truncated(usize),

    /// Wrong magic bytes
    #[error("Bad magic bytes: expected {expected:?}")]
    BadMagic {
        /// Expected magic
        expected: [u8; 4],
    },

    /// Record written by an incompatible schema
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads
        expected: SchemaVersion,
        /// Version found in the record
        actual: SchemaVersion,
    },

    /// Binary payload could not be decoded or encoded
    #[error("Binary codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// RON text could not be parsed or written
    #[error("Text format error: {0}")]
    Text(String),

    /// File extension is not a known record format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Record references a map outside the live map set
    #[error("Unknown map: {0}")]
    UnknownMap(MapId),
}

/// Result type for persistence operations.
pub type DataResult<T> = Result<T, DataError>;

/// Summary of a spawn data load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Files accepted
    pub files_loaded: usize,
    /// Files skipped (unreadable, bad header, unknown map)
    pub files_skipped: usize,
    /// Region records skipped for naming an unknown region
    pub regions_skipped: usize,
    /// Zones loaded
    pub zones: usize,
    /// Regions loaded
    pub regions: usize,
    /// Tiles loaded
    pub tiles: usize,
}

/// Encodes a value as a versioned binary record.
pub fn encode_record<T: Serialize>(
    magic: MagicBytes,
    version: SchemaVersion,
    value: &T,
) -> DataResult<Vec<u8>> {
    let payload = bincode::serialize(value)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&magic.0);
    for field in [version.major, version.minor, version.patch] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a versioned binary record, checking magic and major version.
pub fn decode_record<T: DeserializeOwned>(
    magic: MagicBytes,
    expected: SchemaVersion,
    bytes: &[u8],
) -> DataResult<T> {
    if bytes.len() < HEADER_LEN {
        return Err(DataError::Truncated(bytes.len()));
    }
    if !magic.matches(bytes) {
        return Err(DataError::BadMagic { expected: magic.0 });
    }

    let field = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
    let actual = SchemaVersion::new(field(4), field(6), field(8));
    if !expected.can_read(&actual) {
        return Err(DataError::VersionMismatch { expected, actual });
    }

    Ok(bincode::deserialize(&bytes[HEADER_LEN..])?)
}

fn read_ron<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    let contents = fs::read_to_string(path)?;
    ron::from_str(&contents).map_err(|e| DataError::Text(e.to_string()))
}

fn write_ron<T: Serialize>(path: &Path, value: &T) -> DataResult<()> {
    let contents = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|e| DataError::Text(e.to_string()))?;
    write_file(path, contents.as_bytes())
}

fn write_file(path: &Path, bytes: &[u8]) -> DataResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Reads one map's spawn data from a `.wsd` or `.ron` file.
pub fn read_map_file(path: &Path) -> DataResult<MapSpawnData> {
    match extension(path).as_deref() {
        Some(SPAWN_DATA_EXTENSION) => {
            let bytes = fs::read(path)?;
            decode_record(MagicBytes::SPAWN_DATA, SchemaVersion::SPAWN_DATA, &bytes)
        },
        Some(TEXT_EXTENSION) => read_ron(path),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Writes one map's spawn data, choosing the format from the extension.
pub fn write_map_file(path: &Path, data: &MapSpawnData) -> DataResult<()> {
    match extension(path).as_deref() {
        Some(SPAWN_DATA_EXTENSION) => {
            let bytes = encode_record(MagicBytes::SPAWN_DATA, SchemaVersion::SPAWN_DATA, data)?;
            write_file(path, &bytes)
        },
        Some(TEXT_EXTENSION) => write_ron(path, data),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Reads settings from a `.wss` or `.ron` file.
pub fn read_settings_file(path: &Path) -> DataResult<SpawnSettings> {
    match extension(path).as_deref() {
        Some(SETTINGS_EXTENSION) => {
            let bytes = fs::read(path)?;
            decode_record(MagicBytes::SETTINGS, SchemaVersion::SETTINGS, &bytes)
        },
        Some(TEXT_EXTENSION) => read_ron(path),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Writes settings, choosing the format from the extension.
pub fn write_settings_file(path: &Path, settings: &SpawnSettings) -> DataResult<()> {
    match extension(path).as_deref() {
        Some(SETTINGS_EXTENSION) => {
            let bytes = encode_record(MagicBytes::SETTINGS, SchemaVersion::SETTINGS, settings)?;
            write_file(path, &bytes)
        },
        Some(TEXT_EXTENSION) => write_ron(path, settings),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Loads settings, falling back to defaults when the file is missing or bad.
pub fn load_settings(path: &Path) -> SpawnSettings {
    if !path.exists() {
        warn!("Spawn settings {} not found, using defaults", path.display());
        return SpawnSettings::default();
    }

    match read_settings_file(path) {
        Ok(mut settings) => {
            settings.validate();
            info!("Loaded spawn settings from {}", path.display());
            settings
        },
        Err(e) => {
            error!("Failed to load spawn settings {}: {e}", path.display());
            SpawnSettings::default()
        },
    }
}

/// Loads every spawn data file in `dir`, validating maps and regions against the world.
pub fn load_spawn_data<W: WorldOracle + ?Sized>(dir: &Path, world: &W) -> (SpawnDataSet, LoadReport) {
    let mut data = SpawnDataSet::new();
    let mut report = LoadReport::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(
                "Spawn data directory {} unavailable ({e}), continuing without spawn data",
                dir.display()
            );
            return (data, report);
        },
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                extension(path).as_deref(),
                Some(SPAWN_DATA_EXTENSION | TEXT_EXTENSION)
            )
        })
        .collect();
    paths.sort();

    for path in paths {
        let mut map_data = match read_map_file(&path) {
            Ok(map_data) => map_data,
            Err(e) => {
                warn!("Skipping spawn data file {}: {e}", path.display());
                report.files_skipped += 1;
                continue;
            },
        };

        if !world.map_exists(map_data.map) {
            warn!(
                "Skipping spawn data file {}: {}",
                path.display(),
                DataError::UnknownMap(map_data.map)
            );
            report.files_skipped += 1;
            continue;
        }

        let map = map_data.map;
        let before = map_data.regions.len();
        map_data.regions.retain(|region| {
            let known = world.region_exists(map, &region.region_name);
            if !known {
                warn!(
                    "Skipping spawn region '{}' on {map}: no such server region",
                    region.region_name
                );
            }
            known
        });
        report.regions_skipped += before - map_data.regions.len();

        report.zones += map_data.zones.len();
        report.regions += map_data.regions.len();
        report.tiles += map_data.tiles.len();
        report.files_loaded += 1;
        debug!(
            "Loaded {} zones, {} regions, {} tiles for {map} from {}",
            map_data.zones.len(),
            map_data.regions.len(),
            map_data.tiles.len(),
            path.display()
        );
        data.insert_map(map_data);
    }

    info!(
        "Spawn data loaded: {} files ({} skipped), {} zones, {} regions, {} tiles",
        report.files_loaded, report.files_skipped, report.zones, report.regions, report.tiles
    );
    (data, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimMap, SimRegion, SimWorld};
    use crate::sources::{SpawnProfile, SpawnRegion, SpawnTiers, SpawnZone};
    use tempfile::TempDir;
    use wildspawn_common::Rect;

    const MAP: MapId = MapId::new(1);

    fn world() -> SimWorld {
        let mut world = SimWorld::new();
        let mut map = SimMap::new(200, 200);
        map.regions.push(SimRegion::new("Britain", Rect::new(0, 0, 50, 50)));
        world.add_map(MAP, map);
        world
    }

    fn sample(map: MapId) -> MapSpawnData {
        let mut data = MapSpawnData::new(map);
        data.zones.push(SpawnZone {
            name: "orc camp".to_string(),
            bounds: Rect::new(10, 10, 20, 20),
            priority: 5,
            profile: SpawnProfile::new(SpawnTiers::common(["Orc"])),
        });
        data.regions.push(SpawnRegion {
            region_name: "Britain".to_string(),
            profile: SpawnProfile::new(SpawnTiers::common(["Rat"])),
        });
        data.regions.push(SpawnRegion {
            region_name: "Atlantis".to_string(),
            profile: SpawnProfile::default(),
        });
        data
    }

    #[test]
    fn test_record_header_round_trip() {
        let data = sample(MAP);
        let bytes =
            encode_record(MagicBytes::SPAWN_DATA, SchemaVersion::SPAWN_DATA, &data).expect("encode");
        let decoded: MapSpawnData =
            decode_record(MagicBytes::SPAWN_DATA, SchemaVersion::SPAWN_DATA, &bytes)
                .expect("decode");
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_decode_rejects_wrong_magic_and_major() {
        let settings = SpawnSettings::default();
        let bytes =
            encode_record(MagicBytes::SETTINGS, SchemaVersion::SETTINGS, &settings).expect("encode");

        let wrong_magic: DataResult<SpawnSettings> =
            decode_record(MagicBytes::SPAWN_DATA, SchemaVersion::SETTINGS, &bytes);
        assert!(matches!(wrong_magic, Err(DataError::BadMagic { .. })));

        let newer = SchemaVersion::new(2, 0, 0);
        let wrong_major: DataResult<SpawnSettings> =
            decode_record(MagicBytes::SETTINGS, newer, &bytes);
        assert!(matches!(wrong_major, Err(DataError::VersionMismatch { .. })));

        let short: DataResult<SpawnSettings> =
            decode_record(MagicBytes::SETTINGS, SchemaVersion::SETTINGS, &bytes[..6]);
        assert!(matches!(short, Err(DataError::Truncated(6))));
    }

    #[test]
    fn test_load_skips_unknown_map_and_region() {
        let dir = TempDir::new().expect("temp dir");
        write_map_file(&dir.path().join("felucca.wsd"), &sample(MAP)).expect("write");
        write_map_file(&dir.path().join("ghost.ron"), &sample(MapId::new(9))).expect("write");
        fs::write(dir.path().join("broken.wsd"), b"nope").expect("write");
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");

        let (data, report) = load_spawn_data(dir.path(), &world());

        assert_eq!(report.files_loaded, 1);
        assert_eq!(report.files_skipped, 2);
        assert_eq!(report.regions_skipped, 1);
        assert_eq!(data.source_counts(), (1, 1, 0));
        assert!(data.region(MAP, "Atlantis").is_none());
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let (data, report) = load_spawn_data(Path::new("/nonexistent/spawn/data"), &world());
        assert!(data.is_empty());
        assert_eq!(report, LoadReport::default());
    }

    #[test]
    fn test_settings_binary_and_text() {
        let dir = TempDir::new().expect("temp dir");
        let settings = SpawnSettings {
            max_mobs: 9,
            dynamic_scaling: true,
            ..Default::default()
        };

        let binary = dir.path().join("settings.wss");
        write_settings_file(&binary, &settings).expect("write binary");
        assert_eq!(load_settings(&binary), settings);

        let text = dir.path().join("settings.ron");
        write_settings_file(&text, &settings).expect("write text");
        assert_eq!(load_settings(&text), settings);
    }

    #[test]
    fn test_load_settings_missing_uses_defaults() {
        let settings = load_settings(Path::new("/nonexistent/settings.wss"));
        assert_eq!(settings, SpawnSettings::default());
    }
}
