//! # Campus Project Configuration
//!
//! Parses `campus.toml` — the declarative config for the campus map: the
//! projection origin, region-of-interest bounds, ingestion pacing, and the
//! per-category extrusion/styling constants. Every field has a default, so
//! a missing or broken file still yields a working session.
//!
//! ## Table of Contents
//! 1. CampusConfig — Top-level config
//! 2. Section structs (project, bounds, ingest, walkways, roads, areas, buildings)
//! 3. Parsing and color helpers

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// 1. CampusConfig — Top-level config
// ============================================================================

/// Top-level campus map configuration, parsed from `campus.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Resource, Default)]
pub struct CampusConfig {
    /// Projection origin and scale
    #[serde(default)]
    pub project: ProjectConfig,
    /// Region-of-interest rectangle (degrees)
    #[serde(default)]
    pub bounds: BoundsConfig,
    /// Data source enumeration and batch pacing
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Walkway layer constants
    #[serde(default)]
    pub walkways: WalkwayConfig,
    /// Road ribbon constants
    #[serde(default)]
    pub roads: RoadConfig,
    /// Parking/area polygon constants
    #[serde(default)]
    pub areas: AreaConfig,
    /// Building extrusion and palette constants
    #[serde(default)]
    pub buildings: BuildingConfig,
}

// ============================================================================
// 2. Section structs
// ============================================================================

/// Projection origin and planar scale. Coordinates project to
/// `((lon - origin_lon) * scale, (lat - origin_lat) * scale)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-readable project name
    #[serde(default = "default_name")]
    pub name: String,
    /// Origin longitude (WGS84 degrees)
    #[serde(default = "default_origin_lon")]
    pub origin_lon: f64,
    /// Origin latitude (WGS84 degrees)
    #[serde(default = "default_origin_lat")]
    pub origin_lat: f64,
    /// Degrees → planar units multiplier
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            origin_lon: default_origin_lon(),
            origin_lat: default_origin_lat(),
            scale: default_scale(),
        }
    }
}

fn default_name() -> String {
    "campus".to_string()
}
fn default_origin_lon() -> f64 {
    20.96
}
fn default_origin_lat() -> f64 {
    41.985
}
fn default_scale() -> f64 {
    100_000.0
}

/// Geographic rectangle; features with any vertex outside are discarded
/// (roads/areas dataset only — see `scene`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsConfig {
    #[serde(default = "default_min_lon")]
    pub min_lon: f64,
    #[serde(default = "default_max_lon")]
    pub max_lon: f64,
    #[serde(default = "default_min_lat")]
    pub min_lat: f64,
    #[serde(default = "default_max_lat")]
    pub max_lat: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            min_lon: default_min_lon(),
            max_lon: default_max_lon(),
            min_lat: default_min_lat(),
            max_lat: default_max_lat(),
        }
    }
}

fn default_min_lon() -> f64 {
    20.95853286124489
}
fn default_max_lon() -> f64 {
    20.96584573595831
}
fn default_min_lat() -> f64 {
    41.98350594518007
}
fn default_max_lat() -> f64 {
    41.994342701395055
}

/// Data source locations and batch pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding the walkway and road collections
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Walkway feature collection file name
    #[serde(default = "default_walkways_file")]
    pub walkways_file: String,
    /// Roads/areas feature collection file name
    #[serde(default = "default_roads_file")]
    pub roads_file: String,
    /// Subdirectory (under `data_dir`) holding the per-building files
    #[serde(default = "default_buildings_subdir")]
    pub buildings_subdir: String,
    /// Number of `building_<i>.geojson` files, numbered from 1
    #[serde(default = "default_building_count")]
    pub building_count: usize,
    /// Sources requested concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between batch joins (milliseconds)
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            walkways_file: default_walkways_file(),
            roads_file: default_roads_file(),
            buildings_subdir: default_buildings_subdir(),
            building_count: default_building_count(),
            batch_size: default_batch_size(),
            pacing_delay_ms: default_pacing_delay_ms(),
        }
    }
}

impl IngestConfig {
    /// Absolute-ish path of the walkway collection
    pub fn walkways_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.walkways_file)
    }

    /// Absolute-ish path of the roads/areas collection
    pub fn roads_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.roads_file)
    }

    /// Path of one per-building collection by file name
    pub fn building_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.data_dir)
            .join(&self.buildings_subdir)
            .join(file_name)
    }
}

fn default_data_dir() -> String {
    "assets/data".to_string()
}
fn default_walkways_file() -> String {
    "walkways.geojson".to_string()
}
fn default_roads_file() -> String {
    "osm_roads.geojson".to_string()
}
fn default_buildings_subdir() -> String {
    "campus/unknown".to_string()
}
fn default_building_count() -> usize {
    114
}
fn default_batch_size() -> usize {
    100
}
fn default_pacing_delay_ms() -> u64 {
    50
}

/// Walkway layer constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkwayConfig {
    /// Vertical extrusion depth (planar units)
    #[serde(default = "default_walkway_depth")]
    pub depth: f32,
    /// `fill` property value marking a feature as a hole ring, not a surface
    #[serde(default = "default_hole_fill")]
    pub hole_fill: String,
    /// When true, a hole is attached only to outlines that contain its first
    /// vertex. Default preserves the dataset-wide hole pool.
    #[serde(default)]
    pub scope_holes_by_containment: bool,
    /// RGB surface color (0.0–1.0)
    #[serde(default = "default_walkway_color")]
    pub color: Vec<f32>,
}

impl Default for WalkwayConfig {
    fn default() -> Self {
        Self {
            depth: default_walkway_depth(),
            hole_fill: default_hole_fill(),
            scope_holes_by_containment: false,
            color: default_walkway_color(),
        }
    }
}

fn default_walkway_depth() -> f32 {
    0.1
}
fn default_hole_fill() -> String {
    "#ff0000".to_string()
}
fn default_walkway_color() -> Vec<f32> {
    vec![0.78, 0.76, 0.72]
}

/// Road ribbon constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadConfig {
    /// Cross-section width, centered on the path
    #[serde(default = "default_road_width")]
    pub width: f32,
    /// Sweep step count along the interpolated curve
    #[serde(default = "default_road_steps")]
    pub steps: usize,
    /// Vertical offset above the ground plane (z-fighting guard)
    #[serde(default = "default_road_lift")]
    pub lift: f32,
    /// RGB surface color
    #[serde(default = "default_road_color")]
    pub color: Vec<f32>,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            width: default_road_width(),
            steps: default_road_steps(),
            lift: default_road_lift(),
            color: default_road_color(),
        }
    }
}

fn default_road_width() -> f32 {
    2.5
}
fn default_road_steps() -> usize {
    100
}
fn default_road_lift() -> f32 {
    0.02
}
fn default_road_color() -> Vec<f32> {
    vec![0.25, 0.25, 0.27]
}

/// Parking/area polygon constants (polygon features in the roads collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Vertical extrusion depth
    #[serde(default = "default_area_depth")]
    pub depth: f32,
    /// Vertical offset above the ground plane
    #[serde(default = "default_area_lift")]
    pub lift: f32,
    /// RGB surface color
    #[serde(default = "default_area_color")]
    pub color: Vec<f32>,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            depth: default_area_depth(),
            lift: default_area_lift(),
            color: default_area_color(),
        }
    }
}

fn default_area_depth() -> f32 {
    0.05
}
fn default_area_lift() -> f32 {
    0.01
}
fn default_area_color() -> Vec<f32> {
    vec![0.45, 0.45, 0.48]
}

/// Building extrusion and palette constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingConfig {
    /// Height assumed when `estimated_height` is absent or non-numeric
    #[serde(default = "default_building_height")]
    pub default_height: f64,
    /// Multiplier applied to the resolved height
    #[serde(default = "default_height_multiplier")]
    pub height_multiplier: f64,
    /// Emissive RGB applied to the highlighted building
    #[serde(default = "default_highlight_color")]
    pub highlight: Vec<f32>,
    /// Fixed, ordered base-color palette cycled across building solids
    #[serde(default = "default_palette")]
    pub palette: Vec<Vec<f32>>,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            default_height: default_building_height(),
            height_multiplier: default_height_multiplier(),
            highlight: default_highlight_color(),
            palette: default_palette(),
        }
    }
}

fn default_building_height() -> f64 {
    10.0
}
fn default_height_multiplier() -> f64 {
    3.0
}
// 0x1a304c
fn default_highlight_color() -> Vec<f32> {
    vec![0.102, 0.188, 0.298]
}
fn default_palette() -> Vec<Vec<f32>> {
    vec![
        vec![0.89, 0.85, 0.79],
        vec![0.80, 0.72, 0.62],
        vec![0.72, 0.66, 0.62],
        vec![0.85, 0.80, 0.74],
        vec![0.67, 0.60, 0.55],
        vec![0.76, 0.74, 0.70],
    ]
}

// ============================================================================
// 3. Parsing and color helpers
// ============================================================================

impl CampusConfig {
    /// Load a CampusConfig from a `campus.toml` file path
    pub fn load(path: &Path) -> Result<Self, CampusConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CampusConfigError::Io(path.to_path_buf(), e))?;
        let config: CampusConfig = toml::from_str(&content)
            .map_err(|e| CampusConfigError::Parse(path.to_path_buf(), e))?;
        Ok(config)
    }

    /// Load `campus.toml`, falling back to built-in defaults on any failure.
    /// The session must come up regardless of config state.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded campus config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::error!("{} — using built-in defaults", e);
                Self::default()
            }
        }
    }

    /// Extract an opaque sRGB Color from a config color vec
    pub fn color_from_vec(color: &[f32]) -> Color {
        match color.len() {
            3 => Color::srgb(color[0], color[1], color[2]),
            4 => Color::srgba(color[0], color[1], color[2], color[3]),
            _ => Color::srgb(0.5, 0.5, 0.5),
        }
    }

    /// Extract a linear RGB (emissive) value from a config color vec
    pub fn linear_from_vec(color: &[f32]) -> LinearRgba {
        match color.len() {
            3 => LinearRgba::rgb(color[0], color[1], color[2]),
            4 => LinearRgba::new(color[0], color[1], color[2], color[3]),
            _ => LinearRgba::BLACK,
        }
    }
}

/// Errors from loading campus.toml
#[derive(Debug)]
pub enum CampusConfigError {
    /// File I/O error
    Io(PathBuf, std::io::Error),
    /// TOML parse error
    Parse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for CampusConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampusConfigError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            CampusConfigError::Parse(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for CampusConfigError {}
