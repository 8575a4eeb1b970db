//! # Campus Geo — Geospatial Vector Data to 3D Campus Solids
//!
//! Turns GeoJSON feature collections (walkways, roads, parking areas, and
//! one file per building) into extruded meshes placed in a Bevy scene, with
//! click-to-highlight selection of buildings.
//!
//! ## Pipeline
//! ```text
//! feature collection → bounds filter → planar projection → outline assembly
//!   → extrusion (prism or swept ribbon) → Mesh3d entity in the scene
//! ```
//!
//! ## Modules
//! - `config` — Parse `campus.toml` project configuration
//! - `coords` — Flat local-tangent projection and the geographic bounds filter
//! - `features` — GeoJSON → typed feature collections with property readers
//! - `outline` — Closed 2D outlines (outer ring + holes) ready for extrusion
//! - `extrude` — Outline → prism mesh; polyline → Catmull-Rom swept ribbon
//! - `layers` — ECS components: layer kind, building identity tag, hit bounds
//! - `palette` — Cycling building material palette with a single cursor
//! - `ingest` — Batched, failure-tolerant loading of the per-building files
//! - `scene` — Feature-to-entity spawning, per layer category
//! - `picking` — Pointer ray hit-testing and exclusive building highlight
//! - `plugin` — Bevy plugin registration and systems

pub mod config;
pub mod coords;
pub mod features;
pub mod outline;
pub mod extrude;
pub mod layers;
pub mod palette;
pub mod ingest;
pub mod scene;
pub mod picking;
pub mod plugin;

pub use config::CampusConfig;
pub use coords::{GeoBounds, MapOrigin};
pub use layers::{BuildingTag, CampusLayer, LayerKind, SolidBounds};
pub use palette::BuildingPalette;
pub use picking::HighlightState;
pub use plugin::CampusMapPlugin;
