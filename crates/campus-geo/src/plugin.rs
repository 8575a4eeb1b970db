//! # CampusMapPlugin
//!
//! Wires the campus map into a Bevy `App`: loads `campus.toml`, registers
//! the projection, bounds, palette, scheduler, and channel resources, and
//! schedules the ingestion and picking systems.

use bevy::prelude::*;
use std::path::PathBuf;

use crate::config::CampusConfig;
use crate::coords::{GeoBounds, MapOrigin};
use crate::ingest::{
    drain_results, drive_batches, setup_ingestion, BatchScheduler, IngestChannel,
    LayerMaterials,
};
use crate::palette::BuildingPalette;
use crate::picking::{pointer_pick_system, HighlightState};

pub struct CampusMapPlugin {
    /// Location of `campus.toml`; a missing file falls back to defaults
    pub config_path: PathBuf,
}

impl Default for CampusMapPlugin {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("assets/campus.toml"),
        }
    }
}

impl Plugin for CampusMapPlugin {
    fn build(&self, app: &mut App) {
        let config = CampusConfig::load_or_default(&self.config_path);
        info!(
            "Campus map: {} buildings over {} per batch",
            config.ingest.building_count, config.ingest.batch_size
        );

        app.insert_resource(MapOrigin::from(&config))
            .insert_resource(GeoBounds::from(&config))
            .insert_resource(BuildingPalette::from_config(&config))
            .insert_resource(BatchScheduler::from_config(&config))
            .insert_resource(config)
            .init_resource::<IngestChannel>()
            .init_resource::<HighlightState>()
            .add_systems(Startup, setup_ingestion)
            .add_systems(
                Update,
                (
                    drive_batches,
                    drain_results.run_if(resource_exists::<LayerMaterials>),
                    pointer_pick_system,
                ),
            );
    }
}
