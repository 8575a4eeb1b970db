//! # Batched Ingestion Controller
//!
//! Loads the campus datasets off the render thread. The walkway and road
//! collections dispatch immediately at startup; the per-building files go
//! through a batch scheduler: up to `batch_size` concurrent loads, a full
//! join, a pacing delay, then the next batch. All results funnel through
//! one mpsc channel drained by a single system, so every scene mutation and
//! every palette-cursor advance is serialized.
//!
//! A failed source is logged and dropped; continuation keys on batches
//! dispatched, so ingestion always terminates even when sources are
//! permanently missing.
//!
//! ## Table of Contents
//! 1. SourceKind / IngestOutcome / IngestChannel
//! 2. BatchScheduler — batch FSM
//! 3. Dispatch systems
//! 4. Drain system (single writer)

use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use crate::config::CampusConfig;
use crate::coords::{GeoBounds, MapOrigin};
use crate::features::{import_feature_collection, ImportError, MapFeature};
use crate::layers::LayerKind;
use crate::palette::BuildingPalette;
use crate::scene::{
    build_building_solids, build_road_solids, build_walkway_solids, building_id_from_file,
    SolidSpec,
};

// ============================================================================
// 1. SourceKind / IngestOutcome / IngestChannel
// ============================================================================

/// One loadable dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Walkways,
    Roads,
    /// One per-building collection, addressed by its file name
    /// (`building_<id>.geojson`)
    Building { file: String },
}

/// Result of one background load, success or failure.
pub struct IngestOutcome {
    pub source: SourceKind,
    pub result: Result<Vec<MapFeature>, ImportError>,
}

/// Channel between IO tasks and the drain system. Cloning the sender side
/// into each task keeps the receiver as the single consumer.
#[derive(Resource)]
pub struct IngestChannel {
    pub sender: Arc<Mutex<Sender<IngestOutcome>>>,
    pub receiver: Arc<Mutex<Receiver<IngestOutcome>>>,
}

impl Default for IngestChannel {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender: Arc::new(Mutex::new(sender)),
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }
}

// ============================================================================
// 2. BatchScheduler
// ============================================================================

#[derive(Debug)]
enum SchedulerPhase {
    /// Ready to dispatch the next batch
    Idle,
    /// A batch is out; waiting for every member to come back
    InFlight,
    /// Batch joined; waiting out the pacing delay
    Pacing(Timer),
    /// Source list exhausted
    Done,
}

/// Batch FSM over the ordered building source list. Pure state machine,
/// driven by the dispatch and drain systems and testable without either.
#[derive(Resource, Debug)]
pub struct BatchScheduler {
    pending: VecDeque<SourceKind>,
    batch_size: usize,
    pacing: Duration,
    in_flight: usize,
    phase: SchedulerPhase,
    pub succeeded: usize,
    pub failed: usize,
    done_logged: bool,
}

impl BatchScheduler {
    /// Scheduler over `building_1.geojson` .. `building_<count>.geojson`,
    /// in order.
    pub fn from_config(config: &CampusConfig) -> Self {
        let pending = (1..=config.ingest.building_count)
            .map(|i| SourceKind::Building {
                file: format!("building_{}.geojson", i),
            })
            .collect();
        Self {
            pending,
            batch_size: config.ingest.batch_size.max(1),
            pacing: Duration::from_millis(config.ingest.pacing_delay_ms),
            in_flight: 0,
            phase: SchedulerPhase::Idle,
            succeeded: 0,
            failed: 0,
            done_logged: false,
        }
    }

    /// Advance the pacing timer. No-op outside the pacing phase.
    pub fn tick(&mut self, delta: Duration) {
        if let SchedulerPhase::Pacing(timer) = &mut self.phase {
            if timer.tick(delta).is_finished() {
                self.phase = SchedulerPhase::Idle;
            }
        }
    }

    /// Next batch to dispatch, when idle. Marks the scheduler done once the
    /// source list is exhausted.
    pub fn take_batch(&mut self) -> Option<Vec<SourceKind>> {
        if !matches!(self.phase, SchedulerPhase::Idle) {
            return None;
        }
        if self.pending.is_empty() {
            self.phase = SchedulerPhase::Done;
            return None;
        }
        let take = self.batch_size.min(self.pending.len());
        let batch: Vec<SourceKind> = self.pending.drain(..take).collect();
        self.in_flight = batch.len();
        self.phase = SchedulerPhase::InFlight;
        Some(batch)
    }

    /// Record one building outcome. The batch joins only when every member
    /// has reported back, success or not.
    pub fn record_completion(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 && matches!(self.phase, SchedulerPhase::InFlight) {
            if self.pending.is_empty() {
                self.phase = SchedulerPhase::Done;
            } else {
                self.phase =
                    SchedulerPhase::Pacing(Timer::new(self.pacing, TimerMode::Once));
            }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, SchedulerPhase::Done)
    }

    fn log_done_once(&mut self) {
        if self.is_done() && !self.done_logged {
            self.done_logged = true;
            tracing::info!(
                "Building ingestion complete: {} loaded, {} failed",
                self.succeeded,
                self.failed
            );
        }
    }
}

// ============================================================================
// 3. Dispatch systems
// ============================================================================

/// Shared handles for the non-building layers; buildings get per-solid
/// materials from the palette instead.
#[derive(Resource)]
pub struct LayerMaterials {
    pub walkway: Handle<StandardMaterial>,
    pub road: Handle<StandardMaterial>,
    pub parking: Handle<StandardMaterial>,
}

fn spawn_load_task(
    source: SourceKind,
    path: PathBuf,
    sender: Arc<Mutex<Sender<IngestOutcome>>>,
) {
    IoTaskPool::get()
        .spawn(async move {
            let result = import_feature_collection(&path);
            if let Ok(tx) = sender.lock() {
                let _ = tx.send(IngestOutcome { source, result });
            }
        })
        .detach();
}

/// Startup: allocate the shared layer materials and fire off the walkway
/// and road loads immediately. Building batches follow in Update.
pub fn setup_ingestion(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<CampusConfig>,
    channel: Res<IngestChannel>,
) {
    commands.insert_resource(LayerMaterials {
        walkway: materials.add(StandardMaterial {
            base_color: CampusConfig::color_from_vec(&config.walkways.color),
            perceptual_roughness: 1.0,
            ..Default::default()
        }),
        road: materials.add(StandardMaterial {
            base_color: CampusConfig::color_from_vec(&config.roads.color),
            perceptual_roughness: 1.0,
            ..Default::default()
        }),
        parking: materials.add(StandardMaterial {
            base_color: CampusConfig::color_from_vec(&config.areas.color),
            perceptual_roughness: 1.0,
            ..Default::default()
        }),
    });

    spawn_load_task(
        SourceKind::Walkways,
        config.ingest.walkways_path(),
        channel.sender.clone(),
    );
    spawn_load_task(
        SourceKind::Roads,
        config.ingest.roads_path(),
        channel.sender.clone(),
    );
}

/// Update: drive the batch FSM. Ticks pacing, and dispatches the next
/// building batch when the scheduler goes idle.
pub fn drive_batches(
    time: Res<Time>,
    mut scheduler: ResMut<BatchScheduler>,
    config: Res<CampusConfig>,
    channel: Res<IngestChannel>,
) {
    scheduler.tick(time.delta());
    if let Some(batch) = scheduler.take_batch() {
        debug!("Dispatching batch of {} building sources", batch.len());
        for source in batch {
            let SourceKind::Building { file } = &source else {
                continue;
            };
            let path = config.ingest.building_path(file);
            spawn_load_task(source.clone(), path, channel.sender.clone());
        }
    }
    scheduler.log_done_once();
}

// ============================================================================
// 4. Drain system
// ============================================================================

/// Update: drain every completed load and spawn its solids. This is the
/// only writer of scene entities and the palette cursor, so spawn order
/// (and therefore palette assignment) follows channel arrival order.
pub fn drain_results(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut palette: ResMut<BuildingPalette>,
    mut scheduler: ResMut<BatchScheduler>,
    channel: Res<IngestChannel>,
    layer_materials: Res<LayerMaterials>,
    config: Res<CampusConfig>,
    origin: Res<MapOrigin>,
    bounds: Res<GeoBounds>,
) {
    let outcomes: Vec<IngestOutcome> = match channel.receiver.lock() {
        Ok(receiver) => receiver.try_iter().collect(),
        Err(_) => return,
    };

    for outcome in outcomes {
        let features = match outcome.result {
            Ok(features) => features,
            Err(e) => {
                warn!("Ingestion failed, skipping source: {}", e);
                if matches!(outcome.source, SourceKind::Building { .. }) {
                    scheduler.record_completion(false);
                }
                continue;
            }
        };

        match outcome.source {
            SourceKind::Walkways => {
                let solids = build_walkway_solids(&features, &origin, &config);
                info!("Spawning {} walkway solids", solids.len());
                for spec in solids {
                    let material = layer_materials.walkway.clone();
                    spawn_solid(&mut commands, &mut meshes, spec, material, false);
                }
            }
            SourceKind::Roads => {
                let solids = build_road_solids(&features, &origin, &bounds, &config);
                info!("Spawning {} road/parking solids", solids.len());
                for spec in solids {
                    let material = match spec.layer {
                        LayerKind::Parking => layer_materials.parking.clone(),
                        _ => layer_materials.road.clone(),
                    };
                    spawn_solid(&mut commands, &mut meshes, spec, material, false);
                }
            }
            SourceKind::Building { file } => {
                let id = building_id_from_file(&file);
                let solids = build_building_solids(&features, &origin, &config, &id);
                for spec in solids {
                    let material = materials.add(palette.next_material());
                    spawn_solid(&mut commands, &mut meshes, spec, material, true);
                }
                scheduler.record_completion(true);
            }
        }
    }
}

fn spawn_solid(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    spec: SolidSpec,
    material: Handle<StandardMaterial>,
    casts_shadows: bool,
) {
    let mut entity = commands.spawn((
        Mesh3d(meshes.add(spec.mesh)),
        MeshMaterial3d(material),
        spec.transform,
        crate::layers::CampusLayer::new(spec.layer),
        spec.bounds,
    ));
    if let Some(tag) = spec.tag {
        entity.insert(tag);
    }
    if !casts_shadows {
        entity.insert(NotShadowCaster);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(count: usize, batch_size: usize) -> BatchScheduler {
        let mut config = CampusConfig::default();
        config.ingest.building_count = count;
        config.ingest.batch_size = batch_size;
        config.ingest.pacing_delay_ms = 50;
        BatchScheduler::from_config(&config)
    }

    fn files(batch: &[SourceKind]) -> Vec<&str> {
        batch
            .iter()
            .map(|s| match s {
                SourceKind::Building { file } => file.as_str(),
                _ => panic!("non-building source in batch"),
            })
            .collect()
    }

    #[test]
    fn test_batches_are_ordered_and_sized() {
        let mut scheduler = scheduler(5, 2);
        let batch = scheduler.take_batch().unwrap();
        assert_eq!(files(&batch), ["building_1.geojson", "building_2.geojson"]);
        // In flight: no second batch until the first joins
        assert!(scheduler.take_batch().is_none());
    }

    #[test]
    fn test_batch_joins_then_paces_then_continues() {
        let mut scheduler = scheduler(3, 2);
        let first = scheduler.take_batch().unwrap();
        assert_eq!(first.len(), 2);

        scheduler.record_completion(true);
        // Half-joined: still no dispatch
        assert!(scheduler.take_batch().is_none());
        scheduler.record_completion(true);

        // Joined but pacing: still no dispatch
        assert!(scheduler.take_batch().is_none());
        scheduler.tick(Duration::from_millis(49));
        assert!(scheduler.take_batch().is_none());
        scheduler.tick(Duration::from_millis(2));

        let second = scheduler.take_batch().unwrap();
        assert_eq!(files(&second), ["building_3.geojson"]);
    }

    #[test]
    fn test_terminates_despite_failures() {
        let mut scheduler = scheduler(4, 2);
        for _ in 0..2 {
            let batch = scheduler.take_batch().unwrap();
            for _ in &batch {
                scheduler.record_completion(false);
            }
            scheduler.tick(Duration::from_millis(100));
        }
        assert!(scheduler.is_done());
        assert_eq!(scheduler.failed, 4);
        assert_eq!(scheduler.succeeded, 0);
        assert!(scheduler.take_batch().is_none());
    }

    #[test]
    fn test_final_count_is_success_count() {
        let mut scheduler = scheduler(3, 3);
        let batch = scheduler.take_batch().unwrap();
        assert_eq!(batch.len(), 3);
        scheduler.record_completion(true);
        scheduler.record_completion(false);
        scheduler.record_completion(true);
        assert!(scheduler.is_done());
        assert_eq!(scheduler.succeeded, 2);
    }

    #[test]
    fn test_empty_source_list_is_done_immediately() {
        let mut scheduler = scheduler(0, 100);
        assert!(scheduler.take_batch().is_none());
        assert!(scheduler.is_done());
    }

    #[test]
    fn test_completion_order_within_batch_is_irrelevant() {
        let mut scheduler = scheduler(4, 4);
        scheduler.take_batch().unwrap();
        // Arbitrary interleaving of outcomes joins the batch all the same
        scheduler.record_completion(false);
        scheduler.record_completion(true);
        scheduler.record_completion(true);
        assert!(!scheduler.is_done());
        scheduler.record_completion(true);
        assert!(scheduler.is_done());
    }
}
