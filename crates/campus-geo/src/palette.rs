//! # Building Material Palette
//!
//! A fixed, ordered set of base colors cycled across building solids in
//! allocation order. Every building receives its own `StandardMaterial`
//! instance, so mutating one (the emissive highlight) never touches its
//! palette siblings.

use bevy::prelude::*;

use crate::config::CampusConfig;

/// Cycling material cursor over the configured building palette.
#[derive(Resource, Debug)]
pub struct BuildingPalette {
    slots: Vec<Color>,
    cursor: usize,
    /// Emissive value applied to the highlighted building
    pub highlight: LinearRgba,
}

impl BuildingPalette {
    pub fn new(slots: Vec<Color>, highlight: LinearRgba) -> Self {
        // A palette must never be empty, the cursor needs a modulus
        let slots = if slots.is_empty() {
            vec![Color::srgb(0.8, 0.8, 0.8)]
        } else {
            slots
        };
        Self {
            slots,
            cursor: 0,
            highlight,
        }
    }

    pub fn from_config(config: &CampusConfig) -> Self {
        let slots = config
            .buildings
            .palette
            .iter()
            .map(|c| CampusConfig::color_from_vec(c))
            .collect();
        Self::new(slots, CampusConfig::linear_from_vec(&config.buildings.highlight))
    }

    /// Base color of the next slot, advancing the cursor. Called exactly
    /// once per spawned building solid.
    pub fn next_color(&mut self) -> Color {
        let color = self.slots[self.cursor % self.slots.len()];
        self.cursor += 1;
        color
    }

    /// Fresh material for the next building. Each call allocates an
    /// independent material so per-building highlight stays isolated.
    pub fn next_material(&mut self) -> StandardMaterial {
        StandardMaterial {
            base_color: self.next_color(),
            perceptual_roughness: 0.9,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
