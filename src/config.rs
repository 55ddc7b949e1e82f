use crate::texture::TerrainRegion;
use anyhow::{Context, Result};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// The settings shared by all tiles of a [`TileGraph`](crate::tile_graph::TileGraph).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SeamConfig {
    /// The size of a tile in samples.
    pub tile_size: UVec2,
    /// The lod of the fallback mesh every tile builds on construction.
    pub low_detail_lod: u32,
    /// Multiplies the squished heights when triangulating.
    pub height_scale: f32,
    /// The colour ramp, ordered by ascending height. Empty for grayscale textures.
    pub regions: Vec<TerrainRegion>,
}

impl Default for SeamConfig {
    fn default() -> Self {
        Self {
            tile_size: UVec2::splat(64),
            low_detail_lod: 20,
            height_scale: 1.0,
            regions: Vec::new(),
        }
    }
}

impl SeamConfig {
    pub fn from_ron(source: &str) -> Result<Self> {
        ron::from_str(source).context("Failed to parse the seam config.")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read the seam config at {}.", path.display()))?;

        Self::from_ron(&source)
    }
}
