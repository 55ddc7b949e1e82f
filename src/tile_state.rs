use crate::{
    mesh::{TerrainMesh, Triangulator},
    neighbor::RelationId,
    tiling::DisplayTile,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// How a tile should currently be drawn.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum DisplayStatus {
    /// Drawn with its full mesh at the tile's own lod.
    #[default]
    Visible,
    /// Drawn with the precomputed low detail mesh.
    LowDetail,
    /// Not drawn at all. Neighbors do not reconcile their seams against hidden tiles.
    Hidden,
}

/// The display state of a single tile: its meshes, texture and neighbor relations.
///
/// The low detail mesh is built on construction, the full mesh and the texture lazily.
/// Mesh builds are driven by the [`TileGraph`](crate::tile_graph::TileGraph), since they
/// also rewrite the boundary normals of the tile's neighbors.
#[derive(Debug)]
pub struct TileMeshState {
    tile: DisplayTile,
    low_detail_lod: u32,
    pub(crate) mesh: Option<TerrainMesh>,
    pub(crate) low_detail_mesh: TerrainMesh,
    pub(crate) texture: Option<RgbaImage>,
    status: DisplayStatus,
    pub(crate) relations: Vec<RelationId>,
}

impl TileMeshState {
    pub fn new(tile: DisplayTile, low_detail_lod: u32, triangulator: &impl Triangulator) -> Self {
        let low_detail_mesh = triangulator.generate_mesh(&tile.slice, low_detail_lod);

        Self {
            tile,
            low_detail_lod,
            mesh: None,
            low_detail_mesh,
            texture: None,
            status: DisplayStatus::default(),
            relations: Vec::new(),
        }
    }

    pub fn tile(&self) -> &DisplayTile {
        &self.tile
    }

    #[inline]
    pub fn lod(&self) -> u32 {
        self.tile.lod
    }

    pub(crate) fn set_lod(&mut self, lod: u32) {
        self.tile.lod = lod;
    }

    #[inline]
    pub fn status(&self) -> DisplayStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: DisplayStatus) {
        self.status = status;
    }

    /// The lod of the mesh that is currently drawn.
    pub fn effective_lod(&self) -> u32 {
        match self.status {
            DisplayStatus::LowDetail => self.low_detail_lod,
            _ => self.tile.lod,
        }
    }

    /// Whether the full mesh has been built.
    pub fn is_realized(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn mesh(&self) -> Option<&TerrainMesh> {
        self.mesh.as_ref()
    }

    pub fn low_detail_mesh(&self) -> &TerrainMesh {
        &self.low_detail_mesh
    }

    /// The full mesh if the tile is visible and the mesh has been built,
    /// the low detail mesh otherwise.
    pub fn current_mesh(&self) -> &TerrainMesh {
        match (&self.mesh, self.status) {
            (Some(mesh), DisplayStatus::Visible) => mesh,
            _ => &self.low_detail_mesh,
        }
    }

    /// The mesh a neighbor should reconcile its seam against, if any.
    ///
    /// Hidden tiles and visible tiles without a built mesh take no part in seam reconciliation.
    pub(crate) fn seam_mesh_mut(&mut self) -> Option<&mut TerrainMesh> {
        match self.status {
            DisplayStatus::Visible => self.mesh.as_mut(),
            DisplayStatus::LowDetail => Some(&mut self.low_detail_mesh),
            DisplayStatus::Hidden => None,
        }
    }

    pub fn texture(&self) -> Option<&RgbaImage> {
        self.texture.as_ref()
    }

    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }
}
