//! This crate splits large height-field terrains into independently meshed tiles
//! and stitches their meshes back together into a seamless surface.
//!
//! # Background
//! Each tile of a terrain can be meshed at its own level of detail, depending on how
//! close it is to the viewer. Because every tile is triangulated on its own, the normals
//! of the vertices on a tile's boundary only account for the triangles of that tile.
//! Two adjacent tiles therefore disagree about the normals along their shared edge,
//! which shows up as a visible lighting seam, even more so when the tiles use
//! different vertex densities.
//!
//! ## How are the tiles produced?
//! A [`HeightField`](height_field::HeightField) is partitioned into
//! [`DisplayTile`](tiling::DisplayTile)s, each a window into the shared samples tagged
//! with a lod. See the [`tiling`] module.
//!
//! ## How are the seams removed?
//! Tiles are registered with a [`TileGraph`](tile_graph::TileGraph) together with one
//! [`NeighborRelation`](neighbor::NeighborRelation) per adjacent pair. Whenever the mesh
//! of a tile is built, the boundary normals of the tile and each of its drawn neighbors
//! are averaged and written back into both meshes. See the [`seam`] module.
//!
//! Triangulation itself is pluggable through the [`Triangulator`](mesh::Triangulator) trait.

pub mod config;
pub mod density;
pub mod error;
pub mod formats;
pub mod height_field;
pub mod mesh;
pub mod neighbor;
pub mod seam;
pub mod texture;
pub mod tile_graph;
pub mod tile_state;
pub mod tiling;

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        config::SeamConfig,
        density::{LodStepDensity, VertexDensity},
        error::{TerrainError, TerrainResult},
        height_field::{Calibration, HeightField},
        mesh::{GridTriangulator, TerrainMesh, Triangulator},
        neighbor::{NeighborRelation, Orientation, RelationId, TileId},
        seam::{consensus_normal, reconcile_seam, SeamStats},
        texture::{AreaColorLookup, TerrainRegion, TileTexturer},
        tile_graph::TileGraph,
        tile_state::{DisplayStatus, TileMeshState},
        tiling::{
            partition_grid, partition_grid_at, partition_rect, partition_uniform, DisplayTile,
            TileSlice,
        },
    };
}
