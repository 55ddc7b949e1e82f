//! The CPU side mesh of a single tile and the triangulation interface that produces it.

use crate::{
    density::{LodStepDensity, VertexDensity},
    tiling::TileSlice,
};
use bevy::{
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        render_asset::RenderAssetUsages,
    },
};
use itertools::iproduct;

/// A triangulated tile, whose vertices form a row-major `grid.x × grid.y` lattice.
///
/// The lattice layout is what allows adjacent tiles to locate their shared boundary
/// vertices without looking at the positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainMesh {
    /// The number of vertex columns and rows.
    pub grid: UVec2,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    #[inline]
    pub fn columns(&self) -> u32 {
        self.grid.x
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.grid.y
    }

    #[inline]
    pub fn vertex_index(&self, x: u32, y: u32) -> usize {
        (y * self.grid.x + x) as usize
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn normal(&self, x: u32, y: u32) -> Vec3 {
        self.normals[self.vertex_index(x, y)]
    }

    /// Converts the tile into a bevy [`Mesh`] for rendering.
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.positions.iter().map(|p| p.to_array()).collect();
        let normals: Vec<[f32; 3]> = self.normals.iter().map(|n| n.to_array()).collect();
        let uvs: Vec<[f32; 2]> = self.uvs.iter().map(|uv| uv.to_array()).collect();

        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}

/// Turns a tile's height samples into a mesh.
///
/// Implementations must be deterministic for identical slices and lods.
pub trait Triangulator {
    fn generate_mesh(&self, slice: &TileSlice, lod: u32) -> TerrainMesh;
}

/// A regular grid triangulation with area weighted vertex normals.
///
/// Every `step`-th sample becomes a vertex, the last row and column are always included.
#[derive(Clone, Debug)]
pub struct GridTriangulator<D = LodStepDensity> {
    pub density: D,
    pub height_scale: f32,
}

impl Default for GridTriangulator {
    fn default() -> Self {
        Self {
            density: LodStepDensity,
            height_scale: 1.0,
        }
    }
}

impl GridTriangulator {
    pub fn new(height_scale: f32) -> Self {
        Self {
            density: LodStepDensity,
            height_scale,
        }
    }
}

impl<D: VertexDensity> GridTriangulator<D> {
    fn sample_coordinate(count: u32, size: u32, i: u32) -> u32 {
        if count <= 1 {
            0
        } else {
            let coordinate = (i as u64 * (size - 1) as u64).div_ceil((count - 1) as u64);

            (coordinate as u32).min(size - 1)
        }
    }
}

impl<D: VertexDensity> Triangulator for GridTriangulator<D> {
    fn generate_mesh(&self, slice: &TileSlice, lod: u32) -> TerrainMesh {
        if slice.width() == 0 || slice.height() == 0 {
            trace!("skipping the triangulation of an empty tile");
            return TerrainMesh::default();
        }

        let grid = UVec2::new(
            self.density.vertices_per_dimension(slice.width(), lod),
            self.density.vertices_per_dimension(slice.height(), lod),
        );

        let top_left = slice.top_left();
        let scale = slice.scale();

        let (positions, uvs): (Vec<Vec3>, Vec<Vec2>) = iproduct!(0..grid.y, 0..grid.x)
            .map(|(y, x)| {
                let sample_x = Self::sample_coordinate(grid.x, slice.width(), x);
                let sample_y = Self::sample_coordinate(grid.y, slice.height(), y);

                let position = Vec3::new(
                    (top_left.x + sample_x as f32) * scale,
                    slice.squished(sample_x, sample_y) * self.height_scale,
                    (sample_y as f32 - top_left.y) * scale,
                );
                let uv = Vec2::new(
                    sample_x as f32 / (slice.width().max(2) - 1) as f32,
                    sample_y as f32 / (slice.height().max(2) - 1) as f32,
                );

                (position, uv)
            })
            .unzip();

        let mut indices = Vec::new();

        for (y, x) in iproduct!(0..grid.y.saturating_sub(1), 0..grid.x.saturating_sub(1)) {
            let a = y * grid.x + x;
            let b = a + 1;
            let c = a + grid.x + 1;
            let d = a + grid.x;

            indices.extend_from_slice(&[a, d, c, a, c, b]);
        }

        let mut normals = vec![Vec3::ZERO; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [0, 1, 2].map(|i| triangle[i] as usize);
            let face_normal =
                (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        trace!(
            "triangulated {}x{} tile at lod {lod} into {} vertices",
            slice.width(),
            slice.height(),
            positions.len()
        );

        TerrainMesh {
            grid,
            positions,
            normals,
            uvs,
            indices,
        }
    }
}
