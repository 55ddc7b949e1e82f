//! Reconciles the normals along the shared boundary of two adjacent tile meshes.
//!
//! Both tiles are triangulated independently, so the normals of their boundary
//! vertices are computed from different triangles and disagree, which shows up as a
//! lighting seam. This module walks both boundaries in lock-step, averages each pair of
//! normals and writes the consensus back into both meshes.
//!
//! When the tiles are meshed at different levels of detail, the boundaries contain a
//! different number of vertices. The denser boundary then advances in strides of
//! `dense / sparse` vertices, while the sparser one advances by one. The vertices the
//! denser side skips are back-filled with the consensus of the next visited pair.
//! This is an approximate alignment, not an interpolation.

use crate::{mesh::TerrainMesh, neighbor::Orientation};
use bevy::prelude::*;

/// Sums below this squared length are treated as cancelled out.
const DEGENERATE_THRESHOLD: f32 = 1e-12;

/// Averages two unit normals.
///
/// Returns `None` if the normals (nearly) cancel each other out.
#[inline]
pub fn consensus_normal(a: Vec3, b: Vec3) -> Option<Vec3> {
    let sum = a + b;
    let length_squared = sum.length_squared();

    if length_squared < DEGENERATE_THRESHOLD || !length_squared.is_finite() {
        None
    } else {
        Some(sum / length_squared.sqrt())
    }
}

/// Counters describing a single seam pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeamStats {
    /// Pairs of boundary vertices that were compared.
    pub visited: usize,
    /// Pairs whose normals cancelled out and were left untouched.
    pub degenerate: usize,
    /// Skipped vertices that received the consensus of their successor.
    pub filled: usize,
}

/// The vertices along one edge of a mesh's vertex lattice.
#[derive(Clone, Copy, Debug)]
struct Boundary {
    start: usize,
    stride: usize,
    count: usize,
}

impl Boundary {
    const EMPTY: Self = Self {
        start: 0,
        stride: 1,
        count: 0,
    };

    fn last_row(mesh: &TerrainMesh) -> Self {
        if mesh.grid.cmpeq(UVec2::ZERO).any() {
            return Self::EMPTY;
        }

        Self {
            start: mesh.vertex_index(0, mesh.rows() - 1),
            stride: 1,
            count: mesh.columns() as usize,
        }
    }

    fn first_row(mesh: &TerrainMesh) -> Self {
        if mesh.grid.cmpeq(UVec2::ZERO).any() {
            return Self::EMPTY;
        }

        Self {
            start: 0,
            stride: 1,
            count: mesh.columns() as usize,
        }
    }

    fn last_column(mesh: &TerrainMesh) -> Self {
        if mesh.grid.cmpeq(UVec2::ZERO).any() {
            return Self::EMPTY;
        }

        Self {
            start: mesh.vertex_index(mesh.columns() - 1, 0),
            stride: mesh.columns() as usize,
            count: mesh.rows() as usize,
        }
    }

    fn first_column(mesh: &TerrainMesh) -> Self {
        if mesh.grid.cmpeq(UVec2::ZERO).any() {
            return Self::EMPTY;
        }

        Self {
            start: 0,
            stride: mesh.columns() as usize,
            count: mesh.rows() as usize,
        }
    }

    #[inline]
    fn index(&self, coordinate: usize) -> usize {
        self.start + coordinate * self.stride
    }

    /// How far this side advances per step, when walked alongside `other`.
    fn step(&self, other: &Self) -> usize {
        if self.count > other.count {
            (self.count / other.count).max(1)
        } else {
            1
        }
    }
}

/// Writes `normal` into the vertices skipped since the previous visit.
fn fill_in(
    normals: &mut [Vec3],
    boundary: &Boundary,
    coordinate: usize,
    step: usize,
    normal: Vec3,
) -> usize {
    if step <= 1 || coordinate == 0 {
        return 0;
    }

    for offset in 1..step {
        normals[boundary.index(coordinate - offset)] = normal;
    }

    step - 1
}

/// Reconciles the boundary normals of two adjacent meshes in place.
///
/// For [`Orientation::Vertical`] the bottom row of `first` meets the top row of `second`,
/// for [`Orientation::Horizontal`] the right column of `first` meets the left column of `second`.
pub fn reconcile_seam(
    first: &mut TerrainMesh,
    second: &mut TerrainMesh,
    orientation: Orientation,
) -> SeamStats {
    let (first_boundary, second_boundary) = match orientation {
        Orientation::Vertical => (Boundary::last_row(first), Boundary::first_row(second)),
        Orientation::Horizontal => (Boundary::last_column(first), Boundary::first_column(second)),
    };

    let mut stats = SeamStats::default();

    if first_boundary.count == 0 || second_boundary.count == 0 {
        return stats;
    }

    debug_assert_eq!(first.normals.len(), first.vertex_count());
    debug_assert_eq!(second.normals.len(), second.vertex_count());

    let first_step = first_boundary.step(&second_boundary);
    let second_step = second_boundary.step(&first_boundary);

    let (mut first_coordinate, mut second_coordinate) = (0, 0);

    while first_coordinate < first_boundary.count && second_coordinate < second_boundary.count {
        let first_index = first_boundary.index(first_coordinate);
        let second_index = second_boundary.index(second_coordinate);

        stats.visited += 1;

        match consensus_normal(first.normals[first_index], second.normals[second_index]) {
            Some(consensus) => {
                first.normals[first_index] = consensus;
                second.normals[second_index] = consensus;

                stats.filled += fill_in(
                    &mut first.normals,
                    &first_boundary,
                    first_coordinate,
                    first_step,
                    consensus,
                );
                stats.filled += fill_in(
                    &mut second.normals,
                    &second_boundary,
                    second_coordinate,
                    second_step,
                    consensus,
                );
            }
            None => {
                trace!(
                    "skipping opposite normals at boundary vertices {first_index} and {second_index}"
                );
                stats.degenerate += 1;
            }
        }

        first_coordinate += first_step;
        second_coordinate += second_step;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const TOLERANCE: f32 = 1e-5;

    fn random_unit(rng: &mut StdRng) -> Vec3 {
        loop {
            let v = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );

            if let Some(v) = v.try_normalize() {
                return v;
            }
        }
    }

    fn random_mesh(rng: &mut StdRng, columns: u32, rows: u32) -> TerrainMesh {
        let count = (columns * rows) as usize;

        TerrainMesh {
            grid: UVec2::new(columns, rows),
            positions: vec![Vec3::ZERO; count],
            normals: (0..count).map(|_| random_unit(rng)).collect(),
            uvs: vec![Vec2::ZERO; count],
            indices: Vec::new(),
        }
    }

    fn row(mesh: &TerrainMesh, y: u32) -> Vec<Vec3> {
        (0..mesh.columns()).map(|x| mesh.normal(x, y)).collect()
    }

    fn column(mesh: &TerrainMesh, x: u32) -> Vec<Vec3> {
        (0..mesh.rows()).map(|y| mesh.normal(x, y)).collect()
    }

    #[test]
    fn consensus_is_unit_length() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let (a, b) = (random_unit(&mut rng), random_unit(&mut rng));

            if let Some(consensus) = consensus_normal(a, b) {
                assert!((consensus.length() - 1.0).abs() < TOLERANCE);
            }
        }

        assert_eq!(consensus_normal(Vec3::Y, Vec3::Y), Some(Vec3::Y));
    }

    #[test]
    fn opposite_normals_have_no_consensus() {
        assert_eq!(consensus_normal(Vec3::X, Vec3::NEG_X), None);
        assert_eq!(consensus_normal(Vec3::Y, Vec3::NEG_Y), None);
    }

    #[test]
    fn vertical_seam_with_equal_density() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut top = random_mesh(&mut rng, 4, 2);
        let mut bottom = random_mesh(&mut rng, 4, 2);
        let untouched = (row(&top, 0), row(&bottom, 1));

        let stats = reconcile_seam(&mut top, &mut bottom, Orientation::Vertical);

        assert_eq!(stats.visited, 4);
        assert_eq!(stats.filled, 0);
        assert_eq!(row(&top, 1), row(&bottom, 0));
        assert_eq!((row(&top, 0), row(&bottom, 1)), untouched);
    }

    #[test]
    fn horizontal_seam_with_equal_density() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut left = random_mesh(&mut rng, 3, 5);
        let mut right = random_mesh(&mut rng, 2, 5);

        let stats = reconcile_seam(&mut left, &mut right, Orientation::Horizontal);

        assert_eq!(stats.visited, 5);
        assert_eq!(column(&left, 2), column(&right, 0));
        assert!(column(&left, 2)
            .iter()
            .all(|normal| (normal.length() - 1.0).abs() < TOLERANCE));
    }

    #[test]
    fn mismatched_density_with_unit_strides() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut fine = random_mesh(&mut rng, 5, 3);
        let mut coarse = random_mesh(&mut rng, 3, 2);
        let fine_tail = (fine.normal(3, 2), fine.normal(4, 2));

        let stats = reconcile_seam(&mut fine, &mut coarse, Orientation::Vertical);

        // 5 / 3 rounds down to a stride of one on both sides
        assert_eq!(stats.visited, 3);
        assert_eq!(stats.filled, 0);

        for x in 0..3 {
            assert_eq!(fine.normal(x, 2), coarse.normal(x, 0));
        }

        assert_eq!((fine.normal(3, 2), fine.normal(4, 2)), fine_tail);
    }

    #[test]
    fn denser_side_strides_and_fills() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut fine = random_mesh(&mut rng, 9, 2);
        let mut coarse = random_mesh(&mut rng, 3, 2);

        let stats = reconcile_seam(&mut coarse, &mut fine, Orientation::Vertical);

        assert_eq!(stats.visited, 3);
        assert_eq!(stats.filled, 4);

        for (x, fine_x) in [(0, 0), (1, 3), (2, 6)] {
            assert_eq!(coarse.normal(x, 1), fine.normal(fine_x, 0));
        }

        for x in [1, 2] {
            assert_eq!(fine.normal(x, 0), coarse.normal(1, 1));
        }
        for x in [4, 5] {
            assert_eq!(fine.normal(x, 0), coarse.normal(2, 1));
        }
    }

    #[test]
    fn opposite_normals_are_left_unchanged() {
        let mut first = random_mesh(&mut StdRng::seed_from_u64(5), 2, 2);
        let mut second = first.clone();

        first.normals[2] = Vec3::Y;
        first.normals[3] = Vec3::Y;
        second.normals[0] = Vec3::NEG_Y;
        second.normals[1] = Vec3::X;

        let stats = reconcile_seam(&mut first, &mut second, Orientation::Vertical);

        assert_eq!(stats.degenerate, 1);
        assert_eq!(first.normals[2], Vec3::Y);
        assert_eq!(second.normals[0], Vec3::NEG_Y);
        assert_eq!(first.normals[3], second.normals[1]);
        assert!(first.normals.iter().all(|normal| normal.is_finite()));
    }

    #[test]
    fn empty_mesh_terminates_immediately() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut tile = random_mesh(&mut rng, 3, 3);
        let mut empty = random_mesh(&mut rng, 0, 0);
        let before = tile.clone();

        let stats = reconcile_seam(&mut tile, &mut empty, Orientation::Horizontal);

        assert_eq!(stats, SeamStats::default());
        assert_eq!(tile, before);
    }
}
