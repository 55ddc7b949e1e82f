//! Splitting a [`HeightField`] into independently meshed tiles.
//!
//! All partition functions are pure and deterministic. Tiles at the far edges of the
//! field are truncated to the remaining samples, but never dropped.
//! A tile whose origin lies outside of the field is a caller bug and reported as
//! [`TerrainError::InvalidArgument`].

use crate::{
    error::{TerrainError, TerrainResult},
    height_field::HeightField,
};
use bevy::prelude::*;
use itertools::iproduct;
use ndarray::{s, ArrayView2};
use std::sync::Arc;

/// A rectangular window into a [`HeightField`].
///
/// Sample access is translated to parent coordinates, the backing data is shared.
#[derive(Clone, Debug)]
pub struct TileSlice {
    field: Arc<HeightField>,
    offset: UVec2,
    size: UVec2,
}

impl TileSlice {
    pub fn new(field: Arc<HeightField>, offset: UVec2, size: UVec2) -> TerrainResult<Self> {
        let end = offset + size;

        if end.x > field.size().x || end.y > field.size().y {
            return Err(TerrainError::invalid_argument(format!(
                "slice {offset}..{end} exceeds the {} height field",
                field.size()
            )));
        }

        Ok(Self {
            field,
            offset,
            size,
        })
    }

    /// A slice covering the whole field.
    pub fn full(field: Arc<HeightField>) -> Self {
        let size = field.size();

        Self {
            field,
            offset: UVec2::ZERO,
            size,
        }
    }

    pub fn field(&self) -> &Arc<HeightField> {
        &self.field
    }

    #[inline]
    pub fn offset(&self) -> UVec2 {
        self.offset
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.y
    }

    #[inline]
    fn parent_position(&self, x: u32, y: u32) -> (usize, usize) {
        debug_assert!(x < self.size.x && y < self.size.y);
        ((self.offset.x + x) as usize, (self.offset.y + y) as usize)
    }

    pub fn raw(&self, x: u32, y: u32) -> f32 {
        let (x, y) = self.parent_position(x, y);
        self.field.raw(x, y)
    }

    pub fn normalized(&self, x: u32, y: u32) -> f32 {
        let (x, y) = self.parent_position(x, y);
        self.field.normalized(x, y)
    }

    pub fn squished(&self, x: u32, y: u32) -> f32 {
        let (x, y) = self.parent_position(x, y);
        self.field.squished(x, y)
    }

    pub fn scale(&self) -> f32 {
        self.field.scale()
    }

    /// The position of the first sample of this slice in the centred grid of the parent.
    pub fn top_left(&self) -> Vec2 {
        self.field.top_left() + Vec2::new(self.offset.x as f32, -(self.offset.y as f32))
    }

    /// The samples of this slice, shape `(height, width)`.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        let (x, y) = (self.offset.x as usize, self.offset.y as usize);
        let (width, height) = (self.size.x as usize, self.size.y as usize);

        self.field
            .view()
            .slice_move(s![y..y + height, x..x + width])
    }
}

/// A [`TileSlice`] tagged with the level of detail it should be meshed at.
///
/// A lod of 0 is full detail, larger values are coarser.
#[derive(Clone, Debug)]
pub struct DisplayTile {
    pub slice: TileSlice,
    pub lod: u32,
}

impl DisplayTile {
    pub fn new(slice: TileSlice, lod: u32) -> Self {
        Self { slice, lod }
    }

    /// The same geometry at a different level of detail.
    pub fn with_lod(&self, lod: u32) -> Self {
        Self {
            slice: self.slice.clone(),
            lod,
        }
    }
}

/// Splits the field into consecutive horizontal bands of `tile_height` rows.
pub fn partition_uniform(
    field: &Arc<HeightField>,
    tile_height: u32,
) -> TerrainResult<Vec<TileSlice>> {
    if tile_height == 0 {
        return Err(TerrainError::invalid_argument("tile height must be positive"));
    }

    let size = field.size();

    Ok((0..size.y)
        .step_by(tile_height as usize)
        .map(|y| TileSlice {
            field: field.clone(),
            offset: UVec2::new(0, y),
            size: UVec2::new(size.x, tile_height.min(size.y - y)),
        })
        .collect())
}

/// Splits the field into `count.x × count.y` tiles of `tile_size`, starting at `origin`.
///
/// The result is ordered row-major (`y * count.x + x`).
pub fn partition_rect(
    field: &Arc<HeightField>,
    origin: UVec2,
    tile_size: UVec2,
    count: UVec2,
) -> TerrainResult<Vec<TileSlice>> {
    if tile_size.x == 0 || tile_size.y == 0 {
        return Err(TerrainError::invalid_argument(format!(
            "tile size {tile_size} must be positive"
        )));
    }

    let field_size = field.size();

    iproduct!(0..count.y, 0..count.x)
        .map(|(y, x)| {
            let offset = origin + UVec2::new(x, y) * tile_size;

            if offset.x >= field_size.x || offset.y >= field_size.y {
                return Err(TerrainError::invalid_argument(format!(
                    "tile ({x}, {y}) starts at {offset}, outside of the {field_size} height field"
                )));
            }

            TileSlice::new(field.clone(), offset, tile_size.min(field_size - offset))
        })
        .collect()
}

/// Splits the field into a grid of [`DisplayTile`]s.
///
/// The `lod_matrix` has the shape `(cols, rows)` and is indexed `[[x, y]]`;
/// tile `(x, y)` is meshed at `lod_matrix[[x, y]]`.
/// The result is ordered row-major (`y * cols + x`).
pub fn partition_grid(
    field: &Arc<HeightField>,
    tile_size: UVec2,
    lod_matrix: ArrayView2<u32>,
) -> TerrainResult<Vec<DisplayTile>> {
    partition_grid_at(field, UVec2::ZERO, tile_size, lod_matrix)
}

/// Same as [`partition_grid`], with the grid starting at `origin`.
pub fn partition_grid_at(
    field: &Arc<HeightField>,
    origin: UVec2,
    tile_size: UVec2,
    lod_matrix: ArrayView2<u32>,
) -> TerrainResult<Vec<DisplayTile>> {
    let (cols, rows) = lod_matrix.dim();

    if cols == 0 || rows == 0 {
        return Err(TerrainError::invalid_argument("lod matrix must not be empty"));
    }

    let slices = partition_rect(field, origin, tile_size, UVec2::new(cols as u32, rows as u32))?;

    Ok(slices
        .into_iter()
        .zip(iproduct!(0..rows, 0..cols))
        .map(|(slice, (y, x))| DisplayTile::new(slice, lod_matrix[[x, y]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_field::Calibration;
    use ndarray::array;

    fn field(width: usize, height: usize) -> Arc<HeightField> {
        Arc::new(
            HeightField::from_fn(width, height, Calibration::default(), |x, y| {
                (y * width + x) as f32
            })
            .unwrap(),
        )
    }

    #[test]
    fn uniform_bands_cover_the_field() {
        let field = field(3, 10);

        for tile_height in 1..=12 {
            let slices = partition_uniform(&field, tile_height).unwrap();
            let expected = 10u32.div_ceil(tile_height);

            assert_eq!(slices.len() as u32, expected);
            assert_eq!(slices.iter().map(TileSlice::height).sum::<u32>(), 10);
            assert_eq!(
                slices.last().unwrap().height(),
                10 - tile_height * (expected - 1)
            );
            assert!(slices.iter().all(|slice| slice.width() == 3));
        }
    }

    #[test]
    fn uniform_rejects_zero_height() {
        assert!(matches!(
            partition_uniform(&field(2, 2), 0),
            Err(TerrainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn slices_translate_to_parent() {
        let field = field(2, 3);
        let slices = partition_uniform(&field, 2).unwrap();

        assert_eq!(slices[0].size(), UVec2::new(2, 2));
        assert_eq!(slices[0].raw(1, 1), 3.0);
        assert_eq!(slices[1].size(), UVec2::new(2, 1));
        assert_eq!(slices[1].raw(0, 0), 4.0);
        assert_eq!(slices[1].top_left(), Vec2::new(-0.5, -1.0));
        assert_eq!(slices[1].view(), array![[4.0, 5.0]]);
    }

    #[test]
    fn rect_with_offset() {
        let field = field(2, 3);
        let slices =
            partition_rect(&field, UVec2::new(1, 2), UVec2::new(2, 2), UVec2::ONE).unwrap();

        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].raw(0, 0), 5.0);
        assert_eq!(slices[0].size(), UVec2::ONE);
    }

    #[test]
    fn grid_lods_are_row_major() {
        let field = field(8, 9);
        let lod_matrix = array![[1, 2, 5], [3, 4, 6]];
        let tiles = partition_grid(&field, UVec2::new(4, 3), lod_matrix.view()).unwrap();

        let (cols, rows) = lod_matrix.dim();
        assert_eq!(tiles.len(), cols * rows);

        for (x, y) in iproduct!(0..cols, 0..rows) {
            let tile = &tiles[y * cols + x];

            assert_eq!(tile.lod, lod_matrix[[x, y]]);
            assert_eq!(
                tile.slice.offset(),
                UVec2::new(x as u32 * 4, y as u32 * 3)
            );
        }
    }

    #[test]
    fn grid_keeps_ragged_tiles() {
        let field = field(5, 5);
        let lod_matrix = array![[0, 0], [0, 0]];
        let tiles = partition_grid(&field, UVec2::new(3, 3), lod_matrix.view()).unwrap();

        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[0].slice.size(), UVec2::new(3, 3));
        assert_eq!(tiles[1].slice.size(), UVec2::new(2, 3));
        assert_eq!(tiles[2].slice.size(), UVec2::new(3, 2));
        assert_eq!(tiles[3].slice.size(), UVec2::new(2, 2));
    }

    #[test]
    fn grid_outside_of_field_is_rejected() {
        let field = field(2, 3);

        let lod_matrix = array![[1, 2], [3, 4]];

        assert!(partition_grid(&field, UVec2::new(2, 3), lod_matrix.view()).is_err());
        assert!(TileSlice::new(field, UVec2::new(1, 0), UVec2::new(2, 1)).is_err());
    }
}
