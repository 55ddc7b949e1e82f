//! The raw height samples of a terrain together with their calibration.
//!
//! A [`HeightField`] is stored row-major in an [`Array2`] of shape `(height, width)`,
//! so the sample at grid position `(x, y)` lives at index `[[y, x]]`.
//! Tiles never copy these samples; they are windows into the field
//! (see [`TileSlice`](crate::tiling::TileSlice)).

use crate::error::{TerrainError, TerrainResult};
use bevy::prelude::*;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

const CELL_SIZE_KEY: &str = "cellsize";
const MIN_HEIGHT_KEY: &str = "minheight";
const MAX_HEIGHT_KEY: &str = "maxheight";

/// Describes how the raw samples map to world units.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// The distance between two neighbouring samples.
    pub cell_size: f32,
    /// The lowest height present in the data set.
    pub min_height: f32,
    /// The highest height present in the data set.
    pub max_height: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            min_height: 0.0,
            max_height: 1.0,
        }
    }
}

impl Calibration {
    pub fn new(cell_size: f32, min_height: f32, max_height: f32) -> Self {
        Self {
            cell_size,
            min_height,
            max_height,
        }
    }

    /// Parses the calibration from the key/value metadata that accompanies a height data set.
    ///
    /// The keys `cellsize`, `minheight` and `maxheight` are required, other keys are ignored.
    pub fn from_metadata<K, V>(metadata: impl IntoIterator<Item = (K, V)>) -> TerrainResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cell_size = None;
        let mut min_height = None;
        let mut max_height = None;

        for (key, value) in metadata {
            let (key, slot) = match key.as_ref().trim().to_ascii_lowercase().as_str() {
                CELL_SIZE_KEY => (CELL_SIZE_KEY, &mut cell_size),
                MIN_HEIGHT_KEY => (MIN_HEIGHT_KEY, &mut min_height),
                MAX_HEIGHT_KEY => (MAX_HEIGHT_KEY, &mut max_height),
                _ => continue,
            };

            let value = value.as_ref().trim();
            let parsed = value
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| TerrainError::InvalidMetadata {
                    key,
                    value: value.to_string(),
                })?;

            *slot = Some(parsed);
        }

        let cell_size = cell_size.ok_or(TerrainError::MissingMetadata(CELL_SIZE_KEY))?;

        if cell_size <= 0.0 {
            return Err(TerrainError::InvalidMetadata {
                key: CELL_SIZE_KEY,
                value: cell_size.to_string(),
            });
        }

        Ok(Self {
            cell_size,
            min_height: min_height.ok_or(TerrainError::MissingMetadata(MIN_HEIGHT_KEY))?,
            max_height: max_height.ok_or(TerrainError::MissingMetadata(MAX_HEIGHT_KEY))?,
        })
    }
}

/// A width × height grid of finite height samples.
#[derive(Clone, Debug)]
pub struct HeightField {
    samples: Array2<f32>,
    calibration: Calibration,
}

impl HeightField {
    /// Creates a height field from samples of shape `(height, width)`.
    ///
    /// The cell size of the calibration has to be positive and finite.
    pub fn new(samples: Array2<f32>, calibration: Calibration) -> TerrainResult<Self> {
        let cell_size = calibration.cell_size;

        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(TerrainError::invalid_argument(format!(
                "cell size {cell_size} must be positive and finite"
            )));
        }

        if samples.is_empty() {
            return Err(TerrainError::EmptyField);
        }

        if let Some(((y, x), _)) = samples.indexed_iter().find(|(_, value)| !value.is_finite()) {
            return Err(TerrainError::NonFiniteSample { x, y });
        }

        Ok(Self {
            samples,
            calibration,
        })
    }

    pub fn from_fn(
        width: usize,
        height: usize,
        calibration: Calibration,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> TerrainResult<Self> {
        Self::new(
            Array2::from_shape_fn((height, width), |(y, x)| f(x, y)),
            calibration,
        )
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width() as u32, self.height() as u32)
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.samples.view()
    }

    /// The factor that maps grid coordinates to world units.
    pub fn scale(&self) -> f32 {
        1.0 / self.calibration.cell_size
    }

    pub fn height_multiplier(&self) -> f32 {
        1.0 / self.calibration.max_height
    }

    /// The position of the first sample, when the grid is centred on the origin.
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(
            -(self.width() as f32 - 1.0) / 2.0,
            (self.height() as f32 - 1.0) / 2.0,
        )
    }

    #[inline]
    pub fn raw(&self, x: usize, y: usize) -> f32 {
        self.samples[[y, x]]
    }

    /// The sample relative to the minimum height, scaled by the
    /// [`height_multiplier`](Self::height_multiplier).
    pub fn normalized(&self, x: usize, y: usize) -> f32 {
        (self.raw(x, y) - self.calibration.min_height) * self.height_multiplier()
    }

    /// The sample remapped into `[0, 1]` over the calibrated height range.
    pub fn squished(&self, x: usize, y: usize) -> f32 {
        let range = self.calibration.max_height - self.calibration.min_height;

        if range == 0.0 {
            0.0
        } else {
            (self.raw(x, y) - self.calibration.min_height) / range
        }
    }

    /// Overwrites a single sample. Only intended for authoring tools.
    pub fn set(&mut self, x: usize, y: usize, value: f32) -> TerrainResult<()> {
        if x >= self.width() || y >= self.height() {
            return Err(TerrainError::invalid_argument(format!(
                "sample ({x}, {y}) is outside of the {}x{} height field",
                self.width(),
                self.height()
            )));
        }

        if !value.is_finite() {
            return Err(TerrainError::NonFiniteSample { x, y });
        }

        self.samples[[y, x]] = value;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const PRECISION: f32 = 0.00001;

    fn field() -> HeightField {
        let calibration =
            Calibration::from_metadata([("cellsize", "2"), ("minheight", "1"), ("maxheight", "6")])
                .unwrap();

        // two columns, three rows
        HeightField::new(array![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]], calibration).unwrap()
    }

    #[test]
    fn dimensions() {
        let field = field();

        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 3);
        assert_eq!(field.size(), UVec2::new(2, 3));
    }

    #[test]
    fn calibrated_accessors() {
        let field = field();

        assert_eq!(field.raw(1, 0), 4.0);
        assert!((field.scale() - 0.5).abs() < PRECISION);
        assert!((field.height_multiplier() - 1.0 / 6.0).abs() < PRECISION);
        assert!((field.normalized(1, 2) - 5.0 / 6.0).abs() < PRECISION);
        assert_eq!(field.squished(1, 2), 1.0);
        assert_eq!(field.squished(0, 0), 0.0);
        assert_eq!(field.top_left(), Vec2::new(-0.5, 1.0));
    }

    #[test]
    fn set_sample() {
        let mut field = field();

        field.set(0, 2, -1.0).unwrap();
        assert_eq!(field.raw(0, 2), -1.0);

        assert!(field.set(2, 0, 1.0).is_err());
        assert_eq!(
            field.set(0, 0, f32::NAN),
            Err(TerrainError::NonFiniteSample { x: 0, y: 0 })
        );
    }

    #[test]
    fn rejects_invalid_samples() {
        let calibration = Calibration::default();

        assert_eq!(
            HeightField::new(Array2::zeros((0, 4)), calibration).unwrap_err(),
            TerrainError::EmptyField
        );
        assert_eq!(
            HeightField::new(array![[0.0, f32::INFINITY]], calibration).unwrap_err(),
            TerrainError::NonFiniteSample { x: 1, y: 0 }
        );
    }

    #[test]
    fn rejects_invalid_cell_sizes() {
        for cell_size in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                HeightField::new(array![[0.0]], Calibration::new(cell_size, 0.0, 1.0)),
                Err(TerrainError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn metadata_errors() {
        assert_eq!(
            Calibration::from_metadata([("cellsize", "2"), ("minheight", "1")]).unwrap_err(),
            TerrainError::MissingMetadata("maxheight")
        );
        assert!(matches!(
            Calibration::from_metadata([
                ("cellsize", "abc"),
                ("minheight", "1"),
                ("maxheight", "2")
            ]),
            Err(TerrainError::InvalidMetadata { key: "cellsize", .. })
        ));
        assert!(
            Calibration::from_metadata([("cellsize", "0"), ("minheight", "1"), ("maxheight", "2")])
                .is_err()
        );
    }
}
