//! Colour-ramp texturing of tiles.

use crate::tiling::TileSlice;
use bevy::prelude::*;
use image::{Rgba, RgbaImage};
use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// A band of the colour ramp, covering all squished heights up to `height`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TerrainRegion {
    pub name: String,
    pub height: f32,
    pub colour: Color,
}

/// Supplies an overlay colour for a position of the height field (eg. highlighted areas).
///
/// Black means no overlay.
pub trait AreaColorLookup {
    fn color_at(&self, world_x: f32, world_y: f32) -> Color;
}

impl<F: Fn(f32, f32) -> Color> AreaColorLookup for F {
    fn color_at(&self, world_x: f32, world_y: f32) -> Color {
        self(world_x, world_y)
    }
}

fn to_rgba8(colour: Srgba) -> Rgba<u8> {
    Rgba([colour.red, colour.green, colour.blue, colour.alpha]
        .map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
}

#[derive(Default)]
pub struct TileTexturer {
    pub regions: Vec<TerrainRegion>,
    pub area: Option<Box<dyn AreaColorLookup + Send + Sync>>,
}

impl TileTexturer {
    pub fn new(regions: Vec<TerrainRegion>) -> Self {
        Self {
            regions,
            area: None,
        }
    }

    pub fn with_area(mut self, area: impl AreaColorLookup + Send + Sync + 'static) -> Self {
        self.area = Some(Box::new(area));
        self
    }

    /// The colour of the first region reaching `height`, white above all regions.
    pub fn region_colour(&self, height: f32) -> Color {
        self.regions
            .iter()
            .find(|region| height <= region.height)
            .map_or(Color::WHITE, |region| region.colour)
    }

    fn texel(&self, slice: &TileSlice, x: u32, y: u32) -> Srgba {
        let height = slice.squished(x, y);

        if self.regions.is_empty() {
            let gray = height.clamp(0.0, 1.0);
            return Srgba::new(gray, gray, gray, 1.0);
        }

        let region = self.region_colour(height).to_srgba();

        let Some(area) = &self.area else {
            return region;
        };

        let position = slice.offset() + UVec2::new(x, y);
        let area = area.color_at(position.x as f32, position.y as f32).to_srgba();

        if area.red == 0.0 && area.green == 0.0 && area.blue == 0.0 {
            region
        } else {
            Srgba::new(
                (area.red - region.red).clamp(0.0, 1.0),
                (area.green - region.green).clamp(0.0, 1.0),
                (area.blue - region.blue).clamp(0.0, 1.0),
                1.0,
            )
        }
    }

    /// Colours every sample of the slice.
    ///
    /// Without regions, the texture is a grayscale image of the squished heights.
    pub fn generate(&self, slice: &TileSlice) -> RgbaImage {
        let mut image = RgbaImage::new(slice.width(), slice.height());

        for (y, x) in iproduct!(0..slice.height(), 0..slice.width()) {
            image.put_pixel(x, y, to_rgba8(self.texel(slice, x, y)));
        }

        image
    }
}
