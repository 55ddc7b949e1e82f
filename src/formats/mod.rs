//! Loaders that turn stored height data into a [`HeightField`](crate::height_field::HeightField).

pub mod tiff;
