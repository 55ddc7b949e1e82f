use crate::height_field::{Calibration, HeightField};
use anyhow::{ensure, Context, Result};
use ndarray::Array2;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use tiff::decoder::{Decoder, DecodingResult};

/// Decodes a single channel tiff image into a height field.
///
/// Integer samples are converted to floating point without rescaling,
/// the calibration has to match the stored values.
pub fn decode_height_field<R: Read + Seek>(
    reader: R,
    calibration: Calibration,
) -> Result<HeightField> {
    let mut decoder = Decoder::new(reader).context("Failed to read the tiff header.")?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let data: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|value| value as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|value| value as f32).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|value| value as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|value| value as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|value| value as f32).collect(),
    };

    ensure!(
        data.len() == width * height,
        "Expected a single channel image, found {} samples for {width}x{height} pixels.",
        data.len()
    );

    let samples = Array2::from_shape_vec((height, width), data)?;

    Ok(HeightField::new(samples, calibration)?)
}

pub fn load_height_field(path: impl AsRef<Path>, calibration: Calibration) -> Result<HeightField> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open the height data at {}.", path.display()))?;

    decode_height_field(BufReader::new(file), calibration)
        .with_context(|| format!("Failed to load the height data at {}.", path.display()))
}
