use bevy::{log::LogPlugin, prelude::*};
use bevy_terrain_seams::prelude::*;
use ndarray::Array2;
use std::sync::Arc;

const CONFIG_PATH: &str = "assets/seams.ron";
const FIELD_SIZE: usize = 128;

fn height(x: usize, y: usize) -> f32 {
    let (x, y) = (x as f32 / FIELD_SIZE as f32, y as f32 / FIELD_SIZE as f32);

    (x * 9.0).sin() * (y * 7.0).cos() + 0.5 * (x * 23.0 + y * 17.0).sin()
}

/// The further a tile is from the top left corner, the coarser it gets.
fn lod_matrix(columns: usize, rows: usize) -> Array2<u32> {
    Array2::from_shape_fn((columns, rows), |(x, y)| ((x + y) / 2) as u32)
}

fn main() -> anyhow::Result<()> {
    // only used to install the log subscriber
    App::new().add_plugins(LogPlugin::default());

    let config = SeamConfig::load(CONFIG_PATH).unwrap_or_else(|error| {
        warn!("{error:#}, falling back to the default config");
        SeamConfig::default()
    });

    let field = Arc::new(HeightField::from_fn(
        FIELD_SIZE,
        FIELD_SIZE,
        Calibration::new(1.0, -1.5, 1.5),
        height,
    )?);

    let columns = field.width().div_ceil(config.tile_size.x as usize);
    let rows = field.height().div_ceil(config.tile_size.y as usize);
    let tiles = partition_grid(&field, config.tile_size, lod_matrix(columns, rows).view())?;

    let mut graph = TileGraph::from_config(&config);
    let ids = graph.insert_tiles(tiles);
    graph.link_grid(&ids, columns);

    // the far corner is only drawn with its fallback mesh
    if let Some(&last) = ids.last() {
        graph.set_status(last, DisplayStatus::LowDetail);
    }

    graph.prepare_all();

    for &id in &ids {
        let state = graph.tile(id);
        let mesh = state.current_mesh();

        info!(
            "{id}: {:?} at lod {}, {}x{} vertices, {} neighbors",
            state.status(),
            state.effective_lod(),
            mesh.columns(),
            mesh.rows(),
            state.relations().len()
        );
    }

    // zooming in on a tile refines it and refixes its seams
    let refined = ids[ids.len() / 2];
    graph.update_lod(refined, 0);
    info!("{refined} now has {} mesh columns", graph.current_mesh(refined).columns());

    if let Some(texture) = graph.tile(ids[0]).texture() {
        texture.save("seams_tile_0.png")?;
    }

    Ok(())
}
