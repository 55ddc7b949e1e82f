//! The set of displayed tiles and the relations between them.
//!
//! # Explanation
//! A [`TileGraph`] owns every [`TileMeshState`] together with the [`NeighborRelation`]s
//! connecting them. Adjacency is never discovered by the graph itself, the driver
//! registers it with [`TileGraph::relate`] (or [`TileGraph::link_grid`] for regular grids)
//! before any mesh is built.
//!
//! Building the mesh of a tile also reconciles its seams with all neighbors that currently
//! take part in drawing, which rewrites boundary normals inside the neighbor's mesh.
//! Since every mutating operation takes `&mut self`, one tile's build (including its seam
//! pass) always completes before the next one starts.
//!
//! The intended call order is
//! `partition → insert → relate → prepare_for_draw → current_mesh`.

use crate::{
    config::SeamConfig,
    mesh::{GridTriangulator, TerrainMesh, Triangulator},
    neighbor::{NeighborRelation, Orientation, RelationId, TileId},
    seam::reconcile_seam,
    texture::TileTexturer,
    tile_state::{DisplayStatus, TileMeshState},
    tiling::DisplayTile,
};
use bevy::{prelude::*, utils::HashMap};
use slab::Slab;

fn invalid_tile(id: TileId) -> ! {
    panic!("Invalid id: {id} is not part of the tile graph!")
}

fn invalid_relation(id: RelationId) -> ! {
    panic!("Invalid id: {id} is not part of the tile graph!")
}

pub struct TileGraph<T = GridTriangulator> {
    triangulator: T,
    texturer: TileTexturer,
    low_detail_lod: u32,
    tiles: Slab<TileMeshState>,
    relations: Slab<NeighborRelation>,
    /// Maps an unordered pair of tiles to their single relation.
    relation_cache: HashMap<(TileId, TileId), RelationId>,
}

impl TileGraph<GridTriangulator> {
    pub fn from_config(config: &SeamConfig) -> Self {
        Self::new(
            GridTriangulator::new(config.height_scale),
            TileTexturer::new(config.regions.clone()),
            config.low_detail_lod,
        )
    }
}

impl<T: Triangulator> TileGraph<T> {
    pub fn new(triangulator: T, texturer: TileTexturer, low_detail_lod: u32) -> Self {
        Self {
            triangulator,
            texturer,
            low_detail_lod,
            tiles: Slab::new(),
            relations: Slab::new(),
            relation_cache: default(),
        }
    }

    pub fn low_detail_lod(&self) -> u32 {
        self.low_detail_lod
    }

    /// Adds a tile and builds its low detail mesh.
    pub fn insert_tile(&mut self, tile: DisplayTile) -> TileId {
        let state = TileMeshState::new(tile, self.low_detail_lod, &self.triangulator);

        TileId(self.tiles.insert(state))
    }

    pub fn insert_tiles(&mut self, tiles: impl IntoIterator<Item = DisplayTile>) -> Vec<TileId> {
        tiles
            .into_iter()
            .map(|tile| self.insert_tile(tile))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, id: TileId) -> &TileMeshState {
        self.tiles.get(id.0).unwrap_or_else(|| invalid_tile(id))
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &TileMeshState)> {
        self.tiles.iter().map(|(key, state)| (TileId(key), state))
    }

    pub fn relation(&self, id: RelationId) -> &NeighborRelation {
        self.relations
            .get(id.0)
            .unwrap_or_else(|| invalid_relation(id))
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn relation_between(&self, a: TileId, b: TileId) -> Option<RelationId> {
        self.relation_cache
            .get(&NeighborRelation::pair_key(a, b))
            .copied()
    }

    /// Returns the relation between `first` and `second`, creating it on first use.
    ///
    /// Every pair owns exactly one relation, which is registered with both tiles.
    /// `first` is the left (horizontal) or top (vertical) tile.
    ///
    /// # Panics
    /// If either tile is unknown, if both are the same tile, or if the pair is already
    /// related with a different orientation.
    pub fn relate(
        &mut self,
        first: TileId,
        second: TileId,
        orientation: Orientation,
    ) -> RelationId {
        if !self.tiles.contains(first.0) {
            invalid_tile(first);
        }
        if !self.tiles.contains(second.0) {
            invalid_tile(second);
        }

        if let Some(id) = self.relation_between(first, second) {
            let existing = &self.relations[id.0];

            assert_eq!(
                existing.orientation(),
                orientation,
                "{first} and {second} are already related with a different orientation!"
            );

            return id;
        }

        let relation = NeighborRelation::new(first, second, orientation);
        let id = RelationId(self.relations.insert(relation));

        self.relation_cache
            .insert(NeighborRelation::pair_key(first, second), id);
        self.tiles[first.0].relations.push(id);
        self.tiles[second.0].relations.push(id);

        debug!("created {id} between {first} and {second} ({orientation:?})");

        id
    }

    /// Relates all horizontally and vertically adjacent tiles of a row-major grid.
    pub fn link_grid(&mut self, ids: &[TileId], columns: usize) {
        assert!(
            columns > 0 && ids.len() % columns == 0,
            "{} tiles do not form a grid with {columns} columns!",
            ids.len()
        );

        let rows = ids.len() / columns;

        for (index, &id) in ids.iter().enumerate() {
            let (x, y) = (index % columns, index / columns);

            if x + 1 < columns {
                self.relate(id, ids[index + 1], Orientation::Horizontal);
            }
            if y + 1 < rows {
                self.relate(id, ids[index + columns], Orientation::Vertical);
            }
        }
    }

    pub fn neighbors(&self, id: TileId) -> impl Iterator<Item = TileId> + '_ {
        self.tile(id)
            .relations()
            .iter()
            .map(move |&relation| self.relation(relation).other(id))
    }

    /// The size of the tile on the other side of `relation`.
    pub fn other_size(&self, relation: RelationId, id: TileId) -> UVec2 {
        let other = self.relation(relation).other(id);

        self.tile(other).tile().slice.size()
    }

    pub fn set_status(&mut self, id: TileId, status: DisplayStatus) {
        let state = self.tiles.get_mut(id.0).unwrap_or_else(|| invalid_tile(id));

        if state.status() != status {
            trace!("{id} changed from {:?} to {status:?}", state.status());
            state.set_status(status);
        }
    }

    /// Triangulates the tile at its lod and reconciles the seams with all of its drawn neighbors.
    ///
    /// The boundary normals of both the new mesh and the neighbors' meshes are rewritten.
    pub fn build_mesh(&mut self, id: TileId) -> &TerrainMesh {
        let state = self.tile(id);
        let lod = state.lod();
        let relations = state.relations.clone();
        let mut mesh = self.triangulator.generate_mesh(&state.tile().slice, lod);

        for relation_id in relations {
            let relation = &self.relations[relation_id.0];
            let other = relation.other(id);
            let orientation = relation.orientation();

            let Some(other_mesh) = self.tiles[other.0].seam_mesh_mut() else {
                trace!("skipping seam with {other}, it is not drawn");
                continue;
            };

            let stats = if relation.is_first(id) {
                reconcile_seam(&mut mesh, other_mesh, orientation)
            } else {
                reconcile_seam(other_mesh, &mut mesh, orientation)
            };

            trace!("reconciled seam between {id} and {other}: {stats:?}");
        }

        debug!(
            "built mesh for {id} at lod {lod} with {}x{} vertices",
            mesh.columns(),
            mesh.rows()
        );

        self.tiles[id.0].mesh.insert(mesh)
    }

    /// Changes the lod of the tile and rebuilds its mesh, including all of its seams.
    ///
    /// Returns whether anything changed.
    pub fn update_lod(&mut self, id: TileId, lod: u32) -> bool {
        let state = self.tiles.get_mut(id.0).unwrap_or_else(|| invalid_tile(id));

        if state.lod() == lod {
            return false;
        }

        debug!("updating {id} from lod {} to {lod}", state.lod());

        state.set_lod(lod);
        self.build_mesh(id);

        true
    }

    /// Lazily builds the texture and, for visible tiles, the full mesh.
    pub fn prepare_for_draw(&mut self, id: TileId) -> DisplayStatus {
        let state = self.tiles.get_mut(id.0).unwrap_or_else(|| invalid_tile(id));

        if state.texture.is_none() {
            state.texture = Some(self.texturer.generate(&state.tile().slice));
        }

        let status = state.status();

        if status == DisplayStatus::Visible && !state.is_realized() {
            self.build_mesh(id);
        }

        status
    }

    /// Prepares every tile in insertion order.
    pub fn prepare_all(&mut self) {
        let ids: Vec<TileId> = self.tiles.iter().map(|(key, _)| TileId(key)).collect();

        for id in ids {
            self.prepare_for_draw(id);
        }
    }

    pub fn current_mesh(&self, id: TileId) -> &TerrainMesh {
        self.tile(id).current_mesh()
    }
}
