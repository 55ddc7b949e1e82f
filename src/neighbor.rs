use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Identifies a tile inside a [`TileGraph`](crate::tile_graph::TileGraph).
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Display, From)]
#[display("tile {_0}")]
pub struct TileId(pub usize);

/// Identifies a [`NeighborRelation`] inside a [`TileGraph`](crate::tile_graph::TileGraph).
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Display, From)]
#[display("relation {_0}")]
pub struct RelationId(pub usize);

/// Which boundary two adjacent tiles share.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Orientation {
    /// The tiles sit side by side and share a vertical edge.
    /// The first member is the left tile.
    Horizontal,
    /// The tiles are stacked and share a horizontal edge.
    /// The first member is the top tile.
    Vertical,
}

/// The undirected adjacency between exactly two tiles.
///
/// Only one relation exists per adjacent pair, both members refer to it by its [`RelationId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborRelation {
    first: TileId,
    second: TileId,
    orientation: Orientation,
}

impl NeighborRelation {
    pub fn new(first: TileId, second: TileId, orientation: Orientation) -> Self {
        assert_ne!(first, second, "A tile can not neighbor itself!");

        Self {
            first,
            second,
            orientation,
        }
    }

    #[inline]
    pub fn first(&self) -> TileId {
        self.first
    }

    #[inline]
    pub fn second(&self) -> TileId {
        self.second
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn contains(&self, tile: TileId) -> bool {
        tile == self.first || tile == self.second
    }

    /// Returns the partner of `tile`.
    ///
    /// # Panics
    /// If `tile` is not a member of this relation.
    pub fn other(&self, tile: TileId) -> TileId {
        if tile == self.first {
            self.second
        } else if tile == self.second {
            self.first
        } else {
            panic!("Tried to get the other member of a relation for the non-member {tile}!")
        }
    }

    /// Whether `tile` is the left (horizontal) or top (vertical) member.
    ///
    /// # Panics
    /// If `tile` is not a member of this relation.
    pub fn is_first(&self, tile: TileId) -> bool {
        if tile == self.first {
            true
        } else if tile == self.second {
            false
        } else {
            panic!("Tried to check the membership of the non-member {tile}!")
        }
    }

    /// The key under which this pair is cached, independent of member order.
    pub(crate) fn pair_key(a: TileId, b: TileId) -> (TileId, TileId) {
        (a.min(b), a.max(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_is_an_involution() {
        let relation = NeighborRelation::new(TileId(3), TileId(7), Orientation::Horizontal);

        for tile in [TileId(3), TileId(7)] {
            assert_eq!(relation.other(relation.other(tile)), tile);
        }

        assert_eq!(relation.other(TileId(3)), TileId(7));
    }

    #[test]
    fn is_first_follows_construction_order() {
        let relation = NeighborRelation::new(TileId(9), TileId(2), Orientation::Vertical);

        assert!(relation.is_first(TileId(9)));
        assert!(!relation.is_first(TileId(2)));
        assert_eq!(relation.first(), TileId(9));
        assert_eq!(relation.orientation(), Orientation::Vertical);
    }

    #[test]
    #[should_panic]
    fn other_of_non_member_panics() {
        NeighborRelation::new(TileId(0), TileId(1), Orientation::Vertical).other(TileId(2));
    }

    #[test]
    #[should_panic]
    fn is_first_of_non_member_panics() {
        NeighborRelation::new(TileId(0), TileId(1), Orientation::Vertical).is_first(TileId(5));
    }

    #[test]
    #[should_panic]
    fn self_relation_panics() {
        NeighborRelation::new(TileId(4), TileId(4), Orientation::Horizontal);
    }

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(
            NeighborRelation::pair_key(TileId(5), TileId(1)),
            NeighborRelation::pair_key(TileId(1), TileId(5))
        );
    }
}
