//! The external tile contract and the per-wrap claim table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::core::geo::TileCoord;
use crate::rendering::TextureHandle;

/// Display state of an individual tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Loading,
    Loaded,
    /// Normal outcome for requests that miss the anchor; not a fault
    Errored,
}

/// Tile object owned by the external tile cache.
///
/// The overlay source writes `state`, `bucket_data` and `texture` as part
/// of the tile-claim contract; everything else about the tile's lifetime
/// belongs to the cache.
#[derive(Debug)]
pub struct Tile {
    pub coord: TileCoord,
    pub state: TileState,
    pub bucket_data: Option<Arc<Vec<u8>>>,
    pub texture: Option<TextureHandle>,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            state: TileState::Loading,
            bucket_data: None,
            texture: None,
        }
    }
}

/// Shared tile reference as handed out by the external cache
pub type SharedTile = Arc<Mutex<Tile>>;

/// World-wrap index to tile mapping.
///
/// Entries are non-owning; a tile dropped by the cache simply stops
/// appearing in [`TileClaims::live`] on the next prepare cycle.
#[derive(Debug, Default)]
pub struct TileClaims {
    tiles: HashMap<i32, Weak<Mutex<Tile>>>,
}

impl TileClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tile` under its world-wrap index, replacing any previous
    /// claim for that wrap
    pub fn insert(&mut self, wrap: i32, tile: &SharedTile) {
        self.tiles.insert(wrap, Arc::downgrade(tile));
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Iterates over claimed tiles that are still alive
    pub fn live(&self) -> impl Iterator<Item = SharedTile> + '_ {
        self.tiles.values().filter_map(Weak::upgrade)
    }

    /// Drops entries whose tile has been destroyed by the cache
    pub fn prune(&mut self) {
        self.tiles.retain(|_, tile| tile.strong_count() > 0);
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_are_non_owning() {
        let mut claims = TileClaims::new();
        let tile: SharedTile = Arc::new(Mutex::new(Tile::new(TileCoord::new(10, 12, 5))));

        claims.insert(0, &tile);
        assert_eq!(claims.live().count(), 1);

        drop(tile);
        assert_eq!(claims.live().count(), 0);

        claims.prune();
        assert!(claims.is_empty());
    }

    #[test]
    fn test_reclaim_replaces_wrap_entry() {
        let mut claims = TileClaims::new();
        let first: SharedTile = Arc::new(Mutex::new(Tile::new(TileCoord::new(10, 12, 5))));
        let second: SharedTile = Arc::new(Mutex::new(Tile::new(TileCoord::new(10, 12, 5))));

        claims.insert(0, &first);
        claims.insert(0, &second);
        assert_eq!(claims.len(), 1);

        let live: Vec<_> = claims.live().collect();
        assert!(Arc::ptr_eq(&live[0], &second));
    }
}
