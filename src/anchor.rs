//! Anchor tile selection: choosing the single synthetic tile that hosts an
//! overlay's raster content.

use crate::core::geo::{best_fit_center, LatLng, Point, TileCoord};

/// Selects the anchor tile for a quad of geographic corners.
///
/// Each corner is projected into zoom-0 tile space and the four points are
/// handed to [`best_fit_center`]; its fractional column and row are floored
/// to integers and its zoom is used verbatim. The owning source is expected
/// to pin both its advertised minzoom and maxzoom to the returned zoom so
/// the tile scheduler only ever requests this one level.
///
/// Also returns the projected zoom-0 corners, which the geometry builder
/// consumes. Pure; identical input always yields the identical anchor.
pub fn select_anchor(corners: &[LatLng; 4]) -> (TileCoord, [Point; 4]) {
    let zoom0 = [
        corners[0].to_tile_space(),
        corners[1].to_tile_space(),
        corners[2].to_tile_space(),
        corners[3].to_tile_space(),
    ];
    let (center, zoom) = best_fit_center(&zoom0);
    let floored = center.floor();
    let anchor = TileCoord::new(floored.x as u32, floored.y as u32, zoom);
    (anchor, zoom0)
}
