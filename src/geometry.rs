//! Quad geometry in tile-local extent units.

use crate::core::constants::EXTENT;
use crate::core::geo::{Point, TileCoord};
use bytemuck::{Pod, Zeroable};

/// One vertex of the overlay quad: a position in tile-local extent units
/// paired with a texture coordinate over the same range.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [i16; 2],
    pub tex_coord: [i16; 2],
}

/// The four vertices describing an overlay quad, laid out for upload as a
/// triangle strip sharing the quad diagonal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct QuadGeometry {
    pub vertices: [QuadVertex; 4],
}

impl QuadGeometry {
    /// Raw byte view for vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Builds the overlay quad for `anchor` from zoom-0 corner projections.
///
/// Each corner is reprojected to the anchor zoom, offset by the anchor's
/// integer column and row, scaled to extent units and rounded to the
/// nearest integer unit. Rounding (not truncation) keeps the output
/// bit-compatible with tile-space geometry produced elsewhere.
///
/// The corners arrive ordered top-left, top-right, bottom-right,
/// bottom-left; the emitted vertex order swaps the last two so the quad
/// renders as two triangles sharing the diagonal:
/// corner0 -> (0,0), corner1 -> (EXTENT,0), corner3 -> (0,EXTENT),
/// corner2 -> (EXTENT,EXTENT).
pub fn build_quad(zoom0_corners: &[Point; 4], anchor: TileCoord) -> QuadGeometry {
    let local = |corner: &Point| -> [i16; 2] {
        let scaled = corner.zoom_to(anchor.z);
        [
            ((scaled.x - anchor.x as f64) * EXTENT as f64).round() as i16,
            ((scaled.y - anchor.y as f64) * EXTENT as f64).round() as i16,
        ]
    };

    QuadGeometry {
        vertices: [
            QuadVertex {
                position: local(&zoom0_corners[0]),
                tex_coord: [0, 0],
            },
            QuadVertex {
                position: local(&zoom0_corners[1]),
                tex_coord: [EXTENT, 0],
            },
            QuadVertex {
                position: local(&zoom0_corners[3]),
                tex_coord: [0, EXTENT],
            },
            QuadVertex {
                position: local(&zoom0_corners[2]),
                tex_coord: [EXTENT, EXTENT],
            },
        ],
    }
}
