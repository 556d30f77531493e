//! Engine-wide constants shared by the geometry builder and the renderers.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Fixed per-tile coordinate range. Geometry inside a tile is expressed in
/// integer units of [0, EXTENT] along each axis.
pub const EXTENT: i16 = 8192;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Upper bound on the zoom chosen by the best-fit heuristic. Degenerate
/// quads (all corners equal) would otherwise drive the zoom unbounded.
pub const MAX_FIT_ZOOM: u8 = 25;
