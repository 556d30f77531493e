//! # Overtile
//!
//! Overlays a single georeferenced raster (a static image, a video frame
//! stream, or a drawable canvas buffer) onto a tiled-map renderer by
//! treating the raster as the sole content of one synthetic map tile.
//!
//! The quad of geographic corner coordinates is projected into tile space,
//! a single anchor tile is chosen to host it, and the source answers the
//! tile-request protocol so that exactly one wrap-aligned request succeeds
//! per visible world copy. GPU resources (one quad vertex buffer, one
//! texture) are created lazily and kept alive across raster updates.

pub mod anchor;
pub mod core;
pub mod events;
pub mod geometry;
pub mod raster;
pub mod rendering;
pub mod source;
pub mod tiles;
pub mod transport;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::geo::{LatLng, Point, TileCoord};

pub use events::{DataPhase, EventEmitter, HandlerId, SourceEvent, SourceEventKind};

pub use geometry::{build_quad, QuadGeometry, QuadVertex};

pub use raster::{Raster, RasterImage};

pub use rendering::{BufferHandle, OverlayResources, Renderer, TextureHandle};

pub use source::{HostContext, ImageOverlayConfig, ImageOverlaySource};

pub use tiles::{SharedTile, Tile, TileClaims, TileState};

pub use transport::{FetchReply, HttpTransport, RasterTransport};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Error type alias for convenience
pub type Error = OverlayError;
