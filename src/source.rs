//! The image overlay source: the externally visible tile-source adapter.

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::anchor::select_anchor;
use crate::core::geo::{LatLng, Point, TileCoord};
use crate::events::{DataPhase, EventEmitter, HandlerId, SourceEvent, SourceEventKind};
use crate::geometry::{build_quad, QuadGeometry};
use crate::raster::{Raster, RasterImage};
use crate::rendering::{OverlayResources, Renderer, TextureHandle};
use crate::tiles::{SharedTile, TileClaims, TileState};
use crate::transport::RasterTransport;
use crate::{OverlayError, Result};

/// Widest zoom range advertised before an anchor has been selected
const INITIAL_MAX_ZOOM: u8 = 22;

/// Persisted form of an image overlay: `{"type": "image", url, coordinates}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOverlayConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    /// Corner coordinates as `[lng, lat]`, ordered top-left, top-right,
    /// bottom-right, bottom-left (clockwise)
    pub coordinates: [[f64; 2]; 4],
}

impl ImageOverlayConfig {
    pub fn new(url: impl Into<String>, coordinates: [[f64; 2]; 4]) -> Self {
        Self {
            kind: "image".to_string(),
            url: url.into(),
            coordinates,
        }
    }
}

/// Capabilities the hosting map hands to the source on attach
#[derive(Clone)]
pub struct HostContext {
    pub transport: Arc<dyn RasterTransport>,
    pub renderer: Arc<Mutex<dyn Renderer + Send>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Unattached,
    Loading,
    Ready,
}

/// A tile source that overlays one georeferenced raster onto the map by
/// rendering it into a single synthetic anchor tile.
///
/// The source advertises minzoom == maxzoom == anchor zoom, so the tile
/// scheduler can only ever request the anchor level; of those requests,
/// exactly the anchor-aligned one per world copy is claimed and every other
/// tile is answered as successful-but-empty.
pub struct ImageOverlaySource {
    id: String,
    url: String,
    corners: [LatLng; 4],
    raster: Option<Raster>,
    anchor: Option<TileCoord>,
    zoom0_corners: Option<[Point; 4]>,
    geometry: Option<QuadGeometry>,
    min_zoom: u8,
    max_zoom: u8,
    resources: OverlayResources,
    claims: TileClaims,
    events: EventEmitter,
    host: Option<HostContext>,
    pending: Option<Receiver<Result<RasterImage>>>,
    state: LoadState,
}

impl ImageOverlaySource {
    /// Creates a source from its persisted configuration. The raster is
    /// fetched from `config.url` once the source is attached to a host.
    pub fn new(id: impl Into<String>, config: ImageOverlayConfig) -> Result<Self> {
        if config.kind != "image" {
            return Err(OverlayError::Config(format!(
                "unsupported source type {:?}, expected \"image\"",
                config.kind
            ))
            .into());
        }
        let corners = parse_corners(&config.coordinates)?;
        let mut source = Self {
            id: id.into(),
            url: config.url,
            corners,
            raster: None,
            anchor: None,
            zoom0_corners: None,
            geometry: None,
            min_zoom: 0,
            max_zoom: INITIAL_MAX_ZOOM,
            resources: OverlayResources::new(),
            claims: TileClaims::new(),
            events: EventEmitter::new(),
            host: None,
            pending: None,
            state: LoadState::Unattached,
        };
        source.recompute_geometry();
        Ok(source)
    }

    /// Creates a source whose content is already in hand, in the style of a
    /// canvas or video element: no fetch happens on attach.
    pub fn from_raster(
        id: impl Into<String>,
        raster: Raster,
        coordinates: [[f64; 2]; 4],
    ) -> Result<Self> {
        let mut source = Self::new(id, ImageOverlayConfig::new("", coordinates))?;
        source.raster = Some(raster);
        Ok(source)
    }

    /// Reconstructs a source from a previous [`serialize`](Self::serialize)
    /// output
    pub fn from_json(id: impl Into<String>, value: &serde_json::Value) -> Result<Self> {
        let config: ImageOverlayConfig =
            serde_json::from_value(value.clone()).map_err(OverlayError::Serialization)?;
        Self::new(id, config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The synthetic tile currently hosting the raster
    pub fn anchor(&self) -> Option<TileCoord> {
        self.anchor
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Whether the raster has finished loading
    pub fn loaded(&self) -> bool {
        self.state == LoadState::Ready
    }

    /// Current corners in `[lng, lat]` wire order
    pub fn coordinates(&self) -> [[f64; 2]; 4] {
        [
            self.corners[0].to_lng_lat(),
            self.corners[1].to_lng_lat(),
            self.corners[2].to_lng_lat(),
            self.corners[3].to_lng_lat(),
        ]
    }

    /// Quad geometry in tile-local extent units, if computed
    pub fn geometry(&self) -> Option<&QuadGeometry> {
        self.geometry.as_ref()
    }

    /// Corners projected into zoom-0 tile space, if computed
    pub fn zoom0_corners(&self) -> Option<&[Point; 4]> {
        self.zoom0_corners.as_ref()
    }

    /// Texture currently backing the overlay, if created
    pub fn texture(&self) -> Option<TextureHandle> {
        self.resources.texture()
    }

    /// Registers an event handler; see [`EventEmitter::on`]
    pub fn on(
        &mut self,
        kind: SourceEventKind,
        handler: impl FnMut(&SourceEvent) + Send + 'static,
    ) -> HandlerId {
        self.events.on(kind, handler)
    }

    /// Unregisters an event handler; see [`EventEmitter::off`]
    pub fn off(&mut self, kind: SourceEventKind, id: HandlerId) -> bool {
        self.events.off(kind, id)
    }

    /// Attaches the source to its hosting map and starts loading
    pub fn attach(&mut self, host: HostContext) {
        self.host = Some(host);
        self.load();
    }

    /// Starts the raster fetch, or finishes immediately when content was
    /// supplied at construction
    pub fn load(&mut self) {
        self.state = LoadState::Loading;
        self.events.emit(&SourceEvent::data_loading());

        if self.raster.is_some() {
            self.finish_loading();
            return;
        }

        let Some(host) = &self.host else {
            return;
        };
        log::debug!("source {}: fetching {}", self.id, self.url);
        let (tx, rx) = channel();
        self.pending = Some(rx);
        host.transport.fetch(&self.url, tx);
    }

    /// Applies a settled fetch, if any. Driven by the host render loop;
    /// results arriving after [`detach`](Self::detach) are discarded.
    pub fn poll_transport(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                return;
            }
        };
        self.pending = None;

        if self.host.is_none() {
            log::debug!("source {}: dropping fetch result after detach", self.id);
            return;
        }

        match result {
            Ok(image) => {
                self.raster = Some(Raster::Static(image));
                self.finish_loading();
            }
            Err(e) => {
                log::warn!("source {}: raster fetch failed: {}", self.id, e);
                self.events.emit(&SourceEvent::error(e.to_string()));
            }
        }
    }

    fn finish_loading(&mut self) {
        self.state = LoadState::Ready;
        if self.host.is_some() {
            self.recompute_geometry();
            self.events.emit(&SourceEvent::data(DataPhase::Metadata));
        }
    }

    /// Moves the overlay to a new set of geographic corners.
    ///
    /// Recomputes the anchor, the projected corners and the quad geometry,
    /// pins the advertised zoom range to the new anchor zoom, and destroys
    /// any existing vertex buffer so it is rebuilt on the next prepare.
    /// Callable before or after the raster has loaded.
    pub fn set_coordinates(&mut self, corners: [LatLng; 4]) -> &mut Self {
        self.corners = corners;
        self.recompute_geometry();

        if let Some(host) = &self.host {
            if let Ok(mut renderer) = host.renderer.lock() {
                self.resources.invalidate_buffer(&mut *renderer);
            }
        }

        self.events.emit(&SourceEvent::data(DataPhase::Content));
        self
    }

    /// Replaces the raster wholesale. A dimension change triggers a full
    /// texture re-upload on the next prepare.
    pub fn update_image(&mut self, raster: Raster) -> &mut Self {
        self.raster = Some(raster);
        if self.state == LoadState::Ready {
            self.events.emit(&SourceEvent::data(DataPhase::Content));
        } else if self.host.is_some() {
            self.finish_loading();
        }
        self
    }

    /// Pushes a new frame into a streaming raster
    pub fn update_frame(&mut self, frame: RasterImage) -> Result<()> {
        match &mut self.raster {
            Some(raster) => raster.update_frame(frame),
            None => Err("no raster to update".into()),
        }
    }

    /// Uploads GPU resources and marks claimed tiles as loaded.
    ///
    /// A no-op while there are no claimed tiles or the raster has not
    /// finished loading; no GPU calls are made in that case.
    pub fn prepare(&mut self) {
        self.claims.prune();
        if self.claims.is_empty() {
            return;
        }
        let Some(raster) = &self.raster else {
            return;
        };
        let Some(geometry) = &self.geometry else {
            return;
        };
        let Some(host) = &self.host else {
            return;
        };
        let Ok(mut renderer) = host.renderer.lock() else {
            return;
        };

        let texture = self.resources.ensure_texture(&mut *renderer, raster);
        self.resources.ensure_buffer(&mut *renderer, geometry);
        drop(renderer);

        for tile in self.claims.live() {
            if let Ok(mut tile) = tile.lock() {
                if tile.state != TileState::Loaded {
                    tile.state = TileState::Loaded;
                    tile.texture = Some(texture);
                }
            }
        }
    }

    /// Answers a tile request.
    ///
    /// A request for the current anchor registers the tile under `wrap` and
    /// clears its stale bucket data (also on re-claims). Any other tile is
    /// marked errored. Both outcomes return `Ok`: "no data for this tile"
    /// is a successful empty response in the tile-source protocol, not a
    /// fault.
    pub fn load_tile(&mut self, tile: &SharedTile, wrap: i32) -> Result<()> {
        let Ok(mut guard) = tile.lock() else {
            return Ok(());
        };
        if self.anchor == Some(guard.coord) {
            log::debug!(
                "source {}: claimed tile {:?} wrap {}",
                self.id,
                guard.coord,
                wrap
            );
            guard.bucket_data = None;
            drop(guard);
            self.claims.insert(wrap, tile);
        } else {
            guard.state = TileState::Errored;
        }
        Ok(())
    }

    /// Plain structural description for persistence and export; round-trips
    /// through [`from_json`](Self::from_json)
    pub fn serialize(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "image",
            "url": self.url,
            "coordinates": self.coordinates(),
        })
    }

    /// Detaches from the host, releasing GPU resources and dropping tile
    /// claims. An in-flight fetch is discarded by the next poll.
    pub fn detach(&mut self) {
        if let Some(host) = self.host.take() {
            if let Ok(mut renderer) = host.renderer.lock() {
                self.resources.release(&mut *renderer);
            }
        }
        self.claims.clear();
        self.state = LoadState::Unattached;
    }

    fn recompute_geometry(&mut self) {
        let (anchor, zoom0) = select_anchor(&self.corners);
        self.geometry = Some(build_quad(&zoom0, anchor));
        self.anchor = Some(anchor);
        self.zoom0_corners = Some(zoom0);
        // Pin the advertised range so the scheduler can only request the
        // anchor zoom.
        self.min_zoom = anchor.z;
        self.max_zoom = anchor.z;
    }
}

fn parse_corners(coordinates: &[[f64; 2]; 4]) -> Result<[LatLng; 4]> {
    let mut corners = [LatLng::default(); 4];
    for (corner, raw) in corners.iter_mut().zip(coordinates) {
        let coord = LatLng::from_lng_lat(raw[0], raw[1]);
        if !coord.is_valid() {
            return Err(
                OverlayError::InvalidCoordinates(format!("[{}, {}]", raw[0], raw[1])).into(),
            );
        }
        *corner = coord;
    }
    Ok(corners)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORNERS: [[f64; 2]; 4] = [
        [-76.54, 39.18],
        [-76.52, 39.18],
        [-76.52, 39.17],
        [-76.54, 39.17],
    ];

    #[test]
    fn test_rejects_wrong_kind_tag() {
        let mut config = ImageOverlayConfig::new("http://example.com/i.png", CORNERS);
        config.kind = "video".to_string();
        assert!(ImageOverlaySource::new("overlay", config).is_err());
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        let config = ImageOverlayConfig::new(
            "http://example.com/i.png",
            [[-200.0, 39.18], [-76.52, 39.18], [-76.52, 39.17], [-76.54, 39.17]],
        );
        assert!(ImageOverlaySource::new("overlay", config).is_err());
    }

    #[test]
    fn test_zoom_range_pinned_to_anchor() {
        let config = ImageOverlayConfig::new("http://example.com/i.png", CORNERS);
        let source = ImageOverlaySource::new("overlay", config).unwrap();
        let anchor = source.anchor().unwrap();
        assert_eq!(source.min_zoom(), anchor.z);
        assert_eq!(source.max_zoom(), anchor.z);
    }

    #[test]
    fn test_serialize_shape() {
        let config = ImageOverlayConfig::new("http://example.com/i.png", CORNERS);
        let source = ImageOverlaySource::new("overlay", config).unwrap();
        let value = source.serialize();
        assert_eq!(value["type"], "image");
        assert_eq!(value["url"], "http://example.com/i.png");
        assert_eq!(value["coordinates"][0][0], -76.54);
        assert_eq!(value["coordinates"][3][1], 39.17);
    }

    #[test]
    fn test_config_round_trip() {
        let config = ImageOverlayConfig::new("http://example.com/i.png", CORNERS);
        let source = ImageOverlaySource::new("overlay", config.clone()).unwrap();
        let parsed: ImageOverlayConfig =
            serde_json::from_value(source.serialize()).unwrap();
        assert_eq!(parsed, config);
    }
}
