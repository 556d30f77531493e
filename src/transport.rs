//! Raster fetching over HTTP.

use std::sync::mpsc::Sender;
use std::thread;

use once_cell::sync::Lazy;
use reqwest::blocking::Client;

use crate::raster::RasterImage;
use crate::Result;

/// Shared blocking HTTP client with a custom User-Agent so that public
/// image hosts don't reject the request. Building the client once avoids
/// the cost of TLS and connection pool setup for every fetch.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("overtile/0.1 (+https://github.com/example/overtile)")
        .build()
        .expect("failed to build reqwest blocking client")
});

/// Channel end on which a transport delivers its fetch result
pub type FetchReply = Sender<Result<RasterImage>>;

/// Asynchronous raster fetch boundary.
///
/// Implementations must not block the caller; the reply arrives on the
/// channel when the fetch settles and is applied by the source on the
/// render thread. Replies arriving after the source detached are discarded
/// there, not here.
pub trait RasterTransport: Send + Sync {
    fn fetch(&self, url: &str, reply: FetchReply);
}

/// Transport that downloads and decodes the raster on a detached thread
pub struct HttpTransport;

impl RasterTransport for HttpTransport {
    fn fetch(&self, url: &str, reply: FetchReply) {
        let url = url.to_owned();

        thread::spawn(move || {
            log::debug!("fetch raster {}", url);
            let result: Result<RasterImage> = (|| {
                let resp = HTTP_CLIENT.get(&url).send()?;
                if !resp.status().is_success() {
                    return Err(format!("HTTP {}", resp.status()).into());
                }
                let bytes = resp.bytes()?;
                let img = image::load_from_memory(&bytes)
                    .map_err(|e| format!("failed to decode raster: {}", e))?
                    .to_rgba8();
                let (width, height) = img.dimensions();
                RasterImage::new(width, height, img.into_raw())
            })();

            match &result {
                Ok(image) => log::info!(
                    "downloaded raster {} ({}x{})",
                    url,
                    image.width(),
                    image.height()
                ),
                Err(e) => log::warn!("raster {} fetch failed: {}", url, e),
            }
            let _ = reply.send(result);
        });
    }
}
