//! Tile retrieval: URL sources, HTTP download and image decoding

use super::key::QuadKey;
use crate::core::config::TileFetchConfig;
use crate::Result;
use async_trait::async_trait;
use fxhash::FxHashMap;
use std::sync::Arc;

/// Pixel layout of a [`TileImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Decoded, 4 bytes per pixel
    Rgba8,
    /// Still encoded (PNG/JPEG); dimensions unknown
    Encoded,
}

/// Opaque, cheaply clonable handle to a fetched tile image.
#[derive(Clone, PartialEq)]
pub struct TileImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Arc<Vec<u8>>,
}

impl TileImage {
    pub fn rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data: Arc::new(pixels),
        }
    }

    pub fn encoded(bytes: Vec<u8>) -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::Encoded,
            data: Arc::new(bytes),
        }
    }

    /// Solid-colour RGBA tile.
    pub fn solid(size: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(size as usize * size as usize * 4)
            .collect();
        Self::rgba(size, size, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for TileImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Why a fetch did not produce an image.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Cooperative abort; not a failure
    #[error("fetch cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for tile {key}")]
    Status { key: String, status: u16 },

    #[error("failed to decode tile {key}: {message}")]
    Decode { key: String, message: String },

    #[error("tile {0} is not available")]
    Unavailable(String),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Retrieves and decodes the image of one tile.
///
/// Implementations run off the coordinator and must not touch the tree.
#[async_trait]
pub trait TileFetcher: Send + Sync + 'static {
    async fn fetch(&self, key: &QuadKey) -> std::result::Result<TileImage, FetchError>;
}

/// Trait representing anything that can produce tile URLs for a given key.
pub trait TileSource: Send + Sync {
    fn url(&self, key: &QuadKey) -> String;
}

/// Quadkey-addressed endpoint in the style of Bing Maps.
#[derive(Debug, Clone)]
pub struct BingMapsSource {
    template: String,
}

impl BingMapsSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Default for BingMapsSource {
    fn default() -> Self {
        Self::new(crate::core::constants::DEFAULT_TILE_URL)
    }
}

impl TileSource for BingMapsSource {
    fn url(&self, key: &QuadKey) -> String {
        self.template.replace("{quadkey}", key.as_str())
    }
}

/// Turns downloaded bytes into an image handle.
pub trait TileDecoder: Send + Sync {
    fn decode(&self, key: &QuadKey, bytes: Vec<u8>) -> std::result::Result<TileImage, FetchError>;
}

/// Keeps the encoded bytes as they came off the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

impl TileDecoder for PassthroughDecoder {
    fn decode(&self, key: &QuadKey, bytes: Vec<u8>) -> std::result::Result<TileImage, FetchError> {
        if bytes.is_empty() {
            return Err(FetchError::Decode {
                key: key.to_string(),
                message: "empty payload".into(),
            });
        }
        Ok(TileImage::encoded(bytes))
    }
}

/// Decodes PNG/JPEG payloads into RGBA pixels with the `image` crate.
#[cfg(feature = "render")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbaDecoder;

#[cfg(feature = "render")]
impl TileDecoder for RgbaDecoder {
    fn decode(&self, key: &QuadKey, bytes: Vec<u8>) -> std::result::Result<TileImage, FetchError> {
        let decoded = image::load_from_memory(&bytes).map_err(|e| FetchError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(TileImage::rgba(width, height, rgba.into_raw()))
    }
}

#[cfg(feature = "render")]
fn default_decoder() -> Box<dyn TileDecoder> {
    Box::new(RgbaDecoder)
}

#[cfg(not(feature = "render"))]
fn default_decoder() -> Box<dyn TileDecoder> {
    Box::new(PassthroughDecoder)
}

/// Downloads tiles over HTTP. Needs the tokio runtime that `reqwest` runs on.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    source: Box<dyn TileSource>,
    decoder: Box<dyn TileDecoder>,
}

impl HttpTileFetcher {
    pub fn new(config: &TileFetchConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()?;

        Ok(Self {
            client,
            source: Box::new(BingMapsSource::new(config.url_template.clone())),
            decoder: default_decoder(),
        })
    }

    pub fn with_source(mut self, source: Box<dyn TileSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_decoder(mut self, decoder: Box<dyn TileDecoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, key: &QuadKey) -> std::result::Result<TileImage, FetchError> {
        let url = self.source.url(key);
        log::debug!("fetching tile {} from {}", key, url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        log::debug!("downloaded tile {} ({} bytes)", key, bytes.len());
        self.decoder.decode(key, bytes)
    }
}

/// Serves tiles from memory. Used for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryTileFetcher {
    tiles: FxHashMap<QuadKey, TileImage>,
    fallback: Option<TileImage>,
}

impl MemoryTileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key resolves to `image`.
    pub fn uniform(image: TileImage) -> Self {
        Self {
            tiles: FxHashMap::default(),
            fallback: Some(image),
        }
    }

    pub fn with_tile(mut self, key: QuadKey, image: TileImage) -> Self {
        self.tiles.insert(key, image);
        self
    }

    /// Number of tiles stored under an explicit key; the fallback is not counted.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

#[async_trait]
impl TileFetcher for MemoryTileFetcher {
    async fn fetch(&self, key: &QuadKey) -> std::result::Result<TileImage, FetchError> {
        self.tiles
            .get(key)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| FetchError::Unavailable(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bounds::Quadrant;

    #[test]
    fn test_bing_source_substitutes_quadkey() {
        let source = BingMapsSource::default();
        let key = QuadKey::parse("0231").unwrap();
        assert_eq!(
            source.url(&key),
            "https://ecn.t1.tiles.virtualearth.net/tiles/r0231?g=3649"
        );
    }

    #[test]
    fn test_solid_image_dimensions() {
        let image = TileImage::solid(4, [1, 2, 3, 255]);
        assert_eq!(image.width(), 4);
        assert_eq!(image.byte_len(), 4 * 4 * 4);
        assert_eq!(&image.data()[..4], &[1, 2, 3, 255]);
        assert_eq!(image.format(), PixelFormat::Rgba8);
    }

    #[test]
    fn test_passthrough_rejects_empty_payload() {
        let key = QuadKey::root(Quadrant::NorthWest);
        assert!(PassthroughDecoder.decode(&key, Vec::new()).is_err());
        let image = PassthroughDecoder.decode(&key, vec![0x89, b'P']).unwrap();
        assert_eq!(image.format(), PixelFormat::Encoded);
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_rgba_decoder_rejects_garbage() {
        let key = QuadKey::root(Quadrant::SouthEast);
        let err = RgbaDecoder.decode(&key, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(!err.is_cancelled());
    }

    #[tokio::test]
    async fn test_memory_fetcher_lookup() {
        let key = QuadKey::parse("01").unwrap();
        let fetcher = MemoryTileFetcher::new().with_tile(key.clone(), TileImage::solid(1, [0; 4]));
        assert!(fetcher.fetch(&key).await.is_ok());

        let missing = QuadKey::parse("02").unwrap();
        assert!(matches!(
            fetcher.fetch(&missing).await,
            Err(FetchError::Unavailable(_))
        ));

        let uniform = MemoryTileFetcher::uniform(TileImage::solid(1, [9; 4]));
        assert!(uniform.fetch(&missing).await.is_ok());
    }

    #[test]
    fn test_memory_fetcher_counts_stored_tiles_only() {
        let uniform = MemoryTileFetcher::uniform(TileImage::solid(1, [9; 4]));
        assert_eq!(uniform.len(), 0);
        assert!(uniform.is_empty());
        assert!(uniform.has_fallback());

        let stored = uniform.with_tile(QuadKey::parse("3").unwrap(), TileImage::solid(1, [0; 4]));
        assert_eq!(stored.len(), 1);
        assert!(!stored.is_empty());
    }

    #[test]
    fn test_http_fetcher_rejects_template_without_quadkey() {
        let config = TileFetchConfig::default().with_url_template("http://x/tile.png");
        assert!(matches!(
            HttpTileFetcher::new(&config),
            Err(crate::MapError::InvalidConfig(_))
        ));
    }
}
