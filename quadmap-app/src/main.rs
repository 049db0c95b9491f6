use quadmap::prelude::*;
use serde::Deserialize;

/// Taipei, where the scripted session zooms in.
const TARGET: LonLat = LonLat {
    lon: 121.5654,
    lat: 25.0330,
};

/// Longest wait for one step's tiles before moving on
const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// Headless tile viewer: drives a scripted zoom/pan session and logs every frame
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    quadmap::init_logging();

    let options = Options::from_args(std::env::args().skip(1))?;
    let config = match &options.config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let fetcher: Arc<dyn TileFetcher> = if options.offline {
        log::info!("offline mode: serving solid tiles from memory");
        let tile = TileImage::solid(config.manager.tile_size, [200, 220, 240, 255]);
        Arc::new(MemoryTileFetcher::uniform(tile))
    } else {
        log::info!("fetching tiles from {}", config.fetch.url_template);
        Arc::new(HttpTileFetcher::new(&config.fetch)?)
    };

    let mut manager = TileManager::new(config.manager.clone(), fetcher)?;
    let mut session = Session::new(&mut manager);

    session.step("initial view", |_| {});
    session.step("center on target", |m| {
        let pixel = m.lon_lat_to_pixel(TARGET);
        m.set_center(pixel);
    });
    for _ in 0..5 {
        session.step("zoom in", TileManager::zoom_in);
    }
    session.step("pan north-east", |m| m.offset(120.0, 80.0));
    session.step("zoom in at pointer", |m| m.zoom_in_at(200.0, 150.0));
    session.step("zoom out at pointer", |m| m.zoom_out_at(600.0, 450.0));
    session.step("resize", |m| m.resize(1024.0, 768.0));

    if let Some(path) = &options.snapshot {
        let (width, height) = manager.window_size();
        let mut canvas = RasterCanvas::new(width as u32, height as u32)
            .with_background([230, 230, 230, 255]);
        let stats = manager.render(&mut canvas)?;
        canvas.save(path)?;
        log::info!("wrote {} ({} tiles)", path, stats.tiles_drawn);
    }

    Ok(())
}

/// Contents of the optional JSON config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AppConfig {
    manager: TileManagerConfig,
    fetch: TileFetchConfig,
}

impl AppConfig {
    fn load(path: &str) -> quadmap::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&json)?;
        config.manager.validate()?;
        config.fetch.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Default)]
struct Options {
    config_path: Option<String>,
    offline: bool,
    snapshot: Option<String>,
}

impl Options {
    fn from_args(mut args: impl Iterator<Item = String>) -> std::result::Result<Self, String> {
        let mut options = Options::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--offline" => options.offline = true,
                "--snapshot" => {
                    options.snapshot = Some(args.next().ok_or("--snapshot needs a file path")?);
                }
                "-h" | "--help" => {
                    println!("usage: quadmap-app [CONFIG.json] [--offline] [--snapshot FRAME.png]");
                    std::process::exit(0);
                }
                flag if flag.starts_with('-') => return Err(format!("unknown flag {}", flag)),
                path => options.config_path = Some(path.to_string()),
            }
        }
        Ok(options)
    }
}

/// Runs one scripted action at a time and logs the resulting frame.
struct Session<'a> {
    manager: &'a mut TileManager,
    renderer: LogRenderer,
    frame: usize,
}

impl<'a> Session<'a> {
    fn new(manager: &'a mut TileManager) -> Self {
        Self {
            manager,
            renderer: LogRenderer,
            frame: 0,
        }
    }

    fn step(&mut self, name: &str, action: impl FnOnce(&mut TileManager)) {
        action(&mut *self.manager);
        if !self.manager.run_until_idle(STEP_TIMEOUT) {
            log::warn!(
                "{}: {} fetches still in flight after {:?}",
                name,
                self.manager.in_flight(),
                STEP_TIMEOUT
            );
        }

        self.frame += 1;
        let (width, height) = self.manager.window_size();
        let here = self.manager.lon_lat(width / 2.0, height / 2.0);
        match self.manager.render(&mut self.renderer) {
            Ok(frame) => log::info!(
                "frame {} [{}] level {} at ({:.4}, {:.4}): {} tiles, {} placeholders, {} failed; tree {:?}",
                self.frame,
                name,
                self.manager.level(),
                here.lon,
                here.lat,
                frame.tiles_drawn,
                frame.placeholders,
                frame.failed,
                self.manager.stats()
            ),
            Err(e) => log::error!("frame {} [{}] failed: {}", self.frame, name, e),
        }
    }
}

/// Renderer that only reports what it would paint
struct LogRenderer;

impl TileRenderer for LogRenderer {
    fn draw_tile(&mut self, tile: &DrawableTile) -> quadmap::Result<()> {
        log::debug!(
            "  tile {:<12} at ({:>8.1}, {:>8.1}) size {:>7.1} x{}",
            tile.key.as_str(),
            tile.screen.x,
            tile.screen.y,
            tile.screen.width,
            tile.scale_factor
        );
        Ok(())
    }
}
