use crate::config::{Config, Viewport};
use crate::engine::input::MouseState;
use crate::engine::{Game, Point, Rect, Renderer};
use crate::level::{self, LevelDescriptor, Levels};
use crate::loader::Loader;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use web_sys::HtmlImageElement;

mod camera;
mod coordinator;

pub use self::camera::Camera;
pub use self::coordinator::{Coordinator, Mode};

/// TABLE
/// ┌───────────────────── Game Architecture Overview ────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐          ┌─────────────┐          ┌─────────────┐    │
/// │    │   lib.rs    │  start   │  engine.rs  │  update  │   game.rs   │    │
/// │    │ start_level ├─────────►│  GameLoop   ├─────────►│  Slingshot  │    │
/// │    └─────────────┘          └──────┬──────┘          └──────┬──────┘    │
/// │                                    │                        │           │
/// │                              ┌─────┴──────┐          ┌──────┴──────┐    │
/// │                              │ MouseState │          │ Coordinator │    │
/// │                              │  pointer   ├─────────►│ mode+camera │    │
/// │                              └────────────┘          └─────────────┘    │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum Slingshot {
    /// Level chosen, assets not requested yet
    Loading {
        config: Config,
        levels: Levels,
        level_number: usize,
    },

    /// Assets ready, level in play
    Loaded(Box<Playing>),
}

impl Slingshot {
    pub fn new(config: Config, levels: Levels, level_number: usize) -> Self {
        Slingshot::Loading {
            config,
            levels,
            level_number,
        }
    }
}

#[async_trait(?Send)]
impl Game for Slingshot {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            Slingshot::Loading {
                config,
                levels,
                level_number,
            } => {
                let level = levels.get(*level_number)?;
                log!("Loading level {} of {}", level_number + 1, levels.len());
                let assets = LevelAssets::load(config, level)
                    .await
                    .with_context(|| format!("Failed to load level {}", level_number + 1))?;
                let mut coordinator = Coordinator::start(*level_number, config);
                coordinator.set_slingshot_size(
                    assets.slingshot.natural_width().into(),
                    assets.slingshot.natural_height().into(),
                );
                let playing = Playing {
                    coordinator,
                    assets,
                    viewport: config.viewport,
                };
                Ok(Box::new(Slingshot::Loaded(Box::new(playing))))
            }
            Slingshot::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, mouse: &MouseState) {
        if let Slingshot::Loaded(playing) = self {
            let before = playing.coordinator.mode();
            playing.coordinator.update(mouse, playing.viewport.width);
            let after = playing.coordinator.mode();
            if before != after {
                log!("Mode : {} -> {}", before, after);
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let Slingshot::Loaded(playing) = self {
            playing.draw(renderer);
        }
    }
}

pub struct Playing {
    coordinator: Coordinator,
    assets: LevelAssets,
    viewport: Viewport,
}

impl Playing {
    fn draw(&self, renderer: &Renderer) {
        let Viewport { width, height } = self.viewport;
        let offset = self.coordinator.offset_left();
        let screen = Rect::new(0.0, 0.0, width, height);
        renderer.clear(&screen);

        // Draw order matters : background -> foreground -> slingshot
        // background scrolls at a quarter of the speed (parallax)
        renderer.draw_image(
            &self.assets.background,
            &Rect::new(offset / 4.0, 0.0, width, height),
            &screen,
        );
        renderer.draw_image(
            &self.assets.foreground,
            &Rect::new(offset, 0.0, width, height),
            &screen,
        );

        let slingshot = self.coordinator.slingshot();
        let position = Point {
            x: slingshot.x - offset,
            y: slingshot.y,
        };
        renderer.draw_entire_image(&self.assets.slingshot, &position);
        renderer.draw_entire_image(&self.assets.slingshot_front, &position);

        renderer.draw_text(
            &format!("Score: {}", self.coordinator.score()),
            &Point {
                x: width - 150.0,
                y: 30.0,
            },
        );
    }
}

struct LevelAssets {
    background: HtmlImageElement,
    foreground: HtmlImageElement,
    slingshot: HtmlImageElement,
    slingshot_front: HtmlImageElement,
}

impl LevelAssets {
    async fn load(config: &Config, level: &LevelDescriptor) -> Result<Self> {
        let loader = Loader::init()?;
        let assets = LevelAssets {
            background: loader.load_image(&config.asset_url(&level.background_path()))?,
            foreground: loader.load_image(&config.asset_url(&level.foreground_path()))?,
            slingshot: loader.load_image(&config.asset_url(level::SLINGSHOT_PATH))?,
            slingshot_front: loader.load_image(&config.asset_url(level::SLINGSHOT_FRONT_PATH))?,
        };
        if !loader.is_loaded() {
            log!("Waiting for level assets");
        }
        loader.finished().await?.into_result()?;
        Ok(assets)
    }
}
