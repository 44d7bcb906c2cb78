use super::camera::Camera;
use crate::config::{Config, SlingshotConfig};
use crate::engine::input::MouseState;
use std::fmt;

/// ┌──────────────────── Mode Flow ────────────────────────────────┐
/// │  Intro          →  pan to intro target  →  LoadNextHero       │
/// │  LoadNextHero   →  (next frame)         →  WaitForFiring      │
/// │  WaitForFiring  →  press on slingshot   →  Firing             │
/// │  Firing         →  release              →  Fired              │
/// │  Fired          →  pan back settled     →  LoadNextHero       │
/// └───────────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Intro,
    LoadNextHero,
    WaitForFiring,
    Firing,
    Fired,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Intro => "intro",
            Mode::LoadNextHero => "load-next-hero",
            Mode::WaitForFiring => "wait-for-firing",
            Mode::Firing => "firing",
            Mode::Fired => "fired",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-level play state: current mode, camera and score
#[derive(Debug, Clone)]
pub struct Coordinator {
    level_number: usize,
    mode: Mode,
    camera: Camera,
    score: u32,
    slingshot: SlingshotConfig,
    /// drawn size of the slingshot sprite, known once its image loaded
    slingshot_size: (f64, f64),
    intro_pan_target: f64,
}

impl Coordinator {
    pub fn start(level_number: usize, config: &Config) -> Self {
        Coordinator {
            level_number,
            mode: Mode::Intro,
            camera: Camera::new(&config.camera),
            score: 0,
            slingshot: config.slingshot,
            slingshot_size: (0.0, 0.0),
            intro_pan_target: config.intro_pan_target,
        }
    }

    pub fn level_number(&self) -> usize {
        self.level_number
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn offset_left(&self) -> f64 {
        self.camera.offset_left()
    }

    pub fn slingshot(&self) -> &SlingshotConfig {
        &self.slingshot
    }

    pub fn set_slingshot_size(&mut self, width: f64, height: f64) {
        self.slingshot_size = (width, height);
    }

    /// One update step: pointer driven transitions first, then panning
    pub fn update(&mut self, mouse: &MouseState, canvas_width: f64) {
        self.handle_firing(mouse);
        self.handle_panning(mouse, canvas_width);
    }

    pub fn handle_firing(&mut self, mouse: &MouseState) {
        match self.mode {
            Mode::WaitForFiring if mouse.down && self.grabs_slingshot(mouse) => {
                self.mode = Mode::Firing;
            }
            Mode::Firing if !mouse.down => {
                self.mode = Mode::Fired;
            }
            _ => {}
        }
    }

    pub fn handle_panning(&mut self, mouse: &MouseState, canvas_width: f64) {
        match self.mode {
            Mode::Intro => {
                if self.camera.pan_to(self.intro_pan_target, canvas_width) {
                    self.mode = Mode::LoadNextHero;
                }
            }
            // no heroes to place yet, go straight to aiming
            Mode::LoadNextHero => self.mode = Mode::WaitForFiring,
            Mode::WaitForFiring => {
                let target = if mouse.dragging {
                    mouse.x + self.camera.offset_left()
                } else {
                    self.slingshot.x
                };
                self.camera.pan_to(target, canvas_width);
            }
            Mode::Firing => {
                self.camera.pan_to(self.slingshot.x, canvas_width);
            }
            Mode::Fired => {
                if self.camera.pan_to(self.slingshot.x, canvas_width) {
                    self.mode = Mode::LoadNextHero;
                }
            }
        }
    }

    /// Pointer is in canvas space, the slingshot sprite in world space
    fn grabs_slingshot(&self, mouse: &MouseState) -> bool {
        let (width, height) = self.slingshot_size;
        let margin = self.slingshot.grab_margin;
        let world_x = mouse.x + self.camera.offset_left();
        let left = self.slingshot.x - margin;
        let top = self.slingshot.y - margin;
        let inside_x = (left..=left + width + 2.0 * margin).contains(&world_x);
        let inside_y = (top..=top + height + 2.0 * margin).contains(&mouse.y);
        inside_x && inside_y
    }
}
