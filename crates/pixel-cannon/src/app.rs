//! App runner and the [`Game`] callbacks.
//!
//! [`App`] owns the configuration, opens the window, and drives a [`Game`]
//! through its life cycle:
//!
//! ```text
//! window created ─► init
//!                    │
//!        ┌───────────▼───────────┐
//!        │ update ─► draw ─► present (every redraw)
//!        └───────────┬───────────┘
//!                    │ close requested / ctx.exit() / error
//!                    ▼
//!                 shutdown
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pixel_cannon::prelude::*;
//!
//! struct Hello;
//!
//! impl Game for Hello {
//!     fn draw(&mut self, ctx: &mut GameContext) -> Result<()> {
//!         ctx.graphics.clear(RenderTarget::BackBuffer, Color::BLACK)
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     App::new(Config::default()).run(Hello)
//! }
//! ```

use std::sync::Arc;

use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::Window;

use crate::config::Config;
use crate::error::Result;
use crate::graphics::GraphicsContext;
use crate::input::{Cursor, Input, KeyCode, MouseButton};
use crate::render::WgpuBackend;
use crate::time::Time;
use crate::window::WinitApp;

/// Callbacks a game implements. Only [`draw`](Game::draw) is required.
///
/// Returning an error from any callback stops the event loop; `shutdown` still
/// runs and the error is returned from [`App::run`].
pub trait Game {
    /// Called once, after the window and GPU are ready.
    fn init(&mut self, ctx: &mut GameContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Record this frame's clears and passes. The back buffer is presented
    /// afterwards, so every pass must be closed with `end()` by then.
    fn draw(&mut self, ctx: &mut GameContext) -> Result<()>;

    /// Called once before the window closes. Free GPU resources here.
    fn shutdown(&mut self, ctx: &mut GameContext) {
        let _ = ctx;
    }
}

/// Everything a [`Game`] callback can reach.
pub struct GameContext {
    pub graphics: GraphicsContext<WgpuBackend>,
    pub keyboard: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    pub cursor: Cursor,
    pub time: Time,
    window: Arc<Window>,
    exit_requested: bool,
}

impl GameContext {
    pub(crate) fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let backend = WgpuBackend::new(window.clone(), config)?;
        let graphics = GraphicsContext::new(backend, config.graphics.max_vertices)?;
        Ok(Self {
            graphics,
            keyboard: Input::new(),
            mouse: Input::new(),
            cursor: Cursor::default(),
            time: Time::new(),
            window,
            exit_requested: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    /// Stop after the current frame.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Clear one-update edge state once a frame has been handled.
    pub(crate) fn end_frame(&mut self) {
        self.keyboard.end_frame();
        self.mouse.end_frame();
        self.cursor.end_frame();
    }
}

/// Opens the window and runs a [`Game`] until it exits.
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load the configuration from a JSON file, falling back to defaults
    /// when the file does not exist.
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            Config::from_file(path)?
        } else {
            log::info!("no config at '{}', using defaults", path.display());
            Config::default()
        };
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the event loop. Returns once the window has closed.
    pub fn run<G: Game>(self, game: G) -> Result<()> {
        self.config.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = WinitApp::new(self.config, game);
        event_loop.run_app(&mut app)?;
        app.into_result()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
