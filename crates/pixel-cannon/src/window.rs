//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`]: creates the window
//! and GPU state on `resumed`, feeds input into the [`GameContext`], and runs
//! one update/draw/present cycle per redraw.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::app::{Game, GameContext};
use crate::config::Config;
use crate::error::{Error, Result};

/// Pixels per scroll line when the platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// The application state that winit drives.
pub(crate) struct WinitApp<G: Game> {
    config: Config,
    game: G,
    ctx: Option<GameContext>,
    error: Option<Error>,
    shut_down: bool,
}

impl<G: Game> WinitApp<G> {
    pub fn new(config: Config, game: G) -> Self {
        Self {
            config,
            game,
            ctx: None,
            error: None,
            shut_down: false,
        }
    }

    /// The first error that stopped the loop, if any.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(&window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(window.width, window.height))
            .with_resizable(window.resizable);
        let window = Arc::new(event_loop.create_window(attrs)?);
        log::info!("window '{}' created", self.config.window.title);

        let mut ctx = GameContext::new(window.clone(), &self.config)?;
        self.game.init(&mut ctx)?;
        self.ctx = Some(ctx);
        window.request_redraw();
        Ok(())
    }

    fn frame(&mut self) -> Result<()> {
        let Some(ctx) = self.ctx.as_mut() else {
            return Ok(());
        };
        ctx.time.tick();

        let result = run_frame(&mut self.game, ctx);
        ctx.end_frame();

        if result.is_err() {
            ctx.graphics.abandon();
        }
        result
    }

    /// Log and stop, keeping the first error for [`into_result`](Self::into_result).
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.stop(event_loop);
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown_game();
        event_loop.exit();
    }

    /// Shutdown must run while the GPU objects are still alive, and only once.
    fn shutdown_game(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Some(ctx) = self.ctx.as_mut() {
            self.game.shutdown(ctx);
        }
    }
}

/// What the loop does after a frame fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Configure the surface again and keep running.
    Reconfigure,
    /// Drop the frame and keep running.
    Skip,
    Exit,
}

fn recovery(error: &Error) -> Recovery {
    match error {
        Error::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => Recovery::Reconfigure,
        Error::Surface(wgpu::SurfaceError::OutOfMemory) => Recovery::Exit,
        Error::Surface(_) => Recovery::Skip,
        _ => Recovery::Exit,
    }
}

fn run_frame<G: Game>(game: &mut G, ctx: &mut GameContext) -> Result<()> {
    game.update(ctx)?;
    game.draw(ctx)?;
    ctx.graphics.present()
}

impl<G: Game> ApplicationHandler for WinitApp<G> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() || self.shut_down {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.shut_down {
            return;
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                self.stop(event_loop);
            }

            WindowEvent::Resized(size) => {
                ctx.graphics.resize(size.width, size.height);
            }

            WindowEvent::Focused(false) => {
                ctx.keyboard.release_all();
                ctx.mouse.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => ctx.keyboard.press(key_code),
                        ElementState::Released => ctx.keyboard.release(key_code),
                    }
                }
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => ctx.mouse.press(button),
                ElementState::Released => ctx.mouse.release(button),
            },

            WindowEvent::CursorMoved { position, .. } => {
                ctx.cursor.position = glam::Vec2::new(position.x as f32, position.y as f32);
            }

            WindowEvent::CursorEntered { .. } => ctx.cursor.inside = true,
            WindowEvent::CursorLeft { .. } => ctx.cursor.inside = false,

            WindowEvent::MouseWheel { delta, .. } => {
                ctx.cursor.scroll += match delta {
                    MouseScrollDelta::LineDelta(x, y) => glam::Vec2::new(x, y),
                    MouseScrollDelta::PixelDelta(p) => {
                        glam::Vec2::new(p.x as f32, p.y as f32) / PIXELS_PER_LINE
                    }
                };
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    match recovery(&e) {
                        Recovery::Reconfigure => {
                            log::debug!("Surface lost or outdated, reconfiguring");
                            if let Some(ctx) = self.ctx.as_mut() {
                                ctx.graphics.backend_mut().reconfigure_surface();
                            }
                        }
                        Recovery::Skip => log::warn!("Surface error: {e}, skipping frame"),
                        Recovery::Exit => {
                            if matches!(e, Error::Surface(wgpu::SurfaceError::OutOfMemory)) {
                                log::error!("Out of GPU memory!");
                            }
                            self.fail(event_loop, e);
                            return;
                        }
                    }
                }

                let exit = self.ctx.as_ref().is_some_and(GameContext::exit_requested);
                if exit {
                    log::info!("Game requested exit.");
                    self.stop(event_loop);
                } else if let Some(ctx) = self.ctx.as_ref() {
                    ctx.window().request_redraw();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown_game();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_surface_keeps_running() {
        assert_eq!(recovery(&Error::Surface(wgpu::SurfaceError::Outdated)), Recovery::Reconfigure);
        assert_eq!(recovery(&Error::Surface(wgpu::SurfaceError::Lost)), Recovery::Reconfigure);
        assert_eq!(recovery(&Error::Surface(wgpu::SurfaceError::Timeout)), Recovery::Skip);
        assert_eq!(recovery(&Error::Surface(wgpu::SurfaceError::Other)), Recovery::Skip);
    }

    #[test]
    fn out_of_memory_and_game_errors_exit() {
        assert_eq!(recovery(&Error::Surface(wgpu::SurfaceError::OutOfMemory)), Recovery::Exit);
        assert_eq!(recovery(&Error::DrawNotInProgress), Recovery::Exit);
    }
}
