use ab_glyph::FontVec;
use anyhow::{Context, Result};
use memspan_experiment::{CancelToken, PointerState, Session, SessionStatus};
use memspan_render::SkiaRenderer;
use memspan_timing::{FrameStats, HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    session: Session<HighPrecisionTimer, StdRng>,
    cancel: CancelToken,
    font: Option<FontVec>,
    images: Vec<PathBuf>,
    pointer: PointerState,
    cursor_shown: bool,
    last_frame: Option<u64>,
    current_size: Option<PhysicalSize<u32>>,
    refresh_rate: Option<f64>,
    failure: Option<anyhow::Error>,
    should_exit: bool,
}

impl App {
    pub fn new(
        session: Session<HighPrecisionTimer, StdRng>,
        font: FontVec,
        images: Vec<PathBuf>,
    ) -> Self {
        let cancel = session.cancel_token();
        Self {
            window: None,
            pixels: None,
            renderer: None,
            session,
            cancel,
            font: Some(font),
            images,
            pointer: PointerState::default(),
            cursor_shown: false,
            last_frame: None,
            current_size: None,
            refresh_rate: None,
            failure: None,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "press SPACE to continue, ESC to quit"
        );
        event_loop.run_app(&mut self)?;

        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no monitor available")?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Memory span")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale = window.scale_factor(),
            refresh_hz = ?self.refresh_rate,
            "display"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let mut renderer =
            SkiaRenderer::new(physical_size.width, physical_size.height, self.font.take())?;
        for path in &self.images {
            renderer.preload_image(path)?;
        }
        debug!(images = self.images.len(), "images preloaded");
        self.renderer = Some(renderer);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    /// Draws the current scene, then advances the session by one frame.
    fn frame(&mut self) -> Result<SessionStatus> {
        let (Some(window), Some(pixels), Some(renderer)) =
            (self.window.clone(), self.pixels.as_mut(), self.renderer.as_mut())
        else {
            return Ok(SessionStatus::Running);
        };

        let scene = self.session.scene();
        let stats = renderer.render(&scene, pixels.frame_mut())?;
        pixels.render()?;
        trace!(
            commands = stats.commands,
            draw_us = stats.draw.as_micros() as u64,
            copy_us = stats.copy.as_micros() as u64,
            total_us = stats.total.as_micros() as u64,
            "frame rendered"
        );

        let now = self.session.timer.now();
        if let Some(last) = self.last_frame.replace(now) {
            self.session
                .record_frame(Duration::from_nanos(now.saturating_sub(last)));
        }

        let status = self.session.update(self.pointer)?;
        if status != SessionStatus::Running {
            return Ok(status);
        }

        let visible = self.session.cursor_visible();
        if visible != self.cursor_shown {
            window.set_cursor_visible(visible);
            self.cursor_shown = visible;
        }
        if let Some(pos) = self.session.take_cursor_warp() {
            let (x, y) = renderer.screen().to_pixels(pos);
            match window.set_cursor_position(PhysicalPosition::new(x as f64, y as f64)) {
                Ok(()) => self.pointer.pos = pos,
                Err(e) => warn!("cannot move cursor: {e}"),
            }
        }

        window.request_redraw();
        Ok(status)
    }

    fn handle_key(&mut self, key: PhysicalKey) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => {
                if self.session.advance() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            KeyCode::Escape => {
                info!("interrupted by user");
                self.cancel.cancel();
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if self.current_size == Some(new_size) {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!("{e}");
            }
        }
        info!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            return;
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }

        if let Err(e) = self.session.finish() {
            error!("failed to save results: {e}");
        }

        log_frame_stats("frame interval", &self.session.frame_stats());
        if let Some(renderer) = &self.renderer {
            log_frame_stats("render time", &renderer.frame_stats());
        }

        self.should_exit = true;
        event_loop.exit();
    }
}

fn log_frame_stats(what: &str, stats: &FrameStats) {
    if stats.samples == 0 {
        return;
    }
    info!(
        samples = stats.samples,
        mean_ms = stats.average_frame_time_ns / 1e6,
        jitter_ms = stats.jitter_ns / 1e6,
        min_ms = stats.min_frame_time_ns / 1e6,
        max_ms = stats.max_frame_time_ns / 1e6,
        fps = stats.effective_fps,
        "{what}"
    );
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e:#}");
                self.failure = Some(e);
                self.cleanup_and_exit(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.cancel.cancel();
                self.cleanup_and_exit(event_loop);
            }
            WindowEvent::RedrawRequested => match self.frame() {
                Ok(SessionStatus::Running) => {}
                Ok(SessionStatus::Finished) => {
                    info!("experiment completed");
                    self.cleanup_and_exit(event_loop);
                }
                Ok(SessionStatus::Cancelled) => {
                    info!("experiment cancelled");
                    self.cleanup_and_exit(event_loop);
                }
                Err(e) => {
                    error!("{e:#}");
                    self.failure = Some(e);
                    self.cleanup_and_exit(event_loop);
                }
            },
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_key(event.physical_key);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(renderer) = &self.renderer {
                    self.pointer.pos = renderer
                        .screen()
                        .to_scene((position.x as f32, position.y as f32));
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.pointer.pressed = state == ElementState::Pressed;
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
