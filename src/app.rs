//! Window lifecycle and the render loop.
//!
//! The loop is driven by winit: every `RedrawRequested` clears the surface,
//! draws the hut and presents, then asks for the next redraw. A close
//! request ends the loop; dropping [`AppState`] afterwards releases the
//! geometry, the pipeline and the surface in that order.
//!
//! Failures while acquiring the window or the GPU are fatal. They are kept
//! until the event loop returns and then handed back from [`run`], which the
//! binary maps to a non-zero exit status through [`exit_status`].

use std::sync::Arc;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{config::HutConfig, context::Context, render::Hut};

/// Exit status for fatal initialisation errors (`-1` as an 8-bit status).
pub const INIT_FAILURE_STATUS: u8 = 255;

#[derive(Debug)]
struct AppState {
    hut: Hut,
    ctx: Context,
    frames: u64,
}

impl AppState {
    async fn new(window: Arc<Window>, settings: &HutConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, settings).await?;
        let hut = Hut::new(&ctx.device, ctx.config.format);
        Ok(Self { hut, ctx, frames: 0 })
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        if !self.ctx.is_surface_configured() {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.hut.draw_frame(&mut encoder, &view, self.ctx.clear_colour);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        self.ctx.window.pre_present_notify();
        output.present();
        self.frames += 1;
        Ok(())
    }
}

/// What the event loop should do after a window event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Exit,
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    settings: HutConfig,
    state: Option<AppState>,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: HutConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("Failed to start the async runtime")?;
        Ok(Self {
            async_runtime,
            settings,
            state: None,
            failure: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        self.record_failure(error);
        event_loop.exit();
    }

    fn record_failure(&mut self, error: anyhow::Error) {
        self.state = None;
        self.failure = Some(error);
    }

    pub fn frames_rendered(&self) -> u64 {
        self.state.as_ref().map_or(0, |state| state.frames)
    }

    /// Hands back the fatal initialisation error, if there was one.
    pub fn finish(mut self) -> anyhow::Result<()> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.width as f64,
                self.settings.height as f64,
            ))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create the window")?,
        );
        self.async_runtime
            .block_on(AppState::new(window, &self.settings))
            .context("Failed to initialize the GPU")
    }

    fn handle_window_event(&mut self, event: WindowEvent) -> LoopControl {
        if let WindowEvent::CloseRequested = event {
            return LoopControl::Exit;
        }
        // Nothing to draw into until init succeeds, and never after it fails.
        let Some(state) = &mut self.state else {
            return LoopControl::Continue;
        };

        match event {
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => match state.render() {
                Ok(()) => (),
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = state.ctx.window.inner_size();
                    state.ctx.resize(size.width, size.height);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of GPU memory, closing");
                    return LoopControl::Exit;
                }
                Err(e) => log::warn!("Unable to render: {}", e),
            },
            _ => (),
        }
        LoopControl::Continue
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.failure.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.handle_window_event(event) == LoopControl::Exit {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            log::info!("Window closed after {} frames, releasing GPU resources", state.frames);
        }
    }
}

fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Warning: Could not initialize logger: {}", e);
    }
}

/// Opens the window and renders until it is closed.
pub fn run() -> anyhow::Result<()> {
    init_logger();

    let event_loop = EventLoop::new().context("Failed to initialize the windowing system")?;
    let mut app = App::new(HutConfig::default())?;
    event_loop
        .run_app(&mut app)
        .context("The event loop terminated abnormally")?;
    app.finish()
}

pub fn exit_status(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => INIT_FAILURE_STATUS,
    }
}
