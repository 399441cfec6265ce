use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::config::HutConfig;

/// GPU and window handles for the on-screen renderer.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &HutConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find a GPU adapter")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Hut Device"),
                ..Default::default()
            })
            .await
            .context("Failed to open the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let config = surface_config(&surface_caps, size.width, size.height, settings)?;
        if size.width > 0 && size.height > 0 {
            surface.configure(&device, &config);
        }

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            clear_colour: settings.clear_colour,
        })
    }

    pub fn is_surface_configured(&self) -> bool {
        self.config.width > 0 && self.config.height > 0
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }
}

/// Picks the surface format, present mode and alpha mode from what the
/// adapter reports.
pub fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
    settings: &HutConfig,
) -> anyhow::Result<wgpu::SurfaceConfiguration> {
    // The vertex colours are meant to be written as-is, so a linear
    // target is preferred over an sRGB one.
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| caps.formats.first().copied())
        .context("The surface reports no supported formats")?;
    let alpha_mode = caps
        .alpha_modes
        .first()
        .copied()
        .context("The surface reports no supported alpha modes")?;
    let present_mode = if caps.present_modes.contains(&settings.present_mode) {
        settings.present_mode
    } else {
        wgpu::PresentMode::Fifo
    };
    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}
