//! Headless rendering for golden image tests.
//!
//! Draws one frame into an `Rgba8Unorm` texture instead of a window surface
//! and copies it back into an [`image::RgbaImage`].

use std::time::Duration;

use anyhow::Context as _;

use crate::{pipeline::ShaderProgram, render::Hut};

pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct Offscreen {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl Offscreen {
    pub async fn new() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find a GPU adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Offscreen Device"),
                ..Default::default()
            })
            .await
            .context("Failed to open the GPU device")?;
        Ok(Self { device, queue })
    }

    pub fn hut(&self) -> Hut {
        Hut::new(&self.device, OFFSCREEN_FORMAT)
    }

    pub fn hut_from_sources(&self, vertex_source: &str, fragment_source: &str) -> Hut {
        let program = ShaderProgram::from_sources(
            &self.device,
            OFFSCREEN_FORMAT,
            vertex_source,
            fragment_source,
        );
        Hut::with_program(&self.device, program)
    }

    pub async fn render(
        &self,
        hut: &Hut,
        width: u32,
        height: u32,
        clear_colour: wgpu::Color,
    ) -> anyhow::Result<image::RgbaImage> {
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Golden Image Test Output Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Rows in the copy buffer have to be padded to 256 bytes.
        let unpadded_row = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Golden Image Readback Buffer"),
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Encoder"),
            });
        hut.draw_frame(&mut encoder, &view, clear_colour);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .context("Timed out waiting for the GPU")?;
        rx.receive()
            .await
            .context("Readback channel closed")?
            .context("Failed to map the readback buffer")?;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded_row as usize)
                .flat_map(|row| &row[..unpadded_row as usize])
                .copied()
                .collect::<Vec<u8>>()
        };
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .context("Readback size does not match the texture")
    }
}
