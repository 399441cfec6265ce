//! Per-frame draw encoding.
//!
//! [`encode_hut`] walks the draw list and hands every [`DrawCall`] to a
//! [`DrawEncoder`]. The wgpu implementation lives in [`PassEncoder`]; tests
//! use a recording encoder to check the sequence without a GPU.

use crate::{
    geometry::{DrawCall, HUT_DRAWS, Topology},
    pipeline::ShaderProgram,
    resources::HutBuffers,
};

pub trait DrawEncoder {
    fn draw(&mut self, call: &DrawCall);
}

pub fn encode_hut<E: DrawEncoder + ?Sized>(draws: &[DrawCall], encoder: &mut E) {
    for call in draws {
        encoder.draw(call);
    }
}

/// Issues draw calls into an open render pass with the hut buffers bound.
pub struct PassEncoder<'a, 'enc> {
    pass: &'a mut wgpu::RenderPass<'enc>,
    buffers: &'a HutBuffers,
}

impl<'a, 'enc> PassEncoder<'a, 'enc> {
    pub fn new(pass: &'a mut wgpu::RenderPass<'enc>, buffers: &'a HutBuffers) -> Self {
        pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        Self { pass, buffers }
    }
}

impl DrawEncoder for PassEncoder<'_, '_> {
    fn draw(&mut self, call: &DrawCall) {
        match call.topology {
            Topology::TriangleList => self.pass.draw(call.vertices(), 0..1),
            Topology::TriangleFan => match self.buffers.fan_range(call) {
                Some(indices) => self.pass.draw_indexed(indices, 0, 0..1),
                None => log::warn!("No fan indices uploaded for draw {:?}", call),
            },
        }
    }
}

/// Everything needed to draw the hut: geometry first so it is released
/// before the pipeline.
#[derive(Debug)]
pub struct Hut {
    pub buffers: HutBuffers,
    pub program: ShaderProgram,
}

impl Hut {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        Self::with_program(device, ShaderProgram::build(device, color_format))
    }

    pub fn with_program(device: &wgpu::Device, program: ShaderProgram) -> Self {
        let buffers = HutBuffers::upload(device);
        Self { buffers, program }
    }

    /// Clears `view` and draws the hut into it. Without a linked program
    /// only the clear happens.
    pub fn draw_frame(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear_colour: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Hut Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        if let Some(pipeline) = &self.program.pipeline {
            render_pass.set_pipeline(pipeline);
            let mut pass = PassEncoder::new(&mut render_pass, &self.buffers);
            encode_hut(&HUT_DRAWS, &mut pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<DrawCall>);

    impl DrawEncoder for Recorder {
        fn draw(&mut self, call: &DrawCall) {
            self.0.push(*call);
        }
    }

    #[test]
    fn one_frame_is_fan_then_triangle() {
        let mut recorder = Recorder::default();
        encode_hut(&HUT_DRAWS, &mut recorder);
        assert_eq!(
            recorder.0,
            vec![
                DrawCall {
                    topology: Topology::TriangleFan,
                    first: 0,
                    count: 4
                },
                DrawCall {
                    topology: Topology::TriangleList,
                    first: 4,
                    count: 3
                },
            ]
        );
    }

    #[test]
    fn every_frame_repeats_the_same_sequence() {
        let mut recorder = Recorder::default();
        for _ in 0..3 {
            encode_hut(&HUT_DRAWS, &mut recorder);
        }
        assert_eq!(recorder.0.len(), 6);
        for frame in recorder.0.chunks(2) {
            assert_eq!(frame, &HUT_DRAWS);
        }
    }

    #[test]
    fn empty_draw_list_issues_nothing() {
        let mut recorder = Recorder::default();
        encode_hut(&[], &mut recorder);
        assert!(recorder.0.is_empty());
    }
}
