use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::geometry::{DrawCall, HUT_DRAWS, HUT_VERTICES, Topology, fan_indices};

/// GPU copies of the hut geometry, uploaded once and never written again.
///
/// Fan draws are served from `index_buffer`; `fan_ranges` maps each fan in
/// [`HUT_DRAWS`] (by its first vertex) to its slice of indices.
#[derive(Debug)]
pub struct HutBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    fan_ranges: Vec<(u32, Range<u32>)>,
}

impl HutBuffers {
    pub fn upload(device: &wgpu::Device) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Hut Vertex Buffer"),
            contents: bytemuck::cast_slice(&HUT_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut indices: Vec<u32> = Vec::new();
        let mut fan_ranges = Vec::new();
        for draw in HUT_DRAWS.iter().filter(|d| d.topology == Topology::TriangleFan) {
            let start = indices.len() as u32;
            indices.extend(fan_indices(draw.first, draw.count));
            fan_ranges.push((draw.first, start..indices.len() as u32));
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Hut Fan Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "Uploaded {} hut vertices and {} fan indices",
            HUT_VERTICES.len(),
            indices.len()
        );

        Self {
            vertex_buffer,
            index_buffer,
            fan_ranges,
        }
    }

    pub fn fan_range(&self, draw: &DrawCall) -> Option<Range<u32>> {
        self.fan_ranges
            .iter()
            .find(|(first, _)| *first == draw.first)
            .map(|(_, range)| range.clone())
    }
}

impl Drop for HutBuffers {
    fn drop(&mut self) {
        log::debug!("Releasing hut vertex and index buffers");
    }
}
