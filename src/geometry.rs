//! Static hut geometry and the draw calls that interpret it.
//!
//! The hut lives in a single interleaved vertex array: the first four
//! vertices form the body (drawn as a triangle fan) and the last three the
//! roof (drawn as a plain triangle). Positions are already in clip space.

use std::ops::Range;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
    ];

    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub const HUT_VERTICES: [Vertex; 7] = [
    // body
    Vertex::new([-0.3, -0.3, 0.0], [1.0, 0.0, 0.0]),
    Vertex::new([0.3, -0.3, 0.0], [0.0, 1.0, 0.0]),
    Vertex::new([0.3, 0.5, 0.0], [0.0, 0.0, 1.0]),
    Vertex::new([-0.3, 0.5, 0.0], [1.0, 1.0, 0.0]),
    // roof
    Vertex::new([-0.5, 0.5, 0.0], [0.5, 0.0, 0.5]),
    Vertex::new([0.5, 0.5, 0.0], [0.2, 0.8, 0.2]),
    Vertex::new([0.0, 1.0, 0.0], [0.8, 0.2, 0.2]),
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    /// N vertices become N - 2 triangles sharing the first vertex.
    TriangleFan,
    TriangleList,
}

/// One draw over a contiguous run of [`HUT_VERTICES`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub topology: Topology,
    pub first: u32,
    pub count: u32,
}

impl DrawCall {
    pub const fn fan(first: u32, count: u32) -> Self {
        Self {
            topology: Topology::TriangleFan,
            first,
            count,
        }
    }

    pub const fn triangles(first: u32, count: u32) -> Self {
        Self {
            topology: Topology::TriangleList,
            first,
            count,
        }
    }

    pub fn vertices(&self) -> Range<u32> {
        self.first..self.first + self.count
    }
}

/// Body first, roof second. Issued in this order every frame.
pub const HUT_DRAWS: [DrawCall; 2] = [DrawCall::fan(0, 4), DrawCall::triangles(4, 3)];

/// Expands a triangle fan into triangle-list indices.
///
/// wgpu has no fan topology, so the fan `first..first + count` is drawn
/// through an index buffer instead. Fewer than three vertices produce no
/// triangles.
pub fn fan_indices(first: u32, count: u32) -> Vec<u32> {
    if count < 3 {
        return Vec::new();
    }
    (1..count - 1)
        .flat_map(|i| [first, first + i, first + i + 1])
        .collect()
}
