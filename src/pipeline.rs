use crate::{
    geometry::Vertex,
    shader::{self, ShaderDiagnostic, Stage},
};

/// The linked vertex/fragment pair.
///
/// Compile and link failures are logged and kept in `diagnostics`, but they
/// do not stop the program: `pipeline` is simply `None` and frames are
/// cleared without drawing the hut.
#[derive(Debug)]
pub struct ShaderProgram {
    pub pipeline: Option<wgpu::RenderPipeline>,
    pub diagnostics: Vec<ShaderDiagnostic>,
}

impl ShaderProgram {
    pub fn build(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        Self::from_sources(
            device,
            color_format,
            shader::VERTEX_SHADER,
            shader::FRAGMENT_SHADER,
        )
    }

    pub fn from_sources(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Self {
        let diagnostics = diagnose(vertex_source, fragment_source);
        let linked = diagnostics.is_empty();

        let pipeline = if linked {
            Some(mk_hut_pipeline(
                device,
                color_format,
                vertex_source,
                fragment_source,
            ))
        } else {
            log::error!("Continuing without a render pipeline; the hut will not be drawn");
            None
        };

        Self {
            pipeline,
            diagnostics,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if self.pipeline.is_some() {
            log::debug!("Releasing hut render pipeline");
        }
    }
}

/// Compiles and links both stages without touching the GPU, logging every
/// diagnostic at error level. An empty result means the pair links.
pub fn diagnose(vertex_source: &str, fragment_source: &str) -> Vec<ShaderDiagnostic> {
    let vertex = shader::compile(Stage::Vertex, vertex_source);
    let fragment = shader::compile(Stage::Fragment, fragment_source);

    let mut diagnostics = Vec::new();
    match (vertex, fragment) {
        (Ok(vertex), Ok(fragment)) => diagnostics.extend(shader::link(&vertex, &fragment).err()),
        (vertex, fragment) => {
            diagnostics.extend(vertex.err());
            diagnostics.extend(fragment.err());
        }
    }

    for diagnostic in &diagnostics {
        log::error!("{}", diagnostic);
    }
    diagnostics
}

pub fn mk_hut_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    vertex_source: &str,
    fragment_source: &str,
) -> wgpu::RenderPipeline {
    // Both modules only live until the pipeline holds them.
    let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Hut Vertex Shader"),
        source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
    });
    let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Hut Fragment Shader"),
        source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Hut Render Pipeline"),
        layout: None,
        vertex: wgpu::VertexState {
            module: &vertex,
            entry_point: Some(Stage::Vertex.entry_point()),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment,
            entry_point: Some(Stage::Fragment.entry_point()),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
