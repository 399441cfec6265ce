//! Shader sources and the compile/link checks run before a pipeline is built.
//!
//! wgpu reports invalid shaders through its device error handler, which
//! panics by default. To get a readable message (and to be able to keep
//! running) each stage is parsed and validated with naga first, and the
//! vertex outputs are matched against the fragment inputs the way a GL
//! program link would.

use std::{collections::BTreeMap, fmt};

use naga::{Binding, Handle, Interpolation, Module, Sampling, ScalarKind, Type, TypeInner};

use crate::geometry::Vertex;

pub const VERTEX_SHADER: &str = include_str!("shaders/hut_vertex.wgsl");
pub const FRAGMENT_SHADER: &str = include_str!("shaders/hut_fragment.wgsl");

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn entry_point(self) -> &'static str {
        match self {
            Stage::Vertex => "vs_main",
            Stage::Fragment => "fs_main",
        }
    }

    fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("Vertex"),
            Stage::Fragment => f.write_str("Fragment"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    Compile(Stage),
    Link,
}

/// A failed compile or link. `message` is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl ShaderDiagnostic {
    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            String::from("no diagnostic reported")
        } else {
            message
        };
        Self { kind, message }
    }
}

impl fmt::Display for ShaderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Compile(stage) => {
                write!(f, "{} shader compilation error: {}", stage, self.message)
            }
            DiagnosticKind::Link => write!(f, "Shader program linking error: {}", self.message),
        }
    }
}

impl std::error::Error for ShaderDiagnostic {}

/// Parses and validates one stage and checks that its entry point exists.
pub fn compile(stage: Stage, source: &str) -> Result<Module, ShaderDiagnostic> {
    let kind = DiagnosticKind::Compile(stage);
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderDiagnostic::new(kind, e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| ShaderDiagnostic::new(kind, format!("validation error: {e}")))?;

    let entry_point = stage.entry_point();
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == stage.naga())
    {
        return Err(ShaderDiagnostic::new(
            kind,
            format!("entry point '{}' not found", entry_point),
        ));
    }
    Ok(module)
}

/// Checks the vertex stage against the hut vertex layout and every location
/// the fragment stage reads against what the vertex stage writes: same type,
/// same interpolation and sampling.
pub fn link(vertex: &Module, fragment: &Module) -> Result<(), ShaderDiagnostic> {
    let vs = entry_function(vertex, Stage::Vertex)?;
    let fs = entry_function(fragment, Stage::Fragment)?;

    let mut attributes = BTreeMap::new();
    for argument in &vs.arguments {
        collect_locations(vertex, argument.ty, argument.binding.as_ref(), &mut attributes);
    }
    check_vertex_inputs(&attributes, &Vertex::ATTRIBUTES)?;

    let mut outputs = BTreeMap::new();
    if let Some(result) = &vs.result {
        collect_locations(vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = BTreeMap::new();
    for argument in &fs.arguments {
        collect_locations(fragment, argument.ty, argument.binding.as_ref(), &mut inputs);
    }

    for (location, input) in &inputs {
        let output = outputs.get(location).ok_or_else(|| {
            link_error(format!(
                "fragment input at location {} is not written by the vertex stage",
                location
            ))
        })?;
        if output.ty != input.ty {
            return Err(link_error(format!(
                "location {} type mismatch: vertex writes {:?}, fragment reads {:?}",
                location, output.ty, input.ty
            )));
        }
        if output.interpolation != input.interpolation || output.sampling != input.sampling {
            return Err(link_error(format!(
                "location {} interpolation mismatch: vertex uses {:?}/{:?}, fragment uses {:?}/{:?}",
                location, output.interpolation, output.sampling, input.interpolation, input.sampling
            )));
        }
    }
    Ok(())
}

/// Every vertex input has to be fed by a buffer attribute of the same scalar
/// kind. The component count may differ.
fn check_vertex_inputs(
    inputs: &BTreeMap<u32, InterfaceVar>,
    attributes: &[wgpu::VertexAttribute],
) -> Result<(), ShaderDiagnostic> {
    for (location, input) in inputs {
        let attribute = attributes
            .iter()
            .find(|a| a.shader_location == *location)
            .ok_or_else(|| {
                link_error(format!(
                    "vertex input at location {} has no matching vertex attribute",
                    location
                ))
            })?;
        let expected = format_kind(attribute.format);
        if scalar_kind(&input.ty) != Some(expected) {
            return Err(link_error(format!(
                "vertex input at location {} is {:?} but the attribute is {:?}",
                location, input.ty, attribute.format
            )));
        }
    }
    Ok(())
}

fn format_kind(format: wgpu::VertexFormat) -> ScalarKind {
    use wgpu::VertexFormat as F;
    match format {
        F::Uint8x2
        | F::Uint8x4
        | F::Uint16x2
        | F::Uint16x4
        | F::Uint32
        | F::Uint32x2
        | F::Uint32x3
        | F::Uint32x4 => ScalarKind::Uint,
        F::Sint8x2
        | F::Sint8x4
        | F::Sint16x2
        | F::Sint16x4
        | F::Sint32
        | F::Sint32x2
        | F::Sint32x3
        | F::Sint32x4 => ScalarKind::Sint,
        _ => ScalarKind::Float,
    }
}

fn scalar_kind(ty: &TypeInner) -> Option<ScalarKind> {
    match ty {
        TypeInner::Scalar(scalar) | TypeInner::Vector { scalar, .. } => Some(scalar.kind),
        _ => None,
    }
}

fn link_error(message: String) -> ShaderDiagnostic {
    ShaderDiagnostic::new(DiagnosticKind::Link, message)
}

fn entry_function(module: &Module, stage: Stage) -> Result<&naga::Function, ShaderDiagnostic> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == stage.entry_point() && ep.stage == stage.naga())
        .map(|ep| &ep.function)
        .ok_or_else(|| {
            link_error(format!(
                "{} stage has no '{}' entry point",
                stage,
                stage.entry_point()
            ))
        })
}

#[derive(Debug, Clone, PartialEq)]
struct InterfaceVar {
    ty: TypeInner,
    interpolation: Option<Interpolation>,
    sampling: Option<Sampling>,
}

// Builtins such as the clip position are not part of the interface.
fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut BTreeMap<u32, InterfaceVar>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => {
            out.insert(
                *location,
                InterfaceVar {
                    ty: inner.clone(),
                    interpolation: *interpolation,
                    sampling: *sampling,
                },
            );
        }
        Some(Binding::BuiltIn(_)) => (),
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_shaders_compile_and_link() {
        let vertex = compile(Stage::Vertex, VERTEX_SHADER).expect("vertex shader");
        let fragment = compile(Stage::Fragment, FRAGMENT_SHADER).expect("fragment shader");
        link(&vertex, &fragment).expect("link");
    }

    #[test]
    fn syntax_error_reports_a_compile_diagnostic() {
        let err = compile(Stage::Vertex, "@vertex fn vs_main( -> {").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Compile(Stage::Vertex));
        assert!(!err.message.trim().is_empty());
        assert!(err.to_string().starts_with("Vertex shader compilation error: "));
    }

    #[test]
    fn type_error_reports_a_compile_diagnostic() {
        let source = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                let x: f32 = vec2<f32>(1.0, 2.0);
                return vec4<f32>(x, x, x, 1.0);
            }
        "#;
        let err = compile(Stage::Fragment, source).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Compile(Stage::Fragment));
        assert!(!err.message.is_empty());
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile(Stage::Fragment, VERTEX_SHADER).unwrap_err();
        assert!(err.message.contains("fs_main"));
    }

    #[test]
    fn unwritten_fragment_input_fails_to_link() {
        let vertex = compile(
            Stage::Vertex,
            r#"
            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(position, 1.0);
            }
            "#,
        )
        .unwrap();
        let fragment = compile(Stage::Fragment, FRAGMENT_SHADER).unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Link);
        assert!(err.message.contains("location 0"));
        assert!(err.to_string().starts_with("Shader program linking error: "));
    }

    #[test]
    fn mismatched_interface_type_fails_to_link() {
        let vertex = compile(Stage::Vertex, VERTEX_SHADER).unwrap();
        let fragment = compile(
            Stage::Fragment,
            r#"
            @fragment
            fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
                return color;
            }
            "#,
        )
        .unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(err.message.contains("type mismatch"));
    }

    #[test]
    fn vertex_input_without_an_attribute_fails_to_link() {
        let vertex = compile(
            Stage::Vertex,
            r#"
            struct VertexOutput {
                @builtin(position) clip_position: vec4<f32>,
                @location(0) color: vec3<f32>,
            };

            @vertex
            fn vs_main(
                @location(0) position: vec3<f32>,
                @location(1) color: vec3<f32>,
                @location(2) extra: vec3<f32>,
            ) -> VertexOutput {
                var out: VertexOutput;
                out.clip_position = vec4<f32>(position + extra, 1.0);
                out.color = color;
                return out;
            }
            "#,
        )
        .unwrap();
        let fragment = compile(Stage::Fragment, FRAGMENT_SHADER).unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Link);
        assert!(err.message.contains("location 2"), "{}", err.message);
    }

    #[test]
    fn vertex_input_of_the_wrong_scalar_kind_fails_to_link() {
        let vertex = compile(
            Stage::Vertex,
            r#"
            @vertex
            fn vs_main(@location(0) position: vec3<u32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(vec3<f32>(position), 1.0);
            }
            "#,
        )
        .unwrap();
        let fragment = compile(
            Stage::Fragment,
            r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
            "#,
        )
        .unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(err.message.contains("location 0"), "{}", err.message);
    }

    #[test]
    fn flat_on_one_side_only_fails_to_link() {
        let vertex = compile(Stage::Vertex, VERTEX_SHADER).unwrap();
        let fragment = compile(
            Stage::Fragment,
            r#"
            struct FragmentInput {
                @location(0) @interpolate(flat) color: vec3<f32>,
            };

            @fragment
            fn fs_main(frag: FragmentInput) -> @location(0) vec4<f32> {
                return vec4<f32>(frag.color, 1.0);
            }
            "#,
        )
        .unwrap();
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(err.message.contains("interpolation mismatch"), "{}", err.message);
    }

    #[test]
    fn matching_flat_interpolation_links() {
        let vertex = compile(
            Stage::Vertex,
            r#"
            struct VertexOutput {
                @builtin(position) clip_position: vec4<f32>,
                @location(0) @interpolate(flat) color: vec3<f32>,
            };

            @vertex
            fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
                var out: VertexOutput;
                out.clip_position = vec4<f32>(position, 1.0);
                out.color = color;
                return out;
            }
            "#,
        )
        .unwrap();
        let fragment = compile(
            Stage::Fragment,
            r#"
            @fragment
            fn fs_main(@location(0) @interpolate(flat) color: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 1.0);
            }
            "#,
        )
        .unwrap();
        link(&vertex, &fragment).expect("flat on both sides");
    }

    #[test]
    fn empty_messages_are_replaced() {
        let diag = ShaderDiagnostic::new(DiagnosticKind::Link, "  ");
        assert!(!diag.message.trim().is_empty());
    }
}
