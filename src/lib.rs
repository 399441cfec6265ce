//! colored-hut
//!
//! Opens an 800×600 window and draws a small vertex-coloured hut every frame
//! until the window is closed: a quad body rendered as a triangle fan and a
//! triangular roof, both from one static vertex buffer.
//!
//! Modules
//! - `config`: fixed window and surface settings
//! - `geometry`: the hut vertices, their layout and the per-frame draw list
//! - `shader`: shader sources plus naga-based compile and link checks
//! - `pipeline`: turns the checked shaders into a wgpu render pipeline
//! - `resources`: uploads the geometry into GPU buffers
//! - `render`: encodes the draw list into a render pass
//! - `context`: window surface, device and queue
//! - `app`: winit event loop, fatal error handling and exit status
//! - `offscreen` (feature `integration-tests`): headless single-frame capture
//!

pub mod app;
pub mod config;
pub mod context;
pub mod geometry;
#[cfg(feature = "integration-tests")]
pub mod offscreen;
pub mod pipeline;
pub mod render;
pub mod resources;
pub mod shader;
