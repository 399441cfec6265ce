//! Fixed application settings.
//!
//! Nothing here is read from the command line or from disk. The values are
//! collected in one place so the window, the surface and the offscreen test
//! renderer agree on them.

pub const WINDOW_TITLE: &str = "A Simple Colored Hut";
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;

#[derive(Debug, Clone)]
pub struct HutConfig {
    pub title: &'static str,
    pub width: u32,
    pub height: u32,
    pub clear_colour: wgpu::Color,
    pub present_mode: wgpu::PresentMode,
}

impl Default for HutConfig {
    fn default() -> Self {
        Self {
            title: WINDOW_TITLE,
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            clear_colour: wgpu::Color::BLACK,
            // blocks on vsync like the swap in the classic GL loop
            present_mode: wgpu::PresentMode::AutoVsync,
        }
    }
}
