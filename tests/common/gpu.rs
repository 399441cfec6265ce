use colored_hut::{
    config::{WINDOW_HEIGHT, WINDOW_WIDTH},
    offscreen::Offscreen,
};

pub const WIDTH: u32 = WINDOW_WIDTH;
pub const HEIGHT: u32 = WINDOW_HEIGHT;

pub async fn offscreen() -> Offscreen {
    Offscreen::new()
        .await
        .expect("Failed to create a headless GPU device for integration tests.")
}

/// Pixel under the clip-space point `(x, y)`.
pub fn ndc_pixel(img: &image::RgbaImage, x: f32, y: f32) -> image::Rgba<u8> {
    let (w, h) = img.dimensions();
    let px = (((x + 1.0) / 2.0) * w as f32) as u32;
    let py = (((1.0 - y) / 2.0) * h as f32) as u32;
    *img.get_pixel(px.min(w - 1), py.min(h - 1))
}

pub fn colour_to_pixel(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}
