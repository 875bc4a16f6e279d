//! Surface composition: clear, copy the QR bitmap, then overlay the logo.

use image::{Rgba, RgbaImage};

use crate::logo::LogoImage;

/// Placement of the logo on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoRect {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl LogoRect {
    /// Exclusive bottom-right corner.
    pub fn end(&self) -> (u32, u32) {
        (self.x + self.side, self.y + self.side)
    }
}

/// Centered square covering a quarter of the surface side.
pub fn logo_rect(surface_size: u32) -> LogoRect {
    let side = surface_size / 4;
    let offset = (surface_size - side) / 2;
    LogoRect {
        x: offset,
        y: offset,
        side,
    }
}

/// A fresh, fully transparent surface.
pub fn clear_surface(size: u32) -> RgbaImage {
    RgbaImage::new(size, size)
}

/// Copy the encoded bitmap onto the surface at the origin.
///
/// Pixels are replaced, not blended, matching a plain bitmap copy onto a
/// cleared surface.
pub fn draw_base(surface: &mut RgbaImage, bitmap: &RgbaImage) {
    image::imageops::replace(surface, bitmap, 0, 0);
}

/// Alpha-composite a prepared logo into the centered logo rect. Pixels
/// outside the rect are never touched.
pub fn draw_logo(surface: &mut RgbaImage, logo: &LogoImage) {
    let rect = logo_rect(surface.width());
    overlay(surface, logo.image(), rect);
}

/// One-shot composition: clear, copy `bitmap`, then draw `logo` if any.
pub fn compose(bitmap: &RgbaImage, logo: Option<&LogoImage>, size: u32) -> RgbaImage {
    let mut surface = clear_surface(size);
    draw_base(&mut surface, bitmap);
    if let Some(logo) = logo {
        draw_logo(&mut surface, logo);
    }
    surface
}

/// Overlay `top` onto `base` inside `rect` ("source over").
fn overlay(base: &mut RgbaImage, top: &RgbaImage, rect: LogoRect) {
    let (end_x, end_y) = rect.end();
    let end_x = end_x.min(base.width());
    let end_y = end_y.min(base.height());
    for (dx, dy, pixel) in top.enumerate_pixels() {
        let target_x = rect.x + dx;
        let target_y = rect.y + dy;
        if target_x < end_x && target_y < end_y {
            match pixel[3] {
                255 => base.put_pixel(target_x, target_y, *pixel),
                0 => {}
                _ => {
                    let bg = *base.get_pixel(target_x, target_y);
                    base.put_pixel(target_x, target_y, blend_pixel(bg, *pixel));
                }
            }
        }
    }
}

fn blend_pixel(bg: Rgba<u8>, fg: Rgba<u8>) -> Rgba<u8> {
    let fa = f32::from(fg[3]) / 255.0;
    let ba = f32::from(bg[3]) / 255.0;
    let out_a = fa + ba * (1.0 - fa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (f32::from(fg[i]) * fa + f32::from(bg[i]) * ba * (1.0 - fa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}
