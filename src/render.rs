use crate::tracking::{Rect, RotatedRect};
use image::{Rgb, RgbImage};
use std::f32::consts::TAU;

pub const TRACK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const TRACK_THICKNESS: u32 = 3;

/// Negate every channel inside `region` (clipped to the frame)
pub fn invert_region(frame: &mut RgbImage, region: Rect) {
    let region = region.intersect(&Rect::frame(frame.width(), frame.height()));
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            let px = frame.get_pixel_mut(x as u32, y as u32);
            px.0 = px.0.map(|c| !c);
        }
    }
}

fn stamp(frame: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius + radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && x < w && y < h {
                frame.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Outline the ellipse inscribed in `rotated`
pub fn draw_ellipse(frame: &mut RgbImage, rotated: &RotatedRect, color: Rgb<u8>, thickness: u32) {
    if rotated.is_empty() {
        return;
    }

    let a = rotated.size.0 * 0.5;
    let b = rotated.size.1 * 0.5;
    let (sin, cos) = rotated.angle.to_radians().sin_cos();
    let (cx, cy) = rotated.center;
    let radius = (thickness / 2) as i32;

    // Roughly two samples per pixel of circumference
    let perimeter = TAU * ((a * a + b * b) * 0.5).sqrt();
    let steps = ((perimeter * 2.0).ceil() as usize).max(16);

    for i in 0..steps {
        let t = TAU * i as f32 / steps as f32;
        let (ex, ey) = (a * t.cos(), b * t.sin());
        let x = cx + ex * cos - ey * sin;
        let y = cy + ex * sin + ey * cos;
        stamp(frame, x.round() as i32, y.round() as i32, radius, color);
    }
}
