use super::types::{Rect, RotatedRect};
use image::GrayImage;
use std::f64::consts::FRAC_PI_2;

/// Extra margin around the converged window when measuring its shape
const SHAPE_PADDING: i32 = 10;

/// When to stop the mean-shift iterations: whichever triggers first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermCriteria {
    pub max_iterations: u32,
    /// Centroid shift (pixels) under which the window counts as converged
    pub epsilon: f64,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            epsilon: 1.0,
        }
    }
}

/// Raw and central image moments of a window, in window-local coordinates
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    m00: f64,
    m10: f64,
    m01: f64,
    mu20: f64,
    mu11: f64,
    mu02: f64,
}

impl Moments {
    fn of(likelihood: &GrayImage, window: Rect) -> Self {
        let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
        let (mut m20, mut m11, mut m02) = (0.0, 0.0, 0.0);

        for ly in 0..window.height.max(0) {
            let y = (window.y + ly) as u32;
            for lx in 0..window.width.max(0) {
                let w = likelihood.get_pixel((window.x + lx) as u32, y)[0] as f64;
                if w == 0.0 {
                    continue;
                }
                let (fx, fy) = (lx as f64, ly as f64);
                m00 += w;
                m10 += w * fx;
                m01 += w * fy;
                m20 += w * fx * fx;
                m11 += w * fx * fy;
                m02 += w * fy * fy;
            }
        }

        if m00 == 0.0 {
            return Self::default();
        }

        let cx = m10 / m00;
        let cy = m01 / m00;
        Self {
            m00,
            m10,
            m01,
            mu20: m20 - m10 * cx,
            mu11: m11 - m10 * cy,
            mu02: m02 - m01 * cy,
        }
    }

    fn is_empty(&self) -> bool {
        self.m00.abs() < f64::EPSILON
    }
}

/// Outcome of one CamShift search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Converged {
    /// Seed for the next frame
    pub window: Rect,
    /// Oriented estimate of the object
    pub rotated: RotatedRect,
    /// Mean-shift iterations spent
    pub iterations: u32,
}

/// Move a fixed-size `window` onto the local mode of `likelihood`
///
/// Returns the final window and the number of iterations run, which never
/// exceeds `criteria.max_iterations`.
pub fn mean_shift(likelihood: &GrayImage, window: Rect, criteria: &TermCriteria) -> (Rect, u32) {
    let (cols, rows) = (likelihood.width() as i32, likelihood.height() as i32);
    let frame = Rect::frame(likelihood.width(), likelihood.height());
    let eps = (criteria.epsilon.max(0.0).powi(2)).round() as i64;

    let mut current = window;
    let mut iterations = 0;

    while iterations < criteria.max_iterations {
        iterations += 1;

        current = current.intersect(&frame);
        if current == Rect::default() {
            current.x = cols / 2;
            current.y = rows / 2;
        }
        current.width = current.width.max(1);
        current.height = current.height.max(1);

        let m = Moments::of(likelihood, current);
        if m.is_empty() {
            break;
        }

        let dx = (m.m10 / m.m00 - current.width as f64 * 0.5).round() as i32;
        let dy = (m.m01 / m.m00 - current.height as f64 * 0.5).round() as i32;

        let nx = (current.x + dx).min(cols - current.width).max(0);
        let ny = (current.y + dy).min(rows - current.height).max(0);
        let (dx, dy) = ((nx - current.x) as i64, (ny - current.y) as i64);
        current.x = nx;
        current.y = ny;

        if dx * dx + dy * dy < eps {
            break;
        }
    }

    (current, iterations)
}

/// Mean-shift followed by an orientation and size update from the second
/// moments of the converged region
///
/// A window that holds no likelihood mass collapses to a 0x0 rectangle at
/// its centre.
pub fn cam_shift(likelihood: &GrayImage, window: Rect, criteria: &TermCriteria) -> Converged {
    let _span = tracing::debug_span!("cam_shift").entered();

    let (cols, rows) = (likelihood.width() as i32, likelihood.height() as i32);
    let frame = Rect::frame(likelihood.width(), likelihood.height());

    let (shifted, iterations) = mean_shift(likelihood, window, criteria);

    let padded = Rect::new(
        shifted.x - SHAPE_PADDING,
        shifted.y - SHAPE_PADDING,
        shifted.width + 2 * SHAPE_PADDING,
        shifted.height + 2 * SHAPE_PADDING,
    )
    .intersect(&frame);

    let m = Moments::of(likelihood, padded);
    if m.is_empty() {
        let (cx, cy) = shifted.center();
        let collapsed = Rect::new(cx.round() as i32, cy.round() as i32, 0, 0);
        return Converged {
            window: collapsed,
            rotated: RotatedRect {
                center: (collapsed.x as f32, collapsed.y as f32),
                ..RotatedRect::default()
            },
            iterations,
        };
    }

    let inv_m00 = 1.0 / m.m00;
    let xc = (m.m10 * inv_m00 + padded.x as f64).round() as i32;
    let yc = (m.m01 * inv_m00 + padded.y as f64).round() as i32;

    let a = m.mu20 * inv_m00;
    let b = m.mu11 * inv_m00;
    let c = m.mu02 * inv_m00;

    let square = (4.0 * b * b + (a - c) * (a - c)).sqrt();
    let mut theta = (2.0 * b).atan2(a - c + square);

    let (mut cs, mut sn) = (theta.cos(), theta.sin());
    let rotate_a = (cs * cs * m.mu20 + 2.0 * cs * sn * m.mu11 + sn * sn * m.mu02).max(0.0);
    let rotate_c = (sn * sn * m.mu20 - 2.0 * cs * sn * m.mu11 + cs * cs * m.mu02).max(0.0);

    let mut length = (rotate_a * inv_m00).sqrt() * 4.0;
    let mut width = (rotate_c * inv_m00).sqrt() * 4.0;
    if length < width {
        std::mem::swap(&mut length, &mut width);
        std::mem::swap(&mut cs, &mut sn);
        theta = FRAC_PI_2 - theta;
    }

    // Axis-aligned extent of the rotated box, plus a pixel each side
    let t0 = (length * cs).abs().round() as i32;
    let t1 = (width * sn).abs().round() as i32;
    let mut win_w = (t0.max(t1) + 2).min((cols - xc) * 2);

    let t0 = (length * sn).abs().round() as i32;
    let t1 = (width * cs).abs().round() as i32;
    let mut win_h = (t0.max(t1) + 2).min((rows - yc) * 2);

    let x = (xc - win_w / 2).max(0);
    let y = (yc - win_h / 2).max(0);
    win_w = win_w.min(cols - x).max(0);
    win_h = win_h.min(rows - y).max(0);
    let next = Rect::new(x, y, win_w, win_h);

    let mut angle = (FRAC_PI_2 + theta).to_degrees();
    while angle < 0.0 {
        angle += 360.0;
    }
    while angle >= 360.0 {
        angle -= 360.0;
    }
    if angle >= 180.0 {
        angle -= 180.0;
    }

    Converged {
        window: next,
        rotated: RotatedRect {
            center: next.center(),
            size: (width as f32, length as f32),
            angle: angle as f32,
        },
        iterations,
    }
}

/// Wide search window used after the track collapses: a square of
/// half-extent `min(rows, cols) + 1` around the collapsed window's centre,
/// clipped to the frame
pub fn reacquire_window(collapsed: Rect, cols: u32, rows: u32) -> Rect {
    let cx = collapsed.x + collapsed.width / 2;
    let cy = collapsed.y + collapsed.height / 2;
    let offset = rows.min(cols) as i32 + 1;
    Rect::new(cx - offset, cy - offset, 2 * offset, 2 * offset).intersect(&Rect::frame(cols, rows))
}

/// Per-frame result reported by [`WindowTracker::track`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackResult {
    pub rotated: RotatedRect,
    pub iterations: u32,
    /// The search collapsed and the seed was re-inflated
    pub lost: bool,
}

/// Carries the search window from frame to frame
#[derive(Debug, Clone)]
pub struct WindowTracker {
    window: Rect,
    criteria: TermCriteria,
}

impl WindowTracker {
    pub fn new(seed: Rect, criteria: TermCriteria) -> Self {
        Self {
            window: seed,
            criteria,
        }
    }

    /// Seed for the next search
    pub fn window(&self) -> Rect {
        self.window
    }

    /// Search `likelihood` from the current seed; a result with area of one
    /// pixel or less counts as lost and the seed is re-inflated around it
    pub fn track(&mut self, likelihood: &GrayImage) -> TrackResult {
        let converged = cam_shift(likelihood, self.window, &self.criteria);

        let lost = converged.window.area() <= 1;
        self.window = if lost {
            let widened =
                reacquire_window(converged.window, likelihood.width(), likelihood.height());
            tracing::debug!(
                "Track collapsed at {:?}, widening search to {:?}",
                converged.window,
                widened
            );
            widened
        } else {
            converged.window
        };

        TrackResult {
            rotated: converged.rotated,
            iterations: converged.iterations,
            lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blob(cols: u32, rows: u32, object: Rect) -> GrayImage {
        GrayImage::from_fn(cols, rows, |x, y| {
            if object.contains(x as i32, y as i32) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn converges_onto_blob() {
        let map = blob(100, 80, Rect::new(40, 30, 20, 20));
        let out = cam_shift(&map, Rect::new(32, 22, 20, 20), &TermCriteria::default());

        let (cx, cy) = out.rotated.center;
        assert!((cx - 50.0).abs() <= 1.5, "cx = {cx}");
        assert!((cy - 40.0).abs() <= 1.5, "cy = {cy}");
        assert!(out.window.contains(50, 40));
        assert!(out.window.area() > 1);
    }

    #[test]
    fn orientation_follows_elongation() {
        let horizontal = blob(120, 80, Rect::new(20, 35, 60, 6));
        let out = cam_shift(&horizontal, Rect::new(30, 25, 30, 30), &TermCriteria::default());
        assert!((out.rotated.angle - 90.0).abs() < 1.0, "angle = {}", out.rotated.angle);
        assert!(out.rotated.size.1 > out.rotated.size.0);
        assert!(out.window.width > out.window.height);

        let vertical = blob(80, 120, Rect::new(35, 20, 6, 60));
        let out = cam_shift(&vertical, Rect::new(25, 30, 30, 30), &TermCriteria::default());
        assert!(out.rotated.angle < 1.0 || out.rotated.angle > 179.0);
        assert!(out.rotated.size.1 > out.rotated.size.0);
        assert!(out.window.height > out.window.width);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let map = GrayImage::from_fn(64, 64, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let seed = Rect::new(10, 12, 20, 16);
        let a = cam_shift(&map, seed, &TermCriteria::default());
        let b = cam_shift(&map, seed, &TermCriteria::default());
        assert_eq!(a, b);
    }

    #[test]
    fn iterations_never_exceed_bound() {
        // Pseudo-random field that keeps the centroid moving
        let mut state = 0x2545_f491_u32;
        let map = GrayImage::from_fn(97, 61, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([(state & 0xff) as u8])
        });

        for max_iterations in [1, 3, 10] {
            let criteria = TermCriteria {
                max_iterations,
                epsilon: 0.0,
            };
            let seeds = [
                Rect::new(0, 0, 5, 5),
                Rect::new(80, 50, 40, 40),
                Rect::new(-20, -20, 3, 3),
            ];
            for seed in seeds {
                let (_, iterations) = mean_shift(&map, seed, &criteria);
                assert!(iterations <= max_iterations);
            }
        }
    }

    #[test]
    fn empty_map_collapses_and_reinflates() {
        let (cols, rows) = (120u32, 90u32);
        let map = GrayImage::new(cols, rows);
        let seed = Rect::new(50, 30, 20, 20);

        let out = cam_shift(&map, seed, &TermCriteria::default());
        assert!(out.window.area() <= 1);
        assert!(out.rotated.is_empty());

        let mut tracker = WindowTracker::new(seed, TermCriteria::default());
        let result = tracker.track(&map);
        assert!(result.lost);

        let (cx, cy) = (out.window.x, out.window.y);
        let offset = rows.min(cols) as i32 + 1;
        let expected = Rect::new(cx - offset, cy - offset, 2 * offset, 2 * offset)
            .intersect(&Rect::frame(cols, rows));
        assert_eq!(tracker.window(), expected);
        assert_eq!(tracker.window(), Rect::frame(cols, rows));
    }

    #[test]
    fn lost_track_is_reacquired_from_wide_window() {
        let (cols, rows) = (160u32, 120u32);
        let object = Rect::new(100, 70, 16, 16);
        let mut tracker = WindowTracker::new(Rect::new(10, 10, 16, 16), TermCriteria::default());

        // Object out of view: keep searching
        let first = tracker.track(&GrayImage::new(cols, rows));
        assert!(first.lost);

        let mut last = first;
        for _ in 0..5 {
            last = tracker.track(&blob(cols, rows, object));
        }
        assert!(!last.lost);
        assert!(tracker.window().contains(108, 78));
    }
}
