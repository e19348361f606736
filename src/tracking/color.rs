use image::{GrayImage, Luma, Rgb, RgbImage};

/// Exclusive upper bound of the hue channel (degrees halved to fit a byte)
pub const HUE_RANGE: u8 = 180;

/// Mask value for a pixel whose color information is usable
pub const MASK_VALID: u8 = 255;

/// Frame in the working color space
///
/// Channel 0 is hue in [0, 180), channel 1 saturation, channel 2 value.
pub type HsvImage = RgbImage;

/// Saturation/value thresholds deciding which pixels carry reliable hue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityBounds {
    pub min_saturation: u8,
    pub min_value: u8,
    pub max_value: u8,
}

impl Default for ValidityBounds {
    fn default() -> Self {
        Self {
            min_saturation: 40,
            min_value: 20,
            max_value: 245,
        }
    }
}

impl ValidityBounds {
    /// Inclusive on every bound; hue is unrestricted
    pub fn accepts(&self, hsv: &Rgb<u8>) -> bool {
        let [_, s, v] = hsv.0;
        s >= self.min_saturation && v >= self.min_value && v <= self.max_value
    }
}

/// Convert one RGB sample to 8-bit HSV
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = (max - min) as f32;

    let v = max;
    if max == 0 || diff == 0.0 {
        return [0, 0, v];
    }

    let s = (255.0 * diff / max as f32).round() as u8;

    let (r, g, b) = (r as f32, g as f32, b as f32);
    let mut degrees = if max as f32 == r {
        60.0 * (g - b) / diff
    } else if max as f32 == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let mut h = (degrees / 2.0).round() as u32;
    if h >= HUE_RANGE as u32 {
        h -= HUE_RANGE as u32;
    }

    [h as u8, s, v]
}

/// Convert a whole frame to the working color space, keeping its dimensions
pub fn to_hsv(frame: &RgbImage) -> HsvImage {
    let _span = tracing::debug_span!("to_hsv").entered();

    let (width, height) = frame.dimensions();
    let mut hsv = HsvImage::new(width, height);
    for (src, dst) in frame.pixels().zip(hsv.pixels_mut()) {
        *dst = Rgb(rgb_to_hsv(src[0], src[1], src[2]));
    }
    hsv
}

/// Per-pixel validity mask: 255 where `bounds` accepts the pixel, 0 elsewhere
pub fn validity_mask(hsv: &HsvImage, bounds: &ValidityBounds) -> GrayImage {
    let (width, height) = hsv.dimensions();
    let mut mask = GrayImage::new(width, height);
    for (src, dst) in hsv.pixels().zip(mask.pixels_mut()) {
        if bounds.accepts(src) {
            *dst = Luma([MASK_VALID]);
        }
    }
    mask
}
