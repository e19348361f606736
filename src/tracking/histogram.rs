use super::color::{HsvImage, HUE_RANGE};
use super::types::Rect;
use image::{GrayImage, Luma};

/// Peak bin value after normalisation
pub const DEFAULT_CEILING: f32 = 255.0;

/// Appearance model: normalised distribution of hue over the selected region
#[derive(Debug, Clone, PartialEq)]
pub struct HueHistogram {
    bins: Vec<f32>,
}

impl HueHistogram {
    /// Count hues of the pixels inside `region` whose mask bit is set, then
    /// scale so the fullest bin equals `ceiling`
    ///
    /// `region` is clipped to the frame. A region with no valid pixels gives
    /// an all-zero histogram.
    pub fn build(
        hsv: &HsvImage,
        mask: &GrayImage,
        region: Rect,
        bin_count: usize,
        ceiling: f32,
    ) -> Self {
        let _span = tracing::debug_span!("build_histogram").entered();

        let mut hist = Self {
            bins: vec![0.0; bin_count.max(1)],
        };

        let (width, height) = hsv.dimensions();
        let region = region.intersect(&Rect::frame(width, height));

        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                let (x, y) = (x as u32, y as u32);
                if mask.get_pixel(x, y)[0] == 0 {
                    continue;
                }
                if let Some(bin) = hist.bin_for(hsv.get_pixel(x, y)[0]) {
                    hist.bins[bin] += 1.0;
                }
            }
        }

        let samples: f32 = hist.bins.iter().sum();
        hist.normalize(ceiling);

        tracing::debug!(
            "Histogram built from {} valid pixels in {:?}: {:?}",
            samples,
            region,
            hist.bins
        );

        hist
    }

    /// Scale all bins so the largest equals `ceiling`
    pub fn normalize(&mut self, ceiling: f32) {
        let peak = self.bins.iter().copied().fold(0.0f32, f32::max);
        if peak <= 0.0 {
            self.bins.iter_mut().for_each(|b| *b = 0.0);
            return;
        }
        let scale = ceiling / peak;
        self.bins.iter_mut().for_each(|b| *b *= scale);
    }

    /// Bin index of a hue; hues outside [0, 180) have none
    pub fn bin_for(&self, hue: u8) -> Option<usize> {
        if hue >= HUE_RANGE {
            return None;
        }
        Some(hue as usize * self.bins.len() / HUE_RANGE as usize)
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    /// True when no bin holds any mass
    pub fn is_degenerate(&self) -> bool {
        self.bins.iter().all(|&b| b <= 0.0)
    }

    /// Likelihood map: each pixel's hue looked up in the histogram, then
    /// zeroed wherever `mask` is unset
    pub fn back_project(&self, hsv: &HsvImage, mask: &GrayImage) -> GrayImage {
        let _span = tracing::debug_span!("back_project").entered();

        let (width, height) = hsv.dimensions();
        let lut: Vec<u8> = (0..=u8::MAX)
            .map(|hue| match self.bin_for(hue) {
                Some(bin) => self.bins[bin].round().clamp(0.0, 255.0) as u8,
                None => 0,
            })
            .collect();

        let mut likelihood = GrayImage::new(width, height);
        for ((src, m), dst) in hsv.pixels().zip(mask.pixels()).zip(likelihood.pixels_mut()) {
            *dst = Luma([lut[src[0] as usize] & m[0]]);
        }
        likelihood
    }
}
