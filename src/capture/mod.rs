mod file;
mod webcam;

pub use file::FileCapture;
pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;

/// Trait for frame sources (live camera or recorded input)
pub trait CaptureSource {
    /// Pull the next frame; `None` once the stream is exhausted
    fn capture_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("input {0} does not exist")]
    Missing(PathBuf),

    #[error("input {0} is not a supported image or animation")]
    Unsupported(PathBuf),

    #[error("no frames found in {0}")]
    Empty(PathBuf),
}
