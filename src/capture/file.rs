use super::{CaptureError, CaptureSource};
use anyhow::{Context, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frames, ImageDecoder, RgbImage};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const STILL_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

enum Source {
    /// Animated GIF, decoded frame by frame
    Animation(Frames<'static>),
    /// Still images, one frame each, in file name order
    Stills(VecDeque<PathBuf>),
}

/// Recorded input: an animated GIF, a single still, or a directory of stills
pub struct FileCapture {
    source: Source,
    width: u32,
    height: u32,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}

fn is_still(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| STILL_EXTENSIONS.contains(&ext.as_str()))
}

impl FileCapture {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening recorded input {}", path.display());

        if !path.exists() {
            return Err(CaptureError::Missing(path.to_path_buf()).into());
        }

        if path.is_dir() {
            return Self::open_directory(path);
        }

        match extension_of(path).as_deref() {
            Some("gif") => Self::open_animation(path),
            _ if is_still(path) => Self::open_stills(path, VecDeque::from([path.to_path_buf()])),
            _ => Err(CaptureError::Unsupported(path.to_path_buf()).into()),
        }
    }

    fn open_animation(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let decoder = GifDecoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to read GIF header of {}", path.display()))?;
        let (width, height) = decoder.dimensions();

        tracing::info!("Animated input {}x{}", width, height);

        Ok(Self {
            source: Source::Animation(decoder.into_frames()),
            width,
            height,
        })
    }

    fn open_directory(dir: &Path) -> Result<Self> {
        let mut stills: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_still(p))
            .collect();
        stills.sort();

        tracing::info!("Found {} frames in {}", stills.len(), dir.display());
        Self::open_stills(dir, stills.into())
    }

    fn open_stills(origin: &Path, stills: VecDeque<PathBuf>) -> Result<Self> {
        let first = stills
            .front()
            .ok_or_else(|| CaptureError::Empty(origin.to_path_buf()))?;
        let (width, height) = image::image_dimensions(first)
            .with_context(|| format!("Failed to read {}", first.display()))?;

        Ok(Self {
            source: Source::Stills(stills),
            width,
            height,
        })
    }
}

impl CaptureSource for FileCapture {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let frame = match &mut self.source {
            Source::Animation(frames) => match frames.next() {
                Some(Ok(frame)) => DynamicImage::ImageRgba8(frame.into_buffer()).into_rgb8(),
                Some(Err(e)) => {
                    tracing::warn!("Failed to decode animation frame, ending stream: {}", e);
                    return Ok(None);
                }
                None => return Ok(None),
            },
            Source::Stills(stills) => match stills.pop_front() {
                Some(path) => match image::open(&path) {
                    Ok(image) => image.into_rgb8(),
                    Err(e) => {
                        tracing::warn!("Failed to decode {}, ending stream: {}", path.display(), e);
                        return Ok(None);
                    }
                },
                None => return Ok(None),
            },
        };

        if frame.width() == 0 || frame.height() == 0 {
            return Ok(None);
        }

        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
