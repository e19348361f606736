mod capture;
mod config;
mod output;
mod pipeline;
mod render;
mod session;
mod tracking;

use anyhow::{Context, Result};
use capture::{CaptureSource, FileCapture, WebcamCapture};
use clap::Parser;
use config::TrackerConfig;
use output::WindowOutput;
use session::Session;
use std::path::PathBuf;
use std::time::Duration;
use tracking::{TermCriteria, ValidityBounds};

const WINDOW_TITLE: &str = "CAMShift Tracker";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track a selected colored object with CamShift",
    long_about = None
)]
struct Args {
    /// Video file (animated GIF, still image or directory of frames); uses the webcam if omitted
    video: Option<PathBuf>,

    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Minimum saturation for a pixel's hue to count
    #[arg(long, default_value_t = 40)]
    min_saturation: u8,

    /// Minimum brightness for a pixel's hue to count
    #[arg(long, default_value_t = 20)]
    min_value: u8,

    /// Maximum brightness for a pixel's hue to count
    #[arg(long, default_value_t = 245)]
    max_value: u8,

    /// Hue histogram bin count
    #[arg(long, default_value_t = 8)]
    bins: usize,

    /// Centroid shift (pixels) at which the window search stops
    #[arg(long, default_value_t = 1.0)]
    epsilon: f64,

    /// Maximum window search iterations per frame
    #[arg(long, default_value_t = 10)]
    max_iterations: u32,

    /// Frame downscale factor
    #[arg(long, default_value_t = 0.75)]
    scale: f32,

    /// Per-frame input wait in milliseconds
    #[arg(long, default_value_t = 30)]
    wait_ms: u64,

    /// ASCII code of the key that quits (27 = Esc)
    #[arg(long, default_value_t = 27)]
    exit_key: u8,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            validity: ValidityBounds {
                min_saturation: self.min_saturation,
                min_value: self.min_value,
                max_value: self.max_value,
            },
            bins: self.bins,
            criteria: TermCriteria {
                max_iterations: self.max_iterations,
                epsilon: self.epsilon,
            },
            scale: self.scale,
            wait: Duration::from_millis(self.wait_ms),
            exit_key: self.exit_key,
            ..TrackerConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = args.tracker_config();
    config.validate().context("Invalid tracker settings")?;

    tracing::info!("Hue tracker starting");
    tracing::info!(
        "Validity: saturation>={}, value in [{}, {}]",
        config.validity.min_saturation,
        config.validity.min_value,
        config.validity.max_value
    );
    tracing::info!(
        "Histogram bins: {}, search: {} iterations / eps {}",
        config.bins,
        config.criteria.max_iterations,
        config.criteria.epsilon
    );

    // Initialize capture
    let mut capture: Box<dyn CaptureSource> = match &args.video {
        Some(path) => Box::new(
            FileCapture::open(path)
                .with_context(|| format!("Failed to open video {}", path.display()))?,
        ),
        None => Box::new(
            WebcamCapture::new(args.input_device)
                .context("Failed to initialize webcam capture")?,
        ),
    };
    let (width, height) = capture.resolution();
    tracing::info!("Capture: {}x{} (scaled by {})", width, height, config.scale);

    let mut output = WindowOutput::new(WINDOW_TITLE, config.exit_key);
    let mut session = Session::new(config.clone());

    pipeline::run_pipeline(capture.as_mut(), &mut output, &mut session, &config)?;

    tracing::info!("Hue tracker finished");
    Ok(())
}
