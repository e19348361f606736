use crate::capture::CaptureSource;
use crate::config::TrackerConfig;
use crate::output::{OutputSink, Poll};
use crate::session::Session;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::time::{Duration, Instant};

/// How often averaged timings are logged
const STATS_INTERVAL: u64 = 30;

/// Shrink `frame` by `scale`; a scale of 1 leaves it untouched
pub fn downscale(frame: RgbImage, scale: f32) -> RgbImage {
    if scale >= 1.0 {
        return frame;
    }
    let _span = tracing::debug_span!("downscale").entered();

    let (width, height) = frame.dimensions();
    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    imageops::resize(&frame, new_width, new_height, FilterType::Triangle)
}

/// Drive capture → tracking → display until the stream ends or the user quits
///
/// Returns the number of frames processed.
pub fn run_pipeline<C, O>(
    capture: &mut C,
    output: &mut O,
    session: &mut Session,
    config: &TrackerConfig,
) -> Result<u64>
where
    C: CaptureSource + ?Sized,
    O: OutputSink,
{
    let mut frame_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_track_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting main pipeline loop");
    tracing::info!("Drag a rectangle over the object to track it");

    loop {
        // Capture frame
        let capture_start = Instant::now();
        let Some(frame) = capture.capture_frame().context("Failed to capture frame")? else {
            tracing::info!("End of stream after {} frames", frame_count);
            break;
        };
        total_capture_time += capture_start.elapsed();

        // Tracking
        let track_start = Instant::now();
        let mut frame = downscale(frame, config.scale);
        if let Some(result) = session.process(&mut frame) {
            tracing::debug!(
                "Frame {}: center=({:.1}, {:.1}) size=({:.1}, {:.1}) angle={:.1} iterations={} window={:?}",
                frame_count,
                result.rotated.center.0,
                result.rotated.center.1,
                result.rotated.size.0,
                result.rotated.size.1,
                result.rotated.angle,
                result.iterations,
                session.window()
            );
        }
        total_track_time += track_start.elapsed();

        // Output frame
        let output_start = Instant::now();
        output.write_frame(&frame).context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        if frame_count % STATS_INTERVAL == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_track_ms = total_track_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_track_ms + avg_output_ms;

            tracing::info!(
                "Frame {}: capture={:.1}ms, track={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, state={:?}",
                frame_count,
                avg_capture_ms,
                avg_track_ms,
                avg_output_ms,
                total_ms,
                1000.0 / total_ms,
                session.state()
            );
        }

        // Input poll, doubles as frame pacing
        let poll = output
            .wait_events(config.wait, session)
            .context("Failed to poll for input")?;
        if poll == Poll::Terminate {
            tracing::info!("Stopping after {} frames", frame_count);
            break;
        }
    }

    Ok(frame_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FileCapture;
    use crate::output::PointerHandler;
    use crate::tracking::{PointerEvent, PointerKind, TrackingState};
    use image::Rgb;

    struct ScriptedCapture {
        remaining: usize,
        pulls: usize,
    }

    impl CaptureSource for ScriptedCapture {
        fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
            self.pulls += 1;
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbImage::from_fn(80, 60, |x, y| {
                if (20..40).contains(&x) && (20..40).contains(&y) {
                    Rgb([220, 30, 30])
                } else {
                    Rgb([30, 30, 220])
                }
            })))
        }

        fn resolution(&self) -> (u32, u32) {
            (80, 60)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        presented: Vec<(u32, u32)>,
        terminate_after: Option<usize>,
        script: Vec<PointerEvent>,
    }

    impl OutputSink for RecordingSink {
        fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
            self.presented.push(frame.dimensions());
            Ok(())
        }

        fn wait_events(
            &mut self,
            _timeout: Duration,
            handler: &mut dyn PointerHandler,
        ) -> Result<Poll> {
            for event in self.script.drain(..) {
                handler.on_pointer(event);
            }
            match self.terminate_after {
                Some(n) if self.presented.len() >= n => Ok(Poll::Terminate),
                _ => Ok(Poll::Continue),
            }
        }
    }

    fn config() -> TrackerConfig {
        TrackerConfig {
            scale: 1.0,
            wait: Duration::ZERO,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn runs_one_tick_per_frame_until_exhausted() {
        let mut capture = ScriptedCapture { remaining: 5, pulls: 0 };
        let mut sink = RecordingSink::default();
        let mut session = Session::new(config());

        let frames = run_pipeline(&mut capture, &mut sink, &mut session, &config()).unwrap();
        assert_eq!(frames, 5);
        assert_eq!(sink.presented.len(), 5);
        assert_eq!(capture.pulls, 6);
    }

    #[test]
    fn terminate_signal_stops_loop() {
        let mut capture = ScriptedCapture { remaining: 100, pulls: 0 };
        let mut sink = RecordingSink {
            terminate_after: Some(3),
            ..RecordingSink::default()
        };
        let mut session = Session::new(config());

        let frames = run_pipeline(&mut capture, &mut sink, &mut session, &config()).unwrap();
        assert_eq!(frames, 3);
        assert_eq!(capture.pulls, 3);
    }

    #[test]
    fn pointer_events_reach_the_session() {
        let mut capture = ScriptedCapture { remaining: 3, pulls: 0 };
        let mut sink = RecordingSink {
            script: vec![
                PointerEvent::new(PointerKind::Down, 20, 20),
                PointerEvent::new(PointerKind::Move, 40, 40),
                PointerEvent::new(PointerKind::Up, 40, 40),
            ],
            ..RecordingSink::default()
        };
        let mut session = Session::new(config());

        run_pipeline(&mut capture, &mut sink, &mut session, &config()).unwrap();
        assert_eq!(session.state(), TrackingState::Tracking);
        assert!(session.window().unwrap().contains(30, 30));
    }

    #[test]
    fn corrupt_recorded_frame_ends_run_cleanly() {
        let dir = std::env::temp_dir().join(format!("hue-tracker-pipeline-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(16, 12, Rgb([200, 40, 40]))
            .save(dir.join("frame_000.png"))
            .unwrap();
        std::fs::write(dir.join("frame_001.png"), "truncated").unwrap();

        let mut capture = FileCapture::open(&dir).unwrap();
        let mut sink = RecordingSink::default();
        let mut session = Session::new(config());

        let frames = run_pipeline(&mut capture, &mut sink, &mut session, &config());
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(frames.unwrap(), 1);
        assert_eq!(sink.presented, vec![(16, 12)]);
    }

    #[test]
    fn downscale_applies_factor() {
        let frame = RgbImage::new(640, 480);
        assert_eq!(downscale(frame.clone(), 0.75).dimensions(), (480, 360));
        assert_eq!(downscale(frame, 1.0).dimensions(), (640, 480));
    }
}
