use crate::config::TrackerConfig;
use crate::output::PointerHandler;
use crate::render::{draw_ellipse, invert_region, TRACK_COLOR, TRACK_THICKNESS};
use crate::tracking::{
    to_hsv, validity_mask, HueHistogram, PointerEvent, Rect, RegionSelector, TrackResult,
    TrackingState, WindowTracker,
};
use image::RgbImage;

/// Appearance model and search window of the object being followed
struct Target {
    histogram: HueHistogram,
    tracker: WindowTracker,
    lost: bool,
}

/// All state of one tracking run, owned by the frame loop and touched only
/// from its thread
pub struct Session {
    config: TrackerConfig,
    selector: RegionSelector,
    /// Finalised selection waiting for its histogram
    armed: Option<Rect>,
    target: Option<Target>,
}

impl Session {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            selector: RegionSelector::new(0, 0),
            armed: None,
            target: None,
        }
    }

    pub fn state(&self) -> TrackingState {
        if self.selector.is_selecting() {
            TrackingState::Selecting
        } else if self.armed.is_some() {
            TrackingState::Armed
        } else if self.target.is_some() {
            TrackingState::Tracking
        } else {
            TrackingState::Idle
        }
    }

    /// Current search window, once tracking
    pub fn window(&self) -> Option<Rect> {
        self.target.as_ref().map(|t| t.tracker.window())
    }

    /// Run one tick of the pipeline on `frame` and draw the overlays into it
    pub fn process(&mut self, frame: &mut RgbImage) -> Option<TrackResult> {
        let (width, height) = frame.dimensions();
        self.selector.set_bounds(width, height);

        let hsv = to_hsv(frame);
        let mask = validity_mask(&hsv, &self.config.validity);

        if let Some(region) = self.armed.take() {
            let histogram =
                HueHistogram::build(&hsv, &mask, region, self.config.bins, self.config.ceiling);
            if histogram.is_degenerate() {
                tracing::warn!("Selection {:?} has no usable color, tracking will search", region);
            }
            tracing::info!("Tracking target selected at {:?}", region);
            tracing::debug!("Hue histogram: {:?}", histogram.bins());
            self.target = Some(Target {
                histogram,
                tracker: WindowTracker::new(region, self.config.criteria),
                lost: false,
            });
        }

        let result = self.target.as_mut().map(|target| {
            let likelihood = target.histogram.back_project(&hsv, &mask);
            let result = target.tracker.track(&likelihood);

            if result.lost != target.lost {
                if result.lost {
                    tracing::info!("Target lost, widening search");
                } else {
                    tracing::info!("Target reacquired near {:?}", result.rotated.center);
                }
                target.lost = result.lost;
            }

            draw_ellipse(frame, &result.rotated, TRACK_COLOR, TRACK_THICKNESS);
            result
        });

        let selection = self.selector.selection();
        if self.selector.is_selecting() && !selection.is_empty() {
            invert_region(frame, selection);
        }

        result
    }
}

impl PointerHandler for Session {
    fn on_pointer(&mut self, event: PointerEvent) {
        if let Some(selection) = self.selector.handle(event) {
            tracing::debug!("Selection finalised: {:?}", selection);
            self.armed = Some(selection);
        }
    }
}
