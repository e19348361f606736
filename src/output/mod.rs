mod window;

pub use window::WindowOutput;

use crate::tracking::PointerEvent;
use anyhow::Result;
use image::RgbImage;
use std::time::Duration;

/// Receiver for pointer input, called synchronously during [`OutputSink::wait_events`]
pub trait PointerHandler {
    fn on_pointer(&mut self, event: PointerEvent);
}

/// What the loop should do after polling for input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Continue,
    Terminate,
}

/// Trait for output destinations
pub trait OutputSink {
    /// Present a frame
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Wait up to `timeout` for input, delivering pointer events to `handler`
    fn wait_events(&mut self, timeout: Duration, handler: &mut dyn PointerHandler) -> Result<Poll>;
}
