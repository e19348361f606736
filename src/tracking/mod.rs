mod camshift;
mod color;
mod histogram;
mod selector;
mod types;

pub use camshift::{TermCriteria, TrackResult, WindowTracker};
pub use color::{to_hsv, validity_mask, ValidityBounds};
pub use histogram::{HueHistogram, DEFAULT_CEILING};
pub use selector::{PointerEvent, PointerKind, RegionSelector};
pub use types::{Rect, RotatedRect, TrackingState};
