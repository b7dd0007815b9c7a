//! Keyframe animation of frames.
//!
//! - [`KeyFrame`]: timed pose, either tracking a live frame or a snapshot
//! - [`SplineSegment`]: Hermite / SQUAD curve between two keyframes
//! - [`KeyFrameInterpolator`]: evaluation, path sampling and playback

pub mod interpolator;
pub mod keyframe;
pub mod spline;

pub use interpolator::{DEFAULT_PATH_STEPS, DEFAULT_PERIOD, KeyFrameInterpolator};
pub use keyframe::{KeyFrame, KeyFrameSource};
pub use spline::{HermiteSegment, SplineSegment};
