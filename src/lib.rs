//! # Myth Frames
//!
//! Hierarchical coordinate frames and keyframe path interpolation.
//!
//! - [`scene`]: frames with translation, rotation and non-uniform scaling,
//!   organised in a parent hierarchy, with kernel sharing ("linking") and
//!   motion constraints
//! - [`animation`]: Catmull-Rom / SQUAD interpolation through keyframes, with
//!   scheduler-driven playback
//! - [`math`]: rotations that work the same in 2D and 3D
//!
//! ```rust,ignore
//! use myth_frames::{FrameGraph, KeyFrameInterpolator, Rotation};
//! use glam::Vec3;
//!
//! let mut graph = FrameGraph::new();
//! let body = graph.create();
//! let arm = graph.create_child(body)?;
//! graph.frame_mut(arm).unwrap().translate(Vec3::X);
//! let hand = graph.frame(arm).unwrap().inverse_coordinates_of(Vec3::ZERO, Default::default());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod errors;
pub mod math;
pub mod scene;
pub mod utils;

pub use animation::{KeyFrame, KeyFrameInterpolator, KeyFrameSource};
pub use errors::{FrameError, Result};
pub use math::{Dimension, Rotation};
pub use scene::{
    AxisPlane, AxisPlaneConstraint, Constraint, ConstraintSpace, FrameGraph, FrameKey, FrameMut,
    FrameRef, LinkState, Pose, TransformMode,
};
pub use utils::{IntervalScheduler, Scheduler};
