//! Error Types
//!
//! This module defines the error type used throughout the crate.
//!
//! # Overview
//!
//! Every rejected mutation returns a [`FrameError`] describing the misuse:
//! - Cyclic reference-frame assignment
//! - Zero scaling components
//! - Invalid link topology
//! - Non-monotonic keyframe insertion
//!
//! Rejections are also reported through `log::warn!`, and the rejected
//! mutation never touches the stored state. There is no I/O in this crate, so
//! there is nothing to retry.
//!
//! ```rust,ignore
//! use myth_frames::errors::{FrameError, Result};
//!
//! fn attach(graph: &mut FrameGraph, child: FrameKey, parent: FrameKey) -> Result<()> {
//!     graph.frame_mut(child).ok_or(FrameError::UnknownFrame(child))?
//!         .set_reference_frame(Some(parent))
//! }
//! ```

use glam::Vec3;
use thiserror::Error;

use crate::scene::FrameKey;

/// The error type for frame graph and interpolator operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    // ========================================================================
    // Frame Graph Errors
    // ========================================================================
    /// The handle does not refer to a live frame.
    #[error("Frame not found: {0:?}")]
    UnknownFrame(FrameKey),

    /// The requested parent already has the frame among its ancestors.
    #[error("Setting {parent:?} as reference of {frame:?} would create a cycle")]
    CyclicReference {
        /// Frame being re-parented (or linked)
        frame: FrameKey,
        /// Rejected parent
        parent: FrameKey,
    },

    /// A scaling component would become exactly zero.
    #[error("Scaling components cannot be zero: {0}")]
    ZeroScale(Vec3),

    // ========================================================================
    // Linking Errors
    // ========================================================================
    /// A frame cannot share its own kernel.
    #[error("Frame {0:?} cannot be linked to itself")]
    SelfLink(FrameKey),

    /// The frame has link dependents and cannot become a dependent itself.
    #[error("Frame {0:?} has link dependents and cannot be linked to another frame")]
    HasDependents(FrameKey),

    /// The requested source is itself a dependent of another frame.
    #[error("Frame {0:?} is a link dependent and cannot be used as a link source")]
    SourceIsDependent(FrameKey),

    /// The frame is not a dependent (of the given source).
    #[error("Frame {0:?} is not linked")]
    NotLinked(FrameKey),

    // ========================================================================
    // Interpolator Errors
    // ========================================================================
    /// Keyframe times must be strictly increasing.
    #[error("Key frame time {time} must be greater than the last key frame time {last}")]
    NonMonotonicKeyFrame {
        /// Rejected time
        time: f32,
        /// Time of the current last keyframe
        last: f32,
    },

    /// Keyframe index out of bounds.
    #[error("Key frame index out of bounds: {index} (len: {len})")]
    KeyFrameIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of keyframes
        len: usize,
    },
}

/// Alias for `Result<T, FrameError>`.
pub type Result<T> = std::result::Result<T, FrameError>;
