//! Keyframes and their spline tangents.
//!
//! A keyframe either follows a live frame of the graph or holds a snapshot
//! pose. Position and magnitude tangents are Catmull-Rom estimates from the
//! neighbouring keys; orientation tangents are SQUAD control rotations.

use glam::Vec3;

use crate::math::Rotation;
use crate::math::rotation::wrap_angle;
use crate::scene::{FrameGraph, FrameKey, Pose};

/// Where a keyframe takes its pose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFrameSource {
    /// A live frame of the graph. The pose follows the frame's later edits.
    Frame(FrameKey),
    /// A pose copied into the interpolator when the keyframe was added.
    Snapshot,
}

/// A timed pose on an interpolation path, with its spline tangents.
#[derive(Debug, Clone)]
pub struct KeyFrame {
    time: f32,
    source: KeyFrameSource,
    /// Last pose read from the source.
    pose: Pose,

    pub(crate) tg_position: Vec3,
    pub(crate) tg_magnitude: Vec3,
    pub(crate) tg_orientation: Rotation,
}

impl KeyFrame {
    pub(crate) fn new(time: f32, source: KeyFrameSource, pose: Pose) -> Self {
        Self {
            time,
            source,
            pose,
            tg_position: Vec3::ZERO,
            tg_magnitude: Vec3::ZERO,
            tg_orientation: pose.orientation,
        }
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> KeyFrameSource {
        self.source
    }

    /// Referenced frame, if this keyframe tracks one.
    #[must_use]
    pub fn frame(&self) -> Option<FrameKey> {
        match self.source {
            KeyFrameSource::Frame(key) => Some(key),
            KeyFrameSource::Snapshot => None,
        }
    }

    /// Cached pose. For referenced frames this is the pose read during the
    /// last cache rebuild.
    #[inline]
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    #[inline]
    #[must_use]
    pub fn orientation(&self) -> Rotation {
        self.pose.orientation
    }

    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> Vec3 {
        self.pose.magnitude
    }

    /// Re-reads the pose of the referenced frame. A removed frame leaves the
    /// last pose in place.
    pub(crate) fn refresh(&mut self, graph: &FrameGraph) {
        if let KeyFrameSource::Frame(key) = self.source {
            match graph.frame(key) {
                Some(frame) => self.pose = frame.pose(),
                None => log::warn!("Key frame source {key:?} no longer exists, keeping its last pose"),
            }
        }
    }

    /// Puts the orientation on the same side as `previous`: the opposite
    /// quaternion hemisphere is flipped, planar angles are unwrapped to lie
    /// within half a turn of `previous`.
    pub(crate) fn flip_orientation_if_needed(&mut self, previous: &Rotation) {
        match (self.pose.orientation, *previous) {
            (Rotation::Planar(angle), Rotation::Planar(prev)) => {
                self.pose.orientation = Rotation::Planar(prev + wrap_angle(angle - prev));
            }
            (orientation, _) => {
                if previous.dot(&orientation) < 0.0 {
                    self.pose.orientation = orientation.negate();
                }
            }
        }
    }

    /// Catmull-Rom tangents from the neighboring poses.
    pub(crate) fn compute_tangents(&mut self, prev: &Pose, next: &Pose) {
        self.tg_position = 0.5 * (next.position - prev.position);
        self.tg_magnitude = 0.5 * (next.magnitude - prev.magnitude);
        self.tg_orientation =
            Rotation::squad_tangent(&prev.orientation, &self.pose.orientation, &next.orientation);
    }
}
