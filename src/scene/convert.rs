//! Coordinate conversions between frames.
//!
//! Points are affected by translation, rotation and (in
//! [`TransformMode::Improper`]) scaling. Vectors skip the translation.
//!
//! | method                       | from           | to             |
//! |------------------------------|----------------|----------------|
//! | `local_coordinates_of`       | parent         | this frame     |
//! | `local_inverse_coordinates_of` | this frame   | parent         |
//! | `coordinates_of`             | world          | this frame     |
//! | `inverse_coordinates_of`     | this frame     | world          |
//! | `coordinates_of_from`        | another frame  | this frame     |
//! | `coordinates_of_in`          | this frame     | another frame  |
//!
//! The `transform_of` family mirrors each of these for vectors.

use glam::Vec3;
use smallvec::SmallVec;

use crate::scene::frame::FrameRef;

/// Whether scaling takes part in a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    /// Translation and rotation only.
    Proper,
    /// Translation, rotation and scaling.
    #[default]
    Improper,
}

impl FrameRef<'_> {
    // ========================================================================
    // Points
    // ========================================================================

    /// Parent coordinates to local coordinates.
    #[must_use]
    pub fn local_coordinates_of(&self, point: Vec3, mode: TransformMode) -> Vec3 {
        let kernel = self.kernel();
        let local = kernel.rotation.inverse_rotate(point - kernel.translation);
        match mode {
            TransformMode::Proper => local,
            TransformMode::Improper => local / kernel.scaling,
        }
    }

    /// Local coordinates to parent coordinates.
    #[must_use]
    pub fn local_inverse_coordinates_of(&self, point: Vec3, mode: TransformMode) -> Vec3 {
        let kernel = self.kernel();
        let scaled = match mode {
            TransformMode::Proper => point,
            TransformMode::Improper => point * kernel.scaling,
        };
        kernel.rotation.rotate(scaled) + kernel.translation
    }

    /// World coordinates to local coordinates.
    #[must_use]
    pub fn coordinates_of(&self, point: Vec3, mode: TransformMode) -> Vec3 {
        let chain: SmallVec<[FrameRef<'_>; 8]> = self.ancestors().collect();
        chain
            .iter()
            .rev()
            .fold(point, |p, frame| frame.local_coordinates_of(p, mode))
    }

    /// Local coordinates to world coordinates.
    #[must_use]
    pub fn inverse_coordinates_of(&self, point: Vec3, mode: TransformMode) -> Vec3 {
        self.ancestors()
            .fold(point, |p, frame| frame.local_inverse_coordinates_of(p, mode))
    }

    /// Coordinates in `from` to coordinates in this frame.
    ///
    /// When `from` is an ancestor only the frames in between are walked;
    /// otherwise the point goes through world space.
    #[must_use]
    pub fn coordinates_of_from(&self, point: Vec3, from: &FrameRef<'_>, mode: TransformMode) -> Vec3 {
        let mut chain: SmallVec<[FrameRef<'_>; 8]> = SmallVec::new();
        let mut start = None;
        for frame in self.ancestors() {
            if frame.key() == from.key() {
                start = Some(point);
                break;
            }
            chain.push(frame);
        }
        let start = start.unwrap_or_else(|| from.inverse_coordinates_of(point, mode));
        chain
            .iter()
            .rev()
            .fold(start, |p, frame| frame.local_coordinates_of(p, mode))
    }

    /// Coordinates in this frame to coordinates in `target`.
    ///
    /// When `target` is an ancestor only the frames in between are walked;
    /// otherwise the point goes through world space.
    #[must_use]
    pub fn coordinates_of_in(&self, point: Vec3, target: &FrameRef<'_>, mode: TransformMode) -> Vec3 {
        let mut p = point;
        for frame in self.ancestors() {
            if frame.key() == target.key() {
                return p;
            }
            p = frame.local_inverse_coordinates_of(p, mode);
        }
        target.coordinates_of(p, mode)
    }

    // ========================================================================
    // Vectors
    // ========================================================================

    /// Parent-space vector to local space.
    #[must_use]
    pub fn local_transform_of(&self, vector: Vec3, mode: TransformMode) -> Vec3 {
        let kernel = self.kernel();
        let local = kernel.rotation.inverse_rotate(vector);
        match mode {
            TransformMode::Proper => local,
            TransformMode::Improper => local / kernel.scaling,
        }
    }

    /// Local vector to parent space.
    #[must_use]
    pub fn local_inverse_transform_of(&self, vector: Vec3, mode: TransformMode) -> Vec3 {
        let kernel = self.kernel();
        let scaled = match mode {
            TransformMode::Proper => vector,
            TransformMode::Improper => vector * kernel.scaling,
        };
        kernel.rotation.rotate(scaled)
    }

    /// World vector to local space.
    #[must_use]
    pub fn transform_of(&self, vector: Vec3, mode: TransformMode) -> Vec3 {
        let chain: SmallVec<[FrameRef<'_>; 8]> = self.ancestors().collect();
        chain
            .iter()
            .rev()
            .fold(vector, |v, frame| frame.local_transform_of(v, mode))
    }

    /// Local vector to world space.
    #[must_use]
    pub fn inverse_transform_of(&self, vector: Vec3, mode: TransformMode) -> Vec3 {
        self.ancestors()
            .fold(vector, |v, frame| frame.local_inverse_transform_of(v, mode))
    }

    /// Vector in `from` to this frame.
    #[must_use]
    pub fn transform_of_from(&self, vector: Vec3, from: &FrameRef<'_>, mode: TransformMode) -> Vec3 {
        let mut chain: SmallVec<[FrameRef<'_>; 8]> = SmallVec::new();
        let mut start = None;
        for frame in self.ancestors() {
            if frame.key() == from.key() {
                start = Some(vector);
                break;
            }
            chain.push(frame);
        }
        let start = start.unwrap_or_else(|| from.inverse_transform_of(vector, mode));
        chain
            .iter()
            .rev()
            .fold(start, |v, frame| frame.local_transform_of(v, mode))
    }

    /// Vector in this frame to `target`.
    #[must_use]
    pub fn transform_of_in(&self, vector: Vec3, target: &FrameRef<'_>, mode: TransformMode) -> Vec3 {
        let mut v = vector;
        for frame in self.ancestors() {
            if frame.key() == target.key() {
                return v;
            }
            v = frame.local_inverse_transform_of(v, mode);
        }
        target.transform_of(v, mode)
    }
}
