use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::math::{Dimension, Rotation};
use crate::scene::FrameKey;
use crate::scene::constraint::Constraint;

/// Transform kernel
///
/// Holds the local translation, rotation and scaling of a frame (TRS,
/// relative to its reference frame), the reference frame itself, an optional
/// [`Constraint`] and the mutation stamp.
///
/// A kernel is normally owned by a single frame. Linked frames share one
/// kernel, so an edit made through any of them is seen by all.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub(crate) translation: Vec3,
    pub(crate) rotation: Rotation,
    pub(crate) scaling: Vec3,

    pub(crate) reference: Option<FrameKey>,
    pub(crate) constraint: Option<Rc<dyn Constraint>>,

    /// Graph clock value of the last mutation
    pub(crate) last_update: u64,
}

impl Kernel {
    #[must_use]
    pub fn new(dimension: Dimension) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Rotation::identity(dimension),
            scaling: Vec3::ONE,

            reference: None,
            constraint: None,

            last_update: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    #[inline]
    #[must_use]
    pub fn reference(&self) -> Option<FrameKey> {
        self.reference
    }

    #[inline]
    #[must_use]
    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    /// Local matrix (column-major): scaling, then rotation, then translation.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scaling, self.rotation.to_quat(), self.translation)
    }
}

/// Returns true if any component is exactly zero.
#[inline]
pub(crate) fn has_zero_component(v: Vec3) -> bool {
    v.cmpeq(Vec3::ZERO).any()
}
