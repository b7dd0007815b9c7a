//! Motion constraints.
//!
//! A [`Constraint`] filters the deltas handed to the incremental mutators
//! (`translate`, `rotate`, `scale`) and, through them, to the world setters.
//! Raw setters bypass it.
//!
//! Deltas are expressed where the mutator applies them:
//! - translation deltas in the reference frame's coordinates
//! - rotation deltas in the frame's local coordinates
//! - scaling deltas as component-wise factors

use std::fmt;

use glam::Vec3;

use crate::math::{Dimension, Rotation};
use crate::scene::convert::TransformMode;
use crate::scene::frame::FrameRef;

const EPSILON: f32 = 1e-6;

/// Filter for incremental frame mutations.
///
/// Every method defaults to returning its input unchanged.
pub trait Constraint: fmt::Debug {
    fn constrain_translation(&self, delta: Vec3, _frame: &FrameRef<'_>) -> Vec3 {
        delta
    }

    fn constrain_rotation(&self, delta: Rotation, _frame: &FrameRef<'_>) -> Rotation {
        delta
    }

    fn constrain_scaling(&self, factors: Vec3, _frame: &FrameRef<'_>) -> Vec3 {
        factors
    }
}

/// Allowed degrees of freedom for one kind of motion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AxisPlane {
    #[default]
    Free,
    /// Only motion along (translation) or around (rotation) this direction.
    Axis(Vec3),
    /// Only motion within the plane with this normal. Rotations treat it as
    /// [`Free`](Self::Free).
    Plane(Vec3),
    Forbidden,
}

/// Space in which [`AxisPlane`] directions are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConstraintSpace {
    /// The constrained frame's own coordinates.
    #[default]
    Local,
    /// World coordinates.
    World,
}

/// Restricts translation and rotation to an axis or a plane, and can lock
/// scaling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisPlaneConstraint {
    pub translation: AxisPlane,
    pub rotation: AxisPlane,
    pub lock_scaling: bool,
    pub space: ConstraintSpace,
}

impl AxisPlaneConstraint {
    #[must_use]
    pub fn new(space: ConstraintSpace) -> Self {
        Self {
            space,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translation: AxisPlane) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: AxisPlane) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_locked_scaling(mut self, lock_scaling: bool) -> Self {
        self.lock_scaling = lock_scaling;
        self
    }

    /// Direction in the reference frame's coordinates, for translations.
    fn translation_direction(&self, direction: Vec3, frame: &FrameRef<'_>) -> Vec3 {
        match self.space {
            ConstraintSpace::Local => frame.rotation().rotate(direction),
            ConstraintSpace::World => frame
                .reference_frame()
                .map_or(direction, |parent| parent.transform_of(direction, TransformMode::Proper)),
        }
    }

    /// Direction in the frame's own coordinates, for rotations.
    fn rotation_direction(&self, direction: Vec3, frame: &FrameRef<'_>) -> Vec3 {
        match self.space {
            ConstraintSpace::Local => direction,
            ConstraintSpace::World => frame.transform_of(direction, TransformMode::Proper),
        }
    }
}

impl Constraint for AxisPlaneConstraint {
    fn constrain_translation(&self, delta: Vec3, frame: &FrameRef<'_>) -> Vec3 {
        match self.translation {
            AxisPlane::Free => delta,
            AxisPlane::Forbidden => Vec3::ZERO,
            AxisPlane::Axis(direction) => {
                let axis = self.translation_direction(direction, frame);
                if axis.length_squared() < EPSILON {
                    return delta;
                }
                delta.project_onto(axis)
            }
            AxisPlane::Plane(normal) => {
                let normal = self.translation_direction(normal, frame);
                if normal.length_squared() < EPSILON {
                    return delta;
                }
                delta - delta.project_onto(normal)
            }
        }
    }

    fn constrain_rotation(&self, delta: Rotation, frame: &FrameRef<'_>) -> Rotation {
        let dimension = frame.graph().dimension();
        match self.rotation {
            AxisPlane::Free | AxisPlane::Plane(_) => delta,
            AxisPlane::Forbidden => Rotation::identity(dimension),
            AxisPlane::Axis(direction) => {
                let axis = self.rotation_direction(direction, frame);
                if axis.length_squared() < EPSILON {
                    return delta;
                }
                match dimension {
                    // In 2D every rotation is about Z.
                    Dimension::Planar => {
                        if axis.normalize().z.abs() > 1.0 - 1e-3 {
                            delta
                        } else {
                            Rotation::identity(dimension)
                        }
                    }
                    Dimension::Spatial => {
                        let q = delta.to_quat();
                        let projected = q.xyz().project_onto(axis);
                        if projected.length_squared() < EPSILON * EPSILON {
                            return Rotation::IDENTITY;
                        }
                        let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
                        Rotation::from_axis_angle(projected, angle)
                    }
                }
            }
        }
    }

    fn constrain_scaling(&self, factors: Vec3, _frame: &FrameRef<'_>) -> Vec3 {
        if self.lock_scaling { Vec3::ONE } else { factors }
    }
}
