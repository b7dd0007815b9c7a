//! Borrowed frame views.
//!
//! [`FrameRef`] borrows a [`FrameGraph`] immutably and answers queries about
//! one frame; [`FrameMut`] borrows it mutably and edits one frame. Both are
//! handed out by [`FrameGraph::frame`] / [`FrameGraph::frame_mut`], which
//! validate the handle once, so view methods never deal with stale keys.
//!
//! Mutators fall in three groups:
//! - raw setters (`set_translation`, `set_rotation`, `set_scaling`) write the
//!   kernel directly and bypass the constraint
//! - incremental mutators (`translate`, `rotate`, `scale`) pass the delta
//!   through the constraint first
//! - world setters (`set_position`, `set_orientation`, `set_magnitude`) turn
//!   the target into a local delta and route it through the incremental ones
//!
//! # Example
//!
//! ```rust,ignore
//! let mut frame = graph.frame_mut(handle).unwrap();
//! frame.translate(Vec3::X);
//! frame.rotate(Rotation::from_axis_angle(Vec3::Y, 0.5));
//! let world = graph.frame(handle).unwrap().position();
//! ```

use std::f32::consts::FRAC_PI_2;
use std::iter;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::errors::{FrameError, Result};
use crate::math::rotation::wrap_angle;
use crate::math::{Dimension, Rotation};
use crate::scene::constraint::Constraint;
use crate::scene::convert::TransformMode;
use crate::scene::graph::FrameGraph;
use crate::scene::kernel::{Kernel, has_zero_component};
use crate::scene::{FrameKey, KernelKey};

/// World-space position, orientation and magnitude of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Rotation,
    pub magnitude: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity(Dimension::Spatial)
    }
}

impl Pose {
    #[must_use]
    pub fn new(position: Vec3, orientation: Rotation, magnitude: Vec3) -> Self {
        Self {
            position,
            orientation,
            magnitude,
        }
    }

    #[must_use]
    pub fn identity(dimension: Dimension) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Rotation::identity(dimension),
            magnitude: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.magnitude,
            self.orientation.to_quat(),
            self.position,
        )
    }
}

// ============================================================================
// FrameRef
// ============================================================================

/// Read-only view of one frame.
#[derive(Clone, Copy)]
pub struct FrameRef<'a> {
    graph: &'a FrameGraph,
    key: FrameKey,
}

impl<'a> FrameRef<'a> {
    #[inline]
    pub(crate) fn new(graph: &'a FrameGraph, key: FrameKey) -> Self {
        Self { graph, key }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> FrameKey {
        self.key
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &'a FrameGraph {
        self.graph
    }

    /// Kernel backing this frame. Linked frames return the shared one.
    #[inline]
    #[must_use]
    pub fn kernel(&self) -> &'a Kernel {
        &self.graph.kernels[self.kernel_key()]
    }

    #[inline]
    #[must_use]
    pub fn kernel_key(&self) -> KernelKey {
        self.graph.frames[self.key].kernel
    }

    // -- Local state --

    #[inline]
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.kernel().translation
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.kernel().rotation
    }

    #[inline]
    #[must_use]
    pub fn scaling(&self) -> Vec3 {
        self.kernel().scaling
    }

    #[inline]
    #[must_use]
    pub fn reference_key(&self) -> Option<FrameKey> {
        self.kernel().reference
    }

    /// Parent frame, or `None` for a world frame.
    #[must_use]
    pub fn reference_frame(&self) -> Option<FrameRef<'a>> {
        self.reference_key().and_then(|key| self.graph.frame(key))
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&'a dyn Constraint> {
        self.kernel().constraint.as_deref()
    }

    // -- Hierarchy --

    /// This frame followed by its parent, grandparent, and so on.
    pub fn ancestors(&self) -> impl Iterator<Item = FrameRef<'a>> + use<'a> {
        iter::successors(Some(*self), FrameRef::reference_frame)
    }

    /// Returns true if `other` is a strict ancestor of this frame.
    #[must_use]
    pub fn is_descendant_of(&self, other: FrameKey) -> bool {
        self.ancestors().skip(1).any(|frame| frame.key == other)
    }

    /// Newest mutation stamp on this frame or any of its ancestors.
    #[must_use]
    pub fn last_update(&self) -> u64 {
        self.ancestors()
            .map(|frame| frame.kernel().last_update)
            .max()
            .unwrap_or(0)
    }

    // -- World state --

    /// World position of the origin.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.inverse_coordinates_of(Vec3::ZERO, TransformMode::Improper)
    }

    /// World orientation, the product of the rotations along the chain.
    #[must_use]
    pub fn orientation(&self) -> Rotation {
        self.ancestors()
            .fold(Rotation::identity(self.graph.dimension()), |acc, frame| {
                frame.rotation().compose(&acc)
            })
            .normalize()
    }

    /// World magnitude, the component-wise product of scalings along the chain.
    #[must_use]
    pub fn magnitude(&self) -> Vec3 {
        self.ancestors()
            .fold(Vec3::ONE, |acc, frame| acc * frame.scaling())
    }

    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position(),
            orientation: self.orientation(),
            magnitude: self.magnitude(),
        }
    }

    /// World direction of the local X axis.
    #[must_use]
    pub fn x_axis(&self) -> Vec3 {
        self.inverse_transform_of(Vec3::X, TransformMode::Proper)
    }

    /// World direction of the local Y axis.
    #[must_use]
    pub fn y_axis(&self) -> Vec3 {
        self.inverse_transform_of(Vec3::Y, TransformMode::Proper)
    }

    /// World direction of the local Z axis.
    #[must_use]
    pub fn z_axis(&self) -> Vec3 {
        self.inverse_transform_of(Vec3::Z, TransformMode::Proper)
    }

    /// Local matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.kernel().matrix()
    }

    /// Local-to-world matrix.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        match self.reference_frame() {
            Some(parent) => parent.world_matrix() * self.matrix(),
            None => self.matrix(),
        }
    }
}

// ============================================================================
// FrameMut
// ============================================================================

/// Mutable view of one frame.
pub struct FrameMut<'a> {
    graph: &'a mut FrameGraph,
    key: FrameKey,
}

impl<'a> FrameMut<'a> {
    #[inline]
    pub(crate) fn new(graph: &'a mut FrameGraph, key: FrameKey) -> Self {
        Self { graph, key }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> FrameKey {
        self.key
    }

    /// Read-only view of the same frame.
    #[inline]
    #[must_use]
    pub fn view(&self) -> FrameRef<'_> {
        FrameRef::new(self.graph, self.key)
    }

    // -- Raw setters (constraint bypassed) --

    pub fn set_translation(&mut self, translation: Vec3) {
        self.graph.modify(self.key, |k| k.translation = translation);
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        let rotation = rotation.to_dimension(self.graph.dimension()).normalize();
        self.graph.modify(self.key, |k| k.rotation = rotation);
    }

    pub fn set_scaling(&mut self, scaling: Vec3) -> Result<()> {
        if has_zero_component(scaling) {
            log::warn!("Rejected zero scaling {scaling} for {:?}", self.key);
            return Err(FrameError::ZeroScale(scaling));
        }
        self.graph.modify(self.key, |k| k.scaling = scaling);
        Ok(())
    }

    /// Sets translation, rotation and scaling from a local matrix.
    pub fn set_from_matrix(&mut self, matrix: Mat4) -> Result<()> {
        let (scaling, rotation, translation) = matrix.to_scale_rotation_translation();
        if has_zero_component(scaling) {
            log::warn!("Rejected degenerate matrix for {:?}", self.key);
            return Err(FrameError::ZeroScale(scaling));
        }
        let rotation = Rotation::from_quat(rotation).to_dimension(self.graph.dimension());
        self.graph.modify(self.key, |k| {
            k.translation = translation;
            k.rotation = rotation;
            k.scaling = scaling;
        });
        Ok(())
    }

    pub fn set_constraint(&mut self, constraint: Option<Rc<dyn Constraint>>) {
        self.graph.modify(self.key, |k| k.constraint = constraint);
    }

    // -- Incremental mutators (constraint applied) --

    /// Adds `delta` (parent coordinates) to the translation.
    pub fn translate(&mut self, delta: Vec3) {
        let frame = self.view();
        let delta = frame
            .constraint()
            .map_or(delta, |c| c.constrain_translation(delta, &frame));
        self.graph.modify(self.key, |k| k.translation += delta);
    }

    /// Post-multiplies the rotation by `delta` (local coordinates).
    pub fn rotate(&mut self, delta: Rotation) {
        let dimension = self.graph.dimension();
        let frame = self.view();
        let delta = delta.to_dimension(dimension);
        let delta = frame
            .constraint()
            .map_or(delta, |c| c.constrain_rotation(delta, &frame))
            .to_dimension(dimension);
        self.graph
            .modify(self.key, |k| k.rotation = k.rotation.compose(&delta).normalize());
    }

    /// Multiplies the scaling component-wise by `factors`.
    pub fn scale(&mut self, factors: Vec3) -> Result<()> {
        let frame = self.view();
        let factors = frame
            .constraint()
            .map_or(factors, |c| c.constrain_scaling(factors, &frame));
        let scaling = frame.scaling() * factors;
        if has_zero_component(scaling) {
            log::warn!("Rejected scale by {factors} for {:?}: zero scaling", self.key);
            return Err(FrameError::ZeroScale(scaling));
        }
        self.graph.modify(self.key, |k| k.scaling = scaling);
        Ok(())
    }

    // -- World setters (constraint applied) --

    /// Moves the origin to the world point `position`.
    pub fn set_position(&mut self, position: Vec3) {
        let frame = self.view();
        let local = frame
            .reference_frame()
            .map_or(position, |parent| {
                parent.coordinates_of(position, TransformMode::Improper)
            });
        let delta = local - frame.translation();
        self.translate(delta);
    }

    /// Sets the world orientation.
    pub fn set_orientation(&mut self, orientation: Rotation) {
        let frame = self.view();
        let local = frame
            .reference_frame()
            .map_or(orientation, |parent| parent.orientation().inverse().compose(&orientation));
        let delta = frame.rotation().inverse().compose(&local);
        self.rotate(delta);
    }

    /// Sets the world magnitude.
    pub fn set_magnitude(&mut self, magnitude: Vec3) -> Result<()> {
        let frame = self.view();
        let local = frame
            .reference_frame()
            .map_or(magnitude, |parent| magnitude / parent.magnitude());
        if has_zero_component(local) {
            log::warn!("Rejected zero magnitude {magnitude} for {:?}", self.key);
            return Err(FrameError::ZeroScale(local));
        }
        let factors = local / frame.scaling();
        self.scale(factors)
    }

    /// Sets position, orientation and magnitude in one go.
    pub fn set_pose(&mut self, pose: &Pose) -> Result<()> {
        self.set_position(pose.position);
        self.set_orientation(pose.orientation);
        self.set_magnitude(pose.magnitude)
    }

    // -- Hierarchy --

    /// Changes the parent. Local state is kept, so the world pose moves.
    ///
    /// Rejected if `parent` is this frame, one of its descendants, or a
    /// frame sharing this frame's kernel.
    pub fn set_reference_frame(&mut self, parent: Option<FrameKey>) -> Result<()> {
        if let Some(parent) = parent {
            if !self.graph.contains(parent) {
                log::warn!("Cannot attach {:?} to missing frame {parent:?}", self.key);
                return Err(FrameError::UnknownFrame(parent));
            }
            let own = self.view().kernel_key();
            if self.graph.reaches_kernel(Some(parent), own, None) {
                log::warn!("Rejected cyclic reference: {:?} under {parent:?}", self.key);
                return Err(FrameError::CyclicReference {
                    frame: self.key,
                    parent,
                });
            }
        }
        self.graph.modify(self.key, |k| k.reference = parent);
        Ok(())
    }

    /// Changes the parent while keeping the world pose.
    pub fn set_reference_frame_keep_pose(&mut self, parent: Option<FrameKey>) -> Result<()> {
        let pose = self.view().pose();
        self.set_reference_frame(parent)?;
        let (translation, rotation, scaling) = self.graph.local_from_world(parent, &pose);
        let dimension = self.graph.dimension();
        self.graph.modify(self.key, |k| {
            k.translation = translation;
            k.rotation = rotation.to_dimension(dimension).normalize();
            if !has_zero_component(scaling) {
                k.scaling = scaling;
            }
        });
        Ok(())
    }

    // -- Orientation helpers --

    /// Turns the frame so that its -Z axis points at `target`.
    ///
    /// `target` and `up` are in the reference frame's coordinates. Does
    /// nothing when the view direction is parallel to `up`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.view().translation()).normalize_or_zero();

        if forward.cross(up).length_squared() < 1e-4 {
            return;
        }

        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();

        self.set_rotation(Rotation::from_rotated_basis(right, new_up, -forward));
    }

    /// Snaps the frame's axes onto those of `other` (or of the world).
    ///
    /// In 3D the most parallel pair of axes is aligned first, then a second
    /// pair, each only when `|cos|` of the angle between them is at least
    /// `threshold`. In 2D the relative angle is snapped to the nearest
    /// quarter turn when the cosine of the residual is at least `threshold`.
    ///
    /// With `move_frame`, the frame is then translated so that the origin of
    /// `other` keeps its coordinates in this frame.
    pub fn align_with_frame(&mut self, other: Option<FrameKey>, move_frame: bool, threshold: f32) {
        if let Some(other) = other
            && !self.graph.contains(other)
        {
            log::warn!("Cannot align {:?} with missing frame {other:?}", self.key);
            return;
        }

        let center = other
            .and_then(|key| self.graph.frame(key))
            .map_or(Vec3::ZERO, |frame| frame.position());
        let local_center = self
            .view()
            .coordinates_of(center, TransformMode::Improper);

        match self.graph.dimension() {
            Dimension::Planar => self.align_planar(other, threshold),
            Dimension::Spatial => self.align_spatial(other, threshold),
        }

        if move_frame {
            let moved = self
                .view()
                .inverse_coordinates_of(local_center, TransformMode::Improper);
            let position = self.view().position();
            self.set_position(position + (center - moved));
        }
    }

    fn align_spatial(&mut self, other: Option<FrameKey>, threshold: f32) {
        let targets = match other.and_then(|key| self.graph.frame(key)) {
            Some(frame) => [frame.x_axis(), frame.y_axis(), frame.z_axis()],
            None => [Vec3::X, Vec3::Y, Vec3::Z],
        };
        let view = self.view();
        let axes = [view.x_axis(), view.y_axis(), view.z_axis()];

        let mut best = (0, 0);
        let mut max = 0.0;
        for (i, target) in targets.iter().enumerate() {
            for (j, axis) in axes.iter().enumerate() {
                let proj = target.dot(*axis).abs();
                if proj >= max {
                    best = (i, j);
                    max = proj;
                }
            }
        }

        if max < threshold {
            return;
        }
        self.rotate_world(snap_rotation(targets[best.0], axes[best.1]));

        // Second pass around the axis just aligned.
        let view = self.view();
        let direction = [view.x_axis(), view.y_axis(), view.z_axis()][(best.1 + 1) % 3];
        let mut second = 0;
        let mut max = 0.0;
        for (i, target) in targets.iter().enumerate() {
            let proj = target.dot(direction).abs();
            if proj > max {
                second = i;
                max = proj;
            }
        }

        if max >= threshold {
            self.rotate_world(snap_rotation(targets[second], direction));
        }
    }

    fn align_planar(&mut self, other: Option<FrameKey>, threshold: f32) {
        let reference = other
            .and_then(|key| self.graph.frame(key))
            .map_or(0.0, |frame| frame.orientation().to_dimension(Dimension::Planar).angle());
        let own = self.view().orientation().to_dimension(Dimension::Planar).angle();

        let relative = wrap_angle(own - reference);
        let snapped = (relative / FRAC_PI_2).round() * FRAC_PI_2;
        let residual = snapped - relative;

        if residual.cos() >= threshold {
            self.rotate(Rotation::Planar(residual));
        }
    }

    /// Applies a rotation expressed in world coordinates.
    fn rotate_world(&mut self, rotation: Rotation) {
        let orientation = self.view().orientation();
        let delta = orientation.inverse().compose(&rotation).compose(&orientation);
        self.rotate(delta);
    }
}

/// World rotation that turns `axis` onto `target` (or onto `-target` when
/// they point in opposite directions).
fn snap_rotation(target: Vec3, axis: Vec3) -> Rotation {
    let cross = target.cross(axis);
    let angle = cross.length().min(1.0).asin();
    let angle = if target.dot(axis) >= 0.0 { -angle } else { angle };
    Rotation::from_axis_angle(cross, angle)
}
