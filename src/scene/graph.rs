//! Frame arena.
//!
//! [`FrameGraph`] owns every frame and every transform kernel. Frames refer
//! to each other through [`FrameKey`] handles, never through pointers:
//! - the parent of a frame is stored in its kernel (`Kernel::reference`)
//! - linked frames point at the same [`KernelKey`]
//!
//! Every mutation stamps the touched kernel with the value of a monotonic
//! graph clock. [`FrameRef::last_update`] reports the newest stamp along a
//! frame's parent chain, which is what the keyframe interpolator compares
//! against to decide whether its caches are stale.

use glam::Vec3;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::errors::{FrameError, Result};
use crate::math::{Dimension, Rotation};
use crate::scene::convert::TransformMode;
use crate::scene::frame::{FrameMut, FrameRef, Pose};
use crate::scene::kernel::{Kernel, has_zero_component};
use crate::scene::{FrameKey, KernelKey};

/// Per-frame link bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub(crate) kernel: KernelKey,
    /// Frame whose kernel this one borrows, if linked.
    pub(crate) source: Option<FrameKey>,
    /// Frames borrowing this one's kernel.
    pub(crate) dependents: SmallVec<[FrameKey; 4]>,
}

/// Arena of frames and kernels.
#[derive(Debug)]
pub struct FrameGraph {
    dimension: Dimension,
    pub(crate) frames: SlotMap<FrameKey, Frame>,
    pub(crate) kernels: SlotMap<KernelKey, Kernel>,
    clock: u64,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    /// Creates an empty 3D graph.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(Dimension::Spatial)
    }

    /// Creates an empty 2D graph.
    #[must_use]
    pub fn planar() -> Self {
        Self::with_dimension(Dimension::Planar)
    }

    #[must_use]
    pub fn with_dimension(dimension: Dimension) -> Self {
        Self {
            dimension,
            frames: SlotMap::with_key(),
            kernels: SlotMap::with_key(),
            clock: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: FrameKey) -> bool {
        self.frames.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = FrameKey> + '_ {
        self.frames.keys()
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Creates an identity world frame.
    pub fn create(&mut self) -> FrameKey {
        self.insert_kernel(Kernel::new(self.dimension))
    }

    /// Creates a world frame with the given local transform.
    pub fn create_with(
        &mut self,
        translation: Vec3,
        rotation: Rotation,
        scaling: Vec3,
    ) -> Result<FrameKey> {
        if has_zero_component(scaling) {
            log::warn!("Refusing to create a frame with zero scaling {scaling}");
            return Err(FrameError::ZeroScale(scaling));
        }
        let mut kernel = Kernel::new(self.dimension);
        kernel.translation = translation;
        kernel.rotation = rotation.to_dimension(self.dimension).normalize();
        kernel.scaling = scaling;
        Ok(self.insert_kernel(kernel))
    }

    /// Creates an identity frame attached to `parent`.
    pub fn create_child(&mut self, parent: FrameKey) -> Result<FrameKey> {
        if !self.contains(parent) {
            log::warn!("Cannot attach a new frame to missing parent {parent:?}");
            return Err(FrameError::UnknownFrame(parent));
        }
        let mut kernel = Kernel::new(self.dimension);
        kernel.reference = Some(parent);
        Ok(self.insert_kernel(kernel))
    }

    /// Creates an independent frame with a deep copy of `key`'s kernel: same
    /// transform, same parent, same constraint, no links.
    pub fn duplicate(&mut self, key: FrameKey) -> Option<FrameKey> {
        let kernel = self.kernel(key)?.clone();
        Some(self.insert_kernel(kernel))
    }

    /// Creates a frame holding the local inverse of `key`, under the same
    /// parent.
    ///
    /// The translation is `-(R⁻¹ t) / s`, so composing the two frames yields
    /// the identity whenever the scaling is uniform. This differs from the
    /// rigid inverse `-(R⁻¹ t)` as soon as the scaling is not 1. Non-uniform
    /// scaling has no exact inverse in this form.
    pub fn inverse(&mut self, key: FrameKey) -> Option<FrameKey> {
        let kernel = self.kernel(key)?;
        let reference = kernel.reference;
        let (translation, rotation, scaling) =
            Self::invert_trs(kernel.translation, kernel.rotation, kernel.scaling);

        let mut inverse = Kernel::new(self.dimension);
        inverse.translation = translation;
        inverse.rotation = rotation;
        inverse.scaling = scaling;
        inverse.reference = reference;
        Some(self.insert_kernel(inverse))
    }

    /// Creates a world frame holding the inverse of `key`'s world transform.
    pub fn world_inverse(&mut self, key: FrameKey) -> Option<FrameKey> {
        let pose = self.frame(key)?.pose();
        let (translation, rotation, scaling) =
            Self::invert_trs(pose.position, pose.orientation, pose.magnitude);

        let mut inverse = Kernel::new(self.dimension);
        inverse.translation = translation;
        inverse.rotation = rotation.to_dimension(self.dimension);
        inverse.scaling = scaling;
        Some(self.insert_kernel(inverse))
    }

    fn invert_trs(translation: Vec3, rotation: Rotation, scaling: Vec3) -> (Vec3, Rotation, Vec3) {
        let rotation = rotation.inverse();
        let scaling = scaling.recip();
        (-rotation.rotate(translation) * scaling, rotation, scaling)
    }

    fn insert_kernel(&mut self, mut kernel: Kernel) -> FrameKey {
        kernel.last_update = self.next_stamp();
        let kernel = self.kernels.insert(kernel);
        self.frames.insert(Frame {
            kernel,
            source: None,
            dependents: SmallVec::new(),
        })
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes a frame.
    ///
    /// - Link dependents of the frame are unlinked first and keep a copy of
    ///   the kernel.
    /// - Children are re-attached to the removed frame's parent, keeping
    ///   their world pose.
    /// - A dependent frame only drops its handle; the source keeps the kernel.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn remove(&mut self, key: FrameKey) -> bool {
        let Some(frame) = self.frames.get(key) else {
            return false;
        };

        let dependents = frame.dependents.clone();
        for dependent in dependents {
            if let Err(err) = self.unlink(dependent) {
                log::warn!("Failed to unlink {dependent:?} while removing {key:?}: {err}");
            }
        }

        let parent = self.kernel(key).and_then(|k| k.reference);
        let children: SmallVec<[(KernelKey, Pose); 8]> = self
            .kernels
            .iter()
            .filter(|(_, kernel)| kernel.reference == Some(key))
            .filter_map(|(kernel_key, _)| {
                let holder = self.frame_of_kernel(kernel_key)?;
                Some((kernel_key, self.frame(holder)?.pose()))
            })
            .collect();

        for (kernel_key, pose) in children {
            let (translation, rotation, scaling) = self.local_from_world(parent, &pose);
            let stamp = self.next_stamp();
            let dimension = self.dimension;
            if let Some(kernel) = self.kernels.get_mut(kernel_key) {
                kernel.reference = parent;
                kernel.translation = translation;
                kernel.rotation = rotation.to_dimension(dimension).normalize();
                if !has_zero_component(scaling) {
                    kernel.scaling = scaling;
                }
                kernel.last_update = stamp;
            }
        }

        let Some(frame) = self.frames.remove(key) else {
            return false;
        };
        match frame.source {
            Some(source) => {
                if let Some(source) = self.frames.get_mut(source) {
                    source.dependents.retain(|d| *d != key);
                }
            }
            None => {
                self.kernels.remove(frame.kernel);
            }
        }

        log::debug!("Removed frame {key:?}");
        true
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Read-only view of a frame, or `None` for a stale handle.
    #[must_use]
    pub fn frame(&self, key: FrameKey) -> Option<FrameRef<'_>> {
        self.contains(key).then(|| FrameRef::new(self, key))
    }

    /// Mutable view of a frame, or `None` for a stale handle.
    pub fn frame_mut(&mut self, key: FrameKey) -> Option<FrameMut<'_>> {
        if self.contains(key) {
            Some(FrameMut::new(self, key))
        } else {
            None
        }
    }

    /// Kernel currently used by `key` (shared when linked).
    #[must_use]
    pub fn kernel(&self, key: FrameKey) -> Option<&Kernel> {
        let frame = self.frames.get(key)?;
        self.kernels.get(frame.kernel)
    }

    #[must_use]
    pub fn kernel_key(&self, key: FrameKey) -> Option<KernelKey> {
        self.frames.get(key).map(|frame| frame.kernel)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Applies `f` to the kernel of `key` and stamps it.
    pub(crate) fn modify(&mut self, key: FrameKey, f: impl FnOnce(&mut Kernel)) -> bool {
        let stamp = self.next_stamp();
        let Some(kernel_key) = self.kernel_key(key) else {
            return false;
        };
        let Some(kernel) = self.kernels.get_mut(kernel_key) else {
            return false;
        };
        f(kernel);
        kernel.last_update = stamp;
        true
    }

    /// Any frame currently using `kernel`. Source frames are preferred.
    fn frame_of_kernel(&self, kernel: KernelKey) -> Option<FrameKey> {
        let mut holders = self.frames.iter().filter(|(_, f)| f.kernel == kernel);
        let first = holders.next()?;
        if first.1.source.is_none() {
            return Some(first.0);
        }
        Some(holders.find(|(_, f)| f.source.is_none()).map_or(first.0, |(k, _)| k))
    }

    /// Walks the parent chain starting at `start` and reports whether some
    /// frame on it uses `target` as its kernel.
    ///
    /// `substitute` pretends one frame already uses another kernel, which is
    /// how a prospective link is checked before it is made. Walks longer than
    /// the number of frames are reported as cycles.
    pub(crate) fn reaches_kernel(
        &self,
        start: Option<FrameKey>,
        target: KernelKey,
        substitute: Option<(FrameKey, KernelKey)>,
    ) -> bool {
        let mut current = start;
        let mut steps = 0;
        while let Some(key) = current {
            let Some(frame) = self.frames.get(key) else {
                return false;
            };
            let kernel_key = match substitute {
                Some((frame_key, kernel_key)) if frame_key == key => kernel_key,
                _ => frame.kernel,
            };
            if kernel_key == target {
                return true;
            }
            steps += 1;
            if steps > self.frames.len() {
                return true;
            }
            current = self.kernels.get(kernel_key).and_then(|k| k.reference);
        }
        false
    }

    /// Local TRS that places a frame at `pose` (world) under `parent`.
    pub(crate) fn local_from_world(
        &self,
        parent: Option<FrameKey>,
        pose: &Pose,
    ) -> (Vec3, Rotation, Vec3) {
        match parent.and_then(|p| self.frame(p)) {
            Some(parent) => (
                parent.coordinates_of(pose.position, TransformMode::Improper),
                parent.orientation().inverse().compose(&pose.orientation),
                pose.magnitude / parent.magnitude(),
            ),
            None => (pose.position, pose.orientation, pose.magnitude),
        }
    }
}
