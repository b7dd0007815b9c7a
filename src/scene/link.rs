//! Kernel sharing between frames.
//!
//! Linking makes a *dependent* frame use the kernel of a *source* frame, so
//! both handles read and write the same translation, rotation, scaling,
//! reference frame and constraint. Unlinking gives the dependent a private
//! copy of the shared kernel, detaching it from later edits.
//!
//! Topology rules:
//! - a frame cannot be linked to itself
//! - a frame with dependents cannot become a dependent
//! - a dependent cannot act as a source
//! - the link must not put a frame among its own ancestors

use smallvec::SmallVec;

use crate::errors::{FrameError, Result};
use crate::scene::FrameKey;
use crate::scene::frame::FrameRef;
use crate::scene::graph::FrameGraph;

/// Role of a frame in kernel sharing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Owns its kernel, which nobody else uses.
    Unlinked,
    /// Owns its kernel and lends it to one or more dependents.
    Source,
    /// Borrows the kernel of a source frame.
    Dependent,
}

impl FrameGraph {
    /// Makes `dependent` share the kernel of `source`.
    ///
    /// The dependent's own kernel is dropped. Linking a frame that already
    /// depends on `source` is a no-op; a frame linked elsewhere is unlinked
    /// first.
    pub fn link_to(&mut self, dependent: FrameKey, source: FrameKey) -> Result<()> {
        let Some(dep) = self.frames.get(dependent) else {
            log::warn!("Cannot link missing frame {dependent:?}");
            return Err(FrameError::UnknownFrame(dependent));
        };
        let Some(src) = self.frames.get(source) else {
            log::warn!("Cannot link {dependent:?} to missing frame {source:?}");
            return Err(FrameError::UnknownFrame(source));
        };

        if dependent == source {
            log::warn!("Cannot link {dependent:?} to itself");
            return Err(FrameError::SelfLink(dependent));
        }
        if !dep.dependents.is_empty() {
            log::warn!("Cannot link {dependent:?}: it already has link dependents");
            return Err(FrameError::HasDependents(dependent));
        }
        if src.source.is_some() {
            log::warn!("Cannot link to {source:?}: it is itself a link dependent");
            return Err(FrameError::SourceIsDependent(source));
        }
        if dep.source == Some(source) {
            return Ok(());
        }

        let shared = src.kernel;
        let previous_source = dep.source;
        let start = self.kernels.get(shared).and_then(|k| k.reference);
        if self.reaches_kernel(start, shared, Some((dependent, shared))) {
            log::warn!("Cannot link {dependent:?} to {source:?}: it would create a cycle");
            return Err(FrameError::CyclicReference {
                frame: dependent,
                parent: start.unwrap_or(source),
            });
        }

        if previous_source.is_some() {
            self.unlink(dependent)?;
        }

        let stamp = self.next_stamp();
        if let Some(frame) = self.frames.get_mut(dependent) {
            let own = std::mem::replace(&mut frame.kernel, shared);
            frame.source = Some(source);
            self.kernels.remove(own);
        }
        if let Some(src) = self.frames.get_mut(source) {
            src.dependents.push(dependent);
        }
        if let Some(kernel) = self.kernels.get_mut(shared) {
            kernel.last_update = stamp;
        }

        log::debug!("Linked {dependent:?} to {source:?}");
        Ok(())
    }

    /// Same as [`link_to`](Self::link_to) with the arguments swapped.
    pub fn link_from(&mut self, source: FrameKey, dependent: FrameKey) -> Result<()> {
        self.link_to(dependent, source)
    }

    /// Gives `dependent` a private copy of the kernel it shares.
    pub fn unlink(&mut self, dependent: FrameKey) -> Result<()> {
        let Some(frame) = self.frames.get(dependent) else {
            log::warn!("Cannot unlink missing frame {dependent:?}");
            return Err(FrameError::UnknownFrame(dependent));
        };
        let Some(source) = frame.source else {
            log::warn!("Cannot unlink {dependent:?}: it is not a link dependent");
            return Err(FrameError::NotLinked(dependent));
        };
        let Some(mut kernel) = self.kernels.get(frame.kernel).cloned() else {
            return Err(FrameError::UnknownFrame(dependent));
        };

        kernel.last_update = self.next_stamp();
        let private = self.kernels.insert(kernel);
        if let Some(frame) = self.frames.get_mut(dependent) {
            frame.kernel = private;
            frame.source = None;
        }
        if let Some(src) = self.frames.get_mut(source) {
            src.dependents.retain(|d| *d != dependent);
        }

        log::debug!("Unlinked {dependent:?} from {source:?}");
        Ok(())
    }

    /// Unlinks `dependent`, provided it currently depends on `source`.
    pub fn unlink_from(&mut self, source: FrameKey, dependent: FrameKey) -> Result<()> {
        let linked = self
            .frames
            .get(dependent)
            .is_some_and(|frame| frame.source == Some(source));
        if !linked {
            log::warn!("Cannot unlink {dependent:?}: it does not depend on {source:?}");
            return Err(FrameError::NotLinked(dependent));
        }
        self.unlink(dependent)
    }

    /// Unlinks every dependent of `source`.
    pub fn unlink_all(&mut self, source: FrameKey) -> Result<()> {
        let dependents: SmallVec<[FrameKey; 4]> = self
            .frames
            .get(source)
            .map(|frame| frame.dependents.clone())
            .ok_or(FrameError::UnknownFrame(source))?;
        for dependent in dependents {
            self.unlink(dependent)?;
        }
        Ok(())
    }
}

impl<'a> FrameRef<'a> {
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        let frame = &self.graph().frames[self.key()];
        if frame.source.is_some() {
            LinkState::Dependent
        } else if frame.dependents.is_empty() {
            LinkState::Unlinked
        } else {
            LinkState::Source
        }
    }

    /// Source frame whose kernel this one borrows.
    #[must_use]
    pub fn link_source(&self) -> Option<FrameKey> {
        self.graph().frames[self.key()].source
    }

    /// Frames borrowing this frame's kernel.
    #[must_use]
    pub fn link_dependents(&self) -> &'a [FrameKey] {
        &self.graph().frames[self.key()].dependents
    }

    /// Returns true if both frames use the same kernel.
    #[must_use]
    pub fn shares_kernel_with(&self, other: FrameKey) -> bool {
        self.graph().kernel_key(other) == Some(self.kernel_key())
    }
}
