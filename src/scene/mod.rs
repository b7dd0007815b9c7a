//! Frame hierarchy module
//!
//! Manages coordinate frames and their relationships:
//! - FrameGraph: arena owning every frame and transform kernel
//! - Kernel: translation, rotation, scaling, reference frame and constraint
//! - FrameRef / FrameMut: borrowed views used to query and edit one frame
//! - Linking: several frames sharing a single kernel
//! - Constraint: filter applied to incremental mutations

pub mod constraint;
pub mod convert;
pub mod frame;
pub mod graph;
pub mod kernel;
pub mod link;

// Re-export commonly used types
pub use constraint::{AxisPlane, AxisPlaneConstraint, Constraint, ConstraintSpace};
pub use convert::TransformMode;
pub use frame::{FrameMut, FrameRef, Pose};
pub use graph::FrameGraph;
pub use kernel::Kernel;
pub use link::LinkState;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a frame stored in a [`FrameGraph`].
    pub struct FrameKey;
    /// Handle to a transform kernel. Linked frames share one.
    pub struct KernelKey;
}
