//! Math helpers shared by frames and interpolation.

pub mod rotation;

pub use rotation::{Dimension, Rotation};
