//! Curve segments between two consecutive keyframes.
//!
//! Positions and magnitudes use the cubic Hermite form
//!
//! ```text
//! p(α) = p0 + α·(tg0 + α·(v1 + α·v2))
//! v1   = 3·(p1 - p0) - 2·tg0 - tg1
//! v2   = -2·(p1 - p0) + tg0 + tg1
//! ```
//!
//! which is the usual `h00·p0 + h10·tg0 + h01·p1 + h11·tg1` basis expanded
//! once per segment, so sampling costs three multiply-adds per component.
//! Orientations use SQUAD.

use glam::Vec3;

use crate::animation::keyframe::KeyFrame;
use crate::math::Rotation;
use crate::scene::Pose;

/// Precomputed cubic Hermite polynomial.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HermiteSegment {
    origin: Vec3,
    tangent: Vec3,
    v1: Vec3,
    v2: Vec3,
}

impl HermiteSegment {
    #[must_use]
    pub fn new(p0: Vec3, tg0: Vec3, p1: Vec3, tg1: Vec3) -> Self {
        let delta = p1 - p0;
        Self {
            origin: p0,
            tangent: tg0,
            v1: 3.0 * delta - 2.0 * tg0 - tg1,
            v2: -2.0 * delta + tg0 + tg1,
        }
    }

    #[inline]
    #[must_use]
    pub fn evaluate(&self, alpha: f32) -> Vec3 {
        self.origin + alpha * (self.tangent + alpha * (self.v1 + alpha * self.v2))
    }
}

/// Full pose curve between two keyframes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineSegment {
    position: HermiteSegment,
    magnitude: HermiteSegment,
    from: Rotation,
    tg_from: Rotation,
    tg_to: Rotation,
    to: Rotation,
}

impl SplineSegment {
    #[must_use]
    pub fn new(from: &KeyFrame, to: &KeyFrame) -> Self {
        Self {
            position: HermiteSegment::new(
                from.position(),
                from.tg_position,
                to.position(),
                to.tg_position,
            ),
            magnitude: HermiteSegment::new(
                from.magnitude(),
                from.tg_magnitude,
                to.magnitude(),
                to.tg_magnitude,
            ),
            from: from.orientation(),
            tg_from: from.tg_orientation,
            tg_to: to.tg_orientation,
            to: to.orientation(),
        }
    }

    /// Pose at `alpha` in `[0, 1]`.
    #[must_use]
    pub fn sample(&self, alpha: f32) -> Pose {
        Pose {
            position: self.position.evaluate(alpha),
            orientation: Rotation::squad(&self.from, &self.tg_from, &self.tg_to, &self.to, alpha),
            magnitude: self.magnitude.evaluate(alpha),
        }
    }
}
