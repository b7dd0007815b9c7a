//! Rotation capability shared by planar and spatial frames.
//!
//! A [`Rotation`] is either a signed angle about the Z axis (2D) or a unit
//! quaternion (3D). The variant is picked once, when the owning
//! [`FrameGraph`](crate::scene::FrameGraph) is created, so the transform
//! algebra is written a single time for both dimensions.
//!
//! Operations mixing the two variants promote the planar operand to a
//! quaternion about Z.
//!
//! The free functions at the bottom of this module ([`slerp`], [`squad`],
//! [`squad_tangent`], ...) are the quaternion building blocks used by the
//! keyframe interpolator.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::ops::Mul;

use glam::{Mat3, Quat, Vec3, Vec4};

const EPSILON: f32 = 1e-6;

/// Below this `1 - |cos|` threshold [`slerp`] falls back to a linear blend.
const SLERP_LINEAR_THRESHOLD: f32 = 0.01;

/// Dimension of a frame graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    /// 2D frames. Rotations are angles about the Z axis.
    Planar,
    /// 3D frames. Rotations are unit quaternions.
    #[default]
    Spatial,
}

/// A rotation, either planar or spatial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    /// Counter-clockwise angle (radians) about the Z axis.
    Planar(f32),
    /// Unit quaternion.
    Quaternion(Quat),
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quat> for Rotation {
    fn from(q: Quat) -> Self {
        Self::from_quat(q)
    }
}

impl Rotation {
    pub const IDENTITY: Self = Self::Quaternion(Quat::IDENTITY);

    /// Identity rotation of the requested dimension.
    #[must_use]
    pub fn identity(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Planar => Self::Planar(0.0),
            Dimension::Spatial => Self::IDENTITY,
        }
    }

    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::Planar(angle)
    }

    /// Wraps a quaternion, normalizing it.
    #[must_use]
    pub fn from_quat(q: Quat) -> Self {
        let len = q.length();
        if len < EPSILON {
            return Self::IDENTITY;
        }
        Self::Quaternion(q / len)
    }

    /// Rotation of `angle` radians around `axis`. A degenerate axis yields
    /// the identity.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len = axis.length();
        if len < EPSILON {
            return Self::IDENTITY;
        }
        Self::Quaternion(Quat::from_axis_angle(axis / len, angle))
    }

    /// Rotation that maps the world X, Y and Z axes onto `x`, `y` and `z`.
    ///
    /// The three vectors are expected to form a right-handed orthonormal basis.
    #[must_use]
    pub fn from_rotated_basis(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self::from_quat(Quat::from_mat3(&Mat3::from_cols(x, y, z)))
    }

    /// Rotation that carries the orthonormal basis `from` onto `to`.
    #[must_use]
    pub fn from_bases(from: [Vec3; 3], to: [Vec3; 3]) -> Self {
        let a = Self::from_rotated_basis(from[0], from[1], from[2]);
        let b = Self::from_rotated_basis(to[0], to[1], to[2]);
        b.compose(&a.inverse())
    }

    /// Shortest rotation turning direction `from` into direction `to`.
    #[must_use]
    pub fn from_to(from: Vec3, to: Vec3) -> Self {
        if from.length_squared() < EPSILON || to.length_squared() < EPSILON {
            return Self::IDENTITY;
        }
        Self::from_quat(Quat::from_rotation_arc(from.normalize(), to.normalize()))
    }

    #[inline]
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Planar(_) => Dimension::Planar,
            Self::Quaternion(_) => Dimension::Spatial,
        }
    }

    /// Quaternion form of this rotation.
    #[inline]
    #[must_use]
    pub fn to_quat(&self) -> Quat {
        match *self {
            Self::Planar(angle) => Quat::from_rotation_z(angle),
            Self::Quaternion(q) => q,
        }
    }

    /// Converts to the given dimension. A quaternion is reduced to its twist
    /// about the Z axis when made planar.
    #[must_use]
    pub fn to_dimension(self, dimension: Dimension) -> Self {
        match (self, dimension) {
            (Self::Quaternion(q), Dimension::Planar) => {
                Self::Planar(wrap_angle(2.0 * q.z.atan2(q.w)))
            }
            (Self::Planar(angle), Dimension::Spatial) => {
                Self::Quaternion(Quat::from_rotation_z(angle))
            }
            (rotation, _) => rotation,
        }
    }

    /// Rotation angle in radians.
    ///
    /// Planar rotations return their signed angle. Quaternions return a value
    /// in `[0, PI]`, paired with [`axis`](Self::axis).
    #[must_use]
    pub fn angle(&self) -> f32 {
        match *self {
            Self::Planar(angle) => angle,
            Self::Quaternion(q) => {
                let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
                if angle <= PI { angle } else { TAU - angle }
            }
        }
    }

    /// Normalized rotation axis. Planar rotations always report `Z`, as does
    /// the identity quaternion.
    #[must_use]
    pub fn axis(&self) -> Vec3 {
        match *self {
            Self::Planar(_) => Vec3::Z,
            Self::Quaternion(q) => {
                let v = q.xyz();
                let sin = v.length();
                if sin < EPSILON {
                    return Vec3::Z;
                }
                let axis = v / sin;
                if q.w.clamp(-1.0, 1.0).acos() <= FRAC_PI_2 {
                    axis
                } else {
                    -axis
                }
            }
        }
    }

    /// `self * other`: applies `other` first, then `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        match (*self, *other) {
            (Self::Planar(a), Self::Planar(b)) => Self::Planar(a + b),
            _ => Self::from_quat(self.to_quat() * other.to_quat()),
        }
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        match *self {
            Self::Planar(angle) => Self::Planar(-angle),
            Self::Quaternion(q) => Self::Quaternion(q.conjugate()),
        }
    }

    /// Rotates a vector. Planar rotations leave the Z component untouched.
    #[must_use]
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        match *self {
            Self::Planar(angle) => {
                let (sin, cos) = angle.sin_cos();
                Vec3::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y, v.z)
            }
            Self::Quaternion(q) => q * v,
        }
    }

    #[inline]
    #[must_use]
    pub fn inverse_rotate(&self, v: Vec3) -> Vec3 {
        self.inverse().rotate(v)
    }

    /// Renormalizes a quaternion, or wraps a planar angle into `[-PI, PI)`.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Self::Planar(angle) => Self::Planar(wrap_angle(angle)),
            Self::Quaternion(q) => Self::from_quat(q),
        }
    }

    /// 3x3 rotation matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_quat(self.to_quat())
    }

    /// Quaternion dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.to_quat().dot(other.to_quat())
    }

    /// Negated quaternion (same rotation, opposite hemisphere). Planar
    /// rotations have no second representation and are returned as is.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Planar(_) => self,
            Self::Quaternion(q) => Self::Quaternion(-q),
        }
    }

    /// Smallest angle between the two rotations, in `[0, PI]`.
    #[must_use]
    pub fn angle_between(&self, other: &Self) -> f32 {
        match (*self, *other) {
            (Self::Planar(a), Self::Planar(b)) => wrap_angle(b - a).abs(),
            _ => self.to_quat().angle_between(other.to_quat()),
        }
    }

    /// Spherical interpolation along the shortest arc.
    #[must_use]
    pub fn slerp(&self, other: &Self, t: f32) -> Self {
        match (*self, *other) {
            (Self::Planar(a), Self::Planar(b)) => Self::Planar(a + wrap_angle(b - a) * t),
            _ => Self::from_quat(slerp(self.to_quat(), other.to_quat(), t, true)),
        }
    }

    /// SQUAD control tangent for `center`, given its neighbors.
    ///
    /// Planar rotations are interpolated linearly and need no tangent, so
    /// `center` is returned.
    #[must_use]
    pub fn squad_tangent(before: &Self, center: &Self, after: &Self) -> Self {
        match (*before, *center, *after) {
            (Self::Planar(_), Self::Planar(_), Self::Planar(_)) => *center,
            _ => Self::Quaternion(squad_tangent(
                before.to_quat(),
                center.to_quat(),
                after.to_quat(),
            )),
        }
    }

    /// Spherical quadrangle interpolation between `a` and `b`.
    ///
    /// When both ends are planar this is a plain linear blend of the angles;
    /// the tangents are ignored.
    #[must_use]
    pub fn squad(a: &Self, tg_a: &Self, tg_b: &Self, b: &Self, t: f32) -> Self {
        match (*a, *b) {
            (Self::Planar(from), Self::Planar(to)) => Self::Planar(from + (to - from) * t),
            _ => Self::from_quat(squad(
                a.to_quat(),
                tg_a.to_quat(),
                tg_b.to_quat(),
                b.to_quat(),
                t,
            )),
        }
    }
}

impl Mul for Rotation {
    type Output = Rotation;

    fn mul(self, rhs: Rotation) -> Rotation {
        self.compose(&rhs)
    }
}

impl Mul<Vec3> for Rotation {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        self.rotate(rhs)
    }
}

/// Wraps an angle into `[-PI, PI)`.
#[inline]
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Spherical linear interpolation.
///
/// With `allow_flip` the shortest path is taken even when `a` and `b` lie in
/// opposite hemispheres. Nearly parallel inputs fall back to a normalized
/// linear blend.
#[must_use]
pub fn slerp(a: Quat, b: Quat, t: f32, allow_flip: bool) -> Quat {
    let cos_angle = a.dot(b);

    let (c1, c2) = if 1.0 - cos_angle.abs() < SLERP_LINEAR_THRESHOLD {
        (1.0 - t, t)
    } else {
        let angle = cos_angle.abs().acos();
        let sin_angle = angle.sin();
        (
            (angle * (1.0 - t)).sin() / sin_angle,
            (angle * t).sin() / sin_angle,
        )
    };

    let c1 = if allow_flip && cos_angle < 0.0 { -c1 } else { c1 };

    Quat::from_vec4(Vec4::from(a) * c1 + Vec4::from(b) * c2).normalize()
}

/// Quaternion logarithm. The result is a pure quaternion, returned as its
/// vector part.
#[must_use]
pub fn log(q: Quat) -> Vec3 {
    let v = q.xyz();
    let len = v.length();
    if len < EPSILON {
        v
    } else {
        v * (q.w.clamp(-1.0, 1.0).acos() / len)
    }
}

/// Exponential of a pure quaternion given by its vector part.
#[must_use]
pub fn exp(v: Vec3) -> Quat {
    let theta = v.length();
    if theta < EPSILON {
        Quat::from_xyzw(v.x, v.y, v.z, theta.cos()).normalize()
    } else {
        let coef = theta.sin() / theta;
        Quat::from_xyzw(v.x * coef, v.y * coef, v.z * coef, theta.cos())
    }
}

/// `log(a⁻¹ · b)`.
#[must_use]
pub fn ln_dif(a: Quat, b: Quat) -> Vec3 {
    log((a.conjugate() * b).normalize())
}

/// Intermediate SQUAD control point for `center`.
#[must_use]
pub fn squad_tangent(before: Quat, center: Quat, after: Quat) -> Quat {
    let l1 = ln_dif(center, before);
    let l2 = ln_dif(center, after);
    let e = (l1 + l2) * -0.25;
    (center * exp(e)).normalize()
}

/// Spherical quadrangle interpolation between `a` and `b` with control
/// tangents `tg_a` and `tg_b`.
#[must_use]
pub fn squad(a: Quat, tg_a: Quat, tg_b: Quat, b: Quat, t: f32) -> Quat {
    let ab = slerp(a, b, t, true);
    let tg = slerp(tg_a, tg_b, t, false);
    slerp(ab, tg, 2.0 * t * (1.0 - t), false)
}
