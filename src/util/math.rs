//! Math type re-exports and scene-graph bounding volumes.
//!
//! Vector, matrix and quaternion types come from `glam`; the bounding volumes
//! and the clip plane are the only math types the format defines itself.

pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec4,
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Matrices
    Mat4, DMat4,
    // Quaternions
    Quat, DQuat,
};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Bounding sphere in double precision.
///
/// A negative radius marks an invalid (unset) sphere.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingSphere {
    /// Invalid sphere (radius -1).
    pub const INVALID: Self = Self {
        center: DVec3::ZERO,
        radius: -1.0,
    };

    /// Create a new sphere.
    #[inline]
    pub const fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere has been set.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.radius >= 0.0
    }

    /// Expand this sphere to include a point.
    pub fn expand_by_point(&mut self, p: DVec3) {
        if !self.is_valid() {
            self.center = p;
            self.radius = 0.0;
            return;
        }
        let d = (p - self.center).length();
        if d > self.radius {
            let new_radius = (self.radius + d) * 0.5;
            let ratio = (new_radius - self.radius) / d;
            self.center += (p - self.center) * ratio;
            self.radius = new_radius;
        }
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for BoundingSphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundingSphere({:?}, r={})", self.center, self.radius)
    }
}

/// Axis-aligned bounding box in double precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundingBox({:?} - {:?})", self.min, self.max)
    }
}

/// Plane equation `a*x + b*y + c*z + d = 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Plane(pub DVec4);

impl Plane {
    #[inline]
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self(DVec4::new(a, b, c, d))
    }

    /// Signed distance of a point from the plane (unnormalised).
    #[inline]
    pub fn distance(&self, p: DVec3) -> f64 {
        self.0.truncate().dot(p) + self.0.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_sphere() {
        let mut s = BoundingSphere::INVALID;
        assert!(!s.is_valid());

        s.expand_by_point(DVec3::ZERO);
        assert!(s.is_valid());
        assert_eq!(s.radius, 0.0);

        s.expand_by_point(DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(s.center, DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(s.radius, 1.0);
    }

    #[test]
    fn test_bounding_box() {
        let mut b = BoundingBox::EMPTY;
        assert!(b.is_empty());

        b.expand_by_point(DVec3::new(-1.0, -1.0, -1.0));
        b.expand_by_point(DVec3::new(1.0, 1.0, 1.0));
        assert_eq!(b.center(), DVec3::ZERO);
    }

    #[test]
    fn test_plane_distance() {
        let p = Plane::new(0.0, 0.0, 1.0, -2.0);
        assert_eq!(p.distance(DVec3::new(5.0, 5.0, 2.0)), 0.0);
        assert_eq!(p.distance(DVec3::new(0.0, 0.0, 3.0)), 1.0);
    }

    #[test]
    fn test_pod_sizes() {
        assert_eq!(std::mem::size_of::<BoundingSphere>(), 32);
        assert_eq!(std::mem::size_of::<BoundingBox>(), 48);
        assert_eq!(std::mem::size_of::<Plane>(), 32);
    }
}
