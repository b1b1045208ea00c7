//! Positions and ground-plane helpers.
//!
//! The simulation is 3D for replication but all gameplay distances are
//! measured on the XZ ground plane.

use serde::{Deserialize, Serialize};

/// World-space position or direction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance on the ground plane, ignoring height.
    pub fn distance_xz(&self, other: &Vec3) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Unit direction on the ground plane toward `other`, or `None` when the
    /// two points coincide.
    pub fn direction_xz(&self, other: &Vec3) -> Option<(f32, f32)> {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        let len = (dx * dx + dz * dz).sqrt();
        if len <= 1e-4 {
            return None;
        }
        Some((dx / len, dz / len))
    }

    /// Returns this position moved by `(dx, dz)` on the ground plane.
    pub fn offset_xz(&self, dx: f32, dz: f32) -> Vec3 {
        Vec3::new(self.x + dx, self.y, self.z + dz)
    }
}

/// Unit forward vector on the ground plane for a facing angle (radians).
///
/// Angle 0 faces +Z; positive angles turn toward +X.
pub fn forward_xz(angle: f32) -> (f32, f32) {
    (angle.sin(), angle.cos())
}

/// Unit right vector on the ground plane for a facing angle.
pub fn right_xz(angle: f32) -> (f32, f32) {
    (angle.cos(), -angle.sin())
}

/// Facing angle that looks from `from` toward `to`.
pub fn facing_towards(from: &Vec3, to: &Vec3) -> f32 {
    (to.x - from.x).atan2(to.z - from.z)
}

/// Whether the segment `p0 -> p1` passes within `radius` of `center` (XZ).
pub fn segment_hits_circle_xz(p0: &Vec3, p1: &Vec3, center: &Vec3, radius: f32) -> bool {
    let (abx, abz) = (p1.x - p0.x, p1.z - p0.z);
    let len2 = abx * abx + abz * abz;
    if len2 <= 1e-12 {
        return p0.distance_xz(center) <= radius;
    }
    let t = (((center.x - p0.x) * abx + (center.z - p0.z) * abz) / len2).clamp(0.0, 1.0);
    let closest = Vec3::new(p0.x + abx * t, p0.y, p0.z + abz * t);
    closest.distance_xz(center) <= radius
}
