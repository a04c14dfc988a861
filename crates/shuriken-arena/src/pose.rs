use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// World-space vector in metres, y up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Distance on the XZ plane.
    pub fn horizontal_distance(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Unit vector, or zero for a degenerate input.
    pub fn normalized_or_zero(self) -> Vec3 {
        let len = self.length();
        if len > 1e-6 && len.is_finite() {
            self * (1.0 / len)
        } else {
            Vec3::ZERO
        }
    }

    /// Projection onto the XZ plane, normalized.
    pub fn flattened(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z).normalized_or_zero()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Where a player stands and which way they face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Point `forward` metres ahead (on the ground plane) and `up` metres above.
    pub fn offset(&self, forward: f32, up: f32) -> Vec3 {
        let ahead = self.forward.flattened();
        let ahead = if ahead == Vec3::ZERO {
            Vec3::FORWARD
        } else {
            ahead
        };
        self.position + ahead * forward + Vec3::UP * up
    }
}
