use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size of a render target in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. A zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// True when either dimension is zero (minimised window).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The same extent with both dimensions clamped to at least one pixel.
    pub fn at_least_one(&self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }
}

/// Linear RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[f32; 4]> for Colour {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Timing of a single frame of the update loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameTime {
    /// Zero-based index of the frame.
    pub index: u64,
    /// Time since the previous frame.
    pub delta: Duration,
    /// Time since the loop started.
    pub elapsed: Duration,
}

impl FrameTime {
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Model matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn extent_aspect_handles_zero_height() {
        assert_eq!(Extent::new(1440, 960).aspect(), 1.5);
        assert_eq!(Extent::new(10, 0).aspect(), 10.0);
        assert!(Extent::new(10, 0).is_empty());
        assert_eq!(Extent::new(0, 0).at_least_one(), Extent::new(1, 1));
    }

    #[test]
    fn colour_from_array() {
        let c = Colour::from([0.1, 0.2, 0.3, 1.0]);
        assert_eq!(c.to_array(), [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(Colour::BLACK.a, 1.0);
    }

    #[test]
    fn frame_time_seconds() {
        let t = FrameTime {
            index: 3,
            delta: Duration::from_millis(500),
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(t.delta_seconds(), 0.5);
        assert_eq!(t.elapsed_seconds(), 2.0);
    }
}
