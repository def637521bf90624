//! Per-frame uniform values for the spinning triangle.

use cgmath::{Matrix4, Rad};

/// Radians per second around the z axis.
pub const ROTATION_SPEED: f32 = 1.0;
/// Angular frequency of the scale oscillation.
pub const SCALE_SPEED: f32 = 2.0;

/// Matches the std140 `Locals` block in `spinning.vert`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Uniforms {
    pub transform: [[f32; 4]; 4],
    pub time: f32,
    _padding: [f32; 3],
}

impl Uniforms {
    pub fn at(elapsed_secs: f32) -> Self {
        Uniforms {
            transform: frame_transform(elapsed_secs).into(),
            time: elapsed_secs,
            _padding: [0.0; 3],
        }
    }
}

/// Rotation about z composed with a uniform scale that swings between 1.0 and 0.5.
/// Identity at `elapsed_secs == 0`.
pub fn frame_transform(elapsed_secs: f32) -> Matrix4<f32> {
    let scale = 1.0 - 0.25 * (1.0 - (elapsed_secs * SCALE_SPEED).cos());
    Matrix4::from_angle_z(Rad(elapsed_secs * ROTATION_SPEED)) * Matrix4::from_scale(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{SquareMatrix, Vector4};
    use std::f32::consts::PI;
    use std::mem;

    #[test]
    fn starts_at_identity() {
        assert_relative_eq!(frame_transform(0.0), Matrix4::identity());
    }

    #[test]
    fn quarter_turn_is_at_minimum_scale() {
        let t = PI / 2.0 / ROTATION_SPEED;
        let v = frame_transform(t) * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(v, Vector4::new(0.0, 0.5, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn scale_stays_in_range() {
        for step in 0..200 {
            let t = step as f32 * 0.05;
            let m = frame_transform(t);
            let len = (m.x.x * m.x.x + m.x.y * m.x.y).sqrt();
            assert!(len >= 0.5 - 1e-5 && len <= 1.0 + 1e-5, "scale {} at {}", len, t);
        }
    }

    #[test]
    fn uniforms_match_std140_layout() {
        assert_eq!(mem::size_of::<Uniforms>(), 80);
        let u = Uniforms::at(1.5);
        assert_eq!(u.time, 1.5);
        let expected: [[f32; 4]; 4] = frame_transform(1.5).into();
        assert_eq!(u.transform, expected);
    }
}
