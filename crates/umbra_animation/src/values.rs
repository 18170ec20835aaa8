use glam::{Quat, Vec3};

/// A keyframe value that can be blended between two neighbouring keys.
pub trait Interpolatable: Copy + Clone + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Quat {
    /// Shortest-arc spherical interpolation.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn slerp_takes_the_short_way_round() {
        let a = Quat::from_rotation_z(0.1);
        // Same orientation as from_rotation_z(0.3), opposite hemisphere
        let b = -Quat::from_rotation_z(0.3);
        let mid = Quat::interpolate_linear(a, b, 0.5);
        assert!(mid.angle_between(Quat::from_rotation_z(0.2)) < 1e-4);
    }

    #[test]
    fn slerp_midpoint_is_half_angle() {
        let mid = Quat::interpolate_linear(Quat::IDENTITY, Quat::from_rotation_y(FRAC_PI_2), 0.5);
        assert!(mid.angle_between(Quat::from_rotation_y(FRAC_PI_2 / 2.0)) < 1e-4);
        assert!((mid.length() - 1.0).abs() < 1e-5);
    }
}
