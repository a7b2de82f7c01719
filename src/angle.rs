//! Angle helpers shared by the animator, the resolver and the renderer.
//!
//! All angles are radians in screen space: 0 points right and angles grow
//! clockwise because the framebuffer's `y` axis points down.

pub use std::f64::consts::TAU;

/// Wrap any finite angle into `[0, TAU)`.
///
/// Uses a euclidean remainder so negative inputs land on the positive side
/// instead of keeping their sign like `%` does.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round tiny negatives up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Angle in degrees wrapped into `[0, 360)`, for on-screen readouts.
pub fn display_degrees(angle: f64) -> f64 {
    wrap_angle(angle).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_wrap_negative_angles() {
        assert!((wrap_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!((wrap_angle(-5.0 * TAU - 1.0) - (TAU - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_large_angles() {
        assert!((wrap_angle(7.0 * TAU + 0.5) - 0.5).abs() < 1e-9);
        assert_eq!(wrap_angle(TAU), 0.0);
        assert_eq!(wrap_angle(0.0), 0.0);
    }

    #[test]
    fn test_wrap_tiny_negative_stays_in_range() {
        let wrapped = wrap_angle(-1e-18);
        assert!((0.0..TAU).contains(&wrapped));
    }

    #[test]
    fn test_display_degrees() {
        assert!((display_degrees(-PI / 2.0) - 270.0).abs() < 1e-9);
        assert!((display_degrees(PI) - 180.0).abs() < 1e-9);
    }
}
