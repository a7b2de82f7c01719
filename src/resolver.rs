//! Maps a settled wheel angle to the segment sitting under the pointer.

use crate::angle::{wrap_angle, TAU};
use crate::error::ConfigError;

/// Bias added before flooring so an angle a hair short of a segment boundary
/// through rounding still resolves to the segment it was aimed at.
pub const BOUNDARY_EPSILON: f64 = 1e-7;

/// Index of the segment under the pointer.
///
/// `world` is the pointer's angle measured in wheel-local coordinates, so
/// segment `i` covers `[i * segment_width, (i + 1) * segment_width)`. The
/// offset is wrapped before use and a zero segment count is treated as one.
pub fn resolve_index(
    settled_angle: f64,
    pointer_base_angle: f64,
    pointer_offset: f64,
    segment_width: f64,
    segment_count: usize,
) -> usize {
    let count = segment_count.max(1);
    if !(segment_width > 0.0) {
        return 0;
    }
    let pointer = pointer_base_angle + wrap_angle(pointer_offset);
    let world = wrap_angle(pointer - settled_angle);
    let raw = ((world + BOUNDARY_EPSILON) / segment_width).floor();
    if !raw.is_finite() {
        return 0;
    }
    (raw as usize) % count
}

/// Settled angle in `[0, TAU)` that puts the centre of `index` under the
/// pointer. Inverse of [`resolve_index`].
pub fn landing_angle(
    index: usize,
    pointer_base_angle: f64,
    pointer_offset: f64,
    segment_width: f64,
) -> f64 {
    let pointer = pointer_base_angle + wrap_angle(pointer_offset);
    let world = index as f64 * segment_width + segment_width / 2.0;
    wrap_angle(pointer - world)
}

/// Fixed wheel geometry: how many equal segments and where the pointer is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentResolver {
    segment_count: usize,
    segment_width: f64,
    pointer_base_angle: f64,
}

impl SegmentResolver {
    pub fn new(segment_count: usize, pointer_base_angle: f64) -> Result<Self, ConfigError> {
        if segment_count == 0 {
            return Err(ConfigError::NoSegments);
        }
        Ok(Self {
            segment_count,
            segment_width: TAU / segment_count as f64,
            pointer_base_angle,
        })
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn segment_width(&self) -> f64 {
        self.segment_width
    }

    pub fn pointer_base_angle(&self) -> f64 {
        self.pointer_base_angle
    }

    /// Wheel-local angle of the middle of segment `index`.
    pub fn segment_center(&self, index: usize) -> f64 {
        (index as f64 + 0.5) * self.segment_width
    }

    pub fn resolve(&self, settled_angle: f64, pointer_offset: f64) -> usize {
        resolve_index(
            settled_angle,
            self.pointer_base_angle,
            pointer_offset,
            self.segment_width,
            self.segment_count,
        )
    }

    pub fn landing_angle(&self, index: usize, pointer_offset: f64) -> f64 {
        landing_angle(
            index % self.segment_count,
            self.pointer_base_angle,
            pointer_offset,
            self.segment_width,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn eight() -> SegmentResolver {
        SegmentResolver::new(8, -FRAC_PI_2).unwrap()
    }

    #[test]
    fn test_pointer_up_at_rest() {
        // world = (-pi/2 - 0) mod 2pi = 3pi/2, which is six quarter-pi widths
        assert_eq!(resolve_index(0.0, -FRAC_PI_2, 0.0, FRAC_PI_4, 8), 6);
        assert_eq!(eight().resolve(0.0, 0.0), 6);
    }

    #[test]
    fn test_index_always_in_range() {
        let resolver = eight();
        let mut angle = -50.0;
        while angle < 50.0 {
            assert!(resolver.resolve(angle, 0.0) < 8);
            angle += 0.0371;
        }
    }

    #[test]
    fn test_landing_angle_round_trips_every_index() {
        let resolver = eight();
        for offset in [0.0, 0.3, -1.2, 7.0] {
            for index in 0..8 {
                let settled = resolver.landing_angle(index, offset);
                assert!((0.0..TAU).contains(&settled));
                assert_eq!(resolver.resolve(settled, offset), index);
                assert_eq!(resolver.resolve(settled + 3.0 * TAU, offset), index);
                assert_eq!(resolver.resolve(settled - 5.0 * TAU, offset), index);
            }
        }
    }

    #[test]
    fn test_boundary_just_below_rounds_up() {
        // world sits a rounding error short of the boundary between 1 and 2
        let settled = -FRAC_PI_2 - 2.0 * FRAC_PI_4 + 1e-12;
        assert_eq!(resolve_index(settled, -FRAC_PI_2, 0.0, FRAC_PI_4, 8), 2);
    }

    #[test]
    fn test_pointer_offset_shifts_result() {
        let resolver = eight();
        assert_eq!(resolver.resolve(0.0, FRAC_PI_4), 7);
        // offsets outside [0, 2pi) behave like their wrapped value
        assert_eq!(resolver.resolve(0.0, FRAC_PI_4 + 2.0 * TAU), 7);
        assert_eq!(resolver.resolve(0.0, FRAC_PI_4 - TAU), 7);
    }

    #[test]
    fn test_degenerate_counts() {
        assert_eq!(resolve_index(1.0, -FRAC_PI_2, 0.0, TAU, 1), 0);
        assert_eq!(resolve_index(1.0, -FRAC_PI_2, 0.0, TAU, 0), 0);
        assert_eq!(resolve_index(1.0, -FRAC_PI_2, 0.0, 0.0, 4), 0);
        assert_eq!(SegmentResolver::new(0, 0.0), Err(ConfigError::NoSegments));
        assert_eq!(SegmentResolver::new(1, PI).unwrap().resolve(-3.0, 0.4), 0);
    }
}
