//! Live alignment offsets.
//!
//! The image offset only moves where labels are drawn; the pointer offset
//! only moves which angle the resolver reads. Keeping the two apart lets the
//! visuals and the result logic be tuned independently while the wheel runs.

use log::debug;

use crate::angle::{display_degrees, wrap_angle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Image,
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    image_offset: f64,
    pointer_offset: f64,
    nudge: (i32, i32),
    labels_dirty: bool,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Calibration {
    pub fn new(image_offset: f64, pointer_offset: f64) -> Self {
        Self {
            image_offset: wrap_angle(image_offset),
            pointer_offset: wrap_angle(pointer_offset),
            nudge: (0, 0),
            labels_dirty: true,
        }
    }

    /// Add `delta` radians to an offset and return its new wrapped value.
    pub fn adjust(&mut self, offset: Offset, delta: f64) -> f64 {
        let value = match offset {
            Offset::Image => {
                self.image_offset = wrap_angle(self.image_offset + delta);
                self.labels_dirty = true;
                self.image_offset
            }
            Offset::Pointer => {
                self.pointer_offset = wrap_angle(self.pointer_offset + delta);
                self.pointer_offset
            }
        };
        debug!("{:?} offset now {:.2}°", offset, display_degrees(value));
        value
    }

    /// Zero both offsets and the position nudge.
    pub fn reset(&mut self) {
        self.image_offset = 0.0;
        self.pointer_offset = 0.0;
        self.nudge = (0, 0);
        self.labels_dirty = true;
        debug!("calibration reset");
    }

    /// Shift the drawn wheel by whole pixels. Never affects resolution.
    pub fn nudge(&mut self, dx: i32, dy: i32) {
        self.nudge = (self.nudge.0 + dx, self.nudge.1 + dy);
    }

    pub fn get(&self, offset: Offset) -> f64 {
        match offset {
            Offset::Image => self.image_offset,
            Offset::Pointer => self.pointer_offset,
        }
    }

    pub fn image_offset(&self) -> f64 {
        self.image_offset
    }

    pub fn pointer_offset(&self) -> f64 {
        self.pointer_offset
    }

    pub fn position_nudge(&self) -> (i32, i32) {
        self.nudge
    }

    /// Report and clear the "label layer needs rebuilding" flag.
    pub fn take_labels_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.labels_dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::TAU;
    use std::f64::consts::PI;

    #[test]
    fn test_four_half_turns_close() {
        for start in [0.0, 0.7, 5.9] {
            let mut calibration = Calibration::new(start, start);
            for offset in [Offset::Image, Offset::Pointer] {
                for _ in 0..4 {
                    calibration.adjust(offset, PI);
                }
                let value = calibration.get(offset);
                let diff = (value - start).abs();
                assert!(diff < 1e-9 || (TAU - diff) < 1e-9, "{offset:?} {value}");
            }
        }
    }

    #[test]
    fn test_adjust_wraps_into_range() {
        let mut calibration = Calibration::default();
        let value = calibration.adjust(Offset::Pointer, -1f64.to_radians());
        assert!((value - 359f64.to_radians()).abs() < 1e-12);
        let value = calibration.adjust(Offset::Image, 3.0 * TAU + 0.25);
        assert!((value - 0.25).abs() < 1e-9);
        assert!(Calibration::new(-PI, 9.0 * PI).pointer_offset() < TAU);
    }

    #[test]
    fn test_only_image_offset_dirties_labels() {
        let mut calibration = Calibration::default();
        assert!(calibration.take_labels_dirty());
        assert!(!calibration.take_labels_dirty());
        calibration.adjust(Offset::Pointer, 0.1);
        calibration.nudge(6, 0);
        assert!(!calibration.take_labels_dirty());
        calibration.adjust(Offset::Image, 0.1);
        assert!(calibration.take_labels_dirty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut calibration = Calibration::new(1.0, 2.0);
        calibration.take_labels_dirty();
        calibration.nudge(0, -6);
        calibration.reset();
        assert_eq!(calibration.image_offset(), 0.0);
        assert_eq!(calibration.pointer_offset(), 0.0);
        assert_eq!(calibration.position_nudge(), (0, 0));
        assert!(calibration.take_labels_dirty());
    }
}
