use bon::Builder;
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::sampler::WeightedPicker;
use crate::spin::SpinParams;

/// Color representation for wheel elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// Eight segments alternating between the two halloween outcomes.
pub fn default_labels() -> Vec<String> {
    (0..8)
        .map(|i| if i % 2 == 0 { "Dulce" } else { "Truco" }.to_string())
        .collect()
}

fn default_segment_colors() -> Vec<Color> {
    vec![Color::new(0xe8, 0x6a, 0x10), Color::new(0x4b, 0x1d, 0x6b)]
}

/// Everything that stays fixed for one wheel session.
#[derive(Debug, Clone, Builder)]
pub struct WheelConfig {
    #[builder(default = "Prize Wheel".to_string())]
    pub title: String,

    // Segments
    #[builder(default = default_labels())]
    pub segment_labels: Vec<String>,
    /// Relative odds per segment for targeted spins. `None` lets the wheel
    /// stop wherever the sampled turns carry it.
    pub weights: Option<Vec<f64>>,

    // Animation
    #[builder(default = 6.2)]
    pub spin_duration: f64,
    #[builder(default = 6.2)]
    pub min_turns: f64,
    #[builder(default = 12.4)]
    pub max_turns: f64,
    #[builder(default = 2.4)]
    pub result_hold: f64,
    pub seed: Option<u64>,

    // Pointer and calibration
    #[builder(default = -FRAC_PI_2)]
    pub pointer_base_angle: f64,
    #[builder(default = 0.0)]
    pub image_offset: f64,
    #[builder(default = 0.0)]
    pub pointer_offset: f64,
    #[builder(default = 1.0)]
    pub calibration_step_degrees: f64,
    #[builder(default = 6)]
    pub nudge_step: i32,

    // Input
    #[builder(default = 0.2)]
    pub debounce: f64,

    // Window configuration
    #[builder(default = 900)]
    pub window_width: usize,
    #[builder(default = 900)]
    pub window_height: usize,
    #[builder(default = 60.0)]
    pub max_framerate: f64,
    #[builder(default = false)]
    pub fullscreen: bool,

    // Wheel geometry, as fractions of the shorter window side / outer radius
    #[builder(default = 0.41)]
    pub wheel_radius_factor: f64,
    #[builder(default = 0.22)]
    pub hub_radius_factor: f64,
    #[builder(default = 0.60)]
    pub label_radius_factor: f64,
    #[builder(default = 0.18)]
    pub pointer_length_factor: f64,
    #[builder(default = 0.12)]
    pub pointer_half_width_factor: f64,

    // Fonts
    pub font_path: Option<PathBuf>,
    #[builder(default = 42.0)]
    pub label_font_size: f32,
    #[builder(default = 64.0)]
    pub result_font_size: f32,
    #[builder(default = 22.0)]
    pub overlay_font_size: f32,

    // Colors
    #[builder(default = default_segment_colors())]
    pub segment_colors: Vec<Color>,
    #[builder(default = Color::new(0x12, 0x0b, 0x1c))]
    pub background_color: Color,
    #[builder(default = Color::new(0xff, 0xf8, 0xe3))]
    pub text_color: Color,
    #[builder(default = Color::new(0x19, 0x19, 0x19))]
    pub shadow_color: Color,
    #[builder(default = Color::new(0xf0, 0xc0, 0x40))]
    pub rim_color: Color,
    #[builder(default = Color::new(0x00, 0x00, 0x00))]
    pub pointer_color: Color,
    #[builder(default = Color::new(0xff, 0xff, 0xff))]
    pub pointer_outline_color: Color,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WheelConfig {
    pub fn segment_count(&self) -> usize {
        self.segment_labels.len()
    }

    pub fn spin_params(&self) -> SpinParams {
        SpinParams {
            duration: self.spin_duration,
            min_turns: self.min_turns,
            max_turns: self.max_turns,
        }
    }

    /// Weighted sampler for targeted spins, if weights were configured.
    pub fn weighted_picker(&self) -> Result<Option<WeightedPicker>, ConfigError> {
        let Some(weights) = &self.weights else {
            return Ok(None);
        };
        if weights.len() != self.segment_count() {
            return Err(ConfigError::WeightCountMismatch {
                weights: weights.len(),
                segments: self.segment_count(),
            });
        }
        WeightedPicker::new(weights).map(Some)
    }

    /// Reject configurations that signal a programming or setup mistake.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_labels.is_empty() {
            return Err(ConfigError::NoSegments);
        }
        self.weighted_picker()?;
        self.spin_params().validate()?;
        if !(self.result_hold >= 0.0) {
            return Err(ConfigError::NegativeResultHold(self.result_hold));
        }
        if !(self.max_framerate > 0.0) {
            return Err(ConfigError::NonPositiveFramerate(self.max_framerate));
        }
        Ok(())
    }
}
