// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod angle;
pub mod calibration;
pub mod config;
pub mod error;
pub mod input;
pub mod resolver;
pub mod sampler;
pub mod spin;

mod render;

// External crate imports
use log::{debug, info, warn};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusttype::Font;

// Standard library imports
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, WindowBuilder};

pub use calibration::{Calibration, Offset};
pub use config::{Color, WheelConfig};
pub use error::{ConfigError, SpinError};
pub use input::{Debouncer, WheelCommand};
pub use resolver::SegmentResolver;
pub use sampler::WeightedPicker;
pub use spin::{AnimationStatus, SpinAnimator, SpinParams};

use render::{build_scene, Canvas, FrameState, LabelLayer};

/// Fonts tried when no usable `font_path` is configured.
const FALLBACK_FONTS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Outcome of a finished spin, shown until `valid_until`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinResult {
    pub index: usize,
    pub label: String,
    pub valid_until: f64,
}

impl SpinResult {
    pub fn is_current(&self, now: f64) -> bool {
        now < self.valid_until
    }
}

/// Main wheel struct - the primary public interface
///
/// Owns the spin state, the calibration offsets and the last result. All
/// times are seconds on the caller's session clock.
#[derive(Debug, Clone)]
pub struct Wheel {
    config: WheelConfig,
    resolver: SegmentResolver,
    animator: SpinAnimator,
    calibration: Calibration,
    picker: Option<WeightedPicker>,
    result: Option<SpinResult>,
    rng: StdRng,
}

impl Wheel {
    pub fn new(config: WheelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = SegmentResolver::new(config.segment_count(), config.pointer_base_angle)?;
        let picker = config.weighted_picker()?;
        let calibration = Calibration::new(config.image_offset, config.pointer_offset);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            config,
            resolver,
            animator: SpinAnimator::new(),
            calibration,
            picker,
            result: None,
            rng,
        })
    }

    /// Spin onto a weighted pick when weights are configured, otherwise let
    /// the sampled turns decide.
    pub fn spin(&mut self, now: f64) -> Result<(), SpinError> {
        if self.animator.is_spinning() {
            return Err(SpinError::Busy);
        }
        let target = self.picker.as_ref().map(|picker| picker.pick(&mut self.rng));
        self.begin(now, target)
    }

    /// Spin so the wheel settles with `index` under the pointer.
    pub fn spin_to(&mut self, now: f64, index: usize) -> Result<(), SpinError> {
        let count = self.segment_count();
        if index >= count {
            return Err(SpinError::TargetOutOfRange { index, count });
        }
        self.begin(now, Some(index))
    }

    fn begin(&mut self, now: f64, target: Option<usize>) -> Result<(), SpinError> {
        let landing =
            target.map(|index| self.resolver.landing_angle(index, self.calibration.pointer_offset()));
        let params = self.config.spin_params();
        self.animator.begin(now, &params, landing, &mut self.rng)?;
        self.result = None;
        match target {
            Some(index) => info!(
                "spinning towards segment {index} ({})",
                self.config.segment_labels[index]
            ),
            None => info!("spinning freely"),
        }
        Ok(())
    }

    /// Advance the animation; resolves and stores the result on the tick the
    /// spin finishes.
    pub fn advance(&mut self, now: f64) -> AnimationStatus {
        let status = self.animator.advance(now);
        if status == AnimationStatus::Finished {
            let index = self
                .resolver
                .resolve(self.animator.current_angle(), self.calibration.pointer_offset());
            let label = self.config.segment_labels[index].clone();
            info!("wheel settled on segment {index} ({label})");
            self.result = Some(SpinResult {
                index,
                label,
                valid_until: now + self.config.result_hold,
            });
        }
        status
    }

    /// Segment currently under the pointer, spinning or not.
    pub fn segment_under_pointer(&self) -> usize {
        self.resolver
            .resolve(self.animator.current_angle(), self.calibration.pointer_offset())
    }

    pub fn angle(&self) -> f64 {
        self.animator.current_angle()
    }

    pub fn is_spinning(&self) -> bool {
        self.animator.is_spinning()
    }

    pub fn animator(&self) -> &SpinAnimator {
        &self.animator
    }

    pub fn resolver(&self) -> &SegmentResolver {
        &self.resolver
    }

    /// Last result, whether or not its display time has passed.
    pub fn result(&self) -> Option<&SpinResult> {
        self.result.as_ref()
    }

    /// Last result while it should still be displayed.
    pub fn current_result(&self, now: f64) -> Option<&SpinResult> {
        self.result.as_ref().filter(|result| result.is_current(now))
    }

    pub fn segment_count(&self) -> usize {
        self.resolver.segment_count()
    }

    pub fn segment_label(&self, index: usize) -> Option<&str> {
        self.config.segment_labels.get(index).map(String::as_str)
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut Calibration {
        &mut self.calibration
    }
}

// ============================================================================
// INPUT DISPATCH
// ============================================================================

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Exit,
    Wheel(WheelCommand),
}

/// Key bindings: Space/Enter spin, C toggles calibration, R resets it,
/// Left/Right move the labels, Up/Down move the logical pointer, WASD move
/// the whole wheel, Esc quits.
pub fn key_action(key: &Key, config: &WheelConfig) -> Option<KeyAction> {
    let step = config.calibration_step_degrees.to_radians();
    let nudge = config.nudge_step;
    let command = match key {
        Key::Named(NamedKey::Escape) => return Some(KeyAction::Exit),
        Key::Named(NamedKey::Space) | Key::Named(NamedKey::Enter) => WheelCommand::Spin,
        Key::Named(NamedKey::ArrowLeft) => WheelCommand::AdjustOffset(Offset::Image, -step),
        Key::Named(NamedKey::ArrowRight) => WheelCommand::AdjustOffset(Offset::Image, step),
        Key::Named(NamedKey::ArrowUp) => WheelCommand::AdjustOffset(Offset::Pointer, step),
        Key::Named(NamedKey::ArrowDown) => WheelCommand::AdjustOffset(Offset::Pointer, -step),
        Key::Character(c) => match c.as_str().to_ascii_lowercase().as_str() {
            "c" => WheelCommand::ToggleCalibration,
            "r" => WheelCommand::ResetCalibration,
            "w" => WheelCommand::Nudge(0, -nudge),
            "s" => WheelCommand::Nudge(0, nudge),
            "a" => WheelCommand::Nudge(-nudge, 0),
            "d" => WheelCommand::Nudge(nudge, 0),
            _ => return None,
        },
        _ => return None,
    };
    Some(KeyAction::Wheel(command))
}

/// Per-session UI state that sits between the input sources and the wheel.
#[derive(Debug, Clone)]
pub struct Controls {
    debouncer: Debouncer,
    show_calibration: bool,
}

impl Controls {
    pub fn new(config: &WheelConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce),
            show_calibration: false,
        }
    }

    pub fn show_calibration(&self) -> bool {
        self.show_calibration
    }

    /// Apply one command. Spin requests go through the debouncer; a busy
    /// wheel only logs the rejection.
    pub fn apply(&mut self, wheel: &mut Wheel, command: WheelCommand, now: f64) {
        let spin = match command {
            WheelCommand::Spin | WheelCommand::SpinTo(_) if !self.debouncer.accept(now) => {
                debug!("spin request debounced");
                return;
            }
            WheelCommand::Spin => wheel.spin(now),
            WheelCommand::SpinTo(index) => wheel.spin_to(now, index),
            WheelCommand::AdjustOffset(offset, delta) => {
                wheel.calibration_mut().adjust(offset, delta);
                return;
            }
            WheelCommand::ResetCalibration => {
                wheel.calibration_mut().reset();
                return;
            }
            WheelCommand::ToggleCalibration => {
                self.show_calibration = !self.show_calibration;
                return;
            }
            WheelCommand::Nudge(dx, dy) => {
                wheel.calibration_mut().nudge(dx, dy);
                return;
            }
        };
        if let Err(err) = spin {
            warn!("spin request ignored: {err}");
        }
    }
}

// ============================================================================
// WINDOW LOOP
// ============================================================================

/// Load the label font from `path`, falling back to common system fonts.
pub fn load_font(path: Option<&Path>) -> Option<Font<'static>> {
    let candidates = path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FALLBACK_FONTS.iter().map(PathBuf::from));
    for candidate in candidates {
        match std::fs::read(&candidate) {
            Ok(data) => match Font::try_from_vec(data) {
                Some(font) => {
                    info!("using font {}", candidate.display());
                    return Some(font);
                }
                None => warn!("{} is not a usable font", candidate.display()),
            },
            Err(err) => debug!("font {} unavailable: {err}", candidate.display()),
        }
    }
    warn!("no font found, labels will not be drawn");
    None
}

impl Wheel {
    pub fn show(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.run_window(None)
    }

    pub fn show_with_commands(
        &mut self,
        receiver: Receiver<WheelCommand>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.run_window(Some(receiver))
    }

    fn run_window(
        &mut self,
        receiver: Option<Receiver<WheelCommand>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let logical_width: usize = self.config.window_width;
        let logical_height: usize = self.config.window_height;

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(
                logical_width as f64,
                logical_height as f64,
            ))
            .with_resizable(false)
            .with_fullscreen(self.config.fullscreen.then_some(Fullscreen::Borderless(None)))
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();
        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let font = load_font(self.config.font_path.as_deref());
        let mut labels = LabelLayer::default();
        let mut controls = Controls::new(&self.config);

        let frame_duration = Duration::from_secs_f64(1.0 / self.config.max_framerate);
        let clock = Instant::now();
        let mut last_frame = Instant::now();
        let wheel = self;

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::WaitUntil(last_frame + frame_duration));
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        if let Err(err) = pixels.resize_buffer(new_size.width, new_size.height) {
                            warn!("could not resize frame buffer: {err}");
                        }
                        if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                            warn!("could not resize surface: {err}");
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state != ElementState::Pressed || event.repeat {
                            return;
                        }
                        match key_action(&event.logical_key, wheel.config()) {
                            Some(KeyAction::Exit) => window_target.exit(),
                            Some(KeyAction::Wheel(command)) => {
                                let now = clock.elapsed().as_secs_f64();
                                controls.apply(wheel, command, now);
                            }
                            None => {}
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let now = clock.elapsed().as_secs_f64();
                        if let Some(ref receiver) = receiver {
                            while let Ok(command) = receiver.try_recv() {
                                controls.apply(wheel, command, now);
                            }
                        }
                        wheel.advance(now);

                        if wheel.calibration.take_labels_dirty() {
                            labels = LabelLayer::build(
                                &wheel.config.segment_labels,
                                wheel.calibration.image_offset(),
                            );
                        }

                        let state = FrameState {
                            angle: wheel.angle(),
                            calibration: &wheel.calibration,
                            banner: wheel.current_result(now).map(|result| result.label.as_str()),
                            show_calibration: controls.show_calibration(),
                        };
                        let scene = build_scene(
                            fb_width,
                            fb_height,
                            &state,
                            &labels,
                            &wheel.config,
                            font.as_ref(),
                        );
                        let mut canvas = Canvas::new(pixels.frame_mut(), fb_width, fb_height);
                        scene.render(&mut canvas, font.as_ref());
                        if let Err(err) = pixels.render() {
                            warn!("render failed: {err}");
                            window_target.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_duration {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel() -> Wheel {
        Wheel::new(
            WheelConfig::builder()
                .seed(11)
                .spin_duration(4.0)
                .min_turns(3.0)
                .max_turns(5.0)
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn test_key_bindings() {
        let config = WheelConfig::default();
        let step = 1f64.to_radians();
        assert_eq!(
            key_action(&Key::Named(NamedKey::Space), &config),
            Some(KeyAction::Wheel(WheelCommand::Spin))
        );
        assert_eq!(
            key_action(&Key::Named(NamedKey::Escape), &config),
            Some(KeyAction::Exit)
        );
        assert_eq!(
            key_action(&Key::Named(NamedKey::ArrowLeft), &config),
            Some(KeyAction::Wheel(WheelCommand::AdjustOffset(Offset::Image, -step)))
        );
        assert_eq!(
            key_action(&Key::Named(NamedKey::ArrowUp), &config),
            Some(KeyAction::Wheel(WheelCommand::AdjustOffset(Offset::Pointer, step)))
        );
        assert_eq!(
            key_action(&Key::Character("C".into()), &config),
            Some(KeyAction::Wheel(WheelCommand::ToggleCalibration))
        );
        assert_eq!(
            key_action(&Key::Character("w".into()), &config),
            Some(KeyAction::Wheel(WheelCommand::Nudge(0, -6)))
        );
        assert_eq!(key_action(&Key::Character("q".into()), &config), None);
    }

    #[test]
    fn test_controls_reject_spin_while_busy() {
        let mut wheel = wheel();
        let mut controls = Controls::new(wheel.config());
        controls.apply(&mut wheel, WheelCommand::Spin, 0.0);
        assert!(wheel.is_spinning());
        let delta = wheel.animator().total_delta();

        controls.apply(&mut wheel, WheelCommand::Spin, 1.0);
        controls.apply(&mut wheel, WheelCommand::SpinTo(2), 2.0);
        assert_eq!(wheel.animator().total_delta(), delta);
        assert_eq!(wheel.animator().start_time(), 0.0);

        assert_eq!(wheel.advance(4.0), AnimationStatus::Finished);
        controls.apply(&mut wheel, WheelCommand::SpinTo(2), 5.0);
        assert!(wheel.is_spinning());
        assert_eq!(wheel.advance(10.0), AnimationStatus::Finished);
        assert_eq!(wheel.result().map(|r| r.index), Some(2));
    }

    #[test]
    fn test_controls_debounce_rapid_presses() {
        let mut wheel = Wheel::new(
            WheelConfig::builder()
                .seed(3)
                .spin_duration(0.1)
                .min_turns(1.0)
                .max_turns(1.0)
                .build(),
        )
        .unwrap();
        let mut controls = Controls::new(wheel.config());
        controls.apply(&mut wheel, WheelCommand::Spin, 0.0);
        assert_eq!(wheel.advance(0.12), AnimationStatus::Finished);

        // idle wheel, but the press comes too soon after the last one
        controls.apply(&mut wheel, WheelCommand::Spin, 0.15);
        assert!(!wheel.is_spinning());

        controls.apply(&mut wheel, WheelCommand::Spin, 0.25);
        assert!(wheel.is_spinning());
        assert_eq!(wheel.animator().start_time(), 0.25);
    }

    #[test]
    fn test_controls_calibration_commands() {
        let mut wheel = wheel();
        let mut controls = Controls::new(wheel.config());
        controls.apply(&mut wheel, WheelCommand::ToggleCalibration, 0.0);
        assert!(controls.show_calibration());
        controls.apply(&mut wheel, WheelCommand::AdjustOffset(Offset::Pointer, 0.5), 0.0);
        controls.apply(&mut wheel, WheelCommand::Nudge(6, 0), 0.0);
        assert!((wheel.calibration().pointer_offset() - 0.5).abs() < 1e-12);
        assert_eq!(wheel.calibration().position_nudge(), (6, 0));
        controls.apply(&mut wheel, WheelCommand::ResetCalibration, 0.0);
        assert_eq!(wheel.calibration().pointer_offset(), 0.0);
        assert!(!wheel.is_spinning());
    }
}
