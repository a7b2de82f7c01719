// ============================================================================
// WHEEL RENDERING
// ============================================================================
//
// Retained mode: each frame builds a `Scene` of `DrawCommand`s from the wheel
// state, then rasterises it into the RGBA pixels frame.

use rusttype::{point, Font, PositionedGlyph, Scale};
use std::f64::consts::FRAC_PI_2;

use crate::angle::{display_degrees, wrap_angle, TAU};
use crate::calibration::{Calibration, Offset};
use crate::config::WheelConfig;

type Rgb = (u8, u8, u8);

/// Share of a segment's arc its label may occupy.
const LABEL_ARC_SHARE: f64 = 0.80 * 0.90;
const SHADOW_OFFSET: i32 = 2;

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

#[derive(Clone, Debug)]
pub(crate) enum DrawCommand {
    Clear(Rgb),
    WheelFace {
        cx: i32,
        cy: i32,
        outer_r: f64,
        hub_r: f64,
        rotation: f64,
        colors: Vec<Rgb>,
        segment_count: usize,
    },
    Ring {
        cx: i32,
        cy: i32,
        r: i32,
        thickness: i32,
        color: Rgb,
    },
    Line {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        thickness: f32,
        color: Rgb,
    },
    Circle {
        cx: i32,
        cy: i32,
        radius: i32,
        color: Rgb,
    },
    Triangle {
        points: [(f64, f64); 3],
        fill: Rgb,
        outline: Rgb,
        outline_thickness: f32,
    },
    Rect {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Rgb,
        alpha: f32,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font_size: f32,
        color: Rgb,
    },
    CurvedText {
        cx: i32,
        cy: i32,
        radius: f64,
        text: String,
        font_size: f32,
        arc_span: f64,
        center_angle: f64,
        color: Rgb,
        shadow: Rgb,
    },
}

pub(crate) struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub(crate) fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub(crate) fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    #[cfg(test)]
    pub(crate) fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub(crate) fn render(&self, canvas: &mut Canvas, font: Option<&Font>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => canvas.clear(*color),
                DrawCommand::WheelFace {
                    cx,
                    cy,
                    outer_r,
                    hub_r,
                    rotation,
                    colors,
                    segment_count,
                } => {
                    render_wheel_face(
                        canvas,
                        *cx,
                        *cy,
                        *outer_r,
                        *hub_r,
                        *rotation,
                        colors,
                        *segment_count,
                    );
                }
                DrawCommand::Ring {
                    cx,
                    cy,
                    r,
                    thickness,
                    color,
                } => {
                    render_ring_immediate(canvas, *cx, *cy, *r, *thickness, *color);
                }
                DrawCommand::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    thickness,
                    color,
                } => {
                    draw_thick_line_aa(canvas, *x0, *y0, *x1, *y1, *thickness, *color);
                }
                DrawCommand::Circle {
                    cx,
                    cy,
                    radius,
                    color,
                } => {
                    draw_circle(canvas, *cx, *cy, *radius, *color);
                }
                DrawCommand::Triangle {
                    points,
                    fill,
                    outline,
                    outline_thickness,
                } => {
                    fill_triangle(canvas, points, *fill);
                    for i in 0..3 {
                        let (a, b) = (points[i], points[(i + 1) % 3]);
                        draw_thick_line_aa(
                            canvas,
                            a.0.round() as i32,
                            a.1.round() as i32,
                            b.0.round() as i32,
                            b.1.round() as i32,
                            *outline_thickness,
                            *outline,
                        );
                    }
                }
                DrawCommand::Rect {
                    x,
                    y,
                    w,
                    h,
                    color,
                    alpha,
                } => {
                    fill_rect(canvas, *x, *y, *w, *h, *color, *alpha);
                }
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font_size,
                    color,
                } => {
                    if let Some(font) = font {
                        draw_text(
                            canvas,
                            *x,
                            *y,
                            text,
                            font,
                            Scale::uniform(*font_size),
                            *color,
                        );
                    }
                }
                DrawCommand::CurvedText {
                    cx,
                    cy,
                    radius,
                    text,
                    font_size,
                    arc_span,
                    center_angle,
                    color,
                    shadow,
                } => {
                    if let Some(font) = font {
                        let scale = Scale::uniform(*font_size);
                        for (offset, color) in [(SHADOW_OFFSET, *shadow), (0, *color)] {
                            draw_curved_text(
                                canvas,
                                *cx + offset,
                                *cy + offset,
                                *radius,
                                text,
                                font,
                                scale,
                                *arc_span,
                                *center_angle,
                                color,
                            );
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    fn clear(&mut self, color: Rgb) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.0, color.1, color.2, 0xff]);
        }
    }

    /// Alpha-blend `color` over the pixel at `(x, y)`. Out of bounds is a no-op.
    fn blend(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 4;
        let a = alpha.clamp(0.0, 1.0);
        let mix = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        let pixel = &mut self.frame[idx..idx + 4];
        pixel[0] = mix(color.0, pixel[0]);
        pixel[1] = mix(color.1, pixel[1]);
        pixel[2] = mix(color.2, pixel[2]);
        pixel[3] = 0xff;
    }
}

/// Where the wheel sits in the window for the current frame size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WheelGeometry {
    pub cx: i32,
    pub cy: i32,
    pub r: f64,
    pub hub_r: f64,
    pub label_r: f64,
}

impl WheelGeometry {
    pub(crate) fn new(width: usize, height: usize, config: &WheelConfig, nudge: (i32, i32)) -> Self {
        let r = width.min(height) as f64 * config.wheel_radius_factor;
        let hub_r = r * config.hub_radius_factor;
        Self {
            cx: width as i32 / 2 + nudge.0,
            cy: height as i32 / 2 + nudge.1,
            r,
            hub_r,
            label_r: hub_r + (r - hub_r) * config.label_radius_factor,
        }
    }
}

/// One label, positioned in wheel-local angles.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LabelPlacement {
    pub text: String,
    pub center_angle: f64,
    pub max_arc: f64,
}

/// Label positions with the image offset baked in. Rebuilt only when the
/// image offset changes; the wheel rotation is added per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LabelLayer {
    placements: Vec<LabelPlacement>,
}

impl LabelLayer {
    pub(crate) fn build(labels: &[String], image_offset: f64) -> Self {
        let segment_width = TAU / labels.len().max(1) as f64;
        let placements = labels
            .iter()
            .enumerate()
            .map(|(i, text)| LabelPlacement {
                text: text.clone(),
                center_angle: wrap_angle((i as f64 + 0.5) * segment_width + image_offset),
                max_arc: segment_width * LABEL_ARC_SHARE,
            })
            .collect();
        Self { placements }
    }

    pub(crate) fn placements(&self) -> &[LabelPlacement] {
        &self.placements
    }
}

/// Everything the renderer reads from the wheel for one frame.
pub(crate) struct FrameState<'a> {
    pub angle: f64,
    pub calibration: &'a Calibration,
    pub banner: Option<&'a str>,
    pub show_calibration: bool,
}

// ============================================================================
// SCENE CONSTRUCTION
// ============================================================================

pub(crate) fn build_scene(
    width: usize,
    height: usize,
    state: &FrameState,
    labels: &LabelLayer,
    config: &WheelConfig,
    font: Option<&Font>,
) -> Scene {
    let mut scene = Scene::new();
    scene.add_command(DrawCommand::Clear(config.background_color.as_tuple()));

    let geometry = WheelGeometry::new(width, height, config, state.calibration.position_nudge());
    let segment_count = config.segment_count().max(1);
    let colors: Vec<Rgb> = config.segment_colors.iter().map(|c| c.as_tuple()).collect();

    scene.add_command(DrawCommand::WheelFace {
        cx: geometry.cx,
        cy: geometry.cy,
        outer_r: geometry.r,
        hub_r: geometry.hub_r,
        rotation: state.angle,
        colors,
        segment_count,
    });

    // Dividers between segments
    let segment_width = TAU / segment_count as f64;
    if segment_count > 1 {
        for i in 0..segment_count {
            let angle = state.angle + i as f64 * segment_width;
            let (cos, sin) = (angle.cos(), angle.sin());
            scene.add_command(DrawCommand::Line {
                x0: (geometry.cx as f64 + cos * geometry.hub_r).round() as i32,
                y0: (geometry.cy as f64 + sin * geometry.hub_r).round() as i32,
                x1: (geometry.cx as f64 + cos * geometry.r).round() as i32,
                y1: (geometry.cy as f64 + sin * geometry.r).round() as i32,
                thickness: 2.0,
                color: config.rim_color.as_tuple(),
            });
        }
    }

    scene.add_command(DrawCommand::Ring {
        cx: geometry.cx,
        cy: geometry.cy,
        r: geometry.r.round() as i32,
        thickness: 6,
        color: config.rim_color.as_tuple(),
    });
    scene.add_command(DrawCommand::Circle {
        cx: geometry.cx,
        cy: geometry.cy,
        radius: (geometry.hub_r * 0.35).round() as i32,
        color: config.rim_color.as_tuple(),
    });

    for placement in labels.placements() {
        scene.add_command(DrawCommand::CurvedText {
            cx: geometry.cx,
            cy: geometry.cy,
            radius: geometry.label_r,
            text: placement.text.clone(),
            font_size: config.label_font_size,
            arc_span: placement.max_arc,
            center_angle: placement.center_angle + state.angle,
            color: config.text_color.as_tuple(),
            shadow: config.shadow_color.as_tuple(),
        });
    }

    if state.show_calibration {
        add_calibration_overlay(&mut scene, state.calibration, config, font);
    }

    // The pointer is drawn at its fixed screen position; the pointer offset
    // only changes what the resolver reads.
    scene.add_command(pointer_triangle(&geometry, config));

    if let Some(label) = state.banner {
        add_result_banner(&mut scene, width, height, label, config, font);
    }

    scene
}

fn pointer_triangle(geometry: &WheelGeometry, config: &WheelConfig) -> DrawCommand {
    let base = config.pointer_base_angle;
    let (dir_x, dir_y) = (base.cos(), base.sin());
    let (perp_x, perp_y) = (-dir_y, dir_x);
    let length = geometry.r * config.pointer_length_factor;
    let half_width = geometry.r * config.pointer_half_width_factor;
    // tip rests just inside the rim, base sits outside the wheel
    let tip_r = geometry.r - length * 0.4;
    let base_r = tip_r + length;
    let (cx, cy) = (geometry.cx as f64, geometry.cy as f64);
    let tip = (cx + dir_x * tip_r, cy + dir_y * tip_r);
    let base_center = (cx + dir_x * base_r, cy + dir_y * base_r);
    DrawCommand::Triangle {
        points: [
            tip,
            (
                base_center.0 + perp_x * half_width,
                base_center.1 + perp_y * half_width,
            ),
            (
                base_center.0 - perp_x * half_width,
                base_center.1 - perp_y * half_width,
            ),
        ],
        fill: config.pointer_color.as_tuple(),
        outline: config.pointer_outline_color.as_tuple(),
        outline_thickness: 3.0,
    }
}

fn add_result_banner(
    scene: &mut Scene,
    width: usize,
    height: usize,
    label: &str,
    config: &WheelConfig,
    font: Option<&Font>,
) {
    let (cx, cy) = (width as i32 / 2, height as i32 / 2);
    let text_width = font
        .map(|font| calculate_text_width(label, font, Scale::uniform(config.result_font_size)))
        .unwrap_or(0);
    let (box_w, box_h) = (
        text_width + 80,
        (config.result_font_size * 1.8).round() as i32,
    );
    scene.add_command(DrawCommand::Rect {
        x: cx - box_w / 2,
        y: cy - box_h / 2,
        w: box_w,
        h: box_h,
        color: (0x00, 0x00, 0x00),
        alpha: 0.7,
    });
    scene.add_command(DrawCommand::Text {
        x: cx,
        y: cy,
        text: label.to_string(),
        font_size: config.result_font_size,
        color: config.text_color.as_tuple(),
    });
}

/// Text lines of the calibration overlay.
pub(crate) fn calibration_lines(calibration: &Calibration) -> [String; 4] {
    [
        "CALIBRATION".to_string(),
        format!(
            "Image offset   (Left/Right): {:6.2}°",
            display_degrees(calibration.get(Offset::Image))
        ),
        format!(
            "Pointer offset (Up/Down):    {:6.2}°",
            display_degrees(calibration.get(Offset::Pointer))
        ),
        "R = reset  C = hide  WASD = move".to_string(),
    ]
}

fn add_calibration_overlay(
    scene: &mut Scene,
    calibration: &Calibration,
    config: &WheelConfig,
    font: Option<&Font>,
) {
    scene.add_command(DrawCommand::Rect {
        x: 12,
        y: 12,
        w: 420,
        h: 120,
        color: (0x00, 0x00, 0x00),
        alpha: 0.55,
    });
    let scale = Scale::uniform(config.overlay_font_size);
    let mut y = 34;
    for (k, line) in calibration_lines(calibration).into_iter().enumerate() {
        let color = if k == 0 {
            (0xff, 0xe6, 0x96)
        } else {
            (0xf0, 0xf0, 0xf0)
        };
        // draw_text centres on x, so shift by half the width to left-align
        let half = font
            .map(|font| calculate_text_width(&line, font, scale) / 2)
            .unwrap_or(0);
        scene.add_command(DrawCommand::Text {
            x: 24 + half,
            y,
            text: line,
            font_size: config.overlay_font_size,
            color,
        });
        y += 26;
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn calculate_text_width(text: &str, font: &Font, scale: Scale) -> i32 {
    let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, 0.0)).collect();
    let (min_x, max_x) = glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .fold((i32::MAX, i32::MIN), |(min_x, max_x), bb| {
            (min_x.min(bb.min.x), max_x.max(bb.max.x))
        });
    if min_x < max_x {
        max_x - min_x
    } else {
        0
    }
}

/// Segment color index for a wheel-local angle.
fn segment_at(local_angle: f64, segment_count: usize) -> usize {
    let width = TAU / segment_count as f64;
    ((wrap_angle(local_angle) / width) as usize).min(segment_count - 1)
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn render_wheel_face(
    canvas: &mut Canvas,
    cx: i32,
    cy: i32,
    outer_r: f64,
    hub_r: f64,
    rotation: f64,
    colors: &[Rgb],
    segment_count: usize,
) {
    if colors.is_empty() || segment_count == 0 {
        return;
    }
    let reach = outer_r.ceil() as i32 + 1;
    for y in (cy - reach).max(0)..(cy + reach).min(canvas.height as i32) {
        for x in (cx - reach).max(0)..(cx + reach).min(canvas.width as i32) {
            let dx = (x - cx) as f64;
            let dy = (y - cy) as f64;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > outer_r + 1.0 || dist < hub_r - 1.0 {
                continue;
            }
            let aa = if dist > outer_r {
                1.0 - (dist - outer_r)
            } else if dist < hub_r {
                1.0 - (hub_r - dist)
            } else {
                1.0
            };
            let local = dy.atan2(dx) - rotation;
            let color = colors[segment_at(local, segment_count) % colors.len()];
            canvas.blend(x as usize, y as usize, color, aa as f32);
        }
    }
}

fn render_ring_immediate(canvas: &mut Canvas, cx: i32, cy: i32, r: i32, thickness: i32, color: Rgb) {
    let reach = r + 2;
    for y in (cy - reach).max(0)..(cy + reach).min(canvas.height as i32) {
        for x in (cx - reach).max(0)..(cx + reach).min(canvas.width as i32) {
            let dx = x - cx;
            let dy = y - cy;
            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            let aa = if dist > r as f64 {
                1.0 - (dist - r as f64).min(1.0)
            } else if dist < (r - thickness) as f64 {
                1.0 - ((r - thickness) as f64 - dist).min(1.0)
            } else {
                1.0
            };
            if dist >= (r - thickness - 1) as f64 && dist <= (r + 1) as f64 && aa > 0.0 {
                canvas.blend(x as usize, y as usize, color, aa as f32);
            }
        }
    }
}

fn fill_rect(canvas: &mut Canvas, x: i32, y: i32, w: i32, h: i32, color: Rgb, alpha: f32) {
    for py in y.max(0)..(y + h).min(canvas.height as i32) {
        for px in x.max(0)..(x + w).min(canvas.width as i32) {
            canvas.blend(px as usize, py as usize, color, alpha);
        }
    }
}

fn fill_triangle(canvas: &mut Canvas, points: &[(f64, f64); 3], color: Rgb) {
    let edge = |a: (f64, f64), b: (f64, f64), p: (f64, f64)| {
        (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
    };
    let area = edge(points[0], points[1], points[2]);
    if area == 0.0 {
        return;
    }
    let min_x = points.iter().map(|p| p.0).fold(f64::MAX, f64::min).floor() as i32;
    let max_x = points.iter().map(|p| p.0).fold(f64::MIN, f64::max).ceil() as i32;
    let min_y = points.iter().map(|p| p.1).fold(f64::MAX, f64::min).floor() as i32;
    let max_y = points.iter().map(|p| p.1).fold(f64::MIN, f64::max).ceil() as i32;
    for y in min_y.max(0)..=max_y.min(canvas.height as i32 - 1) {
        for x in min_x.max(0)..=max_x.min(canvas.width as i32 - 1) {
            let p = (x as f64 + 0.5, y as f64 + 0.5);
            let w0 = edge(points[1], points[2], p) * area.signum();
            let w1 = edge(points[2], points[0], p) * area.signum();
            let w2 = edge(points[0], points[1], p) * area.signum();
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                canvas.blend(x as usize, y as usize, color, 1.0);
            }
        }
    }
}

fn draw_thick_line_aa(
    canvas: &mut Canvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: f32,
    color: Rgb,
) {
    let min_x = x0.min(x1) - thickness.ceil() as i32 - 1;
    let max_x = x0.max(x1) + thickness.ceil() as i32 + 1;
    let min_y = y0.min(y1) - thickness.ceil() as i32 - 1;
    let max_y = y0.max(y1) + thickness.ceil() as i32 + 1;
    let dx = (x1 - x0) as f32;
    let dy = (y1 - y0) as f32;
    let len_sq = (dx * dx + dy * dy).max(f32::EPSILON);
    for y in min_y.max(0)..=max_y {
        for x in min_x.max(0)..=max_x {
            let px = x as f32 - x0 as f32;
            let py = y as f32 - y0 as f32;
            let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
            let lx = x0 as f32 + t * dx;
            let ly = y0 as f32 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                canvas.blend(x as usize, y as usize, color, aa);
            }
        }
    }
}

fn draw_text(
    canvas: &mut Canvas,
    x: i32,
    y: i32,
    text: &str,
    font: &Font,
    scale: Scale,
    color: Rgb,
) {
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    let width_px = if min_x < max_x { max_x - min_x } else { 0 };
    let height_px = if min_y < max_y { max_y - min_y } else { 0 };
    let offset_x = x - width_px / 2;
    let offset_y = y - height_px / 2;
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                if px >= 0 && py >= 0 {
                    canvas.blend(px as usize, py as usize, color, v);
                }
            });
        }
    }
}

/// Lay `text` along an arc centred on `center_angle`.
///
/// Labels whose centre falls on the lower half of the wheel run the other
/// way round so they never read upside down.
fn draw_curved_text(
    canvas: &mut Canvas,
    cx: i32,
    cy: i32,
    radius: f64,
    text: &str,
    font: &Font,
    scale: Scale,
    arc_span: f64,
    center_angle: f64,
    color: Rgb,
) {
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();

    let (Some(first), Some(last)) = (glyphs.first(), glyphs.last()) else {
        return;
    };
    let total_width = (last.position().x - first.position().x
        + last.unpositioned().h_metrics().advance_width) as f64;
    if total_width <= 0.0 || radius <= 0.0 {
        return;
    }

    let natural_span = total_width / radius;
    let actual_arc_span = natural_span.min(arc_span);
    let squeeze = actual_arc_span / natural_span;

    let flipped = center_angle.sin() > 0.0;
    let (start_angle, direction, tilt) = if flipped {
        (center_angle + actual_arc_span / 2.0, -1.0, -FRAC_PI_2)
    } else {
        (center_angle - actual_arc_span / 2.0, 1.0, FRAC_PI_2)
    };

    let first_position = first.position().x as f64;
    for glyph in &glyphs {
        if glyph.pixel_bounding_box().is_some() {
            let char_advance = glyph.unpositioned().h_metrics().advance_width as f64;
            let relative_position = glyph.position().x as f64 - first_position + char_advance / 2.0;
            let char_angle = start_angle + direction * relative_position * squeeze / radius;

            let char_x = cx as f64 + char_angle.cos() * radius;
            let char_y = cy as f64 + char_angle.sin() * radius;

            draw_rotated_glyph(canvas, glyph, char_x, char_y, char_angle + tilt, color);
        }
    }
}

fn draw_rotated_glyph(
    canvas: &mut Canvas,
    glyph: &PositionedGlyph,
    center_x: f64,
    center_y: f64,
    rotation: f64,
    color: Rgb,
) {
    if let Some(bb) = glyph.pixel_bounding_box() {
        let cos_r = rotation.cos();
        let sin_r = rotation.sin();

        let glyph_center_x = (bb.min.x + bb.max.x) as f64 / 2.0;
        let glyph_center_y = (bb.min.y + bb.max.y) as f64 / 2.0;

        glyph.draw(|gx, gy, v| {
            if v > 0.001 {
                let local_x = gx as f64 + bb.min.x as f64 - glyph_center_x;
                let local_y = gy as f64 + bb.min.y as f64 - glyph_center_y;

                let rotated_x = local_x * cos_r - local_y * sin_r;
                let rotated_y = local_x * sin_r + local_y * cos_r;

                draw_antialiased_pixel(
                    canvas,
                    center_x + rotated_x,
                    center_y + rotated_y,
                    color,
                    v,
                );
            }
        });
    }
}

fn draw_antialiased_pixel(canvas: &mut Canvas, x: f64, y: f64, color: Rgb, alpha: f32) {
    let x_floor = x.floor() as i32;
    let y_floor = y.floor() as i32;
    let x_frac = x - x_floor as f64;
    let y_frac = y - y_floor as f64;

    // Bilinear spread over the four nearest pixels
    let samples = [
        (x_floor, y_floor, (1.0 - x_frac) * (1.0 - y_frac)),
        (x_floor + 1, y_floor, x_frac * (1.0 - y_frac)),
        (x_floor, y_floor + 1, (1.0 - x_frac) * y_frac),
        (x_floor + 1, y_floor + 1, x_frac * y_frac),
    ];

    for (px, py, weight) in samples {
        if px >= 0 && px < canvas.width as i32 && py >= 0 && py < canvas.height as i32 {
            let final_alpha = alpha * weight as f32;
            if final_alpha > 0.001 {
                canvas.blend(px as usize, py as usize, color, final_alpha);
            }
        }
    }
}

fn draw_circle(canvas: &mut Canvas, cx: i32, cy: i32, radius: i32, color: Rgb) {
    for y in -radius - 1..=radius + 1 {
        for x in -radius - 1..=radius + 1 {
            let dist = ((x * x + y * y) as f64).sqrt();
            let aa = if dist > radius as f64 {
                1.0 - (dist - radius as f64).min(1.0)
            } else {
                1.0
            };
            if dist <= radius as f64 + 1.0 && aa > 0.0 {
                let px = cx + x;
                let py = cy + y;
                if px >= 0 && py >= 0 {
                    canvas.blend(px as usize, py as usize, color, aa as f32);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SegmentResolver;

    fn pixel(frame: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * width + x) * 4;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    #[test]
    fn test_label_layer_follows_image_offset() {
        let labels: Vec<String> = (0..4).map(|i| i.to_string()).collect();
        let layer = LabelLayer::build(&labels, 0.0);
        let shifted = LabelLayer::build(&labels, 0.5);
        assert_eq!(layer.placements().len(), 4);
        assert!((layer.placements()[1].center_angle - 1.5 * TAU / 4.0).abs() < 1e-12);
        for (a, b) in layer.placements().iter().zip(shifted.placements()) {
            assert!((wrap_angle(b.center_angle - a.center_angle) - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_drawn_segment_under_pointer_matches_resolver() {
        // with zero offsets, the colour drawn under the pointer belongs to the
        // segment the resolver picks
        let count = 8;
        let resolver = SegmentResolver::new(count, -FRAC_PI_2).unwrap();
        for step in 0..40 {
            let rotation = step as f64 * 0.37;
            let local = -FRAC_PI_2 - rotation;
            assert_eq!(segment_at(local, count), resolver.resolve(rotation, 0.0));
        }
    }

    #[test]
    fn test_wheel_face_paints_segment_colors() {
        let (w, h) = (64, 64);
        let mut frame = vec![0u8; w * h * 4];
        let mut canvas = Canvas::new(&mut frame, w, h);
        canvas.clear((0, 0, 0));
        let colors = vec![(255, 0, 0), (0, 0, 255)];
        render_wheel_face(&mut canvas, 32, 32, 30.0, 4.0, 0.0, &colors, 2);
        // angle ~pi/2 (below centre) is segment 0, ~-pi/2 (above) segment 1
        assert_eq!(pixel(&frame, w, 32, 50), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, w, 32, 14), [0, 0, 255, 255]);
        // outside the rim stays background
        assert_eq!(pixel(&frame, w, 1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_scene_without_font_skips_nothing_structural() {
        let config = WheelConfig::default();
        let calibration = Calibration::default();
        let layer = LabelLayer::build(&config.segment_labels, 0.0);
        let state = FrameState {
            angle: 0.3,
            calibration: &calibration,
            banner: Some("Dulce"),
            show_calibration: true,
        };
        let scene = build_scene(200, 200, &state, &layer, &config, None);
        let curved = scene
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::CurvedText { .. }))
            .count();
        assert_eq!(curved, 8);
        assert!(scene
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "Dulce")));

        let mut frame = vec![0u8; 200 * 200 * 4];
        let mut canvas = Canvas::new(&mut frame, 200, 200);
        scene.render(&mut canvas, None);
    }

    #[test]
    fn test_calibration_lines_show_degrees() {
        let calibration = Calibration::new(FRAC_PI_2, -FRAC_PI_2);
        let lines = calibration_lines(&calibration);
        assert!(lines[1].ends_with(" 90.00°"), "{}", lines[1]);
        assert!(lines[2].ends_with("270.00°"), "{}", lines[2]);
    }

    #[test]
    fn test_blend_mixes_and_clips() {
        let (w, h) = (8, 8);
        let mut frame = vec![0u8; w * h * 4];
        let mut canvas = Canvas::new(&mut frame, w, h);
        canvas.clear((0, 0, 0));
        canvas.blend(1, 1, (255, 255, 255), 0.5);
        canvas.blend(2, 1, (10, 20, 30), 1.0);
        canvas.blend(8, 0, (255, 0, 0), 1.0);
        canvas.blend(0, 8, (255, 0, 0), 1.0);
        draw_circle(&mut canvas, 6, 6, 1, (0, 255, 0));
        assert_eq!(pixel(&frame, w, 1, 1), [128, 128, 128, 255]);
        assert_eq!(pixel(&frame, w, 2, 1), [10, 20, 30, 255]);
        assert_eq!(pixel(&frame, w, 6, 6), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, w, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_geometry_respects_nudge() {
        let config = WheelConfig::default();
        let geometry = WheelGeometry::new(900, 900, &config, (6, -12));
        assert_eq!((geometry.cx, geometry.cy), (456, 438));
        assert!(geometry.hub_r < geometry.label_r && geometry.label_r < geometry.r);
    }
}
