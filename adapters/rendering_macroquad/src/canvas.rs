//! [`Canvas`] implementation on top of macroquad's immediate-mode shapes.
//!
//! Macroquad has no arcs, gradients or blur, so arcs are polylines, gradients
//! are sampled into bands and glows are drawn as wider translucent strokes
//! underneath the line.

use glam::Vec2;
use macroquad::{
    math::Vec2 as MacroquadVec2,
    shapes::{draw_circle, draw_line, draw_rectangle, draw_triangle},
    text::{draw_text_ex, measure_text, Font, TextParams},
    texture::{draw_texture_ex, DrawTextureParams},
};
use queueboard_core::Role;
use queueboard_rendering::{Brush, Canvas, Color, Stroke, TextAlign, TextStyle};
use queueboard_system_radar::LayoutRect;

use crate::{icons::IconAtlas, to_macroquad_color};

/// Largest angle covered by one polyline segment.
const ARC_STEP_RADIANS: f32 = 0.05;

/// Concentric bands used to approximate radial gradients.
const GRADIENT_BANDS: u32 = 12;

/// Strips used to approximate linear gradients inside rectangles.
const GRADIENT_STRIPS: u32 = 16;

/// Translucent passes drawn under a glowing stroke.
const GLOW_PASSES: u32 = 3;

/// Peak opacity of the innermost glow pass relative to the stroke color.
const GLOW_ALPHA: f32 = 0.25;

pub(crate) struct MacroquadCanvas<'a> {
    size: Vec2,
    font: Option<Font>,
    icons: Option<&'a IconAtlas>,
}

impl<'a> MacroquadCanvas<'a> {
    pub(crate) fn new(size: Vec2, font: Option<Font>, icons: Option<&'a IconAtlas>) -> Self {
        Self { size, font, icons }
    }

    fn fill_sector(&self, center: Vec2, radius: f32, start: f32, end: f32, color: Color) {
        let color = to_macroquad_color(color);
        let points = arc_points(center, radius, start, end);
        for pair in points.windows(2) {
            draw_triangle(
                to_macroquad_vec(center),
                to_macroquad_vec(pair[0]),
                to_macroquad_vec(pair[1]),
                color,
            );
        }
    }

    fn stroke_polyline(&self, points: &[Vec2], stroke: Stroke) {
        for (width, alpha) in glow_passes(stroke) {
            for pair in points.windows(2) {
                let color = stroke.brush.color_at((pair[0] + pair[1]) * 0.5);
                draw_segment(pair[0], pair[1], width, color.with_alpha(alpha));
            }
        }
        for pair in points.windows(2) {
            let color = stroke.brush.color_at((pair[0] + pair[1]) * 0.5);
            draw_segment(pair[0], pair[1], stroke.width, color);
        }
    }
}

impl Canvas for MacroquadCanvas<'_> {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        self.stroke_polyline(&[from, to], stroke);
    }

    fn fill_rect(&mut self, rect: LayoutRect, brush: Brush) {
        if let Brush::Solid(color) = brush {
            draw_rectangle(
                rect.left(),
                rect.top(),
                rect.size.x,
                rect.size.y,
                to_macroquad_color(color),
            );
            return;
        }

        let horizontal = match brush {
            Brush::LinearGradient { from, to, .. } => (to.x - from.x).abs() >= (to.y - from.y).abs(),
            _ => false,
        };
        let strips = GRADIENT_STRIPS as f32;
        for strip in 0..GRADIENT_STRIPS {
            let offset = strip as f32 / strips;
            let (origin, size) = if horizontal {
                (
                    Vec2::new(rect.left() + rect.size.x * offset, rect.top()),
                    Vec2::new(rect.size.x / strips, rect.size.y),
                )
            } else {
                (
                    Vec2::new(rect.left(), rect.top() + rect.size.y * offset),
                    Vec2::new(rect.size.x, rect.size.y / strips),
                )
            };
            let color = brush.color_at(origin + size * 0.5);
            draw_rectangle(origin.x, origin.y, size.x, size.y, to_macroquad_color(color));
        }
    }

    fn stroke_rect(&mut self, rect: LayoutRect, stroke: Stroke) {
        let corners = [
            rect.origin,
            Vec2::new(rect.right(), rect.top()),
            Vec2::new(rect.right(), rect.bottom()),
            Vec2::new(rect.left(), rect.bottom()),
            rect.origin,
        ];
        self.stroke_polyline(&corners, stroke);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, brush: Brush) {
        match brush {
            Brush::Solid(color) => draw_circle(center.x, center.y, radius, to_macroquad_color(color)),
            _ => self.fill_wedge(center, radius, 0.0, std::f32::consts::TAU, brush),
        }
    }

    fn fill_wedge(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, brush: Brush) {
        if radius <= 0.0 {
            return;
        }

        match brush {
            Brush::RadialGradient { .. } => {
                for band in gradient_bands(radius) {
                    let color = brush.color_at(center + Vec2::new(band.sample_distance, 0.0));
                    self.fill_sector(center, band.radius, start_angle, end_angle, color);
                }
            }
            _ => {
                let mid_angle = (start_angle + end_angle) * 0.5;
                let centroid = center + Vec2::new(mid_angle.cos(), mid_angle.sin()) * radius * 0.5;
                self.fill_sector(center, radius, start_angle, end_angle, brush.color_at(centroid));
            }
        }
    }

    fn stroke_arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, stroke: Stroke) {
        if radius <= 0.0 {
            return;
        }
        let points = arc_points(center, radius, start_angle, end_angle);
        self.stroke_polyline(&points, stroke);
    }

    fn text(&mut self, text: &str, anchor: Vec2, style: TextStyle) {
        let font_size = style.size.round().clamp(1.0, f32::from(u16::MAX)) as u16;
        let dimensions = measure_text(text, self.font, font_size, 1.0);
        let x = match style.align {
            TextAlign::Left => anchor.x,
            TextAlign::Center => anchor.x - dimensions.width * 0.5,
            TextAlign::Right => anchor.x - dimensions.width,
        };
        let baseline = anchor.y + dimensions.offset_y * 0.5;

        let mut params = TextParams {
            font_size,
            color: to_macroquad_color(style.color),
            ..TextParams::default()
        };
        if let Some(font) = self.font {
            params.font = font;
        }
        draw_text_ex(text, x, baseline, params);
    }

    fn icon(&mut self, role: Role, rect: LayoutRect, alpha: f32) {
        let texture = self.icons.and_then(|atlas| atlas.texture(role));
        match texture {
            Some(texture) => draw_texture_ex(
                texture,
                rect.left(),
                rect.top(),
                to_macroquad_color(Color::new(1.0, 1.0, 1.0, alpha)),
                DrawTextureParams {
                    dest_size: Some(MacroquadVec2::new(rect.size.x, rect.size.y)),
                    ..DrawTextureParams::default()
                },
            ),
            None => {
                let color = Color::from(role.style().color).with_alpha(alpha);
                let center = rect.center();
                draw_circle(
                    center.x,
                    center.y,
                    rect.size.x.min(rect.size.y) * 0.5,
                    to_macroquad_color(color),
                );
            }
        }
    }
}

fn draw_segment(from: Vec2, to: Vec2, width: f32, color: Color) {
    draw_line(from.x, from.y, to.x, to.y, width, to_macroquad_color(color));
}

fn to_macroquad_vec(point: Vec2) -> MacroquadVec2 {
    MacroquadVec2::new(point.x, point.y)
}

/// Points along an arc, both ends included, at most [`ARC_STEP_RADIANS`] apart.
fn arc_points(center: Vec2, radius: f32, start: f32, end: f32) -> Vec<Vec2> {
    let sweep = end - start;
    let segments = (sweep.abs() / ARC_STEP_RADIANS).ceil().max(1.0) as u32;
    (0..=segments)
        .map(|step| {
            let angle = start + sweep * step as f32 / segments as f32;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Width and opacity of each glow pass, widest first.
fn glow_passes(stroke: Stroke) -> Vec<(f32, f32)> {
    if stroke.glow <= 0.0 {
        return Vec::new();
    }
    (1..=GLOW_PASSES)
        .rev()
        .map(|pass| {
            let share = pass as f32 / GLOW_PASSES as f32;
            (
                stroke.width + 2.0 * stroke.glow * share,
                GLOW_ALPHA * (1.0 - share) + GLOW_ALPHA / GLOW_PASSES as f32,
            )
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct GradientBand {
    radius: f32,
    sample_distance: f32,
}

/// Concentric bands ordered outermost first so inner bands paint over them.
fn gradient_bands(radius: f32) -> Vec<GradientBand> {
    let step = radius / GRADIENT_BANDS as f32;
    (1..=GRADIENT_BANDS)
        .rev()
        .map(|band| {
            let outer = step * band as f32;
            GradientBand {
                radius: outer,
                sample_distance: outer - step * 0.5,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn arc_points_cover_both_ends() {
        let points = arc_points(Vec2::ZERO, 10.0, 0.0, FRAC_PI_2);
        let first = points.first().copied().expect("points");
        let last = points.last().copied().expect("points");
        assert!((first - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert!((last - Vec2::new(0.0, 10.0)).length() < 1e-4);
        assert!(points.len() >= (FRAC_PI_2 / ARC_STEP_RADIANS) as usize);
        assert!(points
            .iter()
            .all(|point| (point.length() - 10.0).abs() < 1e-3));
    }

    #[test]
    fn zero_sweep_arc_is_a_single_segment() {
        let points = arc_points(Vec2::ONE, 5.0, 1.0, 1.0);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], points[1]);
    }

    #[test]
    fn glow_passes_widen_and_fade_outwards() {
        let plain = Stroke::solid(Color::TRANSPARENT, 2.0);
        assert!(glow_passes(plain).is_empty());

        let passes = glow_passes(plain.with_glow(12.0));
        assert_eq!(passes.len(), GLOW_PASSES as usize);
        assert!((passes[0].0 - 26.0).abs() < 1e-4);
        for pair in passes.windows(2) {
            assert!(pair[0].0 > pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
    }

    #[test]
    fn gradient_bands_shrink_towards_the_center() {
        let bands = gradient_bands(120.0);
        assert_eq!(bands.len(), GRADIENT_BANDS as usize);
        assert_eq!(bands[0].radius, 120.0);
        assert!(bands.windows(2).all(|pair| pair[0].radius > pair[1].radius));
        assert!(bands
            .iter()
            .all(|band| band.sample_distance > 0.0 && band.sample_distance < band.radius));
    }
}
