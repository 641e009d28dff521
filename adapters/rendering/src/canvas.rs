use glam::Vec2;
use queueboard_core::Role;
use queueboard_system_radar::LayoutRect;

use crate::Color;

/// Paint used to fill a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Brush {
    /// Single color.
    Solid(Color),
    /// Gradient along the segment `from`..`to`, clamped beyond its ends.
    LinearGradient {
        /// Point painted with `start`.
        from: Vec2,
        /// Point painted with `end`.
        to: Vec2,
        /// Color at `from`.
        start: Color,
        /// Color at `to`.
        end: Color,
    },
    /// Gradient by distance from `center`, clamped outside the radii.
    RadialGradient {
        /// Gradient origin.
        center: Vec2,
        /// Distance painted with `inner`.
        inner_radius: f32,
        /// Distance painted with `outer`.
        outer_radius: f32,
        /// Color at `inner_radius`.
        inner: Color,
        /// Color at `outer_radius`.
        outer: Color,
    },
}

impl Brush {
    /// Color the brush paints at `point`.
    #[must_use]
    pub fn color_at(&self, point: Vec2) -> Color {
        match *self {
            Self::Solid(color) => color,
            Self::LinearGradient {
                from,
                to,
                start,
                end,
            } => {
                let axis = to - from;
                let length_squared = axis.length_squared();
                if length_squared <= f32::EPSILON {
                    return start;
                }
                start.mix(end, (point - from).dot(axis) / length_squared)
            }
            Self::RadialGradient {
                center,
                inner_radius,
                outer_radius,
                inner,
                outer,
            } => {
                let span = outer_radius - inner_radius;
                if span <= f32::EPSILON {
                    return outer;
                }
                inner.mix(outer, (point.distance(center) - inner_radius) / span)
            }
        }
    }
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Outline parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Paint applied along the outline.
    pub brush: Brush,
    /// Line width in pixels.
    pub width: f32,
    /// Blur radius of a glow drawn around the line; zero disables it.
    pub glow: f32,
}

impl Stroke {
    /// Solid stroke without glow.
    #[must_use]
    pub const fn solid(color: Color, width: f32) -> Self {
        Self {
            brush: Brush::Solid(color),
            width,
            glow: 0.0,
        }
    }

    /// Adds a glow of the given blur radius.
    #[must_use]
    pub fn with_glow(mut self, glow: f32) -> Self {
        self.glow = glow;
        self
    }
}

/// Horizontal anchoring of a text run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    /// The anchor is the left edge.
    Left,
    /// The anchor is the horizontal center.
    Center,
    /// The anchor is the right edge.
    Right,
}

/// Text appearance; the anchor's y coordinate is the line's vertical center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f32,
    /// Fill color.
    pub color: Color,
    /// Horizontal anchoring.
    pub align: TextAlign,
}

impl TextStyle {
    /// Creates a text style.
    #[must_use]
    pub const fn new(size: f32, color: Color, align: TextAlign) -> Self {
        Self { size, color, align }
    }
}

/// Immediate-mode drawing surface.
///
/// Angles are radians measured clockwise on screen from the positive x axis.
pub trait Canvas {
    /// Drawable area in pixels.
    fn size(&self) -> Vec2;

    /// Draws a straight line.
    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke);

    /// Fills a rectangle.
    fn fill_rect(&mut self, rect: LayoutRect, brush: Brush);

    /// Outlines a rectangle.
    fn stroke_rect(&mut self, rect: LayoutRect, stroke: Stroke);

    /// Fills a circle.
    fn fill_circle(&mut self, center: Vec2, radius: f32, brush: Brush);

    /// Fills a pie wedge between two angles.
    fn fill_wedge(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, brush: Brush);

    /// Strokes a circular arc between two angles.
    fn stroke_arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, stroke: Stroke);

    /// Draws a single line of text.
    fn text(&mut self, text: &str, anchor: Vec2, style: TextStyle);

    /// Draws a role icon scaled into `rect`.
    fn icon(&mut self, role: Role, rect: LayoutRect, alpha: f32);
}

/// Canvas call captured by [`RecordingCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`Canvas::line`].
    Line {
        /// Start point.
        from: Vec2,
        /// End point.
        to: Vec2,
        /// Stroke used.
        stroke: Stroke,
    },
    /// [`Canvas::fill_rect`].
    FillRect {
        /// Filled rectangle.
        rect: LayoutRect,
        /// Fill paint.
        brush: Brush,
    },
    /// [`Canvas::stroke_rect`].
    StrokeRect {
        /// Outlined rectangle.
        rect: LayoutRect,
        /// Stroke used.
        stroke: Stroke,
    },
    /// [`Canvas::fill_circle`].
    FillCircle {
        /// Circle center.
        center: Vec2,
        /// Circle radius.
        radius: f32,
        /// Fill paint.
        brush: Brush,
    },
    /// [`Canvas::fill_wedge`].
    FillWedge {
        /// Pie center.
        center: Vec2,
        /// Wedge radius.
        radius: f32,
        /// Start angle.
        start_angle: f32,
        /// End angle.
        end_angle: f32,
        /// Fill paint.
        brush: Brush,
    },
    /// [`Canvas::stroke_arc`].
    StrokeArc {
        /// Arc center.
        center: Vec2,
        /// Arc radius.
        radius: f32,
        /// Start angle.
        start_angle: f32,
        /// End angle.
        end_angle: f32,
        /// Stroke used.
        stroke: Stroke,
    },
    /// [`Canvas::text`].
    Text {
        /// Drawn text.
        text: String,
        /// Anchor point.
        anchor: Vec2,
        /// Text style.
        style: TextStyle,
    },
    /// [`Canvas::icon`].
    Icon {
        /// Role whose icon was drawn.
        role: Role,
        /// Destination rectangle.
        rect: LayoutRect,
        /// Opacity.
        alpha: f32,
    },
}

/// Canvas that records every call instead of drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingCanvas {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    /// Creates an empty recording of the given size.
    #[must_use]
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    /// Commands recorded so far, in call order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Consumes the recording.
    #[must_use]
    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Text runs recorded so far, in call order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Discards all recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke });
    }

    fn fill_rect(&mut self, rect: LayoutRect, brush: Brush) {
        self.commands.push(DrawCommand::FillRect { rect, brush });
    }

    fn stroke_rect(&mut self, rect: LayoutRect, stroke: Stroke) {
        self.commands.push(DrawCommand::StrokeRect { rect, stroke });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, brush: Brush) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            brush,
        });
    }

    fn fill_wedge(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, brush: Brush) {
        self.commands.push(DrawCommand::FillWedge {
            center,
            radius,
            start_angle,
            end_angle,
            brush,
        });
    }

    fn stroke_arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, stroke: Stroke) {
        self.commands.push(DrawCommand::StrokeArc {
            center,
            radius,
            start_angle,
            end_angle,
            stroke,
        });
    }

    fn text(&mut self, text: &str, anchor: Vec2, style: TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            anchor,
            style,
        });
    }

    fn icon(&mut self, role: Role, rect: LayoutRect, alpha: f32) {
        self.commands.push(DrawCommand::Icon { role, rect, alpha });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_gradient_clamps_beyond_its_ends() {
        let brush = Brush::LinearGradient {
            from: Vec2::ZERO,
            to: Vec2::new(10.0, 0.0),
            start: Color::new(0.0, 0.0, 0.0, 1.0),
            end: Color::new(1.0, 1.0, 1.0, 1.0),
        };
        assert_eq!(brush.color_at(Vec2::new(-5.0, 3.0)).red, 0.0);
        assert!((brush.color_at(Vec2::new(5.0, 8.0)).red - 0.5).abs() < 1e-6);
        assert_eq!(brush.color_at(Vec2::new(50.0, 0.0)).red, 1.0);
    }

    #[test]
    fn radial_gradient_depends_on_distance_only() {
        let brush = Brush::RadialGradient {
            center: Vec2::splat(100.0),
            inner_radius: 0.0,
            outer_radius: 20.0,
            inner: Color::new(1.0, 1.0, 1.0, 1.0),
            outer: Color::new(0.0, 0.0, 0.0, 1.0),
        };
        let east = brush.color_at(Vec2::new(110.0, 100.0));
        let north = brush.color_at(Vec2::new(100.0, 90.0));
        assert_eq!(east, north);
        assert!((east.red - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_gradients_do_not_divide_by_zero() {
        let start = Color::from_rgb_u8(1, 2, 3);
        let end = Color::from_rgb_u8(4, 5, 6);
        let linear = Brush::LinearGradient {
            from: Vec2::ONE,
            to: Vec2::ONE,
            start,
            end,
        };
        let radial = Brush::RadialGradient {
            center: Vec2::ZERO,
            inner_radius: 5.0,
            outer_radius: 5.0,
            inner: start,
            outer: end,
        };
        assert_eq!(linear.color_at(Vec2::ZERO), start);
        assert_eq!(radial.color_at(Vec2::ZERO), end);
    }

    #[test]
    fn recording_keeps_call_order() {
        let mut canvas = RecordingCanvas::new(Vec2::new(320.0, 200.0));
        canvas.text("a", Vec2::ZERO, TextStyle::new(10.0, Color::TRANSPARENT, TextAlign::Left));
        canvas.line(Vec2::ZERO, Vec2::ONE, Stroke::solid(Color::TRANSPARENT, 1.0));
        canvas.text("b", Vec2::ZERO, TextStyle::new(10.0, Color::TRANSPARENT, TextAlign::Right));

        assert_eq!(canvas.size(), Vec2::new(320.0, 200.0));
        assert_eq!(canvas.texts(), vec!["a", "b"]);
        assert_eq!(canvas.commands().len(), 3);
        canvas.clear();
        assert!(canvas.into_commands().is_empty());
    }
}
