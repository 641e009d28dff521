//! Independent drawing layers of the queue board.
//!
//! Each layer only reads the prepared frame and the theme, so layers can be
//! drawn, skipped or tested on their own. [`draw_queue_radar`] stacks them in
//! the order the board is meant to be read.

use std::f32::consts::TAU;

use chrono::FixedOffset;
use glam::Vec2;
use queueboard_core::format_time_with_offset;
use queueboard_system_match_phase::PhaseView;
use queueboard_system_radar::{
    ChartLayout, LayoutRect, PreviousMatchInfo, QueueStatus, RadarFrame, RESERVED_GAP,
};

use crate::{Brush, Canvas, Color, Stroke, TextAlign, TextStyle, Theme};

/// Width of ring arcs.
const RING_STROKE_WIDTH: f32 = 3.0;

/// Width of the outline drawn between wedges.
const WEDGE_STROKE_WIDTH: f32 = 2.0;

/// Width of the outer rim drawn on each wedge.
const RIM_STROKE_WIDTH: f32 = 3.0;

/// Inner circle radius relative to the chart radius.
const INNER_RADIUS_SHARE: f32 = 0.45;

/// Blur of the border glow around highlighted legend boxes.
const HIGHLIGHT_GLOW: f32 = 12.0;

/// Inner padding of legend boxes.
const LEGEND_PADDING: f32 = 6.0;

/// Inner padding of the info and phase panels.
const PANEL_PADDING: f32 = 10.0;

/// Widest the phase panel gets.
const PHASE_PANEL_MAX_WIDTH: f32 = 320.0;

/// Narrowest phase panel that still fits beside the info panel.
const PHASE_PANEL_MIN_WIDTH: f32 = 180.0;

/// Phase panel line height relative to its font size.
const PANEL_LINE_SPACING: f32 = 1.5;

/// Draws every radar layer in reading order.
pub fn draw_queue_radar(canvas: &mut dyn Canvas, frame: &RadarFrame, theme: &Theme) {
    draw_grid(canvas, theme);
    draw_previous_match_panel(canvas, &frame.layout, &frame.previous_match, theme);
    draw_rings(canvas, frame);
    draw_wedges(canvas, frame, theme);
    draw_center_label(canvas, frame, theme);
    draw_legend(canvas, frame, theme);
}

/// Draws the radar and, when a match is tracked, the phase panel on top.
pub fn draw_scene(
    canvas: &mut dyn Canvas,
    frame: &RadarFrame,
    phase: Option<&PhaseView>,
    theme: &Theme,
) {
    draw_queue_radar(canvas, frame, theme);
    if let Some(view) = phase {
        draw_phase_panel(canvas, &frame.layout, view, theme);
    }
}

/// Square background grid covering the whole canvas.
pub fn draw_grid(canvas: &mut dyn Canvas, theme: &Theme) {
    let size = canvas.size();
    let spacing = theme.grid_spacing.max(1.0);
    let stroke = Stroke::solid(theme.grid_line, 1.0);

    let mut x = 0.0;
    while x <= size.x {
        canvas.line(Vec2::new(x, 0.0), Vec2::new(x, size.y), stroke);
        x += spacing;
    }

    let mut y = 0.0;
    while y <= size.y {
        canvas.line(Vec2::new(0.0, y), Vec2::new(size.x, y), stroke);
        y += spacing;
    }
}

/// Text lines of the previous-match panel.
#[must_use]
pub fn previous_match_lines(info: &PreviousMatchInfo, offset: FixedOffset) -> [String; 3] {
    let matched_count = info
        .matched_count
        .map_or_else(|| "-".to_owned(), |count| format!("{count}人"));

    [
        format!("前回マッチ {}", format_time_with_offset(info.matched_at, offset)),
        format!("前回参加 {matched_count}"),
        format!("進行中 {}試合", info.ongoing_matches),
    ]
}

/// Fixed top-left panel describing the previous match formation.
pub fn draw_previous_match_panel(
    canvas: &mut dyn Canvas,
    layout: &ChartLayout,
    info: &PreviousMatchInfo,
    theme: &Theme,
) {
    let panel = layout.info_panel;
    let font_size = layout.metrics().panel_font_size;
    canvas.fill_rect(panel, Brush::Solid(theme.panel_background));
    canvas.stroke_rect(panel, Stroke::solid(theme.panel_border, 1.0));

    let lines = previous_match_lines(info, theme.display_offset);
    let line_height = (panel.size.y - 2.0 * PANEL_PADDING) / lines.len() as f32;
    for (index, line) in lines.iter().enumerate() {
        let color = if index == 0 {
            theme.text
        } else {
            theme.muted_text
        };
        let anchor = Vec2::new(
            panel.left() + PANEL_PADDING,
            panel.top() + PANEL_PADDING + line_height * (index as f32 + 0.5),
        );
        canvas.text(line, anchor, TextStyle::new(font_size, color, TextAlign::Left));
    }
}

/// Expanding detection rings, oldest first, one arc per visible slice.
pub fn draw_rings(canvas: &mut dyn Canvas, frame: &RadarFrame) {
    let center = frame.layout.center;
    for ring in &frame.rings {
        if ring.fade.alpha <= 0.0 {
            continue;
        }
        for slice in ring.slices.iter().filter(|slice| !slice.is_empty()) {
            let color = Color::from(slice.role.style().color).with_alpha(ring.fade.alpha);
            canvas.stroke_arc(
                center,
                ring.radius,
                slice.start_angle,
                slice.end_angle,
                Stroke::solid(color, RING_STROKE_WIDTH).with_glow(ring.fade.blur),
            );
        }
    }
}

/// Pie wedges with a radial gradient fill, separators and an outer rim.
pub fn draw_wedges(canvas: &mut dyn Canvas, frame: &RadarFrame, theme: &Theme) {
    let center = frame.layout.center;
    let radius = frame.chart_radius;
    let visible: Vec<_> = frame.slices.iter().filter(|slice| !slice.is_empty()).collect();

    for slice in &visible {
        let base = Color::from(slice.role.style().color);
        canvas.fill_wedge(
            center,
            radius,
            slice.start_angle,
            slice.end_angle,
            Brush::RadialGradient {
                center,
                inner_radius: 0.0,
                outer_radius: radius,
                inner: base.lighten(0.35),
                outer: base,
            },
        );
    }

    if visible.len() > 1 {
        let separator = Stroke::solid(theme.wedge_stroke, WEDGE_STROKE_WIDTH);
        for slice in &visible {
            let edge = Vec2::new(slice.start_angle.cos(), slice.start_angle.sin()) * radius;
            canvas.line(center, center + edge, separator);
        }
    }

    for slice in &visible {
        let rim = Color::from(slice.role.style().color).lighten(0.4);
        canvas.stroke_arc(
            center,
            radius,
            slice.start_angle,
            slice.end_angle,
            Stroke::solid(rim, RIM_STROKE_WIDTH),
        );
    }
}

/// Inner circle with the unique waiting count and the status word.
pub fn draw_center_label(canvas: &mut dyn Canvas, frame: &RadarFrame, theme: &Theme) {
    let Some(label) = frame.center_label else {
        return;
    };

    let metrics = frame.layout.metrics();
    let center = frame.layout.center;
    let inner_radius = frame.chart_radius * INNER_RADIUS_SHARE;
    canvas.fill_circle(center, inner_radius, Brush::Solid(theme.inner_circle));
    canvas.stroke_arc(
        center,
        inner_radius,
        0.0,
        TAU,
        Stroke::solid(theme.panel_border, 1.0),
    );

    // Shrink both lines together so they stay inside small circles.
    let scale = (inner_radius / metrics.center_font_size).clamp(0.5, 1.0);
    let count_size = metrics.center_font_size * scale;
    let status_size = metrics.status_font_size * scale;
    let status_color = match label.status {
        QueueStatus::Matching => theme.matching,
        QueueStatus::Waiting => theme.waiting,
    };

    canvas.text(
        &label.total_waiting.to_string(),
        center - Vec2::new(0.0, status_size * 0.6),
        TextStyle::new(count_size, theme.text, TextAlign::Center),
    );
    canvas.text(
        label.status.text(),
        center + Vec2::new(0.0, count_size * 0.55),
        TextStyle::new(
            status_size,
            status_color.with_alpha(label.status_alpha),
            TextAlign::Center,
        ),
    );
}

/// Role boxes with icon, label and count; selected roles glow.
pub fn draw_legend(canvas: &mut dyn Canvas, frame: &RadarFrame, theme: &Theme) {
    let metrics = frame.layout.metrics();

    for entry in &frame.legend {
        let rect = entry.rect;
        let style = entry.role.style();
        let accent = Color::from(style.color);

        canvas.fill_rect(rect, Brush::Solid(theme.panel_background));
        let border = if entry.highlighted {
            Stroke {
                brush: Brush::LinearGradient {
                    from: rect.origin,
                    to: Vec2::new(rect.right(), rect.bottom()),
                    start: accent,
                    end: accent.lighten(0.5),
                },
                width: 2.0,
                glow: HIGHLIGHT_GLOW,
            }
        } else {
            Stroke::solid(theme.panel_border, 1.0)
        };
        canvas.stroke_rect(rect, border);

        let icon_size = metrics
            .icon_size
            .min(rect.size.y - 2.0 * LEGEND_PADDING)
            .max(0.0);
        let icon_rect = LayoutRect::new(
            Vec2::new(
                rect.left() + LEGEND_PADDING,
                rect.center().y - icon_size * 0.5,
            ),
            Vec2::splat(icon_size),
        );
        canvas.icon(entry.role, icon_rect, 1.0);

        let text_x = icon_rect.right() + LEGEND_PADDING;
        canvas.text(
            style.label,
            Vec2::new(text_x, rect.top() + rect.size.y * 0.32),
            TextStyle::new(metrics.label_font_size, theme.muted_text, TextAlign::Left),
        );
        canvas.text(
            &entry.count.to_string(),
            Vec2::new(text_x, rect.top() + rect.size.y * 0.7),
            TextStyle::new(metrics.count_font_size, accent, TextAlign::Left),
        );
    }
}

/// Splits `text` into lines of at most `max_chars` characters.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Chart layout for `canvas`, pulled back from the phase panel when a match
/// is tracked.
#[must_use]
pub fn chart_layout(canvas: Vec2, phase: Option<&PhaseView>) -> ChartLayout {
    let layout = ChartLayout::for_canvas(canvas);
    match phase {
        Some(view) => {
            let panel = phase_panel_rect(&layout, view);
            layout.reserve(panel)
        }
        None => layout,
    }
}

/// Bounds of the phase panel for `view`.
#[must_use]
pub fn phase_panel_rect(layout: &ChartLayout, view: &PhaseView) -> LayoutRect {
    let font_size = layout.metrics().panel_font_size;
    let (origin, width) = phase_panel_placement(layout);
    let lines = 2
        + usize::from(view.lobby_number.is_some())
        + message_lines(view, width, font_size).len();
    let height = 2.0 * PANEL_PADDING + font_size * PANEL_LINE_SPACING * lines as f32;
    LayoutRect::new(origin, Vec2::new(width, height))
}

fn message_lines(view: &PhaseView, width: f32, font_size: f32) -> Vec<String> {
    // Full-width glyphs are roughly one em wide.
    let chars_per_line = ((width - 2.0 * PANEL_PADDING) / font_size).floor().max(1.0) as usize;
    wrap_text(&view.copy.message, chars_per_line)
}

/// Match phase panel: title, countdown or elapsed time, lobby number and
/// the wrapped instruction text.
///
/// Drawn where the layout reserved room for it, if it did.
pub fn draw_phase_panel(
    canvas: &mut dyn Canvas,
    layout: &ChartLayout,
    view: &PhaseView,
    theme: &Theme,
) {
    let font_size = layout.metrics().panel_font_size;
    let line_height = font_size * PANEL_LINE_SPACING;
    let panel = layout
        .reserved
        .unwrap_or_else(|| phase_panel_rect(layout, view));

    let mut lines: Vec<(String, TextStyle)> = Vec::new();
    lines.push((
        view.copy.title.to_owned(),
        TextStyle::new(font_size + 2.0, theme.text, TextAlign::Left),
    ));
    match view.countdown() {
        Some(countdown) => {
            let color = if view.is_urgent {
                theme.urgent
            } else {
                theme.text
            };
            lines.push((
                format!("残り {countdown}"),
                TextStyle::new(font_size + 2.0, color, TextAlign::Left),
            ));
        }
        None => lines.push((
            format!("経過 {}", view.elapsed_clock()),
            TextStyle::new(font_size, theme.muted_text, TextAlign::Left),
        )),
    }
    if let Some(lobby_number) = &view.lobby_number {
        lines.push((
            format!("ロビー番号 {lobby_number}"),
            TextStyle::new(font_size, theme.text, TextAlign::Left),
        ));
    }
    for line in message_lines(view, panel.size.x, font_size) {
        lines.push((
            line,
            TextStyle::new(font_size, theme.muted_text, TextAlign::Left),
        ));
    }

    canvas.fill_rect(panel, Brush::Solid(theme.panel_background));
    let border = if view.is_urgent {
        theme.urgent
    } else {
        theme.panel_border
    };
    canvas.stroke_rect(panel, Stroke::solid(border, 1.0));

    for (index, (text, style)) in lines.iter().enumerate() {
        let anchor = Vec2::new(
            panel.left() + PANEL_PADDING,
            panel.top() + PANEL_PADDING + line_height * (index as f32 + 0.5),
        );
        canvas.text(text, anchor, *style);
    }
}

/// Top-right beside the info panel when there is room, otherwise below it.
///
/// Beside the info panel the width shrinks, down to the minimum, so the panel
/// stays right of a full-size chart.
fn phase_panel_placement(layout: &ChartLayout) -> (Vec2, f32) {
    let inset = layout.info_panel.left();
    let beside = layout.canvas.x - layout.info_panel.right() - 2.0 * inset;
    if beside >= PHASE_PANEL_MIN_WIDTH {
        let chart_right = layout.center.x + layout.available_radius + RESERVED_GAP;
        let right_of_chart = layout.canvas.x - inset - chart_right;
        let mut width = beside.min(PHASE_PANEL_MAX_WIDTH);
        if right_of_chart >= PHASE_PANEL_MIN_WIDTH {
            width = width.min(right_of_chart);
        }
        let origin = Vec2::new(layout.canvas.x - inset - width, layout.info_panel.top());
        (origin, width)
    } else {
        let width = (layout.canvas.x - 2.0 * inset).max(0.0);
        let origin = Vec2::new(inset, layout.info_panel.bottom() + inset);
        (origin, width)
    }
}
