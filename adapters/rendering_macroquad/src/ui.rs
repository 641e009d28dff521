//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Skin, Style, StyleBuilder, Ui},
};
use queueboard_core::{Role, RoleSet};

/// Buttons pressed in the control panel during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlPanelUiResult {
    /// Whether the join/leave button was pressed.
    pub(crate) queue_toggle: bool,
    /// Roles whose selection button was pressed.
    pub(crate) toggled_roles: RoleSet,
}

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext {
    /// Top-left corner of the panel in screen coordinates.
    pub(crate) origin: Vec2,
    /// Panel dimensions in screen space.
    pub(crate) size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub(crate) background: Color,
    /// Whether the user is currently queued.
    pub(crate) in_queue: bool,
    /// Roles the user queues for.
    pub(crate) selected_roles: RoleSet,
}

/// Renders the control panel's interactive elements for the current frame.
///
/// Labels stay ASCII because macroquad's built-in UI font has no CJK glyphs.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext,
) -> ControlPanelUiResult {
    let skin = panel_skin(ui, context.background);
    ui.push_skin(&skin);

    let mut result = ControlPanelUiResult::default();
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        let status = if context.in_queue {
            "Status: in queue"
        } else {
            "Status: watching"
        };
        ui.label(None, status);
        let queue_label = if context.in_queue {
            "Leave queue"
        } else {
            "Join queue"
        };
        result.queue_toggle = ui.button(None, queue_label);

        ui.label(None, "Roles");
        for (position, role) in Role::ALL.into_iter().enumerate() {
            let marker = if context.selected_roles.contains(role) {
                "x"
            } else {
                " "
            };
            let label = format!("[{marker}] {} ({})", role.id(), position + 1);
            if ui.button(None, label.as_str()) {
                result.toggled_roles.insert(role);
            }
        }

        ui.label(None, "Space: join/leave  1-5: roles");
        ui.label(None, "Esc/Q: quit");
    });

    ui.pop_skin();

    result
}

const BUTTON_IDLE: Color = Color::new(0.16, 0.2, 0.29, 1.0);
const BUTTON_HOVER: Color = Color::new(0.24, 0.29, 0.41, 1.0);
const BUTTON_PRESSED: Color = Color::new(0.13, 0.16, 0.23, 1.0);

/// Builder with white text in every interaction state.
fn white_text(builder: StyleBuilder) -> StyleBuilder {
    builder
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
}

/// Builder with one fill color for the idle, hovered and selected states.
fn filled(builder: StyleBuilder, idle: Color, hovered: Color, pressed: Color) -> StyleBuilder {
    builder
        .color(idle)
        .color_hovered(hovered)
        .color_clicked(pressed)
        .color_selected(idle)
        .color_selected_hovered(hovered)
        .color_inactive(Color::new(pressed.r, pressed.g, pressed.b, 0.8))
}

fn vertical_margin(builder: StyleBuilder, margin: f32) -> Style {
    builder.margin(RectOffset::new(0.0, 0.0, margin, margin)).build()
}

/// Skin whose window matches the panel rectangle drawn underneath it.
fn panel_skin(ui: &mut Ui, background: Color) -> Skin {
    let window_style = filled(white_text(ui.style_builder()), background, background, background)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    let label_style = vertical_margin(white_text(ui.style_builder()), 4.0);
    let button_style = vertical_margin(
        filled(
            white_text(ui.style_builder()),
            BUTTON_IDLE,
            BUTTON_HOVER,
            BUTTON_PRESSED,
        ),
        8.0,
    );

    Skin {
        window_style,
        label_style,
        button_style,
        margin: 0.0,
        ..ui.default_skin()
    }
}
