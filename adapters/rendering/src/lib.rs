#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for queue board adapters.
//!
//! Backends implement [`Canvas`] and [`RenderingBackend`]; everything that
//! decides what ends up on screen lives in [`layers`] and only talks to the
//! canvas trait, so it can be exercised with [`RecordingCanvas`].

mod canvas;
pub mod layers;
mod theme;

pub use canvas::{Brush, Canvas, DrawCommand, RecordingCanvas, Stroke, TextAlign, TextStyle};
pub use theme::Theme;

use anyhow::Result as AnyResult;
use queueboard_core::{RoleColor, RoleSet};
use queueboard_system_match_phase::PhaseView;
use queueboard_system_radar::QueueBoardProps;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: mix_channel(self.red, 1.0, amount),
            green: mix_channel(self.green, 1.0, amount),
            blue: mix_channel(self.blue, 1.0, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the color with its alpha multiplied by `factor`.
    #[must_use]
    pub fn with_alpha(self, factor: f32) -> Self {
        Self {
            alpha: self.alpha * factor.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear interpolation between two colors, `amount` clamped to 0.0..=1.0.
    #[must_use]
    pub fn mix(self, other: Self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: mix_channel(self.red, other.red, amount),
            green: mix_channel(self.green, other.green, amount),
            blue: mix_channel(self.blue, other.blue, amount),
            alpha: mix_channel(self.alpha, other.alpha, amount),
        }
    }
}

impl From<RoleColor> for Color {
    fn from(color: RoleColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

fn mix_channel(from: f32, to: f32, amount: f32) -> f32 {
    from + (to - from) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Whether the user asked to join or leave the queue on this frame.
    pub toggle_queue: bool,
    /// Roles whose selection the user flipped on this frame.
    pub toggled_roles: RoleSet,
}

impl FrameInput {
    /// Returns `true` when the frame carries no user action.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.toggle_queue && self.toggled_roles.is_empty()
    }
}

/// Everything the backend draws on one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Queue radar inputs.
    pub queue: QueueBoardProps,
    /// Match phase panel, shown while a match is tracked.
    pub phase: Option<PhaseView>,
}

impl Scene {
    /// Creates a scene descriptor.
    #[must_use]
    pub fn new(queue: QueueBoardProps, phase: Option<PhaseView>) -> Self {
        Self { queue, phase }
    }

    /// Applies the user's queue actions to the radar inputs.
    pub fn apply_input(&mut self, input: FrameInput) {
        if input.toggle_queue {
            self.queue.is_user_in_queue = !self.queue.is_user_in_queue;
        }
        for role in input.toggled_roles.iter() {
            self.queue.selected_roles.toggle(role);
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Palette and metrics applied to every layer.
    pub theme: Theme,
    /// Scene content that should be displayed first.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, theme: Theme, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            theme,
            scene,
        }
    }
}

/// Rendering backend capable of presenting the queue board.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Grid spacing must be positive to avoid an unbounded number of lines.
    InvalidGridSpacing {
        /// Provided spacing that failed validation.
        spacing: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGridSpacing { spacing } => {
                write!(f, "grid spacing must be positive (received {spacing})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use queueboard_core::Role;

    #[test]
    fn role_colors_convert_to_unit_channels() {
        let color = Color::from(Role::Attacker.style().color);
        assert!((color.red - 0xf1 as f32 / 255.0).abs() < 1e-6);
        assert!((color.green - 0x6c as f32 / 255.0).abs() < 1e-6);
        assert_eq!(color.alpha, 1.0);
    }

    #[test]
    fn lighten_and_alpha_stay_in_range() {
        let color = Color::from_rgb_u8(100, 0, 255).lighten(2.0).with_alpha(0.5);
        assert_eq!(color.red, 1.0);
        assert_eq!(color.blue, 1.0);
        assert_eq!(color.alpha, 0.5);
    }

    #[test]
    fn mix_interpolates_every_channel() {
        let mixed = Color::new(0.0, 0.0, 0.0, 0.0).mix(Color::new(1.0, 0.5, 0.0, 1.0), 0.5);
        assert_eq!(mixed, Color::new(0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn input_toggles_queue_membership_and_roles() {
        let mut scene = Scene::default();
        scene.queue.selected_roles.insert(Role::Speedster);

        scene.apply_input(FrameInput {
            toggle_queue: true,
            toggled_roles: [Role::Speedster, Role::Supporter].into_iter().collect(),
        });

        assert!(scene.queue.is_user_in_queue);
        assert!(!scene.queue.selected_roles.contains(Role::Speedster));
        assert!(scene.queue.selected_roles.contains(Role::Supporter));

        scene.apply_input(FrameInput::default());
        assert!(scene.queue.is_user_in_queue);
        assert!(FrameInput::default().is_idle());
    }
}
