use chrono::FixedOffset;
use queueboard_core::default_display_offset;

use crate::{Color, RenderingError};

/// Default spacing of the background grid.
const DEFAULT_GRID_SPACING: f32 = 40.0;

/// Palette, grid metrics and timestamp offset shared by every layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    /// Color used to clear each frame.
    pub background: Color,
    /// Background grid line color.
    pub grid_line: Color,
    /// Distance between grid lines in pixels.
    pub grid_spacing: f32,
    /// Info panel and legend box fill.
    pub panel_background: Color,
    /// Info panel and legend box outline.
    pub panel_border: Color,
    /// Primary text color.
    pub text: Color,
    /// Secondary text color.
    pub muted_text: Color,
    /// Outline drawn between pie wedges.
    pub wedge_stroke: Color,
    /// Inner circle fill.
    pub inner_circle: Color,
    /// Status color while the user is queued.
    pub matching: Color,
    /// Status color while the user is only watching.
    pub waiting: Color,
    /// Countdown color inside the warning window.
    pub urgent: Color,
    /// Offset used when formatting timestamps.
    pub display_offset: FixedOffset,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::from_rgb_u8(0x0d, 0x11, 0x1c),
            grid_line: Color::new(1.0, 1.0, 1.0, 0.06),
            grid_spacing: DEFAULT_GRID_SPACING,
            panel_background: Color::new(0.08, 0.1, 0.16, 0.85),
            panel_border: Color::new(1.0, 1.0, 1.0, 0.18),
            text: Color::from_rgb_u8(0xf2, 0xf4, 0xf8),
            muted_text: Color::from_rgb_u8(0x9a, 0xa3, 0xb5),
            wedge_stroke: Color::from_rgb_u8(0x0d, 0x11, 0x1c),
            inner_circle: Color::from_rgb_u8(0x14, 0x19, 0x27),
            matching: Color::from_rgb_u8(0x4c, 0xe0, 0xb3),
            waiting: Color::from_rgb_u8(0x9a, 0xa3, 0xb5),
            urgent: Color::from_rgb_u8(0xff, 0x5a, 0x5f),
            display_offset: default_display_offset(),
        }
    }
}

impl Theme {
    /// Overrides the grid spacing.
    ///
    /// Returns an error when `spacing` is not a positive finite number.
    pub fn with_grid_spacing(self, spacing: f32) -> Result<Self, RenderingError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(RenderingError::InvalidGridSpacing { spacing });
        }

        Ok(Self {
            grid_spacing: spacing,
            ..self
        })
    }

    /// Overrides the offset used when formatting timestamps.
    #[must_use]
    pub fn with_display_offset(self, display_offset: FixedOffset) -> Self {
        Self {
            display_offset,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_spacing_must_be_positive() {
        assert_eq!(Theme::default().grid_spacing, 40.0);
        assert!(Theme::default().with_grid_spacing(24.0).is_ok());
        assert_eq!(
            Theme::default().with_grid_spacing(0.0),
            Err(RenderingError::InvalidGridSpacing { spacing: 0.0 })
        );
        assert!(Theme::default().with_grid_spacing(f32::NAN).is_err());
    }
}
