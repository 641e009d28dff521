#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure geometry and animation state for the live queue radar.
//!
//! The system turns a [`QueueSnapshot`] plus a canvas size into a
//! [`RadarFrame`]: pie slices, chart radius, expanding detection rings,
//! legend boxes and the previous-match panel contents. It never draws;
//! rendering adapters consume the frame.

mod layout;
mod rings;

pub use layout::{ChartLayout, Density, DensityMetrics, LayoutRect, LegendEntry, RESERVED_GAP};
pub use rings::{
    RadarRing, RadarRings, RingFade, RING_FADE_DISTANCE, RING_MAX_BLUR, RING_SPAWN_INTERVAL,
    RING_SPEED_PX_PER_SEC,
};

use std::{
    f32::consts::{FRAC_PI_2, TAU},
    time::Duration,
};

use glam::Vec2;
use queueboard_core::{QueueSnapshot, Role, RoleCounts, RoleSet};

/// Chart radius used for a single waiting player.
pub const MIN_CHART_RADIUS: f32 = 30.0;

/// Waiting count at which the linear ramp reaches its size-dependent maximum.
pub const RADIUS_RAMP_PLAYERS: u32 = 15;

/// Radius added for every waiting player beyond [`RADIUS_RAMP_PLAYERS`].
pub const RADIUS_GROWTH_PER_EXTRA_PLAYER: f32 = 20.0;

/// Share of the available radius reached at the end of the ramp.
const RAMP_MAX_SHARE: f32 = 0.75;

/// Angle at which the first slice starts (12 o'clock).
pub const PIE_START_ANGLE: f32 = -FRAC_PI_2;

/// Full period of the "MATCHING" label pulse.
pub const PULSE_PERIOD: Duration = Duration::from_secs(2);

/// One role's wedge of the pie, angles in radians measured clockwise on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieSlice {
    /// Role represented by the slice.
    pub role: Role,
    /// Waiting entries for the role.
    pub count: u32,
    /// Angle where the wedge begins.
    pub start_angle: f32,
    /// Angle where the wedge ends.
    pub end_angle: f32,
}

impl PieSlice {
    /// Angular extent of the wedge.
    #[must_use]
    pub fn sweep(&self) -> f32 {
        self.end_angle - self.start_angle
    }

    /// Returns `true` when the wedge covers no angle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.sweep() <= f32::EPSILON
    }
}

/// Lays out one slice per role, in role order, clockwise from 12 o'clock.
///
/// Shares are computed against the sum of role entries, not the unique
/// headcount. When no role has entries every slice spans zero radians.
#[must_use]
pub fn pie_slices(counts: &RoleCounts) -> Vec<PieSlice> {
    let total_entries = counts.total_entries();
    let mut cumulative: u64 = 0;
    let mut start_angle = PIE_START_ANGLE;

    counts
        .iter()
        .map(|(role, count)| {
            cumulative += u64::from(count);
            let end_angle = if total_entries > 0 {
                let fraction = cumulative as f64 / total_entries as f64;
                PIE_START_ANGLE + (fraction * std::f64::consts::TAU) as f32
            } else {
                start_angle
            };
            let slice = PieSlice {
                role,
                count,
                start_angle,
                end_angle,
            };
            start_angle = end_angle;
            slice
        })
        .collect()
}

/// Computes the chart radius for the unique waiting count.
///
/// The radius starts at [`MIN_CHART_RADIUS`] for one player, ramps linearly
/// to a size-dependent maximum at [`RADIUS_RAMP_PLAYERS`], then keeps growing
/// by [`RADIUS_GROWTH_PER_EXTRA_PLAYER`] per player until it hits the
/// available radius.
#[must_use]
pub fn chart_radius(total_waiting: u32, available_radius: f32) -> f32 {
    let cap = available_radius.max(MIN_CHART_RADIUS);
    let ramp_max = (available_radius * RAMP_MAX_SHARE).max(MIN_CHART_RADIUS);

    let radius = if total_waiting <= 1 {
        MIN_CHART_RADIUS
    } else if total_waiting <= RADIUS_RAMP_PLAYERS {
        let progress = (total_waiting - 1) as f32 / (RADIUS_RAMP_PLAYERS - 1) as f32;
        MIN_CHART_RADIUS + (ramp_max - MIN_CHART_RADIUS) * progress
    } else {
        let extra = (total_waiting - RADIUS_RAMP_PLAYERS) as f32;
        ramp_max + RADIUS_GROWTH_PER_EXTRA_PLAYER * extra
    };

    radius.min(cap)
}

/// Opacity of the pulsing queue label after `elapsed` animation time.
#[must_use]
pub fn pulse_alpha(elapsed: Duration) -> f32 {
    let phase = elapsed.as_secs_f32() / PULSE_PERIOD.as_secs_f32() * TAU;
    0.6 + 0.4 * phase.sin()
}

/// Render props supplied by the page hosting the radar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QueueBoardProps {
    /// Latest queue snapshot.
    pub snapshot: QueueSnapshot,
    /// Whether the viewing user is currently queued.
    pub is_user_in_queue: bool,
    /// Roles the viewing user queued for.
    pub selected_roles: RoleSet,
}

/// Status word shown under the waiting count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueStatus {
    /// The user is queued; the label pulses.
    Matching,
    /// The user is only watching.
    Waiting,
}

impl QueueStatus {
    /// Text drawn for the status.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Matching => "MATCHING",
            Self::Waiting => "WAITING",
        }
    }
}

/// Contents of the inner circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterLabel {
    /// Unique waiting players.
    pub total_waiting: u32,
    /// Status word shown below the count.
    pub status: QueueStatus,
    /// Opacity of the status word.
    pub status_alpha: f32,
}

/// Values shown in the previous-match panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviousMatchInfo {
    /// Unix seconds of the last match formation.
    pub matched_at: Option<i64>,
    /// Players placed by the last match formation.
    pub matched_count: Option<u32>,
    /// Matches currently being played.
    pub ongoing_matches: u32,
}

/// Expanding ring prepared for drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct RingFrame {
    /// Current ring radius.
    pub radius: f32,
    /// Fade applied to the ring.
    pub fade: RingFade,
    /// Slice geometry frozen when the ring was emitted.
    pub slices: Vec<PieSlice>,
}

/// Everything needed to draw one radar frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarFrame {
    /// Canvas partitioning for this frame.
    pub layout: ChartLayout,
    /// Radius of the pie.
    pub chart_radius: f32,
    /// Pie slices; empty when nobody is waiting.
    pub slices: Vec<PieSlice>,
    /// Rings ordered oldest (largest) first; empty when nobody is waiting.
    pub rings: Vec<RingFrame>,
    /// Inner circle contents; `None` when nobody is waiting.
    pub center_label: Option<CenterLabel>,
    /// Legend boxes for every role.
    pub legend: Vec<LegendEntry>,
    /// Previous-match panel contents.
    pub previous_match: PreviousMatchInfo,
}

impl RadarFrame {
    /// Number of wedges with a visible sweep.
    #[must_use]
    pub fn visible_wedges(&self) -> usize {
        self.slices.iter().filter(|slice| !slice.is_empty()).count()
    }
}

/// Stateful radar: owns the ring set and the animation clock.
///
/// All other geometry is recomputed from scratch on every frame.
#[derive(Debug, Default)]
pub struct QueueVisualizer {
    rings: RadarRings,
    animation_time: Duration,
}

impl QueueVisualizer {
    /// Creates a visualizer with no rings and a zeroed animation clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total animation time accumulated from frame deltas.
    #[must_use]
    pub fn animation_time(&self) -> Duration {
        self.animation_time
    }

    /// Rings currently alive, oldest first.
    #[must_use]
    pub fn rings(&self) -> &RadarRings {
        &self.rings
    }

    /// Advances the animation by `dt` and builds the frame for `canvas_size`.
    pub fn frame(&mut self, dt: Duration, props: &QueueBoardProps, canvas_size: Vec2) -> RadarFrame {
        self.frame_in(dt, props, ChartLayout::for_canvas(canvas_size))
    }

    /// Like [`Self::frame`], for a layout the caller has already adjusted.
    pub fn frame_in(&mut self, dt: Duration, props: &QueueBoardProps, layout: ChartLayout) -> RadarFrame {
        self.animation_time = self.animation_time.saturating_add(dt);

        let snapshot = &props.snapshot;
        let radius = chart_radius(snapshot.total_waiting, layout.available_radius);
        let slices = pie_slices(&snapshot.role_counts);

        self.rings.advance(self.animation_time, &slices, radius);

        let legend = layout.legend_entries(&snapshot.role_counts, props.selected_roles);
        let previous_match = PreviousMatchInfo {
            matched_at: snapshot.previous_matched_at,
            matched_count: snapshot.previous_matched_count,
            ongoing_matches: snapshot.ongoing_matches,
        };

        if snapshot.total_waiting == 0 {
            return RadarFrame {
                layout,
                chart_radius: radius,
                slices: Vec::new(),
                rings: Vec::new(),
                center_label: None,
                legend,
                previous_match,
            };
        }

        let rings = self
            .rings
            .iter()
            .map(|ring| RingFrame {
                radius: ring.radius(),
                fade: ring.fade(radius),
                slices: ring.slices().to_vec(),
            })
            .collect();

        let status = if props.is_user_in_queue {
            QueueStatus::Matching
        } else {
            QueueStatus::Waiting
        };
        let status_alpha = match status {
            QueueStatus::Matching => pulse_alpha(self.animation_time),
            QueueStatus::Waiting => 1.0,
        };

        RadarFrame {
            layout,
            chart_radius: radius,
            slices,
            rings,
            center_label: Some(CenterLabel {
                total_waiting: snapshot.total_waiting,
                status,
                status_alpha,
            }),
            legend,
            previous_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_role_covers_the_full_circle() {
        let slices = pie_slices(&RoleCounts::from_array([0, 4, 0, 0, 0]));
        let full = slices[1];
        assert!((full.sweep() - TAU).abs() < 1e-5);
        assert!((full.start_angle - PIE_START_ANGLE).abs() < 1e-6);
        assert!(slices[0].is_empty());
        assert!(slices[2].is_empty());
    }

    #[test]
    fn pulse_alpha_oscillates_within_bounds() {
        for millis in (0..4_000).step_by(50) {
            let alpha = pulse_alpha(Duration::from_millis(millis));
            assert!((0.2 - 1e-4..=1.0 + 1e-4).contains(&alpha));
        }
        assert!((pulse_alpha(Duration::ZERO) - 0.6).abs() < 1e-6);
        assert!((pulse_alpha(Duration::from_millis(500)) - 1.0).abs() < 1e-4);
    }
}
