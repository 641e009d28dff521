use glam::Vec2;
use queueboard_core::{Role, RoleCounts, RoleSet};

use crate::MIN_CHART_RADIUS;

/// Gap kept between the chart's available radius and the chart area bounds.
const CHART_MARGIN: f32 = 16.0;

/// Offset of the previous-match panel from the top-left corner.
const INFO_PANEL_INSET: f32 = 12.0;

/// Clearance kept between the chart and a reserved overlay.
pub const RESERVED_GAP: f32 = 12.0;

/// Canvas width below which the narrow metrics apply.
pub(crate) const NARROW_BREAKPOINT: f32 = 600.0;

/// Canvas width below which the very narrow metrics apply.
pub(crate) const VERY_NARROW_BREAKPOINT: f32 = 400.0;

/// Roles shown in the legend's top row; the remainder go in the bottom row.
const LEGEND_TOP_ROW: usize = 3;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutRect {
    /// Top-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl LayoutRect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Left edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    /// Top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.origin.x + self.size.x
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Distance from `point` to the closest point of the rectangle; zero inside.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let far = self.origin + self.size;
        point.distance(point.clamp(self.origin, far.max(self.origin)))
    }

    /// Returns `true` when the interiors of the two rectangles intersect.
    #[must_use]
    pub fn overlaps(&self, other: &LayoutRect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// Responsive size class derived from the canvas width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Density {
    /// Canvas at least 600 px wide.
    Regular,
    /// Canvas between 400 and 600 px wide.
    Narrow,
    /// Canvas narrower than 400 px; fonts, icons and gaps shrink.
    VeryNarrow,
}

impl Density {
    /// Selects the density for a canvas width.
    #[must_use]
    pub fn for_width(width: f32) -> Self {
        if width < VERY_NARROW_BREAKPOINT {
            Self::VeryNarrow
        } else if width < NARROW_BREAKPOINT {
            Self::Narrow
        } else {
            Self::Regular
        }
    }

    /// Size metrics associated with the density.
    #[must_use]
    pub const fn metrics(self) -> DensityMetrics {
        match self {
            Self::Regular => DensityMetrics {
                legend_box_width: 150.0,
                legend_box_height: 64.0,
                legend_gap: 14.0,
                legend_margin: 16.0,
                icon_size: 32.0,
                label_font_size: 15.0,
                count_font_size: 22.0,
                panel_size: Vec2::new(232.0, 86.0),
                panel_font_size: 14.0,
                center_font_size: 30.0,
                status_font_size: 12.0,
            },
            Self::Narrow => DensityMetrics {
                legend_box_width: 124.0,
                legend_box_height: 56.0,
                legend_gap: 10.0,
                legend_margin: 12.0,
                icon_size: 26.0,
                label_font_size: 13.0,
                count_font_size: 19.0,
                panel_size: Vec2::new(200.0, 78.0),
                panel_font_size: 12.0,
                center_font_size: 26.0,
                status_font_size: 11.0,
            },
            Self::VeryNarrow => DensityMetrics {
                legend_box_width: 92.0,
                legend_box_height: 46.0,
                legend_gap: 6.0,
                legend_margin: 8.0,
                icon_size: 18.0,
                label_font_size: 10.0,
                count_font_size: 15.0,
                panel_size: Vec2::new(168.0, 66.0),
                panel_font_size: 10.0,
                center_font_size: 22.0,
                status_font_size: 9.0,
            },
        }
    }
}

/// Pixel sizes used by one density class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityMetrics {
    /// Preferred legend box width; shrinks further if the canvas demands it.
    pub legend_box_width: f32,
    /// Legend box height.
    pub legend_box_height: f32,
    /// Gap between legend boxes.
    pub legend_gap: f32,
    /// Margin around the legend grid.
    pub legend_margin: f32,
    /// Side length of role icons.
    pub icon_size: f32,
    /// Font size of role labels.
    pub label_font_size: f32,
    /// Font size of role counts.
    pub count_font_size: f32,
    /// Size of the previous-match panel.
    pub panel_size: Vec2,
    /// Font size of previous-match panel lines.
    pub panel_font_size: f32,
    /// Font size of the waiting count in the inner circle.
    pub center_font_size: f32,
    /// Font size of the status word in the inner circle.
    pub status_font_size: f32,
}

/// Legend box for one role.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegendEntry {
    /// Role described by the box.
    pub role: Role,
    /// Waiting entries for the role.
    pub count: u32,
    /// Box bounds.
    pub rect: LayoutRect,
    /// Whether the viewing user queued for the role.
    pub highlighted: bool,
}

/// Partition of the canvas into chart, panel and legend areas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartLayout {
    /// Canvas size.
    pub canvas: Vec2,
    /// Responsive size class.
    pub density: Density,
    /// Pie center.
    pub center: Vec2,
    /// Largest radius the chart may take.
    pub available_radius: f32,
    /// Previous-match panel bounds.
    pub info_panel: LayoutRect,
    /// Width of one legend box.
    pub legend_box_width: f32,
    /// Y coordinate of the legend's top edge.
    pub legend_top: f32,
    /// Overlay the chart has been shrunk to stay clear of.
    pub reserved: Option<LayoutRect>,
}

impl ChartLayout {
    /// Lays out a canvas of the given size.
    #[must_use]
    pub fn for_canvas(canvas: Vec2) -> Self {
        let canvas = canvas.max(Vec2::ZERO);
        let density = Density::for_width(canvas.x);
        let metrics = density.metrics();

        let columns = LEGEND_TOP_ROW as f32;
        let fitted_width =
            (canvas.x - 2.0 * metrics.legend_margin - (columns - 1.0) * metrics.legend_gap)
                / columns;
        let legend_box_width = metrics.legend_box_width.min(fitted_width).max(0.0);

        let legend_height =
            2.0 * metrics.legend_box_height + metrics.legend_gap + metrics.legend_margin;
        let legend_top = (canvas.y - legend_height).max(0.0);

        let chart_height = legend_top;
        let center = Vec2::new(canvas.x * 0.5, chart_height * 0.5);
        let available_radius =
            (canvas.x.min(chart_height) * 0.5 - CHART_MARGIN).max(MIN_CHART_RADIUS);

        let info_panel = LayoutRect::new(Vec2::splat(INFO_PANEL_INSET), metrics.panel_size);

        Self {
            canvas,
            density,
            center,
            available_radius,
            info_panel,
            legend_box_width,
            legend_top,
            reserved: None,
        }
    }

    /// Shrinks the available radius so the chart keeps [`RESERVED_GAP`]
    /// clear of `overlay`, never below the minimum chart radius.
    #[must_use]
    pub fn reserve(mut self, overlay: LayoutRect) -> Self {
        let clearance = overlay.distance_to(self.center) - RESERVED_GAP;
        self.available_radius = self
            .available_radius
            .min(clearance)
            .max(MIN_CHART_RADIUS);
        self.reserved = Some(overlay);
        self
    }

    /// Size metrics for this layout's density.
    #[must_use]
    pub fn metrics(&self) -> DensityMetrics {
        self.density.metrics()
    }

    /// Builds the 3-over-2 legend grid, both rows centered horizontally.
    #[must_use]
    pub fn legend_entries(&self, counts: &RoleCounts, selected: RoleSet) -> Vec<LegendEntry> {
        let metrics = self.metrics();
        let box_size = Vec2::new(self.legend_box_width, metrics.legend_box_height);

        Role::ALL
            .into_iter()
            .enumerate()
            .map(|(index, role)| {
                let (row, column, row_len) = if index < LEGEND_TOP_ROW {
                    (0, index, LEGEND_TOP_ROW)
                } else {
                    (1, index - LEGEND_TOP_ROW, Role::ALL.len() - LEGEND_TOP_ROW)
                };
                let row_width =
                    row_len as f32 * box_size.x + (row_len as f32 - 1.0) * metrics.legend_gap;
                let left = (self.canvas.x - row_width) * 0.5;
                let origin = Vec2::new(
                    left + column as f32 * (box_size.x + metrics.legend_gap),
                    self.legend_top + row as f32 * (box_size.y + metrics.legend_gap),
                );

                LegendEntry {
                    role,
                    count: counts.get(role),
                    rect: LayoutRect::new(origin, box_size),
                    highlighted: selected.contains(role),
                }
            })
            .collect()
    }
}
