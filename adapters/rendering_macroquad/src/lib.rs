#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the queue board.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module for the control
//! panel. All UI-specific calls live inside the local `ui` module to avoid
//! leaking Macroquad UI types throughout the renderer.

mod canvas;
mod icons;
mod ui;

use self::{
    canvas::MacroquadCanvas,
    icons::IconAtlas,
    ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelUiResult},
};
use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use macroquad::{
    input::{is_key_pressed, KeyCode},
    math::Vec2 as MacroquadVec2,
    text::{load_ttf_font_from_bytes, Font},
};
use queueboard_core::{Role, RoleSet};
use queueboard_rendering::{
    layers, Color, FrameInput, Presentation, RenderingBackend, Scene,
};
use queueboard_system_radar::QueueVisualizer;
use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// Width reserved on the right edge for the control panel.
const CONTROL_PANEL_WIDTH: f32 = 240.0;

const DEFAULT_WINDOW_SIZE: (i32, i32) = (1280, 800);

/// Keys `1` to `5` in chart order.
const ROLE_KEYS: [KeyCode; 5] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
];

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    queue_toggle_latched: bool,
    role_toggles_latched: RoleSet,
}

impl ControlPanelInputState {
    /// Returns whether the UI requested a queue join/leave and clears the latch
    /// so the action fires only once.
    pub fn take_queue_toggle(&mut self) -> bool {
        let latched = self.queue_toggle_latched;
        self.queue_toggle_latched = false;
        latched
    }

    /// Records that the control-panel button requested a queue join/leave this frame.
    pub fn register_queue_toggle(&mut self) {
        self.queue_toggle_latched = true;
    }

    /// Returns the latched role toggles, clearing them so each fires once.
    pub fn take_role_toggles(&mut self) -> RoleSet {
        std::mem::take(&mut self.role_toggles_latched)
    }

    /// Records that a role button was pressed this frame.
    ///
    /// Pressing the same role twice before the latch is taken counts once.
    pub fn register_role_toggle(&mut self, role: Role) {
        self.role_toggles_latched.insert(role);
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the render loop.
    quit_requested: bool,
    /// `Space` joins or leaves the queue.
    toggle_queue: bool,
    /// `1`..`5` flip the matching role.
    toggled_roles: RoleSet,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let toggle_queue = is_key_pressed(KeyCode::Space);
        let toggled_roles = Role::ALL
            .into_iter()
            .zip(ROLE_KEYS)
            .filter(|(_, key)| is_key_pressed(*key))
            .map(|(role, _)| role)
            .collect();

        Self {
            quit_requested,
            toggle_queue,
            toggled_roles,
        }
    }
}

/// Merges the control panel latch from the previous frame with this frame's keys.
fn gather_frame_input(
    queue_toggle: bool,
    role_toggles: RoleSet,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let mut toggled_roles = role_toggles;
    for role in keyboard.toggled_roles.iter() {
        toggled_roles.insert(role);
    }

    FrameInput {
        toggle_queue: queue_toggle || keyboard.toggle_queue,
        toggled_roles,
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    window_size: (i32, i32),
    font_path: Option<PathBuf>,
    icon_directory: Option<PathBuf>,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            window_size: DEFAULT_WINDOW_SIZE,
            font_path: None,
            icon_directory: None,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Overrides the initial window size in pixels.
    #[must_use]
    pub fn with_window_size(mut self, width: i32, height: i32) -> Self {
        self.window_size = (width.max(1), height.max(1));
        self
    }

    /// Uses the TTF font at `path` for every label on the board.
    ///
    /// Role names and phase messages are Japanese, which macroquad's built-in
    /// font cannot render.
    #[must_use]
    pub fn with_font(mut self, path: Option<PathBuf>) -> Self {
        self.font_path = path;
        self
    }

    /// Loads role icons from `directory`.
    #[must_use]
    pub fn with_icon_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.icon_directory = directory;
        self
    }
}

/// Durations measured for one pass of the render loop.
#[derive(Clone, Copy, Debug, Default)]
struct FrameTiming {
    frame: Duration,
    render: Duration,
}

/// Frames older than this drop out of the trailing rate.
const TRAILING_WINDOW: Duration = Duration::from_secs(10);

/// Interval between two reports.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Frame rate statistics reported once per [`REPORT_INTERVAL`].
#[derive(Debug, Default)]
struct FpsCounter {
    since_report: Duration,
    frames_since_report: u32,
    render_since_report: Duration,
    recent_frames: VecDeque<Duration>,
    recent_total: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_render: Duration,
}

impl FpsCounter {
    fn record_frame(&mut self, timing: FrameTiming) -> Option<FpsMetrics> {
        self.since_report += timing.frame;
        self.frames_since_report = self.frames_since_report.saturating_add(1);
        self.render_since_report += timing.render;
        self.push_recent(timing.frame);

        if self.since_report < REPORT_INTERVAL {
            return None;
        }

        let interval = std::mem::take(&mut self.since_report).as_secs_f32();
        let frames = std::mem::take(&mut self.frames_since_report);
        let render = std::mem::take(&mut self.render_since_report);
        if frames == 0 || interval <= f32::EPSILON {
            return None;
        }

        let per_second = frames as f32 / interval;
        let recent_seconds = self.recent_total.as_secs_f32();
        let trailing_ten_seconds = if recent_seconds > f32::EPSILON {
            self.recent_frames.len() as f32 / recent_seconds
        } else {
            per_second
        };

        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_render: render / frames,
        })
    }

    fn push_recent(&mut self, frame: Duration) {
        self.recent_frames.push_back(frame);
        self.recent_total += frame;
        while self.recent_total > TRAILING_WINDOW {
            let Some(oldest) = self.recent_frames.pop_front() else {
                break;
            };
            self.recent_total = self.recent_total.saturating_sub(oldest);
        }
    }
}

/// Assets that can only be created once the macroquad context exists.
struct LoadedAssets {
    font: Option<Font>,
    icons: Option<IconAtlas>,
}

fn load_font(path: &Path) -> Result<Font> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read font at {}", path.display()))?;
    load_ttf_font_from_bytes(&bytes)
        .map_err(|error| anyhow!("failed to parse font at {}: {error:?}", path.display()))
}

fn load_assets(font_path: Option<&Path>, icon_directory: Option<&Path>) -> Result<LoadedAssets> {
    let font = match font_path {
        Some(path) => {
            let font = load_font(path)?;
            info!(path = %path.display(), "loaded label font");
            Some(font)
        }
        None => {
            warn!("no font configured; Japanese labels will not render with the built-in font");
            None
        }
    };

    let icons = match icon_directory {
        Some(directory) => {
            let atlas = IconAtlas::from_directory(directory)
                .context("failed to initialise role icon atlas")?;
            if atlas.is_empty() {
                warn!(directory = %directory.display(), "no role icons found; drawing color discs");
            } else {
                for role in Role::ALL.into_iter().filter(|role| !atlas.contains(*role)) {
                    debug!(%role, "role icon missing; drawing color disc");
                }
                info!(icons = atlas.len(), "loaded role icons");
            }
            Some(atlas)
        }
        None => None,
    };

    Ok(LoadedAssets { font, icons })
}

/// Splits the window into the chart canvas and the control panel origin.
fn split_screen(screen_width: f32, screen_height: f32) -> (Vec2, f32) {
    let panel_width = CONTROL_PANEL_WIDTH.min(screen_width);
    let chart = Vec2::new((screen_width - panel_width).max(0.0), screen_height.max(0.0));
    (chart, chart.x)
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            window_size,
            font_path,
            icon_directory,
        } = self;

        let Presentation {
            window_title,
            theme,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: window_size.0,
            window_height: window_size.1,
            high_dpi: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (init_sender, init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut init_sender = Some(init_sender);
            let mut scene = scene;

            let assets = match load_assets(font_path.as_deref(), icon_directory.as_deref()) {
                Ok(assets) => assets,
                Err(error) => {
                    if let Some(sender) = init_sender.take() {
                        let _ = sender.send(Err(error));
                    }
                    return;
                }
            };
            if let Some(sender) = init_sender.take() {
                let _ = sender.send(Ok(()));
            }

            let background = to_macroquad_color(theme.background);
            let panel_background = to_macroquad_color(theme.panel_background.with_alpha(1.0));
            let mut visualizer = QueueVisualizer::new();
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    info!("quit requested");
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let (chart_size, panel_left) = split_screen(screen_width, screen_height);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input(
                    control_panel_input.take_queue_toggle(),
                    control_panel_input.take_role_toggles(),
                    keyboard,
                );

                update_scene(frame_dt, frame_input, &mut scene);

                let render_start = Instant::now();
                let layout = layers::chart_layout(chart_size, scene.phase.as_ref());
                let radar = visualizer.frame_in(frame_dt, &scene.queue, layout);
                {
                    let mut canvas =
                        MacroquadCanvas::new(chart_size, assets.font, assets.icons.as_ref());
                    layers::draw_scene(&mut canvas, &radar, scene.phase.as_ref(), &theme);
                }

                let panel_width = screen_width - panel_left;
                if panel_width > f32::EPSILON {
                    macroquad::shapes::draw_rectangle(
                        panel_left,
                        0.0,
                        panel_width,
                        screen_height,
                        panel_background,
                    );
                    let mut control_panel_ui = macroquad::ui::root_ui();
                    let ControlPanelUiResult {
                        queue_toggle,
                        toggled_roles,
                    } = draw_control_panel_ui(
                        &mut control_panel_ui,
                        ControlPanelUiContext {
                            origin: MacroquadVec2::new(panel_left, 0.0),
                            size: MacroquadVec2::new(panel_width, screen_height),
                            background: panel_background,
                            in_queue: scene.queue.is_user_in_queue,
                            selected_roles: scene.queue.selected_roles,
                        },
                    );
                    if queue_toggle {
                        control_panel_input.register_queue_toggle();
                    }
                    for role in toggled_roles.iter() {
                        control_panel_input.register_role_toggle(role);
                    }
                }

                let render_duration = render_start.elapsed();
                let fps_metrics = fps_counter.record_frame(FrameTiming {
                    frame: frame_dt,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            "FPS: {:.2} (10s avg: {:.2}) | render: {:>6.2}ms | rings: {}",
                            per_second,
                            trailing_ten_seconds,
                            avg_render.as_secs_f64() * 1_000.0,
                            radar.rings.len(),
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_input_merges_latched_buttons_and_keys() {
        let keyboard = KeyboardShortcuts {
            toggled_roles: [Role::Defender].into_iter().collect(),
            ..KeyboardShortcuts::default()
        };
        let input = gather_frame_input(true, [Role::Attacker].into_iter().collect(), keyboard);

        assert!(input.toggle_queue);
        assert!(input.toggled_roles.contains(Role::Attacker));
        assert!(input.toggled_roles.contains(Role::Defender));
        assert_eq!(input.toggled_roles.len(), 2);
    }

    #[test]
    fn pressing_button_and_key_together_toggles_once() {
        let keyboard = KeyboardShortcuts {
            toggle_queue: true,
            toggled_roles: [Role::Speedster].into_iter().collect(),
            ..KeyboardShortcuts::default()
        };
        let input = gather_frame_input(true, [Role::Speedster].into_iter().collect(), keyboard);

        let mut scene = Scene::default();
        scene.apply_input(input);
        assert!(scene.queue.is_user_in_queue);
        assert!(scene.queue.selected_roles.contains(Role::Speedster));
    }

    #[test]
    fn idle_frame_produces_idle_input() {
        let input = gather_frame_input(false, RoleSet::EMPTY, KeyboardShortcuts::default());
        assert!(input.is_idle());
    }

    #[test]
    fn control_panel_takes_the_right_edge() {
        let (chart, panel_left) = split_screen(1280.0, 800.0);
        assert_eq!(chart, Vec2::new(1040.0, 800.0));
        assert_eq!(panel_left, 1040.0);

        let (narrow, narrow_left) = split_screen(200.0, 300.0);
        assert_eq!(narrow, Vec2::new(0.0, 300.0));
        assert_eq!(narrow_left, 0.0);
    }

    #[test]
    fn window_size_is_kept_positive() {
        let backend = MacroquadBackend::new().with_window_size(0, -5);
        assert_eq!(backend.window_size, (1, 1));
        assert_eq!(MacroquadBackend::default().window_size, DEFAULT_WINDOW_SIZE);
    }

    fn timed(frame_ms: u64) -> FrameTiming {
        FrameTiming {
            frame: Duration::from_millis(frame_ms),
            render: Duration::from_millis(3),
        }
    }

    #[test]
    fn fps_is_reported_once_per_second() {
        let mut counter = FpsCounter::default();
        let reports: Vec<_> = (0..16)
            .filter_map(|_| counter.record_frame(timed(125)))
            .collect();

        assert_eq!(reports.len(), 2);
        for report in reports {
            assert!((report.per_second - 8.0).abs() < 1e-3);
            assert!((report.trailing_ten_seconds - 8.0).abs() < 1e-3);
            assert_eq!(report.avg_render, Duration::from_millis(3));
        }
    }

    #[test]
    fn trailing_rate_forgets_frames_older_than_ten_seconds() {
        let mut counter = FpsCounter::default();
        for _ in 0..20 {
            if let Some(report) = counter.record_frame(timed(500)) {
                assert!((report.per_second - 2.0).abs() < 1e-3);
                assert!((report.trailing_ten_seconds - 2.0).abs() < 1e-3);
            }
        }

        let reports: Vec<_> = (0..4)
            .filter_map(|_| counter.record_frame(timed(250)))
            .collect();
        assert_eq!(reports.len(), 1);
        assert!((reports[0].per_second - 4.0).abs() < 1e-3);
        assert!((reports[0].trailing_ten_seconds - 2.2).abs() < 1e-3);
    }
}
