#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that opens the queue board or reports a match phase.

mod board;
mod config;
mod sources;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use queueboard_core::{Clock, MatchInfo, QueueSnapshot, Role, SystemClock};
use queueboard_rendering::{Presentation, RenderingBackend, Scene, Theme};
use queueboard_rendering_macroquad::MacroquadBackend;
use queueboard_system_match_phase::{MatchPhaseTimer, PhaseView};
use queueboard_system_radar::QueueBoardProps;
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::{
    board::BoardDriver,
    config::Config,
    sources::{FixedMatch, JsonFileSource, MatchSource, QueueInfoSource, SimulatedQueue, StaticQueue},
};

const DEFAULT_LOG_FILTER: &str = "queueboard=info";

/// Live matchmaking queue radar and match phase timer.
#[derive(Debug, Parser)]
#[command(name = "queueboard", version)]
struct Cli {
    /// Path to the TOML config file (defaults to ./queueboard.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the queue board window.
    Show(ShowArgs),
    /// Print the phase of a match without opening a window.
    Phase(PhaseArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// JSON file polled for queue snapshots.
    #[arg(long, value_name = "PATH", conflicts_with = "simulate")]
    snapshot: Option<PathBuf>,

    /// Drive the board with a simulated queue.
    #[arg(long)]
    simulate: bool,

    /// Seed for the simulated queue.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file polled for the current match.
    #[arg(long = "match", value_name = "PATH", conflicts_with = "started_ago")]
    match_file: Option<PathBuf>,

    /// Track a match formed this many seconds ago.
    #[arg(long, value_name = "SECONDS")]
    started_ago: Option<u64>,

    /// Lobby number of the tracked match.
    #[arg(long, value_name = "NUMBER", requires = "started_ago")]
    lobby_number: Option<String>,

    /// Reveal the lobby number once the match is this many seconds old.
    #[arg(long, value_name = "SECONDS", requires = "lobby_number")]
    lobby_after: Option<u64>,

    /// Start with the user in the queue.
    #[arg(long)]
    in_queue: bool,

    /// Role the user queues for; repeat for several roles.
    #[arg(long = "role", value_name = "ROLE", value_parser = parse_role)]
    roles: Vec<Role>,

    /// Synchronise presentation with the display refresh rate.
    #[arg(long, value_name = "BOOL")]
    vsync: Option<bool>,

    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,
}

#[derive(Debug, Args)]
struct PhaseArgs {
    /// Seconds since the match was formed.
    #[arg(long, value_name = "SECONDS")]
    started_ago: u64,

    /// Lobby number published by the host.
    #[arg(long, value_name = "NUMBER")]
    lobby_number: Option<String>,
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::from_id(value).ok_or_else(|| {
        let known: Vec<_> = Role::ALL.iter().map(|role| role.id()).collect();
        format!("unknown role `{value}`; expected one of {}", known.join(", "))
    })
}

/// Entry point for the queue board command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Show(args) => run_show(config, args),
        Command::Phase(args) => {
            println!("{}", run_phase(&config, &args, &SystemClock));
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn started_at(now: i64, started_ago: u64) -> i64 {
    now.saturating_sub(i64::try_from(started_ago).unwrap_or(i64::MAX))
}

fn run_phase(config: &Config, args: &PhaseArgs, clock: &impl Clock) -> String {
    let now = clock.now_unix();
    let info = MatchInfo::new(started_at(now, args.started_ago), args.lobby_number.clone());
    let timer = MatchPhaseTimer::new(info, config.match_settings(), now);
    phase_report(&timer.view())
}

fn phase_report(view: &PhaseView) -> String {
    let countdown = view.countdown().unwrap_or_else(|| "-".to_owned());
    let urgent = if view.is_urgent { " (urgent)" } else { "" };
    [
        format!("phase: {}", view.phase),
        format!("title: {}", view.copy.title),
        format!("countdown: {countdown}{urgent}"),
        format!("elapsed: {}", view.elapsed_clock()),
        format!("lobby: {}", view.lobby_number.as_deref().unwrap_or("-")),
        format!("message: {}", view.copy.message),
    ]
    .join("\n")
}

fn run_show(config: Config, args: ShowArgs) -> Result<()> {
    let clock = SystemClock;
    let now = clock.now_unix();
    let poll_interval = Duration::from_millis(config.sources.poll_interval_ms);

    let theme = Theme::default()
        .with_grid_spacing(config.display.grid_spacing)?
        .with_display_offset(config.display_offset()?);

    let queue: Box<dyn QueueInfoSource> = match args.snapshot.or(config.sources.snapshot.clone()) {
        Some(path) if !args.simulate => {
            info!(path = %path.display(), "polling queue snapshots");
            Box::new(JsonFileSource::queue(path, poll_interval))
        }
        _ if args.simulate => {
            let seed = args.seed.or(config.sources.seed).unwrap_or_else(rand::random);
            Box::new(SimulatedQueue::new(seed, poll_interval, now))
        }
        _ => {
            info!("no queue source configured; showing an empty queue");
            Box::new(StaticQueue::new(QueueSnapshot::default()))
        }
    };

    let matches: Option<Box<dyn MatchSource>> =
        match (args.match_file.or(config.sources.match_info.clone()), args.started_ago) {
            (_, Some(started_ago)) => Some(Box::new(FixedMatch::new(
                started_at(now, started_ago),
                args.lobby_number,
                args.lobby_after,
            ))),
            (Some(path), None) => {
                info!(path = %path.display(), "polling match info");
                Some(Box::new(JsonFileSource::match_info(path, poll_interval)))
            }
            (None, None) => None,
        };

    let scene = Scene::new(
        QueueBoardProps {
            snapshot: QueueSnapshot::default(),
            is_user_in_queue: args.in_queue,
            selected_roles: args.roles.into_iter().collect(),
        },
        None,
    );
    let mut driver = BoardDriver::new(queue, matches, config.match_settings(), clock);

    let backend = MacroquadBackend::new()
        .with_vsync(args.vsync.unwrap_or(config.window.vsync))
        .with_show_fps(args.show_fps || config.window.show_fps)
        .with_window_size(config.window.width, config.window.height)
        .with_font(config.assets.font)
        .with_icon_directory(config.assets.icon_dir);
    let presentation = Presentation::new(config.window.title, theme, scene);

    backend.run(presentation, move |dt, input, scene| {
        driver.update(dt, input, scene);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_unix(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_repeated_roles() {
        let cli = Cli::try_parse_from([
            "queueboard",
            "show",
            "--simulate",
            "--role",
            "attacker",
            "--role",
            "All-Rounder",
            "--vsync",
            "false",
        ])
        .expect("arguments parse");

        let Command::Show(args) = cli.command else {
            panic!("expected the show command");
        };
        assert!(args.simulate);
        assert_eq!(args.roles, vec![Role::Attacker, Role::AllRounder]);
        assert_eq!(args.vsync, Some(false));
    }

    #[test]
    fn show_rejects_unknown_roles_and_conflicting_sources() {
        assert!(Cli::try_parse_from(["queueboard", "show", "--role", "healer"]).is_err());
        assert!(Cli::try_parse_from([
            "queueboard",
            "show",
            "--simulate",
            "--snapshot",
            "queue.json"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["queueboard", "show", "--lobby-number", "12"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "queueboard",
            "phase",
            "--started-ago",
            "50",
            "--config",
            "board.toml",
        ])
        .expect("arguments parse");
        assert_eq!(cli.config, Some(PathBuf::from("board.toml")));
    }

    #[test]
    fn phase_report_for_a_fresh_match() {
        let args = PhaseArgs {
            started_ago: 50,
            lobby_number: None,
        };
        let report = run_phase(&Config::default(), &args, &FixedClock(1_709_600_000));
        let lines: Vec<_> = report.lines().collect();

        assert_eq!(lines[0], "phase: lobby_create");
        assert_eq!(lines[1], "title: ロビー作成中");
        assert_eq!(lines[2], "countdown: 1:40");
        assert_eq!(lines[3], "elapsed: 0:50");
        assert_eq!(lines[4], "lobby: -");
    }

    #[test]
    fn phase_report_for_an_expired_join_window() {
        let args = PhaseArgs {
            started_ago: 260,
            lobby_number: Some("4821".to_owned()),
        };
        let report = run_phase(&Config::default(), &args, &FixedClock(1_709_600_000));

        assert!(report.starts_with("phase: match_ready\n"));
        assert!(report.contains("countdown: -\n"));
        assert!(report.contains("lobby: 4821\n"));
    }

    #[test]
    fn phase_report_flags_urgency() {
        let args = PhaseArgs {
            started_ago: 230,
            lobby_number: Some("4821".to_owned()),
        };
        let report = run_phase(&Config::default(), &args, &FixedClock(0));
        assert!(report.contains("countdown: 0:20 (urgent)"));
    }

    #[test]
    fn started_at_saturates() {
        assert_eq!(started_at(100, 40), 60);
        assert_eq!(started_at(i64::MIN + 1, u64::MAX), i64::MIN);
    }
}
