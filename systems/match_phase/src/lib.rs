#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Match lobby phase tracking driven purely by wall-clock time.
//!
//! A [`MatchPhaseTimer`] is mounted when a match is shown, recomputes its
//! phase on every one-second [`Ticker`] tick and exposes a [`PhaseView`]
//! with the countdown and the copy shown to participants.

mod copy;

pub use copy::{format_clock, PhaseCopy};

use std::time::Duration;

use queueboard_core::{MatchInfo, MatchPhase, MatchSettings};
use tracing::{debug, info};

/// Remaining time at or below which the countdown is shown as a warning.
pub const URGENT_THRESHOLD_SECS: u64 = 30;

/// Interval between phase recomputations.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Seconds elapsed between `started_at` and `now`; a start in the future counts as zero.
#[must_use]
pub fn elapsed_since(started_at: i64, now: i64) -> u64 {
    u64::try_from(now.saturating_sub(started_at)).unwrap_or(0)
}

/// Phase a freshly mounted timer starts in.
#[must_use]
pub fn initial_phase(elapsed: u64, has_lobby_number: bool, settings: &MatchSettings) -> MatchPhase {
    if has_lobby_number {
        if elapsed >= settings.lobby_join_timeout() {
            MatchPhase::MatchReady
        } else {
            MatchPhase::LobbyJoin
        }
    } else if elapsed >= settings.lobby_create_timeout() {
        MatchPhase::LobbyWaiting
    } else {
        MatchPhase::LobbyCreate
    }
}

/// Applies at most one transition rule to `phase`.
#[must_use]
pub fn next_phase(
    phase: MatchPhase,
    elapsed: u64,
    has_lobby_number: bool,
    settings: &MatchSettings,
) -> MatchPhase {
    match phase {
        MatchPhase::LobbyCreate | MatchPhase::LobbyWaiting if has_lobby_number => {
            MatchPhase::LobbyJoin
        }
        MatchPhase::LobbyCreate if elapsed >= settings.lobby_create_timeout() => {
            MatchPhase::LobbyWaiting
        }
        MatchPhase::LobbyJoin if elapsed >= settings.lobby_join_timeout() => {
            MatchPhase::MatchReady
        }
        unchanged => unchanged,
    }
}

/// Seconds left before the deadline relevant to `phase`; zero for phases
/// without a countdown.
#[must_use]
pub fn remaining_seconds(phase: MatchPhase, elapsed: u64, settings: &MatchSettings) -> u64 {
    match phase {
        MatchPhase::LobbyCreate => settings.lobby_create_timeout().saturating_sub(elapsed),
        MatchPhase::LobbyJoin => settings.lobby_join_timeout().saturating_sub(elapsed),
        MatchPhase::LobbyWaiting | MatchPhase::MatchReady => 0,
    }
}

/// Returns `true` for phases that display a countdown.
#[must_use]
pub const fn shows_countdown(phase: MatchPhase) -> bool {
    matches!(phase, MatchPhase::LobbyCreate | MatchPhase::LobbyJoin)
}

/// Phase change reported by [`MatchPhaseTimer::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase before the tick.
    pub from: MatchPhase,
    /// Phase after the tick.
    pub to: MatchPhase,
    /// Seconds since match formation when the change happened.
    pub elapsed: u64,
}

/// Presentation of the timer's current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseView {
    /// Current phase.
    pub phase: MatchPhase,
    /// Seconds since match formation.
    pub elapsed: u64,
    /// Seconds left on the phase deadline; zero when the phase has none.
    pub remaining: u64,
    /// Whether the countdown is in its warning window.
    pub is_urgent: bool,
    /// Lobby number, once published.
    pub lobby_number: Option<String>,
    /// Heading and body copy.
    pub copy: PhaseCopy,
}

impl PhaseView {
    /// `M:SS` countdown for phases that have one.
    #[must_use]
    pub fn countdown(&self) -> Option<String> {
        shows_countdown(self.phase).then(|| format_clock(self.remaining))
    }

    /// `M:SS` time since match formation.
    #[must_use]
    pub fn elapsed_clock(&self) -> String {
        format_clock(self.elapsed)
    }
}

/// Client-side lobby lifecycle for one match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchPhaseTimer {
    info: MatchInfo,
    settings: MatchSettings,
    phase: MatchPhase,
    elapsed: u64,
}

impl MatchPhaseTimer {
    /// Mounts a timer, selecting the initial phase from the inputs at `now`.
    #[must_use]
    pub fn new(info: MatchInfo, settings: MatchSettings, now: i64) -> Self {
        let elapsed = elapsed_since(info.started_at(), now);
        let phase = initial_phase(elapsed, info.lobby_number().is_some(), &settings);
        debug!(%phase, elapsed, "match phase timer mounted");

        Self {
            info,
            settings,
            phase,
            elapsed,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Seconds since match formation as of the last tick.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Match fields the timer is tracking.
    #[must_use]
    pub fn info(&self) -> &MatchInfo {
        &self.info
    }

    /// Timeouts in effect.
    #[must_use]
    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Records a lobby number update; the phase follows on the next tick.
    pub fn set_lobby_number(&mut self, lobby_number: Option<String>) {
        self.info = MatchInfo::new(self.info.started_at(), lobby_number);
    }

    /// Replaces the timeouts; the phase follows on the next tick.
    pub fn set_settings(&mut self, settings: MatchSettings) {
        self.settings = settings;
    }

    /// Applies fresh match fields. A different start time means a different
    /// match, so the timer is remounted; otherwise only the lobby number is
    /// taken over.
    pub fn sync(&mut self, info: MatchInfo, now: i64) {
        if info.started_at() != self.info.started_at() {
            *self = Self::new(info, self.settings, now);
        } else {
            self.info = info;
        }
    }

    /// Recomputes elapsed time and applies at most one transition.
    pub fn tick(&mut self, now: i64) -> Option<PhaseTransition> {
        self.elapsed = elapsed_since(self.info.started_at(), now);
        let next = next_phase(
            self.phase,
            self.elapsed,
            self.info.lobby_number().is_some(),
            &self.settings,
        );
        if next == self.phase {
            return None;
        }

        let transition = PhaseTransition {
            from: self.phase,
            to: next,
            elapsed: self.elapsed,
        };
        info!(
            from = %transition.from,
            to = %transition.to,
            elapsed = transition.elapsed,
            "match phase changed"
        );
        self.phase = next;
        Some(transition)
    }

    /// Builds the presentation of the current state.
    #[must_use]
    pub fn view(&self) -> PhaseView {
        let remaining = remaining_seconds(self.phase, self.elapsed, &self.settings);
        let lobby_number = self.info.lobby_number().map(str::to_owned);
        PhaseView {
            phase: self.phase,
            elapsed: self.elapsed,
            remaining,
            is_urgent: remaining > 0 && remaining <= URGENT_THRESHOLD_SECS,
            copy: PhaseCopy::for_state(self.phase, remaining, self.elapsed, lobby_number.as_deref()),
            lobby_number,
        }
    }
}

/// Fixed-interval tick source fed with frame deltas.
#[derive(Clone, Copy, Debug)]
pub struct Ticker {
    interval: Duration,
    accumulator: Duration,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Ticker {
    /// Creates a ticker firing every `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Accumulates `dt` and returns how many whole intervals completed.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut ticks = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_never_goes_negative() {
        assert_eq!(elapsed_since(100, 40), 0);
        assert_eq!(elapsed_since(100, 160), 60);
        assert_eq!(elapsed_since(i64::MIN, i64::MAX), u64::try_from(i64::MAX).unwrap_or(0));
    }

    #[test]
    fn ticker_reports_whole_intervals() {
        let mut ticker = Ticker::default();
        assert_eq!(ticker.advance(Duration::from_millis(600)), 0);
        assert_eq!(ticker.advance(Duration::from_millis(600)), 1);
        assert_eq!(ticker.advance(Duration::from_millis(2_900)), 3);
        assert_eq!(ticker.advance(Duration::from_millis(100)), 0);
    }

    #[test]
    fn zero_interval_ticker_never_fires() {
        let mut ticker = Ticker::new(Duration::ZERO);
        assert_eq!(ticker.advance(Duration::from_secs(5)), 0);
    }

    #[test]
    fn waiting_and_ready_have_no_countdown() {
        let settings = MatchSettings::default();
        assert_eq!(remaining_seconds(MatchPhase::LobbyWaiting, 10, &settings), 0);
        assert_eq!(remaining_seconds(MatchPhase::MatchReady, 10, &settings), 0);
        assert!(!shows_countdown(MatchPhase::MatchReady));
    }
}
