use std::time::Duration;

use queueboard_core::{MatchInfo, MatchPhase, MatchSettings};
use queueboard_system_match_phase::{MatchPhaseTimer, PhaseTransition, Ticker};

const NOW: i64 = 1_709_600_000;

fn timer(started_ago: i64, lobby: Option<&str>) -> MatchPhaseTimer {
    MatchPhaseTimer::new(
        MatchInfo::new(NOW - started_ago, lobby.map(str::to_owned)),
        MatchSettings::default(),
        NOW,
    )
}

#[test]
fn initial_phase_without_lobby_depends_on_create_timeout() {
    assert_eq!(timer(200, None).phase(), MatchPhase::LobbyWaiting);
    assert_eq!(timer(50, None).phase(), MatchPhase::LobbyCreate);
    assert_eq!(timer(150, None).phase(), MatchPhase::LobbyWaiting);
}

#[test]
fn initial_phase_with_lobby_depends_on_join_timeout() {
    assert_eq!(timer(100, Some("77")).phase(), MatchPhase::LobbyJoin);
    assert_eq!(timer(260, Some("77")).phase(), MatchPhase::MatchReady);
}

#[test]
fn future_start_counts_as_zero_elapsed() {
    let timer = timer(-30, None);
    assert_eq!(timer.elapsed(), 0);
    assert_eq!(timer.phase(), MatchPhase::LobbyCreate);
    assert_eq!(timer.view().remaining, 150);
}

#[test]
fn lobby_number_moves_create_to_join_on_next_tick() {
    let mut timer = timer(10, None);
    assert_eq!(timer.phase(), MatchPhase::LobbyCreate);

    timer.set_lobby_number(Some("1234".to_owned()));
    assert_eq!(timer.phase(), MatchPhase::LobbyCreate);

    let transition = timer.tick(NOW + 1);
    assert_eq!(
        transition,
        Some(PhaseTransition {
            from: MatchPhase::LobbyCreate,
            to: MatchPhase::LobbyJoin,
            elapsed: 11,
        })
    );
    assert_eq!(timer.view().lobby_number.as_deref(), Some("1234"));
}

#[test]
fn lobby_number_rescues_waiting_phase() {
    let mut timer = timer(200, None);
    timer.set_lobby_number(Some("9".to_owned()));
    let _ = timer.tick(NOW + 1);
    assert_eq!(timer.phase(), MatchPhase::LobbyJoin);
}

#[test]
fn join_expires_into_match_ready_with_nothing_remaining() {
    let mut timer = timer(100, Some("55"));
    assert_eq!(timer.phase(), MatchPhase::LobbyJoin);
    assert_eq!(timer.view().remaining, 150);

    let _ = timer.tick(NOW + 160);
    assert_eq!(timer.phase(), MatchPhase::MatchReady);
    let view = timer.view();
    assert_eq!(view.elapsed, 260);
    assert_eq!(view.remaining, 0);
    assert_eq!(view.countdown(), None);
}

#[test]
fn join_countdown_is_measured_from_match_start() {
    let mut timer = timer(120, None);
    timer.set_lobby_number(Some("8".to_owned()));
    let _ = timer.tick(NOW);
    assert_eq!(timer.phase(), MatchPhase::LobbyJoin);
    assert_eq!(timer.view().remaining, 130);
    assert_eq!(timer.view().countdown().as_deref(), Some("2:10"));
}

#[test]
fn one_transition_per_tick() {
    let mut timer = timer(10, None);
    timer.set_lobby_number(Some("3".to_owned()));

    // Far enough in the future for both the join rule and the join timeout.
    let _ = timer.tick(NOW + 1_000);
    assert_eq!(timer.phase(), MatchPhase::LobbyJoin);
    let _ = timer.tick(NOW + 1_001);
    assert_eq!(timer.phase(), MatchPhase::MatchReady);
    assert_eq!(timer.tick(NOW + 1_002), None);
}

#[test]
fn create_timeout_moves_to_waiting_and_stays() {
    let mut timer = timer(140, None);
    assert_eq!(timer.tick(NOW + 5), None);
    let transition = timer.tick(NOW + 10).map(|change| change.to);
    assert_eq!(transition, Some(MatchPhase::LobbyWaiting));

    for offset in 11..400 {
        assert_eq!(timer.tick(NOW + offset), None);
    }
    assert_eq!(timer.phase(), MatchPhase::LobbyWaiting);
}

#[test]
fn removed_lobby_number_does_not_regress_phase() {
    let mut timer = timer(30, Some("12"));
    timer.set_lobby_number(None);
    assert_eq!(timer.tick(NOW + 1), None);
    assert_eq!(timer.phase(), MatchPhase::LobbyJoin);
}

#[test]
fn urgency_window_is_last_thirty_seconds() {
    let mut timer = timer(100, None);
    assert!(!timer.view().is_urgent);

    let _ = timer.tick(NOW + 20);
    let view = timer.view();
    assert_eq!(view.remaining, 30);
    assert!(view.is_urgent);

    let _ = timer.tick(NOW + 50);
    assert_eq!(timer.phase(), MatchPhase::LobbyWaiting);
    assert!(!timer.view().is_urgent);
}

#[test]
fn messages_differ_before_and_after_expiry() {
    let before = timer(100, None).view();
    let after = timer(200, None).view();
    assert_ne!(before.copy.message, after.copy.message);
    assert!(before.copy.message.contains("0:50"));

    let joining = timer(100, Some("4821")).view();
    let ready = timer(300, Some("4821")).view();
    assert!(joining.copy.message.contains("4821"));
    assert_ne!(joining.copy.title, ready.copy.title);
}

#[test]
fn custom_timeouts_are_respected() {
    let timer = MatchPhaseTimer::new(
        MatchInfo::new(NOW - 70, None),
        MatchSettings::new(60, 120),
        NOW,
    );
    assert_eq!(timer.phase(), MatchPhase::LobbyWaiting);
}

#[test]
fn new_start_time_remounts_the_timer() {
    let mut timer = timer(200, None);
    timer.sync(MatchInfo::new(NOW - 5, None), NOW);
    assert_eq!(timer.phase(), MatchPhase::LobbyCreate);
    assert_eq!(timer.elapsed(), 5);

    timer.sync(MatchInfo::new(NOW - 5, Some("61".to_owned())), NOW);
    assert_eq!(timer.phase(), MatchPhase::LobbyCreate);
    let _ = timer.tick(NOW + 1);
    assert_eq!(timer.phase(), MatchPhase::LobbyJoin);
}

#[test]
fn ticker_emits_one_tick_per_accumulated_second() {
    let mut ticker = Ticker::default();
    let mut ticks = 0;
    for _ in 0..600 {
        ticks += ticker.advance(Duration::from_micros(16_667));
    }
    // 600 frames at 60 Hz span ten seconds plus a couple of hundred microseconds.
    assert_eq!(ticks, 10);
}
