//! Where queue snapshots and match fields come from.
//!
//! Every source is polled from the render loop with the frame delta and keeps
//! its last good value when a read fails.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use queueboard_core::{
    MatchInfo, MatchInfoError, QueueSnapshot, Role, RoleCounts, WireMatchInfo, WireQueueSnapshot,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upper bound on simulated players waiting for a single role.
const SIMULATED_ROLE_CAP: u32 = 24;

/// Players placed by one simulated match formation.
const SIMULATED_MATCH_SIZE: u32 = 10;

/// Errors raised while reading a JSON feed file.
#[derive(Debug, Error)]
pub(crate) enum SourceError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {} as JSON", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} does not describe a match", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: MatchInfoError,
    },
}

/// Supplier of queue snapshots.
pub(crate) trait QueueInfoSource {
    /// Advances the source by `dt` and returns a snapshot when a fresh one is available.
    fn poll(&mut self, dt: Duration) -> Option<QueueSnapshot>;
}

/// Supplier of the match the user was placed in.
pub(crate) trait MatchSource {
    /// Advances the source by `dt` and returns the current match, if any.
    fn poll(&mut self, dt: Duration, now: i64) -> Option<MatchInfo>;
}

/// JSON file re-read on a fixed interval.
pub(crate) struct JsonFileSource<T> {
    path: PathBuf,
    interval: Duration,
    since_read: Option<Duration>,
    latest: Option<T>,
    load: fn(&Path) -> Result<T, SourceError>,
}

impl<T> fmt::Debug for JsonFileSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFileSource")
            .field("path", &self.path)
            .field("interval", &self.interval)
            .field("has_value", &self.latest.is_some())
            .finish()
    }
}

impl<T: Clone> JsonFileSource<T> {
    fn new(path: PathBuf, interval: Duration, load: fn(&Path) -> Result<T, SourceError>) -> Self {
        Self {
            path,
            interval,
            since_read: None,
            latest: None,
            load,
        }
    }

    /// Re-reads the file once the interval elapsed. Returns `true` when a
    /// fresh value was loaded.
    fn refresh(&mut self, dt: Duration) -> bool {
        let due = match self.since_read.as_mut() {
            None => true,
            Some(since_read) => {
                *since_read = since_read.saturating_add(dt);
                *since_read >= self.interval
            }
        };
        if !due {
            return false;
        }

        self.since_read = Some(Duration::ZERO);
        match (self.load)(&self.path) {
            Ok(value) => {
                self.latest = Some(value);
                true
            }
            Err(error) => {
                warn!("keeping previous value: {:#}", anyhow::Error::new(error));
                false
            }
        }
    }
}

impl JsonFileSource<QueueSnapshot> {
    /// Polls a queue snapshot file.
    pub(crate) fn queue(path: PathBuf, interval: Duration) -> Self {
        Self::new(path, interval, load_queue_snapshot)
    }
}

impl JsonFileSource<MatchInfo> {
    /// Polls a match file.
    pub(crate) fn match_info(path: PathBuf, interval: Duration) -> Self {
        Self::new(path, interval, load_match_info)
    }
}

impl QueueInfoSource for JsonFileSource<QueueSnapshot> {
    fn poll(&mut self, dt: Duration) -> Option<QueueSnapshot> {
        if self.refresh(dt) {
            self.latest
        } else {
            None
        }
    }
}

impl MatchSource for JsonFileSource<MatchInfo> {
    fn poll(&mut self, dt: Duration, _now: i64) -> Option<MatchInfo> {
        let _ = self.refresh(dt);
        self.latest.clone()
    }
}

fn read_json<W: serde::de::DeserializeOwned>(path: &Path) -> Result<W, SourceError> {
    let contents = fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a queue snapshot, tolerating malformed counts and unknown roles.
pub(crate) fn load_queue_snapshot(path: &Path) -> Result<QueueSnapshot, SourceError> {
    let wire: WireQueueSnapshot = read_json(path)?;
    let unknown = wire.unknown_roles();
    if !unknown.is_empty() {
        debug!(path = %path.display(), ?unknown, "ignoring unknown roles");
    }
    Ok(QueueSnapshot::from(wire))
}

/// Reads the current match.
pub(crate) fn load_match_info(path: &Path) -> Result<MatchInfo, SourceError> {
    let wire: WireMatchInfo = read_json(path)?;
    MatchInfo::try_from(wire).map_err(|source| SourceError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Snapshot delivered once, used when no live feed is configured.
#[derive(Debug, Default)]
pub(crate) struct StaticQueue {
    pending: Option<QueueSnapshot>,
}

impl StaticQueue {
    pub(crate) fn new(snapshot: QueueSnapshot) -> Self {
        Self {
            pending: Some(snapshot),
        }
    }
}

impl QueueInfoSource for StaticQueue {
    fn poll(&mut self, _dt: Duration) -> Option<QueueSnapshot> {
        self.pending.take()
    }
}

/// Deterministic random walk over the role counts.
///
/// Every interval each role gains or loses a few players. Once enough players
/// wait, a match may form: the previous match fields are stamped and the
/// counts drop by the match size.
#[derive(Debug)]
pub(crate) struct SimulatedQueue {
    rng: ChaCha8Rng,
    interval: Duration,
    accumulator: Duration,
    started_at: i64,
    elapsed: Duration,
    snapshot: QueueSnapshot,
    started: bool,
}

impl SimulatedQueue {
    pub(crate) fn new(seed: u64, interval: Duration, now: i64) -> Self {
        info!(seed, "simulating queue activity");
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            interval,
            accumulator: Duration::ZERO,
            started_at: now,
            elapsed: Duration::ZERO,
            snapshot: QueueSnapshot::default(),
            started: false,
        }
    }

    /// Simulated wall clock: the start time plus every whole interval stepped so far.
    fn now(&self) -> i64 {
        let elapsed = i64::try_from(self.elapsed.as_secs()).unwrap_or(i64::MAX);
        self.started_at.saturating_add(elapsed)
    }

    fn step(&mut self) {
        let mut counts = self.snapshot.role_counts;
        for role in Role::ALL {
            let delta: i64 = self.rng.gen_range(-2..=3);
            let next = (i64::from(counts.get(role)) + delta).clamp(0, i64::from(SIMULATED_ROLE_CAP));
            counts.set(role, u32::try_from(next).unwrap_or(0));
        }

        let mut total_waiting = unique_waiting(&mut self.rng, &counts);
        if total_waiting >= SIMULATED_MATCH_SIZE && self.rng.gen_bool(0.2) {
            for role in Role::ALL {
                counts.set(role, counts.get(role).saturating_sub(SIMULATED_MATCH_SIZE / 5));
            }
            self.snapshot.previous_matched_at = Some(self.now());
            self.snapshot.previous_matched_count = Some(SIMULATED_MATCH_SIZE);
            self.snapshot.ongoing_matches = self.snapshot.ongoing_matches.saturating_add(1);
            total_waiting = unique_waiting(&mut self.rng, &counts);
            debug!(at = self.now(), "simulated match formed");
        } else if self.snapshot.ongoing_matches > 0 && self.rng.gen_bool(0.1) {
            self.snapshot.ongoing_matches -= 1;
        }

        self.snapshot.role_counts = counts;
        self.snapshot.total_waiting = total_waiting;
    }
}

/// Unique players behind the per-role counts: at least the largest role,
/// at most every entry belonging to a different player.
fn unique_waiting(rng: &mut ChaCha8Rng, counts: &RoleCounts) -> u32 {
    let largest = counts.iter().map(|(_, count)| count).max().unwrap_or(0);
    let entries = u32::try_from(counts.total_entries()).unwrap_or(u32::MAX);
    if entries <= largest {
        return largest;
    }
    rng.gen_range(largest..=entries)
}

impl QueueInfoSource for SimulatedQueue {
    fn poll(&mut self, dt: Duration) -> Option<QueueSnapshot> {
        if !self.started {
            self.started = true;
            self.step();
            return Some(self.snapshot);
        }
        if self.interval.is_zero() {
            return None;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut stepped = false;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            self.elapsed = self.elapsed.saturating_add(self.interval);
            self.step();
            stepped = true;
        }
        stepped.then_some(self.snapshot)
    }
}

/// Match described on the command line.
///
/// With a lobby delay the lobby number only appears once the match is that
/// many seconds old, which walks the timer through every phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FixedMatch {
    started_at: i64,
    lobby_number: Option<String>,
    lobby_after: Option<u64>,
}

impl FixedMatch {
    pub(crate) fn new(started_at: i64, lobby_number: Option<String>, lobby_after: Option<u64>) -> Self {
        Self {
            started_at,
            lobby_number,
            lobby_after,
        }
    }

    fn lobby_visible(&self, now: i64) -> bool {
        match self.lobby_after {
            None => true,
            Some(delay) => {
                let age = now.saturating_sub(self.started_at);
                age >= 0 && age.unsigned_abs() >= delay
            }
        }
    }
}

impl MatchSource for FixedMatch {
    fn poll(&mut self, _dt: Duration, now: i64) -> Option<MatchInfo> {
        let lobby_number = self
            .lobby_number
            .clone()
            .filter(|_| self.lobby_visible(now));
        Some(MatchInfo::new(self.started_at, lobby_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let directory = std::env::temp_dir().join(format!("queueboard-sources-{}", process::id()));
        fs::create_dir_all(&directory).expect("temp dir");
        let path = directory.join(name);
        fs::write(&path, contents).expect("write feed");
        path
    }

    #[test]
    fn queue_file_is_parsed_leniently() {
        let path = temp_file(
            "lenient.json",
            r#"{
                "role_counts": {"attacker": 3, "defender": "2", "healer": 9, "speedster": "lots"},
                "total_waiting": 4,
                "previous_matched_unixtime": 0
            }"#,
        );
        let snapshot = load_queue_snapshot(&path).expect("snapshot parses");

        assert_eq!(snapshot.role_counts.get(Role::Attacker), 3);
        assert_eq!(snapshot.role_counts.get(Role::Defender), 2);
        assert_eq!(snapshot.role_counts.get(Role::Speedster), 0);
        assert_eq!(snapshot.total_waiting, 4);
        assert_eq!(snapshot.previous_matched_at, Some(0));
        assert_eq!(snapshot.previous_matched_count, None);
    }

    #[test]
    fn file_source_keeps_last_good_value() {
        let path = temp_file("queue.json", r#"{"total_waiting": 7}"#);
        let mut source = JsonFileSource::queue(path.clone(), Duration::from_secs(2));

        let first = source.poll(Duration::ZERO).expect("first poll reads immediately");
        assert_eq!(first.total_waiting, 7);
        assert!(source.poll(Duration::from_secs(1)).is_none());

        fs::write(&path, "{ not json").expect("corrupt feed");
        assert!(source.poll(Duration::from_secs(1)).is_none());
        assert_eq!(source.latest.map(|snapshot| snapshot.total_waiting), Some(7));

        fs::write(&path, r#"{"total_waiting": 9}"#).expect("repair feed");
        let repaired = source
            .poll(Duration::from_secs(2))
            .expect("next interval reads again");
        assert_eq!(repaired.total_waiting, 9);
    }

    #[test]
    fn match_file_requires_a_start_time() {
        let valid = temp_file("match.json", r#"{"started_at": "1709600000", "lobby_number": 4821}"#);
        let info = load_match_info(&valid).expect("match parses");
        assert_eq!(info.started_at(), 1_709_600_000);
        assert_eq!(info.lobby_number(), Some("4821"));

        let invalid = temp_file("no-start.json", r#"{"lobby_number": "12"}"#);
        assert!(matches!(
            load_match_info(&invalid),
            Err(SourceError::Invalid {
                source: MatchInfoError::MissingStartTime,
                ..
            })
        ));

        let missing = std::env::temp_dir().join("queueboard-definitely-missing.json");
        assert!(matches!(
            load_match_info(&missing),
            Err(SourceError::Read { .. })
        ));
    }

    #[test]
    fn match_source_repeats_latest_match() {
        let path = temp_file("repeat.json", r#"{"started_at": 100}"#);
        let mut source = JsonFileSource::match_info(path, Duration::from_secs(5));
        let first = source.poll(Duration::ZERO, 150);
        let second = source.poll(Duration::from_millis(16), 150);
        assert_eq!(first, Some(MatchInfo::new(100, None)));
        assert_eq!(first, second);
    }

    #[test]
    fn simulation_is_deterministic_per_seed() {
        let run = |seed| {
            let mut queue = SimulatedQueue::new(seed, Duration::from_secs(1), 1_000);
            let mut snapshots = Vec::new();
            for _ in 0..30 {
                if let Some(snapshot) = queue.poll(Duration::from_millis(500)) {
                    snapshots.push(snapshot);
                }
            }
            snapshots
        };

        let first = run(7);
        assert_eq!(first.len(), 15);
        assert_eq!(first, run(7));
    }

    #[test]
    fn simulated_clock_advances_with_sub_second_intervals() {
        let mut queue = SimulatedQueue::new(3, Duration::from_millis(250), 5_000);
        let mut match_times = Vec::new();
        for _ in 0..400 {
            if let Some(at) = queue
                .poll(Duration::from_millis(250))
                .and_then(|snapshot| snapshot.previous_matched_at)
            {
                match_times.push(at);
            }
        }

        assert_eq!(queue.now(), 5_000 + 99);
        assert!(match_times.iter().all(|at| (5_000..=5_099).contains(at)));
        assert!(match_times.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn simulated_counts_stay_consistent() {
        let mut queue = SimulatedQueue::new(99, Duration::from_secs(1), 0);
        for _ in 0..200 {
            let Some(snapshot) = queue.poll(Duration::from_secs(1)) else {
                continue;
            };
            let largest = snapshot
                .role_counts
                .iter()
                .map(|(_, count)| count)
                .max()
                .unwrap_or(0);
            assert!(snapshot.total_waiting >= largest);
            assert!(u64::from(snapshot.total_waiting) <= snapshot.role_counts.total_entries().max(u64::from(largest)));
            assert!(snapshot
                .role_counts
                .iter()
                .all(|(_, count)| count <= SIMULATED_ROLE_CAP));
        }
    }

    #[test]
    fn fixed_match_reveals_lobby_after_delay() {
        let mut fixed = FixedMatch::new(1_000, Some("4821".to_owned()), Some(60));
        assert_eq!(
            fixed.poll(Duration::ZERO, 1_030),
            Some(MatchInfo::new(1_000, None))
        );
        assert_eq!(
            fixed.poll(Duration::ZERO, 1_060),
            Some(MatchInfo::new(1_000, Some("4821".to_owned())))
        );

        let mut immediate = FixedMatch::new(1_000, Some("7".to_owned()), None);
        assert_eq!(
            immediate
                .poll(Duration::ZERO, 0)
                .and_then(|info| info.lobby_number().map(str::to_owned)),
            Some("7".to_owned())
        );
    }

    #[test]
    fn static_queue_delivers_once() {
        let mut queue = StaticQueue::new(QueueSnapshot::default());
        assert!(queue.poll(Duration::ZERO).is_some());
        assert!(queue.poll(Duration::from_secs(5)).is_none());
    }
}
