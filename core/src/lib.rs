#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the queue board.
//!
//! This crate defines the data surface that connects the external sources
//! (queue poller, match feed, settings lookup), the pure systems and the
//! rendering adapters. Sources produce [`QueueSnapshot`], [`MatchInfo`] and
//! [`MatchSettings`] values, systems derive presentation geometry and phase
//! state from them, and adapters draw the result. Nothing in here performs
//! I/O.

mod time;
mod wire;

pub use time::{
    default_display_offset, format_time, format_time_with_offset, Clock, SystemClock,
    DEFAULT_DISPLAY_OFFSET_SECONDS, NO_TIMESTAMP_PLACEHOLDER,
};
pub use wire::{LenientValue, MatchInfoError, WireMatchInfo, WireQueueSnapshot, WireRoleCounts};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of roles players can queue for.
pub const ROLE_COUNT: usize = 5;

/// Lobby creation timeout applied when the settings lookup has no usable value.
pub const DEFAULT_LOBBY_CREATE_TIMEOUT_SECS: u64 = 150;

/// Lobby join timeout applied when the settings lookup has no usable value.
pub const DEFAULT_LOBBY_JOIN_TIMEOUT_SECS: u64 = 250;

/// Settings key holding the lobby creation timeout in seconds.
pub const LOBBY_CREATE_TIMEOUT_KEY: &str = "lobby_create_timeout";

/// Settings key holding the lobby join timeout in seconds.
pub const LOBBY_JOIN_TIMEOUT_KEY: &str = "lobby_join_timeout";

/// Role a player can queue for. Declaration order is the chart order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Damage-focused ranged role.
    Attacker,
    /// Balanced melee role.
    AllRounder,
    /// Mobility-focused role.
    Speedster,
    /// Frontline tank role.
    Defender,
    /// Healing and utility role.
    Supporter,
}

impl Role {
    /// Every role in chart order.
    pub const ALL: [Role; ROLE_COUNT] = [
        Role::Attacker,
        Role::AllRounder,
        Role::Speedster,
        Role::Defender,
        Role::Supporter,
    ];

    /// Zero-based position of the role in chart order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Static presentation data associated with the role.
    #[must_use]
    pub fn style(self) -> &'static RoleStyle {
        &ROLE_STYLES[self.index()]
    }

    /// Identifier used by the backend wire format.
    #[must_use]
    pub fn id(self) -> &'static str {
        self.style().id
    }

    /// Resolves a wire identifier, tolerating case and `-` separators.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let normalized = id.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|role| role.id() == normalized)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Opaque byte RGB color attached to a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoleColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RoleColor {
    /// Creates a new role color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Static presentation data for a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleStyle {
    /// Identifier used by the backend wire format.
    pub id: &'static str,
    /// Label shown in the legend.
    pub label: &'static str,
    /// Slice, ring and legend accent color.
    pub color: RoleColor,
    /// Icon image path relative to the asset directory.
    pub icon_path: &'static str,
}

static ROLE_STYLES: [RoleStyle; ROLE_COUNT] = [
    RoleStyle {
        id: "attacker",
        label: "アタック型",
        color: RoleColor::from_rgb(0xf1, 0x6c, 0x38),
        icon_path: "roles/attacker.png",
    },
    RoleStyle {
        id: "all_rounder",
        label: "バランス型",
        color: RoleColor::from_rgb(0xce, 0x5f, 0xd3),
        icon_path: "roles/all_rounder.png",
    },
    RoleStyle {
        id: "speedster",
        label: "スピード型",
        color: RoleColor::from_rgb(0x24, 0x92, 0xc9),
        icon_path: "roles/speedster.png",
    },
    RoleStyle {
        id: "defender",
        label: "ディフェンス型",
        color: RoleColor::from_rgb(0xac, 0xd3, 0x6c),
        icon_path: "roles/defender.png",
    },
    RoleStyle {
        id: "supporter",
        label: "サポート型",
        color: RoleColor::from_rgb(0xe1, 0xb4, 0x48),
        icon_path: "roles/supporter.png",
    },
];

/// Waiting player counts indexed by role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoleCounts {
    counts: [u32; ROLE_COUNT],
}

impl RoleCounts {
    /// Creates counts from values listed in chart order.
    #[must_use]
    pub const fn from_array(counts: [u32; ROLE_COUNT]) -> Self {
        Self { counts }
    }

    /// Number of players waiting for the role.
    #[must_use]
    pub const fn get(&self, role: Role) -> u32 {
        self.counts[role.index()]
    }

    /// Replaces the count recorded for the role.
    pub fn set(&mut self, role: Role, count: u32) {
        self.counts[role.index()] = count;
    }

    /// Sum of all role counts. Multi-role players are counted once per role.
    #[must_use]
    pub fn total_entries(&self) -> u64 {
        self.counts.iter().map(|&count| u64::from(count)).sum()
    }

    /// Returns `true` when at least one role has a waiting player.
    #[must_use]
    pub fn any_waiting(&self) -> bool {
        self.counts.iter().any(|&count| count > 0)
    }

    /// Iterates over `(role, count)` pairs in chart order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, u32)> + '_ {
        Role::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

/// Compact set of roles, used for the user's queued role selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoleSet {
    bits: u8,
}

impl RoleSet {
    /// Set containing no roles.
    pub const EMPTY: Self = Self { bits: 0 };

    /// Returns `true` when the role is part of the set.
    #[must_use]
    pub const fn contains(&self, role: Role) -> bool {
        self.bits & Self::bit(role) != 0
    }

    /// Adds the role to the set.
    pub fn insert(&mut self, role: Role) {
        self.bits |= Self::bit(role);
    }

    /// Removes the role from the set.
    pub fn remove(&mut self, role: Role) {
        self.bits &= !Self::bit(role);
    }

    /// Flips membership of the role.
    pub fn toggle(&mut self, role: Role) {
        self.bits ^= Self::bit(role);
    }

    /// Number of roles in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Returns `true` when the set holds no roles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates over the members in chart order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    const fn bit(role: Role) -> u8 {
        1 << role.index()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}

/// Snapshot of the public queue published by the backend.
///
/// `total_waiting` is the authoritative unique headcount and may be smaller
/// than [`RoleCounts::total_entries`] because one player can queue for
/// several roles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Waiting players per role.
    pub role_counts: RoleCounts,
    /// Unique waiting players.
    pub total_waiting: u32,
    /// Matches currently in progress.
    pub ongoing_matches: u32,
    /// Unix seconds of the most recent successful match formation.
    pub previous_matched_at: Option<i64>,
    /// Number of players placed by the most recent match formation.
    pub previous_matched_count: Option<u32>,
}

/// Lifecycle phase of a formed match as seen by its participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Waiting for the host to create the in-game lobby.
    LobbyCreate,
    /// Lobby creation deadline passed without a lobby number.
    LobbyWaiting,
    /// Lobby number published; players are joining.
    LobbyJoin,
    /// Join deadline passed; the match is expected to start.
    MatchReady,
}

impl MatchPhase {
    /// Identifier used in logs and serialized state.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::LobbyCreate => "lobby_create",
            Self::LobbyWaiting => "lobby_waiting",
            Self::LobbyJoin => "lobby_join",
            Self::MatchReady => "match_ready",
        }
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Timeouts governing the match lobby lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchSettings {
    lobby_create_timeout: u64,
    lobby_join_timeout: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            lobby_create_timeout: DEFAULT_LOBBY_CREATE_TIMEOUT_SECS,
            lobby_join_timeout: DEFAULT_LOBBY_JOIN_TIMEOUT_SECS,
        }
    }
}

impl MatchSettings {
    /// Creates settings from explicit timeouts measured in seconds.
    #[must_use]
    pub const fn new(lobby_create_timeout: u64, lobby_join_timeout: u64) -> Self {
        Self {
            lobby_create_timeout,
            lobby_join_timeout,
        }
    }

    /// Resolves settings from a key/value lookup, falling back to defaults for
    /// absent or unusable entries. Unrelated keys are ignored.
    #[must_use]
    pub fn from_lookup<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in entries {
            let Some(timeout) = Self::parse_timeout(value.as_ref()) else {
                continue;
            };
            match key.as_ref() {
                LOBBY_CREATE_TIMEOUT_KEY => settings.lobby_create_timeout = timeout,
                LOBBY_JOIN_TIMEOUT_KEY => settings.lobby_join_timeout = timeout,
                _ => {}
            }
        }
        settings
    }

    /// Parses a timeout value as a positive number of seconds.
    #[must_use]
    pub fn parse_timeout(value: &str) -> Option<u64> {
        value.trim().parse::<u64>().ok().filter(|&seconds| seconds > 0)
    }

    /// Seconds allowed between match formation and lobby creation.
    #[must_use]
    pub const fn lobby_create_timeout(&self) -> u64 {
        self.lobby_create_timeout
    }

    /// Seconds allowed between match formation and everyone joining the lobby.
    #[must_use]
    pub const fn lobby_join_timeout(&self) -> u64 {
        self.lobby_join_timeout
    }
}

/// Match fields pushed by the match feed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatchInfo {
    started_at: i64,
    lobby_number: Option<String>,
}

impl MatchInfo {
    /// Creates match info; blank lobby numbers are treated as absent.
    #[must_use]
    pub fn new(started_at: i64, lobby_number: Option<String>) -> Self {
        let lobby_number = lobby_number
            .map(|number| number.trim().to_owned())
            .filter(|number| !number.is_empty());
        Self {
            started_at,
            lobby_number,
        }
    }

    /// Unix seconds at which the match was formed.
    #[must_use]
    pub const fn started_at(&self) -> i64 {
        self.started_at
    }

    /// Lobby number published by the host, if any.
    #[must_use]
    pub fn lobby_number(&self) -> Option<&str> {
        self.lobby_number.as_deref()
    }
}
