//! Lenient wire shapes published by the backend.
//!
//! The queue and match feeds are produced by a web backend that is not
//! always consistent about number encodings: counts may arrive as strings,
//! floats or `null`. Every field is therefore decoded through
//! [`LenientValue`] and normalised on conversion, so a malformed field
//! degrades to zero (or "absent") instead of rejecting the whole document.

use std::{error::Error, fmt};

use serde::{
    de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};

use crate::{MatchInfo, QueueSnapshot, Role, RoleCounts};

/// Any JSON scalar, kept undecided until the consumer picks an interpretation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LenientValue {
    /// Whole number that fits in an `i64`.
    Integer(i64),
    /// Any other JSON number.
    Float(f64),
    /// String value, possibly holding a number.
    Text(String),
    /// Booleans, arrays, objects and anything else.
    Other(IgnoredAny),
}

impl LenientValue {
    /// Interprets the value as a non-negative count; anything else is `None`.
    #[must_use]
    pub fn as_count(&self) -> Option<u32> {
        match self {
            Self::Integer(value) => u32::try_from(*value).ok(),
            Self::Float(value) => whole_float(*value).and_then(|v| u32::try_from(v).ok()),
            Self::Text(text) => text.trim().parse::<u32>().ok(),
            Self::Other(_) => None,
        }
    }

    /// Interprets the value as unix seconds.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Float(value) => whole_float(*value),
            Self::Text(text) => text.trim().parse::<i64>().ok(),
            Self::Other(_) => None,
        }
    }

    /// Interprets the value as free text; numbers are rendered in decimal.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => whole_float(*value).map(|v| v.to_string()),
            Self::Text(text) => Some(text.clone()),
            Self::Other(_) => None,
        }
    }
}

fn whole_float(value: f64) -> Option<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

fn count_or_zero(value: Option<&LenientValue>) -> u32 {
    value.and_then(LenientValue::as_count).unwrap_or(0)
}

/// Role count entries in document order.
///
/// Anything other than a JSON object decodes to no entries, so a malformed
/// `role_counts` field zeroes the chart instead of rejecting the snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WireRoleCounts(Vec<(String, Option<LenientValue>)>);

impl WireRoleCounts {
    /// Raw entries in the order the backend wrote them.
    #[must_use]
    pub fn entries(&self) -> &[(String, Option<LenientValue>)] {
        &self.0
    }

    /// Count reported for `role`.
    ///
    /// A key spelled exactly as the role id wins; otherwise the first key
    /// that normalises to the role is used.
    #[must_use]
    pub fn count(&self, role: Role) -> Option<u32> {
        let matching = |(id, _): &&(String, Option<LenientValue>)| Role::from_id(id) == Some(role);
        let (_, value) = self
            .0
            .iter()
            .find(|(id, _)| id == role.id())
            .or_else(|| self.0.iter().find(matching))?;
        Some(count_or_zero(value.as_ref()))
    }
}

impl<'de> Deserialize<'de> for WireRoleCounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RoleCountsVisitor)
    }
}

struct RoleCountsVisitor;

impl<'de> Visitor<'de> for RoleCountsVisitor {
    type Value = WireRoleCounts;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of role counts")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some((id, value)) = map.next_entry::<String, Option<LenientValue>>()? {
            entries.push((id, value));
        }
        Ok(WireRoleCounts(entries))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(WireRoleCounts::default())
    }

    fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_i64<E>(self, _: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_u64<E>(self, _: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_f64<E>(self, _: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_str<E>(self, _: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(WireRoleCounts::default())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

/// Queue snapshot exactly as the backend publishes it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WireQueueSnapshot {
    /// Waiting players keyed by role identifier.
    pub role_counts: WireRoleCounts,
    /// Unique waiting players.
    pub total_waiting: Option<LenientValue>,
    /// Matches currently in progress.
    pub ongoing_matches: Option<LenientValue>,
    /// Unix seconds of the most recent match formation.
    pub previous_matched_unixtime: Option<LenientValue>,
    /// Players placed by the most recent match formation.
    pub previous_user_count: Option<LenientValue>,
}

impl WireQueueSnapshot {
    /// Role identifiers present in the payload that do not name a known role.
    #[must_use]
    pub fn unknown_roles(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .role_counts
            .entries()
            .iter()
            .map(|(id, _)| id)
            .filter(|id| Role::from_id(id).is_none())
            .cloned()
            .collect();
        unknown.sort();
        unknown
    }
}

impl From<WireQueueSnapshot> for QueueSnapshot {
    fn from(wire: WireQueueSnapshot) -> Self {
        let mut role_counts = RoleCounts::default();
        for role in Role::ALL {
            if let Some(count) = wire.role_counts.count(role) {
                role_counts.set(role, count);
            }
        }

        Self {
            role_counts,
            total_waiting: count_or_zero(wire.total_waiting.as_ref()),
            ongoing_matches: count_or_zero(wire.ongoing_matches.as_ref()),
            previous_matched_at: wire
                .previous_matched_unixtime
                .as_ref()
                .and_then(LenientValue::as_timestamp),
            previous_matched_count: wire
                .previous_user_count
                .as_ref()
                .and_then(LenientValue::as_count),
        }
    }
}

/// Match fields exactly as the match feed publishes them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WireMatchInfo {
    /// Unix seconds at which the match was formed.
    pub started_at: Option<LenientValue>,
    /// Lobby number published by the host.
    pub lobby_number: Option<LenientValue>,
}

impl TryFrom<WireMatchInfo> for MatchInfo {
    type Error = MatchInfoError;

    fn try_from(wire: WireMatchInfo) -> Result<Self, Self::Error> {
        let started_at = wire
            .started_at
            .as_ref()
            .and_then(LenientValue::as_timestamp)
            .ok_or(MatchInfoError::MissingStartTime)?;
        let lobby_number = wire.lobby_number.as_ref().and_then(LenientValue::as_text);
        Ok(MatchInfo::new(started_at, lobby_number))
    }
}

/// Errors raised when match feed fields cannot be interpreted.
#[derive(Debug, PartialEq, Eq)]
pub enum MatchInfoError {
    /// The payload carried no usable start timestamp.
    MissingStartTime,
}

impl fmt::Display for MatchInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartTime => write!(f, "match payload has no usable started_at"),
        }
    }
}

impl Error for MatchInfoError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> QueueSnapshot {
        let wire: WireQueueSnapshot = serde_json::from_str(json).expect("valid JSON object");
        wire.into()
    }

    #[test]
    fn well_formed_snapshot_converts_field_by_field() {
        let snapshot = parse(
            r#"{
                "role_counts": {"attacker": 3, "defender": 2, "supporter": 1},
                "total_waiting": 5,
                "ongoing_matches": 2,
                "previous_matched_unixtime": 1700000000,
                "previous_user_count": 10
            }"#,
        );

        assert_eq!(
            snapshot.role_counts,
            RoleCounts::from_array([3, 0, 0, 2, 1])
        );
        assert_eq!(snapshot.total_waiting, 5);
        assert_eq!(snapshot.ongoing_matches, 2);
        assert_eq!(snapshot.previous_matched_at, Some(1_700_000_000));
        assert_eq!(snapshot.previous_matched_count, Some(10));
    }

    #[test]
    fn malformed_counts_default_to_zero() {
        let snapshot = parse(
            r#"{
                "role_counts": {"attacker": -4, "speedster": "7", "defender": 1.5,
                                "supporter": null, "all_rounder": [1]},
                "total_waiting": "lots",
                "ongoing_matches": null
            }"#,
        );

        assert_eq!(
            snapshot.role_counts,
            RoleCounts::from_array([0, 0, 7, 0, 0])
        );
        assert_eq!(snapshot.total_waiting, 0);
        assert_eq!(snapshot.ongoing_matches, 0);
        assert_eq!(snapshot.previous_matched_at, None);
        assert_eq!(snapshot.previous_matched_count, None);
    }

    #[test]
    fn unknown_roles_are_ignored_but_reported() {
        let wire: WireQueueSnapshot =
            serde_json::from_str(r#"{"role_counts": {"jungler": 4, "attacker": 1}}"#)
                .expect("valid JSON object");
        assert_eq!(wire.unknown_roles(), vec!["jungler".to_owned()]);

        let snapshot: QueueSnapshot = wire.into();
        assert_eq!(snapshot.role_counts.total_entries(), 1);
    }

    #[test]
    fn role_counts_that_are_not_an_object_become_zero() {
        for role_counts in ["[1, 2]", r#""x""#, "7", "true", "null"] {
            let snapshot = parse(&format!(
                r#"{{"role_counts": {role_counts}, "total_waiting": 3}}"#
            ));
            assert_eq!(snapshot.role_counts, RoleCounts::default(), "{role_counts}");
            assert_eq!(snapshot.total_waiting, 3, "{role_counts}");
        }
    }

    #[test]
    fn exact_role_id_wins_over_spelling_variants() {
        for _ in 0..20 {
            let snapshot =
                parse(r#"{"role_counts": {"ATTACKER": 9, "attacker": 1, "Attacker": 5}}"#);
            assert_eq!(snapshot.role_counts.get(Role::Attacker), 1);
        }
    }

    #[test]
    fn first_spelling_variant_wins_without_an_exact_id() {
        let snapshot = parse(r#"{"role_counts": {"All-Rounder": 4, "ALL_ROUNDER": 8}}"#);
        assert_eq!(snapshot.role_counts.get(Role::AllRounder), 4);

        let wire: WireQueueSnapshot =
            serde_json::from_str(r#"{"role_counts": {"ALL_ROUNDER": 8, "All-Rounder": 4}}"#)
                .expect("valid JSON object");
        assert_eq!(wire.role_counts.count(Role::AllRounder), Some(8));
        assert_eq!(wire.role_counts.count(Role::Defender), None);
    }

    #[test]
    fn zero_timestamp_is_kept() {
        let snapshot = parse(r#"{"previous_matched_unixtime": 0}"#);
        assert_eq!(snapshot.previous_matched_at, Some(0));
    }

    #[test]
    fn empty_object_is_an_empty_queue() {
        assert_eq!(parse("{}"), QueueSnapshot::default());
    }

    #[test]
    fn match_info_requires_start_time() {
        let wire: WireMatchInfo =
            serde_json::from_str(r#"{"lobby_number": "4321"}"#).expect("valid JSON object");
        assert_eq!(
            MatchInfo::try_from(wire),
            Err(MatchInfoError::MissingStartTime)
        );
    }

    #[test]
    fn numeric_lobby_numbers_become_text() {
        let wire: WireMatchInfo =
            serde_json::from_str(r#"{"started_at": "1700000000", "lobby_number": 81234}"#)
                .expect("valid JSON object");
        let info = MatchInfo::try_from(wire).expect("start time present");
        assert_eq!(info.started_at(), 1_700_000_000);
        assert_eq!(info.lobby_number(), Some("81234"));
    }
}
