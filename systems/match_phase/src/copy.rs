use queueboard_core::MatchPhase;

/// Formats seconds as `M:SS`; minutes are not capped at 59.
#[must_use]
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Heading and body text shown for a phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseCopy {
    /// Short heading.
    pub title: &'static str,
    /// Instruction for the participants.
    pub message: String,
}

impl PhaseCopy {
    /// Selects the copy for `phase`, distinguishing time left from expiry.
    #[must_use]
    pub fn for_state(
        phase: MatchPhase,
        remaining: u64,
        elapsed: u64,
        lobby_number: Option<&str>,
    ) -> Self {
        let (title, message) = match phase {
            MatchPhase::LobbyCreate if remaining > 0 => (
                "ロビー作成中",
                format!(
                    "ホストがロビーを作成しています。残り{}以内にロビーが作成されない場合は試合を無効にしてください。",
                    format_clock(remaining)
                ),
            ),
            MatchPhase::LobbyCreate | MatchPhase::LobbyWaiting => (
                "ロビー作成待ち",
                format!(
                    "ロビー作成の制限時間を過ぎました(経過 {})。ロビーが作成されていない場合は今すぐ試合を無効にしてください。",
                    format_clock(elapsed)
                ),
            ),
            MatchPhase::LobbyJoin if remaining > 0 => (
                "ロビー参加",
                format!(
                    "ロビー番号 {} に参加してください。残り{}以内に全員の準備が整わない場合は試合を無効にしてください。",
                    lobby_number.unwrap_or("-"),
                    format_clock(remaining)
                ),
            ),
            MatchPhase::LobbyJoin | MatchPhase::MatchReady => (
                "試合開始",
                "参加の制限時間を過ぎました。準備ができていない場合は今すぐ試合を無効にしてください。"
                    .to_owned(),
            ),
        };

        Self { title, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(150), "2:30");
        assert_eq!(format_clock(3_725), "62:05");
    }

    #[test]
    fn join_copy_names_the_lobby() {
        let copy = PhaseCopy::for_state(MatchPhase::LobbyJoin, 40, 210, Some("4821"));
        assert!(copy.message.contains("4821"));
        assert!(copy.message.contains("0:40"));
    }

    #[test]
    fn expired_create_copy_matches_waiting_copy() {
        let expired = PhaseCopy::for_state(MatchPhase::LobbyCreate, 0, 150, None);
        let waiting = PhaseCopy::for_state(MatchPhase::LobbyWaiting, 0, 150, None);
        assert_eq!(expired, waiting);
    }
}
