use std::time::Duration;

use queueboard_core::{Clock, MatchSettings};
use queueboard_rendering::{FrameInput, Scene};
use queueboard_system_match_phase::{MatchPhaseTimer, Ticker};
use tracing::{debug, info};

use crate::sources::{MatchSource, QueueInfoSource};

/// Per-frame glue between the sources, the phase timer and the scene.
pub(crate) struct BoardDriver<C> {
    queue: Box<dyn QueueInfoSource>,
    matches: Option<Box<dyn MatchSource>>,
    settings: MatchSettings,
    timer: Option<MatchPhaseTimer>,
    ticker: Ticker,
    clock: C,
}

impl<C: Clock> BoardDriver<C> {
    pub(crate) fn new(
        queue: Box<dyn QueueInfoSource>,
        matches: Option<Box<dyn MatchSource>>,
        settings: MatchSettings,
        clock: C,
    ) -> Self {
        Self {
            queue,
            matches,
            settings,
            timer: None,
            ticker: Ticker::default(),
            clock,
        }
    }

    /// Applies user input, pulls fresh data and advances the phase timer.
    pub(crate) fn update(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        if !input.is_idle() {
            scene.apply_input(input);
            debug!(
                in_queue = scene.queue.is_user_in_queue,
                roles = scene.queue.selected_roles.len(),
                "queue selection changed"
            );
        }

        if let Some(snapshot) = self.queue.poll(dt) {
            scene.queue.snapshot = snapshot;
        }

        let now = self.clock.now_unix();
        let current = self
            .matches
            .as_mut()
            .and_then(|source| source.poll(dt, now));
        match (current, self.timer.as_mut()) {
            (Some(info), Some(timer)) => timer.sync(info, now),
            (Some(info), None) => {
                info!(started_at = info.started_at(), "tracking match");
                self.timer = Some(MatchPhaseTimer::new(info, self.settings, now));
            }
            (None, Some(_)) => {
                info!("match cleared");
                self.timer = None;
            }
            (None, None) => {}
        }

        let ticks = self.ticker.advance(dt);
        if let Some(timer) = self.timer.as_mut() {
            for _ in 0..ticks {
                let _ = timer.tick(now);
            }
        }

        scene.phase = self.timer.as_ref().map(MatchPhaseTimer::view);
    }
}
