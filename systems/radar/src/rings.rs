use std::time::Duration;

use crate::PieSlice;

/// Animation time between two ring emissions.
pub const RING_SPAWN_INTERVAL: Duration = Duration::from_millis(3_000);

/// Growth speed of every ring.
pub const RING_SPEED_PX_PER_SEC: f32 = 120.0;

/// Distance past the chart edge at which a ring is evicted.
pub const RING_FADE_DISTANCE: f32 = 200.0;

/// Blur applied to a ring at full expansion.
pub const RING_MAX_BLUR: f32 = 12.0;

/// Opacity and blur of a ring at its current radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingFade {
    /// Opacity in `0.0..=1.0`; 1.0 at the chart edge.
    pub alpha: f32,
    /// Blur radius in pixels; 0.0 at the chart edge.
    pub blur: f32,
}

/// Detection ring emitted from the chart edge.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarRing {
    started_at: Duration,
    origin_radius: f32,
    radius: f32,
    slices: Vec<PieSlice>,
}

impl RadarRing {
    /// Animation time at which the ring was emitted.
    #[must_use]
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Current radius of the ring.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Slice geometry captured at emission.
    #[must_use]
    pub fn slices(&self) -> &[PieSlice] {
        &self.slices
    }

    /// Fade for the ring relative to the current chart radius.
    #[must_use]
    pub fn fade(&self, chart_radius: f32) -> RingFade {
        let progress = ((self.radius - chart_radius) / RING_FADE_DISTANCE).clamp(0.0, 1.0);
        RingFade {
            alpha: 1.0 - progress,
            blur: RING_MAX_BLUR * progress,
        }
    }

    fn grow_to(&mut self, now: Duration) {
        let age = now.saturating_sub(self.started_at).as_secs_f32();
        self.radius = self.origin_radius + RING_SPEED_PX_PER_SEC * age;
    }
}

/// Active ring set, ordered oldest first.
///
/// The set is bounded by eviction alone: a ring lives for at most
/// `RING_FADE_DISTANCE / RING_SPEED_PX_PER_SEC` seconds of animation time
/// while the chart radius is stable.
#[derive(Clone, Debug, Default)]
pub struct RadarRings {
    rings: Vec<RadarRing>,
    last_spawn: Option<Duration>,
}

impl RadarRings {
    /// Creates an empty ring set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows every ring to `now`, evicts rings past the fade distance and
    /// emits a new ring at `chart_radius` when one is due.
    ///
    /// Rings are only emitted while at least one slice has entries.
    pub fn advance(&mut self, now: Duration, slices: &[PieSlice], chart_radius: f32) {
        for ring in &mut self.rings {
            ring.grow_to(now);
        }

        let eviction_radius = chart_radius + RING_FADE_DISTANCE;
        self.rings.retain(|ring| ring.radius <= eviction_radius);

        if !slices.iter().any(|slice| slice.count > 0) {
            return;
        }

        let due = match self.last_spawn {
            None => true,
            Some(last) => now.saturating_sub(last) >= RING_SPAWN_INTERVAL,
        };
        if !due {
            return;
        }

        self.rings.push(RadarRing {
            started_at: now,
            origin_radius: chart_radius,
            radius: chart_radius,
            slices: slices.to_vec(),
        });
        self.last_spawn = Some(now);
    }

    /// Iterates over live rings, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RadarRing> + '_ {
        self.rings.iter()
    }

    /// Number of live rings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Returns `true` when no ring is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queueboard_core::Role;

    fn slice(count: u32) -> PieSlice {
        PieSlice {
            role: Role::Attacker,
            count,
            start_angle: 0.0,
            end_angle: if count > 0 { 1.0 } else { 0.0 },
        }
    }

    #[test]
    fn fade_is_opaque_at_chart_edge_and_clear_at_full_expansion() {
        let mut rings = RadarRings::new();
        rings.advance(Duration::ZERO, &[slice(1)], 50.0);
        let ring = rings.iter().next().expect("ring emitted");
        assert_eq!(ring.fade(50.0), RingFade { alpha: 1.0, blur: 0.0 });

        let mut expanded = ring.clone();
        expanded.radius = 250.0;
        let fade = expanded.fade(50.0);
        assert!(fade.alpha.abs() < 1e-6);
        assert!((fade.blur - RING_MAX_BLUR).abs() < 1e-6);
    }

    #[test]
    fn no_ring_is_emitted_without_entries() {
        let mut rings = RadarRings::new();
        rings.advance(Duration::ZERO, &[slice(0)], 40.0);
        rings.advance(Duration::from_secs(10), &[slice(0)], 40.0);
        assert!(rings.is_empty());
    }

    #[test]
    fn first_ring_appears_as_soon_as_entries_arrive() {
        let mut rings = RadarRings::new();
        rings.advance(Duration::from_secs(5), &[slice(0)], 40.0);
        rings.advance(Duration::from_millis(5_100), &[slice(2)], 40.0);
        assert_eq!(rings.len(), 1);
        assert_eq!(
            rings.iter().next().map(RadarRing::started_at),
            Some(Duration::from_millis(5_100))
        );
    }
}
