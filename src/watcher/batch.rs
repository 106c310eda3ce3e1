use std::time::{Duration, Instant};

use crate::change::RawChange;

/// Accumulates raw changes until the tree has been quiet for `quiet`.
///
/// Every new change pushes the quiet deadline back, so a burst of activity
/// lands in one batch. A batch never waits longer than `max_wait` after its
/// first change, so a path written continuously still gets reported. Time is
/// passed in so the collector can be driven deterministically.
#[derive(Debug)]
pub struct BatchCollector {
    quiet: Duration,
    max_wait: Duration,
    pending: Vec<RawChange>,
    first_change: Option<Instant>,
    last_change: Option<Instant>,
}

impl BatchCollector {
    pub fn new(quiet: Duration, max_wait: Duration) -> Self {
        Self {
            quiet,
            max_wait,
            pending: Vec::new(),
            first_change: None,
            last_change: None,
        }
    }

    pub fn push(&mut self, changes: Vec<RawChange>, now: Instant) {
        if changes.is_empty() {
            return;
        }
        self.pending.extend(changes);
        self.first_change.get_or_insert(now);
        self.last_change = Some(now);
    }

    /// How long until the pending batch is due, or `None` when nothing is pending.
    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        let first = self.first_change?;
        let last = self.last_change?;
        let quiet_left = self
            .quiet
            .saturating_sub(now.saturating_duration_since(last));
        let age_left = self
            .max_wait
            .saturating_sub(now.saturating_duration_since(first));
        Some(quiet_left.min(age_left))
    }

    /// Hand out the pending batch once the quiet period has elapsed or the
    /// batch has reached its maximum age.
    pub fn take_if_quiet(&mut self, now: Instant) -> Option<Vec<RawChange>> {
        match self.time_left(now) {
            Some(left) if left.is_zero() => self.drain(),
            _ => None,
        }
    }

    /// Hand out whatever is pending regardless of timing.
    pub fn drain(&mut self) -> Option<Vec<RawChange>> {
        self.first_change = None;
        self.last_change = None;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeHint;

    const QUIET: Duration = Duration::from_millis(100);
    const MAX_WAIT: Duration = Duration::from_millis(1000);

    fn collector() -> BatchCollector {
        BatchCollector::new(QUIET, MAX_WAIT)
    }

    fn change(name: &str) -> RawChange {
        RawChange::file("/w", name, Some(ChangeHint::ModifiedWrite))
    }

    #[test]
    fn test_idle_collector_has_no_deadline() {
        let mut c = collector();
        let now = Instant::now();
        assert_eq!(c.time_left(now), None);
        assert_eq!(c.take_if_quiet(now), None);

        c.push(Vec::new(), now);
        assert_eq!(c.time_left(now), None, "empty pushes do not arm the timer");
    }

    #[test]
    fn test_batch_flushes_after_quiet_period() {
        let mut c = collector();
        let t0 = Instant::now();
        c.push(vec![change("a")], t0);

        assert_eq!(c.time_left(t0), Some(QUIET));
        assert_eq!(c.take_if_quiet(t0 + Duration::from_millis(50)), None);

        let batch = c.take_if_quiet(t0 + QUIET).expect("batch should be due");
        assert_eq!(batch, vec![change("a")]);
        assert_eq!(c.time_left(t0 + QUIET), None);
    }

    #[test]
    fn test_new_changes_push_the_deadline_back() {
        let mut c = collector();
        let t0 = Instant::now();
        c.push(vec![change("a")], t0);
        c.push(vec![change("b")], t0 + Duration::from_millis(80));

        assert_eq!(c.take_if_quiet(t0 + QUIET), None);
        let batch = c
            .take_if_quiet(t0 + Duration::from_millis(180))
            .expect("batch should be due");
        assert_eq!(batch, vec![change("a"), change("b")], "batch keeps arrival order");
    }

    #[test]
    fn test_continuous_activity_still_flushes_at_max_wait() {
        let mut c = collector();
        let t0 = Instant::now();
        let step = Duration::from_millis(50);
        let mut flushes = Vec::new();

        // One write every 50ms for 60s never leaves a 100ms quiet gap.
        for i in 0..1200u32 {
            let now = t0 + step * i;
            if let Some(batch) = c.take_if_quiet(now) {
                flushes.push((now, batch.len()));
            }
            c.push(vec![change("app.log")], now);
        }

        assert!(flushes.len() >= 50, "only {} flushes in 60s", flushes.len());
        assert_eq!(flushes[0].0, t0 + MAX_WAIT, "first flush at max wait");
        assert!(
            flushes.iter().all(|&(_, len)| len <= 20),
            "batches stay bounded: {flushes:?}"
        );
    }

    #[test]
    fn test_max_wait_restarts_after_a_flush() {
        let mut c = collector();
        let t0 = Instant::now();
        c.push(vec![change("a")], t0);
        c.push(vec![change("b")], t0 + Duration::from_millis(950));
        assert_eq!(
            c.time_left(t0 + Duration::from_millis(950)),
            Some(Duration::from_millis(50)),
            "age caps the quiet deadline"
        );
        assert!(c.take_if_quiet(t0 + MAX_WAIT).is_some());

        let t1 = t0 + Duration::from_millis(1010);
        c.push(vec![change("c")], t1);
        assert_eq!(c.time_left(t1), Some(QUIET));
    }

    #[test]
    fn test_drain_ignores_timing() {
        let mut c = collector();
        c.push(vec![change("a")], Instant::now());
        assert_eq!(c.drain(), Some(vec![change("a")]));
        assert_eq!(c.drain(), None);
    }
}
