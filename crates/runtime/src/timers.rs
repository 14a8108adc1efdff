use foundation::time::Millis;

/// Deterministic single-threaded timer queue.
///
/// This is the engine's only notion of "later": debounce windows, camera
/// completion, deferred sweeps and effect animations all live here and fire
/// when the host advances time.
///
/// Key properties:
/// - Total ordering on `(due, id)`; timers due at the same instant fire in
///   scheduling order.
/// - Cancellation removes the timer; cancelling an unknown or fired timer is
///   a no-op.
/// - Intervals keep their id across firings so they can be cancelled later
///   with the id returned at scheduling time.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    due: Millis,
    id: TimerId,
}

#[derive(Debug)]
struct Entry<T> {
    key: Key,
    period_ms: Option<u64>,
    payload: T,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub due: Millis,
    pub payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn alloc_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Schedules a one-shot timer at `at`.
    pub fn schedule(&mut self, at: Millis, payload: T) -> TimerId {
        let id = self.alloc_id();
        self.entries.push(Entry {
            key: Key { due: at, id },
            period_ms: None,
            payload,
        });
        id
    }

    /// Schedules a repeating timer whose first firing is at `first`.
    ///
    /// A zero period is treated as 1ms so an interval can never starve the queue.
    pub fn schedule_every(&mut self, first: Millis, period_ms: u64, payload: T) -> TimerId {
        let id = self.alloc_id();
        self.entries.push(Entry {
            key: Key { due: first, id },
            period_ms: Some(period_ms.max(1)),
            payload,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        if let Some(idx) = self.entries.iter().position(|e| e.key.id == id) {
            self.entries.remove(idx);
            return true;
        }
        false
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.key.id == id)
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.entries.iter().map(|e| e.key.due).min()
    }

    /// Pops the earliest timer due at or before `now`.
    ///
    /// Intervals are re-armed at `due + period` before being returned. Periods
    /// that already lie at or before `now` are skipped, so an interval fires
    /// at most once per call however long the host stalled.
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired<T>> {
        let mut best_idx: Option<usize> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.key.due > now {
                continue;
            }
            match best_idx {
                None => best_idx = Some(idx),
                Some(best) => {
                    if entry.key < self.entries[best].key {
                        best_idx = Some(idx);
                    }
                }
            }
        }

        let idx = best_idx?;
        match self.entries[idx].period_ms {
            Some(period) => {
                let entry = &mut self.entries[idx];
                let fired = Fired {
                    id: entry.key.id,
                    due: entry.key.due,
                    payload: entry.payload.clone(),
                };
                let next = entry.key.due.after(period);
                entry.key.due = if next > now {
                    next
                } else {
                    let missed = now.since(next) / period + 1;
                    next.after(missed.saturating_mul(period))
                };
                Some(fired)
            }
            None => {
                let entry = self.entries.remove(idx);
                Some(Fired {
                    id: entry.key.id,
                    due: entry.key.due,
                    payload: entry.payload,
                })
            }
        }
    }
}

/// Holder for "at most one live instance" timers.
///
/// Arming a slot cancels whatever it held before, so only the most recent
/// debounce/camera/sweep timer can ever fire.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimerSlot {
    id: Option<TimerId>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<TimerId> {
        self.id
    }

    pub fn is_armed(&self) -> bool {
        self.id.is_some()
    }

    pub fn arm<T: Clone>(&mut self, queue: &mut TimerQueue<T>, at: Millis, payload: T) -> TimerId {
        self.cancel(queue);
        let id = queue.schedule(at, payload);
        self.id = Some(id);
        id
    }

    /// Cancels the held timer. Returns `true` if one was still pending.
    pub fn cancel<T: Clone>(&mut self, queue: &mut TimerQueue<T>) -> bool {
        match self.id.take() {
            Some(id) => queue.cancel(id),
            None => false,
        }
    }

    /// Clears the slot if it holds the timer that just fired.
    ///
    /// Returns `false` when the fired timer is not the slot's current one.
    pub fn take_fired(&mut self, id: TimerId) -> bool {
        if self.id == Some(id) {
            self.id = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{TimerQueue, TimerSlot};
    use foundation::time::Millis;

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(Millis(20), "late");
        q.schedule(Millis(10), "a");
        q.schedule(Millis(10), "b");

        let mut out = Vec::new();
        while let Some(f) = q.pop_due(Millis(100)) {
            out.push(f.payload);
        }
        assert_eq!(out, vec!["a", "b", "late"]);
    }

    #[test]
    fn nothing_fires_before_due() {
        let mut q = TimerQueue::new();
        q.schedule(Millis(150), ());
        assert!(q.pop_due(Millis(149)).is_none());
        assert_eq!(q.next_due(), Some(Millis(150)));
        assert!(q.pop_due(Millis(150)).is_some());
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut q = TimerQueue::new();
        let id = q.schedule(Millis(5), ());
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(q.pop_due(Millis(10)).is_none());
    }

    #[test]
    fn interval_rearms_with_same_id() {
        let mut q = TimerQueue::new();
        let id = q.schedule_every(Millis(10), 10, "tick");

        let a = q.pop_due(Millis(10)).expect("first");
        let b = q.pop_due(Millis(20)).expect("second");
        let c = q.pop_due(Millis(35)).expect("third");
        assert_eq!((a.due, b.due, c.due), (Millis(10), Millis(20), Millis(30)));
        assert_eq!(a.id, id);
        assert!(q.pop_due(Millis(35)).is_none());
        assert_eq!(q.next_due(), Some(Millis(40)));

        assert!(q.cancel(id));
        assert!(q.pop_due(Millis(1000)).is_none());
    }

    #[test]
    fn stalled_interval_fires_once_and_skips_missed_periods() {
        let mut q = TimerQueue::new();
        q.schedule_every(Millis(16), 16, "frame");

        let mut fired = Vec::new();
        while let Some(f) = q.pop_due(Millis(10_000)) {
            fired.push(f.due);
        }
        assert_eq!(fired, vec![Millis(16)]);
        // Stays on the original 16ms grid.
        assert_eq!(q.next_due(), Some(Millis(10_016)));
    }

    #[test]
    fn slot_keeps_only_latest_timer() {
        let mut q = TimerQueue::new();
        let mut slot = TimerSlot::new();
        slot.arm(&mut q, Millis(150), "first");
        let second = slot.arm(&mut q, Millis(200), "second");
        assert_eq!(q.len(), 1);

        let fired = q.pop_due(Millis(1000)).expect("fired");
        assert_eq!(fired.payload, "second");
        assert!(slot.take_fired(fired.id));
        assert!(!slot.is_armed());
        assert!(!slot.take_fired(second));
    }

    #[test]
    fn slot_cancel_reports_pending_state() {
        let mut q: TimerQueue<()> = TimerQueue::new();
        let mut slot = TimerSlot::new();
        assert!(!slot.cancel(&mut q));
        slot.arm(&mut q, Millis(1), ());
        assert!(slot.cancel(&mut q));
        assert!(q.is_empty());
    }
}
