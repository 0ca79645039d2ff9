//! Timed state machines for debouncing and double-tap disambiguation.
//!
//! Both machines are clock-injected: every method takes the current
//! `Instant`, so cancellation and restart semantics are testable without a
//! runtime or real sleeps. No background threads; the host's event loop
//! drives `fire`/`poll`.

use std::time::{Duration, Instant};

/// Delays an action until a quiet period with no new activity has elapsed.
///
/// `note` reschedules the deadline; `fire` reports readiness exactly once per
/// quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Record activity: cancel any pending deadline and start a fresh one.
    pub fn note(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// True exactly once when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Classification of a tap against the double-tap window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    /// First tap (or a tap after the window closed); arms the timeout.
    Single,
    /// Second tap within the window; the timer disarms itself.
    Double,
}

/// Disambiguates a single tap from a double tap within a fixed window.
///
/// A `Single` arms a deadline; `poll` reports its expiry exactly once so the
/// caller can treat "no second tap arrived" as its own event. At most one
/// deadline is live at a time.
#[derive(Debug, Clone)]
pub struct TapTimer {
    window: Duration,
    last_tap: Option<Instant>,
    deadline: Option<Instant>,
}

impl TapTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_tap: None,
            deadline: None,
        }
    }

    /// Record a tap and classify it.
    pub fn tap(&mut self, now: Instant) -> Tap {
        if let Some(last) = self.last_tap {
            if now.duration_since(last) < self.window {
                self.clear();
                return Tap::Double;
            }
        }
        self.last_tap = Some(now);
        self.deadline = Some(now + self.window);
        Tap::Single
    }

    /// True exactly once when an armed window has expired with no second tap.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm without firing (unmount, or the tap was resolved another way).
    pub fn clear(&mut self) {
        self.last_tap = None;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debouncer_fires_once_after_quiet_period() {
        let mut d = Debouncer::new(ms(800));
        let t0 = Instant::now();

        d.note(t0);
        assert!(!d.fire(t0 + ms(799)));
        assert!(d.fire(t0 + ms(800)));
        assert!(!d.fire(t0 + ms(801))); // already consumed
    }

    #[test]
    fn test_debouncer_reschedules_on_new_activity() {
        let mut d = Debouncer::new(ms(800));
        let t0 = Instant::now();

        d.note(t0);
        d.note(t0 + ms(500)); // new edit resets the window
        assert!(!d.fire(t0 + ms(900)));
        assert!(d.fire(t0 + ms(1300)));
    }

    #[test]
    fn test_debouncer_cancel() {
        let mut d = Debouncer::new(ms(800));
        let t0 = Instant::now();
        d.note(t0);
        assert!(d.is_pending());
        d.cancel();
        assert!(!d.is_pending());
        assert!(!d.fire(t0 + ms(1000)));
    }

    #[test]
    fn test_tap_timer_double_within_window() {
        let mut t = TapTimer::new(ms(300));
        let t0 = Instant::now();

        assert_eq!(t.tap(t0), Tap::Single);
        assert_eq!(t.tap(t0 + ms(299)), Tap::Double);
        assert!(!t.is_armed());
        assert!(!t.poll(t0 + ms(1000))); // nothing left to fire
    }

    #[test]
    fn test_tap_timer_slow_second_tap_is_single_again() {
        let mut t = TapTimer::new(ms(300));
        let t0 = Instant::now();

        assert_eq!(t.tap(t0), Tap::Single);
        assert_eq!(t.tap(t0 + ms(300)), Tap::Single);
    }

    #[test]
    fn test_tap_timer_expiry_fires_once() {
        let mut t = TapTimer::new(ms(300));
        let t0 = Instant::now();

        t.tap(t0);
        assert!(!t.poll(t0 + ms(299)));
        assert!(t.poll(t0 + ms(300)));
        assert!(!t.poll(t0 + ms(301)));
    }

    #[test]
    fn test_tap_timer_clear_disarms() {
        let mut t = TapTimer::new(ms(300));
        let t0 = Instant::now();

        t.tap(t0);
        t.clear();
        assert!(!t.poll(t0 + ms(1000)));
    }
}
