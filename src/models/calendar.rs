//! Calendar and time window models.
//!
//! A [`Calendar`] is the ordered list of commitments of one team. Every
//! scheduling phase asks the calendar whether a team is free before it
//! places anything, so the overlap invariant lives here.
//!
//! # Time Model
//! All times are in milliseconds relative to the start of the event day
//! (midnight = 0). Durations are milliseconds as well.
//!
//! # Availability
//! A candidate `[start, start + duration)` is available iff every existing
//! event `(s, d)` satisfies
//!
//! ```text
//! start + duration + travel <= s   ||   s + d + travel <= start
//! ```
//!
//! The comparison is non-strict: two events separated by exactly the
//! travel buffer do not conflict.

use serde::{Deserialize, Serialize};

use super::{Event, EventCategory};

/// Milliseconds in one minute.
pub const MINUTE_MS: i64 = 60_000;

/// Length of the event day (ms). Nothing may be scheduled past it.
pub const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Converts (possibly fractional) minutes to milliseconds.
///
/// ```
/// use u_tournament::models::minutes;
/// assert_eq!(minutes(12.5), 750_000);
/// ```
#[inline]
pub fn minutes(value: f64) -> i64 {
    (value * MINUTE_MS as f64).round() as i64
}

/// Time of day (ms since midnight) from an hour and minute.
#[inline]
pub fn clock(hour: i64, minute: i64) -> i64 {
    (hour * 60 + minute) * MINUTE_MS
}

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Creates a window from a start and a duration.
    pub fn starting_at(start_ms: i64, duration_ms: i64) -> Self {
        Self::new(start_ms, start_ms + duration_ms)
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// This window grown by `margin_ms` on both sides.
    pub fn widened(&self, margin_ms: i64) -> Self {
        Self::new(self.start_ms - margin_ms, self.end_ms + margin_ms)
    }
}

/// Ordered list of a team's events.
///
/// Events are kept sorted by start time. Insertion is stable, so events
/// sharing a start time keep their insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calendar {
    events: Vec<Event>,
}

impl Calendar {
    /// Creates an empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, sorted by start time.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the calendar has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Adds an event and re-sorts by start time.
    ///
    /// No overlap check is performed; callers verify with [`available`](Self::available).
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
        self.events.sort_by_key(|e| e.start_ms);
    }

    /// Removes every event matching `predicate`. Returns how many were removed.
    pub fn remove_events<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Event) -> bool,
    {
        let before = self.events.len();
        self.events.retain(|e| !predicate(e));
        before - self.events.len()
    }

    /// Events of the given category, in time order.
    pub fn events_of(&self, category: EventCategory) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.category == category)
    }

    /// Whether `[start, start + duration)` fits with `travel` on both sides.
    pub fn available(&self, start_ms: i64, duration_ms: i64, travel_ms: i64) -> bool {
        self.events
            .iter()
            .all(|e| !conflicts(e, start_ms, duration_ms, travel_ms))
    }

    /// Earliest event starting strictly after `after_ms`.
    ///
    /// Returns [`Event::sentinel`] if there is none.
    pub fn next_event(&self, after_ms: i64) -> Event {
        self.events
            .iter()
            .find(|e| e.start_ms > after_ms)
            .cloned()
            .unwrap_or_else(Event::sentinel)
    }

    /// Earliest time at or after `after_ms` at which the team is free.
    ///
    /// Follows chains of events straddling `after_ms`: if leaving one event
    /// lands inside the travel buffer of the next, the next one is skipped too.
    pub fn next_available(&self, after_ms: i64, travel_ms: i64) -> i64 {
        self.next_available_for(after_ms, 0, travel_ms)
    }

    /// Earliest start at or after `after_ms` that fits a whole `duration_ms`.
    pub fn next_available_for(&self, after_ms: i64, duration_ms: i64, travel_ms: i64) -> i64 {
        let mut time = after_ms;
        // Each step moves past at least one conflicting event, so this ends.
        while let Some(next) = self
            .events
            .iter()
            .filter(|e| conflicts(e, time, duration_ms, travel_ms))
            .map(|e| e.end_ms().saturating_add(travel_ms))
            .max()
        {
            time = next;
        }
        time
    }

    /// Smallest gap between the end of one event and the start of the next.
    ///
    /// Negative when events overlap. `None` with fewer than two events.
    pub fn closest_gap(&self) -> Option<i64> {
        self.events
            .windows(2)
            .map(|w| w[1].start_ms - w[0].end_ms())
            .min()
    }
}

/// Whether `event` blocks a candidate `[start, start + duration)`.
fn conflicts(event: &Event, start_ms: i64, duration_ms: i64, travel_ms: i64) -> bool {
    let clear_before = start_ms
        .saturating_add(duration_ms)
        .saturating_add(travel_ms)
        <= event.start_ms;
    let clear_after = event.end_ms().saturating_add(travel_ms) <= start_ms;
    !(clear_before || clear_after)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(start: i64, duration: i64) -> Event {
        Event::new(start, duration, EventCategory::Judging(0), Some(0))
    }

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(100, 200);
        assert_eq!(w.duration_ms(), 100);
        assert!(w.contains(100));
        assert!(w.contains(199));
        assert!(!w.contains(200)); // exclusive end
        assert!(!w.contains(50));
        assert_eq!(w.widened(10), TimeWindow::new(90, 210));
    }

    #[test]
    fn test_time_window_overlap() {
        let a = TimeWindow::new(0, 100);
        let b = TimeWindow::new(50, 150);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = TimeWindow::new(100, 200); // touching but not overlapping
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_minutes_and_clock() {
        assert_eq!(minutes(1.0), MINUTE_MS);
        assert_eq!(minutes(17.5), 1_050_000);
        assert_eq!(clock(9, 30), 570 * MINUTE_MS);
    }

    #[test]
    fn test_add_event_sorts() {
        let mut cal = Calendar::new();
        cal.add_event(ev(5_000, 100));
        cal.add_event(ev(1_000, 100));
        cal.add_event(ev(3_000, 100));
        let starts: Vec<i64> = cal.events().iter().map(|e| e.start_ms).collect();
        assert_eq!(starts, vec![1_000, 3_000, 5_000]);
    }

    #[test]
    fn test_add_event_keeps_duplicates() {
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));
        cal.add_event(Event::new(1_000, 50, EventCategory::Lunch, None));
        assert_eq!(cal.len(), 2);
        // Stable: first inserted stays first.
        assert_eq!(cal.events()[1].category, EventCategory::Lunch);
    }

    #[test]
    fn test_empty_calendar_always_available() {
        let cal = Calendar::new();
        assert!(cal.available(0, 1_000_000, 1_000));
        assert!(cal.next_event(0).is_sentinel());
        assert_eq!(cal.next_available(42, 1_000), 42);
        assert_eq!(cal.closest_gap(), None);
    }

    #[test]
    fn test_available_exact_buffer_boundary() {
        // Event [1000, 1100), travel 50.
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));

        // Ends exactly travel before: 850 + 100 + 50 == 1000.
        assert!(cal.available(850, 100, 50));
        // One ms later collides.
        assert!(!cal.available(851, 100, 50));
        // Starts exactly travel after: 1100 + 50 == 1150.
        assert!(cal.available(1_150, 100, 50));
        // One ms earlier collides.
        assert!(!cal.available(1_149, 100, 50));
    }

    #[test]
    fn test_available_overlap() {
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));
        assert!(!cal.available(1_050, 10, 0));
        assert!(!cal.available(900, 500, 0));
        assert!(cal.available(1_100, 10, 0));
    }

    #[test]
    fn test_next_event() {
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));
        cal.add_event(ev(2_000, 100));

        assert_eq!(cal.next_event(0).start_ms, 1_000);
        // Strictly after: an event starting exactly at the query is skipped.
        assert_eq!(cal.next_event(1_000).start_ms, 2_000);
        assert!(cal.next_event(2_000).is_sentinel());
        assert_eq!(cal.next_event(2_000).start_ms, i64::MAX);
    }

    #[test]
    fn test_next_available_straddling() {
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));

        // Free before the buffer begins.
        assert_eq!(cal.next_available(900, 50), 900);
        assert_eq!(cal.next_available(950, 50), 950);
        // Inside the event or its buffer: free at end + travel.
        assert_eq!(cal.next_available(1_050, 50), 1_150);
        assert_eq!(cal.next_available(960, 50), 1_150);
        assert_eq!(cal.next_available(1_150, 50), 1_150);
    }

    #[test]
    fn test_next_available_chained_events() {
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));
        // Starts inside the first event's buffer window.
        cal.add_event(ev(1_180, 100));

        assert_eq!(cal.next_available(1_050, 50), 1_330);
    }

    #[test]
    fn test_next_available_for_window() {
        let mut cal = Calendar::new();
        cal.add_event(ev(1_000, 100));
        cal.add_event(ev(1_400, 100));

        // A 200 ms window with 50 ms travel does not fit between 1150 and 1350.
        assert_eq!(cal.next_available_for(1_150, 200, 50), 1_550);
        // A 100 ms window does: 1150 + 100 + 50 == 1300 <= 1400.
        assert_eq!(cal.next_available_for(1_150, 100, 50), 1_150);
        assert!(cal.available(1_550, 200, 50));
    }

    #[test]
    fn test_closest_gap() {
        let mut cal = Calendar::new();
        cal.add_event(ev(0, 100));
        cal.add_event(ev(300, 100));
        cal.add_event(ev(450, 100));
        assert_eq!(cal.closest_gap(), Some(50));
    }

    #[test]
    fn test_remove_events() {
        let mut cal = Calendar::new();
        cal.add_event(ev(0, 100));
        cal.add_event(Event::new(500, 100, EventCategory::Lunch, None));
        let removed = cal.remove_events(|e| e.category == EventCategory::Lunch);
        assert_eq!(removed, 1);
        assert_eq!(cal.len(), 1);
        assert_eq!(cal.events_of(EventCategory::Judging(0)).count(), 1);
    }
}
