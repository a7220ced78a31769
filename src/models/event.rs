//! Calendar event model.
//!
//! An event is one commitment on a team's calendar: a judging session,
//! a table match, a ceremony, or a lunch block.
//!
//! # Categories
//!
//! | Category | Meaning | Location |
//! |----------|---------|----------|
//! | `CoachMeeting` | Coaches' meeting before the day starts | Room 0 |
//! | `Opening` | Opening ceremony | Room 0 |
//! | `Judging(c)` | Judging category `c` (0..3) | Judging room |
//! | `Table(r)` | The team's `r`-th table match | Table, once numbered |
//! | `Lunch` | Lunch block | None |
//! | `None` | Sentinel returned when no event exists | None |

use serde::{Deserialize, Serialize};

/// Number of judging categories every team visits.
pub const JUDGING_CATEGORIES: usize = 3;

/// Classification of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Coaches' meeting.
    CoachMeeting,
    /// Opening ceremony.
    Opening,
    /// Judging session for category 0..3.
    Judging(usize),
    /// Table match; the value is the team's match ordinal (0-based).
    Table(usize),
    /// Lunch block.
    Lunch,
    /// Sentinel category for "no event".
    None,
}

impl EventCategory {
    /// Whether this is a judging session.
    #[inline]
    pub fn is_judging(&self) -> bool {
        matches!(self, EventCategory::Judging(_))
    }

    /// Whether this is a table match.
    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self, EventCategory::Table(_))
    }
}

/// A commitment on a team's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Start time (ms since the start of the event day).
    pub start_ms: i64,
    /// Duration (ms).
    pub duration_ms: i64,
    /// What kind of event this is.
    pub category: EventCategory,
    /// Room or table index. `None` for lunch and provisional table matches.
    pub location: Option<usize>,
}

impl Event {
    /// Creates a new event.
    pub fn new(
        start_ms: i64,
        duration_ms: i64,
        category: EventCategory,
        location: Option<usize>,
    ) -> Self {
        Self {
            start_ms,
            duration_ms,
            category,
            location,
        }
    }

    /// The sentinel event returned when a calendar has nothing later.
    pub fn sentinel() -> Self {
        Self::new(i64::MAX, 0, EventCategory::None, None)
    }

    /// End time (ms, exclusive).
    #[inline]
    pub fn end_ms(&self) -> i64 {
        self.start_ms.saturating_add(self.duration_ms)
    }

    /// Whether this event is the "no event" sentinel.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.category == EventCategory::None
    }
}
