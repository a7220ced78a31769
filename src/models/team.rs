//! Team model.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Calendar, Event, EventCategory};

/// Team identifier: the team number from the roster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One roster line as read by the importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEntry {
    /// Team number (unique).
    pub number: u32,
    /// Display name.
    pub name: String,
    /// Division label, if the event runs divisions.
    #[serde(default)]
    pub division: Option<String>,
}

impl TeamEntry {
    /// Creates a roster entry without a division.
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            division: None,
        }
    }

    /// Sets the division label.
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }
}

/// A competing team and its calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Team number.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Division label.
    pub division: Option<String>,
    calendar: Calendar,
}

impl Team {
    /// Creates a team with an empty calendar.
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            division: None,
            calendar: Calendar::new(),
        }
    }

    /// Sets the division label.
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    /// The team's calendar.
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Adds an event to the calendar.
    pub fn add_event(
        &mut self,
        start_ms: i64,
        duration_ms: i64,
        category: EventCategory,
        location: Option<usize>,
    ) {
        self.calendar
            .add_event(Event::new(start_ms, duration_ms, category, location));
    }

    /// See [`Calendar::available`].
    pub fn available(&self, start_ms: i64, duration_ms: i64, travel_ms: i64) -> bool {
        self.calendar.available(start_ms, duration_ms, travel_ms)
    }

    /// See [`Calendar::next_event`].
    pub fn next_event(&self, after_ms: i64) -> Event {
        self.calendar.next_event(after_ms)
    }

    /// See [`Calendar::next_available`].
    pub fn next_available(&self, after_ms: i64, travel_ms: i64) -> i64 {
        self.calendar.next_available(after_ms, travel_ms)
    }

    pub(crate) fn remove_events<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&Event) -> bool,
    {
        self.calendar.remove_events(predicate)
    }
}

impl From<&TeamEntry> for Team {
    fn from(entry: &TeamEntry) -> Self {
        Self {
            id: TeamId(entry.number),
            name: entry.name.clone(),
            division: entry.division.clone(),
            calendar: Calendar::new(),
        }
    }
}
