//! Tournament domain models.
//!
//! Provides the core data types for describing a one-day tournament and
//! its timetable.
//!
//! # Domain Mappings
//!
//! | u-tournament | Generic scheduling | Notes |
//! |--------------|--------------------|-------|
//! | Team | Job | Visits every judging category and plays every round |
//! | Calendar | Resource calendar | Per-team, with travel buffers |
//! | JudgeSlot | Time bucket × rooms | Three categories side by side |
//! | TableSlot | Time bucket × machines | Table pairs, optionally staggered |
//! | DivisionGroup | Resource pool | Judging rooms reserved for a division |

mod calendar;
mod event;
mod index;
mod schedule;
mod team;

pub use calendar::{clock, minutes, Calendar, TimeWindow, DAY_MS, MINUTE_MS};
pub use event::{Event, EventCategory, JUDGING_CATEGORIES};
pub use index::RotatingIndex;
pub use schedule::{DivisionGroup, JudgeGrid, JudgeSlot, TableRound, TableSlot};
pub use team::{Team, TeamEntry, TeamId};
