//! One-day tournament timetabling.
//!
//! Builds the timetable of a robotics-style tournament day: every team
//! visits three judging categories once and plays a fixed number of table
//! matches, with a travel buffer between any two of its commitments.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Team`, `Calendar`, `Event`, `JudgeSlot`,
//!   `TableSlot`, `DivisionGroup`
//! - **`config`**: `TournamentConfig` and its sections
//! - **`validation`**: Input integrity checks (counts, durations, windows, roster)
//! - **`scheduler`**: The scheduling phases and KPI evaluation
//! - **`solver`**: Branch-and-bound seat assignment
//! - **`tournament`**: `Tournament`, which runs every phase once
//!
//! # Pipeline
//!
//! Divisions are partitioned into judging-room groups, a judging rotation
//! is laid out and timed around ceremonies and lunch, table matches are
//! generated in rotation order, and finally seats are permuted so teams
//! rarely see the same table twice.
//!
//! # References
//!
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete Programming Problems"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod solver;
pub mod tournament;
pub mod validation;

pub use config::{SchedulingMethod, TournamentConfig};
pub use error::{Result, ScheduleError};
pub use models::{Team, TeamEntry, TeamId};
pub use tournament::Tournament;
