//! Tournament configuration.
//!
//! A [`TournamentConfig`] is read once (usually from JSON produced by the
//! importer) and then passed by reference into every scheduling phase.
//! Nothing mutates it after construction.
//!
//! # Example
//!
//! ```
//! use u_tournament::config::TournamentConfig;
//! use u_tournament::models::minutes;
//!
//! let config = TournamentConfig::default()
//!     .with_travel(minutes(10.0))
//!     .with_judging_rooms(3);
//! assert_eq!(config.judging.rooms, 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::models::{clock, minutes, TimeWindow};
use crate::validation::validate_config;

/// How judging sessions are laid out over the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingMethod {
    /// Judging and table rounds run concurrently, interleaved per team.
    #[default]
    Interlaced,
    /// Judging in one block, tables in another. Not supported.
    Block,
}

/// Lunch placement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunchWindow {
    /// Earliest lunch start (ms).
    pub earliest_ms: i64,
    /// Latest lunch start (ms). Judges eat at this time.
    pub latest_ms: i64,
    /// Lunch length (ms).
    pub duration_ms: i64,
}

/// Judging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgingConfig {
    /// First session start (ms).
    pub start_ms: i64,
    /// Judging rooms per category.
    pub rooms: usize,
    /// Run a calibration slot first (ignored when divisions are used).
    pub calibration: bool,
    /// Judge-side session length including scoring (ms).
    pub duration_ms: i64,
    /// Team-visible session length (ms).
    pub team_duration_ms: i64,
    /// Sessions between judge breaks. `None` never breaks.
    #[serde(default)]
    pub consecutive: Option<usize>,
    /// Judge break length (ms).
    pub break_ms: i64,
}

/// Competition table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Number of table pairs.
    pub pairs: usize,
    /// Match length per round (ms). Its length is the number of rounds.
    pub round_durations_ms: Vec<i64>,
    /// Offset the second half of the pairs by half a match.
    #[serde(default)]
    pub stagger: bool,
    /// Matches in a row before a forced idle slot. `None` never forces one.
    #[serde(default)]
    pub consecutive: Option<usize>,
    /// Target teams per match row. `None` uses every seat.
    #[serde(default)]
    pub run_rate: Option<usize>,
    /// Single-slot assignment passes over all rounds.
    #[serde(default = "default_assignment_passes")]
    pub assignment_passes: usize,
    /// Bulk refinement time budget per table (ms).
    #[serde(default = "default_bulk_budget")]
    pub bulk_budget_per_table_ms: u64,
}

fn default_assignment_passes() -> usize {
    2
}

fn default_bulk_budget() -> u64 {
    100
}

impl TableConfig {
    /// Number of competition rounds.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.round_durations_ms.len()
    }

    /// Total seats (two per pair).
    #[inline]
    pub fn seats(&self) -> usize {
        2 * self.pairs
    }
}

/// Complete tournament configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Judging layout.
    #[serde(default)]
    pub method: SchedulingMethod,
    /// Minimum gap a team needs between any two commitments (ms).
    pub travel_ms: i64,
    /// Coaches' meeting.
    pub coach_meeting: TimeWindow,
    /// Opening ceremony.
    pub opening: TimeWindow,
    /// Lunch window.
    pub lunch: LunchWindow,
    /// Judging settings.
    pub judging: JudgingConfig,
    /// Table settings.
    pub tables: TableConfig,
}

impl Default for TournamentConfig {
    /// A typical qualifier: two judging rooms with calibration, two table
    /// pairs, four 10-minute rounds.
    fn default() -> Self {
        Self {
            method: SchedulingMethod::Interlaced,
            travel_ms: minutes(12.5),
            coach_meeting: TimeWindow::new(clock(8, 0), clock(8, 30)),
            opening: TimeWindow::new(clock(8, 45), clock(9, 15)),
            lunch: LunchWindow {
                earliest_ms: clock(11, 30),
                latest_ms: clock(12, 30),
                duration_ms: minutes(30.0),
            },
            judging: JudgingConfig {
                start_ms: clock(9, 0),
                rooms: 2,
                calibration: true,
                duration_ms: minutes(17.5),
                team_duration_ms: minutes(10.0),
                consecutive: Some(4),
                break_ms: minutes(10.0),
            },
            tables: TableConfig {
                pairs: 2,
                round_durations_ms: vec![minutes(10.0); 4],
                stagger: false,
                consecutive: None,
                run_rate: None,
                assignment_passes: default_assignment_passes(),
                bulk_budget_per_table_ms: default_bulk_budget(),
            },
        }
    }
}

impl TournamentConfig {
    /// Parses a configuration from JSON and checks its internal consistency.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that do not depend on the roster.
    pub fn validate(&self) -> Result<()> {
        if self.method != SchedulingMethod::Interlaced {
            return Err(ScheduleError::UnsupportedMethod(self.method));
        }
        validate_config(self).map_err(ScheduleError::InvalidConfig)
    }

    /// Sets the scheduling method.
    pub fn with_method(mut self, method: SchedulingMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the travel buffer.
    pub fn with_travel(mut self, travel_ms: i64) -> Self {
        self.travel_ms = travel_ms;
        self
    }

    /// Sets the ceremony windows.
    pub fn with_ceremonies(mut self, coach_meeting: TimeWindow, opening: TimeWindow) -> Self {
        self.coach_meeting = coach_meeting;
        self.opening = opening;
        self
    }

    /// Sets the lunch window.
    pub fn with_lunch(mut self, earliest_ms: i64, latest_ms: i64, duration_ms: i64) -> Self {
        self.lunch = LunchWindow {
            earliest_ms,
            latest_ms,
            duration_ms,
        };
        self
    }

    /// Sets the number of judging rooms per category.
    pub fn with_judging_rooms(mut self, rooms: usize) -> Self {
        self.judging.rooms = rooms;
        self
    }

    /// Enables or disables the calibration slot.
    pub fn with_calibration(mut self, calibration: bool) -> Self {
        self.judging.calibration = calibration;
        self
    }

    /// Sets the judge-side and team-side session lengths.
    pub fn with_judging_durations(mut self, duration_ms: i64, team_duration_ms: i64) -> Self {
        self.judging.duration_ms = duration_ms;
        self.judging.team_duration_ms = team_duration_ms;
        self
    }

    /// Sets the judge break cadence.
    pub fn with_judge_breaks(mut self, consecutive: Option<usize>, break_ms: i64) -> Self {
        self.judging.consecutive = consecutive;
        self.judging.break_ms = break_ms;
        self
    }

    /// Sets the number of table pairs.
    pub fn with_table_pairs(mut self, pairs: usize) -> Self {
        self.tables.pairs = pairs;
        self
    }

    /// Sets the match length of every round.
    pub fn with_rounds(mut self, round_durations_ms: Vec<i64>) -> Self {
        self.tables.round_durations_ms = round_durations_ms;
        self
    }

    /// Enables or disables staggered table pairs.
    pub fn with_stagger(mut self, stagger: bool) -> Self {
        self.tables.stagger = stagger;
        self
    }

    /// Sets the consecutive-match cap.
    pub fn with_table_consecutive(mut self, consecutive: Option<usize>) -> Self {
        self.tables.consecutive = consecutive;
        self
    }

    /// Sets the target teams per match row.
    pub fn with_run_rate(mut self, run_rate: Option<usize>) -> Self {
        self.tables.run_rate = run_rate;
        self
    }

    /// Sets the bulk refinement budget per table.
    pub fn with_bulk_budget(mut self, per_table_ms: u64) -> Self {
        self.tables.bulk_budget_per_table_ms = per_table_ms;
        self
    }
}
