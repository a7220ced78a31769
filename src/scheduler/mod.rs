//! Tournament scheduling phases and KPI evaluation.
//!
//! Each phase reads the team calendars written by the previous one and
//! commits its own writes before the next phase runs.
//!
//! # Phases
//!
//! | Phase | Function | Writes |
//! |-------|----------|--------|
//! | Division partitioning | [`partition_divisions`] | Room groups |
//! | Judging rotation | [`plan_rotation`] | Grids, rotation order |
//! | Judging pace | [`align_judge_duration`] | Session length |
//! | Judging times | [`assign_judge_times`] | `Judging(c)` events |
//! | Table matches | [`schedule_table_matches`] | Provisional match events |
//! | Table assignment | [`assign_tables`] | `Table(n)` events |
//!
//! # KPI
//!
//! `ScheduleKpi` summarizes the finished timetable: end times, the tightest
//! gap any team gets, table repeats and orphaned byes.

mod division;
mod judge_times;
mod kpi;
mod matches;
mod pacing;
mod rotation;
mod tables;

pub use division::{partition_divisions, MIN_ROOM_CAPACITY};
pub use judge_times::{assign_judge_times, JudgeTimes};
pub use kpi::ScheduleKpi;
pub use matches::{schedule_table_matches, sum_to, TablePhases};
pub use pacing::{align_judge_duration, morning_run_rate};
pub use rotation::{plan_rotation, RotationPlan};
pub use tables::{assign_tables, clean_table_slots, TableAssignment};

use std::collections::HashMap;

use crate::models::{Team, TeamId};

/// The teams of a tournament, addressable by position and by id.
///
/// Also keeps the judging rotation order (rank to position). It starts as
/// roster order and is replaced once the rotation is planned.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    teams: Vec<Team>,
    index: HashMap<TeamId, usize>,
    rotation: Vec<usize>,
}

impl Roster {
    /// Builds a roster. Later duplicates of an id shadow earlier ones.
    pub fn new(teams: Vec<Team>) -> Self {
        let index = teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        let rotation = (0..teams.len()).collect();
        Self {
            teams,
            index,
            rotation,
        }
    }

    /// All teams, in roster order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Number of teams.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Team at a roster position.
    pub fn team(&self, pos: usize) -> &Team {
        &self.teams[pos]
    }

    pub(crate) fn team_mut(&mut self, pos: usize) -> &mut Team {
        &mut self.teams[pos]
    }

    /// Team with the given id.
    pub fn get(&self, id: TeamId) -> Option<&Team> {
        self.index.get(&id).map(|&i| &self.teams[i])
    }

    pub(crate) fn get_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.index.get(&id).map(|&i| &mut self.teams[i])
    }

    /// Roster positions of `ids`, skipping unknown ids.
    pub fn positions(&self, ids: &[TeamId]) -> Vec<usize> {
        ids.iter().filter_map(|id| self.index.get(id).copied()).collect()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Team> {
        self.teams.iter_mut()
    }

    /// Roster positions in rotation order.
    pub(crate) fn rotation(&self) -> &[usize] {
        &self.rotation
    }

    /// Replaces the rotation order. Unknown ids are skipped.
    pub(crate) fn set_rotation(&mut self, order: &[TeamId]) {
        self.rotation = self.positions(order);
    }
}

/// `ceil(a / b)` for `b > 0`; zero when `b <= 0`.
#[inline]
pub(crate) fn ceil_div(a: i64, b: i64) -> i64 {
    if b <= 0 {
        0
    } else {
        -(-a).div_euclid(b)
    }
}
