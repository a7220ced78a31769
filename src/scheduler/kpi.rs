//! Timetable quality metrics (KPIs).
//!
//! Computes the indicators an organizer checks before publishing a
//! timetable: when each part of the day ends, how tight the tightest
//! transition is, and how fairly tables and byes are spread.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Judging end | Latest end of any judging event |
//! | Tables end | Latest end of any table match |
//! | Minimum gap | Smallest idle time between two events of one team |
//! | Repeated tables | Sum over (team, table) of `occupations - 1` |
//! | Orphaned byes | Table pairs with exactly one team |
//! | Idle rows | Idle judging slots and idle table rows |

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{JudgeSlot, TableSlot, Team, TeamId};

/// Timetable performance indicators.
///
/// All time values are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleKpi {
    /// Latest end of any judging event (ms); 0 without judging.
    pub judging_end_ms: i64,
    /// Latest end of any table match (ms); 0 without matches.
    pub tables_end_ms: i64,
    /// Smallest gap between consecutive events of any team.
    pub min_gap_ms: Option<i64>,
    /// Table occupations beyond the first, summed over teams and tables.
    pub repeated_tables: usize,
    /// Table pairs with exactly one empty seat.
    pub orphan_byes: usize,
    /// Idle judging slots.
    pub idle_judge_slots: usize,
    /// Idle table rows and breaks.
    pub idle_table_rows: usize,
    /// Table matches per team.
    pub matches_per_team: BTreeMap<TeamId, usize>,
    /// Judging sessions per team.
    pub judging_per_team: BTreeMap<TeamId, usize>,
}

impl ScheduleKpi {
    /// Computes KPIs from the finished calendars and timetables.
    pub fn calculate(teams: &[Team], judge_slots: &[JudgeSlot], table_slots: &[TableSlot]) -> Self {
        let mut judging_end_ms = 0;
        let mut tables_end_ms = 0;
        let mut min_gap_ms: Option<i64> = None;
        let mut matches_per_team = BTreeMap::new();
        let mut judging_per_team = BTreeMap::new();

        for team in teams {
            let events = team.calendar().events();
            let mut matches = 0;
            let mut judged = 0;
            for event in events {
                if event.category.is_judging() {
                    judged += 1;
                    judging_end_ms = judging_end_ms.max(event.end_ms());
                } else if event.category.is_table() {
                    matches += 1;
                    tables_end_ms = tables_end_ms.max(event.end_ms());
                }
            }
            if let Some(gap) = team.calendar().closest_gap() {
                min_gap_ms = Some(min_gap_ms.map_or(gap, |g| g.min(gap)));
            }
            matches_per_team.insert(team.id, matches);
            judging_per_team.insert(team.id, judged);
        }

        let mut occupations: HashMap<(TeamId, usize), usize> = HashMap::new();
        let mut orphan_byes = 0;
        for round in table_slots.iter().filter_map(TableSlot::as_round) {
            for (seat, team) in round.seats.iter().enumerate() {
                if let Some(team) = team {
                    *occupations.entry((*team, seat)).or_default() += 1;
                }
            }
            orphan_byes += round
                .seats
                .chunks_exact(2)
                .filter(|pair| pair[0].is_none() != pair[1].is_none())
                .count();
        }
        let repeated_tables = occupations.values().map(|&c| c - 1).sum();

        Self {
            judging_end_ms,
            tables_end_ms,
            min_gap_ms,
            repeated_tables,
            orphan_byes,
            idle_judge_slots: judge_slots.iter().filter(|s| s.is_idle()).count(),
            idle_table_rows: table_slots.iter().filter(|s| s.is_idle()).count(),
            matches_per_team,
            judging_per_team,
        }
    }

    /// Whether every team gets at least `min_gap_ms` between events and
    /// table repeats stay within `max_repeats`.
    pub fn meets_thresholds(&self, min_gap_ms: i64, max_repeats: usize) -> bool {
        self.min_gap_ms.is_none_or(|g| g >= min_gap_ms) && self.repeated_tables <= max_repeats
    }
}
