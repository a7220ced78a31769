//! Tournament driver.
//!
//! Owns the roster and configuration and runs every scheduling phase once,
//! in order. A failed phase leaves the tournament untouched.
//!
//! # Example
//!
//! ```
//! use u_tournament::{Tournament, TournamentConfig, TeamEntry};
//!
//! let roster: Vec<TeamEntry> = (1..=12)
//!     .map(|n| TeamEntry::new(n, format!("Team {n}")))
//!     .collect();
//! let mut tournament = Tournament::new(TournamentConfig::default(), roster).unwrap();
//! tournament.schedule().unwrap();
//!
//! let kpi = tournament.kpi();
//! assert!(kpi.matches_per_team.values().all(|&m| m == 4));
//! ```

use tracing::{debug, info};

use crate::config::TournamentConfig;
use crate::error::{Result, ScheduleError};
use crate::models::{DivisionGroup, EventCategory, JudgeSlot, TableSlot, Team, TeamEntry};
use crate::scheduler::{
    align_judge_duration, assign_judge_times, assign_tables, clean_table_slots,
    partition_divisions, plan_rotation, schedule_table_matches, Roster, ScheduleKpi,
};
use crate::validation::validate_roster;

/// A one-day tournament and its timetable.
#[derive(Debug, Clone)]
pub struct Tournament {
    config: TournamentConfig,
    roster: Roster,
    divisions: Vec<DivisionGroup>,
    judge_slots: Vec<JudgeSlot>,
    table_slots: Vec<TableSlot>,
    lunch_ms: Option<i64>,
    scheduled: bool,
}

impl Tournament {
    /// Validates the configuration and roster and builds the teams.
    ///
    /// # Errors
    /// [`ScheduleError::UnsupportedMethod`] for a method other than
    /// interlaced, [`ScheduleError::InvalidConfig`] listing every problem
    /// found in the configuration or the roster.
    pub fn new(config: TournamentConfig, entries: Vec<TeamEntry>) -> Result<Self> {
        config.validate()?;
        validate_roster(&config, &entries).map_err(ScheduleError::InvalidConfig)?;

        let roster = Roster::new(entries.iter().map(Team::from).collect());
        debug!(teams = roster.len(), "tournament created");
        Ok(Self {
            config,
            roster,
            divisions: Vec::new(),
            judge_slots: Vec::new(),
            table_slots: Vec::new(),
            lunch_ms: None,
            scheduled: false,
        })
    }

    /// Builds the whole timetable. Calling it again does nothing.
    ///
    /// # Errors
    /// [`ScheduleError::Infeasible`] when judging or table matches cannot
    /// finish inside the day.
    pub fn schedule(&mut self) -> Result<()> {
        if self.scheduled {
            return Ok(());
        }
        let mut roster = self.roster.clone();
        let mut config = self.config.clone();
        let session_ms = align_judge_duration(&config, roster.len());
        if session_ms != config.judging.duration_ms {
            debug!(
                from_ms = config.judging.duration_ms,
                to_ms = session_ms,
                "judging session length adjusted"
            );
            config.judging.duration_ms = session_ms;
        }
        let config = &config;

        for team in roster.iter_mut() {
            team.add_event(
                config.coach_meeting.start_ms,
                config.coach_meeting.duration_ms(),
                EventCategory::CoachMeeting,
                Some(0),
            );
            team.add_event(
                config.opening.start_ms,
                config.opening.duration_ms(),
                EventCategory::Opening,
                Some(0),
            );
        }

        let divisions = partition_divisions(roster.teams(), config.judging.rooms);
        let calibration =
            config.judging.calibration && roster.teams().iter().all(|t| t.division.is_none());
        let plan = plan_rotation(&divisions, config, calibration);
        roster.set_rotation(&plan.order);
        let judging = assign_judge_times(plan.grids, &mut roster, config)?;

        let phases = schedule_table_matches(&mut roster, &judging, config)?;
        let mut table_slots = phases.slots;
        let assignment = assign_tables(&mut table_slots, &mut roster, config)?;
        clean_table_slots(&mut table_slots);

        info!(
            teams = roster.len(),
            groups = divisions.len(),
            judging_end_ms = judging.end_ms,
            tables_end_ms = phases.finish_ms,
            table_cost = assignment.cost,
            "tournament scheduled"
        );

        self.roster = roster;
        self.divisions = divisions;
        self.judge_slots = judging.slots;
        self.table_slots = table_slots;
        self.lunch_ms = phases.lunch_ms;
        self.scheduled = true;
        Ok(())
    }

    /// Configuration as given. Judging sessions may run slightly longer to
    /// keep pace with the tables.
    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Teams with their calendars, in roster order.
    pub fn teams(&self) -> &[Team] {
        self.roster.teams()
    }

    /// Judging timetable.
    pub fn judge_slots(&self) -> &[JudgeSlot] {
        &self.judge_slots
    }

    /// Table timetable.
    pub fn table_slots(&self) -> &[TableSlot] {
        &self.table_slots
    }

    /// Judging room groups.
    pub fn divisions(&self) -> &[DivisionGroup] {
        &self.divisions
    }

    /// Lunch start the table schedule was shaped around, if any.
    pub fn lunch_ms(&self) -> Option<i64> {
        self.lunch_ms
    }

    /// Whether [`schedule`](Self::schedule) has completed.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Quality indicators of the current timetable.
    pub fn kpi(&self) -> ScheduleKpi {
        ScheduleKpi::calculate(self.teams(), &self.judge_slots, &self.table_slots)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::SchedulingMethod;
    use crate::models::{minutes, JudgeGrid, TableRound};

    fn entries(n: u32) -> Vec<TeamEntry> {
        (1..=n).map(|i| TeamEntry::new(i, format!("Team {i}"))).collect()
    }

    fn scheduled(config: TournamentConfig, roster: Vec<TeamEntry>) -> Tournament {
        let mut tournament = Tournament::new(config, roster).unwrap();
        tournament.schedule().unwrap();
        tournament
    }

    fn count(team: &Team, pred: impl Fn(&EventCategory) -> bool) -> usize {
        team.calendar()
            .events()
            .iter()
            .filter(|e| pred(&e.category))
            .count()
    }

    /// Every two events of a team, not only neighbours, are a travel
    /// buffer apart.
    fn assert_travel(teams: &[Team], travel: i64) {
        for team in teams {
            let events = team.calendar().events();
            for (i, a) in events.iter().enumerate() {
                for b in &events[i + 1..] {
                    assert!(
                        b.start_ms - a.end_ms() >= travel,
                        "team {}: {:?} at {} too close to {:?} at {}",
                        team.id,
                        a.category,
                        a.start_ms,
                        b.category,
                        b.start_ms
                    );
                }
            }
        }
    }

    /// No seat holds two matches at once.
    fn assert_seats_exclusive(teams: &[Team]) {
        let mut by_seat: BTreeMap<usize, Vec<(i64, i64)>> = BTreeMap::new();
        for team in teams {
            for e in team.calendar().events() {
                if let (EventCategory::Table(_), Some(seat)) = (e.category, e.location) {
                    by_seat.entry(seat).or_default().push((e.start_ms, e.end_ms()));
                }
            }
        }
        for (seat, mut matches) in by_seat {
            matches.sort_unstable();
            for w in matches.windows(2) {
                assert!(w[1].0 >= w[0].1, "seat {seat} double-booked at {}", w[1].0);
            }
        }
    }

    fn assert_clean(slots: &[TableSlot]) {
        assert!(slots.first().is_some_and(|s| !s.is_idle()));
        assert!(slots.last().is_some_and(|s| !s.is_idle()));
        assert!(slots.windows(2).all(|w| !(w[0].is_idle() && w[1].is_idle())));
    }

    #[test]
    fn test_default_scenario() {
        let config = TournamentConfig::default();
        let travel = config.travel_ms;
        let t = scheduled(config, entries(24));

        let sessions: Vec<&JudgeGrid> = t.judge_slots().iter().filter_map(|s| s.grid.as_ref()).collect();
        assert_eq!(sessions.len(), 13);
        assert!(matches!(sessions[0], JudgeGrid::Calibration(_)));
        let regular_visits = sessions[1..].iter().map(|g| g.visits().len()).sum::<usize>();
        assert_eq!(regular_visits, 3 * 23);

        for team in t.teams() {
            assert_eq!(count(team, EventCategory::is_judging), 3, "team {}", team.id);
            assert_eq!(count(team, EventCategory::is_table), 4, "team {}", team.id);
            assert_eq!(count(team, |c| *c == EventCategory::Lunch), 0);
            assert!(team.calendar().closest_gap().is_some_and(|g| g >= travel));
        }

        let kpi = t.kpi();
        assert!(kpi.meets_thresholds(travel, usize::MAX));
        assert!(kpi.judging_end_ms > 0 && kpi.tables_end_ms > 0);
        assert_clean(t.table_slots());
        assert_eq!(t.divisions().len(), 1);
    }

    #[test]
    fn test_table_events_use_final_tables() {
        let t = scheduled(TournamentConfig::default(), entries(16));
        for team in t.teams() {
            let ordinals: Vec<usize> = team
                .calendar()
                .events()
                .iter()
                .filter_map(|e| match e.category {
                    EventCategory::Table(n) => {
                        assert!(e.location.is_some_and(|l| l < 4));
                        Some(n)
                    }
                    _ => None,
                })
                .collect();
            assert_eq!(ordinals, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_odd_team_count() {
        let t = scheduled(TournamentConfig::default(), entries(13));
        let slots = t.table_slots();
        assert_clean(slots);

        let odd_rows = slots
            .iter()
            .filter_map(TableSlot::as_round)
            .filter(|r| r.teams().count() % 2 == 1)
            .count();
        let kpi = t.kpi();
        assert_eq!(kpi.orphan_byes, odd_rows);
        for round in slots.iter().filter_map(TableSlot::as_round) {
            assert_eq!(round.seats.len(), 4);
        }
        assert!(kpi.matches_per_team.values().all(|&m| m == 4));
        assert!(kpi.judging_per_team.values().all(|&j| j == 3));
        assert_travel(t.teams(), t.config().travel_ms);
        assert_seats_exclusive(t.teams());
    }

    #[test]
    fn test_staggered_tables() {
        let config = TournamentConfig::default()
            .with_table_pairs(3)
            .with_stagger(true);
        let travel = config.travel_ms;
        let t = scheduled(config, entries(23));

        let rounds: Vec<&TableRound> = t.table_slots().iter().filter_map(TableSlot::as_round).collect();
        assert!(rounds.iter().all(|r| r.seats.len() == 6));
        assert!(rounds
            .iter()
            .all(|r| r.stagger_start_ms == Some(r.start_ms + minutes(5.0))));
        for team in t.teams() {
            assert_eq!(count(team, EventCategory::is_table), 4, "team {}", team.id);
            assert_eq!(count(team, EventCategory::is_judging), 3, "team {}", team.id);
        }
        assert_travel(t.teams(), travel);
        assert_seats_exclusive(t.teams());
        assert_clean(t.table_slots());
    }

    #[test]
    fn test_divisions_disable_calibration() {
        let roster: Vec<TeamEntry> = entries(30)
            .into_iter()
            .map(|e| {
                let label = if e.number <= 18 { "Challenge" } else { "Explore" };
                e.with_division(label)
            })
            .collect();
        let config = TournamentConfig::default().with_judging_rooms(3);
        let travel = config.travel_ms;
        let t = scheduled(config, roster);

        assert_eq!(t.divisions().len(), 2);
        assert!(t
            .judge_slots()
            .iter()
            .filter_map(|s| s.grid.as_ref())
            .all(|g| matches!(g, JudgeGrid::Normal(_))));
        for team in t.teams() {
            assert_eq!(count(team, EventCategory::is_judging), 3);
        }
        assert_travel(t.teams(), travel);
        assert_seats_exclusive(t.teams());

        // 36 judging seats per cycle over 30 teams need 2 rows of 4: the
        // sessions stretch from 17.5 to 18.5 minutes.
        assert_eq!(t.config().judging.duration_ms, minutes(17.5));
        let starts: Vec<i64> = t.judge_slots().iter().map(|s| s.start_ms).collect();
        assert_eq!(starts[1] - starts[0], minutes(18.5));
    }

    #[test]
    fn test_invalid_input_rejected() {
        let err = Tournament::new(TournamentConfig::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidConfig(_)));

        let config = TournamentConfig::default().with_method(SchedulingMethod::Block);
        let err = Tournament::new(config, entries(12)).unwrap_err();
        assert!(matches!(err, ScheduleError::UnsupportedMethod(SchedulingMethod::Block)));
    }

    #[test]
    fn test_schedule_runs_once() {
        let mut t = scheduled(TournamentConfig::default(), entries(12));
        let before = t.table_slots().to_vec();
        t.schedule().unwrap();
        assert!(t.is_scheduled());
        assert_eq!(t.table_slots(), before.as_slice());
        assert_eq!(count(&t.teams()[0], EventCategory::is_table), 4);
    }

    #[test]
    fn test_timetable_serializes() {
        let t = scheduled(TournamentConfig::default(), entries(12));
        let json = serde_json::to_string(t.table_slots()).unwrap();
        assert!(json.contains("Round"));
        assert!(serde_json::to_string(&t.kpi()).is_ok());
    }
}
