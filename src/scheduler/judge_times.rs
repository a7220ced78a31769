//! Judging times: turns rotation grids into timed sessions.
//!
//! # Algorithm
//!
//! 1. Nominal start of slot `i`: `start + i * judge_duration`, plus a
//!    break after every `L` regular slots and the travel buffer after a
//!    calibration slot
//! 2. Blockers (ceremonies widened by the travel buffer, the judges' lunch
//!    at the latest lunch time) are swept in start order; the first session
//!    overlapping a blocker moves to the blocker's end, dragging every later
//!    session with it
//! 3. Idle slots are spliced in at the break boundaries
//! 4. Every visit becomes a `Judging(category)` event of team-visible length

use tracing::{debug, info};

use super::Roster;
use crate::config::TournamentConfig;
use crate::error::{Result, ScheduleError};
use crate::models::{EventCategory, JudgeGrid, JudgeSlot, TimeWindow, DAY_MS};

/// Timed judging schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeTimes {
    /// Sessions and idle slots in time order.
    pub slots: Vec<JudgeSlot>,
    /// End of the last team-visible session (ms).
    pub end_ms: i64,
    /// End of the team session before the widest pause, when that pause can
    /// hold lunch.
    pub lunch_hint_ms: Option<i64>,
}

/// Sessions between breaks, reduced by one when that does not add a break.
pub(crate) fn break_cadence(regular_slots: usize, consecutive: Option<usize>) -> Option<usize> {
    let limit = consecutive.filter(|&l| l > 0)?;
    let span = regular_slots.saturating_sub(1);
    if limit > 1 && span.div_ceil(limit) == span.div_ceil(limit - 1) {
        Some(limit - 1)
    } else {
        Some(limit)
    }
}

/// End of the team session before the widest pause between sessions, if
/// that pause can hold lunch. Of equally wide pauses the latest wins.
fn lunch_hint(times: &[i64], jd: i64, team_duration_ms: i64, lunch_ms: i64) -> Option<i64> {
    times
        .windows(2)
        .map(|w| (w[1] - w[0] - jd, w[0]))
        .max_by_key(|&(gap, _)| gap)
        .filter(|&(gap, _)| gap >= lunch_ms)
        .map(|(_, t)| t + team_duration_ms)
}

/// Assigns start times to `grids` and writes judging events onto the teams.
///
/// # Errors
/// [`ScheduleError::Infeasible`] if judging runs past the end of the day.
pub fn assign_judge_times(
    grids: Vec<JudgeGrid>,
    roster: &mut Roster,
    config: &TournamentConfig,
) -> Result<JudgeTimes> {
    let judging = &config.judging;
    let travel = config.travel_ms;
    let jd = judging.duration_ms;

    let calib = usize::from(matches!(grids.first(), Some(JudgeGrid::Calibration(_))));
    let regular = grids.len() - calib;
    let cadence = break_cadence(regular, judging.consecutive);

    // Regular-slot indices that open a new cycle after a break.
    let breaks: Vec<usize> = match cadence {
        Some(limit) => (1..)
            .map(|k| k * limit)
            .take_while(|&b| b < regular.saturating_sub(1))
            .collect(),
        None => Vec::new(),
    };

    let mut times: Vec<i64> = (0..grids.len())
        .map(|i| {
            let mut t = judging.start_ms + i as i64 * jd;
            if i >= calib && calib > 0 {
                t += travel;
            }
            let j = i.saturating_sub(calib);
            let before = breaks.iter().filter(|&&b| b <= j).count() as i64;
            t + before * judging.break_ms
        })
        .collect();

    let mut blockers = [
        config.coach_meeting.widened(travel),
        config.opening.widened(travel),
        TimeWindow::starting_at(config.lunch.latest_ms, config.lunch.duration_ms),
    ];
    blockers.sort_by_key(|b| (b.start_ms, b.end_ms));
    for block in blockers {
        if let Some(i) = times
            .iter()
            .position(|&t| t < block.end_ms && t + jd > block.start_ms)
        {
            let delay = block.end_ms - times[i];
            for t in &mut times[i..] {
                *t += delay;
            }
            debug!(slot = i, delay_ms = delay, "judging delayed by blocker");
        }
    }

    if let Some(&last) = times.last() {
        if last + jd > DAY_MS {
            return Err(ScheduleError::infeasible(
                "judging",
                format!("last session would end at {} ms", last + jd),
            ));
        }
    }

    let end_ms = times.last().map_or(judging.start_ms, |&t| t + judging.team_duration_ms);
    let lunch_hint_ms = lunch_hint(
        &times,
        jd,
        judging.team_duration_ms,
        config.lunch.duration_ms,
    );

    for (&start, grid) in times.iter().zip(&grids) {
        for (category, room, team) in grid.visits() {
            if let Some(team) = roster.get_mut(team) {
                team.add_event(
                    start,
                    judging.team_duration_ms,
                    EventCategory::Judging(category),
                    Some(room),
                );
            }
        }
    }

    let mut slots: Vec<JudgeSlot> = Vec::with_capacity(grids.len() + breaks.len() + 1);
    for (i, (start, grid)) in times.iter().copied().zip(grids).enumerate() {
        let opens_cycle = i > 0 && ((calib > 0 && i == calib) || breaks.contains(&(i - calib)));
        if opens_cycle {
            let idle_at = times[i - 1] + jd;
            if idle_at != start {
                slots.push(JudgeSlot {
                    start_ms: idle_at,
                    grid: None,
                });
            }
        }
        slots.push(JudgeSlot {
            start_ms: start,
            grid: Some(grid),
        });
    }

    info!(
        sessions = times.len(),
        idle = slots.len() - times.len(),
        end_ms,
        "judging times assigned"
    );
    Ok(JudgeTimes {
        slots,
        end_ms,
        lunch_hint_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{clock, minutes, Team, TeamId, TimeWindow};
    use crate::scheduler::{plan_rotation, partition_divisions};

    fn roster(n: u32) -> Roster {
        Roster::new((1..=n).map(|i| Team::new(TeamId(i), format!("T{i}"))).collect())
    }

    fn plan(config: &TournamentConfig, roster: &Roster) -> Vec<JudgeGrid> {
        let groups = partition_divisions(roster.teams(), config.judging.rooms);
        plan_rotation(&groups, config, config.judging.calibration).grids
    }

    /// Ceremonies and lunch far away from a morning of judging.
    fn quiet_config() -> TournamentConfig {
        TournamentConfig::default()
            .with_ceremonies(
                TimeWindow::new(clock(6, 0), clock(6, 15)),
                TimeWindow::new(clock(6, 30), clock(6, 45)),
            )
            .with_lunch(clock(15, 0), clock(16, 0), minutes(30.0))
            .with_calibration(false)
            .with_judge_breaks(None, 0)
    }

    #[test]
    fn test_break_cadence() {
        assert_eq!(break_cadence(9, Some(4)), Some(4));
        // 6 / 4 and 6 / 3 both need two breaks.
        assert_eq!(break_cadence(7, Some(4)), Some(3));
        assert_eq!(break_cadence(7, None), None);
        assert_eq!(break_cadence(7, Some(1)), Some(1));
    }

    #[test]
    fn test_lunch_hint_prefers_latest_widest_pause() {
        let jd = minutes(20.0);
        let td = minutes(10.0);
        // Two 40 minute pauses, after the sessions at 9:00 and 10:20.
        let times = [clock(9, 0), clock(10, 0), clock(10, 20), clock(11, 20)];
        assert_eq!(
            lunch_hint(&times, jd, td, minutes(30.0)),
            Some(clock(10, 20) + td)
        );
        assert_eq!(lunch_hint(&times, jd, td, minutes(45.0)), None);
        assert_eq!(lunch_hint(&times[..1], jd, td, minutes(30.0)), None);
    }

    #[test]
    fn test_nominal_times_without_blockers() {
        let config = quiet_config();
        let mut teams = roster(12);
        let grids = plan(&config, &teams);
        let n = grids.len();
        let times = assign_judge_times(grids, &mut teams, &config).unwrap();

        assert_eq!(times.slots.len(), n);
        for (i, slot) in times.slots.iter().enumerate() {
            assert_eq!(slot.start_ms, clock(9, 0) + i as i64 * minutes(17.5));
        }
        assert_eq!(
            times.end_ms,
            clock(9, 0) + (n as i64 - 1) * minutes(17.5) + minutes(10.0)
        );
        assert_eq!(times.lunch_hint_ms, None);
    }

    #[test]
    fn test_breaks_insert_idle_slots() {
        let config = quiet_config().with_judge_breaks(Some(2), minutes(10.0));
        let mut teams = roster(12);
        let grids = plan(&config, &teams);
        let times = assign_judge_times(grids, &mut teams, &config).unwrap();

        let idle: Vec<usize> = times
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_idle())
            .map(|(i, _)| i)
            .collect();
        assert!(!idle.is_empty());
        for &i in &idle {
            let before = times.slots[i - 1].start_ms;
            let after = times.slots[i + 1].start_ms;
            assert_eq!(times.slots[i].start_ms, before + minutes(17.5));
            assert_eq!(after - before, minutes(27.5));
        }
    }

    #[test]
    fn test_blocker_inside_break_costs_uncovered_part() {
        // Sessions 9:00 and 9:20 (20 min each), a 30 min break, then 10:10
        // and 10:30. A lunch blocker 9:45-10:15 costs only 5 min.
        let config = quiet_config()
            .with_judging_durations(minutes(20.0), minutes(10.0))
            .with_judge_breaks(Some(2), minutes(30.0))
            .with_lunch(clock(9, 0), clock(9, 45), minutes(30.0))
            .with_travel(0);
        let mut teams = roster(6);
        let grids = vec![JudgeGrid::empty(2); 4];
        let times = assign_judge_times(grids, &mut teams, &config).unwrap();
        let sessions: Vec<i64> = times
            .slots
            .iter()
            .filter(|s| !s.is_idle())
            .map(|s| s.start_ms)
            .collect();
        assert_eq!(
            sessions,
            vec![clock(9, 0), clock(9, 20), clock(10, 15), clock(10, 35)]
        );
    }

    #[test]
    fn test_default_day() {
        let config = TournamentConfig::default();
        let mut teams = roster(24);
        let grids = plan(&config, &teams);
        let times = assign_judge_times(grids, &mut teams, &config).unwrap();

        let travel = config.travel_ms;
        let jd = config.judging.duration_ms;
        // Calibration idle slot plus two judge breaks.
        assert_eq!(times.slots.iter().filter(|s| s.is_idle()).count(), 3);
        for slot in times.slots.iter().filter(|s| !s.is_idle()) {
            assert!(slot.start_ms >= config.opening.end_ms + travel);
            let lunch = TimeWindow::starting_at(config.lunch.latest_ms, config.lunch.duration_ms);
            assert!(!lunch.overlaps(&TimeWindow::starting_at(slot.start_ms, jd)));
        }
        for team in teams.teams() {
            let judged = team
                .calendar()
                .events()
                .iter()
                .filter(|e| e.category.is_judging())
                .count();
            assert_eq!(judged, 3, "team {}", team.id);
            assert!(team.calendar().closest_gap().is_none_or(|g| g >= travel));
        }
        assert!(times.lunch_hint_ms.is_some());
    }

    #[test]
    fn test_day_overrun_is_infeasible() {
        let config = quiet_config().with_judging_durations(minutes(600.0), minutes(10.0));
        let mut teams = roster(12);
        let grids = plan(&config, &teams);
        let err = assign_judge_times(grids, &mut teams, &config).unwrap_err();
        assert!(matches!(err, ScheduleError::Infeasible { phase: "judging", .. }));
    }
}
