//! Table match generation.
//!
//! Walks the rotation order and packs teams into rows of simultaneous
//! matches, one row per match duration. Each step looks at the teams next
//! in rotation, counts how many are free right now, and schedules a block
//! of rows for them; when too few are free it leaves the row idle.
//!
//! # Phases
//!
//! - **Morning**: the first two rounds. Start offsets and starting ranks
//!   are searched for the earliest finish. If the morning runs past the
//!   latest lunch start, a lunch block is placed on every calendar and the
//!   morning is regenerated around it.
//! - **Afternoon**: the remaining rounds, after lunch and a pause,
//!   continuing the rotation where the morning stopped.
//!
//! Morning rows are paced on judging throughput (see
//! [`morning_run_rate`]); afternoon rows may fill every seat.

use std::ops::Range;

use tracing::{debug, info, warn};

use super::{ceil_div, morning_run_rate, JudgeTimes, Roster};
use crate::config::TournamentConfig;
use crate::error::{Result, ScheduleError};
use crate::models::{EventCategory, RotatingIndex, TableRound, TableSlot, TeamId, DAY_MS, MINUTE_MS};

/// Rounds scheduled before lunch.
const MORNING_ROUNDS: usize = 2;

/// Whole-match offsets tried on top of the fine-grained ones.
const MATCH_OFFSETS: i64 = 3;

/// Generated match rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePhases {
    /// Match rows in time order. A `Break` separates morning and afternoon.
    pub slots: Vec<TableSlot>,
    /// Start of the row after the last match (ms).
    pub finish_ms: i64,
    /// Lunch start used to shape the schedule, if any.
    pub lunch_ms: Option<i64>,
}

/// One pass of the greedy generator.
#[derive(Debug, Clone)]
struct MatchRun {
    finish_ms: i64,
    slots: Vec<TableSlot>,
    team_next: usize,
}

/// Picks `picks` sizes from `options` summing as close to `goal` as possible.
///
/// Each pick is the option nearest the even split of what is left. A goal
/// below the smallest option is returned as a single undersized pick. With
/// `force_take_all`, any remainder is folded into the last pick when that
/// keeps it within the largest option; the sum never exceeds `goal`.
///
/// ```
/// use u_tournament::scheduler::sum_to;
///
/// assert_eq!(sum_to(&[2, 4], 7, 2, false), vec![4, 2]);
/// assert_eq!(sum_to(&[2, 4], 7, 2, true), vec![4, 3]);
/// ```
pub fn sum_to(options: &[usize], goal: usize, picks: usize, force_take_all: bool) -> Vec<usize> {
    let (Some(&min), Some(&max)) = (options.iter().min(), options.iter().max()) else {
        return Vec::new();
    };
    if goal < min {
        return vec![goal];
    }

    let mut selected = Vec::with_capacity(picks);
    let (mut goal, mut picks) = (goal, picks);
    while goal >= min && picks > 0 {
        let split = goal as f64 / picks as f64;
        let pick = options
            .iter()
            .copied()
            .filter(|&o| o <= goal)
            .min_by(|a, b| {
                (*a as f64 - split)
                    .abs()
                    .total_cmp(&(*b as f64 - split).abs())
            })
            .unwrap_or(min);
        selected.push(pick);
        goal -= pick;
        picks -= 1;
    }
    if force_take_all {
        if let Some(last) = selected.last_mut() {
            if max - *last >= goal {
                *last += goal;
            }
        }
    }
    selected
}

/// Teams per row for a round of `duration_ms`, starting from `base` teams
/// per row and reduced when travel keeps teams away for several rows.
fn run_rate(config: &TournamentConfig, num_teams: usize, duration_ms: i64, base: usize) -> usize {
    let tables = &config.tables;
    let ideal = (2 * base.div_ceil(2).min(tables.pairs)).max(2);
    let per_team = config.travel_ms as f64 / duration_ms as f64
        + if tables.stagger { 1.5 } else { 1.0 };
    let rate = (num_teams as f64 / per_team.ceil()) as usize;
    (rate / 2 * 2).clamp(2, ideal)
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

/// Shortest prefix of `sizes` whose sum reaches `at_least`.
fn first_at_least(sizes: &mut Vec<usize>, at_least: usize) {
    let mut sum = 0;
    if let Some(end) = sizes.iter().position(|&s| {
        sum += s;
        sum >= at_least
    }) {
        sizes.truncate(end + 1);
    }
}

/// Greedy match generation over `rounds`, starting at `start_ms` with the
/// team at rotation rank `team_start`. Rows hold at most `base_rate` teams.
///
/// Every match is written onto the team calendars as a provisional
/// `Table(round)` event without a location.
fn run_matches(
    roster: &mut Roster,
    order: &[usize],
    config: &TournamentConfig,
    base_rate: usize,
    start_ms: i64,
    team_start: usize,
    rounds: Range<usize>,
) -> Result<MatchRun> {
    let tables = &config.tables;
    let travel = config.travel_ms;
    let n = order.len();
    let rounds: Vec<usize> = rounds.collect();
    let total = rounds.len() * n;
    let cap = tables.consecutive.unwrap_or(usize::MAX);

    let mut teams_left = total;
    let mut time_next = start_ms;
    let mut team_next = RotatingIndex::new(team_start, n);
    let mut consec = 0usize;
    let mut slots = Vec::new();

    while teams_left > 0 {
        if time_next > DAY_MS {
            return Err(ScheduleError::infeasible(
                "table matches",
                format!("{teams_left} team matches still unplaced at the end of the day"),
            ));
        }

        let rnd = rounds[(total - teams_left) / n];
        let dur = tables.round_durations_ms[rnd];
        let half = if tables.stagger { dur / 2 } else { 0 };
        let window = dur + half;
        let max_size = run_rate(config, n, dur, base_rate);
        let min_size = max_size.saturating_sub(2).max(2);
        let options: Vec<usize> = (min_size..=max_size).step_by(2).collect();

        let limit = teams_left.min(n);
        let max_teams = (0..limit)
            .find(|&t| {
                !roster
                    .team(order[team_next.offset(t)])
                    .available(time_next, window, travel)
            })
            .unwrap_or(limit);

        let mut num_matches = 0usize;
        if max_teams > 0 {
            let next_commit = (0..max_teams)
                .map(|t| {
                    roster
                        .team(order[team_next.offset(t)])
                        .next_event(time_next)
                        .start_ms
                })
                .min()
                .unwrap_or(i64::MAX);
            let fit = if next_commit == i64::MAX {
                usize::MAX
            } else {
                let room = next_commit - time_next - travel - half;
                usize::try_from(room.div_euclid(dur)).unwrap_or(0)
            };
            let bound = if max_teams < limit {
                let blocked = roster.team(order[team_next.offset(max_teams)]);
                let free_at = blocked
                    .calendar()
                    .next_available_for(time_next, window, travel);
                usize::try_from(ceil_div(free_at - time_next, dur)).unwrap_or(0)
            } else {
                max_teams.div_ceil(max_size)
            };
            num_matches = fit.min(bound);
        }

        let final_fit = teams_left <= max_teams && max_teams <= max_size;
        let (mut goal, mut picks) = (max_teams, num_matches);
        if max_teams < min_size || num_matches == 0 || consec >= cap {
            consec = 0;
            if !(num_matches > 0 && final_fit) {
                goal = 0;
                picks = 0;
            }
        }

        let mut sizes = if goal > 0 && picks > 0 {
            sum_to(&options, goal, picks, max_teams >= teams_left)
        } else {
            Vec::new()
        };
        sizes.truncate(cap.saturating_sub(consec));
        first_at_least(&mut sizes, (teams_left - 1) % n + 1);

        let mut placed = 0;
        for size in sizes {
            let members: Vec<usize> = (0..size).map(|t| order[team_next.offset(t)]).collect();
            if !members
                .iter()
                .all(|&p| roster.team(p).available(time_next, window, travel))
            {
                break;
            }

            let mut seats: Vec<Option<TeamId>> = Vec::with_capacity(max_size);
            for &p in &members {
                let team = roster.team_mut(p);
                team.add_event(time_next, window, EventCategory::Table(rnd), None);
                seats.push(Some(team.id));
            }
            seats.resize(seats.len().max(max_size), None);

            slots.push(TableSlot::Round(TableRound {
                start_ms: time_next,
                stagger_start_ms: tables.stagger.then_some(time_next + half),
                round: rnd,
                seats,
            }));
            time_next += dur;
            team_next.advance(size);
            teams_left -= size;
            consec += 1;
            placed += 1;
        }

        if placed == 0 {
            slots.push(TableSlot::Round(TableRound::new(
                time_next,
                rnd,
                vec![None; max_size],
            )));
            time_next += dur;
            consec = 0;
        }
    }

    Ok(MatchRun {
        finish_ms: time_next,
        slots,
        team_next: team_next.get(),
    })
}

/// A morning pass, regenerated around a shared lunch if it runs past the
/// latest lunch start. Synthetic lunch events are removed before returning.
fn run_with_lunch(
    roster: &Roster,
    order: &[usize],
    config: &TournamentConfig,
    start_ms: i64,
    team_start: usize,
    rounds: Range<usize>,
    lunch_at: i64,
) -> Result<(MatchRun, Roster, Option<i64>)> {
    let base_rate = morning_run_rate(config, order.len());
    let mut trial = roster.clone();
    let run = run_matches(
        &mut trial,
        order,
        config,
        base_rate,
        start_ms,
        team_start,
        rounds.clone(),
    )?;
    if run.finish_ms <= config.lunch.latest_ms {
        return Ok((run, trial, None));
    }

    let mut trial = roster.clone();
    for team in trial.iter_mut() {
        team.add_event(lunch_at, config.lunch.duration_ms, EventCategory::Lunch, None);
    }
    let run = run_matches(&mut trial, order, config, base_rate, start_ms, team_start, rounds)?;
    for team in trial.iter_mut() {
        team.remove_events(|e| e.category == EventCategory::Lunch);
    }
    Ok((run, trial, Some(lunch_at)))
}

/// Generates all table match rows and writes provisional match events.
///
/// Matches follow the roster's rotation order, so teams play in the same
/// sequence they are judged.
///
/// # Errors
/// [`ScheduleError::Infeasible`] if no start offset lets every match fit
/// inside the day.
pub fn schedule_table_matches(
    roster: &mut Roster,
    judging: &JudgeTimes,
    config: &TournamentConfig,
) -> Result<TablePhases> {
    let order = roster.rotation().to_vec();
    let n = order.len();
    let tables = &config.tables;
    let rounds = tables.rounds();
    let travel = config.travel_ms;
    let lunch = &config.lunch;

    let first_judging = judging
        .slots
        .first()
        .map_or(config.judging.start_ms, |s| s.start_ms);
    let earliest = (config.opening.end_ms + travel).max(first_judging);
    let lunch_at = (judging.lunch_hint_ms.unwrap_or(judging.end_ms) + travel)
        .clamp(lunch.earliest_ms, lunch.latest_ms.max(lunch.earliest_ms));

    let dur0 = tables.round_durations_ms.first().copied().unwrap_or(MINUTE_MS);
    let increment = gcd(
        dur0,
        gcd(config.judging.duration_ms, config.judging.team_duration_ms),
    )
    .max(MINUTE_MS);
    let offsets: Vec<i64> = (0..)
        .map(|i| i * increment)
        .take_while(|&o| o < dur0)
        .chain((1..=MATCH_OFFSETS).map(|k| k * dur0))
        .collect();

    let morning_rounds = 0..rounds.min(MORNING_ROUNDS);
    let mut best: Option<(i64, i64, MatchRun, Roster, Option<i64>)> = None;
    let mut last_err = None;
    for &offset in &offsets {
        let start = earliest + offset;
        for team_start in 0..n {
            match run_with_lunch(
                roster,
                &order,
                config,
                start,
                team_start,
                morning_rounds.clone(),
                lunch_at,
            ) {
                Ok((run, trial, lunch_used)) => {
                    let key = (run.finish_ms, run.finish_ms - start);
                    if best.as_ref().is_none_or(|b| key < (b.0, b.1)) {
                        best = Some((key.0, key.1, run, trial, lunch_used));
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }
    }
    let Some((_, _, morning, trial, morning_lunch)) = best else {
        return Err(last_err.unwrap_or_else(|| {
            ScheduleError::infeasible("table matches", "no morning start could be evaluated")
        }));
    };
    *roster = trial;
    if morning_lunch.is_some() {
        warn!(lunch_ms = lunch_at, "morning matches regenerated around lunch");
    }
    debug!(
        finish_ms = morning.finish_ms,
        rows = morning.slots.len(),
        "morning table rounds placed"
    );

    if rounds <= MORNING_ROUNDS {
        info!(finish_ms = morning.finish_ms, "table matches scheduled");
        return Ok(TablePhases {
            slots: morning.slots,
            finish_ms: morning.finish_ms,
            lunch_ms: morning_lunch,
        });
    }

    // Each team lunches at its first free moment from the shared lunch time.
    for team in roster.iter_mut() {
        let at = team
            .calendar()
            .next_available_for(lunch_at, lunch.duration_ms, travel);
        team.add_event(at, lunch.duration_ms, EventCategory::Lunch, None);
    }

    // A morning regenerated around lunch already has its pause; otherwise
    // the tables stop for a full lunch length.
    let afternoon_rounds = MORNING_ROUNDS..rounds;
    let pause = if morning_lunch.is_some() {
        afternoon_rounds
            .clone()
            .map(|r| tables.round_durations_ms[r])
            .max()
            .unwrap_or(dur0)
    } else {
        lunch.duration_ms
    };
    let afternoon_start = (morning.finish_ms + pause).max(lunch_at + lunch.duration_ms);
    let afternoon_rate = tables.run_rate.unwrap_or(tables.seats());
    let mut best: Option<(i64, i64, MatchRun, Roster)> = None;
    for &offset in &offsets {
        let start = afternoon_start + offset;
        for rank_offset in 0..n.div_ceil(2) {
            let mut trial = roster.clone();
            let team_start = (morning.team_next + rank_offset) % n.max(1);
            match run_matches(
                &mut trial,
                &order,
                config,
                afternoon_rate,
                start,
                team_start,
                afternoon_rounds.clone(),
            ) {
                Ok(run) => {
                    if best
                        .as_ref()
                        .is_none_or(|b| (run.finish_ms, start) < (b.0, b.1))
                    {
                        best = Some((run.finish_ms, start, run, trial));
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }
    }
    let Some((finish_ms, _, afternoon, mut trial)) = best else {
        return Err(last_err.unwrap_or_else(|| {
            ScheduleError::infeasible("table matches", "no afternoon start could be evaluated")
        }));
    };
    for team in trial.iter_mut() {
        team.remove_events(|e| e.category == EventCategory::Lunch);
    }
    *roster = trial;

    let mut slots = morning.slots;
    slots.push(TableSlot::Break);
    slots.extend(afternoon.slots);

    info!(finish_ms, rows = slots.len(), "table matches scheduled");
    Ok(TablePhases {
        slots,
        finish_ms,
        lunch_ms: Some(lunch_at),
    })
}
