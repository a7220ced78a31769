//! Table assignment: which seat each team takes in each match row.
//!
//! Match rows come out of the match generator with teams in rotation order.
//! This phase permutes every row so teams see as many different tables as
//! possible, then writes the final `Table(n)` events.
//!
//! # Algorithm
//!
//! 1. Rows are padded to `2 * pairs` seats
//! 2. Greedy passes: each row is solved with [`min_cost`] against the seat
//!    history of all earlier rows. The first pass shifts the seat frame by
//!    the empty pairs seen so far, so byes rotate across tables; later passes
//!    take the row out of the history before re-solving it
//! 3. A time-budgeted [`assign_bulk`] search over all rows, adopted only when
//!    it lowers the whole-schedule cost
//! 4. With staggered starts the pairs are interleaved so that consecutive
//!    table pairs alternate between the early and the late half
//!
//! # Cost
//!
//! | Term | Single row | Whole schedule |
//! |------|-----------|----------------|
//! | Repeats | `prev(team, seat)^1.1` | `(count(team, seat) - 1)^1.1` |
//! | Orphaned bye | `rounds + 1` per pair | `rounds + 1` per pair |

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::Roster;
use crate::config::TournamentConfig;
use crate::error::Result;
use crate::models::{EventCategory, TableSlot, TeamId};
use crate::solver::{assign_bulk, min_cost, SearchOutcome};

const REPEAT_EXPONENT: f64 = 1.1;

/// Result of [`assign_tables`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableAssignment {
    /// Whole-schedule cost of the final seating.
    pub cost: f64,
    /// How the bulk refinement stopped, if it ran.
    pub bulk_outcome: Option<SearchOutcome>,
}

/// Seat occupations per `(team, seat)`.
#[derive(Debug, Default)]
struct SeatHistory {
    counts: HashMap<(TeamId, usize), u32>,
}

impl SeatHistory {
    fn add(&mut self, seats: &[Option<TeamId>]) {
        for (seat, team) in seats.iter().enumerate() {
            if let Some(team) = team {
                *self.counts.entry((*team, seat)).or_default() += 1;
            }
        }
    }

    fn remove(&mut self, seats: &[Option<TeamId>]) {
        for (seat, team) in seats.iter().enumerate() {
            if let Some(count) = team.and_then(|t| self.counts.get_mut(&(t, seat))) {
                *count = count.saturating_sub(1);
            }
        }
    }

    fn weight(&self, team: TeamId, seat: usize) -> f64 {
        self.counts
            .get(&(team, seat))
            .map_or(0.0, |&c| f64::from(c).powf(REPEAT_EXPONENT))
    }
}

/// Complete pairs with exactly one empty seat.
fn orphaned_pairs(seats: &[Option<TeamId>]) -> usize {
    seats
        .chunks_exact(2)
        .filter(|pair| pair[0].is_none() != pair[1].is_none())
        .count()
}

fn empty_pairs(seats: &[Option<TeamId>]) -> usize {
    seats
        .chunks_exact(2)
        .filter(|pair| pair[0].is_none() && pair[1].is_none())
        .count()
}

/// Repeat and orphan cost over every row.
fn schedule_cost(rows: &[Vec<Option<TeamId>>], orphan_penalty: f64) -> f64 {
    let mut counts: HashMap<(TeamId, usize), u32> = HashMap::new();
    let mut orphans = 0;
    for row in rows {
        for (seat, team) in row.iter().enumerate() {
            if let Some(team) = team {
                *counts.entry((*team, seat)).or_default() += 1;
            }
        }
        orphans += orphaned_pairs(row);
    }
    counts
        .values()
        .map(|&c| f64::from(c - 1).powf(REPEAT_EXPONENT))
        .sum::<f64>()
        + orphans as f64 * orphan_penalty
}

/// Solves one row in a seat frame shifted by `rotation`.
fn solve_row(
    seats: &[Option<TeamId>],
    history: &SeatHistory,
    rotation: usize,
    orphan_penalty: f64,
) -> Result<Vec<Option<TeamId>>> {
    let len = seats.len().max(1);
    let table = |i: usize| (i + rotation) % len;
    let solved = min_cost(seats, |partial: &[Option<TeamId>]| {
        partial
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|t| history.weight(t, table(i))))
            .sum::<f64>()
            + orphaned_pairs(partial) as f64 * orphan_penalty
    })?;

    let mut out = vec![None; seats.len()];
    for (i, team) in solved.seats.into_iter().enumerate() {
        out[table(i)] = team;
    }
    Ok(out)
}

/// Seat order that alternates table pairs between the early and late half.
fn stagger_order(pairs: usize) -> Vec<usize> {
    (0..2)
        .flat_map(|half| (half..pairs).step_by(2))
        .flat_map(|pair| [2 * pair, 2 * pair + 1])
        .collect()
}

/// Seats every team, replacing provisional match events with final ones.
///
/// # Errors
/// Propagates solver errors; rows are padded to an even seat count, so in
/// practice this only fails on a malformed configuration.
pub fn assign_tables(
    slots: &mut [TableSlot],
    roster: &mut Roster,
    config: &TournamentConfig,
) -> Result<TableAssignment> {
    let tables = &config.tables;
    let seats = tables.seats();
    let orphan_penalty = (tables.rounds() + 1) as f64;

    for round in slots.iter_mut().filter_map(TableSlot::as_round_mut) {
        if round.seats.len() < seats {
            round.seats.resize(seats, None);
        }
    }

    let mut history = SeatHistory::default();
    for pass in 0..tables.assignment_passes {
        let mut rotation = 0;
        for round in slots.iter_mut().filter_map(TableSlot::as_round_mut) {
            if pass == 0 {
                rotation = (rotation + 2 * empty_pairs(&round.seats)) % round.seats.len().max(1);
            } else {
                history.remove(&round.seats);
            }
            round.seats = solve_row(&round.seats, &history, rotation, orphan_penalty)?;
            history.add(&round.seats);
        }
        debug!(pass, "table assignment pass complete");
    }

    let rows: Vec<Vec<Option<TeamId>>> = slots
        .iter()
        .filter_map(TableSlot::as_round)
        .map(|r| r.seats.clone())
        .collect();
    let mut cost = schedule_cost(&rows, orphan_penalty);

    let mut bulk_outcome = None;
    if !rows.is_empty() && tables.bulk_budget_per_table_ms > 0 {
        let budget = Duration::from_millis(tables.bulk_budget_per_table_ms * seats as u64);
        let bulk = assign_bulk(
            &rows,
            |partial: &[Vec<Option<TeamId>>]| schedule_cost(partial, orphan_penalty),
            0.0,
            Instant::now() + budget,
        )?;
        if bulk.outcome == SearchOutcome::TimeLimit {
            warn!(
                budget_ms = budget.as_millis() as u64,
                cost = bulk.cost,
                "table refinement stopped at time limit"
            );
        }
        if bulk.cost < cost {
            debug!(before = cost, after = bulk.cost, nodes = bulk.nodes, "bulk seating adopted");
            cost = bulk.cost;
            for (round, seats) in slots
                .iter_mut()
                .filter_map(TableSlot::as_round_mut)
                .zip(bulk.slots)
            {
                round.seats = seats;
            }
        }
        bulk_outcome = Some(bulk.outcome);
    }

    if tables.stagger {
        let order = stagger_order(tables.pairs);
        for round in slots.iter_mut().filter_map(TableSlot::as_round_mut) {
            if round.seats.len() == order.len() {
                round.seats = order.iter().map(|&s| round.seats[s]).collect();
            }
        }
    }

    for team in roster.iter_mut() {
        team.remove_events(|e| e.category.is_table() && e.location.is_none());
    }
    for round in slots.iter().filter_map(TableSlot::as_round) {
        let duration = tables.round_durations_ms[round.round];
        for (seat, team) in round.seats.iter().enumerate() {
            let Some(team) = team.and_then(|t| roster.get_mut(t)) else {
                continue;
            };
            let ordinal = team
                .calendar()
                .events()
                .iter()
                .filter(|e| e.category.is_table())
                .count();
            team.add_event(
                round.seat_start_ms(seat),
                duration,
                EventCategory::Table(ordinal),
                Some(seat),
            );
        }
    }

    info!(cost, rows = rows.len(), "tables assigned");
    Ok(TableAssignment { cost, bulk_outcome })
}

/// Consolidates idle rows.
///
/// Leading and trailing idle rows are dropped and every run of two or more
/// idle rows or breaks becomes a single `Break`.
pub fn clean_table_slots(slots: &mut Vec<TableSlot>) {
    let Some(first) = slots.iter().position(|s| !s.is_idle()) else {
        slots.clear();
        return;
    };
    let last = slots.iter().rposition(|s| !s.is_idle()).unwrap_or(first);

    let mut cleaned = Vec::with_capacity(last + 1 - first);
    let mut idle_run: Vec<TableSlot> = Vec::new();
    for slot in slots.drain(first..=last) {
        if slot.is_idle() {
            idle_run.push(slot);
            continue;
        }
        if idle_run.len() >= 2 {
            cleaned.push(TableSlot::Break);
            idle_run.clear();
        } else {
            cleaned.append(&mut idle_run);
        }
        cleaned.push(slot);
    }
    *slots = cleaned;
}
