//! Time-budgeted multi-slot seat assignment.
//!
//! Same branching rules as [`min_cost`](super::min_cost), applied to many
//! seat lists at once. The whole-schedule problem is too large to prove
//! optimal, so the search stops at a target cost, at a wall-clock deadline,
//! or when the tree is exhausted, and always returns the best arrangement
//! found. The input teams, in input order with the empties after them, form
//! the initial incumbent.

use std::cmp::Reverse;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use super::{cmp_cost, Incumbent};
use crate::error::{Result, ScheduleError};

const TARGET_EPSILON: f64 = 1e-9;

/// Why a bulk search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchOutcome {
    /// Every branch was explored or pruned; the result is optimal.
    Exhausted,
    /// An arrangement at the target cost was found.
    TargetReached,
    /// The deadline passed; the result is best effort.
    TimeLimit,
}

/// Result of [`assign_bulk`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkAssignment<T> {
    /// One seat list per input slot, in input order.
    pub slots: Vec<Vec<Option<T>>>,
    /// Cost of `slots`.
    pub cost: f64,
    /// Termination reason.
    pub outcome: SearchOutcome,
    /// Search nodes visited.
    pub nodes: u64,
}

/// Per-slot search state: teams still to seat and empties still to place.
#[derive(Debug, Clone)]
struct Pending<T> {
    teams: Vec<T>,
    nones: usize,
}

struct Search<'a, T, F> {
    cost: &'a mut F,
    target: f64,
    deadline: Instant,
    nodes: u64,
    stopped: Option<SearchOutcome>,
    best: Incumbent<Vec<Vec<Option<T>>>>,
}

/// Assigns seats in every slot at once, minimizing a whole-schedule cost.
///
/// Slots that contain no team are fixed up front. At each node the slot with
/// the fewest unseated teams (then fewest empties, then lowest index) is
/// extended. A single team left on an odd partial is seated immediately,
/// and leftover empties are appended once a slot runs out of teams.
/// Children are visited by ascending cost, longer partials first on ties.
///
/// # Errors
/// [`ScheduleError::OddSeatCount`] if any slot has odd length.
pub fn assign_bulk<T, F>(
    slots: &[Vec<Option<T>>],
    mut cost: F,
    target: f64,
    deadline: Instant,
) -> Result<BulkAssignment<T>>
where
    T: Copy + Eq,
    F: FnMut(&[Vec<Option<T>>]) -> f64,
{
    if let Some(slot) = slots.iter().find(|s| s.len() % 2 != 0) {
        return Err(ScheduleError::OddSeatCount { len: slot.len() });
    }

    let mut pending = Vec::with_capacity(slots.len());
    let mut current = Vec::with_capacity(slots.len());
    for slot in slots {
        let teams: Vec<T> = slot.iter().flatten().copied().collect();
        let nones = slot.len() - teams.len();
        if teams.is_empty() {
            current.push(slot.clone());
            pending.push(Pending { teams, nones: 0 });
        } else {
            current.push(Vec::with_capacity(slot.len()));
            pending.push(Pending { teams, nones });
        }
    }

    let initial: Vec<Vec<Option<T>>> = slots
        .iter()
        .map(|slot| {
            let mut seats: Vec<Option<T>> = slot.iter().flatten().copied().map(Some).collect();
            seats.resize(slot.len(), None);
            seats
        })
        .collect();
    let initial_cost = cost(&initial);

    let mut search = Search {
        cost: &mut cost,
        target,
        deadline,
        nodes: 0,
        stopped: None,
        best: Incumbent::new(initial, initial_cost),
    };
    search.extend(&pending, &current);

    let outcome = search.stopped.unwrap_or(if search.at_target() {
        SearchOutcome::TargetReached
    } else {
        SearchOutcome::Exhausted
    });
    debug!(
        nodes = search.nodes,
        cost = search.best.cost,
        ?outcome,
        "bulk seat assignment finished"
    );

    Ok(BulkAssignment {
        slots: search.best.solution,
        cost: search.best.cost,
        outcome,
        nodes: search.nodes,
    })
}

impl<T, F> Search<'_, T, F>
where
    T: Copy + Eq,
    F: FnMut(&[Vec<Option<T>>]) -> f64,
{
    fn at_target(&self) -> bool {
        (self.best.cost - self.target).abs() <= TARGET_EPSILON || self.best.cost < self.target
    }

    fn extend(&mut self, pending: &[Pending<T>], current: &[Vec<Option<T>>]) {
        self.nodes += 1;
        if self.stopped.is_some() {
            return;
        }
        if self.at_target() {
            self.stopped = Some(SearchOutcome::TargetReached);
            return;
        }
        if Instant::now() >= self.deadline {
            self.stopped = Some(SearchOutcome::TimeLimit);
            return;
        }

        let Some(idx) = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.teams.is_empty())
            .min_by_key(|(i, p)| (p.teams.len(), p.nones, *i))
            .map(|(i, _)| i)
        else {
            let c = (self.cost)(current);
            self.best.offer(current.to_vec(), c);
            return;
        };

        let slot = &pending[idx];
        let even = current[idx].len() % 2 == 0;

        let mut moves: Vec<Vec<Option<T>>> = Vec::new();
        if slot.nones > 1 && even {
            moves.push(vec![None, None]);
        }
        if slot.nones % 2 == 1 {
            moves.push(vec![None]);
        }
        moves.extend(slot.teams.iter().map(|&t| vec![Some(t)]));

        let mut children = Vec::with_capacity(moves.len());
        for seats in moves {
            let mut next_pending = pending.to_vec();
            let mut next_current = current.to_vec();
            let state = &mut next_pending[idx];
            let row = &mut next_current[idx];

            for seat in &seats {
                match seat {
                    Some(team) => state.teams.retain(|t| t != team),
                    None => state.nones -= 1,
                }
            }
            row.extend(seats);

            if state.teams.len() == 1 && row.len() % 2 == 1 {
                row.push(Some(state.teams[0]));
                state.teams.clear();
            }
            if state.teams.is_empty() && state.nones > 0 {
                row.extend(std::iter::repeat_n(None, state.nones));
                state.nones = 0;
            }

            let c = (self.cost)(&next_current);
            if c < self.best.cost {
                let len = next_current[idx].len();
                children.push((c, len, next_pending, next_current));
            }
        }
        children.sort_by(|a, b| cmp_cost(a.0, b.0).then(Reverse(a.1).cmp(&Reverse(b.1))));

        for (c, _, next_pending, next_current) in children {
            if self.stopped.is_some() {
                return;
            }
            if c < self.best.cost {
                self.extend(&next_pending, &next_current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Repeat penalty per (team, seat) plus an orphaned-bye penalty.
    fn repeat_cost(slots: &[Vec<Option<u32>>]) -> f64 {
        let mut counts: HashMap<(u32, usize), u32> = HashMap::new();
        let mut orphans = 0;
        for row in slots {
            for (seat, team) in row.iter().enumerate() {
                if let Some(t) = team {
                    *counts.entry((*t, seat)).or_default() += 1;
                }
            }
            orphans += row
                .chunks_exact(2)
                .filter(|p| p[0].is_none() != p[1].is_none())
                .count();
        }
        let repeats: f64 = counts.values().map(|&c| f64::from(c - 1).powf(1.1)).sum();
        repeats + 5.0 * orphans as f64
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn test_odd_slot_rejected() {
        let slots = vec![vec![Some(1u32), None], vec![Some(2), None, None]];
        let err = assign_bulk(&slots, repeat_cost, 0.0, far_deadline()).unwrap_err();
        assert!(matches!(err, ScheduleError::OddSeatCount { len: 3 }));
    }

    #[test]
    fn test_removes_repeats() {
        // Same seating three times: every team repeats its table.
        let row = vec![Some(1u32), Some(2), Some(3), Some(4)];
        let slots = vec![row.clone(), row.clone(), row];
        let result = assign_bulk(&slots, repeat_cost, 0.0, far_deadline()).unwrap();

        assert_eq!(result.cost, 0.0);
        assert_eq!(result.outcome, SearchOutcome::TargetReached);
        for (seat, _) in result.slots[0].iter().enumerate() {
            let seated: Vec<_> = result.slots.iter().map(|r| r[seat]).collect();
            assert_ne!(seated[0], seated[1]);
            assert_ne!(seated[1], seated[2]);
            assert_ne!(seated[0], seated[2]);
        }
    }

    #[test]
    fn test_empty_slots_keep_position() {
        let slots = vec![
            vec![Some(1u32), Some(2)],
            vec![None, None],
            vec![Some(1), Some(2)],
        ];
        let result = assign_bulk(&slots, repeat_cost, 0.0, far_deadline()).unwrap();
        assert_eq!(result.slots[1], vec![None, None]);
        assert_eq!(result.slots.len(), 3);
        assert_eq!(result.cost, 0.0);
        assert_ne!(result.slots[0], result.slots[2]);
    }

    #[test]
    fn test_exhausted_when_target_unreachable() {
        // Two seats, three identical rows: some repeat is unavoidable.
        let slots = vec![vec![Some(1u32), Some(2)]; 3];
        let result = assign_bulk(&slots, repeat_cost, 0.0, far_deadline()).unwrap();
        assert_eq!(result.outcome, SearchOutcome::Exhausted);
        assert!(result.cost > 0.0);
        assert!(result.nodes > 0);
    }

    #[test]
    fn test_deadline_returns_incumbent() {
        let slots = vec![vec![Some(1u32), Some(2), Some(3), Some(4)]; 4];
        let result = assign_bulk(&slots, repeat_cost, 0.0, Instant::now()).unwrap();
        assert_eq!(result.outcome, SearchOutcome::TimeLimit);
        assert_eq!(result.slots, slots);
        assert_eq!(result.cost, repeat_cost(&slots));
    }

    #[test]
    fn test_orphan_bye_kept_single() {
        let slots = vec![
            vec![Some(1u32), Some(2), Some(3), None],
            vec![Some(1), Some(2), Some(3), None],
        ];
        let result = assign_bulk(&slots, repeat_cost, 5.0 * 2.0, far_deadline()).unwrap();
        for row in &result.slots {
            let orphans = row
                .chunks_exact(2)
                .filter(|p| p[0].is_none() != p[1].is_none())
                .count();
            assert_eq!(orphans, 1);
        }
        assert_eq!(result.cost, 10.0);
    }
}
