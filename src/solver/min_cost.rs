//! Optimal single-slot seat assignment.

use serde::Serialize;

use super::{cmp_cost, Incumbent};
use crate::error::{Result, ScheduleError};

/// Result of [`min_cost`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatAssignment<T> {
    /// Seat order; same length as the input.
    pub seats: Vec<Option<T>>,
    /// Cost of `seats`.
    pub cost: f64,
}

/// Finds a minimum-cost ordering of one seat list.
///
/// `entities` must have even length; `None` entries are empty seats. The
/// search extends a partial ordering by one team, an aligned pair of
/// empties, or (when the number of empties is odd and the partial ends
/// mid-pair) one empty. Children are explored in ascending cost, ties by
/// lowest entity, so the result is deterministic.
///
/// # Errors
/// [`ScheduleError::OddSeatCount`] if `entities.len()` is odd.
///
/// # Example
/// ```
/// use u_tournament::solver::min_cost;
///
/// // Seat 0 is expensive for team 1.
/// let result = min_cost(&[Some(1), Some(2)], |seats: &[Option<u32>]| {
///     match seats.first() {
///         Some(Some(1)) => 5.0,
///         _ => 0.0,
///     }
/// })
/// .unwrap();
/// assert_eq!(result.seats, vec![Some(2), Some(1)]);
/// ```
pub fn min_cost<T, F>(entities: &[Option<T>], mut cost: F) -> Result<SeatAssignment<T>>
where
    T: Copy + Ord,
    F: FnMut(&[Option<T>]) -> f64,
{
    if entities.len() % 2 != 0 {
        return Err(ScheduleError::OddSeatCount {
            len: entities.len(),
        });
    }

    let mut teams: Vec<T> = entities.iter().flatten().copied().collect();
    teams.sort();
    let nones = entities.len() - teams.len();

    let mut initial: Vec<Option<T>> = teams.iter().copied().map(Some).collect();
    initial.resize(entities.len(), None);
    let initial_cost = cost(&initial);
    let mut best = Incumbent::new(initial, initial_cost);

    let mut partial = Vec::with_capacity(entities.len());
    search(&mut partial, &teams, nones, &mut cost, &mut best);

    Ok(SeatAssignment {
        seats: best.solution,
        cost: best.cost,
    })
}

fn search<T, F>(
    partial: &mut Vec<Option<T>>,
    remaining: &[T],
    nones: usize,
    cost: &mut F,
    best: &mut Incumbent<Vec<Option<T>>>,
) where
    T: Copy + Ord,
    F: FnMut(&[Option<T>]) -> f64,
{
    if remaining.is_empty() {
        let mut complete = partial.clone();
        complete.extend(std::iter::repeat_n(None, nones));
        let c = cost(&complete);
        best.offer(complete, c);
        return;
    }

    // (cost, entity, seats appended, team index in `remaining`)
    let mut children: Vec<(f64, Option<T>, usize, Option<usize>)> = Vec::new();

    for (i, &team) in remaining.iter().enumerate() {
        if i > 0 && remaining[i - 1] == team {
            continue;
        }
        partial.push(Some(team));
        children.push((cost(partial), Some(team), 1, Some(i)));
        partial.pop();
    }

    let even = partial.len() % 2 == 0;
    if nones >= 2 && even {
        partial.extend([None, None]);
        children.push((cost(partial), None, 2, None));
        partial.truncate(partial.len() - 2);
    }
    if nones % 2 == 1 && !even {
        partial.push(None);
        children.push((cost(partial), None, 1, None));
        partial.pop();
    }

    children.sort_by(|a, b| cmp_cost(a.0, b.0).then(a.1.cmp(&b.1)).then(b.2.cmp(&a.2)));

    for (child_cost, _, width, team_idx) in children {
        if child_cost >= best.cost {
            continue;
        }
        match team_idx {
            Some(i) => {
                partial.push(Some(remaining[i]));
                let rest: Vec<T> = remaining[..i]
                    .iter()
                    .chain(&remaining[i + 1..])
                    .copied()
                    .collect();
                search(partial, &rest, nones, cost, best);
                partial.pop();
            }
            None => {
                partial.extend(std::iter::repeat_n(None, width));
                search(partial, remaining, nones - width, cost, best);
                partial.truncate(partial.len() - width);
            }
        }
    }
}
