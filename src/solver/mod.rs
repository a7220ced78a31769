//! Branch-and-bound seat assignment.
//!
//! Orders teams (and empty seats) into table seats so that a caller-supplied
//! cost is minimized. Seats `2j` and `2j + 1` form table pair `j`; empty
//! seats are kept in aligned pairs, and a single empty seat next to a team
//! (an orphaned bye) appears only when the number of empties is odd.
//!
//! # Solvers
//!
//! | Solver | Scope | Termination |
//! |--------|-------|-------------|
//! | [`min_cost`] | One seat list | Proven optimal |
//! | [`assign_bulk`] | Many seat lists at once | Target, deadline or exhaustion |
//!
//! # Cost Contract
//!
//! Costs are evaluated on *partial* arrangements and must be non-decreasing
//! as seats are appended. The partial cost is the lower bound used for
//! pruning; a cost that can decrease makes the search unsound.
//!
//! # Reference
//! Land & Doig (1960), "An Automatic Method of Solving Discrete Programming Problems"

mod bulk;
mod min_cost;

pub use bulk::{assign_bulk, BulkAssignment, SearchOutcome};
pub use min_cost::{min_cost, SeatAssignment};

use std::cmp::Ordering;

/// Best-so-far solution threaded through a search.
#[derive(Debug, Clone)]
pub(crate) struct Incumbent<S> {
    pub solution: S,
    pub cost: f64,
}

impl<S> Incumbent<S> {
    pub fn new(solution: S, cost: f64) -> Self {
        Self { solution, cost }
    }

    /// Installs `solution` if it is strictly cheaper. Returns whether it was.
    pub fn offer(&mut self, solution: S, cost: f64) -> bool {
        if cost < self.cost {
            self.solution = solution;
            self.cost = cost;
            true
        } else {
            false
        }
    }
}

#[inline]
pub(crate) fn cmp_cost(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
