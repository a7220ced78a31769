//! Timetable (solution) model.
//!
//! The timetable has two row sequences: judging slots (one column per
//! category and room) and table slots (one column per table seat). Both
//! derive `Serialize` so an exporter can render them directly.

use serde::{Deserialize, Serialize};

use super::{TeamId, JUDGING_CATEGORIES};

/// Occupancy of one judging slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgeGrid {
    /// Calibration: team `k` visits category `k` with every judge of that category.
    Calibration([TeamId; JUDGING_CATEGORIES]),
    /// Regular slot: `cells[category][room]`, `None` for an idle room.
    Normal(Vec<Vec<Option<TeamId>>>),
}

impl JudgeGrid {
    /// An all-idle regular grid.
    pub fn empty(rooms: usize) -> Self {
        JudgeGrid::Normal(vec![vec![None; rooms]; JUDGING_CATEGORIES])
    }

    /// Every `(category, room, team)` visit in this grid.
    ///
    /// Calibration visits report room 0.
    pub fn visits(&self) -> Vec<(usize, usize, TeamId)> {
        match self {
            JudgeGrid::Calibration(teams) => teams
                .iter()
                .enumerate()
                .map(|(c, &t)| (c, 0, t))
                .collect(),
            JudgeGrid::Normal(cells) => cells
                .iter()
                .enumerate()
                .flat_map(|(c, row)| {
                    row.iter()
                        .enumerate()
                        .filter_map(move |(r, cell)| cell.map(|t| (c, r, t)))
                })
                .collect(),
        }
    }

    /// Whether no team is present.
    pub fn is_empty(&self) -> bool {
        match self {
            JudgeGrid::Calibration(_) => false,
            JudgeGrid::Normal(cells) => cells.iter().flatten().all(Option::is_none),
        }
    }
}

/// One row of the judging timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSlot {
    /// Session start (ms).
    pub start_ms: i64,
    /// Occupancy. `None` marks an idle (break) slot.
    pub grid: Option<JudgeGrid>,
}

impl JudgeSlot {
    /// Whether this is an idle (break) slot.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.grid.is_none()
    }
}

/// One round of simultaneous table matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRound {
    /// Start time of the first half of the tables (ms).
    pub start_ms: i64,
    /// Start time of the second half when matches are staggered.
    pub stagger_start_ms: Option<i64>,
    /// Index of the competition round these matches belong to.
    pub round: usize,
    /// One entry per seat; seats `2j` and `2j + 1` share table pair `j`.
    pub seats: Vec<Option<TeamId>>,
}

impl TableRound {
    /// Creates a round.
    pub fn new(start_ms: i64, round: usize, seats: Vec<Option<TeamId>>) -> Self {
        Self {
            start_ms,
            stagger_start_ms: None,
            round,
            seats,
        }
    }

    /// Whether every seat is empty.
    pub fn is_idle(&self) -> bool {
        self.seats.iter().all(Option::is_none)
    }

    /// Teams seated in this round, in seat order.
    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.seats.iter().flatten().copied()
    }

    /// Start time of the match on `seat`.
    pub fn seat_start_ms(&self, seat: usize) -> i64 {
        match self.stagger_start_ms {
            Some(late) if seat / 2 >= self.seats.len().div_ceil(4) => late,
            _ => self.start_ms,
        }
    }
}

/// One row of the table timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableSlot {
    /// Full-row separator (lunch, long pause).
    Break,
    /// A row of matches.
    Round(TableRound),
}

impl TableSlot {
    /// Whether this row carries no match: a break or an all-idle round.
    pub fn is_idle(&self) -> bool {
        match self {
            TableSlot::Break => true,
            TableSlot::Round(r) => r.is_idle(),
        }
    }

    /// The round, if this row is one.
    pub fn as_round(&self) -> Option<&TableRound> {
        match self {
            TableSlot::Break => None,
            TableSlot::Round(r) => Some(r),
        }
    }

    pub(crate) fn as_round_mut(&mut self) -> Option<&mut TableRound> {
        match self {
            TableSlot::Break => None,
            TableSlot::Round(r) => Some(r),
        }
    }
}

/// A set of teams sharing a block of judging rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionGroup {
    /// Judging rooms assigned to this group.
    pub rooms: usize,
    /// Member teams, in roster order.
    pub teams: Vec<TeamId>,
}

impl DivisionGroup {
    /// Teams per room.
    pub fn load(&self) -> f64 {
        if self.rooms == 0 {
            f64::INFINITY
        } else {
            self.teams.len() as f64 / self.rooms as f64
        }
    }
}
