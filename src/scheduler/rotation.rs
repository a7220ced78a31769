//! Judging rotation: which team visits which category in which slot.
//!
//! # Layout
//!
//! Each group with `g` teams and `r` rooms fills, per category, three
//! blocks of `r * K` room visits. `K` is shared by every group so block
//! boundaries line up in time:
//!
//! ```text
//! K = max(min_gap_slots, max over groups ceil(ceil(g / 3) / r))
//! min_gap_slots = ceil((team_duration + travel) / judge_duration)
//! ```
//!
//! Team rank `k = 3q + ρ` takes position `q` of block `b` in the category
//! whose residue `(c + b * dir) mod 3` equals `ρ`. Every team therefore
//! visits one category per block, exactly `K` slots apart, and a lower rank
//! never visits later than a higher one.
//!
//! Ranks `>= g` are padding; they leave the `g mod 3` idle room visits at
//! the end of each block.

use tracing::debug;

use super::ceil_div;
use crate::config::TournamentConfig;
use crate::models::{DivisionGroup, JudgeGrid, TeamId, JUDGING_CATEGORIES};

/// Judging grids before times are assigned, plus the rotation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    /// One grid per judging slot. A calibration grid, if any, comes first.
    pub grids: Vec<JudgeGrid>,
    /// Teams by rotation rank.
    pub order: Vec<TeamId>,
    /// Slots between a team's consecutive visits.
    pub block_slots: usize,
}

impl RotationPlan {
    /// Whether the first slot is a calibration slot.
    pub fn has_calibration(&self) -> bool {
        matches!(self.grids.first(), Some(JudgeGrid::Calibration(_)))
    }

    /// Slot index of each visit of `team`, in visit order.
    pub fn visit_slots(&self, team: TeamId) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .grids
            .iter()
            .enumerate()
            .flat_map(|(i, grid)| {
                grid.visits()
                    .into_iter()
                    .filter(move |&(_, _, t)| t == team)
                    .map(move |_| i)
            })
            .collect();
        slots.sort_unstable();
        slots
    }
}

/// Builds the judging rotation for the given groups.
///
/// `calibration` is honored only for a single group; callers pass `false`
/// when divisions are in use.
pub fn plan_rotation(
    groups: &[DivisionGroup],
    config: &TournamentConfig,
    calibration: bool,
) -> RotationPlan {
    let judging = &config.judging;
    let rooms: usize = groups.iter().map(|g| g.rooms).sum();
    let calibration = calibration && groups.len() == 1;

    let min_gap_slots = usize::try_from(ceil_div(
        judging.team_duration_ms + config.travel_ms,
        judging.duration_ms,
    ))
    .unwrap_or(1)
    .max(1);
    let block_slots = groups
        .iter()
        .map(|g| g.teams.len().div_ceil(JUDGING_CATEGORIES).div_ceil(g.rooms.max(1)))
        .fold(min_gap_slots, usize::max);

    let total_slots = JUDGING_CATEGORIES * block_slots + usize::from(calibration);
    let mut cells = vec![vec![vec![None; rooms]; JUDGING_CATEGORIES]; total_slots];
    let mut calib = [TeamId(0); JUDGING_CATEGORIES];
    // (visit slots, group, rank) per team, for the rotation order.
    let mut ranked: Vec<([usize; JUDGING_CATEGORIES], usize, usize, TeamId)> = Vec::new();

    let mut room_offset = 0;
    for (gi, group) in groups.iter().enumerate() {
        let g = group.teams.len();
        let r = group.rooms.max(1);
        let block = r * block_slots;
        let dir: isize = if (-(g as isize)).rem_euclid(3) == 1 { 1 } else { -1 };
        let mut visits = vec![[0usize; JUDGING_CATEGORIES]; g];

        for cat in 0..JUDGING_CATEGORIES {
            for b in 0..JUDGING_CATEGORIES {
                let rho = (cat as isize + b as isize * dir).rem_euclid(3) as usize;
                for q in 0..block {
                    let k = 3 * q + rho;
                    if k >= g {
                        continue;
                    }
                    let team = group.teams[k];
                    let p = b * block + q;
                    let (slot, room) = if calibration {
                        if p == 0 {
                            calib[cat] = team;
                            visits[k][b] = 0;
                            continue;
                        }
                        (1 + (p - 1) / r, (p - 1) % r)
                    } else {
                        (p / r, room_offset + p % r)
                    };
                    cells[slot][cat][room] = Some(team);
                    visits[k][b] = slot;
                }
            }
        }

        ranked.extend(
            visits
                .into_iter()
                .enumerate()
                .map(|(k, v)| (v, gi, k, group.teams[k])),
        );
        room_offset += group.rooms;
    }

    let mut grids: Vec<JudgeGrid> = cells.into_iter().map(JudgeGrid::Normal).collect();
    if calibration {
        grids[0] = JudgeGrid::Calibration(calib);
    }
    while grids.last().is_some_and(JudgeGrid::is_empty) {
        grids.pop();
    }

    ranked.sort();
    let order: Vec<TeamId> = ranked.into_iter().map(|(_, _, _, t)| t).collect();

    debug!(
        slots = grids.len(),
        block_slots,
        calibration,
        "judging rotation planned"
    );
    RotationPlan {
        grids,
        order,
        block_slots,
    }
}
