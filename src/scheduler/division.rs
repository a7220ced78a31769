//! Division partitioning: splits the roster into judging-room groups.
//!
//! # Algorithm
//!
//! 1. `capacity = max(12, ceil(teams / rooms))`
//! 2. Each division needs `ceil(|division| / capacity)` rooms
//! 3. If the total fits, surplus rooms go one at a time to the group with
//!    the highest teams-per-room load
//! 4. Otherwise divisions with the least unused capacity in their last room
//!    are kept pure while the remaining teams still fit the remaining rooms;
//!    the rest are concatenated and spread evenly over the remaining rooms
//!    one room per chunk, and consecutive chunks holding a single division
//!    are merged back into one group
//!
//! Groups are returned in order of the sorted division labels they contain.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::models::{DivisionGroup, Team, TeamId};

/// Smallest per-room capacity, regardless of roster size.
pub const MIN_ROOM_CAPACITY: usize = 12;

/// Partitions teams into judging-room groups.
///
/// Every team lands in exactly one group and the room counts sum to `rooms`.
/// With no division labels at all, one group receives every room.
pub fn partition_divisions(teams: &[Team], rooms: usize) -> Vec<DivisionGroup> {
    let capacity = MIN_ROOM_CAPACITY.max(teams.len().div_ceil(rooms.max(1)));

    let mut divisions: BTreeMap<Option<&str>, Vec<TeamId>> = BTreeMap::new();
    for team in teams {
        divisions
            .entry(team.division.as_deref())
            .or_default()
            .push(team.id);
    }

    if divisions.keys().all(Option::is_none) {
        return vec![DivisionGroup {
            rooms,
            teams: teams.iter().map(|t| t.id).collect(),
        }];
    }

    let divisions: Vec<(Option<&str>, Vec<TeamId>)> = divisions.into_iter().collect();
    let required: usize = divisions
        .iter()
        .map(|(_, members)| members.len().div_ceil(capacity))
        .sum();

    let mut groups: Vec<(BTreeSet<&str>, DivisionGroup)> = if required <= rooms {
        let mut groups: Vec<_> = divisions
            .iter()
            .map(|(label, members)| {
                (
                    label_set(*label),
                    DivisionGroup {
                        rooms: members.len().div_ceil(capacity),
                        teams: members.clone(),
                    },
                )
            })
            .collect();
        give_rooms(&mut groups, rooms - required);
        groups
    } else {
        pack_overflowing(&divisions, rooms, capacity)
    };

    // Dissolve empty groups into the most loaded one.
    let mut spare = 0;
    groups.retain(|(_, g)| {
        if g.teams.is_empty() {
            spare += g.rooms;
            false
        } else {
            true
        }
    });
    give_rooms(&mut groups, spare);

    groups.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(
        groups = groups.len(),
        capacity,
        rooms = ?groups.iter().map(|(_, g)| g.rooms).collect::<Vec<_>>(),
        "divisions partitioned"
    );
    groups.into_iter().map(|(_, g)| g).collect()
}

/// Packing when the divisions need more rooms than exist.
fn pack_overflowing<'a>(
    divisions: &[(Option<&'a str>, Vec<TeamId>)],
    rooms: usize,
    capacity: usize,
) -> Vec<(BTreeSet<&'a str>, DivisionGroup)> {
    let mut by_waste: Vec<usize> = (0..divisions.len()).collect();
    by_waste.sort_by_key(|&i| {
        let len = divisions[i].1.len();
        (len.div_ceil(capacity) * capacity - len, divisions[i].0)
    });

    let mut groups = Vec::new();
    let mut pure = vec![false; divisions.len()];
    let mut teams_left: usize = divisions.iter().map(|(_, m)| m.len()).sum();
    let mut rooms_left = rooms;

    for i in by_waste {
        let (label, members) = &divisions[i];
        let req = members.len().div_ceil(capacity);
        if req <= rooms_left && teams_left - members.len() <= (rooms_left - req) * capacity {
            pure[i] = true;
            teams_left -= members.len();
            rooms_left -= req;
            groups.push((
                label_set(*label),
                DivisionGroup {
                    rooms: req,
                    teams: members.clone(),
                },
            ));
        }
    }

    // Mixed teams keep label order so a division stays contiguous.
    let mixed: Vec<(Option<&str>, TeamId)> = divisions
        .iter()
        .zip(&pure)
        .filter(|(_, is_pure)| !**is_pure)
        .flat_map(|((label, members), _)| members.iter().map(move |&t| (*label, t)))
        .collect();

    if rooms_left == 0 {
        return groups;
    }

    let base = mixed.len() / rooms_left;
    let extra = mixed.len() % rooms_left;
    let mut start = 0;
    for chunk_idx in 0..rooms_left {
        let size = base + usize::from(chunk_idx < extra);
        let chunk = &mixed[start..start + size];
        start += size;

        let labels: BTreeSet<Option<&str>> = chunk.iter().map(|(l, _)| *l).collect();
        let set: BTreeSet<&str> = labels.iter().map(|l| l.unwrap_or("")).collect();
        let teams: Vec<TeamId> = chunk.iter().map(|(_, t)| *t).collect();

        let single = labels.len() == 1;
        match groups.last_mut() {
            Some((prev_set, prev)) if single && chunk_idx > 0 && *prev_set == set => {
                prev.rooms += 1;
                prev.teams.extend(teams);
            }
            _ => groups.push((set, DivisionGroup { rooms: 1, teams })),
        }
    }
    groups
}

fn label_set(label: Option<&str>) -> BTreeSet<&str> {
    BTreeSet::from([label.unwrap_or("")])
}

/// Hands out rooms one at a time to the group with the highest load.
fn give_rooms<K>(groups: &mut [(K, DivisionGroup)], rooms: usize) {
    for _ in 0..rooms {
        let mut target: Option<usize> = None;
        for (i, (_, g)) in groups.iter().enumerate() {
            if target.is_none_or(|t| g.load() > groups[t].1.load()) {
                target = Some(i);
            }
        }
        if let Some(t) = target {
            groups[t].1.rooms += 1;
        }
    }
}
