//! Pacing between judging and the morning table rounds.
//!
//! In the morning every team alternates between a judging room and the
//! tables, so the tables should take teams at the rate the judges release
//! them:
//!
//! ```text
//! rate = 3 * rooms * match * (1 + 1 / table_cap) / (session + break / judge_cap)
//! ```
//!
//! A cap term only applies when the cap is smaller than the roster. The
//! judging session length can then be nudged up by at most a minute so that
//! one judge cycle lines up with a whole number of match rows.

use super::ceil_div;
use crate::config::TournamentConfig;
use crate::models::{JUDGING_CATEGORIES, MINUTE_MS};

/// Rounding step for an aligned session length.
const ALIGN_STEP_MS: i64 = MINUTE_MS / 2;

/// Teams per morning row, paced on judging throughput.
///
/// A configured run rate wins. The paced rate is rounded to the nearest even
/// count, is at least 2 and never exceeds the seats.
pub fn morning_run_rate(config: &TournamentConfig, num_teams: usize) -> usize {
    let tables = &config.tables;
    if let Some(rate) = tables.run_rate {
        return rate;
    }
    let judging = &config.judging;
    let Some(&match_ms) = tables.round_durations_ms.first() else {
        return tables.seats();
    };

    let table_share = match tables.consecutive {
        Some(cap) if cap > 0 && cap < num_teams => 1.0 + 1.0 / cap as f64,
        _ => 1.0,
    };
    let break_share = match judging.consecutive {
        Some(cycle) if cycle > 0 && cycle < num_teams => judging.break_ms as f64 / cycle as f64,
        _ => 0.0,
    };
    let session = judging.duration_ms as f64 + break_share;
    if session <= 0.0 {
        return tables.seats();
    }

    let rate =
        (JUDGING_CATEGORIES * judging.rooms) as f64 * match_ms as f64 * table_share / session;
    let even = ((rate / 2.0).round() as usize * 2).max(2);
    even.min(tables.seats().max(2))
}

/// Judging session length aligned with the morning table pace.
///
/// Over one judge cycle of `L` sessions, the teams not in a judging room
/// need `ceil((3 * rooms * L - teams) / rate)` match rows, plus one team
/// session and travel both ways. Spread over `L - 1` sessions and rounded to
/// half a minute, that length replaces the configured one when it is longer
/// by at most a minute. Without a break cadence of at least 2 the
/// configured length is kept.
pub fn align_judge_duration(config: &TournamentConfig, num_teams: usize) -> i64 {
    let judging = &config.judging;
    let Some(cycle) = judging.consecutive.filter(|&l| l >= 2) else {
        return judging.duration_ms;
    };
    let Some(&match_ms) = config.tables.round_durations_ms.first() else {
        return judging.duration_ms;
    };

    let rate = morning_run_rate(config, num_teams).max(1) as i64;
    let seats_per_cycle = (JUDGING_CATEGORIES * judging.rooms * cycle) as i64;
    let rows = ceil_div(seats_per_cycle - num_teams as i64, rate);
    let required = rows * match_ms + judging.team_duration_ms + 2 * config.travel_ms;
    let per_session = required as f64 / (cycle - 1) as f64;
    let aligned = (per_session / ALIGN_STEP_MS as f64).round() as i64 * ALIGN_STEP_MS;

    let stretch = aligned - judging.duration_ms;
    if stretch > 0 && stretch <= MINUTE_MS {
        aligned
    } else {
        judging.duration_ms
    }
}
