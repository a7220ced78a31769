//! Input validation for tournaments.
//!
//! Checks structural integrity of the configuration and the roster before
//! scheduling. Detects:
//! - Empty or duplicate roster entries
//! - Zero room, pair, round or cadence counts
//! - Non-positive durations and inverted windows
//! - Ceremonies that leave no room for the travel buffer
//! - Rosters too small to fill every judging room
//!
//! All problems are collected; validation never stops at the first one.

use std::collections::HashSet;
use std::fmt;

use crate::config::TournamentConfig;
use crate::models::{TeamEntry, DAY_MS, JUDGING_CATEGORIES};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The roster has no teams.
    EmptyRoster,
    /// Two teams share the same number.
    DuplicateId,
    /// A count that must be positive is zero.
    ZeroCount,
    /// A duration or window length is not positive.
    NonPositiveDuration,
    /// Team-visible judging is longer than the judge-side session.
    DurationMismatch,
    /// Fewer teams than judging seats in one slot.
    TooFewTeams,
    /// A window ends before it starts.
    InvertedWindow,
    /// The ceremonies are closer together than the travel buffer.
    CeremonyOverlap,
    /// The travel buffer cannot fit in the event day.
    TravelTooLong,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates the roster-independent part of a configuration.
///
/// Checks:
/// 1. Room, pair and round counts are positive
/// 2. Every duration is positive (breaks and travel may be zero)
/// 3. Team-side judging fits inside the judge-side session
/// 4. Lunch and ceremony windows are not inverted
/// 5. Ceremonies are at least the travel buffer apart
/// 6. The travel buffer is shorter than the day
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_config(config: &TournamentConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let judging = &config.judging;
    let tables = &config.tables;

    let counts = [
        ("judging rooms", judging.rooms),
        ("table pairs", tables.pairs),
        ("table rounds", tables.rounds()),
        ("assignment passes", tables.assignment_passes),
    ];
    for (what, count) in counts {
        if count == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCount,
                format!("Number of {what} must be positive"),
            ));
        }
    }
    if judging.consecutive == Some(0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroCount,
            "Judge break cadence must be positive",
        ));
    }
    if tables.consecutive == Some(0) || tables.run_rate == Some(0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroCount,
            "Table cadence and run rate must be positive",
        ));
    }

    let mut durations = vec![
        ("judging session", judging.duration_ms),
        ("team judging session", judging.team_duration_ms),
        ("lunch", config.lunch.duration_ms),
    ];
    durations.extend(
        tables
            .round_durations_ms
            .iter()
            .map(|&d| ("table match", d)),
    );
    for (what, duration) in durations {
        if duration <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveDuration,
                format!("Duration of {what} must be positive, got {duration} ms"),
            ));
        }
    }
    if judging.break_ms < 0 || config.travel_ms < 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveDuration,
            "Break and travel times must not be negative",
        ));
    }

    if judging.team_duration_ms > judging.duration_ms {
        errors.push(ValidationError::new(
            ValidationErrorKind::DurationMismatch,
            format!(
                "Team judging time ({} ms) exceeds judge session ({} ms)",
                judging.team_duration_ms, judging.duration_ms
            ),
        ));
    }

    if config.lunch.latest_ms < config.lunch.earliest_ms {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvertedWindow,
            "Latest lunch start is before the earliest",
        ));
    }
    for (what, window) in [
        ("coaches' meeting", config.coach_meeting),
        ("opening ceremony", config.opening),
    ] {
        if window.end_ms < window.start_ms {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedWindow,
                format!("The {what} ends before it starts"),
            ));
        }
    }

    let (first, second) = if config.coach_meeting.start_ms <= config.opening.start_ms {
        (config.coach_meeting, config.opening)
    } else {
        (config.opening, config.coach_meeting)
    };
    if second.start_ms - first.end_ms < config.travel_ms {
        errors.push(ValidationError::new(
            ValidationErrorKind::CeremonyOverlap,
            "Coaches' meeting and opening ceremony must be a travel buffer apart",
        ));
    }

    if config.travel_ms >= DAY_MS {
        errors.push(ValidationError::new(
            ValidationErrorKind::TravelTooLong,
            format!("Travel time of {} ms is longer than the day", config.travel_ms),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a roster against a configuration.
///
/// Checks:
/// 1. The roster is not empty
/// 2. No duplicate team numbers
/// 3. At least one team per category and room (`teams >= 3 * rooms`)
pub fn validate_roster(config: &TournamentConfig, roster: &[TeamEntry]) -> ValidationResult {
    let mut errors = Vec::new();

    if roster.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "Roster has no teams",
        ));
    }

    let mut numbers = HashSet::new();
    for entry in roster {
        if !numbers.insert(entry.number) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate team number: {}", entry.number),
            ));
        }
    }

    let needed = JUDGING_CATEGORIES * config.judging.rooms;
    if !roster.is_empty() && roster.len() < needed {
        errors.push(ValidationError::new(
            ValidationErrorKind::TooFewTeams,
            format!(
                "{} teams cannot fill {} judging rooms (need at least {needed})",
                roster.len(),
                config.judging.rooms
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{clock, minutes, TimeWindow};

    fn roster(n: u32) -> Vec<TeamEntry> {
        (1..=n).map(|i| TeamEntry::new(i, format!("Team {i}"))).collect()
    }

    #[test]
    fn test_valid_input() {
        let config = TournamentConfig::default();
        assert!(validate_config(&config).is_ok());
        assert!(validate_roster(&config, &roster(24)).is_ok());
    }

    #[test]
    fn test_empty_roster() {
        let errors = validate_roster(&TournamentConfig::default(), &[]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyRoster));
    }

    #[test]
    fn test_duplicate_team_number() {
        let mut teams = roster(8);
        teams.push(TeamEntry::new(3, "Impostor"));
        let errors = validate_roster(&TournamentConfig::default(), &teams).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains('3')));
    }

    #[test]
    fn test_too_few_teams() {
        // Two rooms need six teams.
        let errors = validate_roster(&TournamentConfig::default(), &roster(5)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::TooFewTeams));
        assert!(validate_roster(&TournamentConfig::default(), &roster(6)).is_ok());
    }

    #[test]
    fn test_team_duration_exceeds_session() {
        let config =
            TournamentConfig::default().with_judging_durations(minutes(10.0), minutes(15.0));
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DurationMismatch));
    }

    #[test]
    fn test_non_positive_round() {
        let config = TournamentConfig::default().with_rounds(vec![minutes(5.0), 0]);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonPositiveDuration));
    }

    #[test]
    fn test_inverted_lunch() {
        let config =
            TournamentConfig::default().with_lunch(clock(13, 0), clock(12, 0), minutes(30.0));
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvertedWindow));
    }

    #[test]
    fn test_ceremonies_too_close() {
        let config = TournamentConfig::default().with_ceremonies(
            TimeWindow::new(clock(8, 0), clock(8, 30)),
            TimeWindow::new(clock(8, 35), clock(9, 0)),
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CeremonyOverlap));
    }

    #[test]
    fn test_travel_longer_than_day() {
        let config = TournamentConfig::default().with_travel(DAY_MS);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::TravelTooLong));
    }

    #[test]
    fn test_multiple_errors() {
        let config = TournamentConfig::default()
            .with_judging_rooms(0)
            .with_rounds(vec![]);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
