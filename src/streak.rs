//! Streak computation over a habit's completion history.
//!
//! The engine is a pure fold: records are sorted by date and each completed
//! record either continues the running streak, resets it to one, or is
//! skipped as a duplicate of the current anchor. Cadence is measured in whole
//! calendar days, so the time-of-day on a record never affects the outcome.

use crate::types::{Periodicity, Task};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Minimal view of a task consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    pub date: NaiveDateTime,
    pub completed: bool,
}

impl CompletionRecord {
    pub fn new(date: NaiveDateTime, completed: bool) -> Self {
        Self { date, completed }
    }

    /// A completed record on the given date.
    pub fn completed(date: NaiveDateTime) -> Self {
        Self::new(date, true)
    }
}

impl From<&Task> for CompletionRecord {
    fn from(task: &Task) -> Self {
        Self::new(task.date, task.completed)
    }
}

/// Current and best-ever streak lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResult {
    /// Length of the run ending at the last counted completion
    pub current: u32,
    /// Longest run observed over the whole history
    pub max: u32,
}

/// A named habit history for cross-habit comparison.
#[derive(Debug, Clone)]
pub struct HabitHistory {
    pub name: String,
    pub records: Vec<CompletionRecord>,
    pub periodicity: Periodicity,
}

/// Winner of [`longest_streak`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestStreak {
    pub name: Option<String>,
    pub current: u32,
}

/// How a completed record relates to the current anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Reset,
    Skip,
}

fn classify(periodicity: Periodicity, last: NaiveDateTime, next: NaiveDateTime) -> Step {
    let delta = (next.date() - last.date()).num_days();

    match periodicity {
        Periodicity::Daily => match delta {
            1 => Step::Continue,
            d if d > 1 => Step::Reset,
            _ => Step::Skip,
        },
        Periodicity::Weekly => match delta {
            7 => Step::Continue,
            d if d > 7 => Step::Reset,
            _ => Step::Skip,
        },
        Periodicity::Monthly => {
            if next.year() == last.year() && next.month() == last.month() {
                return Step::Skip;
            }
            match delta {
                28..=31 => Step::Continue,
                d if d > 31 => Step::Reset,
                // Different month but under 28 days apart
                _ => Step::Skip,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FoldState {
    anchor: Option<NaiveDateTime>,
    current: u32,
    max: u32,
}

impl FoldState {
    fn advance(self, record: &CompletionRecord, periodicity: Periodicity) -> Self {
        if !record.completed {
            return self;
        }

        let Some(anchor) = self.anchor else {
            return Self {
                anchor: Some(record.date),
                current: 1,
                max: 1,
            };
        };

        let current = match classify(periodicity, anchor, record.date) {
            Step::Continue => self.current + 1,
            Step::Reset => 1,
            Step::Skip => return self,
        };

        Self {
            anchor: Some(record.date),
            current,
            max: self.max.max(current),
        }
    }
}

/// Compute the current and max streak for a completion history.
///
/// Records may arrive in any order and may contain duplicates; incomplete
/// records are ignored.
pub fn compute_streak(records: &[CompletionRecord], periodicity: Periodicity) -> StreakResult {
    let mut sorted: Vec<&CompletionRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let state = sorted
        .into_iter()
        .fold(FoldState::default(), |state, record| state.advance(record, periodicity));

    StreakResult {
        current: state.current,
        max: state.max,
    }
}

/// Find the habit with the greatest current streak.
///
/// Ties go to the habit that appears first.
pub fn longest_streak(habits: &[HabitHistory]) -> LongestStreak {
    let mut best: Option<(&str, u32)> = None;

    for habit in habits {
        let current = compute_streak(&habit.records, habit.periodicity).current;
        match best {
            Some((_, top)) if current <= top => {}
            _ => best = Some((habit.name.as_str(), current)),
        }
    }

    best.map(|(name, current)| LongestStreak {
        name: Some(name.to_string()),
        current,
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn completed_on(dates: &[NaiveDateTime]) -> Vec<CompletionRecord> {
        dates.iter().copied().map(CompletionRecord::completed).collect()
    }

    fn offsets(base: NaiveDateTime, days: &[i64]) -> Vec<CompletionRecord> {
        let dates: Vec<_> = days.iter().map(|d| base + Duration::days(*d)).collect();
        completed_on(&dates)
    }

    fn streak(current: u32, max: u32) -> StreakResult {
        StreakResult { current, max }
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(compute_streak(&[], Periodicity::Daily), streak(0, 0));
    }

    #[test]
    fn test_all_incomplete() {
        let records: Vec<_> = (0..4)
            .map(|i| CompletionRecord::new(day(2025, 6, 1) + Duration::days(i), false))
            .collect();
        for p in [Periodicity::Daily, Periodicity::Weekly, Periodicity::Monthly] {
            assert_eq!(compute_streak(&records, p), streak(0, 0));
        }
    }

    #[test]
    fn test_single_completion() {
        let records = completed_on(&[day(2025, 6, 1)]);
        for p in [Periodicity::Daily, Periodicity::Weekly, Periodicity::Monthly] {
            assert_eq!(compute_streak(&records, p), streak(1, 1));
        }
    }

    #[test]
    fn test_daily_perfect() {
        let records = offsets(day(2025, 6, 1), &[0, 1, 2, 3, 4]);
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(5, 5));
    }

    #[test]
    fn test_daily_with_gap() {
        let records = offsets(day(2025, 6, 1), &[0, 1, 3]);
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(1, 2));
    }

    #[test]
    fn test_daily_same_day_is_skipped() {
        let base = day(2025, 6, 1);
        let records = vec![
            CompletionRecord::completed(base),
            CompletionRecord::completed(base + Duration::hours(9)),
            CompletionRecord::completed(base + Duration::days(1)),
        ];
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(2, 2));
    }

    #[test]
    fn test_daily_ignores_time_of_day() {
        // 23:59 followed by 00:01 the next morning is one calendar day apart
        let late = day(2025, 6, 1) + Duration::hours(23) + Duration::minutes(59);
        let early = day(2025, 6, 2) + Duration::minutes(1);
        let records = completed_on(&[late, early]);
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(2, 2));

        // 00:01 to 23:59 two days later is a gap, despite being under 72h
        let start = day(2025, 6, 1) + Duration::minutes(1);
        let end = day(2025, 6, 3) + Duration::hours(23);
        let records = completed_on(&[start, end]);
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(1, 1));
    }

    #[test]
    fn test_incomplete_records_are_ignored() {
        let base = day(2025, 6, 1);
        let records = vec![
            CompletionRecord::completed(base),
            CompletionRecord::new(base + Duration::days(1), false),
            CompletionRecord::completed(base + Duration::days(2)),
        ];
        // The missing day still resets the run; the pending task is invisible
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(1, 1));

        let records = vec![
            CompletionRecord::completed(base),
            CompletionRecord::new(base + Duration::days(1), false),
            CompletionRecord::completed(base + Duration::days(1)),
        ];
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(2, 2));
    }

    #[test]
    fn test_weekly_perfect() {
        let records = offsets(day(2025, 6, 1), &[0, 7, 14]);
        assert_eq!(compute_streak(&records, Periodicity::Weekly), streak(3, 3));
    }

    #[test]
    fn test_weekly_with_late_start() {
        let records = offsets(day(2025, 6, 1), &[0, 8, 15]);
        assert_eq!(compute_streak(&records, Periodicity::Weekly), streak(2, 2));
    }

    #[test]
    fn test_weekly_partial() {
        let records = offsets(day(2025, 6, 1), &[0, 7, 21]);
        assert_eq!(compute_streak(&records, Periodicity::Weekly), streak(1, 2));
    }

    #[test]
    fn test_weekly_too_soon_keeps_anchor() {
        // Day 3 is skipped, so day 7 is still measured against day 0
        let records = offsets(day(2025, 6, 1), &[0, 3, 7]);
        assert_eq!(compute_streak(&records, Periodicity::Weekly), streak(2, 2));

        // Day 10 is 7 after the skipped day 3 but 10 after the anchor
        let records = offsets(day(2025, 6, 1), &[0, 3, 10]);
        assert_eq!(compute_streak(&records, Periodicity::Weekly), streak(1, 1));
    }

    #[test]
    fn test_monthly_perfect() {
        let records = completed_on(&[day(2025, 1, 1), day(2025, 2, 1), day(2025, 3, 1)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(3, 3));
    }

    #[test]
    fn test_monthly_with_gap() {
        let records = completed_on(&[day(2025, 1, 1), day(2025, 2, 1), day(2025, 4, 1)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(1, 2));
    }

    #[test]
    fn test_monthly_same_month_is_skipped() {
        let records = completed_on(&[day(2025, 1, 1), day(2025, 1, 30), day(2025, 2, 1)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(2, 2));
    }

    #[test]
    fn test_monthly_next_month_too_soon_is_skipped() {
        // Jan 31 -> Feb 1 changes month but is only one day apart. Feb 1 is
        // skipped, so Mar 4 is measured from Jan 31 (32 days) and resets.
        let records = completed_on(&[day(2025, 1, 31), day(2025, 2, 1), day(2025, 3, 4)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(1, 1));
    }

    #[test]
    fn test_monthly_boundaries() {
        // 28 days (Feb 1 -> Mar 1, 2025) continues
        let records = completed_on(&[day(2025, 2, 1), day(2025, 3, 1)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(2, 2));

        // 31 days continues
        let records = completed_on(&[day(2025, 1, 1), day(2025, 2, 1)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(2, 2));

        // 32 days resets
        let records = completed_on(&[day(2025, 1, 1), day(2025, 2, 2)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(1, 1));
    }

    #[test]
    fn test_monthly_across_year_boundary() {
        let records = completed_on(&[day(2024, 12, 1), day(2025, 1, 1), day(2025, 2, 1)]);
        assert_eq!(compute_streak(&records, Periodicity::Monthly), streak(3, 3));
    }

    #[test]
    fn test_unsorted_input() {
        let mut records = offsets(day(2025, 6, 1), &[0, 1, 2, 3, 4]);
        records.reverse();
        records.swap(1, 3);
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(5, 5));
    }

    #[test]
    fn test_max_survives_later_reset() {
        let records = offsets(day(2025, 6, 1), &[0, 1, 2, 3, 10, 11]);
        assert_eq!(compute_streak(&records, Periodicity::Daily), streak(2, 4));
    }

    #[test]
    fn test_longest_streak_empty() {
        assert_eq!(longest_streak(&[]), LongestStreak::default());
        assert_eq!(longest_streak(&[]).name, None);
    }

    #[test]
    fn test_longest_streak_daily_beats_weekly() {
        let base = day(2025, 6, 1);
        let habits = vec![
            HabitHistory {
                name: "Habit1".to_string(),
                records: offsets(base, &[0, 1, 2]),
                periodicity: Periodicity::Daily,
            },
            HabitHistory {
                name: "Habit2".to_string(),
                records: offsets(base, &[0, 7]),
                periodicity: Periodicity::Weekly,
            },
        ];

        let winner = longest_streak(&habits);
        assert_eq!(winner.name.as_deref(), Some("Habit1"));
        assert_eq!(winner.current, 3);
    }

    #[test]
    fn test_longest_streak_uses_current_not_max() {
        let base = day(2025, 6, 1);
        let habits = vec![
            HabitHistory {
                name: "Lapsed".to_string(),
                // max 5, current 1
                records: offsets(base, &[0, 1, 2, 3, 4, 10]),
                periodicity: Periodicity::Daily,
            },
            HabitHistory {
                name: "Steady".to_string(),
                records: offsets(base, &[0, 7]),
                periodicity: Periodicity::Weekly,
            },
        ];

        let winner = longest_streak(&habits);
        assert_eq!(winner.name.as_deref(), Some("Steady"));
        assert_eq!(winner.current, 2);
    }

    #[test]
    fn test_longest_streak_tie_goes_to_first() {
        let base = day(2025, 6, 1);
        let habits = vec![
            HabitHistory {
                name: "First".to_string(),
                records: offsets(base, &[0, 1]),
                periodicity: Periodicity::Daily,
            },
            HabitHistory {
                name: "Second".to_string(),
                records: offsets(base, &[0, 7]),
                periodicity: Periodicity::Weekly,
            },
        ];

        assert_eq!(longest_streak(&habits).name.as_deref(), Some("First"));
    }

    #[test]
    fn test_longest_streak_all_zero_returns_first() {
        let habits = vec![
            HabitHistory {
                name: "Untouched".to_string(),
                records: vec![],
                periodicity: Periodicity::Daily,
            },
            HabitHistory {
                name: "AlsoUntouched".to_string(),
                records: vec![],
                periodicity: Periodicity::Monthly,
            },
        ];

        let winner = longest_streak(&habits);
        assert_eq!(winner.name.as_deref(), Some("Untouched"));
        assert_eq!(winner.current, 0);
    }
}
