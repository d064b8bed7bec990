//! The completion log: raw timestamps, at most one effective entry per local day.

use chrono::{DateTime, Local, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use super::calendar::{day_of, parse_timestamp};
use super::types::ToggleAction;
use crate::error::HabitResult;

/// True iff any entry falls on `date`.
pub fn is_completed_on(log: &[String], date: NaiveDate) -> HabitResult<bool> {
    for entry in log {
        if day_of(entry)? == date {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Remove every entry on `at`'s day if one exists, otherwise append `at`.
///
/// Malformed entries abort the toggle with `InvalidDate` before anything is
/// changed, since the day they belong to is unknown.
pub fn toggle(log: &[String], at: DateTime<Local>) -> HabitResult<(Vec<String>, ToggleAction)> {
    let target = at.date_naive();
    let mut kept = Vec::with_capacity(log.len() + 1);
    let mut removed = false;
    for entry in log {
        if day_of(entry)? == target {
            removed = true;
        } else {
            kept.push(entry.clone());
        }
    }

    if removed {
        Ok((kept, ToggleAction::Uncompleted))
    } else {
        kept.push(at.to_rfc3339());
        Ok((kept, ToggleAction::Completed))
    }
}

/// Collapse same-day entries to the earliest one, ordered chronologically.
pub fn dedupe(log: &[String]) -> HabitResult<Vec<String>> {
    let mut earliest: BTreeMap<NaiveDate, (DateTime<Local>, &String)> = BTreeMap::new();
    for entry in log {
        let at = parse_timestamp(entry)?;
        earliest
            .entry(at.date_naive())
            .and_modify(|slot| {
                if at < slot.0 {
                    *slot = (at, entry);
                }
            })
            .or_insert((at, entry));
    }
    Ok(earliest.into_values().map(|(_, raw)| raw.clone()).collect())
}

/// The set of local days with at least one entry.
pub fn completed_days(log: &[String]) -> HabitResult<BTreeSet<NaiveDate>> {
    log.iter().map(|entry| day_of(entry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::calendar::local_noon;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
        local_noon(date(y, m, d)).unwrap()
    }

    #[test]
    fn toggle_appends_then_removes() {
        let (log, action) = toggle(&[], at(2025, 3, 10)).unwrap();
        assert_eq!(action, ToggleAction::Completed);
        assert_eq!(log.len(), 1);
        assert!(is_completed_on(&log, date(2025, 3, 10)).unwrap());

        let (log, action) = toggle(&log, at(2025, 3, 10) + Duration::hours(3)).unwrap();
        assert_eq!(action, ToggleAction::Uncompleted);
        assert!(log.is_empty());
    }

    #[test]
    fn toggle_removes_all_duplicate_entries_of_the_day() {
        let log = vec![
            at(2025, 3, 10).to_rfc3339(),
            (at(2025, 3, 10) + Duration::hours(2)).to_rfc3339(),
            at(2025, 3, 9).to_rfc3339(),
        ];
        let (log, action) = toggle(&log, at(2025, 3, 10)).unwrap();
        assert_eq!(action, ToggleAction::Uncompleted);
        assert_eq!(log, vec![at(2025, 3, 9).to_rfc3339()]);
    }

    #[test]
    fn toggle_rejects_corrupt_log() {
        let log = vec!["garbage".to_string()];
        assert!(toggle(&log, at(2025, 3, 10)).is_err());
    }

    #[test]
    fn dedupe_keeps_earliest_per_day() {
        let early = (at(2025, 3, 10) - Duration::hours(4)).to_rfc3339();
        let late = at(2025, 3, 10).to_rfc3339();
        let other = at(2025, 3, 8).to_rfc3339();
        let deduped = dedupe(&[late, other.clone(), early.clone()]).unwrap();
        assert_eq!(deduped, vec![other, early]);
    }

    #[test]
    fn double_toggle_restores_day_set() {
        let log = vec![at(2025, 3, 8).to_rfc3339(), at(2025, 3, 10).to_rfc3339()];
        for day in [at(2025, 3, 10), at(2025, 3, 11)] {
            let (once, _) = toggle(&log, day).unwrap();
            let (twice, _) = toggle(&once, day + Duration::minutes(5)).unwrap();
            assert_eq!(
                completed_days(&dedupe(&twice).unwrap()).unwrap(),
                completed_days(&dedupe(&log).unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn completed_days_collapses_duplicates() {
        let log = vec![
            at(2025, 3, 10).to_rfc3339(),
            "2025-03-10".to_string(),
            at(2025, 3, 11).to_rfc3339(),
        ];
        let days = completed_days(&log).unwrap();
        assert_eq!(days.len(), 2);
    }
}
