//! Pure progress arithmetic over the roadmap and completion documents.
//! No I/O, no clock reads; callers pass dates in.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{week_key, CompletionState, OverallProgress, RoadmapDocument, WeekSummary, WeekTasks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("roadmap has no week entries")]
pub struct EmptyRoadmap;

/// Week number for `today` given week 1 starts on `start`. The week ticks
/// over every 7 full elapsed days; partial days truncate. Never below 1,
/// even when `today` precedes `start`.
pub fn current_week(start: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - start).num_days();
    let week = days.div_euclid(7) + 1;
    week.max(1) as u32
}

/// Resolved task list for `week`: the week's own entry when present,
/// otherwise the maintenance list. Total — a missing week is not an error.
pub fn tasks_for_week(doc: &RoadmapDocument, week: u32) -> WeekTasks {
    match doc.weekly_tasks.get(&week_key(week)) {
        Some(tasks) => WeekTasks::Explicit(tasks.clone()),
        None => WeekTasks::Fallback(doc.maintenance_tasks.clone()),
    }
}

/// Per-week summary. `done` is the raw count of recorded indices, duplicates
/// included; indices are positions in the current task ordering and are not
/// validated against `total`.
pub fn week_summary(doc: &RoadmapDocument, state: &CompletionState, week: u32) -> WeekSummary {
    let tasks = tasks_for_week(doc, week).into_vec();
    let completed_indices = state
        .completed
        .get(&week_key(week))
        .cloned()
        .unwrap_or_default();
    WeekSummary {
        week,
        total: tasks.len(),
        done: completed_indices.len(),
        tasks,
        completed_indices,
    }
}

/// Highest numeric week key in `weekly_tasks`. Non-numeric keys are ignored;
/// a roadmap with no parseable week key is `EmptyRoadmap`.
pub fn total_weeks(doc: &RoadmapDocument) -> Result<u32, EmptyRoadmap> {
    doc.weekly_tasks
        .keys()
        .filter_map(|k| k.parse::<u32>().ok())
        .max()
        .ok_or(EmptyRoadmap)
}

/// Sums `done`/`total` over weeks `1..=total_weeks`. Weeks without an
/// explicit entry contribute the maintenance-list length to `total`, so gap
/// weeks inflate the overall total; that matches what the dashboard has
/// always shown. An empty roadmap degrades to zero/zero.
pub fn overall_progress(doc: &RoadmapDocument, state: &CompletionState) -> OverallProgress {
    let Ok(weeks) = total_weeks(doc) else {
        return OverallProgress { done: 0, total: 0 };
    };
    let mut done = 0;
    let mut total = 0;
    for week in 1..=weeks {
        total += tasks_for_week(doc, week).as_slice().len();
        done += state
            .completed
            .get(&week_key(week))
            .map_or(0, |indices| indices.len());
    }
    OverallProgress { done, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn roadmap(v: serde_json::Value) -> RoadmapDocument {
        serde_json::from_value(v).expect("roadmap json")
    }

    fn completion(v: serde_json::Value) -> CompletionState {
        serde_json::from_value(v).expect("state json")
    }

    #[test]
    fn week_increments_every_seven_full_days() {
        let start = date(2025, 2, 3);
        for offset in 0..7 {
            assert_eq!(current_week(start, start + chrono::Days::new(offset)), 1);
        }
        assert_eq!(current_week(start, start + chrono::Days::new(7)), 2);
        assert_eq!(current_week(start, start + chrono::Days::new(13)), 2);
        assert_eq!(current_week(start, start + chrono::Days::new(14)), 3);
    }

    #[test]
    fn week_clamps_to_one_before_start() {
        let start = date(2025, 2, 3);
        assert_eq!(current_week(start, date(2025, 1, 1)), 1);
        assert_eq!(current_week(start, date(2024, 1, 1)), 1);
    }

    #[test]
    fn week_is_monotone_as_today_advances() {
        let start = date(2025, 2, 3);
        let mut prev = 0;
        for offset in 0..60 {
            let w = current_week(start, start + chrono::Days::new(offset));
            assert!(w >= prev, "week regressed at day {}", offset);
            assert!(w >= 1);
            prev = w;
        }
    }

    #[test]
    fn tasks_fall_back_to_maintenance_for_missing_weeks() {
        let doc = roadmap(json!({
            "weekly_tasks": {"1": ["a", "b"]},
            "maintenance_tasks": ["m"]
        }));
        assert_eq!(
            tasks_for_week(&doc, 1),
            WeekTasks::Explicit(vec!["a".to_string(), "b".to_string()])
        );
        let week2 = tasks_for_week(&doc, 2);
        assert!(week2.is_fallback());
        assert_eq!(week2.as_slice(), ["m".to_string()]);
    }

    #[test]
    fn summary_matches_worked_example() {
        let doc = roadmap(json!({
            "weekly_tasks": {"1": ["a", "b"]},
            "maintenance_tasks": ["m"]
        }));
        let state = completion(json!({
            "start_date": "2025-02-03",
            "completed": {"1": [0]}
        }));

        let s1 = week_summary(&doc, &state, 1);
        assert_eq!(s1.tasks, vec!["a", "b"]);
        assert_eq!(s1.completed_indices, vec![0]);
        assert_eq!(s1.total, 2);
        assert_eq!(s1.done, 1);

        let s2 = week_summary(&doc, &state, 2);
        assert_eq!(s2.tasks, vec!["m"]);
        assert!(s2.completed_indices.is_empty());
        assert_eq!(s2.total, 1);
        assert_eq!(s2.done, 0);
    }

    #[test]
    fn done_counts_duplicate_indices_verbatim() {
        let doc = roadmap(json!({
            "weekly_tasks": {"3": ["a", "b"]},
            "maintenance_tasks": []
        }));
        let state = completion(json!({
            "start_date": "2025-02-03",
            "completed": {"3": [0, 0, 1]}
        }));
        assert_eq!(week_summary(&doc, &state, 3).done, 3);
    }

    #[test]
    fn total_weeks_takes_max_numeric_key() {
        let doc = roadmap(json!({
            "weekly_tasks": {"2": [], "10": ["x"], "notes": ["ignored"]},
            "maintenance_tasks": []
        }));
        assert_eq!(total_weeks(&doc), Ok(10));
    }

    #[test]
    fn total_weeks_errors_on_empty_roadmap() {
        let doc = roadmap(json!({
            "weekly_tasks": {},
            "maintenance_tasks": ["m"]
        }));
        assert_eq!(total_weeks(&doc), Err(EmptyRoadmap));
    }

    #[test]
    fn overall_progress_counts_gap_weeks_at_maintenance_length() {
        let doc = roadmap(json!({
            "weekly_tasks": {"1": ["a", "b"], "3": ["c"]},
            "maintenance_tasks": ["m1", "m2"]
        }));
        let state = completion(json!({
            "start_date": "2025-02-03",
            "completed": {"1": [0], "2": [1]}
        }));
        let overall = overall_progress(&doc, &state);
        // week 1: 2 tasks, week 2 (gap): 2 maintenance, week 3: 1 task
        assert_eq!(overall.total, 5);
        assert_eq!(overall.done, 2);
    }

    #[test]
    fn overall_progress_is_zero_for_empty_roadmap() {
        let doc = roadmap(json!({
            "weekly_tasks": {},
            "maintenance_tasks": ["m"]
        }));
        let state = completion(json!({"start_date": "2025-02-03"}));
        assert_eq!(
            overall_progress(&doc, &state),
            OverallProgress { done: 0, total: 0 }
        );
    }
}
