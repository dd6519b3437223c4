use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The persisted weekly roadmap (`tasks.json`): an explicit task list per
/// week plus a maintenance list used as the read fallback for any week
/// without its own entry.
///
/// Week numbers are string-encoded object keys in the file, so they stay
/// strings here; use [`week_key`] when indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapDocument {
    #[serde(default)]
    pub weekly_tasks: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub maintenance_tasks: Vec<String>,
    /// Fields this daemon does not interpret survive a read-modify-write.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted completion record (`state.json`). Only `start_date` and
/// `completed` feed the dashboard read path; the rest is bookkeeping owned
/// by the notifier and carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionState {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub completed: BTreeMap<String, Vec<u32>>,
    #[serde(default)]
    pub seen_issues: Vec<String>,
    #[serde(default)]
    pub notify_index: u32,
    #[serde(default)]
    pub last_update_id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resolved task list for one week. `Fallback` means the maintenance list
/// was substituted because the week has no entry of its own; saving a draft
/// seeded from it creates a new explicit entry rather than editing the
/// shared list.
#[derive(Debug, Clone, PartialEq)]
pub enum WeekTasks {
    Explicit(Vec<String>),
    Fallback(Vec<String>),
}

impl WeekTasks {
    pub fn as_slice(&self) -> &[String] {
        match self {
            WeekTasks::Explicit(t) | WeekTasks::Fallback(t) => t,
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            WeekTasks::Explicit(t) | WeekTasks::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, WeekTasks::Fallback(_))
    }
}

/// Derived per-week summary, serialized for the dashboard client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub week: u32,
    pub tasks: Vec<String>,
    pub completed_indices: Vec<u32>,
    pub total: usize,
    pub done: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallProgress {
    pub done: usize,
    pub total: usize,
}

/// Object key for a week number in `weekly_tasks` / `completed`.
pub fn week_key(week: u32) -> String {
    week.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roadmap_round_trip_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "weekly_tasks": {"1": ["a", "b"]},
            "maintenance_tasks": ["m"],
            "theme": "dark"
        });
        let doc: RoadmapDocument = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(doc.weekly_tasks["1"], vec!["a", "b"]);
        let back = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(back, raw);
    }

    #[test]
    fn completion_state_defaults_bookkeeping() {
        let raw = serde_json::json!({
            "start_date": "2025-02-03",
            "completed": {"3": [0, 0, 1]}
        });
        let state: CompletionState = serde_json::from_value(raw).expect("parse");
        assert_eq!(
            state.start_date,
            NaiveDate::from_ymd_opt(2025, 2, 3).expect("date")
        );
        assert_eq!(state.completed["3"], vec![0, 0, 1]);
        assert!(state.seen_issues.is_empty());
        assert_eq!(state.notify_index, 0);
        assert_eq!(state.last_update_id, 0);
    }

    #[test]
    fn week_summary_serializes_camel_case() {
        let summary = WeekSummary {
            week: 1,
            tasks: vec!["a".to_string()],
            completed_indices: vec![0],
            total: 1,
            done: 1,
        };
        let v = serde_json::to_value(&summary).expect("serialize");
        assert!(v.get("completedIndices").is_some());
        assert!(v.get("completed_indices").is_none());
    }
}
