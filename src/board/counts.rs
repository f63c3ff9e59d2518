//! Issue count aggregation
//!
//! Buckets a collection of issues into workflow categories, splitting
//! done items into visible and hidden by a recency threshold. Completed
//! work older than the threshold is hidden from default board views to
//! reduce clutter while still counting toward historical totals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Coarse workflow bucket a status maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Todo,
    #[serde(rename = "inprogress")]
    InProgress,
    Done,
}

impl StatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "inprogress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// An issue record, as far as aggregation is concerned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Workflow status key
    pub status: String,

    /// Last update time in epoch milliseconds
    pub updated_at: i64,
}

/// Non-negative counts per workflow category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub todo: u64,
    pub inprogress: u64,
    pub done: u64,
}

impl CategoryTally {
    pub fn get(&self, category: StatusCategory) -> u64 {
        match category {
            StatusCategory::Todo => self.todo,
            StatusCategory::InProgress => self.inprogress,
            StatusCategory::Done => self.done,
        }
    }

    fn increment(&mut self, category: StatusCategory) {
        match category {
            StatusCategory::Todo => self.todo += 1,
            StatusCategory::InProgress => self.inprogress += 1,
            StatusCategory::Done => self.done += 1,
        }
    }

    pub fn sum(&self) -> u64 {
        self.todo + self.inprogress + self.done
    }
}

/// Issue counts per category, split into visible and hidden.
///
/// For every category `visible + hidden == total`, and only `done` can
/// have hidden items. Recomputed on demand, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub total: CategoryTally,
    pub visible: CategoryTally,
    pub hidden: CategoryTally,
}

/// Epoch-millisecond cutoff below which done issues are hidden.
pub fn done_column_threshold(now_ms: i64, days: i64) -> i64 {
    now_ms - days * MILLIS_PER_DAY
}

/// Aggregate issues into per-category counts in a single pass.
///
/// Statuses missing from the mapping default to `todo` rather than
/// failing. Done issues updated before `done_threshold` count as
/// hidden; all other issues are visible.
pub fn calculate_issue_counts(
    issues: &[Issue],
    status_categories: &HashMap<String, StatusCategory>,
    done_threshold: i64,
) -> IssueCounts {
    let mut counts = IssueCounts::default();

    for issue in issues {
        let category = status_categories
            .get(&issue.status)
            .copied()
            .unwrap_or(StatusCategory::Todo);

        counts.total.increment(category);

        if category == StatusCategory::Done && issue.updated_at < done_threshold {
            counts.hidden.increment(category);
        } else {
            counts.visible.increment(category);
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATEGORIES: [StatusCategory; 3] = [
        StatusCategory::Todo,
        StatusCategory::InProgress,
        StatusCategory::Done,
    ];

    fn issue(status: &str, updated_at: i64) -> Issue {
        Issue {
            status: status.to_string(),
            updated_at,
        }
    }

    fn mapping(pairs: &[(&str, StatusCategory)]) -> HashMap<String, StatusCategory> {
        pairs
            .iter()
            .map(|(status, category)| (status.to_string(), *category))
            .collect()
    }

    fn assert_invariants(counts: &IssueCounts, input_len: u64) {
        for category in CATEGORIES {
            assert_eq!(
                counts.visible.get(category) + counts.hidden.get(category),
                counts.total.get(category),
                "visible + hidden must equal total for {}",
                category.as_str()
            );
            if category != StatusCategory::Done {
                assert_eq!(counts.hidden.get(category), 0);
            }
        }
        assert_eq!(counts.total.sum(), input_len);
    }

    #[test]
    fn splits_done_issues_by_threshold() {
        let issues = [issue("open", 100), issue("closed", 9999)];
        let map = mapping(&[
            ("open", StatusCategory::Todo),
            ("closed", StatusCategory::Done),
        ]);

        let counts = calculate_issue_counts(&issues, &map, 5000);

        assert_eq!(counts.total, CategoryTally { todo: 1, inprogress: 0, done: 1 });
        assert_eq!(counts.visible, CategoryTally { todo: 1, inprogress: 0, done: 0 });
        assert_eq!(counts.hidden, CategoryTally { todo: 0, inprogress: 0, done: 1 });
        assert_invariants(&counts, 2);
    }

    #[test]
    fn done_issue_at_threshold_is_visible() {
        let issues = [issue("closed", 5000)];
        let map = mapping(&[("closed", StatusCategory::Done)]);

        let counts = calculate_issue_counts(&issues, &map, 5000);
        assert_eq!(counts.visible.done, 1);
        assert_eq!(counts.hidden.done, 0);
    }

    #[test]
    fn unmapped_status_defaults_to_todo() {
        let issues = [issue("triage", 0)];
        let counts = calculate_issue_counts(&issues, &HashMap::new(), 100);

        assert_eq!(counts.total.todo, 1);
        assert_eq!(counts.visible.todo, 1);
        assert_invariants(&counts, 1);
    }

    #[test]
    fn non_done_issues_are_always_visible() {
        // Both far older than the threshold; only done hides.
        let issues = [issue("open", 0), issue("doing", 0), issue("closed", 0)];
        let map = mapping(&[
            ("open", StatusCategory::Todo),
            ("doing", StatusCategory::InProgress),
            ("closed", StatusCategory::Done),
        ]);

        let counts = calculate_issue_counts(&issues, &map, i64::MAX);

        assert_eq!(counts.visible.todo, 1);
        assert_eq!(counts.visible.inprogress, 1);
        assert_eq!(counts.visible.done, 0);
        assert_eq!(counts.hidden.done, 1);
        assert_invariants(&counts, 3);
    }

    #[test]
    fn empty_input_produces_zero_counts() {
        let counts = calculate_issue_counts(&[], &HashMap::new(), 0);
        assert_eq!(counts, IssueCounts::default());
        assert_invariants(&counts, 0);
    }

    #[test]
    fn threshold_helper_subtracts_whole_days() {
        let now = 1_700_000_000_000;
        assert_eq!(done_column_threshold(now, 14), now - 14 * MILLIS_PER_DAY);
        assert_eq!(done_column_threshold(now, 0), now);
    }

    #[test]
    fn category_round_trips_through_strings() {
        for category in CATEGORIES {
            assert_eq!(StatusCategory::from_str(category.as_str()), Some(category));
        }
        assert_eq!(StatusCategory::from_str("blocked"), None);
    }
}
