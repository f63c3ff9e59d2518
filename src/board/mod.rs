//! Board issue aggregation
//!
//! Derived issue-count views for project boards and reporting.

mod counts;

pub use counts::{
    calculate_issue_counts, done_column_threshold, CategoryTally, Issue, IssueCounts,
    StatusCategory,
};
