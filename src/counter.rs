//! Completion counter - how many times a group was done on a given date

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Storage key the counts live under
pub const COUNTS_STORAGE_KEY: &str = "frequencyCounts";

/// Completion counts keyed by `"<date>-<title>"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionCounts(HashMap<String, u32>);

/// Result of an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub count: u32,
    pub changed: bool,
    /// The count just became equal to the group's frequency
    pub target_reached: bool,
}

/// Composite key for a group on a date
pub fn count_key(date: NaiveDate, title: &str) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), title)
}

impl CompletionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absent keys count as zero
    pub fn get(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bump a counter, bounded by `frequency`
    pub fn increment(&self, key: &str, frequency: u32) -> (Self, Outcome) {
        let count = self.get(key);
        if count >= frequency {
            return (self.clone(), Outcome { count, changed: false, target_reached: false });
        }

        let next = count + 1;
        let mut counts = self.clone();
        counts.0.insert(key.to_string(), next);
        let outcome = Outcome {
            count: next,
            changed: true,
            target_reached: next == frequency,
        };
        (counts, outcome)
    }

    /// Lower a counter, never below zero
    pub fn decrement(&self, key: &str) -> Self {
        let count = self.get(key);
        if count == 0 {
            return self.clone();
        }

        let mut counts = self.clone();
        counts.0.insert(key.to_string(), count - 1);
        counts
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse stored counts; anything unreadable starts from empty
    pub fn from_json_or_default(text: Option<&str>) -> Self {
        text.and_then(|t| serde_json::from_str(t).ok()).unwrap_or_default()
    }
}
