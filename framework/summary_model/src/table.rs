use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ResultRecord;

/// The results collected during a run, in the order the cases completed.
///
/// The table is cleared, not replaced, when a new run starts. Summarisers only get shared access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record for a case that has just completed.
    pub fn append(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    /// Empty the table ahead of a new run.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean elapsed time across all records, if there are any.
    pub fn average_elapsed(&self) -> Option<Duration> {
        if self.records.is_empty() {
            return None;
        }

        let total = self.records.iter().map(ResultRecord::elapsed).sum::<Duration>();
        Some(total.div_f64(self.records.len() as f64))
    }

    /// Records that took longer than their overall budget.
    pub fn over_budget(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.is_over_budget())
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
