//! In-memory record source.
//!
//! This module provides:
//! - [`MemoryRecord`]: A raw record with owned fields
//! - [`MemorySource`]: A [`RecordSource`] over a vector of records
//!
//! `MemorySource` is the reference implementation of the adapter contract.
//! It can also be told to fail at a given record to exercise error paths.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};
use crate::traits::{RawRecord, RecordSource};

/// A raw record held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Name of the event kind
    pub event_name: String,
    /// Emitting process
    pub process_name: String,
    /// Milliseconds relative to the collection origin
    pub timestamp_relative_msec: f64,
    /// Named field values, in record order
    #[serde(default)]
    pub fields: Vec<(String, String)>,
}

impl MemoryRecord {
    /// Creates a record without fields.
    #[must_use]
    pub fn new(
        event_name: impl Into<String>,
        process_name: impl Into<String>,
        timestamp_relative_msec: f64,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            process_name: process_name.into(),
            timestamp_relative_msec,
            fields: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

impl RawRecord for MemoryRecord {
    fn event_name(&self) -> &str {
        &self.event_name
    }

    fn process_name(&self) -> &str {
        &self.process_name
    }

    fn timestamp_relative_msec(&self) -> f64 {
        self.timestamp_relative_msec
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| Cow::Borrowed(value.as_str()))
    }
}

/// Injected read failure.
#[derive(Debug, Clone)]
struct Failure {
    index: usize,
    message: String,
}

/// A record source backed by a vector.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    /// Records in native order
    records: Vec<MemoryRecord>,
    /// Canonical column order, derived from the records unless set
    columns: Vec<String>,
    /// Whether passes accumulate column sums
    column_sums: bool,
    /// Fail when this record is reached
    failure: Option<Failure>,
}

impl MemorySource {
    /// Creates a source over `records`.
    ///
    /// The canonical column list is every field name in order of first
    /// appearance.
    #[must_use]
    pub fn new(records: Vec<MemoryRecord>) -> Self {
        let columns = first_seen(
            records
                .iter()
                .flat_map(|r| r.fields.iter().map(|(n, _)| n.as_str())),
        );
        Self {
            records,
            columns,
            column_sums: false,
            failure: None,
        }
    }

    /// Overrides the canonical column list.
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Enables per-column sums.
    #[must_use]
    pub const fn with_column_sums(mut self, enabled: bool) -> Self {
        self.column_sums = enabled;
        self
    }

    /// Makes every pass fail with `message` when record `index` is reached.
    #[must_use]
    pub fn with_failure_at(mut self, index: usize, message: impl Into<String>) -> Self {
        self.failure = Some(Failure {
            index,
            message: message.into(),
        });
        self
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the source holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for MemorySource {
    type Record<'a> = &'a MemoryRecord;

    fn records(&self) -> Box<dyn Iterator<Item = Result<&MemoryRecord>> + '_> {
        let failure = self.failure.as_ref();
        Box::new(
            self.records
                .iter()
                .enumerate()
                .map(move |(index, record)| match failure {
                    Some(f) if f.index == index => Err(SourceError::SourceRead(format!(
                        "record {index}: {}",
                        f.message
                    ))),
                    _ => Ok(record),
                }),
        )
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn event_names(&self) -> Vec<String> {
        first_seen(self.records.iter().map(|r| r.event_name.as_str()))
    }

    fn process_names(&self) -> Option<Vec<String>> {
        Some(first_seen(self.records.iter().map(|r| r.process_name.as_str())))
    }

    fn all_column_names(&self, event_names: Option<&[String]>) -> Vec<String> {
        let Some(event_names) = event_names else {
            return self.columns.clone();
        };

        let present: HashSet<&str> = self
            .records
            .iter()
            .filter(|r| event_names.iter().any(|n| *n == r.event_name))
            .flat_map(|r| r.fields.iter().map(|(n, _)| n.as_str()))
            .collect();

        self.columns
            .iter()
            .filter(|c| present.contains(c.as_str()))
            .cloned()
            .collect()
    }

    fn max_event_time_relative_msec(&self) -> f64 {
        if self.records.is_empty() {
            return f64::INFINITY;
        }
        self.records
            .iter()
            .map(|r| r.timestamp_relative_msec)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn supports_column_sums(&self) -> bool {
        self.column_sums
    }
}

/// Distinct names in order of first appearance.
fn first_seen<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemorySource {
        MemorySource::new(vec![
            MemoryRecord::new("GC", "app", 1.0)
                .with_field("gen", "0")
                .with_field("bytes", "512"),
            MemoryRecord::new("Alloc", "worker", 2.0).with_field("size", "64"),
            MemoryRecord::new("GC", "app", 3.0)
                .with_field("gen", "1")
                .with_field("reason", "low memory"),
        ])
    }

    #[test]
    fn columns_in_first_seen_order() {
        assert_eq!(sample().column_names(), vec!["gen", "bytes", "size", "reason"]);
    }

    #[test]
    fn explicit_columns_override() {
        let source = sample().with_columns(["size", "gen"]);
        assert_eq!(source.column_names(), vec!["size", "gen"]);
    }

    #[test]
    fn event_and_process_names_are_distinct() {
        let source = sample();
        assert_eq!(source.event_names(), vec!["GC", "Alloc"]);
        assert_eq!(
            source.process_names(),
            Some(vec!["app".to_string(), "worker".to_string()])
        );
    }

    #[test]
    fn all_column_names_follows_event_selection() {
        let source = sample();
        assert_eq!(source.all_column_names(None), source.column_names());
        assert_eq!(
            source.all_column_names(Some(&["Alloc".to_string()])),
            vec!["size"]
        );
        assert_eq!(
            source.all_column_names(Some(&["GC".to_string()])),
            vec!["gen", "bytes", "reason"]
        );
    }

    #[test]
    fn records_yield_in_order() {
        let source = sample();
        let times: Vec<f64> = source
            .records()
            .filter_map(Result::ok)
            .map(|r| r.timestamp_relative_msec)
            .collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn injected_failure_is_yielded() {
        let source = sample().with_failure_at(1, "corrupt block");
        let items: Vec<_> = source.records().collect();
        assert!(items[0].is_ok());
        assert!(matches!(
            &items[1],
            Err(SourceError::SourceRead(msg)) if msg.contains("corrupt block")
        ));
    }

    #[test]
    fn max_event_time() {
        assert!((sample().max_event_time_relative_msec() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_event_time_of_empty_source_is_unknown() {
        let max = MemorySource::default().max_event_time_relative_msec();
        assert!(max.is_infinite() && max.is_sign_positive());
    }

    #[test]
    fn max_event_time_with_negative_timestamps() {
        let source = MemorySource::new(vec![
            MemoryRecord::new("GC", "app", -30.0),
            MemoryRecord::new("GC", "app", -12.5),
        ]);
        assert!((source.max_event_time_relative_msec() + 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn record_field_lookup() {
        let record = MemoryRecord::new("GC", "app", 1.0).with_field("gen", "2");
        assert_eq!(record.field("gen").as_deref(), Some("2"));
        assert_eq!(record.field("bytes"), None);
    }

    #[test]
    fn record_deserializes_without_fields() {
        let record: MemoryRecord = serde_json::from_str(
            r#"{"event_name":"GC","process_name":"app","timestamp_relative_msec":4.5}"#,
        )
        .expect("should parse");
        assert!(record.fields.is_empty());
        assert_eq!(sample().len(), 3);
        assert!(!sample().is_empty());
    }
}
