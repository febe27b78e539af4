//! Record filtering.
//!
//! [`FilterSet`] is the compiled form of the filter options in
//! [`SourceConfig`]. Checks run cheapest first; the text filter, which
//! matches against the projected display fields, runs last.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::config::{MatchMode, SourceConfig};
use crate::error::{Result, SourceError};
use crate::project::project_into;
use crate::record::EventRecord;
use crate::traits::RawRecord;

/// Inclusive time window in relative milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    /// Earliest accepted timestamp
    pub start: f64,
    /// Latest accepted timestamp
    pub end: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl TimeWindow {
    /// A window accepting every timestamp.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    /// Creates a window from optional bounds; `None` leaves that side open.
    #[must_use]
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self {
            start: start.unwrap_or(f64::NEG_INFINITY),
            end: end.unwrap_or(f64::INFINITY),
        }
    }

    /// Checks if a timestamp falls within this window.
    ///
    /// A NaN timestamp is never contained.
    #[must_use]
    pub fn contains(&self, timestamp: f64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// A compiled filter pattern with search semantics.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles `pattern` with the given case handling.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidFilterPattern`] if the pattern does not
    /// compile.
    pub fn compile(pattern: &str, mode: MatchMode) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(mode == MatchMode::IgnoreCase)
            .build()
            .map_err(|source| SourceError::InvalidFilterPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { regex })
    }

    /// Returns true if the pattern occurs anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Compiled record filters for one view.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    window: TimeWindow,
    event_names: Option<HashSet<String>>,
    process: Option<Pattern>,
    text: Option<Pattern>,
}

impl FilterSet {
    /// Creates a filter set that passes every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the filter options of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a pattern does
    /// not compile.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate()?;
        let compile = |pattern: &Option<String>| {
            pattern
                .as_deref()
                .map(|p| Pattern::compile(p, config.match_mode))
                .transpose()
        };

        Ok(Self {
            window: TimeWindow::new(
                config.start_time_relative_msec,
                config.end_time_relative_msec,
            ),
            event_names: config
                .event_filter
                .as_ref()
                .map(|names| names.iter().cloned().collect()),
            process: compile(&config.process_filter)?,
            text: compile(&config.text_filter)?,
        })
    }

    /// The active time window.
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        self.window
    }

    /// Returns true if any filter beyond the default window is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.window != TimeWindow::unbounded()
            || self.event_names.is_some()
            || self.process.is_some()
            || self.text.is_some()
    }

    /// Checks the filters that only need the record's identity: the time
    /// window, the event list and the process pattern.
    #[must_use]
    pub fn passes_identity<R: RawRecord + ?Sized>(&self, record: &R) -> bool {
        if !self.window.contains(record.timestamp_relative_msec()) {
            return false;
        }

        if let Some(ref names) = self.event_names {
            if !names.contains(record.event_name()) {
                return false;
            }
        }

        if let Some(ref process) = self.process {
            if !process.is_match(record.process_name()) {
                return false;
            }
        }

        true
    }

    /// Checks the text pattern against a record already projected into
    /// `projected`.
    ///
    /// The text is the adapter's [`RawRecord::filter_text`] if it has one,
    /// otherwise the event name followed by the non-empty display fields.
    /// `scratch` is reused between calls.
    #[must_use]
    pub fn passes_text<R: RawRecord + ?Sized>(
        &self,
        raw: &R,
        projected: &EventRecord,
        scratch: &mut String,
    ) -> bool {
        let Some(ref text) = self.text else {
            return true;
        };
        if let Some(custom) = raw.filter_text() {
            return text.is_match(&custom);
        }
        render_display_text(projected, scratch);
        text.is_match(scratch.as_str())
    }

    /// Checks if `record` passes every active filter when shown with
    /// `columns`.
    ///
    /// The record is projected only if it passes the identity filters and a
    /// text pattern is set.
    #[must_use]
    pub fn passes<R: RawRecord + ?Sized>(
        &self,
        record: &R,
        columns: &[String],
        non_rest: usize,
    ) -> bool {
        if !self.passes_identity(record) {
            return false;
        }
        if self.text.is_none() {
            return true;
        }

        let mut projected = EventRecord::new(non_rest);
        projected.load(record);
        project_into(record, columns, non_rest, projected.display_fields_mut());
        self.passes_text(record, &projected, &mut String::new())
    }
}

/// Writes the event name and the non-empty display fields, space separated.
fn render_display_text(record: &EventRecord, out: &mut String) {
    out.clear();
    out.push_str(record.event_name().unwrap_or_default());
    for field in record.display_fields().iter().filter(|f| !f.is_empty()) {
        out.push(' ');
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRecord;
    use test_case::test_case;

    fn record(name: &str, process: &str, t: f64) -> MemoryRecord {
        MemoryRecord::new(name, process, t).with_field("size", "64")
    }

    fn filters(config: SourceConfig) -> FilterSet {
        FilterSet::from_config(&config).expect("config should compile")
    }

    fn passes(set: &FilterSet, record: &MemoryRecord) -> bool {
        set.passes(record, &["size".to_string()], 4)
    }

    #[test]
    fn empty_filter_passes_everything() {
        let set = FilterSet::new();
        assert!(!set.is_active());
        assert!(passes(&set, &record("A", "p1", -5.0)));
        assert!(passes(&set, &record("B", "p2", 1e12)));
    }

    #[test_case(9.9, false ; "before start")]
    #[test_case(10.0, true ; "at start")]
    #[test_case(15.0, true ; "inside")]
    #[test_case(20.0, true ; "at end")]
    #[test_case(20.1, false ; "after end")]
    fn time_window_is_inclusive(t: f64, expected: bool) {
        let set = filters(SourceConfig::new().with_time_window(Some(10.0), Some(20.0)));
        assert_eq!(passes(&set, &record("A", "p1", t)), expected);
    }

    #[test]
    fn nan_timestamp_is_rejected() {
        let set = FilterSet::new();
        assert!(!passes(&set, &record("A", "p1", f64::NAN)));
    }

    #[test]
    fn event_allow_list() {
        let set = filters(SourceConfig::new().with_event_filter(["A"]));
        assert!(passes(&set, &record("A", "p1", 0.0)));
        assert!(!passes(&set, &record("B", "p1", 0.0)));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let set = filters(SourceConfig::new().with_event_filter(Vec::<String>::new()));
        assert!(!passes(&set, &record("A", "p1", 0.0)));
    }

    #[test]
    fn process_filter_uses_search_semantics() {
        let set = filters(SourceConfig::new().with_process_filter("p1"));
        assert!(passes(&set, &record("A", "p1", 0.0)));
        assert!(passes(&set, &record("A", "xp12", 0.0)));
        assert!(!passes(&set, &record("A", "p2", 0.0)));
    }

    #[test]
    fn process_filter_honors_match_mode() {
        let sensitive = filters(SourceConfig::new().with_process_filter("^app"));
        assert!(!passes(&sensitive, &record("A", "APP", 0.0)));

        let insensitive = filters(
            SourceConfig::new()
                .with_process_filter("^app")
                .with_match_mode(MatchMode::IgnoreCase),
        );
        assert!(passes(&insensitive, &record("A", "APP", 0.0)));
    }

    #[test]
    fn text_filter_sees_displayed_fields() {
        let set = filters(SourceConfig::new().with_text_filter("^A 64$"));
        assert!(passes(&set, &record("A", "p1", 0.0)));

        let set = filters(SourceConfig::new().with_text_filter("128"));
        assert!(!passes(&set, &record("A", "p1", 0.0)));
    }

    #[test]
    fn text_filter_ignores_hidden_columns() {
        let set = filters(SourceConfig::new().with_text_filter("secret"));
        let hidden = record("A", "p1", 0.0).with_field("note", "secret");
        assert!(!passes(&set, &hidden));
        assert!(set.passes(&hidden, &["note".to_string()], 4));
    }

    #[test]
    fn text_filter_ignores_process_name() {
        let set = filters(SourceConfig::new().with_text_filter("procname"));
        assert!(!passes(&set, &record("A", "procname", 0.0)));
    }

    #[test]
    fn text_filter_sees_rest_slot() {
        let set = filters(SourceConfig::new().with_text_filter("size=64"));
        let r = record("A", "p1", 0.0);
        assert!(!passes(&set, &r));
        assert!(set.passes(&r, &["size".to_string()], 0));
    }

    struct Tagged(MemoryRecord);

    impl RawRecord for Tagged {
        fn event_name(&self) -> &str {
            self.0.event_name()
        }

        fn process_name(&self) -> &str {
            self.0.process_name()
        }

        fn timestamp_relative_msec(&self) -> f64 {
            self.0.timestamp_relative_msec()
        }

        fn field(&self, name: &str) -> Option<std::borrow::Cow<'_, str>> {
            self.0.field(name)
        }

        fn filter_text(&self) -> Option<String> {
            Some(format!("tag:{}", self.0.process_name()))
        }
    }

    #[test]
    fn adapter_text_replaces_display_text() {
        let set = filters(SourceConfig::new().with_text_filter("^tag:p1$"));
        let tagged = Tagged(record("A", "p1", 0.0));
        assert!(set.passes(&tagged, &["size".to_string()], 4));

        let set = filters(SourceConfig::new().with_text_filter("64"));
        assert!(!set.passes(&tagged, &["size".to_string()], 4));
    }

    #[test]
    fn window_rejects_regardless_of_other_filters() {
        let set = filters(
            SourceConfig::new()
                .with_time_window(Some(0.0), Some(1.0))
                .with_process_filter("p1")
                .with_text_filter("A"),
        );
        assert!(!passes(&set, &record("A", "p1", 2.0)));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = FilterSet::from_config(&SourceConfig::new().with_text_filter("[unclosed"));
        assert!(matches!(
            result,
            Err(SourceError::InvalidFilterPattern { ref pattern, .. }) if pattern == "[unclosed"
        ));
    }

    #[test]
    fn pattern_as_str() {
        let pattern =
            Pattern::compile("p[0-9]+", MatchMode::CaseSensitive).expect("should compile");
        assert_eq!(pattern.as_str(), "p[0-9]+");
        assert!(pattern.is_match("cpu p42"));
    }
}
