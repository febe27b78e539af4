//! The per-view source handle.
//!
//! An [`EventSource`] pairs shared, read-only log data with the mutable
//! state of one view: its filters, its column selection and the results of
//! its last pass. Cloning a handle gives a second, independent view over the
//! same data.

use std::sync::Arc;

use tracing::debug;

use crate::columns::resolve_columns;
use crate::config::{MatchMode, SourceConfig};
use crate::engine::{run_pass, PassPlan, PassSummary};
use crate::error::Result;
use crate::filter::{FilterSet, TimeWindow};
use crate::record::EventRecord;
use crate::traits::RecordSource;

/// A view over a record source.
///
/// Every setter validates its input before changing anything; on error the
/// handle is left as it was.
#[derive(Debug)]
pub struct EventSource<A> {
    /// Shared log data
    adapter: Arc<A>,
    /// Options as set by the caller
    config: SourceConfig,
    /// Compiled filters for `config`
    filters: FilterSet,
    /// Columns resolved from `config.columns_to_display`
    columns: Vec<String>,
    /// Running sums from the last pass, one per column
    column_sums: Option<Vec<f64>>,
    /// Outcome of the last completed pass
    last_pass: Option<PassSummary>,
}

impl<A: RecordSource> EventSource<A> {
    /// Creates a view with the default configuration.
    #[must_use]
    pub fn new(adapter: A) -> Self {
        Self::from_shared(Arc::new(adapter))
    }

    /// Creates a view over data already shared with other views.
    #[must_use]
    pub fn from_shared(adapter: Arc<A>) -> Self {
        let columns = adapter.all_column_names(None);
        Self {
            adapter,
            config: SourceConfig::default(),
            filters: FilterSet::default(),
            columns,
            column_sums: None,
            last_pass: None,
        }
    }

    /// Creates a view with `config` applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected by
    /// [`EventSource::apply_config`].
    pub fn with_config(adapter: A, config: SourceConfig) -> Result<Self> {
        let mut source = Self::new(adapter);
        source.apply_config(config)?;
        Ok(source)
    }

    /// Replaces the whole configuration.
    ///
    /// Validation, pattern compilation and column resolution all happen
    /// before anything is changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a pattern does not
    /// compile or the column specification is malformed.
    pub fn apply_config(&mut self, config: SourceConfig) -> Result<()> {
        let filters = FilterSet::from_config(&config)?;
        let columns = self.resolve(&config)?;
        self.config = config;
        self.filters = filters;
        self.columns = columns;
        Ok(())
    }

    fn resolve(&self, config: &SourceConfig) -> Result<Vec<String>> {
        let available = self.adapter.all_column_names(config.event_filter.as_deref());
        match resolve_columns(&config.columns_to_display, &available)? {
            Some(columns) => Ok(columns),
            None => {
                debug!(
                    target: "event_source",
                    columns = available.len(),
                    "empty column specification, displaying all columns"
                );
                Ok(available)
            }
        }
    }

    fn update(&mut self, change: impl FnOnce(&mut SourceConfig)) -> Result<()> {
        let mut config = self.config.clone();
        change(&mut config);
        self.apply_config(config)
    }

    /// The current configuration.
    #[must_use]
    pub const fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// The shared log data, for creating further views.
    #[must_use]
    pub const fn shared(&self) -> &Arc<A> {
        &self.adapter
    }

    /// Sets the inclusive time window; `None` leaves a side unbounded.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is after `end` or either is NaN.
    pub fn set_time_window(&mut self, start: Option<f64>, end: Option<f64>) -> Result<()> {
        self.update(|c| {
            c.start_time_relative_msec = start;
            c.end_time_relative_msec = end;
        })
    }

    /// The active time window.
    #[must_use]
    pub const fn time_window(&self) -> TimeWindow {
        self.filters.window()
    }

    /// Lower bound of the time window.
    #[must_use]
    pub const fn start_time_relative_msec(&self) -> f64 {
        self.filters.window().start
    }

    /// Upper bound of the time window.
    #[must_use]
    pub const fn end_time_relative_msec(&self) -> f64 {
        self.filters.window().end
    }

    /// Sets the maximum number of records a pass delivers.
    pub fn set_max_ret(&mut self, max_ret: Option<usize>) {
        self.config.max_ret = max_ret;
    }

    /// The maximum number of records a pass delivers.
    #[must_use]
    pub const fn max_ret(&self) -> Option<usize> {
        self.config.max_ret
    }

    /// Sets or clears the process name pattern.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SourceError::InvalidFilterPattern`] if the pattern
    /// does not compile.
    pub fn set_process_filter(&mut self, pattern: Option<&str>) -> Result<()> {
        self.update(|c| c.process_filter = pattern.map(ToString::to_string))
    }

    /// The process name pattern.
    #[must_use]
    pub fn process_filter(&self) -> Option<&str> {
        self.config.process_filter.as_deref()
    }

    /// Sets or clears the text pattern.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SourceError::InvalidFilterPattern`] if the pattern
    /// does not compile.
    pub fn set_text_filter(&mut self, pattern: Option<&str>) -> Result<()> {
        self.update(|c| c.text_filter = pattern.map(ToString::to_string))
    }

    /// The text pattern.
    #[must_use]
    pub fn text_filter(&self) -> Option<&str> {
        self.config.text_filter.as_deref()
    }

    /// Sets the case handling of both patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern does not compile in the new mode.
    pub fn set_match_mode(&mut self, mode: MatchMode) -> Result<()> {
        self.update(|c| c.match_mode = mode)
    }

    /// Restricts passes to the given event names.
    ///
    /// The column specification is resolved again against the columns
    /// available for the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the column specification no longer resolves.
    pub fn set_event_filter(&mut self, event_names: Vec<String>) -> Result<()> {
        self.update(|c| c.event_filter = Some(event_names))
    }

    /// Removes the event name restriction.
    ///
    /// # Errors
    ///
    /// Returns an error if the column specification no longer resolves.
    pub fn clear_event_filter(&mut self) -> Result<()> {
        self.update(|c| c.event_filter = None)
    }

    /// The event name restriction, `None` if all events pass.
    #[must_use]
    pub fn event_filter(&self) -> Option<&[String]> {
        self.config.event_filter.as_deref()
    }

    /// Sets the column specification.
    ///
    /// An empty specification displays every available column.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SourceError::MalformedSpec`] if the specification
    /// cannot be tokenized.
    pub fn set_columns_to_display(&mut self, spec: &str) -> Result<()> {
        self.update(|c| c.columns_to_display = spec.to_string())
    }

    /// The resolved columns, in display order.
    #[must_use]
    pub fn columns_to_display(&self) -> &[String] {
        &self.columns
    }

    /// Sets how many columns get their own display slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SourceError::InvalidConfig`] unless `non_rest` is 0
    /// or at least 4.
    pub fn set_non_rest_fields(&mut self, non_rest: usize) -> Result<()> {
        self.update(|c| c.non_rest_fields = non_rest)
    }

    /// How many columns get their own display slot.
    #[must_use]
    pub const fn non_rest_fields(&self) -> usize {
        self.config.non_rest_fields
    }

    /// Names of every event kind in the log.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.adapter.event_names()
    }

    /// Names of every process in the log, if the adapter knows them.
    #[must_use]
    pub fn process_names(&self) -> Option<Vec<String>> {
        self.adapter.process_names()
    }

    /// Columns available for the current event selection.
    #[must_use]
    pub fn all_column_names(&self) -> Vec<String> {
        self.adapter.all_column_names(self.event_filter())
    }

    /// Upper bound on record timestamps, `f64::INFINITY` if unknown.
    #[must_use]
    pub fn max_event_time_relative_msec(&self) -> f64 {
        self.adapter.max_event_time_relative_msec()
    }

    /// Per-column sums from the last pass, when the adapter supports them.
    #[must_use]
    pub fn column_sums(&self) -> Option<&[f64]> {
        self.column_sums.as_deref()
    }

    /// Outcome of the last pass that ran to a terminal state.
    #[must_use]
    pub const fn last_pass(&self) -> Option<&PassSummary> {
        self.last_pass.as_ref()
    }

    /// Calls `callback` for each record that passes the filters.
    ///
    /// Iteration stops when the callback returns `false`, when the source is
    /// exhausted, or after the count cap is hit and a sentinel record (no
    /// event name, valid timestamp) has been delivered. The record passed to
    /// the callback is reused between calls.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error if reading fails. The results of the
    /// previous pass are kept in that case.
    pub fn for_each<F>(&mut self, callback: F) -> Result<PassSummary>
    where
        F: FnMut(&EventRecord) -> bool,
    {
        let plan = PassPlan {
            filters: &self.filters,
            columns: &self.columns,
            non_rest: self.config.non_rest_fields,
            max_ret: self.config.max_ret,
        };

        let mut sums = self
            .adapter
            .supports_column_sums()
            .then(|| vec![0.0; self.columns.len()]);

        let summary = run_pass(&*self.adapter, &plan, sums.as_deref_mut(), callback)?;

        self.column_sums = sums;
        self.last_pass = Some(summary);
        Ok(summary)
    }
}

impl<A> Clone for EventSource<A> {
    /// Creates an independent view over the same data.
    ///
    /// Filters, column selection and pass counters are copied; column sums
    /// are not, since they describe a pass rather than the configuration.
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            config: self.config.clone(),
            filters: self.filters.clone(),
            columns: self.columns.clone(),
            column_sums: None,
            last_pass: self.last_pass,
        }
    }
}
