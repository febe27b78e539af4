//! Per-view configuration.
//!
//! [`SourceConfig`] holds every option a viewer sets before an iteration
//! pass. It is plain data: [`crate::EventSource::apply_config`] validates it
//! and compiles the filter patterns in one step.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};
use crate::record::{is_valid_non_rest, DEFAULT_NON_REST_FIELDS};

/// How filter patterns treat letter case.
///
/// Both patterns use search semantics: a pattern matches if it occurs
/// anywhere in the tested text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Letters must match exactly
    #[default]
    CaseSensitive,
    /// Letters match regardless of case
    IgnoreCase,
}

/// Filter, column and projection options for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Drop records before this time (inclusive bound, `None` = unbounded)
    pub start_time_relative_msec: Option<f64>,
    /// Drop records after this time (inclusive bound, `None` = unbounded)
    pub end_time_relative_msec: Option<f64>,
    /// Maximum number of records to deliver (`None` = unbounded)
    pub max_ret: Option<usize>,
    /// Only deliver records whose process name matches this pattern
    pub process_filter: Option<String>,
    /// Only deliver records whose text matches this pattern
    pub text_filter: Option<String>,
    /// Only deliver records with one of these event names (`None` = all)
    pub event_filter: Option<Vec<String>>,
    /// Column specification, see [`crate::columns::resolve_columns`]
    pub columns_to_display: String,
    /// Number of columns that get their own display slot
    pub non_rest_fields: usize,
    /// Case handling for both filter patterns
    pub match_mode: MatchMode,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            start_time_relative_msec: None,
            end_time_relative_msec: None,
            max_ret: None,
            process_filter: None,
            text_filter: None,
            event_filter: None,
            columns_to_display: String::new(),
            non_rest_fields: DEFAULT_NON_REST_FIELDS,
            match_mode: MatchMode::default(),
        }
    }
}

impl SourceConfig {
    /// Creates a configuration that passes every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Sets the inclusive time window.
    #[must_use]
    pub const fn with_time_window(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.start_time_relative_msec = start;
        self.end_time_relative_msec = end;
        self
    }

    /// Sets the maximum number of records to deliver.
    #[must_use]
    pub const fn with_max_ret(mut self, max_ret: usize) -> Self {
        self.max_ret = Some(max_ret);
        self
    }

    /// Sets the process name pattern.
    #[must_use]
    pub fn with_process_filter(mut self, pattern: impl Into<String>) -> Self {
        self.process_filter = Some(pattern.into());
        self
    }

    /// Sets the text pattern.
    #[must_use]
    pub fn with_text_filter(mut self, pattern: impl Into<String>) -> Self {
        self.text_filter = Some(pattern.into());
        self
    }

    /// Restricts delivery to the given event names.
    #[must_use]
    pub fn with_event_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_filter = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the column specification.
    #[must_use]
    pub fn with_columns(mut self, spec: impl Into<String>) -> Self {
        self.columns_to_display = spec.into();
        self
    }

    /// Sets the non-rest field count.
    #[must_use]
    pub const fn with_non_rest_fields(mut self, non_rest: usize) -> Self {
        self.non_rest_fields = non_rest;
        self
    }

    /// Sets the pattern case handling.
    #[must_use]
    pub const fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Checks the values that do not depend on the log being viewed.
    ///
    /// Pattern compilation is checked separately when the configuration is
    /// applied to a source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidConfig`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_non_rest(self.non_rest_fields) {
            return Err(SourceError::InvalidConfig(format!(
                "non-rest field count must be 0 or at least 4, got {}",
                self.non_rest_fields
            )));
        }

        for (name, bound) in [
            ("start", self.start_time_relative_msec),
            ("end", self.end_time_relative_msec),
        ] {
            if bound.is_some_and(f64::is_nan) {
                return Err(SourceError::InvalidConfig(format!(
                    "{name} time bound is not a number"
                )));
            }
        }

        if let (Some(start), Some(end)) =
            (self.start_time_relative_msec, self.end_time_relative_msec)
        {
            if start > end {
                return Err(SourceError::InvalidConfig(format!(
                    "start time {start} is after end time {end}"
                )));
            }
        }

        Ok(())
    }
}
