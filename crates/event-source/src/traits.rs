//! Traits a log-format adapter implements.
//!
//! An adapter provides two capabilities:
//! - [`RecordSource`]: the ordered sequence of raw records plus the
//!   listings a viewer needs (event names, column names, process names)
//! - [`RawRecord`]: access to one record's identity and named fields
//!
//! Everything else (filtering, projection, iteration) is done once, in this
//! crate, so every format behaves the same way in a viewer.

use std::borrow::Cow;

use crate::error::Result;

/// Read access to one raw record produced by an adapter.
pub trait RawRecord {
    /// Name of the event kind.
    fn event_name(&self) -> &str;

    /// Name of the process that emitted the event.
    fn process_name(&self) -> &str;

    /// Timestamp in milliseconds relative to the collection origin.
    fn timestamp_relative_msec(&self) -> f64;

    /// Looks up a field value by name.
    ///
    /// Returns `None` if the record does not carry the field.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Adapter-specific text for the text filter.
    ///
    /// `None`, the default, matches the text filter against the event name
    /// and the record's display fields.
    fn filter_text(&self) -> Option<String> {
        None
    }
}

impl<R: RawRecord + ?Sized> RawRecord for &R {
    fn event_name(&self) -> &str {
        (**self).event_name()
    }

    fn process_name(&self) -> &str {
        (**self).process_name()
    }

    fn timestamp_relative_msec(&self) -> f64 {
        (**self).timestamp_relative_msec()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).field(name)
    }

    fn filter_text(&self) -> Option<String> {
        (**self).filter_text()
    }
}

/// An ordered, immutable sequence of raw records from one log.
///
/// Implementations are shared between views through an `Arc`, so they are
/// read-only: all per-view state lives in [`crate::EventSource`].
pub trait RecordSource {
    /// The record type yielded by [`RecordSource::records`].
    type Record<'a>: RawRecord
    where
        Self: 'a;

    /// Returns the records in native (time) order.
    ///
    /// A failure to decode the underlying data is yielded as an `Err` item;
    /// iteration stops at the first error.
    fn records(&self) -> Box<dyn Iterator<Item = Result<Self::Record<'_>>> + '_>;

    /// The canonical list of column names, in display order.
    fn column_names(&self) -> Vec<String>;

    /// Names of every event kind in the log.
    fn event_names(&self) -> Vec<String>;

    /// Names of every process in the log, if known.
    fn process_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Columns available when only `event_names` are selected.
    ///
    /// `None` means no event filter is active. The default ignores the
    /// selection and returns [`RecordSource::column_names`].
    fn all_column_names(&self, event_names: Option<&[String]>) -> Vec<String> {
        let _ = event_names;
        self.column_names()
    }

    /// Upper bound on record timestamps, `f64::INFINITY` if unknown.
    fn max_event_time_relative_msec(&self) -> f64 {
        f64::INFINITY
    }

    /// Whether per-column sums should be accumulated during a pass.
    fn supports_column_sums(&self) -> bool {
        false
    }
}
