//! The iteration engine.
//!
//! A pass pulls raw records from a [`RecordSource`] in native order, filters
//! them, projects the survivors onto a reused [`EventRecord`] and hands each
//! one to a callback. Only records that pass the time, event and process
//! filters are projected; the text filter then runs on the projection.
//!
//! A pass ends in exactly one of three terminal states:
//!
//! - [`IterationState::Completed`]: the source ran out of records
//! - [`IterationState::Truncated`]: the count cap was hit; a sentinel
//!   record without an event name was delivered last
//! - [`IterationState::Halted`]: the callback returned `false`
//!
//! A read failure aborts the pass with the adapter's error.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::filter::FilterSet;
use crate::project::project_into;
use crate::record::EventRecord;
use crate::traits::{RawRecord, RecordSource};

/// Lifecycle of an iteration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationState {
    /// No pass has run yet
    #[default]
    Ready,
    /// A pass is delivering records
    Iterating,
    /// The source was exhausted before the cap
    Completed,
    /// The count cap was reached and the sentinel delivered
    Truncated,
    /// The callback asked to stop
    Halted,
}

impl IterationState {
    /// Returns true for the states a pass ends in.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Truncated | Self::Halted)
    }

    /// Returns the string representation of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Iterating => "iterating",
            Self::Completed => "completed",
            Self::Truncated => "truncated",
            Self::Halted => "halted",
        }
    }
}

impl std::fmt::Display for IterationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters and outcome of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// State the pass ended in
    pub state: IterationState,
    /// Raw records pulled from the source
    pub scanned: usize,
    /// Records delivered to the callback, not counting the sentinel
    pub delivered: usize,
}

/// What a pass needs besides the source and the callback.
#[derive(Debug, Clone, Copy)]
pub struct PassPlan<'a> {
    /// Filters every record must pass
    pub filters: &'a FilterSet,
    /// Resolved columns to project
    pub columns: &'a [String],
    /// Number of columns with their own display slot
    pub non_rest: usize,
    /// Maximum number of records to deliver
    pub max_ret: Option<usize>,
}

/// Runs one pass over `source`.
///
/// When `sums` is given it must have one entry per column in the plan; each
/// delivered record adds its parseable column values to it.
///
/// # Errors
///
/// Returns the adapter's error if reading a record fails. Records delivered
/// before the failure have already been seen by the callback.
pub fn run_pass<S, F>(
    source: &S,
    plan: &PassPlan<'_>,
    mut sums: Option<&mut [f64]>,
    mut callback: F,
) -> Result<PassSummary>
where
    S: RecordSource + ?Sized,
    F: FnMut(&EventRecord) -> bool,
{
    debug!(
        target: "event_source",
        columns = plan.columns.len(),
        non_rest = plan.non_rest,
        max_ret = ?plan.max_ret,
        filtered = plan.filters.is_active(),
        "starting pass"
    );

    let mut summary = PassSummary {
        state: IterationState::Iterating,
        ..PassSummary::default()
    };
    let mut record = EventRecord::new(plan.non_rest);
    let mut text = String::new();

    for raw in source.records() {
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    target: "event_source",
                    scanned = summary.scanned,
                    delivered = summary.delivered,
                    error = %err,
                    "source read failed, aborting pass"
                );
                return Err(err);
            }
        };
        summary.scanned += 1;

        if !plan.filters.passes_identity(&raw) {
            continue;
        }

        // The text filter matches the projection, so the record is projected
        // into the reused record first and left there if it is rejected.
        record.load(&raw);
        project_into(&raw, plan.columns, plan.non_rest, record.display_fields_mut());
        if !plan.filters.passes_text(&raw, &record, &mut text) {
            continue;
        }

        if plan.max_ret.is_some_and(|cap| summary.delivered >= cap) {
            record.load_sentinel(raw.timestamp_relative_msec());
            // The pass is over whatever the callback answers.
            let _ = callback(&record);
            summary.state = IterationState::Truncated;
            return Ok(finish(summary));
        }

        if let Some(sums) = sums.as_deref_mut() {
            accumulate(&raw, plan.columns, sums);
        }
        summary.delivered += 1;

        if !callback(&record) {
            summary.state = IterationState::Halted;
            return Ok(finish(summary));
        }
    }

    summary.state = IterationState::Completed;
    Ok(finish(summary))
}

fn finish(summary: PassSummary) -> PassSummary {
    debug!(
        target: "event_source",
        state = %summary.state,
        scanned = summary.scanned,
        delivered = summary.delivered,
        "pass finished"
    );
    summary
}

/// Adds each column's numeric value to its running sum.
fn accumulate<R: RawRecord + ?Sized>(record: &R, columns: &[String], sums: &mut [f64]) {
    for (column, sum) in columns.iter().zip(sums.iter_mut()) {
        if let Some(value) = record.field(column) {
            if let Ok(number) = value.trim().parse::<f64>() {
                *sum += number;
            }
        }
    }
}
