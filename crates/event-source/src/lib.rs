//! # event-source
//!
//! Format-independent browsing of event logs.
//!
//! A log-format adapter implements [`RecordSource`] and [`RawRecord`]; this
//! crate does the rest, identically for every format:
//!
//! - [`resolve_columns`]: Wildcard-capable column specifications
//! - [`project`]: Raw fields onto fixed display slots plus a "rest" slot
//! - [`FilterSet`]: Time window, event, process and text filters
//! - [`run_pass`]: Push-style iteration with early termination
//! - [`EventSource`]: Per-view configuration, cloneable into independent views
//! - [`MemorySource`]: In-memory reference adapter
//!
//! ## Example
//!
//! ```rust
//! use event_source::{EventSource, MemoryRecord, MemorySource};
//!
//! let data = MemorySource::new(vec![
//!     MemoryRecord::new("GC", "app", 10.0).with_field("gen", "0"),
//!     MemoryRecord::new("Alloc", "worker", 20.0).with_field("size", "64"),
//! ]);
//!
//! let mut view = EventSource::new(data);
//! view.set_process_filter(Some("app"))?;
//! view.set_columns_to_display("gen *")?;
//!
//! let mut rows = Vec::new();
//! view.for_each(|record| {
//!     rows.push(record.display_fields().to_vec());
//!     true
//! })?;
//! assert_eq!(rows, vec![vec!["0", "", "", "", ""]]);
//! # Ok::<(), event_source::SourceError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod memory;
pub mod project;
pub mod record;
pub mod source;
pub mod traits;


// Re-export main types
pub use columns::{resolve_columns, WILDCARD};
pub use config::{MatchMode, SourceConfig};
pub use engine::{run_pass, IterationState, PassPlan, PassSummary};
pub use error::{Result, SourceError};
pub use filter::{FilterSet, Pattern, TimeWindow};
pub use memory::{MemoryRecord, MemorySource};
pub use project::{project, project_into, REST_SEPARATOR};
pub use record::{display_len, EventRecord, DEFAULT_NON_REST_FIELDS};
pub use source::EventSource;
pub use traits::{RawRecord, RecordSource};
