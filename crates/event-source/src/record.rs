//! The displayable record delivered to iteration callbacks.

use serde::Serialize;

use crate::traits::RawRecord;

/// Number of non-rest display fields used unless configured otherwise.
pub const DEFAULT_NON_REST_FIELDS: usize = 4;

/// Smallest number of non-rest slots a display array carries.
pub const MIN_DISPLAY_SLOTS: usize = 4;

/// Length of the display array for a given non-rest count.
///
/// The array always has at least [`MIN_DISPLAY_SLOTS`] non-rest slots
/// followed by a single rest slot.
#[must_use]
pub const fn display_len(non_rest: usize) -> usize {
    if non_rest > MIN_DISPLAY_SLOTS {
        non_rest + 1
    } else {
        MIN_DISPLAY_SLOTS + 1
    }
}

/// Returns true if `non_rest` is an accepted non-rest field count.
#[must_use]
pub const fn is_valid_non_rest(non_rest: usize) -> bool {
    non_rest == 0 || non_rest >= MIN_DISPLAY_SLOTS
}

/// One event as seen by a viewer.
///
/// Records are reused between callback invocations of a pass, so callbacks
/// receive them by reference and must copy out whatever they keep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Event name, `None` for the truncation sentinel
    event_name: Option<String>,
    /// Owning process name
    process_name: String,
    /// Milliseconds relative to the collection origin
    timestamp_relative_msec: f64,
    /// Non-rest slots followed by the rest slot
    display_fields: Box<[String]>,
}

impl EventRecord {
    /// Creates an empty record with a display array sized for `non_rest`.
    #[must_use]
    pub fn new(non_rest: usize) -> Self {
        Self {
            event_name: None,
            process_name: String::new(),
            timestamp_relative_msec: 0.0,
            display_fields: vec![String::new(); display_len(non_rest)].into_boxed_slice(),
        }
    }

    /// The event name, `None` if this is the truncation sentinel.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    /// Returns true if this record marks a pass truncated by the count cap.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.event_name.is_none()
    }

    /// The owning process name.
    #[must_use]
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Timestamp in milliseconds relative to the collection origin.
    #[must_use]
    pub const fn timestamp_relative_msec(&self) -> f64 {
        self.timestamp_relative_msec
    }

    /// All display slots, the rest slot last.
    #[must_use]
    pub fn display_fields(&self) -> &[String] {
        &self.display_fields
    }

    /// The non-rest display slot at `index`.
    #[must_use]
    pub fn display_field(&self, index: usize) -> Option<&str> {
        self.display_fields[..self.rest_index()]
            .get(index)
            .map(String::as_str)
    }

    /// The rest slot: every remaining column as `name=value` pairs.
    #[must_use]
    pub fn rest(&self) -> &str {
        &self.display_fields[self.rest_index()]
    }

    fn rest_index(&self) -> usize {
        self.display_fields.len() - 1
    }

    /// Copies identity from `raw`, reusing existing allocations.
    pub(crate) fn load<R: RawRecord + ?Sized>(&mut self, raw: &R) {
        let name = self.event_name.get_or_insert_with(String::new);
        name.clear();
        name.push_str(raw.event_name());
        self.process_name.clear();
        self.process_name.push_str(raw.process_name());
        self.timestamp_relative_msec = raw.timestamp_relative_msec();
    }

    /// Turns this record into the truncation sentinel.
    pub(crate) fn load_sentinel(&mut self, timestamp_relative_msec: f64) {
        self.event_name = None;
        self.process_name.clear();
        self.timestamp_relative_msec = timestamp_relative_msec;
        for slot in self.display_fields.iter_mut() {
            slot.clear();
        }
    }

    pub(crate) fn display_fields_mut(&mut self) -> &mut [String] {
        &mut self.display_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 5 ; "all columns in rest")]
    #[test_case(4, 5 ; "default")]
    #[test_case(6, 7 ; "wide")]
    fn display_len_has_one_rest_slot(non_rest: usize, expected: usize) {
        assert_eq!(display_len(non_rest), expected);
    }

    #[test_case(0, true)]
    #[test_case(1, false)]
    #[test_case(3, false)]
    #[test_case(4, true)]
    #[test_case(9, true)]
    fn non_rest_validity(non_rest: usize, valid: bool) {
        assert_eq!(is_valid_non_rest(non_rest), valid);
    }

    #[test]
    fn new_record_is_blank() {
        let record = EventRecord::new(DEFAULT_NON_REST_FIELDS);
        assert_eq!(record.display_fields().len(), 5);
        assert!(record.is_sentinel());
        assert_eq!(record.rest(), "");
        assert_eq!(record.display_field(3), Some(""));
        assert_eq!(record.display_field(4), None);
    }

    #[test]
    fn sentinel_clears_slots_and_keeps_length() {
        let mut record = EventRecord::new(4);
        record.event_name = Some("Alloc".to_string());
        record.process_name = "app".to_string();
        record.display_fields_mut()[0] = "x".to_string();
        record.display_fields_mut()[4] = "a=b".to_string();

        record.load_sentinel(42.0);

        assert!(record.is_sentinel());
        assert_eq!(record.event_name(), None);
        assert_eq!(record.process_name(), "");
        assert!((record.timestamp_relative_msec() - 42.0).abs() < f64::EPSILON);
        assert_eq!(record.display_fields().len(), 5);
        assert!(record.display_fields().iter().all(String::is_empty));
    }

    #[test]
    fn record_serializes_to_json() {
        let record = EventRecord::new(4);
        let json = serde_json::to_value(&record).expect("should serialize");
        assert_eq!(json["event_name"], serde_json::Value::Null);
        assert_eq!(json["display_fields"].as_array().map(Vec::len), Some(5));
    }
}
