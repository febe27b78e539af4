//! Projection of raw record fields onto display slots.
//!
//! The first `non_rest` resolved columns get one slot each. Every remaining
//! column is rendered into the final "rest" slot as `name=value` pairs, in
//! resolved order, with absent fields rendered as `name=` so the layout is
//! stable across records with sparse fields.

use std::fmt::Write as _;

use crate::record::display_len;
use crate::traits::RawRecord;

/// Separator between `name=value` pairs in the rest slot.
pub const REST_SEPARATOR: char = ' ';

/// Projects `record` into a freshly allocated display array.
#[must_use]
pub fn project<R: RawRecord + ?Sized>(
    record: &R,
    columns: &[String],
    non_rest: usize,
) -> Vec<String> {
    let mut out = vec![String::new(); display_len(non_rest)];
    project_into(record, columns, non_rest, &mut out);
    out
}

/// Projects `record` into an existing display array, overwriting every slot.
///
/// The last element of `out` is the rest slot. Slots between the configured
/// non-rest count and the rest slot, and non-rest slots without a column,
/// are left empty.
pub fn project_into<R: RawRecord + ?Sized>(
    record: &R,
    columns: &[String],
    non_rest: usize,
    out: &mut [String],
) {
    let Some((rest, slots)) = out.split_last_mut() else {
        return;
    };

    let split = non_rest.min(columns.len()).min(slots.len());
    for (index, slot) in slots.iter_mut().enumerate() {
        slot.clear();
        if index < split {
            if let Some(value) = record.field(&columns[index]) {
                slot.push_str(&value);
            }
        }
    }

    rest.clear();
    for (position, name) in columns[split..].iter().enumerate() {
        if position > 0 {
            rest.push(REST_SEPARATOR);
        }
        let value = record.field(name).unwrap_or_default();
        let _ = write!(rest, "{name}={value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRecord;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn sparse_record() -> MemoryRecord {
        MemoryRecord::new("Alloc", "app", 10.0)
            .with_field("c1", "x")
            .with_field("c2", "y")
            .with_field("c5", "z")
    }

    #[test]
    fn sparse_fields_fill_slots_and_rest() {
        let cols = columns(&["c1", "c2", "c3", "c4", "c5", "c6"]);
        let out = project(&sparse_record(), &cols, 4);
        assert_eq!(out, vec!["x", "y", "", "", "c5=z c6="]);
    }

    #[test]
    fn zero_non_rest_puts_everything_in_rest() {
        let cols = columns(&["c1", "c2", "c3"]);
        let out = project(&sparse_record(), &cols, 0);
        assert_eq!(out, vec!["", "", "", "", "c1=x c2=y c3="]);
    }

    #[test]
    fn fewer_columns_than_slots() {
        let cols = columns(&["c2"]);
        let out = project(&sparse_record(), &cols, 4);
        assert_eq!(out, vec!["y", "", "", "", ""]);
    }

    #[test]
    fn wide_non_rest_count() {
        let cols = columns(&["c1", "c2", "c3", "c4", "c5", "c6"]);
        let out = project(&sparse_record(), &cols, 5);
        assert_eq!(out, vec!["x", "y", "", "", "z", "c6="]);
    }

    #[test]
    fn projection_overwrites_reused_array() {
        let cols = columns(&["c1", "c9"]);
        let mut out = vec!["stale".to_string(); 5];
        project_into(&sparse_record(), &cols, 4, &mut out);
        assert_eq!(out, vec!["x", "", "", "", ""]);
    }

    #[test]
    fn projection_is_idempotent() {
        let cols = columns(&["c5", "c1", "c2", "c3", "c4", "c6"]);
        let record = sparse_record();
        let mut reused = vec![String::new(); 5];
        project_into(&record, &cols, 4, &mut reused);
        let first = reused.clone();
        project_into(&record, &cols, 4, &mut reused);
        assert_eq!(first, reused);
        assert_eq!(first, project(&record, &cols, 4));
    }

    #[test]
    fn empty_output_is_ignored() {
        let cols = columns(&["c1"]);
        let mut out: Vec<String> = Vec::new();
        project_into(&sparse_record(), &cols, 4, &mut out);
        assert!(out.is_empty());
    }
}
