//! # Record Accumulator
//!
//! Pure operations over a [`Record`]. The running record lives in the
//! acquisition loop and is threaded through these functions by value.

use super::{Record, Schema};
use crate::parser::PartialExtraction;

/// Overlay `partial` onto `record`; values from `partial` win on collision
///
/// The end-of-block flag always reflects the latest merged line.
pub fn merge(mut record: Record, partial: &PartialExtraction) -> Record {
    for (name, value) in partial.iter() {
        record.values.insert(name.to_string(), value);
    }
    record.end_of_block = partial.end_of_block();
    record
}

/// True once every schema field is present (`Time` is stamped later), and the
/// last line was the end marker when the schema requires one
pub fn is_complete(record: &Record, schema: &Schema) -> bool {
    let fields_present = schema
        .fields()
        .iter()
        .all(|field| record.contains(&field.name));

    fields_present && (!schema.requires_end_marker() || record.end_of_block)
}

/// Fresh empty record
pub fn reset() -> Record {
    Record::new()
}
