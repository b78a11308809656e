//! # Record Module
//!
//! Typed records assembled from partial line extractions.
//!
//! This module handles:
//! - The running (incomplete) record state
//! - The required-field schema
//! - Merging, completeness and reset
//! - Stamping a completed record with its capture time

pub mod accumulator;
pub mod schema;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;

pub use schema::{Schema, SchemaField, TIME_FIELD};

/// Record being accumulated across lines
///
/// Values are keyed by field name. Fields outside the schema (for example a
/// tracked-only humidity reading) are kept but never logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, f64>,
    end_of_block: bool,
}

impl Record {
    /// Empty record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the most recently merged line was the end-of-block marker
    pub fn end_of_block(&self) -> bool {
        self.end_of_block
    }

    /// Attach the capture time, producing a loggable record
    pub fn stamp(self, time: NaiveDateTime) -> CompletedRecord {
        CompletedRecord {
            time,
            values: self.values,
        }
    }
}

/// Record that satisfied the schema, stamped at completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRecord {
    pub time: NaiveDateTime,
    values: BTreeMap<String, f64>,
}

impl CompletedRecord {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Console rendering: one `name : value unit` line per schema field,
    /// rounded to two decimals
    pub fn display(&self, schema: &Schema) -> String {
        let mut out = String::new();
        for field in schema.fields() {
            if let Some(value) = self.get(&field.name) {
                let _ = write!(out, "\n{} : {:.2}", field.name, value);
                if let Some(unit) = &field.unit {
                    let _ = write!(out, " {}", unit);
                }
            }
        }

        if out.is_empty() {
            out
        } else {
            format!("--------{}", out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PartialExtraction;
    use chrono::NaiveDate;

    fn schema() -> Schema {
        Schema::new(vec![
            SchemaField::new("Temperature", Some("deg C")),
            SchemaField::new("CO2", Some("ppm")),
        ])
        .unwrap()
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = Record::new();
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
        assert!(!record.end_of_block());
    }

    #[test]
    fn test_stamp_keeps_values() {
        let record = accumulator::merge(Record::new(), &PartialExtraction::field("CO2", 415.25));
        let completed = record.stamp(noon());
        assert_eq!(completed.time, noon());
        assert_eq!(completed.get("CO2"), Some(415.25));
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        let mut record = Record::new();
        record = accumulator::merge(record, &PartialExtraction::field("Temperature", 21.456));
        record = accumulator::merge(record, &PartialExtraction::field("CO2", 412.0));
        record = accumulator::merge(record, &PartialExtraction::field("Relative Humidity", 40.0));

        let text = record.stamp(noon()).display(&schema());
        assert_eq!(text, "--------\nTemperature : 21.46 deg C\nCO2 : 412.00 ppm");
    }

    #[test]
    fn test_display_empty_record() {
        assert_eq!(Record::new().stamp(noon()).display(&schema()), "");
    }
}
