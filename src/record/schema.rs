//! # Record Schema
//!
//! The fixed, ordered list of logged fields. A schema defines both the CSV
//! column order and the completeness predicate for a record.

use std::collections::HashSet;

use crate::error::{MonitorError, Result};

/// Name of the synthetic timestamp column
pub const TIME_FIELD: &str = "Time";

/// One logged column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub unit: Option<String>,
}

impl SchemaField {
    /// Create a field with an optional unit label
    pub fn new(name: impl Into<String>, unit: Option<&str>) -> Self {
        Self {
            name: name.into(),
            unit: unit.map(str::to_string),
        }
    }

    /// Header label: `name [unit]`, or the bare name when no unit is defined
    pub fn column_label(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} [{}]", self.name, unit),
            None => self.name.clone(),
        }
    }
}

/// Required-field schema
///
/// The `Time` column is always the first column and is never part of the
/// measured fields: it is stamped when a record completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<SchemaField>,
    requires_end_marker: bool,
}

impl Schema {
    /// Build a schema from the measured (non-Time) fields, in column order
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No field is given
    /// - A field name is empty or duplicated
    /// - A field is named `Time`
    pub fn new(fields: Vec<SchemaField>) -> Result<Self> {
        if fields.is_empty() {
            return Err(MonitorError::Config(
                "schema needs at least one required field".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(MonitorError::Config("field name cannot be empty".to_string()));
            }
            if field.name == TIME_FIELD {
                return Err(MonitorError::Config(format!(
                    "'{}' is reserved for the timestamp column",
                    TIME_FIELD
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(MonitorError::Config(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        Ok(Self {
            fields,
            requires_end_marker: false,
        })
    }

    /// Also require the end-of-block marker before a record counts as complete
    pub fn with_end_marker(mut self, required: bool) -> Self {
        self.requires_end_marker = required;
        self
    }

    /// Measured fields in column order (without `Time`)
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn requires_end_marker(&self) -> bool {
        self.requires_end_marker
    }

    /// CSV header row: `Time` followed by each field label
    pub fn header(&self) -> Vec<String> {
        std::iter::once(TIME_FIELD.to_string())
            .chain(self.fields.iter().map(SchemaField::column_label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co2_schema() -> Schema {
        Schema::new(vec![
            SchemaField::new("Temperature", Some("deg C")),
            SchemaField::new("CO2", Some("ppm")),
        ])
        .unwrap()
    }

    #[test]
    fn test_header_labels() {
        assert_eq!(
            co2_schema().header(),
            vec!["Time", "Temperature [deg C]", "CO2 [ppm]"]
        );
    }

    #[test]
    fn test_header_omits_missing_unit() {
        let schema = Schema::new(vec![SchemaField::new("Count", None)]).unwrap();
        assert_eq!(schema.header(), vec!["Time", "Count"]);
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(Schema::new(vec![]), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = Schema::new(vec![
            SchemaField::new("CO2", Some("ppm")),
            SchemaField::new("CO2", None),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_time_field_reserved() {
        let result = Schema::new(vec![SchemaField::new("Time", None)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_end_marker_flag() {
        let schema = co2_schema();
        assert!(!schema.requires_end_marker());
        assert!(schema.with_end_marker(true).requires_end_marker());
    }
}
