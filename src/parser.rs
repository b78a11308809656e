//! # Line Parser
//!
//! Stateless extraction of named numeric fields from one line of sensor
//! output.
//!
//! All field rules are joined into a single alternation that is evaluated
//! once per line. The leftmost match wins (ties go to the earlier rule), so a
//! line yields at most one field: the device streams one measurement per
//! line and a record is assembled over several lines.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use crate::error::{MonitorError, Result};

/// Pattern fragment for a plain decimal number
pub const NUMBER_PATTERN: &str = "([0-9.]+)";

/// One (field name, pattern) rule
///
/// The pattern must contain exactly one capture group, holding the number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub pattern: String,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }

    /// Rule for lines of the form `<label>: <number>`
    pub fn labelled(name: impl Into<String>, label: &str) -> Self {
        Self::new(name, format!("{}: {}", regex::escape(label), NUMBER_PATTERN))
    }
}

/// Fields extracted from a single line
///
/// Empty when the line matched nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialExtraction {
    values: BTreeMap<String, f64>,
    end_of_block: bool,
}

impl PartialExtraction {
    /// Extraction carrying one field
    pub fn field(name: impl Into<String>, value: f64) -> Self {
        let mut values = BTreeMap::new();
        values.insert(name.into(), value);
        Self {
            values,
            end_of_block: false,
        }
    }

    /// Extraction for an end-of-block marker line
    pub fn end_marker() -> Self {
        Self {
            values: BTreeMap::new(),
            end_of_block: true,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && !self.end_of_block
    }

    /// Whether this line was the end-of-block marker
    pub fn end_of_block(&self) -> bool {
        self.end_of_block
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Compiled rule set
#[derive(Debug, Clone)]
pub struct LineParser {
    combined: Regex,
    names: Vec<String>,
    has_end_marker: bool,
}

impl LineParser {
    /// Compile the rules (and optional literal end marker) into one pattern
    ///
    /// # Errors
    ///
    /// Returns error if a pattern does not compile or does not have exactly
    /// one capture group, or if no rule is given.
    pub fn new(rules: &[FieldRule], end_marker: Option<&str>) -> Result<Self> {
        if rules.is_empty() {
            return Err(MonitorError::Config("at least one field rule is required".to_string()));
        }

        let mut alternatives = Vec::with_capacity(rules.len() + 1);
        for rule in rules {
            let compiled = Regex::new(&rule.pattern)?;
            // captures_len() counts the implicit whole-match group
            if compiled.captures_len() != 2 {
                return Err(MonitorError::Config(format!(
                    "pattern for '{}' must have exactly one capture group: {}",
                    rule.name, rule.pattern
                )));
            }
            alternatives.push(format!("(?:{})", rule.pattern));
        }

        if let Some(marker) = end_marker {
            alternatives.push(format!("({})", regex::escape(marker)));
        }

        Ok(Self {
            combined: Regex::new(&alternatives.join("|"))?,
            names: rules.iter().map(|rule| rule.name.clone()).collect(),
            has_end_marker: end_marker.is_some(),
        })
    }

    /// Extract at most one field from `line`
    pub fn parse(&self, line: &str) -> PartialExtraction {
        let Some(captures) = self.combined.captures(line) else {
            return PartialExtraction::default();
        };

        for (index, name) in self.names.iter().enumerate() {
            if let Some(number) = captures.get(index + 1) {
                return match number.as_str().parse::<f64>() {
                    Ok(value) => PartialExtraction::field(name.clone(), value),
                    Err(e) => {
                        debug!("Ignoring unparseable {} value {:?}: {}", name, number.as_str(), e);
                        PartialExtraction::default()
                    }
                };
            }
        }

        if self.has_end_marker && captures.get(self.names.len() + 1).is_some() {
            return PartialExtraction::end_marker();
        }

        PartialExtraction::default()
    }

    /// Field names in rule order
    pub fn field_names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co2_rules() -> Vec<FieldRule> {
        vec![
            FieldRule::labelled("Temperature", "Temperature"),
            FieldRule::labelled("Relative Humidity", "Relative Humidity"),
            FieldRule::labelled("CO2", "CO2"),
        ]
    }

    fn parser() -> LineParser {
        LineParser::new(&co2_rules(), None).unwrap()
    }

    #[test]
    fn test_single_field_lines() {
        let parser = parser();

        let temp = parser.parse("Temperature: 21.5");
        assert_eq!(temp.len(), 1);
        assert_eq!(temp.get("Temperature"), Some(21.5));

        let rh = parser.parse("Relative Humidity: 40.0\r\n");
        assert_eq!(rh.len(), 1);
        assert_eq!(rh.get("Relative Humidity"), Some(40.0));

        let co2 = parser.parse("CO2: 412.3");
        assert_eq!(co2.len(), 1);
        assert_eq!(co2.get("CO2"), Some(412.3));
    }

    #[test]
    fn test_unmatched_line_is_empty() {
        let parser = parser();
        assert!(parser.parse("SCD30 booting...").is_empty());
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("Pressure: 1013.2").is_empty());
    }

    #[test]
    fn test_at_most_one_field_per_line() {
        let parser = parser();
        let extraction = parser.parse("CO2: 400.0 Temperature: 22.0");
        assert_eq!(extraction.len(), 1);
        // Leftmost match wins
        assert_eq!(extraction.get("CO2"), Some(400.0));
        assert_eq!(extraction.get("Temperature"), None);
    }

    #[test]
    fn test_match_inside_noise() {
        let extraction = parser().parse("[12:00:01] Temperature: 19.25 (sensor 1)");
        assert_eq!(extraction.get("Temperature"), Some(19.25));
    }

    #[test]
    fn test_unparseable_number_is_ignored() {
        assert!(parser().parse("CO2: .").is_empty());
        assert!(parser().parse("CO2: 1.2.3").is_empty());
    }

    #[test]
    fn test_end_marker() {
        let parser = LineParser::new(&co2_rules(), Some("Data end")).unwrap();
        let extraction = parser.parse("Data end\r\n");
        assert!(extraction.end_of_block());
        assert_eq!(extraction.len(), 0);
        assert!(!extraction.is_empty());

        assert!(!parser.parse("CO2: 401").end_of_block());
    }

    #[test]
    fn test_end_marker_ignored_when_not_configured() {
        assert!(parser().parse("Data end").is_empty());
    }

    #[test]
    fn test_pattern_without_capture_group_rejected() {
        let rules = vec![FieldRule::new("CO2", "CO2: [0-9.]+")];
        assert!(matches!(LineParser::new(&rules, None), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_pattern_with_two_groups_rejected() {
        let rules = vec![FieldRule::new("CO2", "(CO2): ([0-9.]+)")];
        assert!(LineParser::new(&rules, None).is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let rules = vec![FieldRule::new("CO2", "CO2: ([0-9.]+")];
        assert!(matches!(LineParser::new(&rules, None), Err(MonitorError::Pattern(_))));
    }

    #[test]
    fn test_empty_rules_rejected() {
        assert!(LineParser::new(&[], None).is_err());
    }

    #[test]
    fn test_custom_pattern() {
        let rules = vec![FieldRule::new("CO2", r"co2=(\d+(?:\.\d+)?)ppm")];
        let parser = LineParser::new(&rules, None).unwrap();
        assert_eq!(parser.parse("co2=415ppm").get("CO2"), Some(415.0));
        assert_eq!(parser.field_names(), &["CO2".to_string()]);
    }
}
