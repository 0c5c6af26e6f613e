//! Validation-report aggregation
//!
//! The validate flow appends one `{identifier, response}` envelope per
//! record to a JSON collection. Report mode reads the collection back,
//! pulls the per-record validation errors for invalid bibs, and buckets
//! them by `(errorLevel, tag, message)` for the statistics outputs.

use std::collections::HashMap;

use bibops_domain::constants::RATE_LIMIT_MARKER;
use bibops_domain::errors::BibopsError;
use bibops_domain::types::ErrorKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const INVALID_BIB_MARKER: &str = "The provided Bib is invalid";
const MISSING_001_MESSAGE: &str = "001 must be present.";

/// One stored validation result: the record's identifier plus the raw
/// API response document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEnvelope {
    pub identifier: String,
    pub response: Value,
}

/// Parse a stored validation response collection.
///
/// # Errors
/// Returns `BibopsError::Input` when the text is not a JSON array of
/// envelopes.
pub fn parse_collection(text: &str) -> Result<Vec<ValidationEnvelope>, BibopsError> {
    serde_json::from_str(text)
        .map_err(|e| BibopsError::Input(format!("unparseable validation collection: {e}")))
}

/// Aggregated view of a validation response collection.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// One line per validation error: `identifier|level|tag|message`.
    pub report_lines: Vec<String>,
    /// One line per valid bib: `identifier|description`.
    pub valid_lines: Vec<String>,
    error_counts: HashMap<ErrorKey, usize>,
    csv_counts: HashMap<(String, String), usize>,
}

impl ValidationReport {
    /// Total number of individual error lines across all records.
    /// Always equals the sum of the statistics counts.
    #[must_use]
    pub fn total_error_lines(&self) -> usize {
        self.report_lines.len()
    }

    /// Statistics lines `count|level|tag|message`, sorted by descending
    /// count, then ascending key.
    #[must_use]
    pub fn stats_lines(&self) -> Vec<String> {
        let mut entries: Vec<(String, usize)> = self
            .error_counts
            .iter()
            .map(|(key, count)| (key.to_string(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.into_iter().map(|(key, count)| format!("{count}|{key}")).collect()
    }

    /// CSV statistics, bucketed by `(level, message)` only, with header.
    #[must_use]
    pub fn csv_lines(&self) -> Vec<String> {
        let mut entries: Vec<(String, usize)> = self
            .csv_counts
            .iter()
            .map(|((level, message), count)| (format!("\"{level}\"\t\"{message}\""), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut lines = vec!["\"ErrorOccurrence\"\t\"ErrorLevel\"\t\"ErrorMessage\"".to_string()];
        lines.extend(entries.into_iter().map(|(key, count)| format!("\"{count}\"\t{key}")));
        lines
    }

    fn record_error(&mut self, identifier: &str, key: ErrorKey) {
        self.report_lines.push(format!("{identifier}|{key}"));
        self.csv_counts
            .entry((key.level.clone(), key.message.clone()))
            .and_modify(|c| *c += 1)
            .or_insert(1);
        self.error_counts.entry(key).and_modify(|c| *c += 1).or_insert(1);
    }
}

/// Aggregate a collection of stored validation responses.
#[must_use]
pub fn aggregate(envelopes: &[ValidationEnvelope]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for envelope in envelopes {
        let response = &envelope.response;
        let identifier = envelope.identifier.as_str();

        // A stored quota response carries no validation result.
        if let Some(message) = response.get("message").and_then(Value::as_str) {
            if message.contains(RATE_LIMIT_MARKER) {
                debug!(identifier, "skipping rate-limited validation response");
                continue;
            }
        }

        let description = response
            .pointer("/status/description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if description.is_empty() {
            debug!(identifier, "validation response without status description");
            continue;
        }

        if !description.contains(INVALID_BIB_MARKER) {
            report.valid_lines.push(format!("{identifier}|{description}"));
            continue;
        }

        let errors = response.get("validationErrors").cloned().unwrap_or_default();
        let summary: Vec<String> = string_array(errors.get("errors"));
        // errorCount arrives as a number or a numeric string.
        let error_count = errors
            .get("errorCount")
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or_default();

        // A record whose only failure is the missing 001 still counts as
        // usable: the control number is supplied by the add flow.
        if error_count == 1 && summary.iter().any(|m| m.contains(MISSING_001_MESSAGE)) {
            let message = summary.first().cloned().unwrap_or_default();
            report.valid_lines.push(format!("{identifier}|{message}"));
            continue;
        }

        for section in ["recordLevelErrors", "fixedFieldErrors", "variableFieldErrors"] {
            let Some(entries) = errors.get(section).and_then(Value::as_array) else {
                continue;
            };
            for entry in entries {
                let field = |name: &str| {
                    entry.get(name).and_then(Value::as_str).unwrap_or_default().to_string()
                };
                report.record_error(
                    identifier,
                    ErrorKey {
                        level: field("errorLevel"),
                        tag: field("tag"),
                        message: field("message"),
                    },
                );
            }
        }
    }

    report
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}
