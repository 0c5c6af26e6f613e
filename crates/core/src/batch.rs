//! Control-number batching and lookup-response mapping
//!
//! Lookup input is one control number per line, either bare or prefixed
//! with a local identifier and a tab. Lines go out in batches of up to
//! 100 per request; the response is keyed by the requested number and
//! mapped back to the input lines regardless of response order.

use std::collections::HashMap;

use bibops_domain::errors::BibopsError;
use bibops_domain::types::{CurrentStatus, WorkUnit};
use serde::Deserialize;

/// One parsed lookup input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcnLine {
    /// The trimmed input line as written.
    pub raw: String,
    /// Local identifier, when the line is `local_id<TAB>control_number`.
    pub local_id: Option<String>,
    /// The control number to look up.
    pub control_number: String,
}

/// Parse one input line: bare digits, or `local_id<TAB>control_number`.
///
/// # Errors
/// Returns `BibopsError::Input` for lines that fit neither shape.
pub fn parse_line(line: &str) -> Result<OcnLine, BibopsError> {
    let raw = line.trim();
    if raw.chars().all(|c| c.is_ascii_digit()) && !raw.is_empty() {
        return Ok(OcnLine {
            raw: raw.to_string(),
            local_id: None,
            control_number: raw.to_string(),
        });
    }
    let mut parts = raw.split('\t');
    match (parts.next(), parts.next()) {
        (Some(local_id), Some(number)) if !number.trim().is_empty() => Ok(OcnLine {
            raw: raw.to_string(),
            local_id: Some(local_id.trim().to_string()),
            control_number: number.trim().to_string(),
        }),
        _ => Err(BibopsError::Input(format!("malformed lookup line: {raw:?}"))),
    }
}

/// Group trimmed, non-empty input lines into batch units of `size`.
#[must_use]
pub fn to_batches(lines: &[String], size: usize) -> Vec<WorkUnit> {
    let trimmed: Vec<String> = lines
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    trimmed
        .chunks(size.max(1))
        .map(|chunk| WorkUnit::Batch { lines: chunk.to_vec() })
        .collect()
}

/// The status of one input line after mapping a lookup response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStatus {
    pub line: OcnLine,
    /// `None` when the response carried no entry for the requested
    /// number at all; the caller reports those with the timed-out lines.
    pub status: Option<CurrentStatus>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(rename = "controlNumbers", default)]
    control_numbers: Vec<CurrentEntry>,
}

#[derive(Debug, Deserialize)]
struct CurrentEntry {
    requested: String,
    current: Option<String>,
}

/// Map a lookup response back onto the batch lines, in input order.
///
/// The response entries are keyed by `requested`, so response order does
/// not matter. `current == null` means the record is gone; an equal
/// `current` means unchanged; a different one means the record was
/// merged into the surviving number.
///
/// # Errors
/// Returns `BibopsError::Input` when a line is malformed or the body is
/// not the expected JSON shape.
pub fn map_batch(batch_lines: &[String], body: &str) -> Result<Vec<LineStatus>, BibopsError> {
    let response: CurrentResponse = serde_json::from_str(body)
        .map_err(|e| BibopsError::Input(format!("unparseable lookup response: {e}")))?;

    let by_requested: HashMap<&str, &CurrentEntry> = response
        .control_numbers
        .iter()
        .map(|entry| (entry.requested.as_str(), entry))
        .collect();

    let mut statuses = Vec::with_capacity(batch_lines.len());
    for raw in batch_lines {
        let line = parse_line(raw)?;
        let status = by_requested.get(line.control_number.as_str()).map(|entry| {
            match &entry.current {
                None => CurrentStatus::NotFound,
                Some(current) if *current == entry.requested => CurrentStatus::Unchanged,
                Some(current) => CurrentStatus::Merged(current.clone()),
            }
        });
        statuses.push(LineStatus { line, status });
    }
    Ok(statuses)
}
