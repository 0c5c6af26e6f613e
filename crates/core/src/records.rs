//! MARC21 stream splitting and identifier extraction
//!
//! A `.mrc` file is a run of ISO 2709 records, each terminated by the
//! group separator. Identifiers are pulled straight from the record bytes
//! without parsing the leader or directory: the 001 data sits between the
//! first two field terminators, and local holdings numbers sit in an
//! institution-tagged subfield pair.

use bibops_domain::constants::{FIELD_TERMINATOR, GROUP_SEPARATOR};
use bibops_domain::errors::BibopsError;
use bibops_domain::types::WorkUnit;
use regex::bytes::Regex;

/// How to derive the display identifier from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierRule {
    /// Data of the first variable field (the 001 control number).
    ControlField,
    /// Digits of the `$a{SYMBOL}$b<number>` subfield pair, as used in
    /// local holdings records.
    LocalSubfield {
        /// Institution symbol expected in subfield `$a`.
        symbol: String,
    },
}

/// Splits record streams and stamps each record with its identifier.
#[derive(Debug)]
pub struct RecordSource {
    rule: IdentifierRule,
    subfield_pattern: Option<Regex>,
}

impl RecordSource {
    /// Build a source for the given identifier rule.
    ///
    /// # Errors
    /// Returns `BibopsError::Input` when the institution symbol does not
    /// compile into the subfield pattern.
    pub fn new(rule: IdentifierRule) -> Result<Self, BibopsError> {
        let subfield_pattern = match &rule {
            IdentifierRule::ControlField => None,
            IdentifierRule::LocalSubfield { symbol } => {
                let pattern =
                    format!(r"\x1fa{}\x1fb(\d+X?)", regex::escape(symbol));
                Some(Regex::new(&pattern).map_err(|e| {
                    BibopsError::Input(format!(
                        "invalid identifier pattern for symbol {symbol}: {e}"
                    ))
                })?)
            }
        };
        Ok(Self { rule, subfield_pattern })
    }

    /// Split a `.mrc` byte stream into work units, one per record, each
    /// carrying its extracted identifier (or `None` when extraction
    /// failed; such units surface as `Unknown` instead of being sent).
    #[must_use]
    pub fn units(&self, data: &[u8]) -> Vec<WorkUnit> {
        split_records(data)
            .into_iter()
            .map(|record| WorkUnit::Record {
                identifier: self.identifier(record),
                bytes: record.to_vec(),
            })
            .collect()
    }

    /// Extract the identifier from one record per the configured rule.
    #[must_use]
    pub fn identifier(&self, record: &[u8]) -> Option<String> {
        match &self.rule {
            IdentifierRule::ControlField => control_field_data(record),
            IdentifierRule::LocalSubfield { .. } => {
                let pattern = self.subfield_pattern.as_ref()?;
                pattern.captures(record).and_then(|caps| {
                    caps.get(1).map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
                })
            }
        }
    }
}

/// Split a byte stream on the group separator, dropping the single empty
/// (or whitespace) tail that follows the final record's terminator. Any
/// other whitespace-only segment is kept: it is a malformed record and
/// must surface as a unit instead of disappearing.
#[must_use]
pub fn split_records(data: &[u8]) -> Vec<&[u8]> {
    let mut records: Vec<&[u8]> =
        data.split(|&b| b == GROUP_SEPARATOR).collect();
    if records.last().is_some_and(|last| last.iter().all(u8::is_ascii_whitespace)) {
        records.pop();
    }
    records
}

/// The data of the first variable field: bytes between the first and
/// second field terminators. In a well-formed MARC21 record that field
/// is the 001 control number.
fn control_field_data(record: &[u8]) -> Option<String> {
    let mut fields = record.split(|&b| b == FIELD_TERMINATOR);
    fields.next()?;
    let data = fields.next()?;
    let text = String::from_utf8_lossy(data).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GS: u8 = 0x1D;
    const FT: u8 = 0x1E;

    fn record(control_number: &str) -> Vec<u8> {
        let mut bytes = b"00123nam a2200061   4500".to_vec();
        bytes.push(FT);
        bytes.extend_from_slice(control_number.as_bytes());
        bytes.push(FT);
        bytes.extend_from_slice(b"  \x1faocm text");
        bytes.push(FT);
        bytes
    }

    fn stream(records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        for r in records {
            out.extend_from_slice(r);
            out.push(GS);
        }
        out
    }

    /// Splitting drops the empty tail after the final group separator but
    /// keeps every record, including ones with odd content.
    #[test]
    fn test_split_drops_trailing_tail() {
        let data = stream(&[record("111"), record("222"), record("333")]);
        let records = split_records(&data);
        assert_eq!(records.len(), 3);

        // A trailing newline after the last separator is still a tail.
        let mut with_newline = data.clone();
        with_newline.push(b'\n');
        assert_eq!(split_records(&with_newline).len(), 3);
    }

    /// A stream without a trailing separator keeps its last record.
    #[test]
    fn test_split_without_trailing_separator() {
        let mut data = stream(&[record("111")]);
        data.extend_from_slice(&record("222"));
        assert_eq!(split_records(&data).len(), 2);
    }

    /// The 001 data is the bytes between the first two field terminators.
    #[test]
    fn test_control_field_identifier() {
        let source = RecordSource::new(IdentifierRule::ControlField).unwrap();
        assert_eq!(source.identifier(&record("990524156")), Some("990524156".into()));
    }

    /// A record with no second field terminator yields no identifier,
    /// and its unit carries `identifier: None`.
    #[test]
    fn test_missing_control_field() {
        let source = RecordSource::new(IdentifierRule::ControlField).unwrap();
        assert_eq!(source.identifier(b"just a leader, no fields"), None);

        let data = stream(&[b"broken".to_vec()]);
        let units = source.units(&data);
        assert_eq!(units.len(), 1);
        assert!(matches!(&units[0], WorkUnit::Record { identifier: None, .. }));
    }

    /// The local subfield rule matches `$a{SYMBOL}$b<digits>` with an
    /// optional trailing X check digit.
    #[test]
    fn test_local_subfield_identifier() {
        let source = RecordSource::new(IdentifierRule::LocalSubfield { symbol: "QGK".into() })
            .unwrap();

        let record = b"leader\x1e  \x1faQGK\x1fb40401157X\x1e".to_vec();
        assert_eq!(source.identifier(&record), Some("40401157X".into()));

        let plain = b"leader\x1e  \x1faQGK\x1fb123456\x1e".to_vec();
        assert_eq!(source.identifier(&plain), Some("123456".into()));

        // Wrong symbol: no identifier.
        let other = b"leader\x1e  \x1faABC\x1fb123456\x1e".to_vec();
        assert_eq!(source.identifier(&other), None);
    }

    /// Only the tail after the final separator is dropped; a
    /// whitespace-only segment between separators is a malformed record
    /// and surfaces as a unit without an identifier.
    #[test]
    fn test_whitespace_segment_between_separators_kept() {
        let mut data = stream(&[record("111")]);
        data.extend_from_slice(b"  \n");
        data.push(GS);
        assert_eq!(split_records(&data).len(), 2);

        let source = RecordSource::new(IdentifierRule::ControlField).unwrap();
        let units = source.units(&data);
        assert_eq!(units.len(), 2);
        assert!(matches!(&units[1], WorkUnit::Record { identifier: None, .. }));
    }

    /// Units come back in stream order with their identifiers attached.
    #[test]
    fn test_units_in_order() {
        let source = RecordSource::new(IdentifierRule::ControlField).unwrap();
        let data = stream(&[record("111"), record("222")]);
        let units = source.units(&data);
        let ids: Vec<&str> = units.iter().map(WorkUnit::display_identifier).collect();
        assert_eq!(ids, vec!["111", "222"]);
    }
}
