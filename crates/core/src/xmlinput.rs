//! Lookup XML input conversion
//!
//! Consistency-check exports arrive as XML with one `<record>` per
//! holding, carrying the control number in `<ocn>` and the local
//! identifier in `<localid><sb>`. The lookup flow works on tab-separated
//! lines, so the XML is converted up front; records missing either value
//! are dropped.

use bibops_domain::errors::BibopsError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Convert a lookup XML document into `local_id<TAB>control_number`
/// lines, in document order.
///
/// # Errors
/// Returns `BibopsError::Input` when the document is not well-formed.
pub fn lookup_lines_from_xml(xml: &str) -> Result<Vec<String>, BibopsError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut lines = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut ocn: Option<String> = None;
    let mut local_id: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"record" {
                    ocn = None;
                    local_id = None;
                }
                path.push(name);
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| BibopsError::Input(format!("malformed lookup XML: {e}")))?
                    .trim()
                    .to_string();
                if value.is_empty() {
                    continue;
                }
                match path.last().map(Vec::as_slice) {
                    Some(b"ocn") => ocn = Some(value),
                    Some(b"sb") if path.iter().any(|n| n == b"localid") => {
                        local_id = Some(value);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"record" {
                    if let (Some(id), Some(number)) = (local_id.take(), ocn.take()) {
                        lines.push(format!("{id}\t{number}"));
                    }
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(BibopsError::Input(format!("malformed lookup XML: {e}")));
            }
            Ok(_) => {}
        }
    }
    Ok(lines)
}
