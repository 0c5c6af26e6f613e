//! Response classification
//!
//! Orders the checks by precedence: the fatal quota marker first, then
//! the transient auth shapes (which arrive as unstructured HTML or
//! gateway bodies), then the binary success marker, then the structured
//! JSON and XML error documents. Pure function of the body text; the
//! dispatcher acts on the category.

use bibops_domain::constants::{
    AUTH_REQUIRED_MARKER, BAD_GATEWAY_MARKER, FIELD_TERMINATOR, HTML_BODY_MARKER,
    RATE_LIMIT_MARKER,
};
use bibops_domain::types::OutcomeCategory;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

const NOT_FOUND_TYPE: &str = "NOT_FOUND";

/// Classify one decoded response body.
#[must_use]
pub fn classify(body: &str) -> OutcomeCategory {
    if body.contains(RATE_LIMIT_MARKER) {
        return OutcomeCategory::RateLimited;
    }
    if body.contains(AUTH_REQUIRED_MARKER)
        || body.contains(HTML_BODY_MARKER)
        || body.contains(BAD_GATEWAY_MARKER)
    {
        return OutcomeCategory::AuthError;
    }
    // Record flows answer with the record itself; the field terminator
    // never occurs in a JSON or XML error document.
    if body.bytes().any(|b| b == FIELD_TERMINATOR) {
        return OutcomeCategory::Success;
    }
    if let Some(category) = classify_json(body) {
        return category;
    }
    if let Some(category) = classify_xml(body) {
        return category;
    }
    OutcomeCategory::Unknown
}

/// Structured JSON bodies: typed error documents, or the non-record
/// success payloads (validation reports, lookup responses).
fn classify_json(body: &str) -> Option<OutcomeCategory> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    if let Some(error_type) = object.get("type").and_then(Value::as_str) {
        if error_type == NOT_FOUND_TYPE {
            return Some(OutcomeCategory::NotFound);
        }
        return Some(OutcomeCategory::BadRequest);
    }

    // Validation and lookup flows answer with JSON rather than a record.
    if object.contains_key("status")
        || object.contains_key("validationErrors")
        || object.contains_key("controlNumbers")
    {
        return Some(OutcomeCategory::Success);
    }
    None
}

/// Structured XML error documents carry their category in a `type`
/// element, e.g. `<type>BAD_REQUEST</type>`.
fn classify_xml(body: &str) -> Option<OutcomeCategory> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut in_type = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"type" => in_type = true,
            Ok(Event::Text(text)) if in_type => {
                let error_type = text.unescape().ok()?;
                return Some(if error_type == NOT_FOUND_TYPE {
                    OutcomeCategory::NotFound
                } else {
                    OutcomeCategory::BadRequest
                });
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"type" => in_type = false,
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}
