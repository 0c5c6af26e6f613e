//! Flow front ends
//!
//! One module per subcommand. Each is the same thin shape: check the
//! input files, build the work units, open the run's output set, and
//! hand everything to the shared run loop with a flow-specific sink.

pub mod add;
pub mod current;
pub mod delete_lhr;
pub mod replace;
pub mod replace_lhr;
pub mod validate;

use std::path::Path;

use bibops_domain::errors::BibopsError;
use bibops_domain::types::Outcome;
use bibops_infra::{suffix, OutputSet};
use serde_json::Value;

/// Reject inputs with the wrong extension before touching the network.
pub fn require_extension(path: &Path, allowed: &[&str]) -> Result<(), BibopsError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if allowed.iter().any(|a| *a == extension) {
        Ok(())
    } else {
        Err(BibopsError::Input(format!(
            "{}: expected a .{} file",
            path.display(),
            allowed.join(" or .")
        )))
    }
}

/// Wrap a response body with its record's identifier for the JSON
/// collection files. Bodies that parse as JSON are stored structured;
/// anything else is kept as a string.
#[must_use]
pub fn response_envelope(outcome: &Outcome) -> Value {
    let response = serde_json::from_str(&outcome.payload)
        .unwrap_or_else(|_| Value::String(outcome.payload.clone()));
    serde_json::json!({ "identifier": outcome.identifier, "response": response })
}

/// Append one outcome to the run's log file.
pub fn log_outcome(files: &mut OutputSet, outcome: &Outcome) -> Result<(), BibopsError> {
    files.append_line(
        suffix::LOG,
        &format!("{}|{}|{}", outcome.identifier, outcome.category, outcome.payload),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibops_domain::types::OutcomeCategory;

    /// Extension checks are case-insensitive and name the expectation.
    #[test]
    fn test_require_extension() {
        assert!(require_extension(Path::new("a.mrc"), &["mrc"]).is_ok());
        assert!(require_extension(Path::new("a.MRC"), &["mrc"]).is_ok());
        assert!(require_extension(Path::new("a.txt"), &["txt", "xml"]).is_ok());
        assert!(require_extension(Path::new("a.json"), &["mrc"]).is_err());
        assert!(require_extension(Path::new("noext"), &["mrc"]).is_err());
    }

    /// JSON bodies are stored structured, other bodies as strings.
    #[test]
    fn test_response_envelope() {
        let json = Outcome::new("1", OutcomeCategory::Success, r#"{"ok":true}"#);
        let envelope = response_envelope(&json);
        assert_eq!(envelope["identifier"], "1");
        assert_eq!(envelope["response"]["ok"], true);

        let marc = Outcome::new("2", OutcomeCategory::Success, "leader\u{1e}data\u{1e}");
        let envelope = response_envelope(&marc);
        assert!(envelope["response"].is_string());
    }
}
