//! Operation specs for the metadata service
//!
//! One value per API operation: method, path shape, headers, and the
//! token scopes the operation needs. `prepare` turns an operation plus a
//! work unit into a concrete request the dispatcher can send repeatedly.

use bibops_domain::errors::BibopsError;
use bibops_domain::types::WorkUnit;
use reqwest::Method;
use url::Url;

use bibops_core::batch::parse_line;

const MARC_CONTENT_TYPE: &str = "application/marc";
const JSON_CONTENT_TYPE: &str = "application/json";

const SCOPE_MANAGE_BIBS: &str = "WorldCatMetadataAPI:manage_bibs";
const SCOPE_VIEW_BRIEF_BIB: &str = "WorldCatMetadataAPI:view_brief_bib";
const SCOPE_MANAGE_LHRS: &str = "WorldCatMetadataAPI:manage_institution_lhrs";

/// The six operations the tool performs against the metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Create a bibliographic record.
    AddBib,
    /// Replace a bibliographic record by control number.
    ReplaceBib,
    /// Validate a bibliographic record without saving it.
    ValidateBib,
    /// Resolve the current control numbers for a batch.
    CurrentOcns,
    /// Delete a local holdings record by control number.
    DeleteLhr,
    /// Replace a local holdings record by control number.
    ReplaceLhr,
}

impl OperationKind {
    /// Short name used in output file naming.
    #[must_use]
    pub fn command_name(self) -> &'static str {
        match self {
            Self::AddBib => "addbib",
            Self::ReplaceBib => "replacebib",
            Self::ValidateBib => "validatebib",
            Self::CurrentOcns => "bibcurrentocn",
            Self::DeleteLhr => "lhrdelete",
            Self::ReplaceLhr => "lhrreplace",
        }
    }

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::AddBib | Self::ValidateBib => Method::POST,
            Self::ReplaceBib | Self::ReplaceLhr => Method::PUT,
            Self::CurrentOcns => Method::GET,
            Self::DeleteLhr => Method::DELETE,
        }
    }

    /// Token scopes this operation needs.
    #[must_use]
    pub fn scopes(self) -> &'static [&'static str] {
        match self {
            Self::AddBib | Self::ReplaceBib | Self::ValidateBib => {
                &[SCOPE_MANAGE_BIBS, SCOPE_VIEW_BRIEF_BIB]
            }
            Self::CurrentOcns => &[SCOPE_MANAGE_BIBS],
            Self::DeleteLhr | Self::ReplaceLhr => &[SCOPE_MANAGE_LHRS],
        }
    }

    fn content_type(self) -> Option<&'static str> {
        match self {
            Self::CurrentOcns => None,
            _ => Some(MARC_CONTENT_TYPE),
        }
    }

    fn accept(self) -> Option<&'static str> {
        match self {
            Self::AddBib | Self::ValidateBib => None,
            Self::CurrentOcns => Some(JSON_CONTENT_TYPE),
            Self::ReplaceBib | Self::DeleteLhr | Self::ReplaceLhr => Some(MARC_CONTENT_TYPE),
        }
    }
}

/// A fully-resolved request, ready to send any number of times.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<&'static str>,
    pub accept: Option<&'static str>,
}

/// Resolve an operation against one work unit.
///
/// Record operations substitute the identifier into the path and carry
/// the record bytes; the lookup operation turns its batch lines into
/// repeated `oclcNumbers` query parameters.
///
/// # Errors
/// Returns `BibopsError::Input` when the unit does not fit the
/// operation: a record without an identifier where the path needs one, a
/// malformed batch line, or a batch unit given to a record operation.
pub fn prepare(
    kind: OperationKind,
    base_url: &str,
    unit: &WorkUnit,
) -> Result<PreparedRequest, BibopsError> {
    let url = resolve_url(kind, base_url, unit)?;
    let body = match (kind, unit) {
        (OperationKind::CurrentOcns, WorkUnit::Batch { .. }) => None,
        (OperationKind::CurrentOcns, WorkUnit::Record { .. }) => {
            return Err(BibopsError::Input("lookup needs batch units".into()));
        }
        // Deletions carry no payload: their units are bare identifiers.
        (_, WorkUnit::Record { bytes, .. }) if bytes.is_empty() => None,
        (_, WorkUnit::Record { bytes, .. }) => Some(bytes.clone()),
        (_, WorkUnit::Batch { .. }) => {
            return Err(BibopsError::Input(format!(
                "{} needs record units",
                kind.command_name()
            )));
        }
    };

    Ok(PreparedRequest {
        method: kind.method(),
        url,
        body,
        content_type: kind.content_type(),
        accept: kind.accept(),
    })
}

fn resolve_url(
    kind: OperationKind,
    base_url: &str,
    unit: &WorkUnit,
) -> Result<Url, BibopsError> {
    let base = base_url.trim_end_matches('/');
    let text = match kind {
        OperationKind::AddBib => format!("{base}/manage/bibs"),
        OperationKind::ValidateBib => format!("{base}/manage/bibs/validate/validateFull"),
        OperationKind::ReplaceBib => format!("{base}/manage/bibs/{}", unit_identifier(unit)?),
        OperationKind::DeleteLhr => format!("{base}/manage/lhrs/{}", unit_identifier(unit)?),
        OperationKind::ReplaceLhr => format!("{base}/manage/lhrs/{}", unit_identifier(unit)?),
        OperationKind::CurrentOcns => format!("{base}/manage/bibs/current"),
    };

    let mut url = Url::parse(&text)
        .map_err(|e| BibopsError::Input(format!("invalid service URL {text:?}: {e}")))?;

    if kind == OperationKind::CurrentOcns {
        let WorkUnit::Batch { lines } = unit else {
            return Err(BibopsError::Input("lookup needs batch units".into()));
        };
        if lines.is_empty() {
            return Err(BibopsError::Input("empty lookup batch".into()));
        }
        let mut pairs = url.query_pairs_mut();
        for line in lines {
            pairs.append_pair("oclcNumbers", &parse_line(line)?.control_number);
        }
        drop(pairs);
    }
    Ok(url)
}

fn unit_identifier(unit: &WorkUnit) -> Result<&str, BibopsError> {
    match unit {
        WorkUnit::Record { identifier: Some(id), .. } => Ok(id),
        WorkUnit::Record { identifier: None, .. } => {
            Err(BibopsError::Input("record without an identifier".into()))
        }
        WorkUnit::Batch { .. } => Err(BibopsError::Input("expected a record unit".into())),
    }
}
