//! LHR delete flow
//!
//! Deletes local holdings records listed one control number per line.
//! Duplicate numbers are collapsed (first occurrence wins) so a repeat
//! in the list cannot trigger a second delete of an already-gone LHR.
//! The service returns the deleted record; it is kept in
//! `DeletedLHRs.mrc` as the undo trail.

use std::collections::HashSet;

use bibops_domain::errors::BibopsError;
use bibops_domain::types::{Outcome, OutcomeCategory, WorkUnit};
use bibops_infra::{run_units, suffix, OperationKind, OutcomeSink, OutputSet, RunPaths};
use tracing::{info, warn};

use crate::cli::CommonArgs;
use crate::commands::{log_outcome, require_extension, response_envelope};
use crate::context::RunContext;

pub async fn execute(args: &CommonArgs) -> Result<(), BibopsError> {
    let ctx = RunContext::initialize(&args.symbol, OperationKind::DeleteLhr.scopes()).await?;
    let result = run_files(&ctx, args).await;
    ctx.shutdown().await;
    result
}

/// One unit per unique control number, in first-seen order.
fn units_from_lines(text: &str) -> Vec<WorkUnit> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && seen.insert(line.to_string()))
        .map(|line| WorkUnit::Record { bytes: Vec::new(), identifier: Some(line.to_string()) })
        .collect()
}

async fn run_files(ctx: &RunContext, args: &CommonArgs) -> Result<(), BibopsError> {
    for input in &args.inputs {
        require_extension(input, &["txt"])?;
        let text = std::fs::read_to_string(input)?;
        let units = units_from_lines(&text);
        info!(input = %input.display(), control_numbers = units.len(), "deleting holdings records");

        let paths = RunPaths::new(
            input,
            OperationKind::DeleteLhr.command_name(),
            &ctx.symbol,
            &args.output_dir,
        );
        let mut sink = DeleteSink { files: OutputSet::new(paths) };
        let summary = run_units(
            &ctx.dispatcher,
            OperationKind::DeleteLhr,
            &ctx.config.service_url,
            &units,
            &mut sink,
        )
        .await;
        sink.files.finish()?;
        let summary = summary?;

        info!(
            input = %input.display(),
            deleted = summary.count(OutcomeCategory::Success),
            not_found = summary.count(OutcomeCategory::NotFound),
            "input file done"
        );
        if summary.aborted {
            warn!("quota exhausted, skipping remaining input files");
            break;
        }
    }
    Ok(())
}

struct DeleteSink {
    files: OutputSet,
}

impl OutcomeSink for DeleteSink {
    fn record(&mut self, _unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError> {
        match outcome.category {
            OutcomeCategory::Success => {
                self.files.append_line(
                    suffix::SUCCESS_CTRL_NRS,
                    &format!("Success for Control Number: {}", outcome.identifier),
                )?;
                self.files.append_bytes(suffix::DELETED_LHRS, outcome.payload.as_bytes())
            }
            OutcomeCategory::NotFound => {
                self.files.append_json(suffix::NOT_FOUND_LHRS, &response_envelope(outcome))
            }
            OutcomeCategory::BadRequest => self.files.append_line(
                suffix::BAD_REQUEST,
                &format!("Control Number: {}\n{}", outcome.identifier, outcome.payload),
            ),
            _ => log_outcome(&mut self.files, outcome),
        }
    }

    fn note_auth_retry(&mut self, unit: &WorkUnit) -> Result<(), BibopsError> {
        self.files.append_line(
            suffix::LOG,
            &format!("{}|auth marker, token refreshed", unit.display_identifier()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Control numbers dedupe in first-seen order; blanks drop out.
    #[test]
    fn test_units_from_lines() {
        let units = units_from_lines("111\n222\n\n111\n333\n222\n");
        let ids: Vec<&str> = units.iter().map(WorkUnit::display_identifier).collect();
        assert_eq!(ids, vec!["111", "222", "333"]);
        assert!(units
            .iter()
            .all(|u| matches!(u, WorkUnit::Record { bytes, .. } if bytes.is_empty())));
    }
}
