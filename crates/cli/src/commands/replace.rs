//! Replace flow
//!
//! Replaces each bibliographic record by the control number in its 001
//! field. Returned records go to `ReplacedBIBs.mrc` so the replaced
//! state is kept verbatim; structured rejections go to
//! `BadRequest.xml`.

use bibops_core::records::{IdentifierRule, RecordSource};
use bibops_domain::errors::BibopsError;
use bibops_domain::types::{Outcome, OutcomeCategory, WorkUnit};
use bibops_infra::{run_units, suffix, OperationKind, OutcomeSink, OutputSet, RunPaths};
use tracing::{info, warn};

use crate::cli::CommonArgs;
use crate::commands::{log_outcome, require_extension};
use crate::context::RunContext;

pub async fn execute(args: &CommonArgs) -> Result<(), BibopsError> {
    let ctx = RunContext::initialize(&args.symbol, OperationKind::ReplaceBib.scopes()).await?;
    let result = run_files(&ctx, args).await;
    ctx.shutdown().await;
    result
}

async fn run_files(ctx: &RunContext, args: &CommonArgs) -> Result<(), BibopsError> {
    let source = RecordSource::new(IdentifierRule::ControlField)?;

    for input in &args.inputs {
        require_extension(input, &["mrc"])?;
        let data = std::fs::read(input)?;
        let units = source.units(&data);
        info!(input = %input.display(), records = units.len(), "replacing records");

        let paths = RunPaths::new(
            input,
            OperationKind::ReplaceBib.command_name(),
            &ctx.symbol,
            &args.output_dir,
        );
        let mut sink = ReplaceSink { files: OutputSet::new(paths), marc_suffix: suffix::REPLACED_BIBS };
        let summary = run_units(
            &ctx.dispatcher,
            OperationKind::ReplaceBib,
            &ctx.config.service_url,
            &units,
            &mut sink,
        )
        .await;
        sink.files.finish()?;
        let summary = summary?;

        info!(
            input = %input.display(),
            replaced = summary.count(OutcomeCategory::Success),
            rejected = summary.count(OutcomeCategory::BadRequest),
            "input file done"
        );
        if summary.aborted {
            warn!("quota exhausted, skipping remaining input files");
            break;
        }
    }
    Ok(())
}

/// Sink shared by the bib and LHR replace flows; only the target file
/// for the returned records differs.
pub(crate) struct ReplaceSink {
    pub(crate) files: OutputSet,
    pub(crate) marc_suffix: &'static str,
}

impl OutcomeSink for ReplaceSink {
    fn record(&mut self, _unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError> {
        match outcome.category {
            OutcomeCategory::Success => {
                self.files.append_bytes(self.marc_suffix, outcome.payload.as_bytes())
            }
            OutcomeCategory::BadRequest => {
                self.files.append_line(
                    suffix::BAD_REQUEST,
                    &format!("Control Number: {}\n{}", outcome.identifier, outcome.payload),
                )
            }
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
