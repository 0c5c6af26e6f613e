//! LHR replace flow
//!
//! Replaces local holdings records by their 001 control number. A
//! record without an 001 would create a new LHR upstream, so units
//! missing an identifier are never dispatched.

use bibops_core::records::{IdentifierRule, RecordSource};
use bibops_domain::errors::BibopsError;
use bibops_domain::types::OutcomeCategory;
use bibops_infra::{run_units, suffix, OperationKind, OutputSet, RunPaths};
use tracing::{info, warn};

use crate::cli::CommonArgs;
use crate::commands::replace::ReplaceSink;
use crate::commands::require_extension;
use crate::context::RunContext;

pub async fn execute(args: &CommonArgs) -> Result<(), BibopsError> {
    let ctx = RunContext::initialize(&args.symbol, OperationKind::ReplaceLhr.scopes()).await?;
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
        info!(input = %input.display(), records = units.len(), "replacing holdings records");

        let paths = RunPaths::new(
            input,
            OperationKind::ReplaceLhr.command_name(),
            &ctx.symbol,
            &args.output_dir,
        );
        let mut sink =
            ReplaceSink { files: OutputSet::new(paths), marc_suffix: suffix::REPLACED_LHRS };
        let summary = run_units(
            &ctx.dispatcher,
            OperationKind::ReplaceLhr,
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
