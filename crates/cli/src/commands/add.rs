//! Add flow
//!
//! Sends each record in the input `.mrc` files to the bib-creation
//! endpoint. The record identifier is the institution's local number
//! from the `$a{SYMBOL}$b` subfield pair; responses are collected into
//! the `AddResponse.json` envelope array.

use bibops_core::records::{IdentifierRule, RecordSource};
use bibops_domain::errors::BibopsError;
use bibops_domain::types::{Outcome, OutcomeCategory, WorkUnit};
use bibops_infra::{run_units, suffix, OperationKind, OutcomeSink, OutputSet, RunPaths};
use tracing::{info, warn};

use crate::cli::CommonArgs;
use crate::commands::{log_outcome, require_extension, response_envelope};
use crate::context::RunContext;

pub async fn execute(args: &CommonArgs) -> Result<(), BibopsError> {
    let ctx = RunContext::initialize(&args.symbol, OperationKind::AddBib.scopes()).await?;
    let result = run_files(&ctx, args).await;
    ctx.shutdown().await;
    result
}

async fn run_files(ctx: &RunContext, args: &CommonArgs) -> Result<(), BibopsError> {
    let source =
        RecordSource::new(IdentifierRule::LocalSubfield { symbol: ctx.symbol.clone() })?;

    for input in &args.inputs {
        require_extension(input, &["mrc"])?;
        let data = std::fs::read(input)?;
        let units = source.units(&data);
        info!(input = %input.display(), records = units.len(), "adding records");

        let paths = RunPaths::new(
            input,
            OperationKind::AddBib.command_name(),
            &ctx.symbol,
            &args.output_dir,
        );
        let mut sink = AddSink { files: OutputSet::new(paths) };
        let summary = run_units(
            &ctx.dispatcher,
            OperationKind::AddBib,
            &ctx.config.service_url,
            &units,
            &mut sink,
        )
        .await;
        sink.files.finish()?;
        let summary = summary?;

        info!(
            input = %input.display(),
            added = summary.count(OutcomeCategory::Success),
            failed = summary.outcomes - summary.count(OutcomeCategory::Success),
            "input file done"
        );
        if summary.aborted {
            warn!("quota exhausted, skipping remaining input files");
            break;
        }
    }
    Ok(())
}

struct AddSink {
    files: OutputSet,
}

impl OutcomeSink for AddSink {
    fn record(&mut self, _unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError> {
        match outcome.category {
            OutcomeCategory::Success => {
                self.files.append_json(suffix::ADD_RESPONSE, &response_envelope(outcome))
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
