//! Validate flow
//!
//! Three modes: `validate` sends each record to the validator and
//! stores the responses; `report` aggregates a stored response
//! collection into the report files; `full` does both in one run.

use bibops_core::records::{IdentifierRule, RecordSource};
use bibops_core::report::{aggregate, parse_collection, ValidationEnvelope, ValidationReport};
use bibops_domain::errors::BibopsError;
use bibops_domain::types::{Outcome, OutcomeCategory, WorkUnit};
use bibops_infra::{run_units, suffix, OperationKind, OutcomeSink, OutputSet, RunPaths};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::{CommonArgs, ValidateMode};
use crate::commands::{log_outcome, require_extension};
use crate::context::RunContext;

pub async fn execute(args: &CommonArgs, mode: ValidateMode) -> Result<(), BibopsError> {
    // Report mode reads a stored collection; no credentials, no network.
    if mode == ValidateMode::Report {
        return run_report_files(args);
    }

    let ctx = RunContext::initialize(&args.symbol, OperationKind::ValidateBib.scopes()).await?;
    let result = run_files(&ctx, args, mode).await;
    ctx.shutdown().await;
    result
}

async fn run_files(
    ctx: &RunContext,
    args: &CommonArgs,
    mode: ValidateMode,
) -> Result<(), BibopsError> {
    let source = RecordSource::new(IdentifierRule::ControlField)?;

    for input in &args.inputs {
        require_extension(input, &["mrc"])?;
        let data = std::fs::read(input)?;
        let units = source.units(&data);
        info!(input = %input.display(), records = units.len(), "validating records");

        let paths = RunPaths::new(
            input,
            OperationKind::ValidateBib.command_name(),
            &ctx.symbol,
            &args.output_dir,
        );
        let mut sink = ValidateSink { files: OutputSet::new(paths), envelopes: Vec::new() };
        let summary = run_units(
            &ctx.dispatcher,
            OperationKind::ValidateBib,
            &ctx.config.service_url,
            &units,
            &mut sink,
        )
        .await;
        sink.files.finish()?;
        let summary = summary?;

        if mode == ValidateMode::Full {
            write_report(&mut sink.files, &aggregate(&sink.envelopes))?;
        }

        info!(
            input = %input.display(),
            validated = summary.count(OutcomeCategory::Success),
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

fn run_report_files(args: &CommonArgs) -> Result<(), BibopsError> {
    for input in &args.inputs {
        require_extension(input, &["json"])?;
        let text = std::fs::read_to_string(input)?;
        let envelopes = parse_collection(&text)?;
        info!(input = %input.display(), responses = envelopes.len(), "aggregating validation responses");

        let paths = RunPaths::new(
            input,
            OperationKind::ValidateBib.command_name(),
            &args.symbol,
            &args.output_dir,
        );
        let mut files = OutputSet::new(paths);
        write_report(&mut files, &aggregate(&envelopes))?;
    }
    Ok(())
}

fn write_report(files: &mut OutputSet, report: &ValidationReport) -> Result<(), BibopsError> {
    files.write_lines(suffix::VALIDATION_REPORT, &report.report_lines)?;
    files.write_lines(suffix::VALIDATION_STATS, &report.stats_lines())?;
    files.write_lines(suffix::VALIDATION_CSV, &report.csv_lines())?;
    files.write_lines(suffix::VALID_BIBS, &report.valid_lines)?;
    info!(
        error_lines = report.total_error_lines(),
        valid_bibs = report.valid_lines.len(),
        "validation report written"
    );
    Ok(())
}

struct ValidateSink {
    files: OutputSet,
    envelopes: Vec<ValidationEnvelope>,
}

impl OutcomeSink for ValidateSink {
    fn record(&mut self, _unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError> {
        match outcome.category {
            OutcomeCategory::Success => {
                let response: Value = serde_json::from_str(&outcome.payload)
                    .unwrap_or_else(|_| Value::String(outcome.payload.clone()));
                let envelope = ValidationEnvelope {
                    identifier: outcome.identifier.clone(),
                    response,
                };
                self.files.append_json(
                    suffix::VALIDATION_RESPONSE,
                    &serde_json::json!({
                        "identifier": envelope.identifier,
                        "response": envelope.response
                    }),
                )?;
                self.envelopes.push(envelope);
                Ok(())
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
