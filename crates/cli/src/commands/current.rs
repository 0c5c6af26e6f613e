//! Lookup flow
//!
//! Resolves the current control number for each line of the input
//! lists, 100 numbers per request. XML consistency-check exports are
//! converted to the tab-separated line format first (and the converted
//! list written next to the other outputs). Results split four ways:
//! gone, unchanged, merged, and the full annotated list.

use bibops_core::batch::{map_batch, to_batches};
use bibops_core::xmlinput::lookup_lines_from_xml;
use bibops_domain::constants::LOOKUP_BATCH_SIZE;
use bibops_domain::errors::BibopsError;
use bibops_domain::types::{CurrentStatus, Outcome, OutcomeCategory, WorkUnit};
use bibops_infra::{run_units, suffix, OperationKind, OutcomeSink, OutputSet, RunPaths};
use tracing::{info, warn};

use crate::cli::CommonArgs;
use crate::commands::{log_outcome, require_extension};
use crate::context::RunContext;

pub async fn execute(args: &CommonArgs) -> Result<(), BibopsError> {
    let ctx = RunContext::initialize(&args.symbol, OperationKind::CurrentOcns.scopes()).await?;
    let result = run_files(&ctx, args).await;
    ctx.shutdown().await;
    result
}

async fn run_files(ctx: &RunContext, args: &CommonArgs) -> Result<(), BibopsError> {
    for input in &args.inputs {
        require_extension(input, &["txt", "xml"])?;
        let text = std::fs::read_to_string(input)?;

        let paths = RunPaths::new(
            input,
            OperationKind::CurrentOcns.command_name(),
            &ctx.symbol,
            &args.output_dir,
        );
        let mut files = OutputSet::new(paths);

        let is_xml = input
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("xml"));
        let lines: Vec<String> = if is_xml {
            let converted = lookup_lines_from_xml(&text)?;
            files.write_lines(suffix::PPN_OCN, &converted)?;
            converted
        } else {
            text.lines().map(str::to_string).collect()
        };

        let units = to_batches(&lines, LOOKUP_BATCH_SIZE);
        info!(
            input = %input.display(),
            lines = lines.iter().filter(|l| !l.trim().is_empty()).count(),
            batches = units.len(),
            "resolving current control numbers"
        );

        let mut sink = CurrentSink { files };
        let summary = run_units(
            &ctx.dispatcher,
            OperationKind::CurrentOcns,
            &ctx.config.service_url,
            &units,
            &mut sink,
        )
        .await;
        sink.files.finish()?;
        let summary = summary?;

        info!(
            input = %input.display(),
            batches_resolved = summary.count(OutcomeCategory::Success),
            batches_timed_out = summary.count(OutcomeCategory::Timeout),
            "input file done"
        );
        if summary.aborted {
            warn!("quota exhausted, skipping remaining input files");
            break;
        }
    }
    Ok(())
}

struct CurrentSink {
    files: OutputSet,
}

impl CurrentSink {
    fn record_batch(&mut self, lines: &[String], body: &str) -> Result<(), BibopsError> {
        for status in map_batch(lines, body)? {
            let raw = status.line.raw.as_str();
            match status.status {
                Some(CurrentStatus::NotFound) => {
                    self.files.append_line(suffix::NOT_FOUND_OCNS, raw)?;
                    self.files
                        .append_line(suffix::ALL_PPN_OCNS, &format!("{raw}\tRecord not found."))?;
                }
                Some(CurrentStatus::Unchanged) => {
                    self.files.append_line(suffix::EQUAL_OCNS, raw)?;
                    self.files
                        .append_line(suffix::ALL_PPN_OCNS, &format!("{raw}\tRecord found."))?;
                }
                Some(CurrentStatus::Merged(current)) => {
                    self.files
                        .append_line(suffix::CHANGED_OCNS, &format!("{raw}\t{current}"))?;
                    self.files.append_line(
                        suffix::ALL_PPN_OCNS,
                        &format!("{raw}\tRecord found.\t{current}"),
                    )?;
                }
                None => {
                    self.files
                        .append_line(suffix::LOG, &format!("{raw}|no answer in response"))?;
                }
            }
        }
        Ok(())
    }

    fn record_lines(&mut self, sfx: &str, lines: &[String]) -> Result<(), BibopsError> {
        for line in lines {
            self.files.append_line(sfx, line)?;
        }
        Ok(())
    }
}

impl OutcomeSink for CurrentSink {
    fn record(&mut self, unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError> {
        let WorkUnit::Batch { lines } = unit else {
            return log_outcome(&mut self.files, outcome);
        };
        match outcome.category {
            OutcomeCategory::Success => self.record_batch(lines, &outcome.payload),
            // Every line of a timed-out batch is kept for a rerun.
            OutcomeCategory::Timeout => self.record_lines(suffix::TIMEOUT_REQUEST, lines),
            // The token could not be repaired within the budget.
            OutcomeCategory::AuthError => self.record_lines(suffix::TIMEOUT_TOKEN, lines),
            _ => log_outcome(&mut self.files, outcome),
        }
    }

    fn note_auth_retry(&mut self, unit: &WorkUnit) -> Result<(), BibopsError> {
        if let WorkUnit::Batch { lines } = unit {
            self.record_lines(suffix::RETRY_APIKEY, lines)?;
        }
        Ok(())
    }
}
