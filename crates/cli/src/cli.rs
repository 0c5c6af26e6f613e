//! Command-line surface
//!
//! One subcommand per flow, each taking the same common arguments: the
//! input files, the institution symbol (which selects the credential
//! pair `{SYMBOL}_CLIENT_ID` / `{SYMBOL}_CLIENT_SECRET`), the output
//! directory, and verbosity.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bibops", version, about = "Batch-process MARC21 records through the WorldCat Metadata API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Arguments every flow takes.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Input files to process, in order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Institution symbol; selects the credential pair and appears in
    /// output file names
    #[arg(short, long)]
    pub symbol: String,

    /// Directory for output files
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Increase log verbosity
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add bibliographic records from .mrc files
    Add(CommonArgs),

    /// Replace bibliographic records by their 001 control number
    Replace(CommonArgs),

    /// Validate bibliographic records without saving them
    Validate {
        #[command(flatten)]
        common: CommonArgs,

        /// validate = API responses only; report = aggregate an existing
        /// response file; full = both
        #[arg(long, value_enum, default_value_t = ValidateMode::Full)]
        mode: ValidateMode,
    },

    /// Resolve the current control numbers for lookup lists
    Current(CommonArgs),

    /// Delete local holdings records listed by control number
    DeleteLhr(CommonArgs),

    /// Replace local holdings records by their 001 control number
    ReplaceLhr(CommonArgs),
}

impl Command {
    /// The shared arguments of whichever subcommand was chosen.
    #[must_use]
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::Add(common)
            | Self::Replace(common)
            | Self::Current(common)
            | Self::DeleteLhr(common)
            | Self::ReplaceLhr(common)
            | Self::Validate { common, .. } => common,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateMode {
    /// Send records to the validator and store the responses
    Validate,
    /// Aggregate a stored response collection into report files
    Report,
    /// Validate, then aggregate in one run
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// The clap definition is internally consistent.
    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    /// Subcommands parse with their common arguments and defaults.
    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["bibops", "add", "batch1.mrc", "--symbol", "QGK"]).unwrap();
        let common = cli.command.common();
        assert_eq!(common.inputs, vec![PathBuf::from("batch1.mrc")]);
        assert_eq!(common.symbol, "QGK");
        assert_eq!(common.output_dir, PathBuf::from("."));
        assert!(!common.verbose);
    }

    /// The validate mode defaults to full and accepts the other modes.
    #[test]
    fn test_parse_validate_modes() {
        let cli =
            Cli::try_parse_from(["bibops", "validate", "b.mrc", "-s", "QGK"]).unwrap();
        match cli.command {
            Command::Validate { mode, .. } => assert_eq!(mode, ValidateMode::Full),
            other => panic!("expected validate, got {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "bibops", "validate", "b.json", "-s", "QGK", "--mode", "report",
        ])
        .unwrap();
        match cli.command {
            Command::Validate { mode, .. } => assert_eq!(mode, ValidateMode::Report),
            other => panic!("expected validate, got {other:?}"),
        }
    }

    /// Input files are required.
    #[test]
    fn test_inputs_required() {
        assert!(Cli::try_parse_from(["bibops", "add", "--symbol", "QGK"]).is_err());
    }
}
