//! Timestamped per-category output files
//!
//! Each run writes its results into files named
//! `{stem}.{command}.{SYMBOL}.{timestamp}.{suffix}` in the output
//! directory. Files are created lazily on first write, appended to, and
//! flushed after every write, so a killed run keeps everything written
//! so far. JSON collection files are maintained as a valid array across
//! appends.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bibops_domain::errors::BibopsError;
use chrono::Local;
use serde_json::Value;
use tracing::debug;

/// File-name suffixes used by the flows.
pub mod suffix {
    pub const ADD_RESPONSE: &str = "AddResponse.json";
    pub const REPLACED_BIBS: &str = "ReplacedBIBs.mrc";
    pub const VALIDATION_RESPONSE: &str = "ValidationResponse.json";
    pub const VALIDATION_REPORT: &str = "ALL.ValidationReport.txt";
    pub const VALIDATION_STATS: &str = "ALL.ValidationStats.txt";
    pub const VALIDATION_CSV: &str = "ALL.ValidationCSV.csv";
    pub const VALID_BIBS: &str = "ALL.ValidBibs.txt";
    pub const SUCCESS_CTRL_NRS: &str = "SuccessCtrlNrs.txt";
    pub const DELETED_LHRS: &str = "DeletedLHRs.mrc";
    pub const REPLACED_LHRS: &str = "ReplacedLHRs.mrc";
    pub const NOT_FOUND_LHRS: &str = "NotFoundLHRs.json";
    pub const BAD_REQUEST: &str = "BadRequest.xml";
    pub const LOG: &str = "LOG.txt";
    pub const PPN_OCN: &str = "PPN_OCN.txt";
    pub const NOT_FOUND_OCNS: &str = "not_found.ocns.txt";
    pub const EQUAL_OCNS: &str = "equal.ocn.txt";
    pub const CHANGED_OCNS: &str = "changed.ocns.txt";
    pub const ALL_PPN_OCNS: &str = "all.ppn.ocns.txt";
    pub const TIMEOUT_REQUEST: &str = "timeout.request.txt";
    pub const TIMEOUT_TOKEN: &str = "timeout.token.txt";
    pub const RETRY_APIKEY: &str = "retry.apikey.txt";
}

/// Naming scheme for one run's output files.
#[derive(Debug, Clone)]
pub struct RunPaths {
    directory: PathBuf,
    stem: String,
    command: String,
    symbol: String,
    timestamp: String,
}

impl RunPaths {
    /// Derive the naming scheme from the input file, command name, and
    /// institution symbol, stamped with the current local time.
    #[must_use]
    pub fn new(input: &Path, command: &str, symbol: &str, directory: &Path) -> Self {
        let stem = input
            .file_stem()
            .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
        Self {
            directory: directory.to_path_buf(),
            stem,
            command: command.to_string(),
            symbol: symbol.to_string(),
            timestamp: Local::now().format("%Y-%m-%d.%H.%M.%S").to_string(),
        }
    }

    /// Full path for one suffix.
    #[must_use]
    pub fn file(&self, suffix: &str) -> PathBuf {
        self.directory.join(format!(
            "{}.{}.{}.{}.{suffix}",
            self.stem, self.command, self.symbol, self.timestamp
        ))
    }
}

enum SinkFile {
    Lines(File),
    JsonArray(File),
}

/// The open output files of one run, keyed by suffix.
pub struct OutputSet {
    paths: RunPaths,
    files: HashMap<String, SinkFile>,
}

impl OutputSet {
    #[must_use]
    pub fn new(paths: RunPaths) -> Self {
        Self { paths, files: HashMap::new() }
    }

    #[must_use]
    pub fn paths(&self) -> &RunPaths {
        &self.paths
    }

    /// Append one line, creating the file on first write.
    ///
    /// # Errors
    /// Propagates filesystem failures as `BibopsError::Output`.
    pub fn append_line(&mut self, suffix: &str, line: &str) -> Result<(), BibopsError> {
        self.append_bytes(suffix, format!("{line}\n").as_bytes())
    }

    /// Append raw bytes (used for returned MARC records).
    ///
    /// # Errors
    /// Propagates filesystem failures as `BibopsError::Output`.
    pub fn append_bytes(&mut self, suffix: &str, bytes: &[u8]) -> Result<(), BibopsError> {
        let file = self.open(suffix, false)?;
        let SinkFile::Lines(file) = file else {
            return Err(BibopsError::Output(format!(
                "{suffix} is a JSON collection, not a line file"
            )));
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }

    /// Append one element to a JSON collection file, keeping the file a
    /// valid array. `finish` closes the array.
    ///
    /// # Errors
    /// Propagates filesystem failures as `BibopsError::Output`.
    pub fn append_json(&mut self, suffix: &str, value: &Value) -> Result<(), BibopsError> {
        let first = !self.files.contains_key(suffix);
        let file = self.open(suffix, true)?;
        let SinkFile::JsonArray(file) = file else {
            return Err(BibopsError::Output(format!("{suffix} is not a JSON collection")));
        };
        let rendered = serde_json::to_string(value)
            .map_err(|e| BibopsError::Internal(format!("unserializable value: {e}")))?;
        if first {
            file.write_all(b"[\n")?;
        } else {
            file.write_all(b",\n")?;
        }
        file.write_all(rendered.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Overwrite a whole file with the given lines (report outputs).
    ///
    /// # Errors
    /// Propagates filesystem failures as `BibopsError::Output`.
    pub fn write_lines(&mut self, suffix: &str, lines: &[String]) -> Result<(), BibopsError> {
        let path = self.paths.file(suffix);
        let mut file = File::create(&path)?;
        for line in lines {
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()?;
        debug!(path = %path.display(), lines = lines.len(), "report file written");
        Ok(())
    }

    /// Close every JSON collection opened by this set. Must be called
    /// once at the end of the run; line files need no finalization.
    ///
    /// # Errors
    /// Propagates filesystem failures as `BibopsError::Output`.
    pub fn finish(&mut self) -> Result<(), BibopsError> {
        for sink in self.files.values_mut() {
            if let SinkFile::JsonArray(file) = sink {
                file.write_all(b"\n]\n")?;
                file.flush()?;
            }
        }
        self.files.clear();
        Ok(())
    }

    fn open(&mut self, suffix: &str, json: bool) -> Result<&mut SinkFile, BibopsError> {
        if !self.files.contains_key(suffix) {
            let path = self.paths.file(suffix);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            debug!(path = %path.display(), "output file opened");
            let sink = if json { SinkFile::JsonArray(file) } else { SinkFile::Lines(file) };
            self.files.insert(suffix.to_string(), sink);
        }
        // Just inserted above when missing.
        self.files
            .get_mut(suffix)
            .ok_or_else(|| BibopsError::Internal("output file vanished".into()))
    }
}
