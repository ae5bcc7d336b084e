use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use owo_colors::OwoColorize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::math::Map;
use crate::records::{output_name, read_automaton, write_automaton};
use crate::star::star;

/// Errors that abort a whole batch run. Everything below this level is a per-record
/// outcome, reported in the [`BatchSummary`] instead of propagated.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The intake directory could not be listed at all.
    #[error("could not list intake directory {}: {source}", .dir.display())]
    Intake {
        /// The intake directory.
        dir: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The intake directory holds no records to convert.
    #[error("no automaton records (*.json) found in {}", .dir.display())]
    MissingSource {
        /// The intake directory.
        dir: PathBuf,
    },
    /// The output directory could not be created.
    #[error("could not create output directory {}: {source}", .dir.display())]
    Output {
        /// The output directory.
        dir: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Records were found, but every single one was skipped or rejected and no output
    /// was produced.
    #[error("none of the {total} records in the batch could be converted")]
    EmptyBatch {
        /// How many records the intake directory held.
        total: usize,
    },
}

/// The terminal status of one record in a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// The record was converted and written.
    Converted,
    /// The record could not be read or parsed and was skipped.
    Skipped,
    /// The record parsed, but the conversion rejected it or its output could not be
    /// written.
    Failed,
}

/// What happened to one record, traceable to its input file.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    /// The input record this outcome belongs to.
    pub record: PathBuf,
    /// How the record ended up.
    pub status: RecordStatus,
    /// Number of states of the written automaton, for converted records.
    pub states: Option<usize>,
    /// Human-readable description of what went wrong, for the other two statuses.
    pub detail: Option<String>,
}

/// The collected per-record outcomes of one batch run, in intake order.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// One outcome per record found in the intake directory.
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchSummary {
    /// Number of records that were converted and written.
    pub fn converted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == RecordStatus::Converted)
            .count()
    }

    /// Renders the run as a table, one row per record in intake order.
    pub fn table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["record", "status", "states", "detail"]);
        for outcome in &self.outcomes {
            let status = match outcome.status {
                RecordStatus::Converted => "converted".green().to_string(),
                RecordStatus::Skipped => "skipped".yellow().to_string(),
                RecordStatus::Failed => "failed".red().to_string(),
            };
            builder.push_record([
                outcome
                    .record
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default(),
                status,
                outcome
                    .states
                    .map(|states| states.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                outcome.detail.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    /// One-line tally of the run, e.g. `3 converted, 1 skipped, 0 failed`.
    pub fn tally(&self) -> String {
        let mut counts: Map<RecordStatus, usize> = Map::default();
        for outcome in &self.outcomes {
            *counts.entry(outcome.status).or_default() += 1;
        }
        let of = |status: RecordStatus| counts.get(&status).copied().unwrap_or(0);
        format!(
            "{} converted, {} skipped, {} failed",
            of(RecordStatus::Converted),
            of(RecordStatus::Skipped),
            of(RecordStatus::Failed)
        )
    }
}

/// Converts every record in the `input` directory and writes the results to the `output`
/// directory, which is created if absent.
///
/// Records are processed independently, in sorted file name order; a record that fails to
/// parse or that the conversion rejects is logged and recorded in the summary, it never
/// affects its siblings. Only two conditions abort the run: an intake directory without
/// any `*.json` record, and a batch in which no record survived at all.
pub fn run_batch(input: &Path, output: &Path) -> Result<BatchSummary, BatchError> {
    let records = collect_records(input)?;
    if records.is_empty() {
        return Err(BatchError::MissingSource {
            dir: input.to_path_buf(),
        });
    }
    debug!("found {} records in {}", records.len(), input.display());

    fs::create_dir_all(output).map_err(|source| BatchError::Output {
        dir: output.to_path_buf(),
        source,
    })?;

    let mut outcomes = Vec::with_capacity(records.len());
    for record in &records {
        info!("reading from {}", record.display());
        outcomes.push(convert_record(record, output));
    }

    let summary = BatchSummary { outcomes };
    if summary.converted() == 0 {
        return Err(BatchError::EmptyBatch {
            total: summary.outcomes.len(),
        });
    }
    info!("{}", summary.tally());
    Ok(summary)
}

fn collect_records(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let entries = fs::read_dir(dir).map_err(|source| BatchError::Intake {
        dir: dir.to_path_buf(),
        source,
    })?;
    Ok(entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "json"))
        .sorted()
        .collect())
}

fn convert_record(record: &Path, output_dir: &Path) -> RecordOutcome {
    let outcome = |status, states, detail| RecordOutcome {
        record: record.to_path_buf(),
        status,
        states,
        detail,
    };

    let automaton = match read_automaton(record) {
        Ok(automaton) => automaton,
        Err(err) => {
            warn!("skipping {}: {err}", record.display());
            return outcome(RecordStatus::Skipped, None, Some(err.to_string()));
        }
    };
    let starred = match star(automaton) {
        Ok(starred) => starred,
        Err(err) => {
            warn!("rejecting {}: {err}", record.display());
            return outcome(RecordStatus::Failed, None, Some(err.to_string()));
        }
    };
    debug!("converted automaton\n{}", starred.transition_table());

    let target = output_dir.join(output_name(record));
    if let Err(err) = write_automaton(&target, &starred) {
        warn!("could not persist {}: {err}", target.display());
        return outcome(RecordStatus::Failed, None, Some(err.to_string()));
    }
    info!("written to {}", target.display());
    outcome(RecordStatus::Converted, Some(starred.size()), None)
}
