use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use crate::automaton::Automaton;

/// Suffix inserted between an input record's stem and the `.json` extension when deriving
/// the output file name, so `dfa.json` produces `dfa_output.json`.
pub const OUTPUT_SUFFIX: &str = "_output";

/// Errors while reading or writing one record file.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The record file could not be opened, read or written.
    #[error("could not access record {}: {source}", .path.display())]
    Io {
        /// The offending file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The record is structurally not a valid automaton description, e.g. a required
    /// field is missing or a transition value has neither the scalar nor the list shape.
    #[error("invalid automaton record {}: {source}", .path.display())]
    Json {
        /// The offending file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Reads one automaton record from `path`.
pub fn read_automaton(path: &Path) -> Result<Automaton, RecordError> {
    let file = File::open(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let automaton = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        RecordError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    trace!("read automaton record from {}", path.display());
    Ok(automaton)
}

/// Writes `automaton` to `path` as a pretty-printed record, so output files stay as
/// readable as the input files they were derived from.
pub fn write_automaton(path: &Path, automaton: &Automaton) -> Result<(), RecordError> {
    let file = File::create(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, automaton).map_err(|source| RecordError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    trace!("wrote automaton record to {}", path.display());
    Ok(())
}

/// Derives the output file name for an input record.
pub fn output_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    PathBuf::from(format!("{stem}{OUTPUT_SUFFIX}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn output_name_appends_suffix_to_the_stem() {
        assert_eq!(
            output_name(Path::new("input/dfa.json")),
            PathBuf::from("dfa_output.json")
        );
        assert_eq!(
            output_name(Path::new("some.automaton.json")),
            PathBuf::from("some.automaton_output.json")
        );
    }

    #[test_log::test]
    fn unreadable_record_reports_the_path() {
        let err = read_automaton(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
