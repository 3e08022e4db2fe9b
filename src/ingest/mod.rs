/// Input ingestion for the failure-checking service.
///
/// Submodules:
/// - `csv_row`: quote-aware splitting of one exported line into columns.
/// - `extract`: sub-field pattern search and the sorted `Reading` list.
///
/// The whole file is read into memory before extraction begins; there is no
/// streaming path.

pub mod csv_row;
pub mod extract;

use std::fs;
use std::path::Path;

use crate::model::AnalysisError;

/// Reads the selected export file as text.
///
/// `None` means nothing was selected, which is the one condition that blocks
/// a run outright.
pub fn read_input(path: Option<&Path>) -> Result<String, AnalysisError> {
    let path = path.ok_or(AnalysisError::NoInputFile)?;
    fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_selection_is_no_input_file() {
        let err = read_input(None).unwrap_err();
        assert!(matches!(err, AnalysisError::NoInputFile), "got {:?}", err);
    }

    #[test]
    fn test_unreadable_path_reports_io_error_with_path() {
        let missing = Path::new("/definitely/not/here/export.csv");
        let err = read_input(Some(missing)).unwrap_err();
        match err {
            AnalysisError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
