//! CSV export of the menu spreadsheet as a [`SnapshotSource`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};

use crate::application::sync::{Snapshot, SnapshotError, SnapshotSource};

/// Reads the whole file on every load. Rows may have any number of columns
/// and there is no header row.
#[derive(Debug, Clone)]
pub struct CsvSnapshotSource {
    path: PathBuf,
}

impl CsvSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let records = reader
            .records()
            .collect::<Result<Vec<StringRecord>, _>>()
            .map_err(|err| SnapshotError::Malformed {
                path: self.describe(),
                message: err.to_string(),
            })?;

        Ok(Snapshot::from_text_rows(
            records.iter().map(|record| record.iter()),
        ))
    }
}

#[async_trait]
impl SnapshotSource for CsvSnapshotSource {
    async fn load(&self) -> Result<Snapshot, SnapshotError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|err| SnapshotError::Unreadable {
                path: self.describe(),
                message: err.to_string(),
            })?;
        self.parse(&bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
