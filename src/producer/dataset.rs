use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::core::DatasetRow;
use crate::error::{StreamError, StreamResult};

/// Finite, ordered table of feature rows replayed by the producer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<DatasetRow>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a headered, unquoted numeric CSV export.
    ///
    /// Header cells lose a leading `#` (the export comments out its header
    /// row). Cells that are not numbers, quoted cells included, are left
    /// out of their row.
    pub fn from_csv_str(text: &str) -> StreamResult<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| StreamError::DatasetUnavailable("missing header row".to_string()))?;
        let columns: Vec<String> = split_cells(header).map(normalize_header).collect();

        if columns.iter().all(|c| c.is_empty()) {
            return Err(StreamError::DatasetUnavailable("empty header row".to_string()));
        }

        let rows = lines
            .map(|line| {
                columns
                    .iter()
                    .zip(split_cells(line))
                    .filter(|(column, _)| !column.is_empty())
                    .filter_map(|(column, cell)| {
                        cell.parse::<f64>().ok().map(|value| (column.clone(), value))
                    })
                    .collect::<DatasetRow>()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub async fn from_csv_path(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| StreamError::DatasetUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_csv_str(&text)
    }

    /// Load the dataset, degrading to an empty one so the producer keeps
    /// serving (and closing) connections when the file is unavailable
    pub async fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!("No dataset configured; serving an empty dataset");
            return Self::empty();
        };

        match Self::from_csv_path(path).await {
            Ok(dataset) => {
                info!("Dataset loaded: {} rows from {}", dataset.len(), path.display());
                dataset
            }
            Err(e) => {
                warn!("Failed to load dataset: {}; serving an empty dataset", e);
                Self::empty()
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn split_cells(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim)
}

fn normalize_header(cell: &str) -> String {
    cell.trim_start_matches('#').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_comment_marker_is_stripped() {
        let dataset = Dataset::from_csv_str("# FP1-F7,C3-P3\n1.5,2.5\n").unwrap();
        assert_eq!(dataset.columns(), &["FP1-F7".to_string(), "C3-P3".to_string()]);
        assert_eq!(dataset.rows()[0].get("FP1-F7"), Some(&1.5));
    }

    #[test]
    fn test_unparsable_cells_are_left_out() {
        let dataset = Dataset::from_csv_str("a,b,c\n1.0,,x\n\n2.0,3.0,4.0\n").unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0].len(), 1);
        assert_eq!(dataset.rows()[1].get("c"), Some(&4.0));
    }

    #[test]
    fn test_quoted_cells_are_not_numbers() {
        let dataset = Dataset::from_csv_str("a,b\n\"1.5\",2.5\n").unwrap();
        assert_eq!(dataset.rows()[0].get("a"), None);
        assert_eq!(dataset.rows()[0].get("b"), Some(&2.5));
    }

    #[test]
    fn test_missing_header_is_unavailable() {
        assert!(matches!(
            Dataset::from_csv_str("\n\n"),
            Err(StreamError::DatasetUnavailable(_))
        ));
    }
}
