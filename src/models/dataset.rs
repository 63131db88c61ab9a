use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File format of an uploaded dataset, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "xlsx")]
    Xlsx,
}

impl DatasetFormat {
    /// Detect the format from a filename, if it is one we accept.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            Some(DatasetFormat::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(DatasetFormat::Xlsx)
        } else {
            None
        }
    }
}

/// An uploaded dataset as held by the store: raw bytes plus enough metadata
/// to re-parse them on every question cycle.
#[derive(Debug, Clone)]
pub struct StoredDataset {
    pub id: Uuid,
    pub filename: String,
    pub format: DatasetFormat,
    pub bytes: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// One column of the schema summary: name, a coarse type label, and up to
/// three distinct non-missing example values used to ground prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub examples: Vec<String>,
}

/// Lightweight description of a loaded table, computed once per load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
}

impl SchemaSummary {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Response for the upload endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub dataset_id: Uuid,
    pub filename: String,
    pub schema: SchemaSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for the ask endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub dataset_id: Uuid,
    pub question: String,
}

/// A rendered chart returned inline with the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub chart_type: String,
    /// PNG image bytes, base64-encoded.
    pub image_base64: String,
}

/// Response for the ask endpoint. The insight and chart sub-steps fail
/// independently, so each carries its own error slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub dataset_id: Uuid,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// Error response for API endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(
            DatasetFormat::from_filename("Sales.CSV"),
            Some(DatasetFormat::Csv)
        );
        assert_eq!(
            DatasetFormat::from_filename("report.xlsx"),
            Some(DatasetFormat::Xlsx)
        );
        assert_eq!(DatasetFormat::from_filename("notes.txt"), None);
    }
}
