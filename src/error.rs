use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the question-answering pipeline.
///
/// Each variant belongs to one pipeline step and is caught at that step's
/// boundary: `Load` aborts the whole cycle, `Oracle`/`ResponseFormat`/`Render`
/// abort only the sub-step that raised them, and `Filter`/`UnknownChartType`
/// are recovered inside the renderer and surface as warnings.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to load dataset: {0}")]
    Load(String),

    #[error("oracle request failed: {0}")]
    Oracle(String),

    #[error("oracle response is not a valid chart plan: {0}")]
    ResponseFormat(String),

    #[error("invalid filter expression: {0}")]
    Filter(String),

    #[error("unsupported chart type: {0}")]
    UnknownChartType(String),

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("dataset not found: {0}")]
    DatasetNotFound(Uuid),
}
