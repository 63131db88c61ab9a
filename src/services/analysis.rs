use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{error, info};
use polars::prelude::DataFrame;
use std::fs;

use crate::error::AnalysisError;
use crate::models::dataset::{AskRequest, AskResponse, ChartArtifact, SchemaSummary};
use crate::services::interpreter;
use crate::services::loader::{DatasetLoader, SAMPLE_ROWS};
use crate::services::prompt;
use crate::services::renderer::ChartRenderer;
use crate::services::{DatasetStore, OracleService};

/// Runs one question cycle: load the stored bytes, compose prompts, consult
/// the oracle, interpret its replies, and render.
///
/// The insight and chart sub-steps consult the oracle independently and fail
/// independently; a failure in one never suppresses the other. Nothing from
/// a cycle survives into the next: the table and every derived artifact are
/// rebuilt per question.
#[derive(Clone)]
pub struct AnalysisService<S, O>
where
    S: DatasetStore + Clone + std::fmt::Debug,
    O: OracleService + Clone + std::fmt::Debug,
{
    store: S,
    oracle: O,
    renderer: ChartRenderer,
}

impl<S, O> AnalysisService<S, O>
where
    S: DatasetStore + Clone + std::fmt::Debug,
    O: OracleService + Clone + std::fmt::Debug,
{
    pub fn new(store: S, oracle: O, renderer: ChartRenderer) -> Self {
        Self {
            store,
            oracle,
            renderer,
        }
    }

    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse, AnalysisError> {
        info!(
            "💬 Question for dataset {}: {}",
            request.dataset_id, request.question
        );

        let stored = self
            .store
            .get_dataset(request.dataset_id)
            .await
            .map_err(|e| AnalysisError::Load(e.to_string()))?
            .ok_or(AnalysisError::DatasetNotFound(request.dataset_id))?;

        let df = DatasetLoader::parse(&stored.bytes, stored.format)?;
        let schema = DatasetLoader::summarize(&df)?;
        let sample = DatasetLoader::sample_rows(&df, SAMPLE_ROWS)?;

        let (insight, insight_error) = match self
            .insight_substep(&sample, &schema, &request.question)
            .await
        {
            Ok(text) => (Some(text), None),
            Err(e) => {
                error!("Insight sub-step failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let mut warnings = Vec::new();
        let (chart, chart_error) = match self
            .chart_substep(&df, &sample, &schema, &request.question, &mut warnings)
            .await
        {
            Ok(artifact) => (artifact, None),
            Err(e) => {
                error!("Chart sub-step failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        Ok(AskResponse {
            dataset_id: request.dataset_id,
            question: request.question,
            insight,
            insight_error,
            chart,
            chart_error,
            warnings,
        })
    }

    async fn insight_substep(
        &self,
        sample: &str,
        schema: &SchemaSummary,
        question: &str,
    ) -> Result<String, AnalysisError> {
        let prompt = prompt::insight_prompt(sample, &schema.column_names(), question);
        let raw = self
            .oracle
            .generate(&prompt)
            .await
            .map_err(|e| AnalysisError::Oracle(e.to_string()))?;
        Ok(interpreter::interpret_insight(&raw))
    }

    async fn chart_substep(
        &self,
        df: &DataFrame,
        sample: &str,
        schema: &SchemaSummary,
        question: &str,
        warnings: &mut Vec<String>,
    ) -> Result<Option<ChartArtifact>, AnalysisError> {
        let prompt = prompt::chart_plan_prompt(sample, schema, question);
        let raw = self
            .oracle
            .generate(&prompt)
            .await
            .map_err(|e| AnalysisError::Oracle(e.to_string()))?;

        let plan = interpreter::interpret_chart_plan(&raw)?;
        info!("📋 Chart plan: {:?}", plan);

        let outcome = self.renderer.render(&plan, df)?;
        warnings.extend(outcome.warnings);

        match outcome.image_path {
            Some(path) => {
                let bytes = fs::read(&path).map_err(|e| {
                    AnalysisError::Render(format!("failed to read chart image: {}", e))
                })?;
                Ok(Some(ChartArtifact {
                    chart_type: plan.chart_type.unwrap_or_default(),
                    image_base64: STANDARD.encode(bytes),
                }))
            }
            None => Ok(None),
        }
    }
}
