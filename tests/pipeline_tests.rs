//! End-to-end question cycles over a scripted oracle.

use anyhow::{anyhow, Result};
use chrono::Utc;
use uuid::Uuid;

use tabletalk::error::AnalysisError;
use tabletalk::models::dataset::{AskRequest, DatasetFormat, StoredDataset};
use tabletalk::services::{
    AnalysisService, ChartRenderer, DatasetStore, MemoryDatasetStore, OracleService,
};

const PEOPLE_CSV: &[u8] = b"department,salary\nEng,100000\nEng,120000\nSales,90000\n";

/// Oracle double with one canned reply per prompt kind. `None` simulates a
/// failed call for that kind only.
#[derive(Clone, Debug)]
struct ScriptedOracle {
    insight_reply: Option<String>,
    chart_reply: Option<String>,
}

#[async_trait::async_trait]
impl OracleService for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> Result<String> {
        // The chart-plan prompt is the one that demands a JSON object.
        let reply = if prompt.contains("exactly one JSON object") {
            &self.chart_reply
        } else {
            &self.insight_reply
        };
        reply
            .clone()
            .ok_or_else(|| anyhow!("oracle unavailable"))
    }
}

async fn seeded_service(
    oracle: ScriptedOracle,
) -> (AnalysisService<MemoryDatasetStore, ScriptedOracle>, Uuid) {
    let store = MemoryDatasetStore::new();
    let dataset_id = Uuid::new_v4();
    store
        .put_dataset(StoredDataset {
            id: dataset_id,
            filename: "people.csv".to_string(),
            format: DatasetFormat::Csv,
            bytes: PEOPLE_CSV.to_vec(),
            uploaded_at: Utc::now(),
        })
        .await
        .expect("failed to seed dataset");

    let renderer = ChartRenderer::new(std::env::temp_dir().join("tabletalk-pipeline-tests"));
    (AnalysisService::new(store, oracle, renderer), dataset_id)
}

fn ask(dataset_id: Uuid, question: &str) -> AskRequest {
    AskRequest {
        dataset_id,
        question: question.to_string(),
    }
}

#[tokio::test]
async fn unknown_chart_type_warns_without_failing_the_cycle() {
    let oracle = ScriptedOracle {
        insight_reply: Some("Eng has the highest average salary.".to_string()),
        chart_reply: Some(
            "```json\n{\"chart_type\":\"scatterplot\",\"x\":\"department\"}\n```".to_string(),
        ),
    };
    let (service, dataset_id) = seeded_service(oracle).await;

    let response = service
        .ask(ask(dataset_id, "average salary by department"))
        .await
        .unwrap();

    assert_eq!(
        response.insight.as_deref(),
        Some("Eng has the highest average salary.")
    );
    assert!(response.chart.is_none());
    assert!(response.chart_error.is_none());
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("scatterplot"));
}

#[tokio::test]
async fn prose_chart_reply_surfaces_format_error_but_keeps_insight() {
    let oracle = ScriptedOracle {
        insight_reply: Some("Sales earns the least.".to_string()),
        chart_reply: Some("A bar chart of salary by department would work well.".to_string()),
    };
    let (service, dataset_id) = seeded_service(oracle).await;

    let response = service
        .ask(ask(dataset_id, "who earns least?"))
        .await
        .unwrap();

    assert_eq!(response.insight.as_deref(), Some("Sales earns the least."));
    assert!(response.chart.is_none());
    let chart_error = response.chart_error.expect("expected a chart error");
    assert!(chart_error.contains("not a valid chart plan"));
}

#[tokio::test]
async fn insight_oracle_failure_does_not_block_the_chart_substep() {
    let oracle = ScriptedOracle {
        insight_reply: None,
        chart_reply: Some("{\"chart_type\":\"scatterplot\",\"x\":\"department\"}".to_string()),
    };
    let (service, dataset_id) = seeded_service(oracle).await;

    let response = service.ask(ask(dataset_id, "anything")).await.unwrap();

    assert!(response.insight.is_none());
    let insight_error = response.insight_error.expect("expected an insight error");
    assert!(insight_error.contains("oracle request failed"));
    // The chart sub-step still ran and produced its own outcome.
    assert!(response.chart_error.is_none());
    assert_eq!(response.warnings.len(), 1);
}

#[tokio::test]
async fn chart_oracle_failure_does_not_block_the_insight_substep() {
    let oracle = ScriptedOracle {
        insight_reply: Some("Three rows, two departments.".to_string()),
        chart_reply: None,
    };
    let (service, dataset_id) = seeded_service(oracle).await;

    let response = service.ask(ask(dataset_id, "describe the data")).await.unwrap();

    assert_eq!(
        response.insight.as_deref(),
        Some("Three rows, two departments.")
    );
    let chart_error = response.chart_error.expect("expected a chart error");
    assert!(chart_error.contains("oracle request failed"));
}

#[tokio::test]
async fn asking_about_a_missing_dataset_is_not_found() {
    let oracle = ScriptedOracle {
        insight_reply: Some("unused".to_string()),
        chart_reply: Some("unused".to_string()),
    };
    let (service, _) = seeded_service(oracle).await;

    let err = service.ask(ask(Uuid::new_v4(), "anything")).await;
    assert!(matches!(err, Err(AnalysisError::DatasetNotFound(_))));
}

#[tokio::test]
async fn unknown_chart_type_takes_priority_over_filter_warnings() {
    let oracle = ScriptedOracle {
        insight_reply: Some("ok".to_string()),
        chart_reply: Some(
            // Unknown chart type keeps the renderer from drawing, but the
            // plan still flows through interpretation untouched.
            "{\"chart_type\":\"heatmap\",\"x\":\"department\",\"filter\":\"region == 'EU'\"}"
                .to_string(),
        ),
    };
    let (service, dataset_id) = seeded_service(oracle).await;

    let response = service.ask(ask(dataset_id, "anything")).await.unwrap();

    // Unknown type short-circuits before filtering, so exactly one warning.
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("heatmap"));
    assert!(response.chart.is_none());
}
