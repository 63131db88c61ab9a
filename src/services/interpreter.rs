use log::{debug, error};

use crate::error::AnalysisError;
use crate::models::chart::ChartPlan;

/// Turns opaque oracle text into a usable artifact.

/// The insight is the oracle text verbatim, surrounding whitespace removed.
/// No content validation.
pub fn interpret_insight(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parse the oracle's chart-plan reply into a `ChartPlan`.
///
/// The oracle is asked for bare JSON but often wraps it in a markdown fence
/// anyway, so a leading ```json (any case) and a trailing ``` are stripped
/// before parsing. Missing fields default to `None`; unknown `chart_type`
/// values are deferred to the renderer. Anything that still fails to parse
/// as a single JSON object is a `ResponseFormat` error, terminal for the
/// chart sub-step.
pub fn interpret_chart_plan(raw: &str) -> Result<ChartPlan, AnalysisError> {
    let cleaned = strip_code_fence(raw);
    debug!("Parsing chart plan ({} chars after cleanup)", cleaned.len());

    serde_json::from_str::<ChartPlan>(cleaned).map_err(|e| {
        error!("Chart plan is not valid JSON: {}. Raw content: {}", e, raw);
        AnalysisError::ResponseFormat(e.to_string())
    })
}

/// Strip a leading code fence (optionally tagged `json`, case-insensitive)
/// and a trailing bare fence. Idempotent, and a no-op on unfenced text.
fn strip_code_fence(text: &str) -> &str {
    let mut t = text.trim();

    if let Some(rest) = t.strip_prefix("```") {
        let rest = rest.trim_start();
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        t = rest.trim_start();
    }

    if let Some(rest) = t.strip_suffix("```") {
        t = rest.trim_end();
    }

    t
}
