use crate::models::dataset::SchemaSummary;

/// Prompt composition. Both builders are pure: identical inputs produce
/// identical prompt text, and the instruction to return only the requested
/// artifact (prose for insights, one JSON object for chart plans) is part of
/// the contract with the oracle, not optional framing.

/// Ask the oracle for a natural-language answer about the dataset.
pub fn insight_prompt(sample: &str, columns: &[String], question: &str) -> String {
    format!(
        r#"You are a data analyst. Here is a preview of the dataset (first rows):
{sample}

Column names: {columns}

Answer this question about the dataset: {question}

Answer in plain prose only. Do not return code, JSON, or markdown tables."#,
        sample = sample,
        columns = columns.join(", "),
        question = question,
    )
}

/// Ask the oracle for a chart specification as a single JSON object.
pub fn chart_plan_prompt(sample: &str, schema: &SchemaSummary, question: &str) -> String {
    let column_lines: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            format!(
                "- {} ({}): e.g. {}",
                col.name,
                col.data_type,
                if col.examples.is_empty() {
                    "no values".to_string()
                } else {
                    col.examples.join(", ")
                }
            )
        })
        .collect();

    format!(
        r#"You are a data visualization planner. Here is a preview of the dataset (first rows):
{sample}

Columns with example values:
{columns}

The user asked: {question}

Choose the best chart for this question and respond with exactly one JSON object, no surrounding prose and no markdown fences, in this shape:
{{
    "chart_type": "bar" | "pie" | "hist" | "box" | "scatter",
    "x": "<column name>",
    "y": "<column name>" | null,
    "operation": "count" | "mean" | "sum" | null,
    "filter": "<column> <op> <value>" | null
}}

The filter, when present, must be a single comparison over one column using one of == != > < >= <=."#,
        sample = sample,
        columns = column_lines.join("\n"),
        question = question,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dataset::ColumnSummary;

    fn schema() -> SchemaSummary {
        SchemaSummary {
            row_count: 3,
            column_count: 2,
            columns: vec![
                ColumnSummary {
                    name: "department".to_string(),
                    data_type: "string".to_string(),
                    examples: vec!["Eng".to_string(), "Sales".to_string()],
                },
                ColumnSummary {
                    name: "salary".to_string(),
                    data_type: "integer".to_string(),
                    examples: vec!["100000".to_string()],
                },
            ],
        }
    }

    #[test]
    fn insight_prompt_embeds_sample_columns_and_question() {
        let prompt = insight_prompt(
            "a,b\n1,2",
            &["a".to_string(), "b".to_string()],
            "what is b?",
        );
        assert!(prompt.contains("a,b\n1,2"));
        assert!(prompt.contains("Column names: a, b"));
        assert!(prompt.contains("what is b?"));
        assert!(prompt.contains("plain prose only"));
    }

    #[test]
    fn chart_prompt_demands_a_single_json_object() {
        let prompt = chart_plan_prompt("department,salary\nEng,100000", &schema(), "avg salary?");
        assert!(prompt.contains("exactly one JSON object"));
        assert!(prompt.contains("\"chart_type\""));
        assert!(prompt.contains("- department (string): e.g. Eng, Sales"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let a = chart_plan_prompt("s", &schema(), "q");
        let b = chart_plan_prompt("s", &schema(), "q");
        assert_eq!(a, b);
    }
}
