use log::{error, info, warn};
use plotters::element::Pie;
use plotters::prelude::*;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::models::chart::{AggregateOp, ChartKind, ChartPlan};

/// Categorical bar/pie series are capped to this many groups, largest first.
pub const TOP_N_CATEGORIES: usize = 10;

const CHART_SIZE: (u32, u32) = (900, 600);
const HISTOGRAM_BINS: usize = 20;

/// Result of one render call. `image_path` is `None` when the plan named an
/// unknown chart type; recovered problems (bad filter, unknown type) are
/// reported as warnings instead of errors.
#[derive(Debug)]
pub struct RenderOutcome {
    pub image_path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Executes a chart plan against a table and draws a PNG.
///
/// Every invocation opens a fresh drawing surface over a new file and
/// finalizes it before returning, so no canvas state survives between
/// question cycles.
#[derive(Clone, Debug)]
pub struct ChartRenderer {
    chart_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(chart_dir: impl Into<PathBuf>) -> Self {
        let chart_dir = chart_dir.into();
        if !chart_dir.exists() {
            fs::create_dir_all(&chart_dir).unwrap_or_else(|e| {
                error!("Failed to create chart directory: {}", e);
            });
        }
        info!("📈 Chart renderer writing to {}", chart_dir.display());
        Self { chart_dir }
    }

    /// Run the plan: resolve the chart kind, apply the optional row filter,
    /// aggregate, and draw. Filter failures fall back to the unfiltered
    /// table with one warning; an unknown chart type yields a warning and no
    /// image. Everything else that goes wrong is a chart sub-step error.
    pub fn render(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
    ) -> Result<RenderOutcome, AnalysisError> {
        let mut warnings = Vec::new();

        let raw_kind = plan.chart_type.as_deref().unwrap_or("(none)");
        let kind = match ChartKind::parse(raw_kind) {
            Some(kind) => kind,
            None => {
                let message = AnalysisError::UnknownChartType(raw_kind.to_string()).to_string();
                warn!("{}", message);
                warnings.push(message);
                return Ok(RenderOutcome {
                    image_path: None,
                    warnings,
                });
            }
        };

        let frame = match apply_filter(df, plan.filter.as_deref()) {
            Ok(filtered) => filtered,
            Err(e) => {
                let message = format!("{}; continuing with the unfiltered table", e);
                warn!("{}", message);
                warnings.push(message);
                df.clone()
            }
        };

        let path = self.chart_dir.join(format!("chart-{}.png", Uuid::new_v4()));
        match kind {
            ChartKind::Bar => self.render_bar(plan, &frame, &path)?,
            ChartKind::Pie => self.render_pie(plan, &frame, &path)?,
            ChartKind::Histogram => self.render_histogram(plan, &frame, &path)?,
            ChartKind::Box => self.render_box(plan, &frame, &path)?,
            ChartKind::Scatter => self.render_scatter(plan, &frame, &path)?,
        }

        info!("✅ Rendered {} chart to {}", kind.as_str(), path.display());
        Ok(RenderOutcome {
            image_path: Some(path),
            warnings,
        })
    }

    fn render_bar(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
        path: &Path,
    ) -> Result<(), AnalysisError> {
        let x = require_column(plan.x.as_deref(), "bar")?;
        let op = plan.operation.as_deref().and_then(AggregateOp::parse);

        let (data, title, y_label) = match (op, plan.y.as_deref()) {
            (Some(AggregateOp::Count), _) | (None, None) | (Some(_), None) => {
                // Frequency is also the fallback when the plan is too sparse
                // to do anything else with.
                let data = frequency_table(df, x, TOP_N_CATEGORIES)?;
                (data, format!("Count of {}", x), "Count".to_string())
            }
            (Some(agg), Some(y)) => {
                let data = aggregate_table(df, x, y, agg, TOP_N_CATEGORIES)?;
                let verb = match agg {
                    AggregateOp::Mean => "Mean",
                    AggregateOp::Sum => "Total",
                    AggregateOp::Count => "Count",
                };
                (data, format!("{} {} by {}", verb, y, x), y.to_string())
            }
            (None, Some(y)) => {
                let data = bar_rows(df, x, y)?;
                (data, format!("{} by {}", y, x), y.to_string())
            }
        };

        if data.is_empty() {
            return Err(AnalysisError::Render(format!(
                "no data to chart for column {}",
                x
            )));
        }
        self.draw_bar(path, &title, &data, &y_label)
    }

    fn render_pie(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
        path: &Path,
    ) -> Result<(), AnalysisError> {
        let x = require_column(plan.x.as_deref(), "pie")?;
        let op = plan.operation.as_deref().and_then(AggregateOp::parse);

        let (data, title) = match (op, plan.y.as_deref()) {
            (Some(AggregateOp::Mean), Some(y)) => (
                aggregate_table(df, x, y, AggregateOp::Mean, TOP_N_CATEGORIES)?,
                format!("Mean {} by {}", y, x),
            ),
            (Some(AggregateOp::Sum), Some(y)) => (
                aggregate_table(df, x, y, AggregateOp::Sum, TOP_N_CATEGORIES)?,
                format!("Total {} by {}", y, x),
            ),
            _ => (
                frequency_table(df, x, TOP_N_CATEGORIES)?,
                format!("Share of {}", x),
            ),
        };

        let slices: Vec<(String, f64)> = data.into_iter().filter(|(_, v)| *v > 0.0).collect();
        if slices.is_empty() {
            return Err(AnalysisError::Render(format!(
                "no positive values to chart for column {}",
                x
            )));
        }
        self.draw_pie(path, &title, &slices)
    }

    fn render_histogram(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
        path: &Path,
    ) -> Result<(), AnalysisError> {
        let x = require_column(plan.x.as_deref(), "hist")?;
        let values = numeric_column(df, x)?;
        self.draw_histogram(path, &format!("Distribution of {}", x), x, &values)
    }

    fn render_box(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
        path: &Path,
    ) -> Result<(), AnalysisError> {
        let x = require_column(plan.x.as_deref(), "box")?;
        let y = plan.y.as_deref().ok_or_else(|| {
            AnalysisError::Render("box chart requires a y column".to_string())
        })?;
        let groups = grouped_numeric(df, x, y)?;
        if groups.is_empty() {
            return Err(AnalysisError::Render(format!(
                "no numeric data in column {}",
                y
            )));
        }
        self.draw_box(path, &format!("{} by {}", y, x), &groups, y)
    }

    fn render_scatter(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
        path: &Path,
    ) -> Result<(), AnalysisError> {
        let x = require_column(plan.x.as_deref(), "scatter")?;
        let y = plan.y.as_deref().ok_or_else(|| {
            AnalysisError::Render("scatter chart requires a y column".to_string())
        })?;
        let points = xy_points(df, x, y)?;
        if points.is_empty() {
            return Err(AnalysisError::Render(format!(
                "no numeric data to chart for {} vs {}",
                x, y
            )));
        }
        self.draw_scatter(path, &format!("{} vs {}", x, y), x, y, &points)
    }

    fn draw_bar(
        &self,
        path: &Path,
        title: &str,
        data: &[(String, f64)],
        y_label: &str,
    ) -> Result<(), AnalysisError> {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let labels: Vec<&str> = data.iter().map(|(label, _)| label.as_str()).collect();
        let (lower, upper) = value_bounds(data.iter().map(|(_, v)| *v));

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(90)
            .y_label_area_size(60)
            .build_cartesian_2d(labels[..].into_segmented(), lower..upper)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_label)
            .x_label_style(
                ("sans-serif", 12)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BLUE.mix(0.7).filled())
                    .margin(6)
                    .data(
                        labels
                            .iter()
                            .zip(data.iter().map(|(_, value)| *value))
                            .map(|(label, value)| (label, value)),
                    ),
            )
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    fn draw_pie(
        &self,
        path: &Path,
        title: &str,
        data: &[(String, f64)],
    ) -> Result<(), AnalysisError> {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let root = root.titled(title, ("sans-serif", 24)).map_err(draw_err)?;

        let sizes: Vec<f64> = data.iter().map(|(_, value)| *value).collect();
        let labels: Vec<String> = data.iter().map(|(label, _)| label.clone()).collect();
        let colors: Vec<RGBColor> = (0..data.len())
            .map(|i| {
                let (r, g, b) =
                    <Palette99 as Palette>::COLORS[i % <Palette99 as Palette>::COLORS.len()];
                RGBColor(r, g, b)
            })
            .collect();

        let center = (CHART_SIZE.0 as i32 / 2, CHART_SIZE.1 as i32 / 2);
        let radius = (CHART_SIZE.1 as f64) * 0.32;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style(("sans-serif", 14).into_font());
        pie.percentages(("sans-serif", 12).into_font().color(&BLACK));

        root.draw(&pie).map_err(draw_err)?;
        root.present().map_err(draw_err)
    }

    fn draw_histogram(
        &self,
        path: &Path,
        title: &str,
        x_label: &str,
        values: &[f64],
    ) -> Result<(), AnalysisError> {
        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).abs() < f64::EPSILON {
            min -= 0.5;
            max += 0.5;
        }

        let bin_width = (max - min) / HISTOGRAM_BINS as f64;
        let mut counts = vec![0usize; HISTOGRAM_BINS];
        for value in values {
            let mut bin = ((value - min) / bin_width) as usize;
            if bin >= HISTOGRAM_BINS {
                bin = HISTOGRAM_BINS - 1;
            }
            counts[bin] += 1;
        }
        let y_max = counts.iter().copied().max().unwrap_or(1) as f64 * 1.15;

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(min..max, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc("Frequency")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, count)| {
                let left = min + i as f64 * bin_width;
                Rectangle::new(
                    [(left, 0.0), (left + bin_width, *count as f64)],
                    BLUE.mix(0.4).filled(),
                )
            }))
            .map_err(draw_err)?;

        // Smoothed density overlay, scaled to the count axis.
        if let Some(density) = density_curve(values, min, max) {
            let scale = values.len() as f64 * bin_width;
            chart
                .draw_series(LineSeries::new(
                    density.into_iter().map(|(x, d)| (x, d * scale)),
                    RED.stroke_width(2),
                ))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)
    }

    fn draw_box(
        &self,
        path: &Path,
        title: &str,
        groups: &[(String, Vec<f64>)],
        y_label: &str,
    ) -> Result<(), AnalysisError> {
        let labels: Vec<&str> = groups.iter().map(|(label, _)| label.as_str()).collect();
        let all: Vec<f64> = groups
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .collect();
        let (lower, upper) = value_bounds(all.iter().copied());

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(90)
            .y_label_area_size(60)
            .build_cartesian_2d(labels[..].into_segmented(), (lower as f32)..(upper as f32))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_label)
            .x_label_style(
                ("sans-serif", 12)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(groups.iter().enumerate().map(|(i, (_, values))| {
                let quartiles = Quartiles::new(values.as_slice());
                Boxplot::new_vertical(SegmentValue::CenterOf(&labels[i]), &quartiles)
                    .width(24)
                    .whisker_width(0.5)
                    .style(BLUE.stroke_width(2))
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    fn draw_scatter(
        &self,
        path: &Path,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
    ) -> Result<(), AnalysisError> {
        let (x_lower, x_upper) = value_bounds(points.iter().map(|(x, _)| *x));
        let (y_lower, y_upper) = value_bounds(points.iter().map(|(_, y)| *y));

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lower..x_upper, y_lower..y_upper)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 4, BLUE.mix(0.6).filled())),
            )
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }
}

fn require_column<'a>(value: Option<&'a str>, kind: &str) -> Result<&'a str, AnalysisError> {
    value.ok_or_else(|| AnalysisError::Render(format!("{} chart requires an x column", kind)))
}

fn draw_err<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::Render(e.to_string())
}

fn render_err(e: PolarsError) -> AnalysisError {
    AnalysisError::Render(e.to_string())
}

/// Axis bounds with 10% headroom, anchored at zero for all-positive data.
fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(value);
        max = max.max(value);
    }
    let upper = if max > 0.0 { max * 1.1 } else { 1.0 };
    let lower = if min < 0.0 { min * 1.1 } else { 0.0 };
    (lower, upper)
}

/// Apply the plan's row filter: a single `column OP value` comparison. Any
/// problem (unknown column, malformed expression, execution failure) is a
/// `Filter` error the caller recovers from by keeping the unfiltered table.
pub(crate) fn apply_filter(
    df: &DataFrame,
    filter: Option<&str>,
) -> Result<DataFrame, AnalysisError> {
    let raw = match filter {
        Some(raw) if !raw.trim().is_empty() => raw.trim(),
        _ => return Ok(df.clone()),
    };

    let (column, operator, value) = split_comparison(raw)?;
    if !df.get_column_names().contains(&column) {
        return Err(AnalysisError::Filter(format!(
            "unknown column '{}' in filter '{}'",
            column, raw
        )));
    }

    let expr = comparison_expr(df, column, operator, value)?;
    df.clone()
        .lazy()
        .filter(expr)
        .collect()
        .map_err(|e| AnalysisError::Filter(format!("failed to apply filter '{}': {}", raw, e)))
}

/// Split `column OP value` on the first recognized operator. Two-character
/// operators are tried first so `>=` is never read as `>`.
fn split_comparison(raw: &str) -> Result<(&str, &str, &str), AnalysisError> {
    for operator in ["==", "!=", "<>", ">=", "<=", ">", "<", "="] {
        if let Some(pos) = raw.find(operator) {
            let column = raw[..pos].trim();
            let value = raw[pos + operator.len()..]
                .trim()
                .trim_matches(|ch| ch == '"' || ch == '\'');
            if column.is_empty() || value.is_empty() {
                return Err(AnalysisError::Filter(format!(
                    "malformed filter expression '{}'",
                    raw
                )));
            }
            return Ok((column, operator, value));
        }
    }
    Err(AnalysisError::Filter(format!(
        "no comparison operator in filter '{}'",
        raw
    )))
}

fn comparison_expr(
    df: &DataFrame,
    column: &str,
    operator: &str,
    value: &str,
) -> Result<Expr, AnalysisError> {
    let numeric = df
        .column(column)
        .map(|s| s.dtype().is_numeric())
        .unwrap_or(false);

    let literal = if numeric {
        let parsed = value.parse::<f64>().map_err(|_| {
            AnalysisError::Filter(format!(
                "'{}' is not a number, but column '{}' is numeric",
                value, column
            ))
        })?;
        lit(parsed)
    } else {
        lit(value.to_string())
    };

    let expr = match operator {
        "=" | "==" => col(column).eq(literal),
        "!=" | "<>" => col(column).neq(literal),
        ">" => col(column).gt(literal),
        "<" => col(column).lt(literal),
        ">=" => col(column).gt_eq(literal),
        "<=" => col(column).lt_eq(literal),
        other => {
            return Err(AnalysisError::Filter(format!(
                "unsupported operator '{}'",
                other
            )))
        }
    };
    Ok(expr)
}

/// Frequency of each distinct `x` value, descending, capped at `limit`.
pub(crate) fn frequency_table(
    df: &DataFrame,
    x: &str,
    limit: usize,
) -> Result<Vec<(String, f64)>, AnalysisError> {
    let counts = df
        .clone()
        .lazy()
        .group_by([col(x)])
        .agg([col(x).count().alias("count")])
        .collect()
        .map_err(render_err)?;

    let sorted = counts.sort(["count"], vec![true], false).map_err(render_err)?;
    let top = sorted.head(Some(limit));
    label_value_pairs(&top, x, "count")
}

/// Group rows by `x` and aggregate `y`, descending by the aggregate, capped
/// at `limit`.
pub(crate) fn aggregate_table(
    df: &DataFrame,
    x: &str,
    y: &str,
    op: AggregateOp,
    limit: usize,
) -> Result<Vec<(String, f64)>, AnalysisError> {
    let agg_expr = match op {
        AggregateOp::Mean => col(y).mean(),
        AggregateOp::Sum => col(y).sum(),
        AggregateOp::Count => col(y).count(),
    };

    let grouped = df
        .clone()
        .lazy()
        .group_by([col(x)])
        .agg([agg_expr])
        .collect()
        .map_err(render_err)?;

    let sorted = grouped.sort([y], vec![true], false).map_err(render_err)?;
    let top = sorted.head(Some(limit));
    label_value_pairs(&top, x, y)
}

/// `x` vs `y` as given, row by row, no aggregation and no capping.
pub(crate) fn bar_rows(
    df: &DataFrame,
    x: &str,
    y: &str,
) -> Result<Vec<(String, f64)>, AnalysisError> {
    label_value_pairs(df, x, y)
}

fn label_value_pairs(
    df: &DataFrame,
    label_col: &str,
    value_col: &str,
) -> Result<Vec<(String, f64)>, AnalysisError> {
    let labels_series = df
        .column(label_col)
        .map_err(render_err)?
        .cast(&DataType::Utf8)
        .map_err(render_err)?;
    let labels = labels_series.utf8().map_err(render_err)?;

    let values_series = df
        .column(value_col)
        .map_err(render_err)?
        .cast(&DataType::Float64)
        .map_err(render_err)?;
    let values = values_series.f64().map_err(render_err)?;

    let mut pairs = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let label = labels.get(i).unwrap_or("(missing)").to_string();
        if let Some(value) = values.get(i) {
            pairs.push((label, value));
        }
    }
    Ok(pairs)
}

/// Non-null values of a column as f64, or a render error when the column has
/// no numeric content at all.
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, AnalysisError> {
    let series = df
        .column(name)
        .map_err(render_err)?
        .cast(&DataType::Float64)
        .map_err(|_| AnalysisError::Render(format!("column {} is not numeric", name)))?;
    let values: Vec<f64> = series
        .f64()
        .map_err(render_err)?
        .into_iter()
        .flatten()
        .collect();

    if values.is_empty() {
        return Err(AnalysisError::Render(format!(
            "no numeric data in column {}",
            name
        )));
    }
    Ok(values)
}

/// Paired numeric rows of `x` and `y`, skipping rows where either is missing.
pub(crate) fn xy_points(
    df: &DataFrame,
    x: &str,
    y: &str,
) -> Result<Vec<(f64, f64)>, AnalysisError> {
    let xs_series = df
        .column(x)
        .map_err(render_err)?
        .cast(&DataType::Float64)
        .map_err(|_| AnalysisError::Render(format!("column {} is not numeric", x)))?;
    let ys_series = df
        .column(y)
        .map_err(render_err)?
        .cast(&DataType::Float64)
        .map_err(|_| AnalysisError::Render(format!("column {} is not numeric", y)))?;
    let xs = xs_series.f64().map_err(render_err)?;
    let ys = ys_series.f64().map_err(render_err)?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(a), Some(b)) = (xs.get(i), ys.get(i)) {
            points.push((a, b));
        }
    }
    Ok(points)
}

/// `y` values grouped by distinct `x`, preserving first-seen group order.
pub(crate) fn grouped_numeric(
    df: &DataFrame,
    x: &str,
    y: &str,
) -> Result<Vec<(String, Vec<f64>)>, AnalysisError> {
    let labels_series = df
        .column(x)
        .map_err(render_err)?
        .cast(&DataType::Utf8)
        .map_err(render_err)?;
    let values_series = df
        .column(y)
        .map_err(render_err)?
        .cast(&DataType::Float64)
        .map_err(|_| AnalysisError::Render(format!("column {} is not numeric", y)))?;
    let labels = labels_series.utf8().map_err(render_err)?;
    let values = values_series.f64().map_err(render_err)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for i in 0..df.height() {
        let (Some(label), Some(value)) = (labels.get(i), values.get(i)) else {
            continue;
        };
        if !groups.contains_key(label) {
            order.push(label.to_string());
        }
        groups.entry(label.to_string()).or_default().push(value);
    }

    Ok(order
        .into_iter()
        .map(|label| {
            let values = groups.remove(&label).unwrap_or_default();
            (label, values)
        })
        .collect())
}

/// Gaussian-kernel density estimate over `[min, max]`, Silverman bandwidth.
/// Returns `None` for degenerate samples (too few points or zero spread).
fn density_curve(values: &[f64], min: f64, max: f64) -> Option<Vec<(f64, f64)>> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    let std_dev = variance.sqrt();
    if std_dev < f64::EPSILON {
        return None;
    }

    let bandwidth = 1.06 * std_dev * (n as f64).powf(-0.2);
    let steps = 200;
    let step = (max - min) / steps as f64;

    let mut curve = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let x = min + i as f64 * step;
        let density = values
            .iter()
            .map(|v| {
                let z = (x - v) / bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        curve.push((x, density));
    }
    Some(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn people() -> DataFrame {
        df!(
            "department" => ["Eng", "Eng", "Sales"],
            "salary" => [100_000i64, 120_000, 90_000]
        )
        .unwrap()
    }

    #[test]
    fn mean_by_group_matches_expected_values() {
        let data = aggregate_table(
            &people(),
            "department",
            "salary",
            AggregateOp::Mean,
            TOP_N_CATEGORIES,
        )
        .unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].0, "Eng");
        assert!((data[0].1 - 110_000.0).abs() < 1e-9);
        assert_eq!(data[1].0, "Sales");
        assert!((data[1].1 - 90_000.0).abs() < 1e-9);
    }

    #[test]
    fn frequency_is_capped_and_descending() {
        let mut cities = Vec::new();
        for i in 0..12 {
            // city-0 appears 13 times, city-1 12 times, and so on
            for _ in 0..(13 - i) {
                cities.push(format!("city-{}", i));
            }
        }
        let frame = df!("city" => cities).unwrap();

        let data = frequency_table(&frame, "city", TOP_N_CATEGORIES).unwrap();
        assert_eq!(data.len(), TOP_N_CATEGORIES);
        assert_eq!(data[0].0, "city-0");
        assert!((data[0].1 - 13.0).abs() < 1e-9);
        for window in data.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn string_equality_filter_keeps_matching_rows() {
        let filtered = apply_filter(&people(), Some("department == \"Eng\"")).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn numeric_relational_filter_applies() {
        let filtered = apply_filter(&people(), Some("salary > 95000")).unwrap();
        assert_eq!(filtered.height(), 2);

        let filtered = apply_filter(&people(), Some("salary <= 90000")).unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn unknown_column_filter_is_a_filter_error() {
        let err = apply_filter(&people(), Some("region == \"EU\""));
        assert!(matches!(err, Err(AnalysisError::Filter(_))));
    }

    #[test]
    fn malformed_filter_is_a_filter_error() {
        let err = apply_filter(&people(), Some("department is Eng"));
        assert!(matches!(err, Err(AnalysisError::Filter(_))));

        let err = apply_filter(&people(), Some("salary > lots"));
        assert!(matches!(err, Err(AnalysisError::Filter(_))));
    }

    #[test]
    fn absent_filter_is_a_clean_clone() {
        let filtered = apply_filter(&people(), None).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn unknown_chart_type_warns_and_renders_nothing() {
        let renderer = ChartRenderer::new(std::env::temp_dir().join("tabletalk-test-charts"));
        let plan = ChartPlan {
            chart_type: Some("scatterplot".to_string()),
            x: Some("department".to_string()),
            ..ChartPlan::default()
        };

        let outcome = renderer.render(&plan, &people()).unwrap();
        assert!(outcome.image_path.is_none());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("scatterplot"));
    }

    #[test]
    fn missing_chart_type_warns_and_renders_nothing() {
        let renderer = ChartRenderer::new(std::env::temp_dir().join("tabletalk-test-charts"));
        let outcome = renderer.render(&ChartPlan::default(), &people()).unwrap();
        assert!(outcome.image_path.is_none());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn filter_failure_falls_back_to_full_group_data() {
        // Filter references a column that does not exist; grouping still
        // sees all three rows.
        let frame = apply_filter(&people(), Some("region == \"EU\"")).unwrap_or_else(|_| people());
        let data = frequency_table(&frame, "department", TOP_N_CATEGORIES).unwrap();
        assert_eq!(data[0], ("Eng".to_string(), 2.0));
        assert_eq!(data[1], ("Sales".to_string(), 1.0));
    }

    #[test]
    fn density_curve_integrates_to_roughly_one() {
        let values: Vec<f64> = (0..100).map(|i| (i % 17) as f64).collect();
        let curve = density_curve(&values, 0.0, 16.0).unwrap();
        let step = 16.0 / 200.0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!(area > 0.7 && area < 1.3);
    }

    #[test]
    fn grouped_numeric_preserves_first_seen_order() {
        let groups = grouped_numeric(&people(), "department", "salary").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Eng");
        assert_eq!(groups[0].1, vec![100_000.0, 120_000.0]);
        assert_eq!(groups[1].0, "Sales");
    }
}
