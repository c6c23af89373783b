// Handlers turning the windowed series into chart specs for the rendering layer
use chrono::{DateTime, Utc};
use shared::models::{ChartRender, ChartSpec, ChartTrace, DashboardCharts, PriceRecord, SentimentSnapshot, Series};
use std::path::Path;

use super::helpers::{min_max_normalize, to_chart_points};
use crate::data::market_data::DashboardState;
use crate::error::EngineError;

pub fn render_price_chart(series: &Series<PriceRecord>, window_hours: u32) -> ChartRender {
    if series.is_empty() {
        return ChartRender::no_data();
    }
    ChartRender::Chart(ChartSpec {
        title: format!("Bitcoin Price (Last {} Hours)", window_hours),
        x_axis_title: "Time".to_string(),
        y_axis_title: "Price (USD)".to_string(),
        traces: vec![ChartTrace {
            name: "Bitcoin Price".to_string(),
            color: "blue".to_string(),
            mode: "lines+markers".to_string(),
            points: to_chart_points(series.records(), |r| r.price),
        }],
    })
}

pub fn render_sentiment_chart(series: &Series<SentimentSnapshot>, window_hours: u32) -> ChartRender {
    if series.is_empty() {
        return ChartRender::no_data();
    }
    ChartRender::Chart(ChartSpec {
        title: format!("Sentiment Compound (Last {} Hours)", window_hours),
        x_axis_title: "Time".to_string(),
        y_axis_title: "Compound".to_string(),
        traces: vec![ChartTrace {
            name: "Sentiment compound mean".to_string(),
            color: "red".to_string(),
            mode: "lines+markers".to_string(),
            points: to_chart_points(series.records(), |s| s.compound_mean),
        }],
    })
}

// Both series scaled to [0, 1] on one chart so their movements can be compared.
pub fn render_overlay_chart(price: &Series<PriceRecord>, sentiment: &Series<SentimentSnapshot>) -> ChartRender {
    if price.is_empty() || sentiment.is_empty() {
        return ChartRender::no_data();
    }
    ChartRender::Chart(ChartSpec {
        title: "Bitcoin Price and Sentiment (Normalized)".to_string(),
        x_axis_title: "Time".to_string(),
        y_axis_title: "Normalized value".to_string(),
        traces: vec![
            ChartTrace {
                name: "Bitcoin Price Norm".to_string(),
                color: "blue".to_string(),
                mode: "lines".to_string(),
                points: min_max_normalize(&to_chart_points(price.records(), |r| r.price)),
            },
            ChartTrace {
                name: "Sentiment Norm".to_string(),
                color: "red".to_string(),
                mode: "lines".to_string(),
                points: min_max_normalize(&to_chart_points(sentiment.records(), |s| s.compound_mean)),
            },
        ],
    })
}

pub fn handle_render(state: &DashboardState, window_hours: u32, now: DateTime<Utc>) -> DashboardCharts {
    DashboardCharts {
        rendered_at: now,
        price: render_price_chart(&state.price_series, window_hours),
        sentiment: render_sentiment_chart(&state.sentiment_series, window_hours),
        overlay: render_overlay_chart(&state.price_series, &state.sentiment_series),
    }
}

// Writes the chart set as `dashboard_charts.json` under `dir` for file-watching front ends.
pub async fn write_charts(dir: &Path, charts: &DashboardCharts) -> Result<(), EngineError> {
    tokio::fs::create_dir_all(dir).await?;
    let json = serde_json::to_vec_pretty(charts)
        .map_err(|e| EngineError::ProcessingError(format!("Failed to serialize charts: {}", e)))?;
    // Write-then-rename so readers never see a half-written file.
    let tmp = dir.join("dashboard_charts.json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, dir.join("dashboard_charts.json")).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn state() -> DashboardState {
        DashboardState {
            price_series: Series::from_records(vec![
                PriceRecord { timestamp: t(0), currency: "usd".to_string(), price: 100.0 },
                PriceRecord { timestamp: t(10), currency: "usd".to_string(), price: 110.0 },
            ]),
            sentiment_series: Series::from_records(vec![SentimentSnapshot {
                timestamp: t(5),
                positive_count: 3,
                negative_count: 1,
                neutral_count: 1,
                compound_mean: 0.2,
            }]),
        }
    }

    #[test]
    fn test_empty_series_render_no_data() {
        let charts = handle_render(&DashboardState::new(), 12, t(0));
        for chart in [&charts.price, &charts.sentiment, &charts.overlay] {
            assert_eq!(chart, &ChartRender::Empty { title: "No data available".to_string() });
        }
    }

    #[test]
    fn test_price_chart_layout() {
        let chart = render_price_chart(&state().price_series, 12);
        let spec = match chart {
            ChartRender::Chart(spec) => spec,
            other => panic!("expected a chart, got {:?}", other),
        };
        assert_eq!(spec.title, "Bitcoin Price (Last 12 Hours)");
        assert_eq!(spec.y_axis_title, "Price (USD)");
        let ys: Vec<f64> = spec.traces[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![100.0, 110.0]);
    }

    #[test]
    fn test_overlay_normalizes_each_trace() {
        match render_overlay_chart(&state().price_series, &state().sentiment_series) {
            ChartRender::Chart(spec) => {
                let price_ys: Vec<f64> = spec.traces[0].points.iter().map(|p| p.y).collect();
                assert_eq!(price_ys, vec![0.0, 1.0]);
                assert_eq!(spec.traces[1].points[0].y, 0.5);
            }
            other => panic!("expected a chart, got {:?}", other),
        }
    }

    #[test]
    fn test_overlay_needs_both_series() {
        let partial = DashboardState { sentiment_series: Series::new(), ..state() };
        assert!(handle_render(&partial, 12, t(0)).overlay.is_empty());
        assert!(!handle_render(&partial, 12, t(0)).price.is_empty());
    }

    #[tokio::test]
    async fn test_write_charts_creates_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let charts = handle_render(&state(), 12, t(20));
        write_charts(&dir.path().join("charts"), &charts).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("charts/dashboard_charts.json")).unwrap();
        let parsed: DashboardCharts = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, charts);
    }
}
