///! Terminal dashboard: widgets refetch on every data generation

use super::Context;
use anyhow::{Context as _, Result};
use colored::Colorize;
use plantd_cli::output;
use plantd_cli::refresh::DataGeneration;
use plantd_cli::shutdown::Shutdown;
use plantd_cli::widget::{WidgetData, WidgetFetcher, WidgetState};
use plantd_common::dashboard::{format_value, Channel, DashboardSpec, DataPoint, RedisValue, WidgetSpec};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tabled::builder::Builder;
use tokio::sync::mpsc;

pub async fn run(ctx: &Context, file: &Path, refresh: Option<u64>, once: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let dashboard = DashboardSpec::from_yaml(&text)?;
    if dashboard.widgets.is_empty() {
        output::print_warning("Dashboard has no widgets");
        return Ok(());
    }

    let generation = DataGeneration::new();
    let source = Arc::new(ctx.api.clone());
    let fetchers: Vec<WidgetFetcher> = dashboard
        .widgets
        .iter()
        .cloned()
        .map(|widget| WidgetFetcher::spawn(widget, source.clone(), &generation))
        .collect();

    if once {
        for fetcher in &fetchers {
            let mut updates = fetcher.subscribe();
            updates
                .wait_for(|update| update.state != WidgetState::Loading)
                .await?;
        }
        print_frame(&dashboard, &fetchers);
        return Ok(());
    }

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let period = refresh.unwrap_or(dashboard.refresh_seconds);
    let _ticker = (period > 0).then(|| generation.start_ticker(Duration::from_secs(period)));
    spawn_manual_refresh(generation.clone());
    output::print_info("Press Enter to refresh, Ctrl-C to quit");

    let (tx, mut updates) = mpsc::channel::<()>(fetchers.len());
    for fetcher in &fetchers {
        let mut rx = fetcher.subscribe();
        let tx = tx.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let mut stop = shutdown.subscribe();
    let mut rendered = None;
    loop {
        let current = generation.current();
        let settled = fetchers.iter().all(|f| {
            let latest = f.latest();
            latest.generation == current && latest.state != WidgetState::Loading
        });
        if settled && rendered != Some(current) {
            print_frame(&dashboard, &fetchers);
            rendered = Some(current);
        }

        tokio::select! {
            update = updates.recv() => {
                if update.is_none() {
                    break;
                }
            }
            _ = stop.changed() => break,
        }
    }

    Ok(())
}

/// Each line on stdin bumps the generation
fn spawn_manual_refresh(generation: DataGeneration) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            let next = generation.bump();
            tracing::debug!(generation = next, "manual refresh");
        }
    });
}

fn print_frame(dashboard: &DashboardSpec, fetchers: &[WidgetFetcher]) {
    let title: &str = if dashboard.title.is_empty() { "Dashboard" } else { &dashboard.title };
    println!(
        "\n{} {}",
        title.bold(),
        chrono::Local::now().format("%H:%M:%S").to_string().dimmed()
    );
    for (spec, fetcher) in dashboard.widgets.iter().zip(fetchers) {
        println!("{}", render_widget(spec, &fetcher.latest().state));
    }
}

fn render_widget(spec: &WidgetSpec, state: &WidgetState) -> String {
    let body = match state {
        WidgetState::Loading => "loading...".dimmed().to_string(),
        WidgetState::Failed(message) => message.red().to_string(),
        WidgetState::Ready(WidgetData::Series(points)) if points.is_empty() => "No data".yellow().to_string(),
        WidgetState::Ready(WidgetData::Series(points)) => match spec.kind.channel() {
            Channel::Bi => render_values(spec, points),
            Channel::Tri => render_series(spec, points),
        },
        WidgetState::Ready(WidgetData::Redis(value)) => render_redis(spec, value),
    };
    format!("{} ({})\n{}", spec.title.cyan().bold(), spec.kind, body)
}

/// One value per series
fn render_values(spec: &WidgetSpec, points: &[DataPoint]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Series".to_string(), spec.display.y_title.clone().unwrap_or_else(|| "Value".into())]);
    for point in points {
        builder.push_record([point.series.clone(), format_value(point.y, spec.display.value_format)]);
    }
    builder.build().to_string()
}

/// Per-series summary of x/y samples
fn render_series(spec: &WidgetSpec, points: &[DataPoint]) -> String {
    let mut series: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for point in points {
        series.entry(point.series.as_str()).or_default().push(point.y);
    }

    let format = spec.display.value_format;
    let mut builder = Builder::default();
    builder.push_record(["Series", "Points", "Last", "Min", "Max"]);
    for (name, values) in series {
        let last = values.last().copied().unwrap_or_default();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        builder.push_record([
            name.to_string(),
            values.len().to_string(),
            format_value(last, format),
            format_value(min, format),
            format_value(max, format),
        ]);
    }
    builder.build().to_string()
}

fn render_redis(spec: &WidgetSpec, value: &RedisValue) -> String {
    let scalar = |value: &Value| match value {
        Value::Number(n) => n
            .as_f64()
            .map(|v| format_value(v, spec.display.value_format))
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match value {
        RedisValue::Scalar(value) => scalar(value),
        RedisValue::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join("\n"),
        RedisValue::Table(table) if table.headers.is_empty() => "No data".yellow().to_string(),
        RedisValue::Table(table) => {
            let mut builder = Builder::default();
            builder.push_record(table.headers.iter().cloned());
            for row in &table.rows {
                builder.push_record(row.iter().map(|c| output::truncate(c, 32)));
            }
            builder.build().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantd_common::dashboard::{CsvTable, DataRequest, DisplayOptions, RedisFormat, ValueFormat, WidgetKind};

    fn widget(kind: WidgetKind, value_format: ValueFormat) -> WidgetSpec {
        WidgetSpec {
            title: "Throughput".into(),
            kind,
            request: DataRequest::Redis {
                key: "throughput".into(),
                format: RedisFormat::Value,
            },
            display: DisplayOptions {
                value_format,
                ..Default::default()
            },
        }
    }

    fn point(series: &str, x: f64, y: f64) -> DataPoint {
        DataPoint {
            x: Some(x),
            y,
            series: series.into(),
        }
    }

    #[test]
    fn test_series_summary() {
        colored::control::set_override(false);
        let spec = widget(WidgetKind::Line, ValueFormat::Number);
        let points = vec![point("a", 1.0, 3.0), point("a", 2.0, 1.5), point("b", 1.0, 7.0)];
        let text = render_series(&spec, &points);
        assert!(text.contains("Points"));
        let row_a = text.lines().find(|l| l.contains(" a ")).unwrap();
        assert!(row_a.contains(" 2 "));
        assert!(row_a.contains("1.5"));
        assert!(row_a.contains(" 3 "));
    }

    #[test]
    fn test_redis_rendering() {
        let spec = widget(WidgetKind::Gauge, ValueFormat::Percent);
        assert_eq!(render_redis(&spec, &RedisValue::Scalar(serde_json::json!(42.34))), "42.3%");
        assert_eq!(
            render_redis(&spec, &RedisValue::Array(vec![serde_json::json!("x"), serde_json::json!(5)])),
            "x\n5.0%"
        );
        let table = RedisValue::Table(CsvTable::parse("device,count\nsensor,3\n"));
        let text = render_redis(&spec, &table);
        assert!(text.contains("device"));
        assert!(text.contains("sensor"));
    }

    #[test]
    fn test_widget_states() {
        colored::control::set_override(false);
        let spec = widget(WidgetKind::Bar, ValueFormat::Bytes);
        assert!(render_widget(&spec, &WidgetState::Failed("Server error".into())).ends_with("Server error"));
        assert!(render_widget(&spec, &WidgetState::Ready(WidgetData::Series(vec![]))).ends_with("No data"));
        let ready = WidgetState::Ready(WidgetData::Series(vec![point("disk", 0.0, 2048.0)]));
        assert!(render_widget(&spec, &ready).contains("2.0 KB"));
    }
}
