//! Dashboard widgets: what they fetch and how they display it

use crate::util::get_step;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Gauge,
    Pie,
    Bar,
    Line,
    Area,
    Scatter,
}

impl WidgetKind {
    /// Gauge, pie and bar plot one value per series; the others plot x/y pairs
    pub fn channel(self) -> Channel {
        match self {
            Self::Gauge | Self::Pie | Self::Bar => Channel::Bi,
            Self::Line | Self::Area | Self::Scatter => Channel::Tri,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gauge => "gauge",
            Self::Pie => "pie",
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Area => "area",
            Self::Scatter => "scatter",
        };
        f.write_str(name)
    }
}

/// Data endpoint shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Bi,
    Tri,
}

impl Channel {
    pub fn path(self) -> &'static str {
        match self {
            Self::Bi => "/data/bi-channel",
            Self::Tri => "/data/tri-channel",
        }
    }
}

fn default_lookback() -> i64 {
    3600
}

fn default_points() -> u32 {
    60
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedisFormat {
    /// JSON scalar or array
    #[default]
    Value,
    Csv,
}

/// Declarative description of the data behind a widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum DataRequest {
    #[serde(rename_all = "camelCase")]
    PrometheusRange {
        query: String,
        #[serde(default = "default_lookback")]
        lookback_seconds: i64,
        #[serde(default = "default_points")]
        points: u32,
    },
    PrometheusInstant { query: String },
    Redis {
        key: String,
        #[serde(default)]
        format: RedisFormat,
    },
}

/// Body posted to a channel endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl DataRequest {
    /// Prometheus query anchored at `now`; `None` for Redis-backed widgets
    pub fn channel_query(&self, now: DateTime<Utc>) -> Option<ChannelQuery> {
        let now = now.timestamp();
        match self {
            Self::PrometheusRange {
                query,
                lookback_seconds,
                points,
            } => {
                let start = now - lookback_seconds;
                Some(ChannelQuery {
                    query: query.clone(),
                    start: Some(start),
                    end: Some(now),
                    step: Some(get_step(start, now, *points)),
                    time: None,
                })
            }
            Self::PrometheusInstant { query } => Some(ChannelQuery {
                query: query.clone(),
                start: None,
                end: None,
                step: None,
                time: Some(now),
            }),
            Self::Redis { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    pub y: f64,
    #[serde(default)]
    pub series: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub result: Vec<DataPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Number,
    Percent,
    Bytes,
    Duration,
}

/// Renders a sample for display. Percent expects a 0-100 value, duration seconds.
pub fn format_value(value: f64, format: ValueFormat) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    match format {
        ValueFormat::Number => {
            let text = format!("{:.2}", value);
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        ValueFormat::Percent => format!("{:.1}%", value),
        ValueFormat::Bytes => format_bytes(value.max(0.0) as u64),
        ValueFormat::Duration => format_duration(value.max(0.0) as u64),
    }
}

/// Format bytes into human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = UNITS[0];
    for candidate in UNITS {
        size /= 1024.0;
        unit = candidate;
        if size < 1024.0 {
            break;
        }
    }
    format!("{:.1} {}", size, unit)
}

/// Format duration in seconds to human-readable string
pub fn format_duration(secs: u64) -> String {
    let (major, minor, units) = match secs {
        0..=59 => return format!("{}s", secs),
        60..=3599 => (secs / 60, secs % 60, ("m", "s")),
        _ => (secs / 3600, (secs % 3600) / 60, ("h", "m")),
    };
    if minor > 0 {
        format!("{}{} {}{}", major, units.0, minor, units.1)
    } else {
        format!("{}{}", major, units.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    pub value_format: ValueFormat,
}

impl DisplayOptions {
    /// Keeps only the points inside the configured axis bounds
    pub fn clip(&self, points: &[DataPoint]) -> Vec<DataPoint> {
        let within = |v: f64, min: Option<f64>, max: Option<f64>| {
            min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
        };
        points
            .iter()
            .filter(|p| within(p.y, self.y_min, self.y_max))
            .filter(|p| p.x.map_or(true, |x| within(x, self.x_min, self.x_max)))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub title: String,
    pub kind: WidgetKind,
    pub request: DataRequest,
    #[serde(default)]
    pub display: DisplayOptions,
}

fn default_refresh() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSpec {
    #[serde(default)]
    pub title: String,
    /// Seconds between automatic refreshes, 0 for manual only
    #[serde(default = "default_refresh")]
    pub refresh_seconds: u64,
    #[serde(default)]
    pub widgets: Vec<WidgetSpec>,
}

impl DashboardSpec {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Payload of a Redis-backed widget
#[derive(Debug, Clone, PartialEq)]
pub enum RedisValue {
    Scalar(Value),
    Array(Vec<Value>),
    Table(CsvTable),
}

impl RedisValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Array(items),
            other => Self::Scalar(other),
        }
    }

    pub fn from_csv(text: &str) -> Self {
        Self::Table(CsvTable::parse(text))
    }
}

/// Header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parses comma separated text with double-quoted fields. Quoted fields may
    /// span lines; blank lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut records = split_csv_records(text).into_iter();
        let headers = records.next().unwrap_or_default();
        Self {
            headers,
            rows: records.collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }
}

fn split_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut blank = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => {
                quoted = !quoted;
                blank = false;
            }
            ',' if !quoted => {
                fields.push(std::mem::take(&mut field));
                blank = false;
            }
            '\r' if !quoted && matches!(chars.peek(), Some('\n') | None) => {}
            '\n' if !quoted => {
                fields.push(std::mem::take(&mut field));
                let record = std::mem::take(&mut fields);
                if !blank {
                    records.push(record);
                }
                blank = true;
            }
            _ => {
                blank &= c.is_whitespace();
                field.push(c);
            }
        }
    }
    if !blank {
        fields.push(field);
        records.push(fields);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_widget_channels() {
        assert_eq!(WidgetKind::Gauge.channel().path(), "/data/bi-channel");
        assert_eq!(WidgetKind::Bar.channel(), Channel::Bi);
        assert_eq!(WidgetKind::Scatter.channel().path(), "/data/tri-channel");
    }

    #[test]
    fn test_range_query_step() {
        let request = DataRequest::PrometheusRange {
            query: "rate(http_requests_total[1m])".into(),
            lookback_seconds: 600,
            points: 11,
        };
        let now = Utc.timestamp_opt(10_000, 0).unwrap();
        let query = request.channel_query(now).unwrap();
        assert_eq!(query.start, Some(9_400));
        assert_eq!(query.end, Some(10_000));
        assert_eq!(query.step, Some(60));
        assert_eq!(query.time, None);

        let body = serde_json::to_value(&query).unwrap();
        assert!(body.get("time").is_none());

        let redis = DataRequest::Redis {
            key: "cost".into(),
            format: RedisFormat::Csv,
        };
        assert!(redis.channel_query(now).is_none());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0, ValueFormat::Number), "3");
        assert_eq!(format_value(3.14159, ValueFormat::Number), "3.14");
        assert_eq!(format_value(42.34, ValueFormat::Percent), "42.3%");
        assert_eq!(format_value(1536.0, ValueFormat::Bytes), "1.5 KB");
        assert_eq!(format_value(512.0, ValueFormat::Bytes), "512 B");
        assert_eq!(format_value(90.0, ValueFormat::Duration), "1m 30s");
        assert_eq!(format_value(7200.0, ValueFormat::Duration), "2h");
    }

    #[test]
    fn test_dashboard_from_yaml() {
        let yaml = r#"
title: Pipeline health
refreshSeconds: 15
widgets:
  - title: Throughput
    kind: line
    request:
      source: prometheusRange
      query: sum(rate(records_total[1m]))
      lookbackSeconds: 900
    display:
      yTitle: records/s
  - title: Cost
    kind: bar
    request:
      source: redis
      key: cost:etl
      format: csv
"#;
        let dashboard = DashboardSpec::from_yaml(yaml).unwrap();
        assert_eq!(dashboard.refresh_seconds, 15);
        assert_eq!(dashboard.widgets.len(), 2);
        assert_eq!(
            dashboard.widgets[0].request,
            DataRequest::PrometheusRange {
                query: "sum(rate(records_total[1m]))".into(),
                lookback_seconds: 900,
                points: 60,
            }
        );
        assert_eq!(dashboard.widgets[0].display.y_title.as_deref(), Some("records/s"));
        assert_eq!(dashboard.widgets[1].display.value_format, ValueFormat::Number);
    }

    #[test]
    fn test_csv_table() {
        let table = CsvTable::parse("service,cost\n\"s3, storage\",12.5\nec2,\"40\"\n\n");
        assert_eq!(table.headers, vec!["service", "cost"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "s3, storage");
        assert_eq!(table.column("cost"), Some(vec!["12.5", "40"]));
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_csv_quoted_newlines_stay_in_the_field() {
        let text = "service,note\r\ns3,\"line one\nline two\"\r\n\r\nec2,\"say \"\"hi\"\"\"";
        let table = CsvTable::parse(text);
        assert_eq!(table.headers, vec!["service", "note"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["s3".to_string(), "line one\nline two".to_string()],
                vec!["ec2".to_string(), "say \"hi\"".to_string()],
            ]
        );
        assert_eq!(CsvTable::parse("  \n"), CsvTable::default());
    }

    #[test]
    fn test_clip_to_axis_bounds() {
        let display = DisplayOptions {
            y_min: Some(0.0),
            x_max: Some(10.0),
            ..Default::default()
        };
        let points = vec![
            DataPoint { x: Some(1.0), y: 5.0, series: "a".into() },
            DataPoint { x: Some(20.0), y: 5.0, series: "a".into() },
            DataPoint { x: None, y: -1.0, series: "b".into() },
        ];
        assert_eq!(display.clip(&points).len(), 1);
    }
}
