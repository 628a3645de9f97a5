//! Run history chart data
//!
//! A resource page plots the duration of every health check run over time and shows
//! the details of the run under the cursor. This module prepares everything
//! the page hands to Plotly and formats the detail panel:
//!
//! ```text
//! [RunPoint, ...] ──prepare_trace──▶ scatter trace (green/red markers)
//!                    chart_layout ──▶ date axis + range selector
//!                    chart_config ──▶ modebar / zoom options
//!
//! GET <resource_url>/<run id> ──HoverPanel::from_response──▶ date / time / message
//! ```
//!
//! [`chart::write_html`] ties these into an embeddable snippet.

pub mod chart;

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::fmt;

pub const SUCCESS_COLOR: &str = "#5CB85C";
pub const FAILURE_COLOR: &str = "#D9534F";
pub const LINE_COLOR: &str = "#0000CC";
pub const MARKER_OUTLINE_COLOR: &str = "#111111";
pub const HOVER_BACKGROUND: &str = "#EEEEEE";

/// Element ids of the run detail panel
pub const HOVER_PANEL_ID: &str = "run-chart-hover";
pub const HOVER_DATE_ID: &str = "run-chart-hover-date";
pub const HOVER_RESPONSE_TIME_ID: &str = "run-chart-hover-resptime";
pub const HOVER_MESSAGE_ID: &str = "run-chart-hover-msg";
pub const OPEN_RUN_ID: &str = "run-open";

/// Datetime format handed to Plotly
const PLOT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// One health check run as listed in the resource's run history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPoint {
    pub datetime: String,
    /// Response time in seconds
    pub value: Option<f64>,
    pub id: Value,
    #[serde(deserialize_with = "deserialize_success")]
    pub success: bool,
}

/// `1`/`0` from the database, or a plain boolean
fn deserialize_success<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64() == Some(1.0)),
        other => Err(D::Error::custom(format!("invalid success flag: {}", other))),
    }
}

pub fn parse_points(json: &str) -> Result<Vec<RunPoint>> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| Error::Date(raw.to_string()))
}

pub fn marker_color(success: bool) -> &'static str {
    if success {
        SUCCESS_COLOR
    } else {
        FAILURE_COLOR
    }
}

/// Plotly traces for a run history. Runs with an unreadable datetime are left
/// out.
pub fn prepare_trace(points: &[RunPoint], hover_template: &str) -> Value {
    let mut x = Vec::with_capacity(points.len());
    let mut y = Vec::with_capacity(points.len());
    let mut ids = Vec::with_capacity(points.len());
    let mut colors = Vec::with_capacity(points.len());

    for point in points {
        let when = match parse_datetime(&point.datetime) {
            Ok(when) => when,
            Err(e) => {
                tracing::warn!(id = %point.id, error = %e, "skipping run");
                continue;
            }
        };
        x.push(when.format(PLOT_DATETIME_FORMAT).to_string());
        y.push(point.value);
        ids.push(point.id.clone());
        colors.push(marker_color(point.success));
    }

    json!([{
        "name": "",
        "type": "scatter",
        "mode": "lines+markers",
        "hovertemplate": hover_template,
        "hoverlabel": { "bgcolor": HOVER_BACKGROUND },
        "line": { "color": LINE_COLOR, "width": 1 },
        "marker": {
            "color": colors,
            "size": 8,
            "line": { "color": MARKER_OUTLINE_COLOR, "width": 1 }
        },
        "x": x,
        "y": y,
        "ids": ids
    }])
}

pub fn chart_layout() -> Value {
    let button = |step: &str, count: u32, label: &str| {
        json!({ "step": step, "stepmode": "backward", "count": count, "label": label })
    };

    json!({
        "title": "Health Check Runs",
        "hovermode": "closest",
        "paper_bgcolor": HOVER_BACKGROUND,
        "xaxis": {
            "type": "date",
            "rangeselector": {
                "buttons": [
                    button("hour", 1, "1h"),
                    button("hour", 6, "6h"),
                    button("hour", 24, "24h"),
                    button("week", 1, "1w"),
                    button("month", 1, "1m"),
                    { "step": "all" }
                ]
            },
            "rangeslider": { "bgcolor": "#DDDDDD" },
            "title": { "text": "Date" }
        },
        "yaxis": {
            "type": "linear",
            "fixedrange": true,
            "title": { "text": "Duration (secs)" }
        }
    })
}

pub fn chart_config() -> Value {
    json!({
        "scrollZoom": true,
        "showLink": false,
        "modeBarButtonsToRemove": [
            "lasso2d", "zoom2d", "pan", "pan2d", "autoScale2d", "sendDataToCloud",
            "hoverCompareCartesian", "hoverClosestCartesian", "toggleSpikelines", "select2d"
        ],
        "displaylogo": false,
        "displayModeBar": true
    })
}

/// Detail URL of one run under its resource
pub fn run_url(resource_url: &str, id: &Value) -> String {
    let id = match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("{}/{}", resource_url.trim_end_matches('/'), id)
}

/// A single run as returned by the run detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    pub checked_datetime: String,
    pub response_time: f64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct RunDetailsResponse {
    runs: Vec<RunDetails>,
}

impl RunDetails {
    /// First run of a detail response body
    pub fn from_json(body: &str) -> Result<Self> {
        let response: RunDetailsResponse = serde_json::from_str(body)?;
        response.runs.into_iter().next().ok_or(Error::EmptyRuns)
    }
}

/// Content of the run detail panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoverPanel {
    Details {
        date: String,
        response_time: String,
        message: String,
        open_href: String,
    },
    Error { text: String },
}

impl HoverPanel {
    pub fn from_details(details: &RunDetails, run_url: &str) -> Self {
        HoverPanel::Details {
            date: details.checked_datetime.clone(),
            response_time: format_response_time(details.response_time),
            message: details.message.clone().unwrap_or_default(),
            open_href: format!("{}.html", run_url),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        HoverPanel::Error {
            text: format!("Error: {}", message),
        }
    }

    /// Panel for a detail response body; a bad body becomes an error panel
    pub fn from_response(body: &str, run_url: &str) -> Self {
        match RunDetails::from_json(body) {
            Ok(details) => Self::from_details(&details, run_url),
            Err(e) => Self::error(e),
        }
    }
}

impl fmt::Display for HoverPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoverPanel::Details {
                date,
                response_time,
                message,
                open_href,
            } => {
                writeln!(f, "Date:          {}", date)?;
                writeln!(f, "Response time: {}", response_time)?;
                writeln!(f, "Message:       {}", message)?;
                write!(f, "Open:          {}", open_href)
            }
            HoverPanel::Error { text } => write!(f, "{}", text),
        }
    }
}

pub fn format_response_time(seconds: f64) -> String {
    format!("{:.2} s", seconds)
}
