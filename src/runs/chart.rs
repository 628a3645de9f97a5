//! Embeddable run chart snippet
//!
//! Writes a `<div>` plus an inline script that waits for Plotly, plots the run
//! history and fills the detail panel when a marker is hovered or clicked.

use super::{
    chart_config, chart_layout, prepare_trace, RunPoint, HOVER_DATE_ID, HOVER_MESSAGE_ID,
    HOVER_PANEL_ID, HOVER_RESPONSE_TIME_ID, OPEN_RUN_ID,
};
use serde_json::Value;
use std::io::{self, Write};

pub const DEFAULT_ELEMENT_ID: &str = "run-chart";
pub const DEFAULT_HOVER_TEMPLATE: &str = "%{x}<br>%{y:.2f} s<extra></extra>";

/// Plotly poll interval while the library is still loading
const PLOTLY_RETRY_MS: u32 = 100;

/// JSON literal that is safe inside a `<script>` element
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn write_html<W: Write>(
    w: &mut W,
    element_id: &str,
    points: &[RunPoint],
    resource_url: &str,
    hover_template: &str,
) -> io::Result<()> {
    let data = script_json(&prepare_trace(points, hover_template));
    let layout = script_json(&chart_layout());
    let config = script_json(&chart_config());
    let id = script_json(&Value::from(element_id));
    let base = script_json(&Value::from(resource_url.trim_end_matches('/')));

    writeln!(w, r#"<div id="{}" class="run-chart"></div>"#, escape_attr(element_id))?;
    writeln!(w, "<script>")?;
    writeln!(w, "(function () {{")?;
    writeln!(w, "  var el = document.getElementById({});", id)?;
    writeln!(w, "  if (!el) {{ return; }}")?;
    writeln!(w, "  var data = {};", data)?;
    writeln!(w, "  var layout = {};", layout)?;
    writeln!(w, "  var config = {};", config)?;
    writeln!(w, "  var resourceUrl = {};", base)?;
    writeln!(w)?;
    writeln!(w, "  function setText(id, text) {{")?;
    writeln!(w, "    var target = document.getElementById(id);")?;
    writeln!(w, "    if (target) {{ target.textContent = text; }}")?;
    writeln!(w, "  }}")?;
    writeln!(w)?;
    writeln!(w, "  function showRun(point) {{")?;
    writeln!(w, "    var runUrl = resourceUrl + '/' + point.id;")?;
    writeln!(w, "    fetch(runUrl, {{ headers: {{ 'Accept': 'application/json' }} }})")?;
    writeln!(w, "      .then(function (resp) {{")?;
    writeln!(w, "        if (!resp.ok) {{ throw new Error(resp.status + ' ' + resp.statusText); }}")?;
    writeln!(w, "        return resp.json();")?;
    writeln!(w, "      }})")?;
    writeln!(w, "      .then(function (body) {{")?;
    writeln!(w, "        var run = body.runs && body.runs[0];")?;
    writeln!(w, "        if (!run) {{ throw new Error('Run detail response contains no runs'); }}")?;
    writeln!(w, "        setText('{}', run.checked_datetime);", HOVER_DATE_ID)?;
    writeln!(w, "        setText('{}', run.response_time.toFixed(2) + ' s');", HOVER_RESPONSE_TIME_ID)?;
    writeln!(w, "        setText('{}', run.message || '');", HOVER_MESSAGE_ID)?;
    writeln!(w, "        var open = document.getElementById('{}');", OPEN_RUN_ID)?;
    writeln!(w, "        if (open) {{")?;
    writeln!(w, "          open.setAttribute('href', runUrl + '.html');")?;
    writeln!(w, "          open.classList.remove('disabled');")?;
    writeln!(w, "        }}")?;
    writeln!(w, "      }})")?;
    writeln!(w, "      .catch(function (err) {{")?;
    writeln!(w, "        setText('{}', 'Error: ' + err.message);", HOVER_PANEL_ID)?;
    writeln!(w, "      }});")?;
    writeln!(w, "  }}")?;
    writeln!(w)?;
    writeln!(w, "  function draw() {{")?;
    writeln!(w, "    if (!window.Plotly) {{")?;
    writeln!(w, "      window.setTimeout(draw, {});", PLOTLY_RETRY_MS)?;
    writeln!(w, "      return;")?;
    writeln!(w, "    }}")?;
    writeln!(w, "    Plotly.newPlot(el, data, layout, config);")?;
    writeln!(w, "    el.on('plotly_hover', function (ev) {{ showRun(ev.points[0]); }});")?;
    writeln!(w, "    el.on('plotly_click', function (ev) {{ showRun(ev.points[0]); }});")?;
    writeln!(w, "  }}")?;
    writeln!(w, "  draw();")?;
    writeln!(w, "}})();")?;
    writeln!(w, "</script>")?;

    Ok(())
}

/// [`write_html`] into a string
pub fn to_html(element_id: &str, points: &[RunPoint], resource_url: &str, hover_template: &str) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_html(&mut buf, element_id, points, resource_url, hover_template);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::parse_points;

    fn points() -> Vec<RunPoint> {
        parse_points(r#"[{"datetime": "2024-03-01T10:00:00", "value": 0.5, "id": 4, "success": 1}]"#).unwrap()
    }

    #[test]
    fn test_snippet_structure() {
        let html = to_html("run-chart", &points(), "http://ghc/resource/3/", DEFAULT_HOVER_TEMPLATE);

        assert!(html.starts_with(r#"<div id="run-chart" class="run-chart"></div>"#));
        assert!(html.contains(r#"var resourceUrl = "http://ghc/resource/3";"#));
        assert!(html.contains("Plotly.newPlot(el, data, layout, config);"));
        assert!(html.contains("window.setTimeout(draw, 100);"));
        assert!(html.contains("'plotly_hover'"));
        assert!(html.contains("'plotly_click'"));
        assert!(html.contains("run-chart-hover-resptime"));
        assert!(html.trim_end().ends_with("</script>"));
    }

    #[test]
    fn test_snippet_embeds_trace() {
        let html = to_html("run-chart", &points(), "u", "");
        assert!(html.contains("\"#5CB85C\""));
        assert!(html.contains("\"Health Check Runs\""));
    }

    #[test]
    fn test_script_end_tags_escaped() {
        let html = to_html("c", &points(), "http://x/</script>", "");
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn test_element_id_escaped() {
        let html = to_html(r#"a"b"#, &points(), "u", "");
        assert!(html.starts_with(r#"<div id="a&quot;b""#));
    }
}
