//! Whole-document sparkline rendering
//!
//! Glue between the markup layer and the renderer: parse, run one pass over
//! the document root with the static host, write the markup back.

use crate::dom::host::{StaticHost, DEFAULT_EM_PX};
use crate::dom::Document;
use crate::error::Result;
use crate::report::FileReport;
use crate::sparkline::{render_all, RenderSummary, DEFAULT_MARKER};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Class token marking sparkline sources
    pub marker: String,
    /// Pixel size of `1em` when resolving fallback heights
    pub em_px: f64,
    /// When false every source is left empty, as in a browser without canvas
    pub supports_canvas: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            em_px: DEFAULT_EM_PX,
            supports_canvas: true,
        }
    }
}

impl RenderOptions {
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn with_em_px(mut self, em_px: f64) -> Self {
        self.em_px = em_px;
        self
    }
}

/// Render every sparkline in a parsed document
pub fn render_document(doc: &mut Document, options: &RenderOptions) -> RenderSummary {
    let root = doc.root();
    let mut host = StaticHost::new(doc)
        .with_em_px(options.em_px)
        .with_canvas_support(options.supports_canvas);
    render_all(&mut host, &root, &options.marker)
}

/// Render every sparkline in a markup string
pub fn render_markup(markup: &str, options: &RenderOptions) -> Result<(String, RenderSummary)> {
    let mut doc = Document::parse(markup)?;
    let summary = render_document(&mut doc, options);
    Ok((doc.to_html(), summary))
}

/// Render `input` into `output` (which may be the same path).
///
/// Never fails: read, parse and write errors end up in the report.
pub fn render_file(input: &Path, output: &Path, options: &RenderOptions) -> FileReport {
    let result = std::fs::read_to_string(input)
        .map_err(Into::into)
        .and_then(|markup| render_markup(&markup, options))
        .and_then(|(html, summary)| {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(output, html)?;
            Ok(summary)
        });

    match result {
        Ok(summary) => {
            tracing::debug!(file = %input.display(), rendered = summary.rendered, "rendered");
            FileReport::success(input, output, summary)
        }
        Err(e) => {
            tracing::warn!(file = %input.display(), error = %e, "render failed");
            FileReport::failure(input, e.to_string())
        }
    }
}
