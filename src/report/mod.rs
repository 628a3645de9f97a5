//! Batch render reports
//!
//! One [`FileReport`] per processed markup file, written out in one of two
//! formats:
//!
//! - **JSON**: machine-readable, includes the per-file render summary
//! - **CSV**: spreadsheet-compatible, one row per file
//!
//! # Usage
//!
//! ```ignore
//! use healthspark::report;
//!
//! // Automatically picks format based on extension
//! report::generate("render.json", &reports)?;  // JSON
//! report::generate("render.csv", &reports)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::sparkline::RenderSummary;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Outcome of rendering one markup file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: String,
    pub output: Option<String>,
    pub summary: RenderSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn success(input: &Path, output: &Path, summary: RenderSummary) -> Self {
        Self {
            input: input.display().to_string(),
            output: Some(output.display().to_string()),
            summary,
            error: None,
        }
    }

    pub fn failure(input: &Path, error: String) -> Self {
        Self {
            input: input.display().to_string(),
            output: None,
            summary: RenderSummary::default(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, reports: &[FileReport]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, reports),
        _ => csv::write(&mut file, reports),
    }
}

/// Totals for a batch of files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub failed: usize,
    pub sparklines: usize,
    pub unsupported: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self {
            files: reports.len(),
            ..Default::default()
        };

        for r in reports {
            if !r.is_ok() {
                summary.failed += 1;
            }
            summary.sparklines += r.summary.rendered;
            summary.unsupported += r.summary.unsupported;
        }

        summary
    }
}
