//! Healthspark - Sparklines, table filters and run charts for health dashboards
//!
//! Healthspark is the client-side glue of a server-rendered monitoring
//! dashboard. The server writes raw numbers into the page; healthspark turns
//! them into pictures and interactions.
//!
//! # Overview
//!
//! A resource table cell like
//!
//! ```html
//! <span class="sparkline">0.42,0.40,1.9,0.38</span>
//! ```
//!
//! holds the recent response times of a health check. The renderer replaces the
//! numbers with a small red polyline scaled to the cell, with the largest
//! value at the top edge and the smallest at the bottom edge.
//!
//! # Quick Start
//!
//! ```
//! use healthspark::{render_markup, RenderOptions};
//!
//! let (html, summary) = render_markup(
//!     r#"<td><span class="sparkline">10,8,20,5</span></td>"#,
//!     &RenderOptions::default(),
//! ).unwrap();
//!
//! assert_eq!(summary.rendered, 1);
//! assert!(html.contains("<svg"));
//! ```
//!
//! # Hosts
//!
//! The renderer runs against any environment implementing
//! [`SparklineHost`]. This crate ships [`StaticHost`], which works on an
//! in-memory HTML document and draws SVG; the `wasm-sparkline` crate draws
//! into `<canvas>` elements of a live page.
//!
//! # Modules
//!
//! - [`sparkline`]: series parsing, layout and the render pass
//! - [`dom`]: lenient HTML document model and the static host
//! - [`render`]: whole-document and whole-file rendering
//! - [`filter`]: faceted resource table filter
//! - [`runs`]: health check run chart data and run detail panel
//! - [`report`]: batch reports (JSON, CSV)

pub mod dom;
pub mod error;
pub mod filter;
pub mod render;
pub mod report;
pub mod runs;
#[cfg(feature = "cli")]
pub mod serve;
pub mod sparkline;

pub use dom::host::StaticHost;
pub use dom::Document;
pub use error::{Error, Result};
pub use render::{render_document, render_file, render_markup, RenderOptions};
pub use sparkline::{
    render_all, render_element, ComputedSize, CssLength, DrawingSurface, RenderOutcome,
    RenderSummary, Series, SparkPath, SparklineHost, DEFAULT_MARKER,
};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is reachable from the crate
    // root.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: RenderOutcome = RenderOutcome::Unsupported;
        let options = RenderOptions::default();
        assert_eq!(options.marker, DEFAULT_MARKER);
    }

    #[test]
    fn test_render_from_crate_root() {
        let mut doc = Document::parse(r#"<i class="sparkline">1,2,3</i>"#).unwrap();
        let root = doc.root();
        let summary = {
            let mut host = StaticHost::new(&mut doc);
            render_all(&mut host, &root, DEFAULT_MARKER)
        };
        assert_eq!(summary.rendered, 1);
    }

    #[test]
    fn test_error_variants() {
        let _ = Error::EmptyRuns;
        let _ = Error::Date("x".to_string());
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
