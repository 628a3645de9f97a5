//! Sparkline renderer
//!
//! Scans a container for elements carrying the marker class and replaces each
//! one's content with a drawing surface holding a normalized polyline of its
//! numbers.
//!
//! # Hosts
//!
//! The renderer never touches a DOM directly. Everything environment specific
//! goes through two traits:
//!
//! - [`SparklineHost`]: element discovery, text, computed size, surface
//!   creation and attachment
//! - [`DrawingSurface`]: sizing, layout height and path stroking
//!
//! [`crate::dom::host::StaticHost`] implements them over the in-memory
//! document and records SVG; the `wasm-sparkline` crate implements them over a
//! live page with `<canvas>`.
//!
//! # One-shot pass
//!
//! A pass visits a snapshot of the elements below the root in document order
//! and renders each qualifying element once. Rendering consumes the element's
//! text, so running the pass again over the same tree draws from an empty
//! series: it is harmless but not meaningful.

pub mod marker;
pub mod series;

pub use marker::{has_marker, DEFAULT_MARKER};
pub use series::{Bounds, PathCommand, Point, Series, SparkPath};

use serde::Serialize;

/// CSS length of a surface before layout resolves it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssLength {
    Px(f64),
    Em(f64),
}

impl std::fmt::Display for CssLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CssLength::Px(v) => write!(f, "{}px", v),
            CssLength::Em(v) => write!(f, "{}em", v),
        }
    }
}

/// Resolved element size in pixels. `None` stands for `auto`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComputedSize {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
}

pub const DEFAULT_STROKE: Stroke = Stroke {
    color: "red",
    width: 1.0,
};

/// Height used when no computed height is available
pub const FALLBACK_HEIGHT: CssLength = CssLength::Em(1.0);

pub trait DrawingSurface {
    /// Set the CSS size and the intrinsic width
    fn set_size(&mut self, width: f64, height: CssLength);

    /// Height after layout, in pixels
    fn rendered_height(&self) -> f64;

    /// Set the intrinsic height
    fn set_height(&mut self, height: f64);

    fn stroke_path(&mut self, path: &SparkPath, stroke: &Stroke);
}

/// Environment capabilities the renderer depends on
pub trait SparklineHost {
    type Element: Clone;
    type Surface: DrawingSurface;

    /// Snapshot of every element below `root`, in document order
    fn elements_within(&self, root: &Self::Element) -> Vec<Self::Element>;

    /// Whether `el` is still attached below `root`
    fn contains(&self, root: &Self::Element, el: &Self::Element) -> bool;

    fn class_name(&self, el: &Self::Element) -> String;

    fn text_content(&self, el: &Self::Element) -> String;

    fn clear_children(&mut self, el: &Self::Element);

    /// `None` when the environment cannot report computed style at all
    fn computed_size(&self, el: &Self::Element) -> Option<ComputedSize>;

    /// `None` when 2D drawing is not supported
    fn create_surface(&mut self) -> Option<Self::Surface>;

    fn append_surface(&mut self, el: &Self::Element, surface: &Self::Surface);

    /// Switch the element to its visible (inline) display
    fn show(&mut self, el: &Self::Element);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderOutcome {
    Rendered { points: usize, width: f64, height: f64 },
    Unsupported,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    /// Elements visited below the root
    pub scanned: usize,
    pub rendered: usize,
    pub unsupported: usize,
}

impl RenderSummary {
    pub fn sources(&self) -> usize {
        self.rendered + self.unsupported
    }

    pub fn record(&mut self, outcome: RenderOutcome) {
        match outcome {
            RenderOutcome::Rendered { .. } => self.rendered += 1,
            RenderOutcome::Unsupported => self.unsupported += 1,
        }
    }

    pub fn merge(&mut self, other: &RenderSummary) {
        self.scanned += other.scanned;
        self.rendered += other.rendered;
        self.unsupported += other.unsupported;
    }
}

/// Render every element below `root` whose class list contains `marker`.
pub fn render_all<H: SparklineHost>(
    host: &mut H,
    root: &H::Element,
    marker: &str,
) -> RenderSummary {
    let candidates = host.elements_within(root);
    let mut summary = RenderSummary {
        scanned: candidates.len(),
        ..Default::default()
    };

    for el in &candidates {
        // A source nested in an earlier source was cleared with its parent
        if !host.contains(root, el) {
            continue;
        }
        if !has_marker(&host.class_name(el), marker) {
            continue;
        }
        summary.record(render_element(host, el));
    }

    tracing::debug!(
        scanned = summary.scanned,
        rendered = summary.rendered,
        unsupported = summary.unsupported,
        "sparkline pass complete"
    );
    summary
}

/// Render a single source element in place.
pub fn render_element<H: SparklineHost>(host: &mut H, el: &H::Element) -> RenderOutcome {
    let text = host.text_content(el);
    let tokens = series::tokenize(&text);
    host.clear_children(el);

    let size = host.computed_size(el).unwrap_or_default();
    let width = match size.width {
        Some(w) if w != 0.0 => w,
        _ => series::fallback_width(tokens.len()),
    };
    let css_height = match size.height {
        Some(h) if h != 0.0 => CssLength::Px(h),
        _ => FALLBACK_HEIGHT,
    };

    let Some(mut surface) = host.create_surface() else {
        return RenderOutcome::Unsupported;
    };

    surface.set_size(width, css_height);
    host.append_surface(el, &surface);
    host.show(el);

    let height = surface.rendered_height();
    surface.set_height(height);

    let series = Series::from_tokens(&tokens);
    let path = series.layout(width, height);
    surface.stroke_path(&path, &DEFAULT_STROKE);
    host.show(el);

    RenderOutcome::Rendered {
        points: series.len(),
        width,
        height,
    }
}
