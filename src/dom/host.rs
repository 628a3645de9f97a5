//! Static sparkline host over an in-memory [`Document`]
//!
//! Computed size comes from the element's inline `style`; `em` lengths resolve
//! against a fixed root font size. Surfaces are [`Canvas`] recordings.

use super::canvas::{Canvas, CanvasHandle};
use super::{style, Document, NodeId, NodeKind};
use crate::sparkline::{
    ComputedSize, CssLength, DrawingSurface, SparkPath, SparklineHost, Stroke,
};

/// Browser default font size
pub const DEFAULT_EM_PX: f64 = 16.0;

pub struct StaticHost<'d> {
    doc: &'d mut Document,
    em_px: f64,
    supports_canvas: bool,
}

impl<'d> StaticHost<'d> {
    pub fn new(doc: &'d mut Document) -> Self {
        Self {
            doc,
            em_px: DEFAULT_EM_PX,
            supports_canvas: true,
        }
    }

    pub fn with_em_px(mut self, em_px: f64) -> Self {
        self.em_px = em_px;
        self
    }

    /// Simulate an environment without 2D drawing support
    pub fn with_canvas_support(mut self, supported: bool) -> Self {
        self.supports_canvas = supported;
        self
    }
}

pub struct SvgSurface {
    canvas: CanvasHandle,
    em_px: f64,
}

impl SvgSurface {
    pub fn new(em_px: f64) -> Self {
        Self {
            canvas: Canvas::default().into_handle(),
            em_px,
        }
    }

    pub fn handle(&self) -> CanvasHandle {
        self.canvas.clone()
    }
}

impl DrawingSurface for SvgSurface {
    fn set_size(&mut self, width: f64, height: CssLength) {
        let mut canvas = self.canvas.borrow_mut();
        canvas.width = width;
        canvas.css_width = width;
        canvas.css_height = height;
    }

    fn rendered_height(&self) -> f64 {
        match self.canvas.borrow().css_height {
            CssLength::Px(h) => h,
            CssLength::Em(em) => em * self.em_px,
        }
    }

    fn set_height(&mut self, height: f64) {
        self.canvas.borrow_mut().height = height;
    }

    fn stroke_path(&mut self, path: &SparkPath, stroke: &Stroke) {
        let mut canvas = self.canvas.borrow_mut();
        canvas.path = path.clone();
        canvas.stroke = Some(stroke.clone());
    }
}

impl<'d> SparklineHost for StaticHost<'d> {
    type Element = NodeId;
    type Surface = SvgSurface;

    fn elements_within(&self, root: &NodeId) -> Vec<NodeId> {
        self.doc.descendant_elements(*root)
    }

    fn contains(&self, root: &NodeId, el: &NodeId) -> bool {
        self.doc.contains(*root, *el)
    }

    fn class_name(&self, el: &NodeId) -> String {
        self.doc.class_name(*el).to_string()
    }

    fn text_content(&self, el: &NodeId) -> String {
        self.doc.text_content(*el)
    }

    fn clear_children(&mut self, el: &NodeId) {
        self.doc.clear_children(*el);
    }

    fn computed_size(&self, el: &NodeId) -> Option<ComputedSize> {
        let inline = self.doc.attr(*el, "style").unwrap_or("");
        let resolve = |name: &str| {
            style::get(inline, name).and_then(|v| style::resolve_length(&v, self.em_px))
        };
        Some(ComputedSize {
            width: resolve("width"),
            height: resolve("height"),
        })
    }

    fn create_surface(&mut self) -> Option<SvgSurface> {
        self.supports_canvas.then(|| SvgSurface::new(self.em_px))
    }

    fn append_surface(&mut self, el: &NodeId, surface: &SvgSurface) {
        self.doc.append(*el, NodeKind::Canvas(surface.handle()));
    }

    fn show(&mut self, el: &NodeId) {
        self.doc.set_style_property(*el, "display", "inline");
    }
}
