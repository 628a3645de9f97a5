use healthspark::dom::style::resolve_length;
use healthspark::sparkline::{
    render_all, ComputedSize, CssLength, DrawingSurface, PathCommand, RenderSummary, SparkPath,
    SparklineHost, Stroke, DEFAULT_MARKER,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, Window};

/// Computed style values are always in pixels; `em_px` only matters for
/// inline fallbacks.
const COMPUTED_EM_PX: f64 = 16.0;

/// Sparkline host over a live page
pub struct BrowserHost {
    window: Window,
    document: Document,
}

impl BrowserHost {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl DrawingSurface for CanvasSurface {
    fn set_size(&mut self, width: f64, height: CssLength) {
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", width));
        let _ = style.set_property("height", &height.to_string());
        self.canvas.set_width(width.max(0.0) as u32);
    }

    fn rendered_height(&self) -> f64 {
        self.canvas.offset_height() as f64
    }

    fn set_height(&mut self, height: f64) {
        self.canvas.set_height(height.max(0.0) as u32);
    }

    fn stroke_path(&mut self, path: &SparkPath, stroke: &Stroke) {
        self.ctx.set_stroke_style_str(stroke.color);
        self.ctx.set_line_width(stroke.width);
        self.ctx.begin_path();
        // The 2D context ignores non-finite coordinates on its own
        for command in &path.commands {
            match command {
                PathCommand::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathCommand::LineTo(p) => self.ctx.line_to(p.x, p.y),
            }
        }
        self.ctx.stroke();
    }
}

impl SparklineHost for BrowserHost {
    type Element = Element;
    type Surface = CanvasSurface;

    fn elements_within(&self, root: &Element) -> Vec<Element> {
        let all = root.get_elements_by_tag_name("*");
        (0..all.length()).filter_map(|i| all.item(i)).collect()
    }

    fn contains(&self, root: &Element, el: &Element) -> bool {
        root.contains(Some(el.as_ref()))
    }

    fn class_name(&self, el: &Element) -> String {
        el.class_name()
    }

    fn text_content(&self, el: &Element) -> String {
        el.text_content().unwrap_or_default()
    }

    fn clear_children(&mut self, el: &Element) {
        el.set_text_content(None);
    }

    fn computed_size(&self, el: &Element) -> Option<ComputedSize> {
        let style = self.window.get_computed_style(el).ok()??;
        let resolve = |name: &str| {
            style
                .get_property_value(name)
                .ok()
                .and_then(|v| resolve_length(&v, COMPUTED_EM_PX))
        };
        Some(ComputedSize {
            width: resolve("width"),
            height: resolve("height"),
        })
    }

    fn create_surface(&mut self) -> Option<CanvasSurface> {
        let canvas = self
            .document
            .create_element("canvas")
            .ok()?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(CanvasSurface { canvas, ctx })
    }

    fn append_surface(&mut self, el: &Element, surface: &CanvasSurface) {
        let _ = el.append_child(&surface.canvas);
    }

    fn show(&mut self, el: &Element) {
        if let Some(html) = el.dyn_ref::<HtmlElement>() {
            let _ = html.style().set_property("display", "inline");
        }
    }
}

fn marker_or_default(marker: &str) -> &str {
    if marker.is_empty() {
        DEFAULT_MARKER
    } else {
        marker
    }
}

fn render_pass(root: &Element, marker: &str) -> RenderSummary {
    match BrowserHost::new() {
        Some(mut host) => render_all(&mut host, root, marker_or_default(marker)),
        None => RenderSummary::default(),
    }
}

/// Render every sparkline below `root`; returns how many were drawn
#[wasm_bindgen]
pub fn render_sparklines(root: &Element, marker: &str) -> u32 {
    render_pass(root, marker).rendered as u32
}

/// Like [`render_sparklines`], returning `{scanned, rendered, unsupported}`
#[wasm_bindgen]
pub fn render_sparklines_report(root: &Element, marker: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&render_pass(root, marker))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render the whole page once it has finished loading
#[wasm_bindgen]
pub fn install(marker: Option<String>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from(js_sys::Error::new("no window")))?;
    let marker = marker.unwrap_or_else(|| DEFAULT_MARKER.to_string());

    let on_load = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        let Some(root) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        else {
            return;
        };
        let summary = render_pass(&root, &marker);
        web_sys::console::debug_1(&JsValue::from_str(&format!(
            "sparklines: {} rendered, {} unsupported",
            summary.rendered, summary.unsupported
        )));
    }));
    window.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
    on_load.forget();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_or_default() {
        assert_eq!(marker_or_default(""), "sparkline");
        assert_eq!(marker_or_default("spark"), "spark");
    }

    #[test]
    fn test_computed_values_resolve() {
        assert_eq!(resolve_length("42.5px", COMPUTED_EM_PX), Some(42.5));
        assert_eq!(resolve_length("auto", COMPUTED_EM_PX), None);
    }
}
