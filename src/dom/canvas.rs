//! Vector recording of a sparkline surface
//!
//! The static host cannot rasterize, so a canvas records its size and the
//! stroked path and is written out as inline SVG. The handle is shared between
//! the surface doing the drawing and the node holding it in the tree.

use crate::sparkline::{CssLength, PathCommand, SparkPath, Stroke};
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

pub type CanvasHandle = Rc<RefCell<Canvas>>;

/// Class put on every serialized surface
pub const SURFACE_CLASS: &str = "sparkline-surface";

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    /// Intrinsic size in pixels
    pub width: f64,
    pub height: f64,
    pub css_width: f64,
    pub css_height: CssLength,
    pub path: SparkPath,
    pub stroke: Option<Stroke>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            css_width: 0.0,
            css_height: CssLength::Px(0.0),
            path: SparkPath::default(),
            stroke: None,
        }
    }
}

impl Canvas {
    pub fn into_handle(self) -> CanvasHandle {
        Rc::new(RefCell::new(self))
    }

    /// SVG path data. Non-finite points are dropped and the next finite point
    /// starts a new subpath.
    pub fn path_data(&self) -> String {
        let mut d = String::new();
        let mut started = false;
        for cmd in &self.path.commands {
            let p = cmd.point();
            if !p.is_finite() {
                if matches!(cmd, PathCommand::MoveTo(_)) {
                    started = false;
                }
                continue;
            }
            let op = match cmd {
                PathCommand::LineTo(_) if started => 'L',
                _ => 'M',
            };
            if !d.is_empty() {
                d.push(' ');
            }
            let _ = write!(d, "{}{} {}", op, format_number(p.x), format_number(p.y));
            started = true;
        }
        d
    }

    pub fn to_svg(&self) -> String {
        let w = format_number(self.width);
        let h = format_number(self.height);
        let mut svg = format!(
            r#"<svg class="{class}" xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="width: {cw}px; height: {ch}">"#,
            class = SURFACE_CLASS,
            w = w,
            h = h,
            cw = format_number(self.css_width),
            ch = self.css_height,
        );

        let d = self.path_data();
        if let (false, Some(stroke)) = (d.is_empty(), &self.stroke) {
            let _ = write!(
                svg,
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                d,
                stroke.color,
                format_number(stroke.width)
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Compact decimal: integers without a fraction, otherwise two places with
/// trailing zeros removed
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        return if v == 0.0 { "0".to_string() } else { format!("{}", v) };
    }
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
