//! Markup writer for [`Document`]

use super::parse::is_void;
use super::{Document, NodeId, NodeKind};

pub(super) fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    for &child in doc.children(doc.root()) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Document => {
            for &child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            if el.self_closing && doc.children(id).is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            if is_void(&el.tag) && doc.children(id).is_empty() {
                return;
            }
            for &child in doc.children(id) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Raw(raw) => out.push_str(raw),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Canvas(canvas) => out.push_str(&canvas.borrow().to_svg()),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
