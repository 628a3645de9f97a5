//! Lenient HTML reader built on quick-xml
//!
//! Dashboard templates are HTML, not XML, so the reader runs with end-name
//! checks off and the tree builder supplies the HTML rules quick-xml lacks:
//!
//! - void elements (`<br>`, `<meta ...>`) never take children
//! - `</x>` closes the nearest open `x`; an end tag with no open match is dropped
//! - `script` and `style` bodies are raw text, copied up to their end tag
//! - named entities outside the XML set resolve from a small HTML table, and
//!   unknown ones are kept verbatim
//! - a `<` that does not open a tag (`latency < 2s`, `<3`) is text
//! - `li`, `dt`/`dd`, `tr`, `td`/`th` and `option` close an open sibling of
//!   the same kind

use super::{Document, Element, NodeId, NodeKind};
use crate::error::{Error, Result};
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Error as XmlError;
use std::borrow::Cow;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Tags whose end tag is implied by the next start of one of `closes`, as long
/// as no `scope` element sits in between
const IMPLIED_ENDS: &[(&str, &[&str], &[&str])] = &[
    ("li", &["li"], &["ul", "ol", "menu"]),
    ("dt", &["dt", "dd"], &["dl"]),
    ("dd", &["dt", "dd"], &["dl"]),
    ("tr", &["tr", "td", "th"], &["table", "thead", "tbody", "tfoot"]),
    ("td", &["td", "th"], &["tr", "table"]),
    ("th", &["td", "th"], &["tr", "table"]),
    ("option", &["option"], &["select", "datalist", "optgroup"]),
];

pub(super) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(super) fn parse(markup: &str) -> Result<Document> {
    let mut doc = Document::new();
    let root = doc.root();
    let mut stack: Vec<NodeId> = vec![root];
    let mut offset = 0usize;

    // Raw text bodies are cut out by hand, after which reading resumes with a
    // fresh reader over the rest of the input.
    'segments: loop {
        let mut reader = Reader::from_str(&markup[offset..]);
        {
            let config = reader.config_mut();
            config.trim_text(false);
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.allow_dangling_amp = true;
        }

        let mut last_end = offset;
        loop {
            let parent = stack.last().copied().unwrap_or(root);
            let event = match reader.read_event() {
                Ok(event) => event,
                // A `<` whose tag never closes is text
                Err(XmlError::Syntax(err)) => match unclosed_lt(markup, last_end) {
                    Some(at) => {
                        doc.append_text(parent, "<");
                        offset = at + 1;
                        continue 'segments;
                    }
                    None => return Err(markup_error(offset, &reader, err)),
                },
                Err(err) => return Err(markup_error(offset, &reader, err)),
            };
            let end = offset + reader.buffer_position() as usize;
            last_end = end;

            match event {
                Event::Start(e) | Event::Empty(e) if !is_tag_name(e.name().as_ref()) => {
                    doc.append_text(parent, "<");
                    offset = literal_lt(markup, end, e.len()) + 1;
                    continue 'segments;
                }
                Event::Start(e) => {
                    let el = element_from(&reader, &e, false)
                        .map_err(|err| markup_error(offset, &reader, err))?;
                    let tag = el.tag.clone();
                    close_implied(&doc, &mut stack, &tag);
                    let parent = stack.last().copied().unwrap_or(root);
                    let id = doc.append(parent, NodeKind::Element(el));

                    if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                        let body_start = end;
                        let (body_end, resume) = raw_text_bounds(markup, body_start, &tag);
                        if body_end > body_start {
                            doc.append(id, NodeKind::Raw(markup[body_start..body_end].to_string()));
                        }
                        offset = resume;
                        continue 'segments;
                    }

                    if !is_void(&tag) {
                        stack.push(id);
                    }
                }
                Event::Empty(e) => {
                    let el = element_from(&reader, &e, true)
                        .map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append(parent, NodeKind::Element(el));
                }
                Event::End(e) => {
                    let name = reader
                        .decoder()
                        .decode(e.name().as_ref())
                        .map_err(|err| markup_error(offset, &reader, err))?
                        .to_ascii_lowercase();
                    let open = stack.iter().rposition(|&id| doc.tag(id) == Some(name.as_str()));
                    if let Some(pos) = open {
                        stack.truncate(pos);
                    }
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append_text(parent, &text);
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(|err| markup_error(offset, &reader, err))?;
                    let entity = format!("&{};", name);
                    match unescape_html(&entity) {
                        Some(resolved) => doc.append_text(parent, &resolved),
                        None => {
                            doc.append(parent, NodeKind::Raw(entity));
                        }
                    }
                }
                Event::CData(e) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append_text(parent, &text);
                }
                Event::Comment(e) => {
                    let text = e.decode().map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append(parent, NodeKind::Comment(text.into_owned()));
                }
                Event::DocType(e) => {
                    let text = e.decode().map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append(parent, NodeKind::Raw(format!("<!DOCTYPE {}>", text.trim())));
                }
                Event::PI(e) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append(parent, NodeKind::Raw(format!("<?{}?>", text)));
                }
                Event::Decl(e) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| markup_error(offset, &reader, err))?;
                    doc.append(parent, NodeKind::Raw(format!("<?{}?>", text)));
                }
                Event::Eof => break 'segments,
            }
        }
    }

    Ok(doc)
}

fn is_tag_name(name: &[u8]) -> bool {
    name.first().is_some_and(u8::is_ascii_alphabetic)
}

/// Offset of the `<` that opened a bogus tag ending at `end`, given the length
/// of the tag's content between `<` and `>`
fn literal_lt(markup: &str, end: usize, content_len: usize) -> usize {
    let bytes = markup.as_bytes();
    // `<content>` or `<content/>`
    [content_len + 2, content_len + 3]
        .into_iter()
        .filter_map(|len| end.checked_sub(len))
        .find(|&at| bytes.get(at) == Some(&b'<'))
        .unwrap_or_else(|| markup[..end].rfind('<').unwrap_or(0))
}

/// The `<` that opened a tag left unclosed after the event ending at
/// `last_end`. The reader may or may not have consumed it already.
fn unclosed_lt(markup: &str, last_end: usize) -> Option<usize> {
    if last_end > 0 && markup.as_bytes().get(last_end - 1) == Some(&b'<') {
        return Some(last_end - 1);
    }
    markup[last_end..].find('<').map(|i| last_end + i)
}

/// Pop open elements whose end tag the start of `tag` implies
fn close_implied(doc: &Document, stack: &mut Vec<NodeId>, tag: &str) {
    let Some((_, closes, scope)) = IMPLIED_ENDS.iter().find(|(t, _, _)| *t == tag) else {
        return;
    };
    let mut cut = None;
    for (pos, &id) in stack.iter().enumerate().skip(1).rev() {
        let open = doc.tag(id).unwrap_or("");
        if scope.contains(&open) {
            break;
        }
        if closes.contains(&open) {
            cut = Some(pos);
        }
    }
    if let Some(pos) = cut {
        stack.truncate(pos);
    }
}

fn markup_error(offset: usize, reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> Error {
    Error::Markup {
        position: offset as u64 + reader.error_position() as u64,
        message: err.to_string(),
    }
}

fn element_from(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    self_closing: bool,
) -> std::result::Result<Element, String> {
    let decoder = reader.decoder();
    let name = e.name();
    let tag = decoder.decode(name.as_ref()).map_err(|err| err.to_string())?;
    let mut el = Element::new(&tag);
    el.self_closing = self_closing;

    for attr in e.html_attributes().flatten() {
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|err| err.to_string())?
            .to_ascii_lowercase();
        let raw = decoder.decode(&attr.value).map_err(|err| err.to_string())?;
        let value = match unescape_html(&raw) {
            Some(v) => v.into_owned(),
            None => raw.into_owned(),
        };
        el.attrs.push((key, value));
    }

    Ok(el)
}

/// Where a raw text body ends and where reading resumes after its end tag
fn raw_text_bounds(markup: &str, body_start: usize, tag: &str) -> (usize, usize) {
    let rest = markup[body_start..].to_ascii_lowercase();
    let needle = format!("</{}", tag);
    match rest.find(&needle) {
        Some(i) => {
            let body_end = body_start + i;
            let resume = markup[body_end..]
                .find('>')
                .map(|j| body_end + j + 1)
                .unwrap_or(markup.len());
            (body_end, resume)
        }
        None => (markup.len(), markup.len()),
    }
}

fn unescape_html(raw: &str) -> Option<Cow<'_, str>> {
    unescape_with(raw, html_entity).ok()
}

fn html_entity(name: &str) -> Option<&'static str> {
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "deg" => "\u{b0}",
        "middot" => "\u{b7}",
        "times" => "\u{d7}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        "check" => "\u{2713}",
        _ => return None,
    };
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // HTML LENIENCY TESTS
    // ==========================================================================
    //
    // Dashboard templates are hand-written HTML. These check the places where
    // HTML and XML disagree.
    // ==========================================================================

    #[test]
    fn test_void_elements_take_no_children() {
        let doc = Document::parse(r#"<p>a<br>b<img src="x.png"></p>"#).unwrap();
        let p = doc.elements_by_tag(doc.root(), "p")[0];
        assert_eq!(doc.children(p).len(), 4);
        assert_eq!(doc.text_content(p), "ab");
    }

    #[test]
    fn test_script_body_is_raw() {
        let markup = "<script>if (a < b && c) { x = '</div>'; }</script><span>1</span>";
        let doc = Document::parse(markup).unwrap();
        assert_eq!(doc.elements_by_tag(doc.root(), "span").len(), 1);
        assert_eq!(doc.to_html(), markup);
    }

    #[test]
    fn test_unclosed_script_consumes_rest() {
        let doc = Document::parse("<script>var a = 1 < 2;").unwrap();
        let script = doc.elements_by_tag(doc.root(), "script")[0];
        assert_eq!(doc.text_content(script), "var a = 1 < 2;");
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let doc = Document::parse("<div><span>x</b></span></div>").unwrap();
        let span = doc.elements_by_tag(doc.root(), "span")[0];
        assert_eq!(doc.text_content(span), "x");
        assert_eq!(doc.to_html(), "<div><span>x</span></div>");
    }

    #[test]
    fn test_entities_resolve() {
        let doc = Document::parse("<p>a&nbsp;&amp;&#65;</p>").unwrap();
        let p = doc.elements_by_tag(doc.root(), "p")[0];
        assert_eq!(doc.text_content(p), "a\u{a0}&A");
    }

    #[test]
    fn test_unknown_entity_kept_verbatim() {
        let doc = Document::parse("<p>&bogus;</p>").unwrap();
        assert_eq!(doc.to_html(), "<p>&bogus;</p>");
    }

    #[test]
    fn test_attribute_values_unescaped() {
        let doc = Document::parse(r#"<a title="http://x/?a=1&amp;b=2" href=plain>u</a>"#).unwrap();
        let a = doc.elements_by_tag(doc.root(), "a")[0];
        assert_eq!(doc.attr(a, "title"), Some("http://x/?a=1&b=2"));
        assert_eq!(doc.attr(a, "href"), Some("plain"));
    }

    #[test]
    fn test_doctype_and_comments_preserved() {
        let markup = "<!DOCTYPE html><!-- hi --><html><body></body></html>";
        let doc = Document::parse(markup).unwrap();
        assert_eq!(doc.to_html(), markup);
    }

    #[test]
    fn test_tags_lowercased() {
        let doc = Document::parse(r#"<SPAN CLASS="sparkline">1</SPAN>"#).unwrap();
        assert_eq!(doc.elements_with_class(doc.root(), "sparkline").len(), 1);
    }

    #[test]
    fn test_bare_less_than_is_text() {
        let doc = Document::parse(r#"<p>latency < 2s</p><span class="sparkline">1,2</span>"#).unwrap();
        let p = doc.elements_by_tag(doc.root(), "p")[0];
        assert_eq!(doc.text_content(p), "latency < 2s");
        // the span stays a sibling of the paragraph
        let span = doc.elements_with_class(doc.root(), "sparkline")[0];
        assert_eq!(doc.parent(span), Some(doc.root()));
        assert_eq!(
            doc.to_html(),
            r#"<p>latency &lt; 2s</p><span class="sparkline">1,2</span>"#
        );
    }

    #[test]
    fn test_less_than_before_digit_is_text() {
        let doc = Document::parse("<b>i <3 maps</b><i>x</i>").unwrap();
        assert_eq!(doc.to_html(), "<b>i &lt;3 maps</b><i>x</i>");
    }

    #[test]
    fn test_unclosed_less_than_is_text() {
        let doc = Document::parse("<p>a < b").unwrap();
        let p = doc.elements_by_tag(doc.root(), "p")[0];
        assert_eq!(doc.text_content(p), "a < b");
    }

    #[test]
    fn test_xml_declaration_preserved() {
        let markup = r#"<?xml version="1.0" encoding="utf-8"?><html></html>"#;
        assert_eq!(Document::parse(markup).unwrap().to_html(), markup);
    }

    #[test]
    fn test_implied_list_item_ends() {
        let doc = Document::parse("<ul><li>a<li>b</ul><p>after</p>").unwrap();
        let ul = doc.elements_by_tag(doc.root(), "ul")[0];
        assert_eq!(doc.children(ul).len(), 2);
        assert_eq!(doc.to_html(), "<ul><li>a</li><li>b</li></ul><p>after</p>");
    }

    #[test]
    fn test_nested_list_item_not_closed_across_list() {
        let doc = Document::parse("<ul><li>a<ul><li>b<li>c</ul></li></ul>").unwrap();
        let outer = doc.elements_by_tag(doc.root(), "ul")[0];
        assert_eq!(doc.children(outer).len(), 1);
        assert_eq!(doc.to_html(), "<ul><li>a<ul><li>b</li><li>c</li></ul></li></ul>");
    }

    #[test]
    fn test_implied_table_row_ends() {
        let doc = Document::parse("<table><tr><td>1<td>2<tr><td>3</table>").unwrap();
        assert_eq!(doc.elements_by_tag(doc.root(), "tr").len(), 2);
        assert_eq!(
            doc.to_html(),
            "<table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table>"
        );
    }

    #[test]
    fn test_unclosed_lt_position() {
        assert_eq!(unclosed_lt("<p>a < b", 5), Some(5));
        assert_eq!(unclosed_lt("<p>a < b", 6), Some(5));
        assert_eq!(unclosed_lt("<p>a", 4), None);
    }

    #[test]
    fn test_literal_lt_position() {
        // `< 2s</p>` read as one bogus start tag with content ` 2s</p`
        let markup = "<p>x < 2s</p>";
        assert_eq!(literal_lt(markup, markup.len(), " 2s</p".len()), 5);
    }

    #[test]
    fn test_raw_text_bounds() {
        let markup = "<style>a{}</STYLE >rest";
        let (end, resume) = raw_text_bounds(markup, 7, "style");
        assert_eq!(&markup[7..end], "a{}");
        assert_eq!(&markup[resume..], "rest");
    }
}
