//! Resource table filter
//!
//! The dashboard's resource list is a table whose rows carry facet cells:
//!
//! ```text
//! <table class="searchable" id="resources-table">
//!   <tr>
//!     <td class="facet-name">Demo WMS</td>
//!     <td class="facet-type">OGC:WMS</td>
//!     <td><a class="facet-url" title="https://demo.example/wms">...</a></td>
//!   </tr>
//! ```
//!
//! A search term may start with a facet prefix:
//!
//! | Prefix   | Cells searched   | Text matched                       |
//! |----------|------------------|------------------------------------|
//! | (none)   | `td.facet-name`  | cell text                          |
//! | `title:` | `td.facet-name`  | cell text                          |
//! | `type:`  | `td.facet-type`  | cell text                          |
//! | `url:`   | `a.facet-url`    | `title` attribute                  |
//! | `site:`  | `a.facet-url`    | host part of the `title` attribute |
//!
//! The rest of the term is a case-insensitive regular expression. A term that
//! is not a valid expression is matched literally.

use crate::dom::{Document, NodeId};
use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Element holding the "N results" label
pub const RESULTS_LABEL_ID: &str = "resources-table-num-results";

/// Class of the container whose rows are filtered
pub const SEARCHABLE_CLASS: &str = "searchable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Title,
    Type,
    Url,
    Site,
}

impl Facet {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "title" => Some(Facet::Title),
            "type" => Some(Facet::Type),
            "url" => Some(Facet::Url),
            "site" => Some(Facet::Site),
            _ => None,
        }
    }

    /// Tag and class of the cells this facet searches
    pub fn selector(&self) -> (&'static str, &'static str) {
        match self {
            Facet::Title => ("td", "facet-name"),
            Facet::Type => ("td", "facet-type"),
            Facet::Url | Facet::Site => ("a", "facet-url"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    pub facet: Facet,
    pub pattern: Regex,
}

impl Query {
    pub fn parse(term: &str) -> Result<Self> {
        let (facet, needle) = match term.split_once(':') {
            Some((prefix, rest)) => match Facet::from_prefix(prefix) {
                Some(facet) => (facet, rest),
                None => (Facet::Title, term),
            },
            None => (Facet::Title, term),
        };

        Ok(Self {
            facet,
            pattern: compile(needle)?,
        })
    }

    /// Text of `cell` this query is matched against
    pub fn haystack(&self, doc: &Document, cell: NodeId) -> String {
        match self.facet {
            Facet::Title | Facet::Type => doc.text_content(cell),
            Facet::Url => doc.attr(cell, "title").unwrap_or("").to_string(),
            Facet::Site => site_of(doc.attr(cell, "title").unwrap_or("")).to_string(),
        }
    }

    pub fn matches(&self, doc: &Document, cell: NodeId) -> bool {
        self.pattern.is_match(&self.haystack(doc, cell))
    }
}

fn compile(needle: &str) -> Result<Regex> {
    let build = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build();
    match build(needle) {
        Ok(re) => Ok(re),
        Err(err) => {
            tracing::debug!(needle, error = %err, "filter term is not a pattern, matching literally");
            Ok(build(&regex::escape(needle))?)
        }
    }
}

/// Host part of a URL: the third `/`-separated segment
pub fn site_of(url: &str) -> &str {
    url.split('/').nth(2).unwrap_or("")
}

pub fn results_label(count: usize) -> String {
    format!("{} result{}", count, if count == 1 { "" } else { "s" })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    /// Cells that matched
    pub matches: usize,
    /// Rows left visible
    pub visible_rows: usize,
    pub label: String,
}

/// Rows that take part in filtering: every `tr` inside a searchable container
pub fn searchable_rows(doc: &Document) -> Vec<NodeId> {
    let mut rows: Vec<NodeId> = doc
        .elements_with_class(doc.root(), SEARCHABLE_CLASS)
        .into_iter()
        .flat_map(|container| doc.elements_by_tag(container, "tr"))
        .collect();
    rows.sort();
    rows.dedup();
    rows
}

/// Hide every searchable row, then show the rows containing a matching cell
/// and update the result label.
pub fn apply(doc: &mut Document, term: &str) -> Result<FilterResult> {
    let query = Query::parse(term)?;
    let (tag, class) = query.facet.selector();

    for row in searchable_rows(doc) {
        doc.set_style_property(row, "display", "none");
    }

    let cells: Vec<NodeId> = doc
        .elements_with_class(doc.root(), class)
        .into_iter()
        .filter(|&id| doc.tag(id) == Some(tag))
        .collect();

    let mut matches = 0;
    let mut shown = Vec::new();
    for cell in cells {
        if !query.matches(doc, cell) {
            continue;
        }
        matches += 1;
        if let Some(row) = doc.closest(cell, "tr") {
            doc.remove_style_property(row, "display");
            shown.push(row);
        }
    }
    shown.sort();
    shown.dedup();

    let label = results_label(matches);
    if let Some(target) = doc.element_by_id(RESULTS_LABEL_ID) {
        doc.set_text(target, &label);
    }

    Ok(FilterResult {
        matches,
        visible_rows: shown.len(),
        label,
    })
}
