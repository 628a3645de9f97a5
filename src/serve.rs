//! HTTP server for dashboard preview
//!
//! `healthspark serve ./site` → starts server, opens browser, serves every
//! page with its sparklines rendered on the fly.
//!
//! - `GET /` lists the HTML pages under the directory
//! - `GET /<page>.html[?filter=<term>]` renders a page, optionally filtering
//!   its resource tables
//! - `GET /api/render?path=<page>` returns the render summary of a page as JSON

use crate::filter::{self, FilterResult};
use crate::render::{render_document, RenderOptions};
use crate::sparkline::RenderSummary;
use crate::Document;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server};
use walkdir::WalkDir;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    fn failure(error: String) -> Self {
        Self { ok: false, data: None, error: Some(error) }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PageParams {
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RenderParams {
    pub path: String,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageReport {
    pub path: String,
    pub summary: RenderSummary,
    pub filter: Option<FilterResult>,
}

/// Start server, open browser, serve pages
pub fn start(port: u16, root: PathBuf, options: RenderOptions, open_browser: bool) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    let root = root.canonicalize().unwrap_or(root);

    eprintln!("\n\x1b[1;32m▁▃▅▇ Healthspark\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Serving: {}\n", root.display());

    if open_browser {
        let _ = open::that(&url);
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &root, &options) {
            tracing::warn!(error = %e, "request failed");
        }
    }

    Ok(())
}

fn html_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        .expect("static header is valid")
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is valid")
}

fn handle_request(request: Request, root: &Path, options: &RenderOptions) -> std::io::Result<()> {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (url.clone(), String::new()),
    };
    let method = request.method().clone();
    tracing::info!(%method, %url, "request");

    match (&method, path.as_str()) {
        (&Method::Get, "/") => {
            let response = Response::from_string(index_html(root)).with_header(html_header());
            request.respond(response)
        }

        // API: render summary of one page
        (&Method::Get, "/api/render") => {
            let json = match serde_urlencoded::from_str::<RenderParams>(&query) {
                Ok(params) => match render_page(root, &params.path, params.filter.as_deref(), options) {
                    Ok((_, report)) => serde_json::to_string(&ApiResponse::success(report))?,
                    Err(e) => serde_json::to_string(&ApiResponse::<PageReport>::failure(e))?,
                },
                Err(e) => serde_json::to_string(&ApiResponse::<PageReport>::failure(e.to_string()))?,
            };
            request.respond(Response::from_string(json).with_header(json_header()))
        }

        (&Method::Get, page) if is_html(page) => {
            let params: PageParams = serde_urlencoded::from_str(&query).unwrap_or_default();
            match render_page(root, page, params.filter.as_deref(), options) {
                Ok((html, _)) => request.respond(Response::from_string(html).with_header(html_header())),
                Err(e) => request.respond(Response::from_string(e).with_status_code(404)),
            }
        }

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn is_html(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Map a request path onto a file below `root`, refusing to leave it
pub fn resolve_page(root: &Path, page: &str) -> Option<PathBuf> {
    let relative = Path::new(page.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    let full = root.join(relative);
    full.is_file().then_some(full)
}

fn render_page(
    root: &Path,
    page: &str,
    filter_term: Option<&str>,
    options: &RenderOptions,
) -> Result<(String, PageReport), String> {
    let file = resolve_page(root, page).ok_or_else(|| format!("Page not found: {}", page))?;
    let markup = std::fs::read_to_string(&file).map_err(|e| e.to_string())?;
    let mut doc = Document::parse(&markup).map_err(|e| e.to_string())?;

    let filter = match filter_term {
        Some(term) => Some(filter::apply(&mut doc, term).map_err(|e| e.to_string())?),
        None => None,
    };
    let summary = render_document(&mut doc, options);

    let report = PageReport {
        path: page.to_string(),
        summary,
        filter,
    };
    Ok((doc.to_html(), report))
}

/// HTML pages below `root`, relative and sorted
pub fn list_pages(root: &Path) -> Vec<String> {
    let mut pages: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_html(&e.path().to_string_lossy()))
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    pages.sort();
    pages
}

fn index_html(root: &Path) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Healthspark preview</title></head><body>\n<h1>Pages</h1>\n<ul>\n",
    );
    for page in list_pages(root) {
        let escaped = page.replace('&', "&amp;").replace('<', "&lt;").replace('"', "&quot;");
        html.push_str(&format!("<li><a href=\"/{0}\">{0}</a></li>\n", escaped));
    }
    html.push_str("</ul>\n</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<p id="resources-table-num-results"></p><table class="searchable"><tr><td class="facet-name">Demo</td><td><span class="sparkline">1,2,3</span></td></tr></table>"#,
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("resource")).unwrap();
        std::fs::write(dir.path().join("resource/3.html"), "<p>x</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        dir
    }

    // ==========================================================================
    // PAGE RESOLUTION TESTS
    // ==========================================================================

    #[test]
    fn test_list_pages() {
        let dir = site();
        assert_eq!(list_pages(dir.path()), vec!["index.html", "resource/3.html"]);
    }

    #[test]
    fn test_resolve_page_refuses_traversal() {
        let dir = site();
        assert!(resolve_page(dir.path(), "/index.html").is_some());
        assert!(resolve_page(dir.path(), "/resource/3.html").is_some());
        assert!(resolve_page(dir.path(), "/../index.html").is_none());
        assert!(resolve_page(dir.path(), "/missing.html").is_none());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("/a/B.HTM"));
        assert!(!is_html("/a/b.css"));
    }

    // ==========================================================================
    // PAGE RENDERING TESTS
    // ==========================================================================

    #[test]
    fn test_render_page_with_filter() {
        let dir = site();
        let (html, report) =
            render_page(dir.path(), "/index.html", Some("nomatch"), &RenderOptions::default()).unwrap();

        assert_eq!(report.summary.rendered, 1);
        assert_eq!(report.filter.as_ref().unwrap().label, "0 results");
        assert!(html.contains("<svg"));
        assert!(html.contains("display: none"));
    }

    #[test]
    fn test_render_page_missing() {
        let dir = site();
        let err = render_page(dir.path(), "/nope.html", None, &RenderOptions::default()).unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_page_params_from_query() {
        let params: PageParams = serde_urlencoded::from_str("filter=type%3Awms").unwrap();
        assert_eq!(params.filter.as_deref(), Some("type:wms"));
        let params: PageParams = serde_urlencoded::from_str("").unwrap();
        assert!(params.filter.is_none());
    }

    #[test]
    fn test_api_response_shape() {
        let json = serde_json::to_value(ApiResponse::<u8>::failure("bad".to_string())).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "bad");
    }
}
