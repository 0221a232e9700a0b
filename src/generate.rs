//! HTML site generation.
//!
//! Renders the assembled build model into a static site. Nothing here reads
//! the release tree or the commit history; the input is the in-memory model
//! and the devices document.
//!
//! ## Generated Pages
//!
//! ```text
//! out/
//! ├── index.html                 # Latest build + entry points
//! ├── supported_devices.html     # Devices document
//! ├── downloads/
//! │   ├── index.html             # Page 1 of the build list
//! │   ├── page2.html             # Page 2, ...
//! │   └── ...
//! └── res/
//!     └── style.css
//! ```
//!
//! Download pages link artifacts into `files/`, the release root that lives
//! next to the generated pages in the published site.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping, and the
//! output carries no insignificant whitespace.

use crate::config::SiteConfig;
use crate::types::{Build, CommitEntry, FileEntry};
use maud::{DOCTYPE, Markup, html};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Devices file must contain a JSON object or array")]
    InvalidDevices,
}

const CSS: &str = include_str!("../static/style.css");

/// Directory the release root is published under, relative to the site root.
const FILES_DIR: &str = "files";

/// Load the devices document. Its contents are passed through unmodified.
pub fn load_devices(path: &Path) -> Result<Value, GenerateError> {
    let content = fs::read_to_string(path)?;
    let devices: Value = serde_json::from_str(&content)?;
    if !(devices.is_object() || devices.is_array()) {
        return Err(GenerateError::InvalidDevices);
    }
    Ok(devices)
}

/// Render the whole site into `output_dir`.
///
/// Returns the written pages, relative to `output_dir`, in write order.
pub fn generate(
    builds: &[Build],
    devices: &Value,
    config: &SiteConfig,
    output_dir: &Path,
) -> Result<Vec<String>, GenerateError> {
    let mut written = Vec::new();
    let mut write = |rel: String, markup: Markup| -> Result<(), GenerateError> {
        let path = output_dir.join(&rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, markup.into_string())?;
        written.push(rel);
        Ok(())
    };

    write("index.html".to_string(), render_index(builds, devices, config))?;

    let per_page = config.pagination.items_per_page.max(1);
    let total_pages = page_count(builds.len(), per_page);
    for page in 1..=total_pages {
        let begin = per_page * (page - 1);
        let end = (per_page * page).min(builds.len());
        let slice = builds.get(begin..end).unwrap_or_default();
        write(
            format!("downloads/{}", download_page(page)),
            render_download_page(slice, page, total_pages, config),
        )?;
    }

    write(
        "supported_devices.html".to_string(),
        render_devices_page(devices, config),
    )?;

    let res_dir = output_dir.join("res");
    fs::create_dir_all(&res_dir)?;
    fs::write(res_dir.join("style.css"), CSS)?;
    written.push("res/style.css".to_string());

    Ok(written)
}

// ============================================================================
// Presentation helpers
// ============================================================================

/// Number of download pages: `max(1, ceil(builds / per_page))`.
pub fn page_count(build_count: usize, per_page: usize) -> usize {
    build_count.div_ceil(per_page.max(1)).max(1)
}

/// File name of a download page. Page 1 is the directory index.
pub fn download_page(page: usize) -> String {
    if page == 1 {
        "index.html".to_string()
    } else {
        format!("page{page}.html")
    }
}

/// Humanized byte size with binary units: `1536` → `"1.5 KiB"`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 7] = [
        (1 << 60, "EiB"),
        (1 << 50, "PiB"),
        (1 << 40, "TiB"),
        (1 << 30, "GiB"),
        (1 << 20, "MiB"),
        (1 << 10, "KiB"),
        (1, "bytes"),
    ];
    if bytes == 1 {
        return "1 byte".to_string();
    }
    let (factor, suffix) = UNITS
        .iter()
        .find(|(factor, _)| bytes >= *factor)
        .copied()
        .unwrap_or((1, "bytes"));
    format!("{:.1} {}", bytes as f64 / factor as f64, suffix)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure.
///
/// `root` is the relative path back to the site root (`""` or `"../"`).
fn base_document(title: &str, root: &str, config: &SiteConfig, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - " (config.site.title) }
                link rel="stylesheet" href={ (root) "res/style.css" };
            }
            body {
                (site_header(root, config))
                (content)
            }
        }
    }
}

fn site_header(root: &str, config: &SiteConfig) -> Markup {
    html! {
        header.site-header {
            a.site-title href={ (root) "index.html" } { (config.site.title) }
            nav {
                a href={ (root) "downloads/index.html" } { "Downloads" }
                a href={ (root) "supported_devices.html" } { "Supported devices" }
            }
        }
    }
}

/// Artifact table, one row per file, variants in model order.
fn file_table(files: &[FileEntry], root: &str) -> Markup {
    html! {
        table.files {
            thead {
                tr {
                    th { "Variant" }
                    th { "File" }
                    th { "Size" }
                    th { "Checksums" }
                }
            }
            tbody {
                @for file in files {
                    tr {
                        td { (file.variant) }
                        td {
                            a href={ (root) (FILES_DIR) "/" (file.path) } { (file.name) }
                        }
                        td.size { (human_size(file.size)) }
                        td.checksums {
                            @for (algo, path) in &file.checksums {
                                a href={ (root) (FILES_DIR) "/" (path) } { (algo.as_str()) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn commit_list(commits: &[CommitEntry], config: &SiteConfig) -> Markup {
    html! {
        @if commits.is_empty() {
            p.empty { "Oldest published build, no changelog available." }
        } @else {
            ul.commits {
                @for commit in commits {
                    li {
                        @if let Some(link) = config.site.commit_link(&commit.id) {
                            a href=(link) { code { (commit.short_id) } }
                        } @else {
                            code { (commit.short_id) }
                        }
                        (commit.message)
                    }
                }
            }
        }
    }
}

fn build_section(build: &Build, root: &str, config: &SiteConfig) -> Markup {
    html! {
        section.build id=(build.version) {
            h2 { (build.version) }
            p.build-timestamp { (build.timestamp) }
            @if build.files.is_empty() {
                p.empty { "No files." }
            } @else {
                (file_table(&build.files, root))
            }
            h3 { "Changes" }
            (commit_list(&build.commits, config))
        }
    }
}

/// Page links: previous, every page number, next.
pub fn render_pagination(page: usize, total_pages: usize) -> Markup {
    html! {
        nav.pagination {
            @if page > 1 {
                a.prev href=(download_page(page - 1)) { "Newer" }
            }
            @for n in 1..=total_pages {
                @if n == page {
                    span.current { (n) }
                } @else {
                    a href=(download_page(n)) { (n) }
                }
            }
            @if page < total_pages {
                a.next href=(download_page(page + 1)) { "Older" }
            }
        }
    }
}

/// Recursive rendering of an arbitrary JSON value.
fn render_json(value: &Value) -> Markup {
    match value {
        Value::Object(map) => html! {
            dl {
                @for (key, item) in map {
                    dt { (key) }
                    dd { (render_json(item)) }
                }
            }
        },
        Value::Array(items) => html! {
            ul {
                @for item in items {
                    li { (render_json(item)) }
                }
            }
        },
        Value::String(s) => html! { (s) },
        Value::Null => html! {},
        other => html! { (other.to_string()) },
    }
}

fn device_count(devices: &Value) -> usize {
    match devices {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_index(builds: &[Build], devices: &Value, config: &SiteConfig) -> Markup {
    let content = html! {
        main.index-page {
            @if let Some(latest) = builds.first() {
                h1 { "Latest build" }
                (build_section(latest, "", config))
                p {
                    a href="downloads/index.html" { "All " (builds.len()) " builds" }
                }
            } @else {
                h1 { "No builds yet" }
                p.empty { "Nothing has been published." }
            }
            p {
                a href="supported_devices.html" {
                    (device_count(devices)) " supported devices"
                }
            }
        }
    };
    base_document("Home", "", config, content)
}

fn render_download_page(
    builds: &[Build],
    page: usize,
    total_pages: usize,
    config: &SiteConfig,
) -> Markup {
    let content = html! {
        main.downloads-page {
            h1 { "Downloads" }
            @if builds.is_empty() {
                p.empty { "Nothing has been published." }
            }
            @for build in builds {
                (build_section(build, "../", config))
            }
            (render_pagination(page, total_pages))
        }
    };
    let title = format!("Downloads (page {page} of {total_pages})");
    base_document(&title, "../", config, content)
}

fn render_devices_page(devices: &Value, config: &SiteConfig) -> Markup {
    let content = html! {
        main.devices {
            h1 { "Supported devices" }
            (render_json(devices))
        }
    };
    base_document("Supported devices", "", config, content)
}

// ============================================================================
// Tests
// ============================================================================
