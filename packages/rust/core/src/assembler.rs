//! Export directory assembler.
//!
//! Takes catalog output (ordered chunks, the paged tree, the navigation map)
//! and writes one of three export layouts to disk:
//!
//! ```text
//! site:    <out>/manifest.json, <out>/nav.json, <out>/content/<slug>.md
//! wiki:    <out>/manifest.json, <out>/wiki.json
//! linear:  <out>/manifest.json, <out>/<root-slug>.md
//! ```
//!
//! Every file is written atomically (temp file, then rename).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use adit_markdown::{Frontmatter, extract_headings, render_toc};
use adit_shared::{
    AditError, CURRENT_SCHEMA_VERSION, ExportId, ExportManifest, PageRecord, Result, TocOptions,
    WikiConfig,
};

use crate::catalog::{Catalog, Chunk};
use crate::graph::GraphSource;
use crate::nav::write_nav;
use crate::tree::{DocTree, NodeId};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const NAV_FILE: &str = "nav.json";
pub const WIKI_FILE: &str = "wiki.json";
pub const CONTENT_DIR: &str = "content";

/// Where and how to write an export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Export directory; created if missing.
    pub output_dir: PathBuf,
    /// Root key the export is built from.
    pub root: String,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

/// Output from a successful export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub path: PathBuf,
    pub page_count: usize,
    pub manifest: ExportManifest,
}

/// One page of a wiki bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiDocument {
    pub key: String,
    pub title: String,
    pub space: String,
    /// Title of the page this document nests under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Key of the parent document, when it is part of this bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    pub body: String,
}

/// The `wiki.json` bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiBundle {
    pub space: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_page: Option<String>,
    pub documents: Vec<WikiDocument>,
}

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// Write a static-site export: one page per ordered chunk plus the
/// navigation map.
///
/// Page frontmatter carries the title, key, weight (the node's order rank),
/// every breadcrumb trail to the node, and the slugs of its outbound links.
#[instrument(skip_all, fields(root = %config.root, out = %config.output_dir.display()))]
pub async fn write_site<G: GraphSource>(
    config: &ExportConfig,
    catalog: &Catalog<G>,
) -> Result<ExportResult> {
    let out = &config.output_dir;
    let content_dir = out.join(CONTENT_DIR);
    create_dir(&content_dir)?;

    let chunks = catalog.get_ordered().await?;
    let tree = catalog.tree().await?;
    write_nav(&tree, &out.join(NAV_FILE))?;

    let mut slugs = SlugAllocator::default();
    let page_slugs: Vec<String> = chunks.iter().map(|c| slugs.allocate(&c.key)).collect();
    let slug_by_key: HashMap<&str, &str> = chunks
        .iter()
        .zip(&page_slugs)
        .map(|(c, s)| (c.key.as_str(), s.as_str()))
        .collect();

    let mut pages = Vec::with_capacity(chunks.len());
    for (chunk, slug) in chunks.iter().zip(&page_slugs) {
        let trails = catalog.breadcrumbs(&chunk.key).await?;
        let adjacency = catalog.adjacency(&chunk.key).await?;

        let mut frontmatter = Frontmatter::new()
            .string("title", &chunk.label)
            .string("key", &chunk.key);
        if let Some(weight) = tree.find(&chunk.key).and_then(|id| tree.node(id).order) {
            frontmatter = frontmatter.number("weight", weight);
        }
        let frontmatter = frontmatter
            .list(
                "breadcrumbs",
                trails.iter().map(|trail| {
                    trail
                        .iter()
                        .map(|b| b.label.as_str())
                        .collect::<Vec<_>>()
                        .join(" / ")
                }),
            )
            .list(
                "links",
                adjacency
                    .outbound
                    .iter()
                    .filter_map(|n| slug_by_key.get(n.key.as_str()).copied()),
            );

        let page = format!("{}\n{}\n", frontmatter.render(), chunk.markdown.trim_end());
        let rel = format!("{CONTENT_DIR}/{slug}.md");
        write_atomic(&out.join(&rel), &page)?;
        debug!(key = %chunk.key, path = %rel, "wrote page");
        pages.push(page_record(rel, &chunk.key, &chunk.label, &page));
    }

    finish(config, "site", pages)
}

// ---------------------------------------------------------------------------
// Wiki
// ---------------------------------------------------------------------------

/// Write a wiki bundle: one document per node of the paged tree that carries
/// chunks, tagged with the space and its parent page.
///
/// A document nests under its nearest ancestor that is itself a document.
/// Documents without one nest under the configured parent page, if any.
#[instrument(skip_all, fields(root = %config.root, space = %wiki.space))]
pub fn write_wiki(
    config: &ExportConfig,
    paged: &DocTree,
    wiki: &WikiConfig,
) -> Result<ExportResult> {
    create_dir(&config.output_dir)?;

    let documents: Vec<WikiDocument> = paged
        .preorder()
        .into_iter()
        .filter(|&id| !paged.node(id).chunks.is_empty())
        .map(|id| {
            let node = paged.node(id);
            let (parent, parent_key) = match nearest_document(paged, id) {
                Some(p) => {
                    let p = paged.node(p);
                    (Some(p.label.clone()), Some(p.key.clone()))
                }
                None => (wiki.parent_page.clone(), None),
            };
            WikiDocument {
                key: node.key.clone(),
                title: node.label.clone(),
                space: wiki.space.clone(),
                parent,
                parent_key,
                body: node.chunks.join("\n\n"),
            }
        })
        .collect();

    let bundle = WikiBundle {
        space: wiki.space.clone(),
        parent_page: wiki.parent_page.clone(),
        documents,
    };
    let json = to_json(&bundle)?;
    write_atomic(&config.output_dir.join(WIKI_FILE), &json)?;

    let record = page_record(WIKI_FILE.to_string(), &config.root, &wiki.space, &json);
    let mut result = finish(config, "wiki", vec![record])?;
    result.page_count = bundle.documents.len();
    Ok(result)
}

/// Closest proper ancestor of `id` that carries chunks.
fn nearest_document(paged: &DocTree, id: NodeId) -> Option<NodeId> {
    let mut current = paged.parent(id);
    while let Some(p) = current {
        if !paged.node(p).chunks.is_empty() {
            return Some(p);
        }
        current = paged.parent(p);
    }
    None
}

// ---------------------------------------------------------------------------
// Linear
// ---------------------------------------------------------------------------

/// Write every chunk into a single markdown document, preceded by a table of
/// contents when `toc` yields one.
#[instrument(skip_all, fields(root = %config.root, chunks = chunks.len()))]
pub fn write_linear(
    config: &ExportConfig,
    chunks: &[Chunk],
    toc: &TocOptions,
) -> Result<ExportResult> {
    create_dir(&config.output_dir)?;

    let body = chunks
        .iter()
        .map(|c| c.markdown.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n");
    let contents = render_toc(&extract_headings(&body), toc);

    let mut document = String::with_capacity(contents.len() + body.len() + 2);
    if !contents.is_empty() {
        document.push_str(&contents);
        document.push('\n');
    }
    document.push_str(&body);
    document.push('\n');

    let rel = format!("{}.md", slugify(&config.root));
    write_atomic(&config.output_dir.join(&rel), &document)?;

    let record = page_record(rel, &config.root, &config.root, &document);
    let mut result = finish(config, "linear", vec![record])?;
    result.page_count = chunks.len();
    Ok(result)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Verify that an export directory is well-formed.
///
/// The manifest must parse with the current schema version, every page it
/// records must exist, and site exports must carry `nav.json`.
pub fn validate_export(dir: &Path) -> Result<ExportManifest> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(AditError::validation(format!("missing {MANIFEST_FILE}")));
    }

    let content =
        std::fs::read_to_string(&manifest_path).map_err(|e| AditError::io(&manifest_path, e))?;
    let manifest: ExportManifest = serde_json::from_str(&content)
        .map_err(|e| AditError::validation(format!("invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(AditError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }

    if manifest.format == "site" && !dir.join(NAV_FILE).exists() {
        return Err(AditError::validation(format!("missing {NAV_FILE}")));
    }

    for page in &manifest.pages {
        let path = dir.join(&page.path);
        if !path.exists() {
            return Err(AditError::validation(format!(
                "manifest lists missing page {}",
                page.path
            )));
        }
        let bytes = std::fs::read(&path).map_err(|e| AditError::io(&path, e))?;
        if sha256_hex(&bytes) != page.sha256 {
            warn!(path = %page.path, "page content changed since export");
        }
    }

    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// File-system-safe slug for a node key.
///
/// Lowercases, turns spaces, underscores and path separators into dashes,
/// and drops every other non-alphanumeric character. Empty results become
/// `index`.
pub fn slugify(key: &str) -> String {
    let slug: String = key
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '_' | '/' | '\\' | '.' | ':' => Some('-'),
            c if c.is_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect();
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug.to_string()
    }
}

/// Hands out unique slugs, numbering repeats `-2`, `-3`, ...
///
/// A numbered slug that some other key already slugifies to is skipped.
#[derive(Debug, Default)]
struct SlugAllocator {
    issued: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SlugAllocator {
    fn allocate(&mut self, key: &str) -> String {
        let base = slugify(key);
        let mut suffix = self.next_suffix.get(&base).copied().unwrap_or(1);
        let mut slug = base.clone();
        while !self.issued.insert(slug.clone()) {
            suffix += 1;
            slug = format!("{base}-{suffix}");
        }
        self.next_suffix.insert(base, suffix);
        slug
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn page_record(path: String, key: &str, title: &str, content: &str) -> PageRecord {
    PageRecord {
        path,
        key: key.to_string(),
        title: title.to_string(),
        sha256: sha256_hex(content.as_bytes()),
        size_bytes: content.len(),
    }
}

/// Write the manifest and wrap up an export.
fn finish(config: &ExportConfig, format: &str, pages: Vec<PageRecord>) -> Result<ExportResult> {
    let manifest = ExportManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        id: ExportId::new(),
        root: config.root.clone(),
        format: format.to_string(),
        tool_version: config.tool_version.clone(),
        created_at: Utc::now(),
        page_count: pages.len(),
        pages,
    };
    write_json(&config.output_dir.join(MANIFEST_FILE), &manifest)?;

    info!(
        format,
        page_count = manifest.page_count,
        path = %config.output_dir.display(),
        "export complete"
    );

    Ok(ExportResult {
        path: config.output_dir.clone(),
        page_count: manifest.page_count,
        manifest,
    })
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| AditError::io(dir, e))
}

fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| AditError::validation(format!("JSON serialization failed: {e}")))
}

/// Write a JSON file (pretty-printed).
pub(crate) fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    write_atomic(path, &to_json(data)?)?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| AditError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| AditError::io(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use adit_shared::{CatalogOptions, ContentNode};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "adit-assembler-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_config(out: &Path) -> ExportConfig {
        ExportConfig {
            output_dir: out.to_path_buf(),
            root: "root".into(),
            tool_version: "0.1.0-test".into(),
        }
    }

    fn graph() -> MemoryGraph {
        MemoryGraph::new()
            .with_node(ContentNode::passage("root", "Handbook"))
            .with_node(
                ContentNode::passage("guide", "Guide")
                    .with_order(1.0)
                    .with_body("# Guide\nStart here."),
            )
            .with_node(ContentNode::leaf("guide/install", "Install", "# Install\nRun it."))
            .with_node(ContentNode::leaf("faq", "FAQ", "# FAQ\nAsk away."))
            .with_edge("root", "guide")
            .with_edge("root", "faq")
            .with_edge("guide", "guide/install")
            .with_edge("faq", "guide/install")
    }

    async fn catalog() -> Catalog<MemoryGraph> {
        let mut catalog = Catalog::new(graph(), CatalogOptions::new("root")).unwrap();
        catalog.init().await.unwrap();
        catalog
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn site_writes_pages_nav_and_manifest() {
        let tmp = temp_dir();
        let catalog = catalog().await;

        let result = write_site(&make_config(&tmp), &catalog).await.unwrap();
        // root (label heading), guide, guide/install, faq
        assert_eq!(result.page_count, 4);
        assert!(tmp.join(NAV_FILE).exists());
        assert!(tmp.join("content/root.md").exists());

        let install = std::fs::read_to_string(tmp.join("content/guide-install.md")).unwrap();
        assert!(install.starts_with("---\ntitle: \"Install\"\nkey: \"guide/install\"\n"));
        assert!(install.contains("breadcrumbs:\n  - \"Guide\"\n  - \"FAQ\"\n"));
        assert!(install.contains("## Install\nRun it."));

        let guide = std::fs::read_to_string(tmp.join("content/guide.md")).unwrap();
        assert!(guide.contains("weight: 1\n"));
        assert!(guide.contains("links:\n  - \"guide-install\"\n"));

        let manifest = validate_export(&tmp).unwrap();
        assert_eq!(manifest.format, "site");
        assert_eq!(manifest.pages.len(), 4);
        assert_eq!(manifest.pages[0].sha256.len(), 64);

        cleanup(&tmp);
    }

    #[tokio::test]
    async fn site_export_leaves_no_temp_files() {
        let tmp = temp_dir();
        let catalog = catalog().await;
        write_site(&make_config(&tmp), &catalog).await.unwrap();

        for dir in [tmp.clone(), tmp.join(CONTENT_DIR)] {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let name = entry.unwrap().file_name().to_string_lossy().to_string();
                assert!(!name.starts_with('.'), "temp file left behind: {name}");
            }
        }
        cleanup(&tmp);
    }

    #[tokio::test]
    async fn wiki_bundle_tags_space_and_parent() {
        let tmp = temp_dir();
        let catalog = catalog().await;
        let paged = catalog.get_paged().await.unwrap();
        let wiki = WikiConfig {
            space: "DOCS".into(),
            parent_page: Some("Home".into()),
        };

        let result = write_wiki(&make_config(&tmp), &paged, &wiki).unwrap();
        let bundle: WikiBundle =
            serde_json::from_str(&std::fs::read_to_string(tmp.join(WIKI_FILE)).unwrap()).unwrap();

        assert_eq!(result.page_count, bundle.documents.len());
        assert!(bundle.documents.iter().all(|d| d.space == "DOCS"));
        let keys: Vec<_> = bundle.documents.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["root", "guide/install"]);

        // The bodiless root absorbed its children's pages.
        let root = &bundle.documents[0];
        assert_eq!(root.parent.as_deref(), Some("Home"));
        assert_eq!(root.parent_key, None);
        assert_eq!(root.body, "# Guide\nStart here.\n\n# FAQ\nAsk away.");

        // "Guide" gave its chunks to the root, so install nests under the root.
        let install = &bundle.documents[1];
        assert_eq!(install.parent.as_deref(), Some("Handbook"));
        assert_eq!(install.parent_key.as_deref(), Some("root"));

        assert_eq!(validate_export(&tmp).unwrap().format, "wiki");
        cleanup(&tmp);
    }

    #[tokio::test]
    async fn wiki_parents_are_always_documents_in_the_bundle() {
        let tmp = temp_dir();
        let graph = MemoryGraph::new()
            .with_node(ContentNode::passage("root", "Handbook").with_body("intro"))
            .with_node(ContentNode::passage("guide", "Guide"))
            .with_node(ContentNode::passage("setup", "Setup").with_body("setup body"))
            .with_node(ContentNode::leaf("install", "Install", "install body"))
            .with_node(ContentNode::leaf("other", "Guide", "same label"))
            .with_edge("root", "guide")
            .with_edge("guide", "setup")
            .with_edge("setup", "install")
            .with_edge("root", "other");
        let mut catalog = Catalog::new(graph, CatalogOptions::new("root")).unwrap();
        catalog.init().await.unwrap();
        let paged = catalog.get_paged().await.unwrap();

        write_wiki(&make_config(&tmp), &paged, &WikiConfig::default()).unwrap();
        let bundle: WikiBundle =
            serde_json::from_str(&std::fs::read_to_string(tmp.join(WIKI_FILE)).unwrap()).unwrap();

        let keys: HashSet<&str> = bundle.documents.iter().map(|d| d.key.as_str()).collect();
        for doc in &bundle.documents {
            if let Some(parent) = &doc.parent_key {
                assert!(keys.contains(parent.as_str()), "{} nests under missing {parent}", doc.key);
            }
        }
        // Setup folded into the bodiless guide; install climbs past it.
        assert!(!keys.contains("setup"));
        let guide = bundle.documents.iter().find(|d| d.key == "guide").unwrap();
        assert_eq!(guide.parent_key.as_deref(), Some("root"));
        let install = bundle.documents.iter().find(|d| d.key == "install").unwrap();
        assert_eq!(install.parent.as_deref(), Some("Guide"));
        assert_eq!(install.parent_key.as_deref(), Some("guide"));
        let other = bundle.documents.iter().find(|d| d.key == "other").unwrap();
        assert_eq!(other.parent_key.as_deref(), Some("root"));
        let root = bundle.documents.iter().find(|d| d.key == "root").unwrap();
        assert_eq!(root.parent, None);
        cleanup(&tmp);
    }

    #[tokio::test]
    async fn linear_document_has_toc_and_all_chunks() {
        let tmp = temp_dir();
        let catalog = catalog().await;
        let chunks = catalog.get_ordered().await.unwrap();
        let toc = TocOptions {
            max_depth: 3,
            top_level: true,
        };

        let result = write_linear(&make_config(&tmp), &chunks, &toc).unwrap();
        assert_eq!(result.page_count, chunks.len());

        let doc = std::fs::read_to_string(tmp.join("root.md")).unwrap();
        assert!(doc.starts_with(
            "- [Handbook](#handbook)\n- [Guide](#guide)\n  - [Install](#install)\n- [FAQ](#faq)\n\n# Handbook\n"
        ));
        assert!(doc.contains("# Handbook\n\n# Guide\nStart here.\n\n## Install\nRun it."));
        assert!(doc.ends_with("Ask away.\n"));

        cleanup(&tmp);
    }

    #[test]
    fn linear_without_toc_starts_with_content() {
        let tmp = temp_dir();
        let chunks = vec![Chunk {
            key: "a".into(),
            label: "A".into(),
            depth: 1,
            markdown: "# A\nbody".into(),
        }];
        let toc = TocOptions {
            max_depth: 0,
            top_level: true,
        };
        write_linear(&make_config(&tmp), &chunks, &toc).unwrap();
        let doc = std::fs::read_to_string(tmp.join("root.md")).unwrap();
        assert_eq!(doc, "# A\nbody\n");
        cleanup(&tmp);
    }

    #[test]
    fn validate_export_missing_manifest() {
        let tmp = temp_dir();
        let err = validate_export(&tmp).unwrap_err();
        assert!(err.to_string().contains("missing manifest.json"));
        cleanup(&tmp);
    }

    #[test]
    fn validate_export_rejects_unknown_schema() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        finish(&config, "linear", Vec::new()).unwrap();

        let path = tmp.join(MANIFEST_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        manifest["schema_version"] = serde_json::json!(99);
        std::fs::write(&path, manifest.to_string()).unwrap();

        let err = validate_export(&tmp).unwrap_err();
        assert!(err.to_string().contains("unsupported schema_version"));
        cleanup(&tmp);
    }

    #[test]
    fn validate_export_requires_listed_pages() {
        let tmp = temp_dir();
        let record = page_record("content/gone.md".into(), "gone", "Gone", "x");
        finish(&make_config(&tmp), "linear", vec![record]).unwrap();

        let err = validate_export(&tmp).unwrap_err();
        assert!(err.to_string().contains("content/gone.md"));
        cleanup(&tmp);
    }

    #[test]
    fn slugify_handles_common_patterns() {
        assert_eq!(slugify("guide/getting_started"), "guide-getting-started");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("/"), "index");
        assert_eq!(slugify("node:42"), "node-42");
        assert_eq!(slugify("¿qué?"), "qué");
    }

    #[test]
    fn slug_allocator_numbers_repeats() {
        let mut slugs = SlugAllocator::default();
        assert_eq!(slugs.allocate("a_b"), "a-b");
        assert_eq!(slugs.allocate("a/b"), "a-b-2");
        assert_eq!(slugs.allocate("a b"), "a-b-3");
        assert_eq!(slugs.allocate("c"), "c");
    }

    #[test]
    fn slug_allocator_skips_numbered_slugs_already_taken() {
        let mut slugs = SlugAllocator::default();
        let issued: Vec<String> = ["a-b", "a b", "a-b-2"]
            .into_iter()
            .map(|k| slugs.allocate(k))
            .collect();
        assert_eq!(issued, vec!["a-b", "a-b-2", "a-b-2-2"]);
    }

    #[tokio::test]
    async fn site_pages_never_share_a_path() {
        let tmp = temp_dir();
        let graph = MemoryGraph::new()
            .with_node(ContentNode::passage("root", "Root").with_body("root body"))
            .with_node(ContentNode::leaf("a-b", "First", "first page").with_order(1.0))
            .with_node(ContentNode::leaf("a b", "Second", "second page").with_order(2.0))
            .with_node(ContentNode::leaf("a-b-2", "Third", "third page").with_order(3.0))
            .with_edge("root", "a-b")
            .with_edge("root", "a b")
            .with_edge("root", "a-b-2");
        let mut catalog = Catalog::new(graph, CatalogOptions::new("root")).unwrap();
        catalog.init().await.unwrap();

        let result = write_site(&make_config(&tmp), &catalog).await.unwrap();
        assert_eq!(result.page_count, 4);
        let paths: HashSet<&str> = result.manifest.pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths.len(), 4);
        assert_eq!(std::fs::read_dir(tmp.join(CONTENT_DIR)).unwrap().count(), 4);

        let second = std::fs::read_to_string(tmp.join("content/a-b-2.md")).unwrap();
        assert!(second.contains("second page"));
        let third = std::fs::read_to_string(tmp.join("content/a-b-2-2.md")).unwrap();
        assert!(third.contains("third page"));
        cleanup(&tmp);
    }
}
