//! End-to-end export pipeline: graph → catalog → chunks → export directory.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use adit_shared::{AditError, CatalogOptions, Result, TocOptions, WikiConfig};

use crate::assembler::{self, ExportConfig, ExportResult};
use crate::catalog::Catalog;
use crate::graph::GraphSource;

/// Export layout to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Site,
    Wiki,
    Linear,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Wiki => "wiki",
            Self::Linear => "linear",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = AditError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "site" => Ok(Self::Site),
            "wiki" => Ok(Self::Wiki),
            "linear" => Ok(Self::Linear),
            other => Err(AditError::validation(format!(
                "unknown export format `{other}` (expected site, wiki, or linear)"
            ))),
        }
    }
}

/// Everything one export run needs.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub catalog: CatalogOptions,
    pub output_dir: PathBuf,
    /// Run composite aggregation before export.
    pub populate: bool,
    pub toc: TocOptions,
    pub wiki: WikiConfig,
    pub tool_version: String,
}

/// Result of an export run.
#[derive(Debug)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub result: ExportResult,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, summary: &ExportSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _summary: &ExportSummary) {}
}

/// Run a full export.
///
/// 1. Validate options (before any graph access)
/// 2. Snapshot the graph
/// 3. Aggregate composites (optional)
/// 4. Write the requested layout
/// 5. Validate the export directory
#[instrument(skip_all, fields(format = %request.format, root = %request.catalog.root))]
pub async fn export<G: GraphSource>(
    source: G,
    request: &ExportRequest,
    progress: &dyn ProgressReporter,
) -> Result<ExportSummary> {
    let start = Instant::now();
    let mut catalog = Catalog::new(source, request.catalog.clone())?;

    progress.phase("Loading content graph");
    catalog.init().await?;

    if request.populate {
        progress.phase("Aggregating composite chunks");
        catalog.populate_chunks()?;
    }

    let config = ExportConfig {
        output_dir: request.output_dir.clone(),
        root: request.catalog.root.clone(),
        tool_version: request.tool_version.clone(),
    };

    progress.phase("Writing export");
    let result = match request.format {
        ExportFormat::Site => assembler::write_site(&config, &catalog).await?,
        ExportFormat::Wiki => {
            let paged = catalog.get_paged().await?;
            assembler::write_wiki(&config, &paged, &request.wiki)?
        }
        ExportFormat::Linear => {
            let chunks = catalog.get_ordered().await?;
            assembler::write_linear(&config, &chunks, &request.toc)?
        }
    };

    progress.phase("Validating export");
    assembler::validate_export(&result.path)?;

    let summary = ExportSummary {
        format: request.format,
        result,
        elapsed: start.elapsed(),
    };
    info!(
        pages = summary.result.page_count,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "export pipeline complete"
    );
    progress.done(&summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::graph::MemoryGraph;
    use adit_shared::ContentNode;

    #[derive(Default)]
    struct RecordingProgress {
        phases: RefCell<Vec<String>>,
        finished: RefCell<bool>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.borrow_mut().push(name.to_string());
        }
        fn done(&self, _summary: &ExportSummary) {
            *self.finished.borrow_mut() = true;
        }
    }

    fn graph() -> MemoryGraph {
        MemoryGraph::new()
            .with_node(ContentNode::passage("root", "Root"))
            .with_node(
                ContentNode::passage("s", "Seam")
                    .with_body("# Seam\nintro")
                    .with_grouped_keys(["x"]),
            )
            .with_node(ContentNode::leaf("x", "X", "x body"))
            .with_edge("root", "s")
            .with_edge("s", "x")
    }

    fn request(format: ExportFormat, out: PathBuf) -> ExportRequest {
        ExportRequest {
            format,
            catalog: CatalogOptions::new("root"),
            output_dir: out,
            populate: true,
            toc: TocOptions {
                max_depth: 2,
                top_level: true,
            },
            wiki: WikiConfig::default(),
            tool_version: "0.1.0-test".into(),
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("adit-pipeline-test-{}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn format_parses_and_displays() {
        assert_eq!("wiki".parse::<ExportFormat>().unwrap(), ExportFormat::Wiki);
        assert_eq!(ExportFormat::Linear.to_string(), "linear");
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[tokio::test]
    async fn linear_export_reports_every_phase() {
        let out = temp_dir();
        let progress = RecordingProgress::default();
        let summary = export(graph(), &request(ExportFormat::Linear, out.clone()), &progress)
            .await
            .unwrap();

        assert_eq!(summary.format, ExportFormat::Linear);
        assert_eq!(
            *progress.phases.borrow(),
            vec![
                "Loading content graph",
                "Aggregating composite chunks",
                "Writing export",
                "Validating export"
            ]
        );
        assert!(*progress.finished.borrow());

        let doc = std::fs::read_to_string(out.join("root.md")).unwrap();
        assert!(doc.contains("# Seam\nintro\nx body"));
        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn site_and_wiki_exports_validate() {
        for format in [ExportFormat::Site, ExportFormat::Wiki] {
            let out = temp_dir();
            let summary = export(graph(), &request(format, out.clone()), &SilentProgress)
                .await
                .unwrap();
            assert_eq!(summary.result.manifest.format, format.as_str());
            let _ = std::fs::remove_dir_all(&out);
        }
    }

    #[tokio::test]
    async fn invalid_options_fail_before_loading() {
        let mut req = request(ExportFormat::Site, temp_dir());
        req.catalog.max_depth = 0;
        let progress = RecordingProgress::default();
        assert!(export(graph(), &req, &progress).await.is_err());
        assert!(progress.phases.borrow().is_empty());
    }
}
