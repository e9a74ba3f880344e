//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use adit_core::assembler::NAV_FILE;
use adit_core::pipeline::{self, ExportFormat, ExportRequest, ExportSummary, ProgressReporter};
use adit_core::{Catalog, nav};
use adit_shared::{
    AppConfig, CatalogOptions, TocOptions, init_config, load_config, render_config,
};
use adit_storage::{GraphImport, GraphStore};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Adit: flatten a content graph into ordered, normalized documents.
#[derive(Parser)]
#[command(
    name = "adit",
    version,
    about = "Flatten a content graph into sites, wiki bundles, and linear documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Graph location and catalog filtering, shared by every read command.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct GraphArgs {
    /// Path to the libSQL graph database.
    #[arg(long, env = "ADIT_DB")]
    pub db: Option<PathBuf>,

    /// Key of the root node.
    #[arg(long)]
    pub root: Option<String>,

    /// Maximum traversal depth from the root.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Drop chunks shorter than this once heading markup is stripped.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Keep only nodes matching `attribute=value` (repeatable).
    #[arg(long, value_name = "ATTR=VALUE")]
    pub include: Vec<String>,

    /// Drop nodes matching `attribute=value` (repeatable).
    #[arg(long, value_name = "ATTR=VALUE")]
    pub exclude: Vec<String>,
}

/// Flags common to the export commands.
#[derive(Args, Debug, Clone)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Output directory (defaults to `[defaults].output_dir`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Skip composite aggregation.
    #[arg(long)]
    pub no_populate: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Write one markdown page per node plus nav.json.
    Site {
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Write a wiki.json bundle of paged documents.
    Wiki {
        #[command(flatten)]
        export: ExportArgs,

        /// Target space identifier.
        #[arg(long)]
        space: Option<String>,

        /// Page under which top-level documents are created.
        #[arg(long)]
        parent_page: Option<String>,
    },

    /// Write a single markdown document with a table of contents.
    Linear {
        #[command(flatten)]
        export: ExportArgs,

        /// Deepest heading listed in the TOC (0 disables it).
        #[arg(long)]
        toc_depth: Option<usize>,

        /// Leave level-1 headings out of the TOC.
        #[arg(long)]
        no_top_level: bool,
    },

    /// Write the navigation map (nav.json) only.
    Map {
        #[command(flatten)]
        graph: GraphArgs,

        /// Output directory (defaults to `[defaults].output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print every breadcrumb trail from the root to a node.
    Breadcrumbs {
        /// Key of the target node.
        key: String,

        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Print a node's inbound and outbound neighbours.
    Neighbors {
        /// Key of the node.
        key: String,

        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Load nodes and edges from a JSON document into the graph database.
    Import {
        /// JSON file with `nodes` and `edges` arrays.
        file: PathBuf,

        /// Path to the libSQL graph database.
        #[arg(long, env = "ADIT_DB")]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "adit=info",
        1 => "adit=debug",
        _ => "adit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Site { export } => cmd_export(ExportFormat::Site, &export, |_| {}).await,
        Command::Wiki {
            export,
            space,
            parent_page,
        } => {
            cmd_export(ExportFormat::Wiki, &export, |config| {
                if let Some(space) = space {
                    config.wiki.space = space;
                }
                if parent_page.is_some() {
                    config.wiki.parent_page = parent_page;
                }
            })
            .await
        }
        Command::Linear {
            export,
            toc_depth,
            no_top_level,
        } => {
            cmd_export(ExportFormat::Linear, &export, |config| {
                if let Some(depth) = toc_depth {
                    config.toc.max_depth = depth;
                }
                if no_top_level {
                    config.toc.top_level = false;
                }
            })
            .await
        }
        Command::Map { graph, out } => cmd_map(&graph, out.as_deref()).await,
        Command::Breadcrumbs { key, graph } => cmd_breadcrumbs(&key, &graph).await,
        Command::Neighbors { key, graph } => cmd_neighbors(&key, &graph).await,
        Command::Import { file, db } => cmd_import(&file, db.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Option resolution
// ---------------------------------------------------------------------------

/// Overlay command-line flags on the loaded config.
fn apply_graph_args(config: &mut AppConfig, args: &GraphArgs) {
    if let Some(db) = &args.db {
        config.defaults.db_path = db.to_string_lossy().into_owned();
    }
    if let Some(root) = &args.root {
        config.defaults.root = root.clone();
    }
    if let Some(depth) = args.max_depth {
        config.defaults.max_depth = depth;
    }
    if let Some(min) = args.min_length {
        config.catalog.min_content_length = min;
    }
    if !args.include.is_empty() {
        config.catalog.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.catalog.exclude = args.exclude.clone();
    }
}

/// Load the config file, overlay flags, and validate the catalog options
/// before the database is touched.
fn resolve(args: &GraphArgs) -> Result<(AppConfig, CatalogOptions)> {
    let mut config = load_config()?;
    apply_graph_args(&mut config, args);
    let options = CatalogOptions::try_from(&config)?;
    Ok((config, options))
}

fn output_dir(config: &AppConfig, out: Option<&Path>) -> PathBuf {
    out.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir))
}

async fn open_store(config: &AppConfig) -> Result<GraphStore> {
    let path = PathBuf::from(&config.defaults.db_path);
    Ok(GraphStore::open_readonly(&path).await?)
}

async fn open_catalog(args: &GraphArgs) -> Result<(AppConfig, Catalog<GraphStore>)> {
    let (config, options) = resolve(args)?;
    let store = open_store(&config).await?;
    let mut catalog = Catalog::new(store, options)?;
    catalog.init().await?;
    Ok((config, catalog))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_export(
    format: ExportFormat,
    args: &ExportArgs,
    overrides: impl FnOnce(&mut AppConfig),
) -> Result<()> {
    let (mut config, options) = resolve(&args.graph)?;
    overrides(&mut config);

    let request = ExportRequest {
        format,
        catalog: options,
        output_dir: output_dir(&config, args.out.as_deref()),
        populate: !args.no_populate,
        toc: TocOptions::from(&config.toc),
        wiki: config.wiki.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        %format,
        root = %request.catalog.root,
        out = %request.output_dir.display(),
        "exporting content graph"
    );

    let store = open_store(&config).await?;
    let reporter = CliProgress::new();
    let summary = pipeline::export(store, &request, &reporter).await?;

    println!();
    println!("  Export complete!");
    println!("  Format: {}", summary.format);
    println!("  ID:     {}", summary.result.manifest.id);
    println!("  Pages:  {}", summary.result.page_count);
    println!("  Path:   {}", summary.result.path.display());
    println!("  Time:   {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_map(args: &GraphArgs, out: Option<&Path>) -> Result<()> {
    let (config, catalog) = open_catalog(args).await?;
    let tree = catalog.tree().await?;

    let dir = output_dir(&config, out);
    std::fs::create_dir_all(&dir).map_err(|e| eyre!("cannot create {}: {e}", dir.display()))?;
    let path = dir.join(NAV_FILE);
    let map = nav::write_nav(&tree, &path)?;

    println!("Wrote {} entries to {}", map.count(), path.display());
    Ok(())
}

async fn cmd_breadcrumbs(key: &str, args: &GraphArgs) -> Result<()> {
    let (_, catalog) = open_catalog(args).await?;
    let trails = catalog.breadcrumbs(key).await?;

    if trails.is_empty() {
        println!("no breadcrumbs for '{key}'");
        return Ok(());
    }
    for trail in trails {
        let labels: Vec<&str> = trail.iter().map(|b| b.label.as_str()).collect();
        println!("{}", labels.join(" / "));
    }
    Ok(())
}

async fn cmd_neighbors(key: &str, args: &GraphArgs) -> Result<()> {
    let (_, catalog) = open_catalog(args).await?;
    let adjacency = catalog.adjacency(key).await?;

    for node in &adjacency.outbound {
        println!("-> {} ({})", node.key, node.label);
    }
    for node in &adjacency.inbound {
        println!("<- {} ({})", node.key, node.label);
    }
    Ok(())
}

async fn cmd_import(file: &Path, db: Option<&Path>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(db) = db {
        config.defaults.db_path = db.to_string_lossy().into_owned();
    }

    let raw = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let graph: GraphImport = serde_json::from_str(&raw)
        .map_err(|e| eyre!("invalid graph document '{}': {e}", file.display()))?;

    let store = GraphStore::open(Path::new(&config.defaults.db_path)).await?;
    store.import(&graph).await?;

    println!(
        "Imported {} nodes and {} edges into {} ({} nodes total)",
        graph.nodes.len(),
        graph.edges.len(),
        config.defaults.db_path,
        store.node_count().await?
    );
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    println!("{}", render_config(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _summary: &ExportSummary) {
        self.spinner.finish_and_clear();
    }
}
