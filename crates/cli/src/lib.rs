pub mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::SplitterConfig;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_engine::{LopdfEngine, PdfEngine, ThumbnailSize};
use serde::Serialize;
use split_core::{
    display_size, format_file_size, parse_page_list, Partition, SplitError, SplitProgress,
    SplitSession, SplitStrategy,
};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pdf-splitter")]
#[command(about = "Split a PDF into fragments by page range, page selection or size")]
pub struct Cli {
    /// JSON config file. Defaults to config.json in the platform config directory.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render a preview PNG for a page.
    RenderThumb {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the page groups a split would produce, without building anything.
    Plan {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Split a PDF and write the fragments (or a ZIP bundle) to disk.
    Split {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        strategy: StrategyArgs,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Write a single ZIP archive instead of one file per fragment.
        #[arg(long)]
        bundle: bool,
        #[arg(long, requires = "bundle")]
        bundle_name: Option<String>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    /// Consecutive groups of `--pages-per-group` pages.
    Range,
    /// One fragment holding the selected pages in ascending order.
    Pages,
    /// Greedy groups under `--max-size-mb`.
    Size,
}

#[derive(Debug, Args)]
struct StrategyArgs {
    #[arg(long, value_enum, default_value_t = StrategyKind::Range)]
    by: StrategyKind,
    #[arg(long)]
    pages_per_group: Option<u32>,
    /// Pages to select for `--by pages`, e.g. "1,3,5-7".
    #[arg(long, value_name = "LIST", conflicts_with = "all_pages")]
    pages: Option<String>,
    #[arg(long)]
    all_pages: bool,
    #[arg(long)]
    max_size_mb: Option<f64>,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    byte_len: u64,
    size: String,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    strategy: &'static str,
    page_count: u32,
    groups: Vec<GroupOutput>,
}

#[derive(Debug, Serialize)]
struct GroupOutput {
    ordinal: usize,
    name: String,
    pages: Vec<u32>,
    range_start: u32,
    range_end: u32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = SplitterConfig::load(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Info { file } => run_info(&file, &config),
        Commands::RenderThumb { file, page, width, height, output } => {
            let target = ThumbnailSize {
                width_px: width.unwrap_or(config.thumbnail_width),
                height_px: height.unwrap_or(config.thumbnail_height),
            };
            run_render_thumb(&file, page, target, output.as_deref(), &config)
        }
        Commands::Plan { file, strategy } => run_plan(&file, &strategy, &config),
        Commands::Split { file, strategy, output_dir, bundle, bundle_name } => {
            let bundle_name =
                bundle.then(|| bundle_name.unwrap_or_else(|| config.bundle_name.clone()));
            run_split(&file, &strategy, &output_dir, bundle_name.as_deref(), &config)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path, config: &SplitterConfig) -> Result<()> {
    let session = open_session(file, config)?;
    let (handle, metadata) = loaded(&session)?;

    let first_page_size_pt = if metadata.page_count > 0 {
        let size = session.engine().page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: metadata.page_count,
        byte_len: metadata.byte_len,
        size: format_file_size(metadata.byte_len),
        first_page_size_pt,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_render_thumb(
    file: &Path,
    page: u32,
    target: ThumbnailSize,
    output: Option<&Path>,
    config: &SplitterConfig,
) -> Result<()> {
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let session = open_session(file, config)?;
    let image = session
        .render_preview(page, target)
        .map_err(user_facing)
        .context("failed to render thumbnail")?;

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_thumbnail_output(file, page));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_plan(file: &Path, args: &StrategyArgs, config: &SplitterConfig) -> Result<()> {
    let mut session = open_session(file, config)?;
    let strategy = prepare_strategy(&mut session, args, config)?;
    let (_, metadata) = loaded(&session)?;

    let partition: Partition = session.plan(&strategy).map_err(user_facing)?;
    let groups = partition
        .iter()
        .enumerate()
        .map(|(index, group)| GroupOutput {
            ordinal: index + 1,
            name: split_core::fragment_name(index + 1, group.pages()),
            pages: group.pages().to_vec(),
            range_start: group.range_start(),
            range_end: group.range_end(),
        })
        .collect();

    let payload = PlanOutput { strategy: strategy.name(), page_count: metadata.page_count, groups };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_split(
    file: &Path,
    args: &StrategyArgs,
    output_dir: &Path,
    bundle_name: Option<&str>,
    config: &SplitterConfig,
) -> Result<()> {
    let mut session = open_session(file, config)?;
    let strategy = prepare_strategy(&mut session, args, config)?;

    let bar = progress_bar();
    let result = session.split_with_progress(&strategy, &mut |event: SplitProgress| match event {
        SplitProgress::Measuring { page, page_count } => {
            bar.set_length(u64::from(page_count));
            bar.set_position(u64::from(page));
            bar.set_message("measuring pages");
        }
        SplitProgress::Building { ordinal, total } => {
            bar.set_length(total as u64);
            bar.set_position(ordinal as u64);
            bar.set_message("building fragments");
        }
    });
    bar.finish_and_clear();
    let fragments = result.map_err(user_facing)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    for fragment in fragments {
        let pages = fragment.pages().iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
        println!("{}\t{}\t{}", fragment.name(), pages, display_size(fragment.byte_size()));
    }

    match bundle_name {
        Some(name) => {
            let archive = session.bundle().map_err(user_facing)?;
            let path = output_dir.join(name);
            fs::write(&path, archive)
                .with_context(|| format!("failed to write bundle to {}", path.display()))?;
            println!("{}", path.display());
        }
        None => {
            for exported in session.export_all() {
                let path = output_dir.join(exported.name);
                fs::write(&path, exported.bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        }
    }

    tracing::info!(fragments = session.fragments().len(), "split finished");
    Ok(())
}

/// Loads `file` into a fresh session backed by the configured engine.
fn open_session(file: &Path, config: &SplitterConfig) -> Result<SplitSession<LopdfEngine>> {
    ensure_pdf_exists(file)?;

    let mut session = SplitSession::new(LopdfEngine::with_options(config.engine_options()));
    session.load(file).map_err(user_facing).context("failed to open PDF")?;
    Ok(session)
}

/// Turns the strategy flags into a validated strategy, filling in config defaults
/// and the page selection for `--by pages`.
fn prepare_strategy(
    session: &mut SplitSession<LopdfEngine>,
    args: &StrategyArgs,
    config: &SplitterConfig,
) -> Result<SplitStrategy> {
    let strategy = match args.by {
        StrategyKind::Range => {
            SplitStrategy::range(args.pages_per_group.unwrap_or(config.default_pages_per_group))
        }
        StrategyKind::Pages => {
            if args.all_pages {
                session.select_all().map_err(user_facing)?;
            } else if let Some(list) = &args.pages {
                let (_, metadata) = loaded(session)?;
                let pages = parse_page_list(list, metadata.page_count).map_err(user_facing)?;
                session.select_pages(pages).map_err(user_facing)?;
            }
            Ok(SplitStrategy::SpecificPages)
        }
        StrategyKind::Size => {
            SplitStrategy::size_bounded_mb(args.max_size_mb.unwrap_or(config.default_max_size_mb))
        }
    };

    strategy.map_err(user_facing)
}

fn loaded(
    session: &SplitSession<LopdfEngine>,
) -> Result<(pdf_engine::DocumentHandle, pdf_engine::DocumentMetadata)> {
    match (session.document_handle(), session.metadata()) {
        (Some(handle), Some(metadata)) => Ok((handle, metadata)),
        _ => Err(user_facing(SplitError::NoDocumentLoaded)),
    }
}

/// Puts the user-facing sentence in front of the technical error chain.
fn user_facing(err: SplitError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_thumbnail_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("thumbnail");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}
