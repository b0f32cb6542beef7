mod commands;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, PoisonError};

use clap::Parser;
use folio_core::config::AppConfig;
use folio_core::error::FolioError;
use folio_core::loader::Loader;
use folio_core::models::Catalog;
use folio_core::storage::FileStore;
use folio_core::viewer::{Input, Viewer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use commands::Command;
use terminal::{RenderedMenu, TerminalSurface};

/// Remote-driven paged document viewer.
#[derive(Debug, Parser)]
#[command(name = "folio", version)]
struct Args {
    /// Config file; defaults to the per-user config location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TOML file listing `[[sections]]` and `[[subdivisions]]`.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Asset base: a directory or an http(s) URL.
    #[arg(long)]
    base: Option<String>,

    /// Override the document's page count.
    #[arg(long)]
    pages: Option<u32>,

    /// Where the last viewed page is kept.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "folio=info,folio_core=info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "folio failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), FolioError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(base) = args.base {
        config.assets.base = base;
    }
    if let Some(pages) = args.pages {
        config.document.total_pages = pages;
    }
    config.validate()?;

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };

    let loader = Loader::from_base(&config.assets.base)?;
    if let Loader::Fs(fs) = &loader {
        if !fs.root().is_dir() {
            tracing::warn!(
                base = %fs.root().display(),
                "Asset directory not found; pass --base with the folder holding the page images"
            );
        }
    }

    let store = FileStore::new(args.state.unwrap_or_else(AppConfig::state_path));
    let menu = RenderedMenu::default();
    let surface = TerminalSurface::new(Arc::clone(&menu));
    let viewer = Viewer::new(&config, loader, surface, store, catalog);

    tracing::info!(
        pages = config.document.total_pages,
        base = %config.assets.base,
        sections = viewer.navigator().catalog().sections.len(),
        "Starting viewer"
    );
    println!("{}", commands::HELP);

    let (tx, rx) = mpsc::channel(32);
    let reader = tokio::spawn(read_commands(tx, menu));
    viewer.run(rx).await;
    reader.abort();
    Ok(())
}

/// Forward stdin lines to the viewer until `quit` or end of input.
async fn read_commands(tx: mpsc::Sender<Input>, menu: RenderedMenu) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stdin");
                break;
            }
        };

        let inputs = match commands::parse(&line) {
            Command::Inputs(inputs) => inputs,
            Command::Hover(index) => {
                let entry = menu
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(index)
                    .cloned();
                match entry {
                    Some(entry) => vec![Input::Hover(entry)],
                    None => {
                        println!("no menu entry {index}");
                        continue;
                    }
                }
            }
            Command::Help => {
                println!("{}", commands::HELP);
                continue;
            }
            Command::Quit => break,
            Command::Unknown(line) => {
                println!("unknown command: {line} (try `help`)");
                continue;
            }
        };

        for input in inputs {
            if tx.send(input).await.is_err() {
                return;
            }
        }
    }
}
