#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line renderer for the CAPS municipality choropleth.
//!
//! Renders one state (`render`), every state (`render-all`), or prompts
//! for a state and year in a loop (`interactive`). Each render is written
//! as a JSON bundle holding the feature collection, color scale, legend,
//! styles, and initial viewport.
//!
//! Uses `indicatif-log-bridge` (via [`caps_map_cli_utils::init_logger`])
//! so log lines and progress bars never fight for the terminal.

mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use caps_map_cli_utils::IndicatifProgress;
use caps_map_geometry::file::GeoJsonFileRepository;
use caps_map_municipality_models::StateCode;
use caps_map_municipality_models::config::CapsMapConfig;
use caps_map_render::config::load_config;
use caps_map_render::progress::{NullProgress, ProgressCallback};
use caps_map_render::{RenderBundle, RenderSession, parse_state};
use caps_map_tables::file::CsvFileRepository;
use clap::{Parser, Subcommand};

/// A session reading from the configured data directory.
type FileSession = RenderSession<GeoJsonFileRepository, CsvFileRepository>;

#[derive(Parser)]
#[command(name = "caps_map", about = "CAPS encounters per 100k choropleth renderer")]
struct Cli {
    /// TOML config file; the built-in defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `[data] root` from the config
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a single state
    Render {
        /// Two-letter state code (e.g. SP)
        #[arg(long)]
        state: String,

        /// Service year; defaults to `[years] default`
        #[arg(long)]
        year: Option<i32>,

        /// Output file; the bundle is printed to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render every state into a directory, skipping states without geometry
    RenderAll {
        /// Service year; defaults to `[years] default`
        #[arg(long)]
        year: Option<i32>,

        /// Directory for the `{UF}_{YEAR}.json` bundles
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,

        /// Log each state instead of drawing a progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Prompt for state and year in a loop
    Interactive {
        /// Directory for the `{UF}_{YEAR}.json` bundles
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = caps_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(root) = cli.data_root {
        config.data.root = root;
    }
    log::debug!("Data root: {}", config.data.root.display());

    let mut session = open_session(config);

    match cli.command {
        Commands::Render { state, year, out } => {
            let state = parse_state(&state)?;
            let year = year.unwrap_or(session.config().years.default);
            let bundle = session.render(state, year)?;

            match out {
                Some(path) => {
                    write_bundle(&bundle, &path)?;
                    log::info!("Wrote {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&bundle)?),
            }
        }
        Commands::RenderAll {
            year,
            out_dir,
            no_progress,
        } => {
            let year = year.unwrap_or(session.config().years.default);
            std::fs::create_dir_all(&out_dir)?;

            let progress: Arc<dyn ProgressCallback> = if no_progress {
                Arc::new(NullProgress)
            } else {
                IndicatifProgress::steps_bar(&multi, "States")
            };
            let results = session.render_many(StateCode::ALL, year, progress.as_ref());

            let mut written = 0usize;
            for (state, result) in results {
                match result {
                    Ok(bundle) => {
                        write_bundle(&bundle, &bundle_path(&out_dir, state, year))?;
                        written += 1;
                    }
                    Err(e) if e.is_missing_geometry() => {
                        log::warn!("{state}: no geometry file; skipped");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            log::info!("Wrote {written} bundle(s) to {}", out_dir.display());
        }
        Commands::Interactive { out_dir } => {
            interactive::run(&mut session, &out_dir)?;
        }
    }

    Ok(())
}

fn open_session(config: CapsMapConfig) -> FileSession {
    let geometry = GeoJsonFileRepository::new(&config.data.root);
    let tables = CsvFileRepository::new(config.clone());
    RenderSession::new(geometry, tables, config)
}

fn bundle_path(out_dir: &Path, state: StateCode, year: i32) -> PathBuf {
    out_dir.join(format!("{state}_{year}.json"))
}

fn write_bundle(bundle: &RenderBundle, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_string(bundle)?)?;
    Ok(())
}
