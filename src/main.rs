use anyhow::Context;
use clap::{Parser, Subcommand};
use perfsheet_viz::config::ReportOptions;
use perfsheet_viz::render::{self, Report};
use perfsheet_viz::{buffers, export, model, sheet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "perfsheet-viz")]
#[command(about = "Performance graphs for device operation profiles", long_about = None)]
struct Cli {
    /// Log filter (e.g. `debug`, `perfsheet_viz=trace`). RUST_LOG wins if set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the performance graphs report for one or more sheets.
    Report {
        /// Performance sheet (.csv or .xlsx). Repeat with --multi-file.
        #[arg(long = "input", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(short = 'o', long)]
        out: PathBuf,

        /// JSON file with report options.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        no_averages: bool,

        #[arg(long)]
        no_pie: bool,

        /// Allow several input sheets, one tab each.
        #[arg(long)]
        multi_file: bool,

        /// Also write graph_data_* exports next to the report and link them.
        #[arg(long = "export")]
        with_exports: bool,
    },

    /// Write graph_data_<source>.csv and .xlsx for one sheet.
    Export {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render L1 buffer usage from a profiler SQLite database.
    Buffers {
        #[arg(long)]
        db: PathBuf,

        #[arg(short = 'o', long)]
        out: PathBuf,

        /// One tab per operation name with address +/- size plots.
        #[arg(long)]
        by_name: bool,
    },
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_options(config: Option<&Path>) -> Result<ReportOptions> {
    match config {
        Some(path) => ReportOptions::load(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(ReportOptions::default()),
    }
}

fn write_report(report: &Report, out: &Path) -> Result<()> {
    let html = render::render_html_report(report)?;
    fs::write(out, html).with_context(|| format!("write report {}", out.display()))?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.cmd {
        Commands::Report {
            inputs,
            out,
            config,
            no_averages,
            no_pie,
            multi_file,
            with_exports,
        } => {
            // 1) Options: file first, flags on top.
            let mut options = load_options(config.as_deref())?;
            if no_averages {
                options.show_averages = false;
            }
            if no_pie {
                options.show_pie = false;
            }
            if multi_file {
                options.multi_file = true;
            }
            options.check_inputs(inputs.len())?;

            let out_dir = out
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));

            // 2) Load, compute, and lay out each sheet.
            let sources: Vec<String> = inputs
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let labels = export::source_labels(&sources);
            let mut tabs = Vec::with_capacity(inputs.len());
            for (input, label) in inputs.iter().zip(&labels) {
                let table = sheet::load_path(input)
                    .with_context(|| format!("load sheet {}", input.display()))?;
                let result = model::compute(&table, &options)
                    .with_context(|| format!("analyse sheet {}", input.display()))?;

                let exports = if with_exports {
                    export::export_result(&result, label, &options, out_dir)?
                } else {
                    None
                };
                tabs.push(render::sheet_tab(label, &result, &options, exports.as_ref()));
            }

            // 3) Render HTML.
            let report = Report {
                title: "Performance Graphs".to_string(),
                subtitle: "Create graphs for model performance analysis.".to_string(),
                tabs,
            };
            write_report(&report, &out)?;
        }

        Commands::Export {
            input,
            out_dir,
            config,
        } => {
            let options = load_options(config.as_deref())?;
            let table = sheet::load_path(&input)
                .with_context(|| format!("load sheet {}", input.display()))?;
            let result = model::compute(&table, &options)
                .with_context(|| format!("analyse sheet {}", input.display()))?;
            let label = export::source_stem(&result.source);
            if let Some(paths) = export::export_result(&result, label, &options, &out_dir)? {
                println!("Wrote {}", paths.csv.display());
                println!("Wrote {}", paths.xlsx.display());
            }
        }

        Commands::Buffers { db, out, by_name } => {
            let records = buffers::load(&db)
                .with_context(|| format!("read buffers from {}", db.display()))?;
            info!(buffers = records.len(), db = %db.display(), "loaded buffer records");
            let source = db
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| db.display().to_string());
            let report = buffers::buffer_report(&source, &records, by_name);
            write_report(&report, &out)?;
        }
    }

    Ok(())
}
