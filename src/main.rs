//! Twin Tower survey dashboard - command line front end.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tower_survey::charts::ChartRenderer;
use tower_survey::data::{DataLoader, DataProcessor, FilterSelection, Selector, PREVIEW_ROWS};
use tower_survey::{DashboardConfig, DashboardReport, Session};

#[derive(Parser, Debug)]
#[command(name = "tower-survey")]
#[command(about = "Analyze the Twin Tower student satisfaction survey", long_about = None)]
struct Args {
    /// Survey CSV file, or '-' to read it from stdin
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Faculty filter ('all' for no constraint)
    #[arg(long, default_value = "all")]
    fakultas: String,

    /// Study program filter ('all' for no constraint)
    #[arg(long, default_value = "all")]
    prodi: String,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Render chart PNGs into this directory
    #[arg(long, value_name = "DIR")]
    charts: Option<PathBuf>,

    /// Write the filtered rows to this CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Print the selectable faculties and programs, then exit
    #[arg(long)]
    list_options: bool,

    /// Print the first filtered rows after the report
    #[arg(long)]
    preview: bool,
}

fn load_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(data) = &args.data {
        config.data.path = data.clone();
    }
    Ok(config)
}

fn open_session(config: &DashboardConfig) -> Result<Session> {
    let loader = DataLoader::new(config.data.csv_options());
    let path = &config.data.path;

    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read survey from stdin")?;
        return Session::from_upload(&loader, &bytes).context("Failed to load uploaded survey");
    }

    Session::open(&loader, path).with_context(|| {
        format!(
            "Failed to load survey {} (pass --data or place the file in the working directory)",
            path.display()
        )
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let mut session = open_session(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.list_options {
        writeln!(out, "Fakultas: {}", session.faculty_options().join(", "))?;
        writeln!(out, "Prodi:    {}", session.program_options().join(", "))?;
        return Ok(());
    }

    session.set_selection(FilterSelection::new(
        Selector::parse(&args.fakultas),
        Selector::parse(&args.prodi),
    ));

    let report =
        DashboardReport::build(&session, &config.charts).context("Failed to build report")?;
    if report.fell_back_to_unfiltered {
        eprintln!("Warning: no rows match the selection; showing all data.");
    }

    if args.json {
        serde_json::to_writer_pretty(&mut out, &report).context("Failed to write JSON")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", report)?;
    }

    let view = session.view().context("Failed to filter survey")?;
    if args.preview {
        writeln!(out, "\n{}", DataProcessor::preview(view.frame(), PREVIEW_ROWS))?;
    }
    out.flush().context("Failed to flush stdout")?;

    if let Some(path) = &args.export {
        DataProcessor::export_csv(view.frame(), path)
            .with_context(|| format!("Failed to export {}", path.display()))?;
    }

    if let Some(dir) = &args.charts {
        let written = ChartRenderer::from_config(&config.charts).render_all(&report, dir)?;
        log::info!("Rendered {} charts into {}", written.len(), dir.display());
    }

    Ok(())
}
