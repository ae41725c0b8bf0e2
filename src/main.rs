// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use workforce_insights::{
    anonymize_file, logging, Analysis, DashboardConfig, InsightReport, CONFIG_ENV_VAR,
};

#[derive(Parser)]
#[command(name = "workforce-insights", version, about = "Year-over-year HR cohort analytics")]
struct Cli {
    /// TOML config (column names, year labels, top-N)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct YearFiles {
    /// Prior-year CSV export
    #[arg(long)]
    prior: PathBuf,

    /// Current-year CSV export
    #[arg(long)]
    current: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Print the insight report
    Report {
        #[command(flatten)]
        files: YearFiles,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the merged year-over-year table
    Merge {
        #[command(flatten)]
        files: YearFiles,

        #[arg(long)]
        out: PathBuf,
    },
    /// Replace PII columns with pseudonyms
    Anonymize { input: PathBuf, output: PathBuf },
    /// Interactive terminal dashboard
    Tui {
        #[command(flatten)]
        files: YearFiles,
    },
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let config = DashboardConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Report { files, json } => run_report(&files, &config, json),
        Command::Merge { files, out } => run_merge(&files, &config, &out),
        Command::Anonymize { input, output } => run_anonymize(&input, &output, &config),
        Command::Tui { files } => run_ui_mode(&files, &config),
    }
}

fn run_report(files: &YearFiles, config: &DashboardConfig, json: bool) -> Result<()> {
    let analysis = Analysis::from_paths(&files.prior, &files.current, config)?;
    let report = InsightReport::build(&analysis, config);

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        println!("📊 HR Strategic Insights");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        print!("{}", report.to_text());
    }

    Ok(())
}

fn run_merge(files: &YearFiles, config: &DashboardConfig, out: &Path) -> Result<()> {
    println!("🔗 Merging {} → {}", config.prior_label, config.current_label);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let analysis = Analysis::from_paths(&files.prior, &files.current, config)?;
    println!("✓ {} prior-year records", analysis.prior.len());
    println!("✓ {} current-year records", analysis.current.len());

    let table = analysis.merged_table(config);
    table.write_path(out)?;

    println!(
        "\n✅ Wrote {} rows to {} ({} retained, {} left)",
        table.len(),
        out.display(),
        analysis.merged.retained_count(),
        analysis.merged.left_count()
    );

    Ok(())
}

fn run_anonymize(input: &Path, output: &Path, config: &DashboardConfig) -> Result<()> {
    let summary = anonymize_file(input, output, &config.columns)?;

    println!("✓ Anonymized {} -> {}", input.display(), output.display());
    println!("  Rows: {}, Columns: {}", summary.rows, summary.columns);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(files: &YearFiles, config: &DashboardConfig) -> Result<()> {
    println!("🖥️  Loading Workforce Insights dashboard...\n");

    let analysis = Analysis::from_paths(&files.prior, &files.current, config)?;
    let report = InsightReport::build(&analysis, config);

    let mut app = ui::App::new(report);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_files: &YearFiles, _config: &DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin insights-server --features server");
    std::process::exit(1);
}
