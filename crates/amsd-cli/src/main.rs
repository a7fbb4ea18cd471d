//! AMSD CLI
//!
//! Command-line tool for converting the message-stick collection export into
//! normalized CSV tables and checking it against the media catalog.

use amsd_core::{
    convert, load_catalog, missing_files, plan_upload, read_rows, scan_images, ConvertOptions,
    Diagnostic, FieldKind, MediaIndex, RunConfig, Schema, UploadAction,
};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "amsd")]
#[command(about = "Message-stick collection export to CSV tables", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the export into one CSV file per table
    ToCsv {
        /// Tab-delimited collection export
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (default: raw)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Media catalog JSON used to resolve linked filenames
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Run config JSON; flags given here take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write the sticks_flat table
        #[arg(long)]
        flat: bool,

        /// Write the run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Normalize the export and print diagnostics without writing tables
    Check {
        /// Tab-delimited collection export
        #[arg(short, long)]
        input: PathBuf,

        /// Run config JSON providing similarity thresholds
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List linked files that have no uploaded counterpart
    Validate {
        /// Tab-delimited collection export
        #[arg(short, long)]
        input: PathBuf,

        /// Media catalog JSON
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Show what uploading an image directory would do
    PlanUpload {
        /// Directory containing the images
        #[arg(short, long)]
        dir: PathBuf,

        /// Media catalog JSON
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Print the field schema
    Schema,

    /// Create a run config template
    CreateConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,

        /// Tab-delimited collection export
        #[arg(short, long)]
        input: PathBuf,

        /// Media catalog JSON
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "amsd_core=debug,amsd=debug"
    } else {
        "amsd_core=info,amsd=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Commands) -> amsd_core::Result<()> {
    match command {
        Commands::ToCsv {
            input,
            output,
            catalog,
            config,
            flat,
            report,
        } => cmd_to_csv(input, output, catalog, config, flat, report),
        Commands::Check { input, config } => cmd_check(&input, config.as_deref()),
        Commands::Validate { input, catalog } => cmd_validate(&input, &catalog),
        Commands::PlanUpload { dir, catalog } => cmd_plan_upload(&dir, &catalog),
        Commands::Schema => cmd_schema(),
        Commands::CreateConfig {
            output,
            input,
            catalog,
        } => cmd_create_config(&output, input, catalog),
    }
}

fn cmd_to_csv(
    input: PathBuf,
    output: Option<PathBuf>,
    catalog: Option<PathBuf>,
    config_path: Option<PathBuf>,
    flat: bool,
    report_path: Option<PathBuf>,
) -> amsd_core::Result<()> {
    let mut config = match config_path {
        Some(path) => {
            let mut config = RunConfig::load(&path)?;
            config.input = input;
            config
        }
        None => RunConfig::new(input),
    };
    if let Some(output) = output {
        config.output_dir = output;
    }
    if catalog.is_some() {
        config.catalog = catalog;
    }
    config.flat |= flat;
    tracing::debug!("run config: {:?}", config);

    let report = amsd_core::run(&config)?;

    println!("Converted {} records from {}", report.records, report.input.display());
    println!();
    println!("Tables ({}):", report.tables.len());
    for table in &report.tables {
        println!("  {:<24} {:>6} rows", table.name, table.rows);
    }
    println!();
    println!(
        "{} files written to {}",
        report.files_written.len(),
        report.output_dir.display()
    );
    print_diagnostic_summary(&report.diagnostics);

    if let Some(path) = report_path {
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn cmd_check(input: &Path, config_path: Option<&Path>) -> amsd_core::Result<()> {
    let thresholds = match config_path {
        Some(path) => RunConfig::load(path)?.thresholds,
        None => Default::default(),
    };

    let schema = Schema::standard()?;
    let rows = read_rows(input)?;
    let options = ConvertOptions {
        thresholds,
        flat: false,
    };
    let conversion = convert(&schema, &rows, None, &options)?;

    println!("Checked {} records from {}", conversion.record_count(), input.display());
    if conversion.diagnostics.is_empty() {
        println!("No findings.");
        return Ok(());
    }

    println!();
    for diagnostic in &conversion.diagnostics {
        println!("  {}", diagnostic);
    }
    print_diagnostic_summary(&conversion.diagnostics);

    Ok(())
}

fn cmd_validate(input: &Path, catalog: &Path) -> amsd_core::Result<()> {
    let schema = Schema::standard()?;
    let column = schema
        .position("linked_filenames")
        .ok_or_else(|| amsd_core::Error::InvalidSchema("no linked_filenames column".to_string()))?;

    let rows = read_rows(input)?;
    let objects = load_catalog(catalog)?;
    let cells = rows
        .iter()
        .skip(1)
        .filter_map(|row| row.get(column))
        .map(String::as_str);
    let missing = missing_files(cells, &objects);

    if missing.is_empty() {
        println!("All linked files are uploaded.");
        return Ok(());
    }

    println!("Missing files ({}):", missing.len());
    for (name, count) in &missing {
        println!("  {:>4}  {}", count, name);
    }

    Ok(())
}

fn cmd_plan_upload(dir: &Path, catalog: &Path) -> amsd_core::Result<()> {
    let images = scan_images(dir)?;
    tracing::debug!("found {} files in {}", images.len(), dir.display());
    let index = MediaIndex::new(load_catalog(catalog)?);
    let plan = plan_upload(&images, &index);

    let (mut created, mut replaced, mut skipped) = (0, 0, 0);
    for action in &plan {
        match action {
            UploadAction::Create { path, name } => {
                created += 1;
                println!("  create   {} as '{}'", path.display(), name);
            }
            UploadAction::Replace { path, name, oid } => {
                replaced += 1;
                println!("  replace  {} as '{}' ({})", path.display(), name, oid);
            }
            UploadAction::Skip { path } => {
                skipped += 1;
                println!("  skip     {} (unsupported type)", path.display());
            }
        }
    }

    println!();
    println!(
        "{} files: {} new, {} replaced, {} skipped",
        plan.len(),
        created,
        replaced,
        skipped
    );

    Ok(())
}

fn cmd_schema() -> amsd_core::Result<()> {
    let schema = Schema::standard()?;

    println!("Fields ({}):", schema.len());
    println!();
    for (idx, field) in schema.fields().iter().enumerate() {
        let kind = match &field.kind {
            FieldKind::Text => "text".to_string(),
            FieldKind::Coordinate => "coordinate".to_string(),
            FieldKind::Lookup { category, split } => match split {
                Some(re) => format!("lookup:{} split /{}/", category, re.as_str()),
                None => format!("lookup:{}", category),
            },
            FieldKind::LinguisticArea { .. } => "ling_area".to_string(),
        };

        let mut flags = Vec::new();
        if field.case_fold {
            flags.push("lowercase");
        }
        if field.table_exclusive {
            flags.push("exclusive");
        }
        if field.unique {
            flags.push("unique");
        }

        println!(
            "{:>3}  {:<22} {:<42} {}  {}",
            idx + 1,
            field.name,
            format!("\"{}\"", field.header),
            kind,
            flags.join(",")
        );
    }

    Ok(())
}

fn cmd_create_config(
    output: &Path,
    input: PathBuf,
    catalog: Option<PathBuf>,
) -> amsd_core::Result<()> {
    let mut config = RunConfig::new(input);
    config.catalog = catalog;
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!("Input: {}", config.input.display());
    println!("Output directory: {}", config.output_dir.display());
    println!();
    println!("Edit the file to adjust thresholds, then run:");
    println!(
        "  amsd to-csv --input {} --config {}",
        config.input.display(),
        output.display()
    );

    Ok(())
}

fn print_diagnostic_summary(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for diagnostic in diagnostics {
        *counts.entry(diagnostic.kind()).or_insert(0) += 1;
    }

    println!();
    println!("Diagnostics ({}):", diagnostics.len());
    for (kind, count) in counts {
        println!("  {:<24} {:>6}", kind, count);
    }
}
