//! docfill CLI - fill Word templates from Excel rows
//!
//! Lists the records of a spreadsheet, lets the operator pick some of them and
//! writes one filled copy of a `.docx` template per record.

mod logger;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use docfill::{
    Config, ConsoleOperator, Dataset, FillMode, GenerationReport, Generator, ListingEntry,
    PresetOperator, Record, Template,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Fill Word templates from Excel rows
#[derive(Parser)]
#[command(
    name = "docfill",
    version,
    about = "Fill Word templates from Excel rows",
    long_about = "docfill - Document generation from spreadsheet records.\n\n\
                  Reads records from an .xlsx sheet and writes one filled copy of a .docx \
                  template per selected record."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads the configuration.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Configuration file (default: ./docfill.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workbook path
    #[arg(long)]
    data: Option<PathBuf>,

    /// Sheet name
    #[arg(long)]
    sheet: Option<String>,

    /// Template path
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documents for selected records
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Comma-separated record indices; makes the run non-interactive
        #[arg(long)]
        select: Option<String>,

        /// Fill mode for non-interactive runs
        #[arg(long, default_value = "individual")]
        mode: ModeArg,

        /// Field value for non-interactive runs
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// Wait for Enter before exiting
        #[arg(long)]
        pause: bool,
    },

    /// List the records available for selection
    List {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the placeholders found in the template
    Inspect {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(default_value = docfill::config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

/// Fill mode
#[derive(Clone, ValueEnum)]
enum ModeArg {
    /// Field values asked for each record
    Individual,
    /// One set of field values for every record
    Group,
}

impl From<ModeArg> for FillMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Individual => FillMode::Individual,
            ModeArg::Group => FillMode::Group,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let pause = matches!(cli.command, Commands::Run { pause: true, .. });
    let result = run(cli);

    if let Err(e) = &result {
        eprintln!("\n{} {}", "[ERRO]".red().bold(), e);
    }
    if pause {
        wait_for_enter();
    }
    if result.is_err() {
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            config,
            select,
            mode,
            fields,
            pause: _,
        } => {
            let config = load_config(&config)?;
            println!(
                "{}",
                format!(
                    "--- Iniciando Motor de Geração de Documentos: {} ---",
                    config.output.prefix
                )
                .cyan()
                .bold()
            );

            let dataset = load_dataset(&config)?;
            let generator = Generator::new(&config, &dataset);

            let report = match select {
                Some(selection) => {
                    let mut operator = PresetOperator::new(selection).with_mode(mode.into());
                    for pair in &fields {
                        let (name, value) = PresetOperator::parse_field(pair)?;
                        operator = operator.with_field(name, value);
                    }
                    generator.run(&mut operator)?
                }
                None => {
                    if !fields.is_empty() {
                        tracing::warn!("--field is only used together with --select");
                    }
                    generator.run(&mut ConsoleOperator::stdio())?
                }
            };

            print_summary(&report);
            if let Some(error) = report.aborted {
                return Err(error.into());
            }
        }

        Commands::List { config, json } => {
            let config = load_config(&config)?;
            let dataset = load_dataset(&config)?;
            let listing = dataset.listing(&config.data.id_column)?;

            if json {
                println!("{}", listing_json(&dataset, &listing)?);
            } else {
                println!("{}", "Available records".cyan().bold());
                println!("{}", "─".repeat(40));
                for entry in &listing {
                    println!("{}: {}", entry.index.to_string().bold(), entry.label);
                }
            }
        }

        Commands::Inspect { config } => {
            let config = load_config(&config)?;
            let template = Template::open(&config.template.path)?;
            let found = template.placeholders();

            println!("{}", "Template placeholders".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                config.template.path.display()
            );
            for token in &found {
                let known = config.placeholders().contains(token);
                if known {
                    println!("  {} {}", "✓".green().bold(), token);
                } else {
                    println!("  {} {} (not configured)", "?".yellow().bold(), token);
                }
            }

            let missing: Vec<String> = config
                .placeholders()
                .into_iter()
                .filter(|token| !found.contains(token))
                .collect();
            if !missing.is_empty() {
                println!("\n{}", "Configured but not in the template".yellow().bold());
                println!("{}", "─".repeat(40));
                for token in &missing {
                    println!("  {} {}", "!".yellow().bold(), token);
                }
            }
        }

        Commands::Init { path } => {
            if path.exists() {
                return Err(format!("{} already exists", path.display()).into());
            }
            fs::write(&path, Config::default().to_toml()?)?;
            println!(
                "{} Wrote default configuration: {}",
                "✓".green().bold(),
                path.display()
            );
        }
    }

    Ok(())
}

/// Configuration from `--config`, `./docfill.toml` or the built-in defaults,
/// with command-line overrides applied.
fn load_config(args: &ConfigArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let default_path = Path::new(docfill::config::DEFAULT_CONFIG_FILE);
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None if default_path.exists() => Config::load(default_path)?,
        None => Config::default(),
    };

    if let Some(data) = &args.data {
        config = config.with_data_path(data);
    }
    if let Some(sheet) = &args.sheet {
        config = config.with_sheet(sheet);
    }
    if let Some(template) = &args.template {
        config = config.with_template(template);
    }
    if let Some(output) = &args.output {
        config = config.with_output_dir(output);
    }

    config.validate()?;
    Ok(config)
}

fn load_dataset(config: &Config) -> Result<Dataset, Box<dyn std::error::Error>> {
    let pb = create_spinner("Reading spreadsheet...");
    let result = Dataset::load(&config.data.path, &config.data.sheet);
    pb.finish_and_clear();

    Ok(result?)
}

/// One record of `list --json`.
#[derive(Serialize)]
struct ListedRecord<'a> {
    index: usize,
    id: &'a str,
    fields: &'a Record,
}

/// The listing as pretty JSON; record fields keep the sheet column order.
fn listing_json(dataset: &Dataset, listing: &[ListingEntry<'_>]) -> serde_json::Result<String> {
    let records: Vec<ListedRecord<'_>> = listing
        .iter()
        .zip(dataset.records())
        .map(|(entry, record)| ListedRecord {
            index: entry.index,
            id: entry.label,
            fields: record,
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

fn print_summary(report: &GenerationReport) {
    if !report.failures.is_empty() || !report.skipped.is_empty() {
        eprintln!(
            "{} {} failed, {} skipped",
            "!".yellow().bold(),
            report.failures.len(),
            report.skipped.len()
        );
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn wait_for_enter() {
    print!("\nPressione Enter para sair.");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
