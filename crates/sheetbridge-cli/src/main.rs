//! sheetbridge CLI - move data between spreadsheets and SQLite

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetbridge::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetbridge")]
#[command(
    author,
    version,
    about = "Compile table-spec and sheet-spec files and move data between spreadsheets and SQLite"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a spreadsheet and write its regions into a SQLite database
    Load {
        /// Table specification file
        #[arg(short, long)]
        config: PathBuf,

        /// Output SQLite database
        #[arg(short, long)]
        db: PathBuf,

        /// Spreadsheet (CSV) to read when the specification names none
        #[arg(short, long)]
        spreadsheet: Option<String>,

        /// Sheet name to read from
        #[arg(short = 'n', long)]
        sheet: Option<String>,

        /// Prefer the command-line spreadsheet/sheet over the
        /// specification's
        #[arg(short, long)]
        r#override: bool,

        /// Add to existing tables instead of refusing to touch them
        #[arg(short, long)]
        append: bool,

        /// Show the parsed specification and exit
        #[arg(long)]
        parse_only: bool,

        /// Show the templates found in the specification and exit
        #[arg(long)]
        show_templates: bool,

        /// Write the template-expanded specification to a file and exit
        #[arg(long, value_name = "FILE")]
        expand_config: Option<PathBuf>,
    },

    /// Read a SQLite database and render a spreadsheet from it
    Fill {
        /// Sheet specification file
        #[arg(short, long)]
        config: PathBuf,

        /// Database to query when the specification names none
        #[arg(short, long)]
        db: Option<String>,

        /// Output spreadsheet (CSV) when the specification names none
        #[arg(short, long)]
        spreadsheet: Option<String>,

        /// Output sheet name
        #[arg(short = 'n', long)]
        sheet: Option<String>,

        /// Prefer the command-line values over the specification's
        #[arg(short, long)]
        r#override: bool,

        /// Show the parsed specification and exit
        #[arg(long)]
        parse_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            config,
            db,
            spreadsheet,
            sheet,
            r#override,
            append,
            parse_only,
            show_templates,
            expand_config,
        } => load(
            &config,
            &db,
            spreadsheet.as_deref(),
            sheet.as_deref(),
            r#override,
            append,
            parse_only,
            show_templates,
            expand_config.as_deref(),
        ),
        Commands::Fill {
            config,
            db,
            spreadsheet,
            sheet,
            r#override,
            parse_only,
        } => fill(
            &config,
            db.as_deref(),
            spreadsheet.as_deref(),
            sheet.as_deref(),
            r#override,
            parse_only,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn load(
    config: &PathBuf,
    db: &PathBuf,
    spreadsheet: Option<&str>,
    sheet: Option<&str>,
    override_spec: bool,
    append: bool,
    parse_only: bool,
    show_templates: bool,
    expand_config: Option<&std::path::Path>,
) -> Result<()> {
    let text = std::fs::read_to_string(config)
        .with_context(|| format!("failed to read '{}'", config.display()))?;

    if show_templates || expand_config.is_some() {
        let expansion = sheetbridge::expand(&text)?;
        if show_templates {
            for template in &expansion.templates {
                println!(
                    "template {}({})",
                    template.name(),
                    template
                        .params()
                        .iter()
                        .map(|p| p.trim_matches('_'))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        if let Some(target) = expand_config {
            std::fs::write(target, &expansion.text)
                .with_context(|| format!("failed to write '{}'", target.display()))?;
            eprintln!("configuration file '{}' generated", target.display());
        }
        return Ok(());
    }

    let database = parse_table_spec(&text)
        .with_context(|| format!("failed to compile '{}'", config.display()))?;

    if parse_only {
        println!("{database:#?}");
        return Ok(());
    }

    if db.exists() && !append {
        bail!(
            "the file '{}' already exists; pass --append to add to it",
            db.display()
        );
    }

    let mut store = SqliteStore::open(db)
        .with_context(|| format!("failed to open '{}'", db.display()))?;
    let grids = CsvGrids::new();
    let mut reporter = ConsoleReporter;

    materialize(&database, &mut store, append)?;
    populate(
        &database,
        &mut store,
        &grids,
        &PopulateOptions {
            spreadsheet,
            sheet,
            override_spec,
        },
        &mut reporter,
    )?;

    Ok(())
}

fn fill(
    config: &PathBuf,
    db: Option<&str>,
    spreadsheet: Option<&str>,
    sheet: Option<&str>,
    override_spec: bool,
    parse_only: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(config)
        .with_context(|| format!("failed to read '{}'", config.display()))?;

    let book = parse_sheet_spec(&text)
        .with_context(|| format!("failed to compile '{}'", config.display()))?;

    if parse_only {
        println!("{book:#?}");
        return Ok(());
    }

    let stores = SqliteProvider::new();
    let mut reporter = ConsoleReporter;

    let outputs = execute_book(
        &book,
        &stores,
        &ExecuteOptions {
            database: db,
            spreadsheet,
            sheet,
            override_spec,
        },
        &mut reporter,
    )?;

    write_book(&outputs).context("failed to write the output spreadsheets")?;
    for output in &outputs {
        eprintln!("wrote '{}' ({} sheets)", output.file, output.sheets.len());
    }

    Ok(())
}

/// Prints warnings and progress to stderr; fatal errors travel as results
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn warning(&mut self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn info(&mut self, message: &str) {
        eprintln!("{message}");
    }
}
