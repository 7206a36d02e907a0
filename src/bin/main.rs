//! hda CLI - Compile analytics requests to fan-out safe SQL
//!
//! Usage:
//!   hda compile <design.json> <request.json> [--dialect <dialect>] [--output sql|json] [--check]
//!   hda describe <design.json>
//!   hda validate <design.json>
//!
//! Examples:
//!   hda compile gitflix.design.json request.json --dialect postgres
//!   hda compile gitflix.design.json request.json --output json
//!   hda describe gitflix.design.json

use clap::{Parser, Subcommand, ValueEnum};
use hda::compile::{compile_json, CompileOptions};
use hda::config::Settings;
use hda::model::{Design, Table};
use hda::sql::validate::validate_sql;
use hda::sql::Dialect;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hda")]
#[command(about = "hda - Compile analytics requests to fan-out safe SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a request against a design
    Compile {
        /// Path to the compiled design (.json)
        design: PathBuf,

        /// Path to the request payload (.json)
        request: PathBuf,

        /// SQL dialect to generate (defaults to the configured dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,

        /// Parse the generated SQL before printing it
        #[arg(long)]
        check: bool,
    },

    /// List the tables, joins and attributes of a design
    Describe {
        /// Path to the compiled design (.json)
        design: PathBuf,
    },

    /// Validate a design without compiling anything
    Validate {
        /// Path to the compiled design (.json)
        design: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Ansi,
    Postgres,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Ansi => Dialect::Ansi,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL and result columns as JSON
    Json,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            design,
            request,
            dialect,
            output,
            check,
        } => cmd_compile(&design, &request, dialect, output, check),
        Commands::Describe { design } => cmd_describe(&design),
        Commands::Validate { design } => cmd_validate(&design),
    }
}

fn read_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            None
        }
    }
}

fn load_design(path: &Path) -> Option<Design> {
    let source = read_file(path)?;
    match Design::from_json(&source) {
        Ok(design) => Some(design),
        Err(e) => {
            eprintln!("Invalid design '{}': {}", path.display(), e);
            None
        }
    }
}

fn cmd_compile(
    design: &Path,
    request: &Path,
    dialect: Option<DialectArg>,
    output: OutputFormat,
    check: bool,
) -> ExitCode {
    let (Some(design_json), Some(request_json)) = (read_file(design), read_file(request)) else {
        return ExitCode::FAILURE;
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut options = match CompileOptions::from_settings(&settings) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }

    let compiled = match compile_json(&design_json, &request_json, &options) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if check {
        if let Err(e) = validate_sql(&compiled.sql, compiled.dialect) {
            eprintln!("Generated SQL does not parse: {}", e);
            return ExitCode::FAILURE;
        }
    }

    match output {
        OutputFormat::Sql => println!("{}", compiled.sql),
        OutputFormat::Json => match serde_json::to_string_pretty(&compiled) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize output: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}

fn print_table(table: &Table) {
    for column in table.columns().filter(|c| !c.hidden) {
        println!(
            "  column    {} ({}) \"{}\"",
            column.name,
            column.column_type.as_str(),
            column.label
        );
    }
    for timeframe in table.timeframes() {
        let periods: Vec<String> = timeframe
            .periods
            .iter()
            .map(|p| format!("{:?}", p).to_lowercase())
            .collect();
        println!(
            "  timeframe {} [{}]",
            timeframe.name,
            periods.join(", ")
        );
    }
    for aggregate in table.aggregates() {
        println!(
            "  aggregate {} ({}) \"{}\"",
            aggregate.name,
            aggregate.aggregate_type.as_str(),
            aggregate.label
        );
    }
}

fn cmd_describe(path: &Path) -> ExitCode {
    let Some(design) = load_design(path) else {
        return ExitCode::FAILURE;
    };

    println!("Design: {} ({})", design.name, design.label);
    println!();

    let base = design.base_table();
    println!("Base table: {}", base.name);
    print_table(base);

    for join in design.joins() {
        let keys: Vec<String> = join
            .on
            .iter()
            .map(|key| format!("{} = {}.{}", key.left, join.name, key.right))
            .collect();
        println!();
        println!(
            "Join: {} ({:?}, {:?}) on {}",
            join.name,
            join.relationship,
            join.kind,
            keys.join(" and ")
        );
        print_table(&join.table);
    }

    ExitCode::SUCCESS
}

fn cmd_validate(path: &Path) -> ExitCode {
    if load_design(path).is_none() {
        return ExitCode::FAILURE;
    }

    println!("OK: {} is valid", path.display());
    ExitCode::SUCCESS
}
