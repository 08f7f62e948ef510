//! tableur CLI - evaluate, trace and lint spreadsheet formulas

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tableur::catalog::{self, FunctionDescriptor};
use tableur::prelude::*;
use tableur::{supported_functions, unsupported_functions, DEFAULT_COLS, DEFAULT_ROWS};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for a formula the local evaluator cannot compute
const NOT_EVALUABLE: u8 = 2;

#[derive(Parser)]
#[command(name = "tableur")]
#[command(author, version, about = "Evaluate, trace and lint spreadsheet formulas", long_about = None)]
struct Cli {
    /// Log more (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against a grid
    Eval {
        /// Formula, e.g. "=SOMME(A1:A4)"
        formula: String,

        #[command(flatten)]
        sheet: SheetArgs,

        /// Print how the result was computed
        #[arg(long)]
        trace: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Show logical values as TRUE/FALSE
        #[arg(long)]
        english: bool,

        /// Decimal digits kept in numeric results
        #[arg(long, default_value_t = 10)]
        decimals: u32,
    },

    /// Report likely mistakes in a formula without evaluating it
    Lint {
        /// Formula, e.g. "=SI(A1>10;\"Grand\")"
        formula: String,

        /// Named constant, as NAME=VALUE
        #[arg(short, long = "name", value_name = "NAME=VALUE")]
        names: Vec<String>,

        /// Print the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the known functions
    Functions {
        /// Only names or descriptions containing this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Only functions the local evaluator computes
        #[arg(long)]
        supported: bool,
    },
}

#[derive(Args)]
struct SheetArgs {
    /// Cell content, as REF=VALUE (e.g. A1=15)
    #[arg(short, long = "cell", value_name = "REF=VALUE")]
    cells: Vec<String>,

    /// Named constant, as NAME=VALUE (e.g. TVA=0,2)
    #[arg(short, long = "name", value_name = "NAME=VALUE")]
    names: Vec<String>,

    /// Grid rows
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Grid columns
    #[arg(long, default_value_t = DEFAULT_COLS)]
    cols: usize,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Eval {
            formula,
            sheet,
            trace,
            json,
            english,
            decimals,
        } => {
            let style = if english {
                BooleanStyle::English
            } else {
                BooleanStyle::French
            };
            let format = FormatOptions::new()
                .with_decimals(decimals)
                .with_boolean_style(style);
            let sheet = build_sheet(&sheet)?.with_format(format);
            eval(&sheet, &formula, trace, json)
        }
        Commands::Lint {
            formula,
            names,
            json,
        } => {
            let names = parse_names(&names)?;
            lint(&formula, &names, json)
        }
        Commands::Functions { filter, supported } => {
            functions(filter.as_deref(), supported);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_sheet(args: &SheetArgs) -> Result<Sheet> {
    let mut sheet = Sheet::new(args.rows, args.cols).with_names(parse_names(&args.names)?);
    for arg in &args.cells {
        let (reference, value) = split_assignment(arg)?;
        sheet
            .set(reference, value)
            .with_context(|| format!("Failed to set cell from '{}'", arg))?;
    }
    debug!(
        rows = args.rows,
        cols = args.cols,
        cells = args.cells.len(),
        names = sheet.names().len(),
        "sheet ready"
    );
    Ok(sheet)
}

fn parse_names(args: &[String]) -> Result<NamedConstants> {
    let mut names = NamedConstants::new();
    for arg in args {
        let (name, value) = split_assignment(arg)?;
        names
            .define(name, value)
            .with_context(|| format!("Failed to define constant from '{}'", arg))?;
    }
    Ok(names)
}

fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("Expected KEY=VALUE, got '{}'", arg),
    }
}

fn eval(sheet: &Sheet, formula: &str, trace: bool, json: bool) -> Result<ExitCode> {
    let traced = sheet.trace(formula);
    let unsupported = if traced.is_evaluable() {
        Vec::new()
    } else {
        unsupported_functions(formula)
    };

    if json {
        let mut out = serde_json::json!({
            "formula": formula,
            "result": traced.result,
            "error": traced.error,
            "unsupported": unsupported,
        });
        if trace {
            out["trace"] = serde_json::to_value(&traced.trace)
                .context("Failed to serialize the trace")?;
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if trace && !traced.trace.is_empty() {
            print!("{}", traced.trace.render());
        }
        if let Some(result) = &traced.result {
            println!("{}", result);
        }
    }

    if traced.is_evaluable() {
        return Ok(ExitCode::SUCCESS);
    }

    if !unsupported.is_empty() {
        eprintln!(
            "Not evaluable locally, unsupported function(s): {}",
            unsupported.join(", ")
        );
    } else if let Some(error) = &traced.error {
        eprintln!("Not evaluable: {}", error);
    } else {
        eprintln!("Not evaluable: empty formula");
    }
    Ok(ExitCode::from(NOT_EVALUABLE))
}

fn lint(formula: &str, names: &NamedConstants, json: bool) -> Result<ExitCode> {
    let diagnostics = tableur::lint_formula(formula, names);

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else if diagnostics.is_empty() {
        eprintln!("No issues found");
    } else {
        for diagnostic in &diagnostics {
            println!("{}", diagnostic);
        }
    }

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn functions(filter: Option<&str>, supported_only: bool) {
    let supported = supported_functions();
    let needle = filter.map(str::to_lowercase);

    let matches = |d: &FunctionDescriptor| match &needle {
        Some(needle) => {
            d.name.to_lowercase().contains(needle.as_str())
                || d.description.to_lowercase().contains(needle.as_str())
        }
        None => true,
    };

    let mut shown = 0;
    for descriptor in catalog::descriptors().iter().filter(|d| matches(*d)) {
        let local = supported.contains(&descriptor.name);
        if supported_only && !local {
            continue;
        }
        let marker = if local { "*" } else { " " };
        println!(
            "{} {:<16} {:<22} {}",
            marker,
            descriptor.name,
            descriptor.category.label(),
            descriptor.syntax
        );
        shown += 1;
    }
    eprintln!("{} function(s), * = computed locally", shown);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("A1=15").unwrap(), ("A1", "15"));
        assert_eq!(split_assignment(" TVA =0,2").unwrap(), ("TVA", "0,2"));
        assert_eq!(split_assignment("B2=").unwrap(), ("B2", ""));
        assert_eq!(split_assignment("B2=a=b").unwrap(), ("B2", "a=b"));
        assert!(split_assignment("A1").is_err());
        assert!(split_assignment("=15").is_err());
    }

    #[test]
    fn test_build_sheet() {
        let args = SheetArgs {
            cells: vec!["A1=15".into(), "A2=8".into()],
            names: vec!["TVA=0,2".into()],
            rows: 4,
            cols: 2,
        };
        let sheet = build_sheet(&args).unwrap();
        assert_eq!(sheet.try_evaluate("=SOMME(A1:A2)*(1+TVA)"), Some("27.6".into()));

        let outside = SheetArgs {
            cells: vec!["Z99=1".into()],
            names: Vec::new(),
            rows: 4,
            cols: 2,
        };
        assert!(build_sheet(&outside).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "tableur", "-v", "eval", "=A1*2", "--cell", "A1=3", "--name", "K=2", "--trace",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Eval {
                formula,
                sheet,
                trace,
                json,
                ..
            } => {
                assert_eq!(formula, "=A1*2");
                assert_eq!(sheet.cells, vec!["A1=3".to_string()]);
                assert_eq!(sheet.names, vec!["K=2".to_string()]);
                assert_eq!(sheet.rows, DEFAULT_ROWS);
                assert!(trace);
                assert!(!json);
            }
            _ => panic!("expected eval"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
