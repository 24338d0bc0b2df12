#![doc = include_str!("../README.md")]

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use jsonmend::{FixConfig, Severity};
use jsonmend_diagnostics::SyntaxDiagnostic;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl core::str::FromStr for ReportFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown report format '{s}', expected: text, json")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
}

impl core::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(format!(
                "unknown log level '{s}', expected: none, error, warn, info, debug"
            )),
        }
    }
}

#[derive(Debug, Clone, Bpaf)]
pub struct GlobalOptions {
    /// Log verbosity (falls back to the JSONMEND_LOG env var)
    #[bpaf(long("log-level"), argument("LEVEL"), fallback(LogLevel::None))]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Bpaf)]
pub struct FixArgs {
    /// Emit one value per line when the input holds multiple roots
    #[bpaf(long("ndjson"))]
    pub ndjson: bool,

    /// Print only the first root instead of wrapping multiple roots
    #[bpaf(long("no-wrap"))]
    pub no_wrap: bool,

    /// Keep undefined/NaN/Infinity as quoted strings instead of null
    #[bpaf(long("keep-special-literals"))]
    pub keep_special_literals: bool,

    /// Normalize legal number spellings instead of preserving them
    #[bpaf(long("normalize-numbers"))]
    pub normalize_numbers: bool,

    /// Upper bound on reported fixes
    #[bpaf(long("max-fixes"), argument("N"), fallback(1000))]
    pub max_fixes: u32,

    /// Write a repair report to stderr
    #[bpaf(long("report"), argument("text|json"))]
    pub report: Option<ReportFormat>,

    /// Input file (defaults to stdin)
    #[bpaf(positional("FILE"))]
    pub file: Option<String>,
}

impl From<&FixArgs> for FixConfig {
    fn from(args: &FixArgs) -> Self {
        FixConfig {
            wrap_multi_root: !args.no_wrap,
            ndjson_mode: args.ndjson,
            normalize_special_literals: !args.keep_special_literals,
            preserve_number_lexemes: !args.normalize_numbers,
            max_fixes: args.max_fixes,
        }
    }
}

#[derive(Debug, Clone, Bpaf)]
pub struct ValidateArgs {
    /// Report findings as JSON instead of rendered diagnostics
    #[bpaf(long("report"), argument("text|json"), fallback(ReportFormat::Text))]
    pub report: ReportFormat,

    /// Input file (defaults to stdin)
    #[bpaf(positional("FILE"))]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage, generate(cli))]
/// Repair and validate malformed JSON
struct Cli {
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("fix"))]
    /// Repair a JSON document and print the result
    Fix(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(fix_args))] FixArgs,
    ),

    #[bpaf(command("validate"))]
    /// Report syntax findings without rewriting the input
    Validate(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(validate_args))] ValidateArgs,
    ),

    #[bpaf(command("version"))]
    /// Print version information
    Version,
}

/// Set up tracing from the `--log-level` flag, falling back to the
/// `JSONMEND_LOG` env var.
fn setup_tracing(global: &GlobalOptions) {
    let filter = match global.log_level {
        LogLevel::None => match tracing_subscriber::EnvFilter::try_from_env("JSONMEND_LOG") {
            Ok(f) => f,
            Err(_) => return,
        },
        LogLevel::Error => tracing_subscriber::EnvFilter::new("error"),
        LogLevel::Warn => tracing_subscriber::EnvFilter::new("warn"),
        LogLevel::Info => tracing_subscriber::EnvFilter::new("info"),
        LogLevel::Debug => tracing_subscriber::EnvFilter::new("debug"),
    };

    tracing_subscriber::registry()
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Set up the miette report handler, with colors only when stderr is a
/// terminal.
fn setup_miette() {
    let theme = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        miette::GraphicalTheme::unicode()
    } else {
        miette::GraphicalTheme::unicode_nocolor()
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .graphical_theme(theme.clone())
                .build(),
        )
    }))
    .ok();
}

/// Read the input file (or stdin), decoding invalid UTF-8 lossily.
fn read_input(file: Option<&str>) -> Result<(String, String)> {
    match file {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {path}"))?;
            Ok((String::from_utf8_lossy(&bytes).into_owned(), path.to_string()))
        }
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("failed to read stdin")?;
            Ok((String::from_utf8_lossy(&bytes).into_owned(), "stdin".to_string()))
        }
    }
}

fn run_fix(args: &FixArgs) -> Result<bool> {
    let (input, _) = read_input(args.file.as_deref())?;
    let config = FixConfig::from(args);
    let result = jsonmend::fix(&input, &config);

    println!("{}", result.fixed);
    match args.report {
        Some(ReportFormat::Text) => {
            for message in &result.detailed_fixes {
                eprintln!("{message}");
            }
            eprintln!(
                "{} fix(es), {} token(s), depth {}",
                result.metrics.fix_count,
                result.metrics.tokens_processed,
                result.metrics.max_depth
            );
        }
        Some(ReportFormat::Json) => {
            let report = serde_json::json!({
                "was_fixed": result.was_fixed,
                "fixes": result.fixes,
                "detailed_fixes": result.detailed_fixes,
                "metrics": result.metrics,
            });
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
        None => {}
    }
    Ok(false)
}

fn run_validate(args: &ValidateArgs) -> Result<bool> {
    let (input, name) = read_input(args.file.as_deref())?;
    let errors = jsonmend::validate(&input);
    let had_errors = errors.iter().any(|e| e.severity == Severity::Error);

    match args.report {
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&errors)?);
        }
        ReportFormat::Text => {
            if errors.is_empty() {
                eprintln!("{name}: OK");
            }
            for error in &errors {
                let report =
                    miette::Report::new(SyntaxDiagnostic::new(error, &name, &input));
                eprintln!("{report:?}");
            }
        }
    }
    Ok(had_errors)
}

fn main() -> ExitCode {
    let opts = cli().run();

    let result = match opts.command {
        Commands::Fix(global, args) => {
            setup_tracing(&global);
            run_fix(&args)
        }
        Commands::Validate(global, args) => {
            setup_tracing(&global);
            setup_miette();
            run_validate(&args)
        }
        Commands::Version => {
            println!("jsonmend {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(had_errors) => {
            if had_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fix_defaults() -> anyhow::Result<()> {
        let parsed = cli()
            .run_inner(&["fix"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match parsed.command {
            Commands::Fix(global, args) => {
                assert_eq!(global.log_level, LogLevel::None);
                assert!(!args.ndjson);
                assert!(!args.no_wrap);
                assert!(!args.keep_special_literals);
                assert!(!args.normalize_numbers);
                assert_eq!(args.max_fixes, 1000);
                assert!(args.report.is_none());
                assert!(args.file.is_none());
            }
            _ => panic!("expected Fix"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_fix_all_options() -> anyhow::Result<()> {
        let parsed = cli()
            .run_inner(&[
                "fix",
                "--ndjson",
                "--no-wrap",
                "--keep-special-literals",
                "--normalize-numbers",
                "--max-fixes",
                "50",
                "--report",
                "json",
                "input.json",
            ])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match parsed.command {
            Commands::Fix(_, args) => {
                assert!(args.ndjson);
                assert!(args.no_wrap);
                assert!(args.keep_special_literals);
                assert!(args.normalize_numbers);
                assert_eq!(args.max_fixes, 50);
                assert_eq!(args.report, Some(ReportFormat::Json));
                assert_eq!(args.file.as_deref(), Some("input.json"));

                let config = FixConfig::from(&args);
                assert!(config.ndjson_mode);
                assert!(!config.wrap_multi_root);
                assert!(!config.normalize_special_literals);
                assert!(!config.preserve_number_lexemes);
                assert_eq!(config.max_fixes, 50);
            }
            _ => panic!("expected Fix"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_validate_with_report() -> anyhow::Result<()> {
        let parsed = cli()
            .run_inner(&["validate", "--report", "json", "data.json"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match parsed.command {
            Commands::Validate(_, args) => {
                assert_eq!(args.report, ReportFormat::Json);
                assert_eq!(args.file.as_deref(), Some("data.json"));
            }
            _ => panic!("expected Validate"),
        }
        Ok(())
    }

    #[test]
    fn cli_validate_default_report_is_text() -> anyhow::Result<()> {
        let parsed = cli()
            .run_inner(&["validate"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match parsed.command {
            Commands::Validate(_, args) => {
                assert_eq!(args.report, ReportFormat::Text);
                assert!(args.file.is_none());
            }
            _ => panic!("expected Validate"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_log_level() -> anyhow::Result<()> {
        let parsed = cli()
            .run_inner(&["fix", "--log-level", "debug"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match parsed.command {
            Commands::Fix(global, _) => assert_eq!(global.log_level, LogLevel::Debug),
            _ => panic!("expected Fix"),
        }
        Ok(())
    }

    #[test]
    fn cli_rejects_unknown_report_format() {
        assert!(cli().run_inner(&["validate", "--report", "xml"]).is_err());
    }
}
