use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;

use spekshark_core::{
    CalibrationTable, OutputRecord, ProtocolVariant, ReceiverType, Report, SessionOptions,
    analyze_csv_file,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SPEKSHARK_BUILD_COMMIT"),
    " ",
    env!("SPEKSHARK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "spekshark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline analyzer for Spektrum DSM serial telemetry captures.",
    long_about = None,
    after_help = "Examples:\n  spekshark serial analyse capture.csv -o report.json\n  spekshark serial analyze capture.csv --stdout\n  spekshark serial analyse capture.csv -o report.json --calibration sticks.cal"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on logic-analyzer serial exports (offline-first).
    Serial {
        #[command(subcommand)]
        command: SerialCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SerialCommands {
    /// Analyse a capture export and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(
        after_help = "Examples:\n  spekshark serial analyse capture.csv -o report.json\n  spekshark serial analyze capture.csv --stdout --pretty\n  spekshark serial analyse capture.csv -o report.json --receiver-type external"
    )]
    Analyse {
        /// Path to a CSV serial export (start_time,end_time,data)
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Receiver wiring the capture was taken from
        #[arg(long, value_enum, default_value = "internal")]
        receiver_type: ReceiverTypeArg,

        /// Protocol assumed when the capture carries no in-band identity
        #[arg(long, value_enum, default_value = "dsm2-22ms-1024")]
        protocol: ProtocolArg,

        /// Calibration file (channel_id,min[,mid],max per line)
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Exit with a non-zero code if resync errors are present
        #[arg(long)]
        strict: bool,

        /// List resync error spans after analysis
        #[arg(long)]
        list_errors: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReceiverTypeArg {
    Internal,
    External,
}

impl From<ReceiverTypeArg> for ReceiverType {
    fn from(arg: ReceiverTypeArg) -> Self {
        match arg {
            ReceiverTypeArg::Internal => ReceiverType::Internal,
            ReceiverTypeArg::External => ReceiverType::External,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProtocolArg {
    #[value(name = "dsm2-22ms-1024")]
    Dsm2At22ms,
    #[value(name = "dsm2-11ms-2048")]
    Dsm2At11ms,
    #[value(name = "dsmx-22ms-2048")]
    DsmxAt22ms,
    #[value(name = "dsmx-11ms-2048")]
    DsmxAt11ms,
}

impl From<ProtocolArg> for ProtocolVariant {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Dsm2At22ms => ProtocolVariant::Dsm2At22ms,
            ProtocolArg::Dsm2At11ms => ProtocolVariant::Dsm2At11ms,
            ProtocolArg::DsmxAt22ms => ProtocolVariant::DsmxAt22ms,
            ProtocolArg::DsmxAt11ms => ProtocolVariant::DsmxAt11ms,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serial { command } => match command {
            SerialCommands::Analyse {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                receiver_type,
                protocol,
                calibration,
                strict,
                list_errors,
            } => cmd_serial_analyse(
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                receiver_type,
                protocol,
                calibration,
                strict,
                list_errors,
            ),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_serial_analyse(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    receiver_type: ReceiverTypeArg,
    protocol: ProtocolArg,
    calibration: Option<PathBuf>,
    strict: bool,
    list_errors: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        let report_abs = report_path
            .parent()
            .map(|parent| {
                if parent.as_os_str().is_empty() {
                    fs::canonicalize(".")
                } else {
                    fs::canonicalize(parent)
                }
            })
            .transpose()
            .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
        if let Some(report_dir) = report_abs {
            let report_target = report_dir.join(
                report_path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
            );
            if report_target == input_abs {
                return Err(CliError::new(
                    format!(
                        "report path must differ from input: {}",
                        report_path.display()
                    ),
                    Some("choose a different output path".to_string()),
                ));
            }
        }
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;

    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .csv serial export".to_string()),
        ));
    }

    let options = SessionOptions {
        receiver_type: receiver_type.into(),
        fallback_protocol: protocol.into(),
        calibration: load_calibration(calibration.as_deref(), quiet),
    };

    let rep = analyze_csv_file(&resolved_input, &options).context("serial analysis failed")?;
    let json = serialize_report(&rep, pretty, compact)?;

    if stdout {
        print!("{}", json);
        if list_errors && !quiet {
            print_errors(&rep);
        }
        if strict && has_errors(&rep) {
            return Err(CliError::new(
                "resync errors detected",
                Some("use --list-errors to inspect".to_string()),
            ));
        }
        return Ok(());
    }

    let report = report.ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--report or --stdout".to_string()),
        )
    })?;
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if list_errors && !quiet {
        print_errors(&rep);
    }
    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    if strict && has_errors(&rep) {
        return Err(CliError::new(
            "resync errors detected",
            Some("use --list-errors to inspect".to_string()),
        ));
    }
    Ok(())
}

/// A missing or unreadable calibration file downgrades to a warning; the
/// session then runs uncalibrated.
fn load_calibration(path: Option<&std::path::Path>, quiet: bool) -> Option<CalibrationTable> {
    let path = path?;
    match CalibrationTable::load(path) {
        Ok(table) => Some(table),
        Err(err) => {
            if !quiet {
                eprintln!(
                    "warning: calibration file ignored ({}): {}",
                    path.display(),
                    err
                );
            }
            None
        }
    }
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn has_errors(rep: &Report) -> bool {
    rep.records
        .iter()
        .any(|record| matches!(record, OutputRecord::Err { .. }))
}

fn print_errors(rep: &Report) {
    eprintln!("Resync errors:");
    for record in &rep.records {
        if let OutputRecord::Err { span } = record {
            eprintln!("  {:.6} -> {:.6}", span.start, span.end);
        }
    }
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .csv serial export".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "csv" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .csv serial export".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected a .csv export".to_string()),
        ));
    }
    if matches.len() > 1 {
        let hint = "pass a single capture file, or run once per file".to_string();
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed = matches.iter().take(3).collect::<Vec<_>>();
        if !listed.is_empty() {
            let mut details = String::new();
            details.push_str("; matches: ");
            details.push_str(
                &listed
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            if matches.len() > 3 {
                details.push_str(", ...");
            }
            message.push_str(&details);
        }
        return Err(CliError::new(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
