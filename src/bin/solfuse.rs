//! solfuse CLI binary entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use solfuse::cli::{run_file, run_folder, run_scan, RunConfig, RunOutcome};
use solfuse::config::parse_remappings;
use solfuse::error::SolfuseError;
use solfuse::explorer::looks_like_target;
use solfuse::output::{FlattenReport, JsonResponse, JsonWarning};

/// Fuse a Solidity contract and its imports into one flat file.
#[derive(Parser)]
#[command(name = "solfuse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// A .sol file, a project folder, or a contract address
    /// (0xADDRESS or chain:0xADDRESS)
    source: String,

    /// Output path (default: <input>_flat.sol beside the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Remappings: inline 'prefix=target,...' or a .json/.toml file
    #[arg(short, long)]
    remappings: Option<String>,

    /// Default chain for bare contract addresses
    #[arg(short, long, default_value = "eth")]
    chain: String,

    /// Block explorer API key
    #[arg(long)]
    api_key: Option<String>,

    /// Skip unresolvable imports instead of failing
    #[arg(long)]
    lenient: bool,

    /// Emit a JSON report on stdout instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SOLFUSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(outcome) => {
            report_ok(&cli, &outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if cli.json {
                print_json(&JsonResponse::error(&err));
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::from(err.error_code().code())
        }
    }
}

fn run(cli: &Cli) -> Result<RunOutcome, SolfuseError> {
    let config = RunConfig {
        remappings: parse_remappings(cli.remappings.as_deref())?,
        lenient: cli.lenient,
        output: cli.output.clone(),
        chain: cli.chain.clone(),
        api_key: cli.api_key.clone(),
    };

    let path = Path::new(&cli.source);
    if path.is_dir() {
        run_folder(path, &config)
    } else if path.is_file() {
        run_file(path, &config)
    } else if looks_like_target(&cli.source) {
        run_scan(&cli.source, &config)
    } else {
        Err(SolfuseError::config(format!(
            "'{}' is not a file, folder, or contract address",
            cli.source
        )))
    }
}

fn report_ok(cli: &Cli, outcome: &RunOutcome) {
    let path = outcome.path.display().to_string();
    if cli.json {
        let report = FlattenReport::new(&cli.source, outcome.mode, &path, &outcome.flatten);
        let warnings = outcome.flatten.warnings.iter().map(JsonWarning::from).collect();
        print_json(&JsonResponse::ok(report, warnings));
        return;
    }
    for warning in &outcome.flatten.warnings {
        eprintln!("warning: {warning}");
    }
    for cycle in &outcome.flatten.cycles {
        eprintln!("warning: import cycle cut: {}", cycle.join(" -> "));
    }
    println!("{path}");
}

fn print_json(response: &JsonResponse) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("error: could not serialize response: {err}"),
    }
}
