#![forbid(unsafe_code)]

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use quantumproof_ops::config::PipelineConfig;
use quantumproof_ops::core::SensitiveInput;
use quantumproof_ops::{OpsResult, run_cmd, verify_cmd};

#[derive(Parser, Debug)]
#[command(name = "quantumproof")]
#[command(about = "Privacy-preserving computation with verifiable hash commitments", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set QUANTUMPROOF_LOG)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute, commit and verify one run, then export it
    Run {
        /// Sensitive input value (held in memory only)
        #[arg(long)]
        input: OsString,
        /// Scenario label (defaults to the configured scenario)
        #[arg(long)]
        scenario: Option<String>,
        /// Force the simulated strategy
        #[arg(long)]
        fallback: bool,
        /// Output directory for the JSON and Markdown reports
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Configuration file (defaults to ./quantumproof.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// External FHE helper command line
        #[arg(long)]
        fhe_command: Option<String>,
        /// Append the verified run to this JSONL audit log
        #[arg(long)]
        history: Option<PathBuf>,
        /// Skip the Markdown report
        #[arg(long)]
        no_markdown: bool,
    },

    /// Re-verify exported run records
    Verify {
        /// Run record written by `run` (<run_id>.json)
        #[arg(long, required_unless_present = "history")]
        record: Option<PathBuf>,
        /// JSONL audit log
        #[arg(long)]
        history: Option<PathBuf>,
        /// Also check recorded fingerprints against this input
        #[arg(long)]
        input: Option<OsString>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("QUANTUMPROOF_LOG").unwrap_or_else(|_| {
        if verbose {
            "quantumproof_ops=debug".to_string()
        } else {
            "quantumproof_ops=info".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn dispatch(command: Commands) -> OpsResult<()> {
    match command {
        Commands::Run {
            input,
            scenario,
            fallback,
            output_dir,
            config,
            fhe_command,
            history,
            no_markdown,
        } => {
            let input = SensitiveInput::from_os_string(input)?;
            let mut cfg = PipelineConfig::resolve(config.as_deref())?;
            if let Some(dir) = output_dir {
                cfg.output_dir = dir;
            }
            if let Some(cmd) = fhe_command {
                cfg.fhe.command = Some(cmd);
            }
            if history.is_some() {
                cfg.history = history;
            }
            run_cmd::run(input, scenario, fallback, &cfg, !no_markdown)
        }
        Commands::Verify {
            record,
            history,
            input,
        } => {
            let input = input.map(SensitiveInput::from_os_string).transpose()?;
            verify_cmd::run(record, history, input)
        }
    }
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dispatch(cli.command) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
