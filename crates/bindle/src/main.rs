use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use bindle::{BundleOrchestrator, Config, RuntimeMode};
use clap::Parser;
use log::{LevelFilter, debug};

/// Bundle a CommonJS program into a single self-contained file
#[derive(Parser, Debug)]
#[command(name = "bindle", version, about, long_about = None)]
struct Cli {
    /// Entry module of the program
    entry: PathBuf,

    /// Write the bundle here instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to ./bindle.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Loader embedded in the bundle
    #[arg(long, value_enum)]
    runtime: Option<RuntimeMode>,

    /// Fail when modules require each other circularly
    #[arg(long)]
    strict_cycles: bool,

    /// Name of the import function whose calls are rewritten
    #[arg(long)]
    require_name: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Configuration stack with command line flags applied last
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(runtime) = self.runtime {
            config.runtime = runtime;
        }
        if self.strict_cycles {
            config.strict_cycles = true;
        }
        if let Some(require_name) = &self.require_name {
            config.require_name.clone_from(require_name);
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    debug!("Effective configuration: {config:?}");
    let orchestrator = BundleOrchestrator::new(config);

    match &cli.output {
        Some(output) => orchestrator.bundle_to_file(&cli.entry, output),
        None => {
            let code = orchestrator.bundle(&cli.entry)?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(code.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write bundle to stdout")
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
