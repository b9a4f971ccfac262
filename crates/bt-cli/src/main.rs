use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bt_cli::commands::{report, signal, status, wipe};
use bt_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Log to stderr; stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Signal { file } => match file {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                signal::run(BufReader::new(file), &mut stdout, &config)?;
            }
            None => signal::run(io::stdin().lock(), &mut stdout, &config)?,
        },
        Commands::Status { json } => status::run(&mut stdout, &config, *json)?,
        Commands::Report {
            json,
            classify,
            history,
        } => {
            let mode = if *classify {
                report::Mode::Classify
            } else if *history {
                report::Mode::BackendHistory
            } else {
                report::Mode::Local
            };
            report::run(&mut stdout, &config, *json, mode)?;
        }
        Commands::Wipe { server } => wipe::run(&mut stdout, &config, *server)?,
    }

    Ok(())
}
