use std::process::ExitCode;

use clap::Parser;
use goldfile::cli::{commands, Cli, Commands};
use goldfile::types::config::Config;
use goldfile::GoldfileResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Carrega configuração primeiro (sem logging ainda)
    let config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid configuration {}: {}", cli.config.display(), e);
            return ExitCode::from(commands::exit_code(&e));
        }
    };

    init_logging(&cli, &config);
    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(commands::exit_code(&e))
        }
    }
}

fn init_logging(cli: &Cli, config: &Config) {
    // Flags da CLI têm precedência sobre a config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("goldfile={}", log_level)
            .parse()
            .unwrap_or_else(|_| "goldfile=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

fn run(cli: Cli, config: &Config) -> GoldfileResult<()> {
    match cli.command {
        Commands::Init { path } => commands::init(path),
        Commands::Check {
            input,
            slot,
            decimal,
        } => commands::check(&input, &slot, decimal, config).map(|_| ()),
        Commands::Store { input, slot } => commands::store(&input, &slot, config),
        Commands::Compare {
            expected,
            actual,
            decimal,
        } => commands::compare_files(&expected, &actual, decimal, config),
        Commands::Inspect { slot, json } => commands::inspect(&slot, json),
        Commands::Version => {
            commands::version();
            Ok(())
        }
    }
}
