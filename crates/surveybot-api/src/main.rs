//! surveybot entry point.
//!
//! Binary name: `surveybot`
//!
//! Parses CLI arguments, loads configuration and secrets, wires the survey
//! engine to Telegram and the record store, then dispatches to the command.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use surveybot_infra::config::{env_var, load_config, load_secrets, load_survey};
use surveybot_observe::{LogFormat, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need logging or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "surveybot", &mut std::io::stdout());
        return Ok(());
    }

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(cli.log_filter(), format, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let result = execute(cli).await;
    shutdown_tracing();
    result
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref()).await?;
    let survey = load_survey(&config).await?;

    match cli.command {
        Commands::Run { require_primary } => {
            config.storage.require_primary |= require_primary;
            let secrets = load_secrets(env_var)?;
            cli::run::run(config, survey, secrets, shutdown_signal(), cli.quiet).await?;
        }

        Commands::Questions => {
            cli::questions::print_questions(&survey, cli.json)?;
        }

        Commands::Check => {
            let secrets = load_secrets(env_var)?;
            cli::check::check(&config, &survey, secrets, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
