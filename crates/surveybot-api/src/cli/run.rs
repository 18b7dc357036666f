//! `surveybot run`: poll Telegram and run surveys until shutdown.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use surveybot_core::dispatch::IdentityRouter;
use surveybot_core::survey::Survey;
use surveybot_infra::config::Secrets;
use surveybot_infra::telegram::{TelegramClient, UpdatePoller};
use surveybot_types::config::SurveyConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::AppState;

/// Run until `shutdown` resolves or the bot token is rejected.
///
/// The token is checked before the record store is opened.
pub async fn run(
    config: SurveyConfig,
    survey: Survey,
    secrets: Secrets,
    shutdown: impl Future<Output = ()>,
    quiet: bool,
) -> Result<()> {
    let Secrets {
        bot_token,
        google_credentials,
    } = secrets;
    let telegram = TelegramClient::new(bot_token, &config.telegram);
    let me = telegram.get_me().await.context("bot token check failed")?;

    let state = AppState::init(config, survey, telegram, google_credentials.as_ref()).await?;
    info!(
        bot = me.username.as_deref().unwrap_or_default(),
        questions = state.survey.len(),
        storage = %state.storage_mode(),
        "surveybot starting"
    );

    if !quiet {
        println!();
        println!(
            "  {} surveybot polling as {}",
            style("⚡").bold(),
            style(format!("@{}", me.username.as_deref().unwrap_or("unknown"))).cyan()
        );
        println!(
            "  {} records go to the {} store",
            style("•").dim(),
            style(state.storage_mode()).yellow()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(state.sweeper().run(cancel.child_token()));
    let router = IdentityRouter::new(Arc::new(state.dispatcher()));
    let poller = UpdatePoller::new(Arc::clone(&state.telegram));

    let polled = tokio::select! {
        result = poller.run(|event| router.route(event), cancel.child_token()) => result,
        _ = shutdown => {
            info!("shutdown requested");
            Ok(())
        }
    };

    cancel.cancel();
    router.shutdown().await;
    sweeper.await.context("sweeper task panicked")?;

    if !quiet {
        println!("\n  Stopped.");
    }
    polled.context("update polling failed")
}
