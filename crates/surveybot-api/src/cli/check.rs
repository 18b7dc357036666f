//! `surveybot check`: validate config, bot token and record store.

use anyhow::Result;
use console::style;
use surveybot_core::survey::Survey;
use surveybot_infra::config::Secrets;
use surveybot_infra::telegram::TelegramClient;
use surveybot_types::config::SurveyConfig;

use crate::state::open_persister;

pub async fn check(config: &SurveyConfig, survey: &Survey, secrets: Secrets, json: bool) -> Result<()> {
    let persister = open_persister(config, secrets.google_credentials.as_ref(), survey.len()).await?;
    let telegram = TelegramClient::new(secrets.bot_token, &config.telegram);
    let bot = telegram.get_me().await;

    let token_ok = bot.is_ok();
    let username = bot
        .as_ref()
        .ok()
        .and_then(|user| user.username.clone())
        .unwrap_or_default();

    if json {
        let report = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "bot_token_valid": token_ok,
            "bot_username": username,
            "storage_mode": persister.mode().to_string(),
            "fallback_reason": persister.fallback_reason(),
            "fallback_csv": config.storage.fallback_csv.display().to_string(),
            "questions": survey.len(),
            "expiry_seconds": config.expiry_seconds,
            "sweep_interval_seconds": config.sweep_interval_seconds,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mark = |ok: bool| {
            if ok {
                format!("{}", style("✓").green())
            } else {
                format!("{}", style("✗").red())
            }
        };
        println!();
        println!("  {} surveybot v{} check", style("🔍").bold(), env!("CARGO_PKG_VERSION"));
        println!();
        match &bot {
            Ok(_) => println!("  {} Bot token accepted (@{username})", mark(true)),
            Err(err) => println!("  {} Bot token: {err}", mark(false)),
        }
        match persister.fallback_reason() {
            None => println!("  {} Spreadsheet reachable", mark(true)),
            Some(reason) => {
                println!("  {} Spreadsheet unavailable: {reason}", mark(false));
                println!(
                    "      records would go to {}",
                    style(config.storage.fallback_csv.display()).yellow()
                );
            }
        }
        println!(
            "  {} {} questions, {}s session window, sweep every {}s",
            mark(survey.fits_row()),
            survey.len(),
            config.expiry_seconds,
            config.sweep_interval_seconds
        );
        println!();
    }

    if !token_ok {
        anyhow::bail!("bot token check failed");
    }
    Ok(())
}
