//! `courier`: send push notifications from the command line.
//!
//! Loads settings, initializes logging, builds a client and runs one
//! command through the blocking bridge. Outcomes are printed to stdout as
//! JSON; logs go to stderr.

#![deny(unsafe_code)]

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use courier_apns::ApnsClient;
use courier_core::Notification;
use courier_core::logging::{LogFormat, init_subscriber};
use courier_settings::{ApnsEnvironment, load_settings, load_settings_from_path};
use serde_json::json;
use tracing::info;

use crate::args::{Cli, Command, read_tokens};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match cli.settings {
        Some(ref path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .context("failed to load settings")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    let format = if settings.logging.json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_subscriber(&level, format);

    if cli.sandbox {
        settings.apns.environment = ApnsEnvironment::Sandbox;
    }

    let client = ApnsClient::from_settings(&settings).context("failed to build push client")?;
    let default_topic = settings.apns.default_topic.as_deref();

    match cli.command {
        Command::Send { token, message } => {
            let payload = message.payload()?;
            let options = message.options(default_topic);
            let outcome = client
                .send_blocking(token.clone(), payload, &options)
                .context("send failed")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "token": token, "outcome": outcome }))?
            );
        }
        Command::Batch {
            tokens,
            tokens_file,
            message,
        } => {
            let tokens = match tokens_file {
                Some(ref path) => read_tokens(path)?,
                None => tokens,
            };
            let payload = message.payload()?;
            let options = message.options(default_topic);
            let notifications: Vec<Notification> = tokens
                .into_iter()
                .map(|token| Notification::new(token, payload.clone()))
                .collect();

            info!(count = notifications.len(), "sending batch");
            let results = client
                .send_batch_blocking(notifications, &options)
                .context("batch failed")?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
