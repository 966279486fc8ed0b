//! Command-line arguments and their mapping to payloads and options.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use courier_core::{DeliveryOptions, Payload, Priority, PushType};
use serde_json::Value;

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Send push notifications through APNs")]
pub struct Cli {
    /// Settings file (default `~/.courier/settings.json`).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Use the development gateway regardless of settings.
    #[arg(long, global = true, default_value_t = false)]
    pub sandbox: bool,

    /// Log level (`RUST_LOG` still wins).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one notification and print its outcome.
    Send {
        /// Device token.
        #[arg(long)]
        token: String,

        #[command(flatten)]
        message: MessageArgs,
    },
    /// Send the same notification to many devices and print every outcome.
    Batch {
        /// Device token; repeat for more.
        #[arg(long = "token", required_unless_present = "tokens_file")]
        tokens: Vec<String>,

        /// File with one device token per line.
        #[arg(long, conflicts_with = "tokens")]
        tokens_file: Option<PathBuf>,

        #[command(flatten)]
        message: MessageArgs,
    },
}

/// Payload and delivery flags shared by both commands.
#[derive(Debug, Args)]
pub struct MessageArgs {
    /// Routing topic (bundle id). Falls back to `apns.defaultTopic`.
    #[arg(long)]
    pub topic: Option<String>,

    /// Alert text.
    #[arg(long)]
    pub alert: Option<String>,

    /// Badge number.
    #[arg(long)]
    pub badge: Option<u32>,

    /// Sound file name.
    #[arg(long)]
    pub sound: Option<String>,

    /// Category identifier.
    #[arg(long)]
    pub category: Option<String>,

    /// Thread identifier.
    #[arg(long)]
    pub thread_id: Option<String>,

    /// Mark as a background update.
    #[arg(long, default_value_t = false)]
    pub content_available: bool,

    /// Allow a notification service extension to modify the content.
    #[arg(long, default_value_t = false)]
    pub mutable_content: bool,

    /// Explicit push type: alert, background, voip, complication, fileprovider, mdm.
    #[arg(long)]
    pub push_type: Option<PushType>,

    /// Priority: immediate or delayed.
    #[arg(long, default_value = "immediate")]
    pub priority: Priority,

    /// Expiration as epoch seconds.
    #[arg(long)]
    pub expiration: Option<i64>,

    /// Collapse identifier.
    #[arg(long)]
    pub collapse_id: Option<String>,

    /// Extra top-level keys as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub custom: Option<String>,
}

impl MessageArgs {
    /// Build the payload.
    pub fn payload(&self) -> Result<Payload> {
        let mut payload = Payload {
            alert: self.alert.clone().map(Into::into),
            badge: self.badge,
            sound: self.sound.clone(),
            category: self.category.clone(),
            thread_id: self.thread_id.clone(),
            content_available: self.content_available,
            mutable_content: self.mutable_content,
            ..Payload::default()
        };

        if let Some(ref raw) = self.custom {
            let value: Value = serde_json::from_str(raw).context("--custom is not valid JSON")?;
            let Value::Object(map) = value else {
                bail!("--custom must be a JSON object");
            };
            payload.custom = map;
        }
        Ok(payload)
    }

    /// Build the delivery options, using `default_topic` when no topic was given.
    pub fn options(&self, default_topic: Option<&str>) -> DeliveryOptions {
        DeliveryOptions {
            topic: self.topic.clone().or_else(|| default_topic.map(String::from)),
            priority: self.priority,
            expiration: self.expiration,
            collapse_id: self.collapse_id.clone(),
            push_type: self.push_type,
        }
    }
}

/// Tokens from a file: one per line, blank lines and `#` comments skipped.
pub fn read_tokens(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tokens file: {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("courier").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_with_flags() {
        let cli = parse(&[
            "--sandbox",
            "send",
            "--token",
            "abc",
            "--topic",
            "com.example.App",
            "--alert",
            "Hello",
            "--badge",
            "2",
            "--priority",
            "delayed",
            "--push-type",
            "voip",
            "--expiration",
            "0",
        ]);
        assert!(cli.sandbox);
        let Command::Send { token, message } = cli.command else {
            panic!("expected send");
        };
        assert_eq!(token, "abc");

        let options = message.options(None);
        assert_eq!(options.topic.as_deref(), Some("com.example.App"));
        assert_eq!(options.priority, Priority::Delayed);
        assert_eq!(options.push_type, Some(PushType::VoIp));
        assert_eq!(options.expiration, Some(0));

        let payload = message.payload().unwrap();
        assert_eq!(payload.badge, Some(2));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"aps": {"alert": "Hello", "badge": 2}})
        );
    }

    #[test]
    fn default_topic_applies_when_missing() {
        let cli = parse(&["send", "--token", "abc"]);
        let Command::Send { message, .. } = cli.command else {
            panic!("expected send");
        };
        let options = message.options(Some("com.example.Default"));
        assert_eq!(options.topic.as_deref(), Some("com.example.Default"));
        assert_eq!(options.priority, Priority::Immediate);
    }

    #[test]
    fn custom_must_be_object() {
        let cli = parse(&["send", "--token", "abc", "--custom", "[1]"]);
        let Command::Send { message, .. } = cli.command else {
            panic!("expected send");
        };
        assert!(message.payload().is_err());

        let cli = parse(&["send", "--token", "abc", "--custom", r#"{"game":{"id":7}}"#]);
        let Command::Send { message, .. } = cli.command else {
            panic!("expected send");
        };
        let payload = message.payload().unwrap();
        assert_eq!(payload.custom["game"]["id"], 7);
    }

    #[test]
    fn batch_needs_tokens() {
        assert!(Cli::try_parse_from(["courier", "batch"]).is_err());
        let cli = parse(&["batch", "--token", "a", "--token", "b"]);
        let Command::Batch { tokens, .. } = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn bad_priority_rejected() {
        assert!(Cli::try_parse_from(["courier", "send", "--token", "a", "--priority", "urgent"]).is_err());
    }

    #[test]
    fn tokens_file_skips_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.txt");
        std::fs::write(&path, "# devices\naaa\n\n  bbb  \n").unwrap();
        assert_eq!(read_tokens(&path).unwrap(), vec!["aaa", "bbb"]);
        assert!(read_tokens(&dir.path().join("missing.txt")).is_err());
    }
}
