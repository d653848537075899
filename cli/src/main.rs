//! chatline CLI entry point
//!
//! This is the main binary that wires together all the layers:
//! - Domain: Conversations, messages, send-cycle state
//! - Application: Session controller and its guards
//! - Infrastructure: HTTP backend, config loading, transcript logging
//! - Presentation: CLI, console rendering and the chat REPL

use anyhow::{Context, Result, bail};
use chatline_application::{ChatSessionController, UiEvent};
use chatline_infrastructure::{ConfigLoader, FileConfig, HttpChatApi, JsonlConversationLogger};
use chatline_presentation::{ChatRepl, Cli, ReplConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    // CLI flags override file values
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }
    if let Some(chatbot) = cli.chatbot {
        config.backend.chatbot_id = Some(chatbot);
    }

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config error: {}", issue);
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_tracing(cli.verbose, &config)?;

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    info!("Using backend at {}", config.backend.base_url);

    let api = Arc::new(
        HttpChatApi::new(&config.backend.base_url, config.backend.timeout())
            .context("Failed to create backend client")?,
    );

    let (tx, rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut controller =
        ChatSessionController::new(api.clone(), tx).with_config(config.chat.to_session_config());

    if let Some(path) = &config.chat.transcript_log {
        match JsonlConversationLogger::new(expand_home(path)) {
            Some(logger) => {
                info!("Recording transcript to {}", logger.path().display());
                controller = controller.with_conversation_logger(Arc::new(logger));
            }
            None => warn!("Transcript logging disabled"),
        }
    }

    let repl_config = ReplConfig {
        chatbot_id: config.backend.chatbot_id,
        history_file: config.repl.history_file.as_deref().map(expand_home),
        ..ReplConfig::default()
    };
    let mut repl = ChatRepl::new(controller, api, rx).with_config(repl_config);

    if cli.list {
        if config.backend.chatbot_id.is_none() {
            bail!("--list needs a chatbot (use --chatbot or backend.chatbot_id)");
        }
        repl.print_list().await;
        return Ok(());
    }

    if let Some(title) = cli.new_conversation_title() {
        if config.backend.chatbot_id.is_none() {
            bail!("--new needs a chatbot (use --chatbot or backend.chatbot_id)");
        }
        repl.create_and_open(title).await;
    } else if let Some(conversation_id) = cli.conversation {
        repl.open(conversation_id).await;
    }

    repl.run().await?;

    Ok(())
}

/// Install the tracing subscriber.
///
/// Logs go to stderr unless `[logging] dir` is set, in which case they are
/// written to a daily rolling file in that directory.
fn init_tracing(verbose: u8, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("chatline=info,warn"),
        2 => EnvFilter::new("chatline=debug,info"),
        _ => EnvFilter::new("trace"),
    };

    match &config.logging.dir {
        Some(dir) => {
            let dir = expand_home(dir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, "chatline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/log/x"), PathBuf::from("/var/log/x"));
        assert_eq!(expand_home("relative.txt"), PathBuf::from("relative.txt"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a/b.txt"), home.join("a/b.txt"));
        }
    }
}
