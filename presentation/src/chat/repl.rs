//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use crate::config::ReplConfig;
use crate::output::console::{ConsoleFormatter, EventRenderer};
use chatline_application::{
    ApiError, ChatApi, ChatSessionController, ConversationDirectory, SendOutcome, SendRejection,
    UiEvent,
};
use chatline_domain::ConversationId;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

/// Interactive chat REPL
///
/// Owns the receiving end of the controller's event channel and renders
/// events while a command is running, so streamed text appears as it
/// arrives and the next prompt only shows once the cycle is over.
pub struct ChatRepl<A: ChatApi + ConversationDirectory + 'static> {
    controller: ChatSessionController<A>,
    directory: Arc<A>,
    events: mpsc::UnboundedReceiver<UiEvent>,
    renderer: EventRenderer,
    config: ReplConfig,
    /// Fired on Ctrl-C; detaches the command being driven
    interrupt: Arc<Notify>,
}

impl<A: ChatApi + ConversationDirectory + 'static> ChatRepl<A> {
    /// Create a new ChatRepl
    ///
    /// `events` must be the receiver paired with the controller's sender.
    pub fn new(
        controller: ChatSessionController<A>,
        directory: Arc<A>,
        events: mpsc::UnboundedReceiver<UiEvent>,
    ) -> Self {
        Self {
            controller,
            directory,
            events,
            renderer: EventRenderer::new(),
            config: ReplConfig::default(),
            interrupt: Arc::new(Notify::new()),
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle that interrupts the command currently being driven.
    pub fn interrupt_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.interrupt)
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        // The line editor reads Ctrl-C as a key, so the signal only arrives
        // while a command is running.
        let interrupt = self.interrupt_handle();
        let ctrl_c = tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                interrupt.notify_waiters();
            }
        });

        // Try to load history
        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let prompt = match self.controller.active_conversation() {
                Some(id) => format!("{}> ", id),
                None => "> ".to_string(),
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    match ReplCommand::parse(line) {
                        Ok(command) => {
                            if self.execute(command).await {
                                break;
                            }
                        }
                        Err(message) => {
                            println!("{}", message.red());
                            println!("Type /help for available commands");
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        ctrl_c.abort();

        // Save history
        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "chatline".cyan().bold());
        match self.config.chatbot_id {
            Some(id) => println!("Chatbot: {}", id),
            None => println!("{}", "No chatbot selected (/list and /new need --chatbot)".dimmed()),
        }
        println!();
        println!("{}", ReplCommand::help());
        println!();
    }

    /// Run one command. Returns true if the REPL should exit.
    pub async fn execute(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Send(text) => self.send(text).await,
            ReplCommand::Open(id) => self.open(id).await,
            ReplCommand::New(title) => self.create_and_open(title.as_deref()).await,
            ReplCommand::List => self.print_list().await,
            ReplCommand::Delete(id) => self.delete(id).await,
            ReplCommand::Reload => {
                let controller = self.controller.clone();
                if let Some(Err(e)) = self.drive(async move { controller.reload().await }).await {
                    debug!("Reload failed: {}", e);
                }
            }
            ReplCommand::Help => {
                println!("{}", ReplCommand::help());
            }
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
        }
        false
    }

    /// Switch to `conversation_id` and print its history.
    pub async fn open(&mut self, conversation_id: ConversationId) {
        let controller = self.controller.clone();
        let result = self
            .drive(async move { controller.open_conversation(conversation_id).await })
            .await;
        // Load failures are rendered from their UiEvent.
        if let Some(Err(e)) = result {
            debug!("Opening conversation {} failed: {}", conversation_id, e);
        }
    }

    /// Create a conversation for the configured chatbot and switch to it.
    pub async fn create_and_open(&mut self, title: Option<&str>) {
        let Some(chatbot_id) = self.require_chatbot() else {
            return;
        };
        match self.directory.create_conversation(chatbot_id, title).await {
            Ok(summary) => {
                println!("Created conversation {}", summary.id.to_string().yellow());
                self.open(summary.id).await;
            }
            Err(e) => Self::print_error(&e),
        }
    }

    /// Print the first page of the configured chatbot's conversations.
    pub async fn print_list(&mut self) {
        let Some(chatbot_id) = self.require_chatbot() else {
            return;
        };
        match self
            .directory
            .list_conversations(chatbot_id, 0, self.config.page_size)
            .await
        {
            Ok(page) => println!("{}", ConsoleFormatter::format_page(&page)),
            Err(e) => Self::print_error(&e),
        }
    }

    async fn delete(&mut self, conversation_id: ConversationId) {
        match self.directory.delete_conversation(conversation_id).await {
            Ok(()) => {
                if self.controller.active_conversation() == Some(conversation_id) {
                    self.controller.close_conversation();
                    self.flush_events();
                }
                println!("Deleted conversation {}", conversation_id);
            }
            Err(e) => Self::print_error(&e),
        }
    }

    async fn send(&mut self, text: String) {
        if self.controller.active_conversation().is_none() {
            println!(
                "{}",
                "No conversation open. Use /open <id> or /new first.".yellow()
            );
            return;
        }

        // Spawned so an interrupted send keeps draining in the background.
        let controller = self.controller.clone();
        let task = tokio::spawn(async move { controller.send(&text).await });

        match self.drive(task).await {
            Some(Ok(SendOutcome::Rejected(SendRejection::Busy))) => {
                println!("{}", "A message is still being answered.".yellow());
            }
            Some(Ok(SendOutcome::Rejected(SendRejection::Unreconciled))) => {
                println!(
                    "{}",
                    "The previous answer could not be refreshed yet. Try /reload.".yellow()
                );
            }
            Some(Ok(SendOutcome::Rejected(reason))) => debug!("Send rejected: {:?}", reason),
            // Everything else has been rendered from events already.
            Some(Ok(_)) => {}
            Some(Err(e)) => warn!("Send task failed: {}", e),
            None => {
                self.controller.close_conversation();
                self.flush_events();
                println!(
                    "{}",
                    "Detached. The reply will be discarded; use /open to continue.".yellow()
                );
            }
        }
        println!();
    }

    /// Await `task` while rendering controller events as they arrive.
    ///
    /// Returns `None` if interrupted first. The task is dropped then, so
    /// work that must finish has to be spawned by the caller.
    async fn drive<T>(&mut self, task: impl Future<Output = T>) -> Option<T> {
        tokio::pin!(task);
        let interrupt = self.interrupt_handle();
        let interrupted = interrupt.notified();
        tokio::pin!(interrupted);
        interrupted.as_mut().enable();

        let events = &mut self.events;
        let renderer = &mut self.renderer;

        let output = loop {
            tokio::select! {
                output = &mut task => break Some(output),
                _ = interrupted.as_mut() => break None,
                Some(event) = events.recv() => Self::show(renderer, &event),
            }
        };

        self.flush_events();
        output
    }

    fn flush_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            Self::show(&mut self.renderer, &event);
        }
    }

    fn show(renderer: &mut EventRenderer, event: &UiEvent) {
        let output = renderer.render(event);
        if !output.is_empty() {
            print!("{}", output);
            let _ = std::io::stdout().flush();
        }
    }

    fn require_chatbot(&self) -> Option<i64> {
        if self.config.chatbot_id.is_none() {
            println!(
                "{}",
                "No chatbot selected. Restart with --chatbot <id> or set backend.chatbot_id."
                    .yellow()
            );
        }
        self.config.chatbot_id
    }

    fn print_error(error: &ApiError) {
        let message = error.user_message(&error.to_string());
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
}
