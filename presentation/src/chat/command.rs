//! Parsing of REPL input lines

use chatline_domain::ConversationId;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Switch to another conversation
    Open(ConversationId),
    /// Create a conversation (optionally titled) and switch to it
    New(Option<String>),
    /// List the chatbot's conversations
    List,
    /// Delete a conversation
    Delete(ConversationId),
    /// Re-fetch the active conversation
    Reload,
    Help,
    Quit,
    /// Plain text: send it as a chat message
    Send(String),
}

impl ReplCommand {
    /// Parse a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        if !line.starts_with('/') {
            return Ok(ReplCommand::Send(line.to_string()));
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "/open" | "/o" => Self::conversation_arg(arg, "/open").map(ReplCommand::Open),
            "/new" | "/n" => Ok(ReplCommand::New(
                (!arg.is_empty()).then(|| arg.to_string()),
            )),
            "/list" | "/ls" => Ok(ReplCommand::List),
            "/delete" | "/rm" => Self::conversation_arg(arg, "/delete").map(ReplCommand::Delete),
            "/reload" | "/r" => Ok(ReplCommand::Reload),
            "/help" | "/h" | "/?" => Ok(ReplCommand::Help),
            "/quit" | "/exit" | "/q" => Ok(ReplCommand::Quit),
            _ => Err(format!("Unknown command: {}", command)),
        }
    }

    fn conversation_arg(arg: &str, command: &str) -> Result<ConversationId, String> {
        if arg.is_empty() {
            return Err(format!("Usage: {} <conversation id>", command));
        }
        arg.parse().map_err(|e| format!("{}", e))
    }

    pub fn help() -> &'static str {
        "Commands:
  /open <id>, /o      - Switch to a conversation
  /new [title], /n    - Start a new conversation
  /list, /ls          - List conversations
  /delete <id>, /rm   - Delete a conversation
  /reload, /r         - Re-fetch the current conversation
  /help, /h, /?       - Show this help
  /quit, /exit, /q    - Exit
Anything else is sent as a message."
    }
}
