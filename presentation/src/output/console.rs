//! Console rendering for chat sessions
//!
//! [`ConsoleFormatter`] formats single items. [`EventRenderer`] turns the
//! controller's [`UiEvent`] sequence into terminal output, printing only the
//! newly appended part of the streaming buffer.

use chatline_application::UiEvent;
use chatline_domain::{ConversationPage, ConversationSummary, Message, Role};
use colored::Colorize;

/// Formats conversations and messages for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn role_label(role: Role) -> String {
        match role {
            Role::User => "you".green().bold().to_string(),
            Role::Assistant => "assistant".cyan().bold().to_string(),
            Role::System => "system".dimmed().to_string(),
        }
    }

    /// One message, label on its own line.
    pub fn format_message(message: &Message) -> String {
        format!(
            "{} {}\n{}\n",
            Self::role_label(message.role),
            message.created_at.format("%H:%M").to_string().dimmed(),
            message.content
        )
    }

    pub fn format_summary(summary: &ConversationSummary) -> String {
        let title = summary.title.as_deref().unwrap_or("(untitled)");
        let mut line = format!(
            "{:>6}  {}  {}",
            summary.id.to_string().yellow(),
            title.bold(),
            format!(
                "{} messages, updated {}",
                summary.message_count,
                summary.updated_at.format("%Y-%m-%d %H:%M")
            )
            .dimmed()
        );
        if let Some(preview) = &summary.last_message {
            line.push_str(&format!("\n        {}", Self::truncate(preview, 60).dimmed()));
        }
        line
    }

    pub fn format_page(page: &ConversationPage) -> String {
        if page.items.is_empty() {
            return "No conversations yet. Use /new to start one.".dimmed().to_string();
        }
        let mut output = format!(
            "{}\n",
            format!("Conversations ({} of {})", page.items.len(), page.total)
                .cyan()
                .bold()
        );
        for summary in &page.items {
            output.push_str(&Self::format_summary(summary));
            output.push('\n');
        }
        output
    }

    pub fn header(title: &str) -> String {
        format!("{}\n", format!("── {} ──", title).cyan().bold())
    }

    /// Cut `text` to at most `max` characters, on a character boundary.
    pub fn truncate(text: &str, max: usize) -> String {
        let first_line = text.lines().next().unwrap_or_default();
        match first_line.char_indices().nth(max) {
            Some((cut, _)) => format!("{}…", &first_line[..cut]),
            None if first_line.len() < text.len() => format!("{}…", first_line),
            None => first_line.to_string(),
        }
    }
}

/// Stateful renderer for [`UiEvent`]s.
///
/// Tracks how much of the message list and of the streaming buffer is
/// already on screen. The user's own optimistic message is not echoed
/// since the prompt line already shows it.
#[derive(Debug, Default)]
pub struct EventRenderer {
    /// Messages of the current list already on screen
    printed: usize,
    /// Bytes of the streaming buffer already on screen
    streamed: usize,
}

impl EventRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output for `event`; empty when nothing visible changed.
    pub fn render(&mut self, event: &UiEvent) -> String {
        match event {
            UiEvent::ConversationSwitched {
                conversation_id: Some(id),
            } => {
                self.reset();
                ConsoleFormatter::header(&format!("conversation {}", id))
            }
            UiEvent::ConversationSwitched {
                conversation_id: None,
            } => {
                self.reset();
                format!("{}\n", "No conversation open.".dimmed())
            }
            UiEvent::MessagesChanged { messages, .. } => self.render_messages(messages),
            UiEvent::StreamingUpdated { content, .. } => self.render_stream(content),
            UiEvent::InputCleared | UiEvent::PhaseChanged { .. } => String::new(),
            UiEvent::SendFailed { message, .. } => {
                format!("{}{} {}\n", self.break_stream(), "✗".red().bold(), message.red())
            }
            UiEvent::ReconcileFailed { message, .. } => {
                format!("{} {}\n", "!".yellow().bold(), message.yellow())
            }
            UiEvent::LoadFailed { message, .. } => {
                format!("{} {}\n", "✗".red().bold(), message.red())
            }
        }
    }

    fn reset(&mut self) {
        self.printed = 0;
        self.streamed = 0;
    }

    /// Newline ending a partially streamed answer, if one is on screen.
    fn break_stream(&mut self) -> &'static str {
        if std::mem::take(&mut self.streamed) > 0 {
            "\n"
        } else {
            ""
        }
    }

    fn render_stream(&mut self, content: &str) -> String {
        let mut output = String::new();
        if self.streamed == 0 {
            output.push_str(&ConsoleFormatter::role_label(Role::Assistant));
            output.push('\n');
        }
        // The buffer only grows by appending, so the old length is a
        // character boundary of the new content.
        output.push_str(content.get(self.streamed..).unwrap_or(content));
        self.streamed = content.len();
        output
    }

    fn render_messages(&mut self, messages: &[Message]) -> String {
        let mut output = String::new();

        if messages.len() < self.printed {
            // Rollback removed the optimistic message.
            self.printed = messages.len();
            return output;
        }

        for message in &messages[self.printed..] {
            match (message.role, message.is_optimistic()) {
                (Role::User, true) => {}
                (Role::Assistant, true) if self.streamed > 0 => {
                    output.push_str(self.break_stream());
                }
                _ => output.push_str(&ConsoleFormatter::format_message(message)),
            }
        }
        self.printed = messages.len();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_domain::{ConversationId, MessageId};
    use chrono::Utc;

    fn conv() -> ConversationId {
        ConversationId::new(1)
    }

    fn message(id: MessageId, role: Role, content: &str) -> Message {
        Message {
            id,
            conversation_id: conv(),
            role,
            content: content.to_string(),
            tokens_used: None,
            sources: None,
            created_at: Utc::now(),
        }
    }

    fn temp(seq: u64, role: Role, content: &str) -> Message {
        message(MessageId::temporary(conv(), seq), role, content)
    }

    fn durable(id: i64, role: Role, content: &str) -> Message {
        message(MessageId::Durable(id), role, content)
    }

    fn changed(messages: Vec<Message>) -> UiEvent {
        UiEvent::MessagesChanged {
            conversation_id: conv(),
            messages,
        }
    }

    fn streamed(content: &str) -> UiEvent {
        UiEvent::StreamingUpdated {
            conversation_id: conv(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_streaming_prints_only_new_suffix() {
        let mut renderer = EventRenderer::new();
        let first = renderer.render(&streamed("hel"));
        assert!(first.ends_with("hel"));
        assert!(first.contains("assistant"));
        assert_eq!(renderer.render(&streamed("hello")), "lo");
        assert_eq!(renderer.render(&streamed("hello wörld")), " wörld");
    }

    #[test]
    fn test_full_send_cycle_output() {
        let mut renderer = EventRenderer::new();
        renderer.render(&UiEvent::ConversationSwitched {
            conversation_id: Some(conv()),
        });
        assert!(renderer.render(&changed(vec![])).is_empty());

        let user = temp(1, Role::User, "hi");
        assert!(renderer.render(&changed(vec![user.clone()])).is_empty());
        renderer.render(&streamed("hello"));

        let assistant = temp(2, Role::Assistant, "hello");
        assert_eq!(
            renderer.render(&changed(vec![user, assistant])),
            "\n"
        );

        // The authoritative swap changes nothing on screen.
        let authoritative = vec![
            durable(10, Role::User, "hi"),
            durable(11, Role::Assistant, "hello"),
        ];
        assert!(renderer.render(&changed(authoritative)).is_empty());
    }

    #[test]
    fn test_loaded_history_is_printed() {
        let mut renderer = EventRenderer::new();
        let output = renderer.render(&changed(vec![
            durable(1, Role::User, "question"),
            durable(2, Role::Assistant, "answer"),
        ]));
        assert!(output.contains("question"));
        assert!(output.contains("answer"));
    }

    #[test]
    fn test_failure_after_partial_stream_breaks_line() {
        let mut renderer = EventRenderer::new();
        renderer.render(&changed(vec![temp(1, Role::User, "hi")]));
        renderer.render(&streamed("partial"));

        let output = renderer.render(&UiEvent::SendFailed {
            conversation_id: conv(),
            message: "Failed to send message".to_string(),
        });
        assert!(output.starts_with('\n'));
        assert!(output.contains("Failed to send message"));

        // Rollback shrinks the list without printing.
        assert!(renderer.render(&changed(vec![])).is_empty());
        // The next answer gets a fresh label.
        assert!(renderer.render(&streamed("new")).contains("assistant"));
    }

    #[test]
    fn test_empty_answer_is_printed_as_message() {
        let mut renderer = EventRenderer::new();
        let user = temp(1, Role::User, "hi");
        renderer.render(&changed(vec![user.clone()]));
        let output = renderer.render(&changed(vec![user, temp(2, Role::Assistant, "")]));
        assert!(output.contains("assistant"));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(ConsoleFormatter::truncate("short", 10), "short");
        assert_eq!(ConsoleFormatter::truncate("日本語テキスト", 3), "日本語…");
        assert_eq!(ConsoleFormatter::truncate("one\ntwo", 10), "one…");
    }
}
