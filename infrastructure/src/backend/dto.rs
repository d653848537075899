//! Wire types for the chat backend.
//!
//! The backend emits ISO-8601 timestamps that may lack an offset; those are
//! read as UTC. Everything is converted into domain entities at this edge.

use chatline_domain::{
    Conversation, ConversationId, ConversationPage, ConversationSummary, Message, MessageId, Role,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /conversations/{id}/chat`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub stream: bool,
}

/// Body of `POST /chatbots/{id}/conversations`
#[derive(Debug, Serialize)]
pub struct CreateConversationRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
}

/// Error body of a non-success response
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extract a displayable `detail` from a raw response body.
    ///
    /// Only string details are surfaced; validation error lists and
    /// non-JSON bodies yield `None`.
    pub fn detail_from(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail? {
            serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
            _ => None,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub conversation_id: i64,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tokens_used: Option<i64>,
    #[serde(default)]
    pub sources: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Message {
            id: MessageId::Durable(dto.id),
            conversation_id: ConversationId::new(dto.conversation_id),
            role: dto.role,
            content: dto.content,
            tokens_used: dto.tokens_used,
            sources: dto.sources,
            created_at: dto.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationSummaryDto {
    pub id: i64,
    pub chatbot_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub last_message: Option<String>,
}

impl From<ConversationSummaryDto> for ConversationSummary {
    fn from(dto: ConversationSummaryDto) -> Self {
        ConversationSummary {
            id: ConversationId::new(dto.id),
            chatbot_id: dto.chatbot_id,
            title: dto.title,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            message_count: dto.message_count,
            last_message: dto.last_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationDto {
    #[serde(flatten)]
    pub summary: ConversationSummaryDto,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
}

impl From<ConversationDto> for Conversation {
    fn from(dto: ConversationDto) -> Self {
        Conversation {
            summary: dto.summary.into(),
            messages: dto.messages.into_iter().map(Message::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationPageDto {
    pub total: u64,
    #[serde(default)]
    pub items: Vec<ConversationSummaryDto>,
}

impl From<ConversationPageDto> for ConversationPage {
    fn from(dto: ConversationPageDto) -> Self {
        ConversationPage {
            total: dto.total,
            items: dto.items.into_iter().map(ConversationSummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_timestamp("2024-05-01T12:30:45.123456").unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.day(), 1);
    }

    #[test]
    fn test_offset_timestamp_is_converted() {
        let ts = parse_timestamp("2024-05-01T12:30:45+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_garbage_timestamp_is_rejected() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_conversation_detail_converts_to_domain() {
        let body = r#"{
            "id": 7,
            "chatbot_id": 2,
            "title": null,
            "created_at": "2024-05-01T12:00:00",
            "updated_at": "2024-05-01T12:05:00",
            "message_count": 2,
            "last_message": "hello world",
            "messages": [
                {"id": 70, "conversation_id": 7, "role": "user", "content": "hi",
                 "tokens_used": null, "sources": null, "created_at": "2024-05-01T12:04:00"},
                {"id": 71, "conversation_id": 7, "role": "assistant", "content": "hello world",
                 "tokens_used": 12, "sources": "[]", "created_at": "2024-05-01T12:05:00"}
            ]
        }"#;
        let dto: ConversationDto = serde_json::from_str(body).unwrap();
        let conversation = Conversation::from(dto);

        assert_eq!(conversation.id(), ConversationId::new(7));
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[1].id, MessageId::Durable(71));
        assert_eq!(conversation.messages[1].role, Role::Assistant);
        assert_eq!(conversation.messages[1].tokens_used, Some(12));
        assert!(!conversation.messages[0].is_optimistic());
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(
            ErrorBody::detail_from(r#"{"detail": "Conversation not found"}"#),
            Some("Conversation not found".to_string())
        );
        assert_eq!(
            ErrorBody::detail_from(r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#),
            None
        );
        assert_eq!(ErrorBody::detail_from("<html>Bad Gateway</html>"), None);
        assert_eq!(ErrorBody::detail_from("{}"), None);
    }

    #[test]
    fn test_chat_request_shape() {
        let body = serde_json::to_value(ChatRequest {
            message: "hi",
            stream: true,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi", "stream": true }));
    }
}
