//! Reconcile use case - fetch the authoritative message list for a conversation.
//!
//! The reconciler does not decide whether its result is still wanted; the
//! caller checks its identity snapshot after the fetch resumes.

use crate::ports::chat_api::{ApiError, ChatApi};
use chatline_domain::{ConversationId, Message};
use std::sync::Arc;
use tracing::debug;

/// Fetches the server's canonical message list.
pub struct Reconciler<A: ChatApi + ?Sized> {
    api: Arc<A>,
}

impl<A: ChatApi + ?Sized> Clone for Reconciler<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: ChatApi + ?Sized> Reconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Return the authoritative message list of `conversation_id`.
    pub async fn reconcile(&self, conversation_id: ConversationId) -> Result<Vec<Message>, ApiError> {
        let conversation = self.api.get_conversation(conversation_id).await?;

        if conversation.id() != conversation_id {
            return Err(ApiError::Decode(format!(
                "requested conversation {} but received {}",
                conversation_id,
                conversation.id()
            )));
        }

        debug!(
            "Fetched authoritative record for conversation {} ({} messages)",
            conversation_id,
            conversation.messages.len()
        );
        Ok(conversation.into_messages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_api::DeltaStream;
    use async_trait::async_trait;
    use chatline_domain::{Conversation, ConversationSummary, MessageId, Role};
    use chrono::Utc;

    struct FixedApi {
        record: Result<Conversation, ApiError>,
    }

    #[async_trait]
    impl ChatApi for FixedApi {
        async fn stream_chat(
            &self,
            _conversation_id: ConversationId,
            _message: &str,
        ) -> Result<DeltaStream, ApiError> {
            Err(ApiError::Other("not used".to_string()))
        }

        async fn get_conversation(
            &self,
            _conversation_id: ConversationId,
        ) -> Result<Conversation, ApiError> {
            self.record.clone()
        }
    }

    fn record(id: i64) -> Conversation {
        let now = Utc::now();
        Conversation {
            summary: ConversationSummary {
                id: ConversationId::new(id),
                chatbot_id: 1,
                title: None,
                created_at: now,
                updated_at: now,
                message_count: 1,
                last_message: None,
            },
            messages: vec![Message {
                id: MessageId::Durable(9),
                conversation_id: ConversationId::new(id),
                role: Role::User,
                content: "hi".to_string(),
                tokens_used: None,
                sources: None,
                created_at: now,
            }],
        }
    }

    #[tokio::test]
    async fn returns_authoritative_messages() {
        let reconciler = Reconciler::new(Arc::new(FixedApi { record: Ok(record(4)) }));
        let messages = reconciler.reconcile(ConversationId::new(4)).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, MessageId::Durable(9));
    }

    #[tokio::test]
    async fn rejects_record_for_another_conversation() {
        let reconciler = Reconciler::new(Arc::new(FixedApi { record: Ok(record(5)) }));
        let err = reconciler.reconcile(ConversationId::new(4)).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn propagates_fetch_errors() {
        let reconciler = Reconciler::new(Arc::new(FixedApi {
            record: Err(ApiError::Timeout),
        }));
        let err = reconciler.reconcile(ConversationId::new(4)).await.unwrap_err();
        assert_eq!(err, ApiError::Timeout);
    }
}
