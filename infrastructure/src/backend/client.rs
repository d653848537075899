//! HTTP adapter for the chat backend.
//!
//! Implements [`ChatApi`] and [`ConversationDirectory`] against the JSON API:
//!
//! | Operation            | Request                                   |
//! |----------------------|-------------------------------------------|
//! | stream chat          | `POST {base}/conversations/{id}/chat`     |
//! | conversation detail  | `GET {base}/conversations/{id}`           |
//! | list conversations   | `GET {base}/chatbots/{id}/conversations`  |
//! | create conversation  | `POST {base}/chatbots/{id}/conversations` |
//! | delete conversation  | `DELETE {base}/conversations/{id}`        |

use super::dto::{
    ChatRequest, ConversationDto, ConversationPageDto, ConversationSummaryDto,
    CreateConversationRequest, ErrorBody,
};
use super::error::{BackendError, Result};
use super::frames::decode_deltas;
use async_trait::async_trait;
use chatline_application::ports::chat_api::{ApiError, ChatApi, ConversationDirectory, DeltaStream};
use chatline_domain::{Conversation, ConversationId, ConversationPage, ConversationSummary};
use futures::TryStreamExt;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for connecting and for non-streaming requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat backend client over HTTP.
///
/// The streaming request only has a connect timeout: answers can take
/// arbitrarily long to generate.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpChatApi {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| BackendError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        let client = Client::builder().connect_timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn a non-success response into [`BackendError::Status`], keeping
    /// the server's `detail` when it sent one.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = ErrorBody::detail_from(&body);
        debug!("Backend answered {}: {:?}", status, detail);
        Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn open_stream(&self, conversation_id: ConversationId, message: &str) -> Result<DeltaStream> {
        let url = self.endpoint(&format!("conversations/{}/chat", conversation_id));
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message,
                stream: true,
            })
            .send()
            .await?;
        let response = Self::check(response).await?;

        Ok(decode_deltas(
            response.bytes_stream().map_err(BackendError::from),
        ))
    }

    async fn fetch_conversation(&self, conversation_id: ConversationId) -> Result<Conversation> {
        let url = self.endpoint(&format!("conversations/{}", conversation_id));
        debug!("GET {}", url);

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let dto: ConversationDto = Self::read_json(response).await?;
        Ok(dto.into())
    }

    async fn fetch_page(&self, chatbot_id: i64, skip: u64, limit: u64) -> Result<ConversationPage> {
        let url = self.endpoint(&format!("chatbots/{}/conversations", chatbot_id));
        debug!("GET {} (skip={}, limit={})", url, skip, limit);

        let response = self
            .client
            .get(&url)
            .query(&[("skip", skip), ("limit", limit)])
            .timeout(self.timeout)
            .send()
            .await?;
        let dto: ConversationPageDto = Self::read_json(response).await?;
        Ok(dto.into())
    }

    async fn post_conversation(
        &self,
        chatbot_id: i64,
        title: Option<&str>,
    ) -> Result<ConversationSummary> {
        let url = self.endpoint(&format!("chatbots/{}/conversations", chatbot_id));
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&CreateConversationRequest { title })
            .timeout(self.timeout)
            .send()
            .await?;
        let dto: ConversationSummaryDto = Self::read_json(response).await?;
        info!("Created conversation {} for chatbot {}", dto.id, chatbot_id);
        Ok(dto.into())
    }

    async fn remove_conversation(&self, conversation_id: ConversationId) -> Result<()> {
        let url = self.endpoint(&format!("conversations/{}", conversation_id));
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).timeout(self.timeout).send().await?;
        Self::check(response).await?;
        info!("Deleted conversation {}", conversation_id);
        Ok(())
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn stream_chat(
        &self,
        conversation_id: ConversationId,
        message: &str,
    ) -> std::result::Result<DeltaStream, ApiError> {
        Ok(self.open_stream(conversation_id, message).await?)
    }

    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> std::result::Result<Conversation, ApiError> {
        Ok(self.fetch_conversation(conversation_id).await?)
    }
}

#[async_trait]
impl ConversationDirectory for HttpChatApi {
    async fn list_conversations(
        &self,
        chatbot_id: i64,
        skip: u64,
        limit: u64,
    ) -> std::result::Result<ConversationPage, ApiError> {
        Ok(self.fetch_page(chatbot_id, skip, limit).await?)
    }

    async fn create_conversation(
        &self,
        chatbot_id: i64,
        title: Option<&str>,
    ) -> std::result::Result<ConversationSummary, ApiError> {
        Ok(self.post_conversation(chatbot_id, title).await?)
    }

    async fn delete_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> std::result::Result<(), ApiError> {
        Ok(self.remove_conversation(conversation_id).await?)
    }
}
