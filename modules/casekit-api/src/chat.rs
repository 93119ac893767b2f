//! AI assistant chat endpoints: conversations and message exchange.

use std::sync::Arc;

use async_trait::async_trait;
use casekit_http::HttpClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiResult;

/// One message in a conversation, user- or assistant-authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub model_used: Option<String>,
    pub tokens_used: Option<u32>,
    pub response_time_ms: Option<u32>,
    #[serde(default)]
    pub is_error: bool,
    pub error_message: Option<String>,
}

/// A conversation thread with the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: Option<u32>,
    #[serde(default)]
    pub last_message: Option<Message>,
}

/// A conversation with its full message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Profile or document context the assistant consulted while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAccess {
    pub context_id: Uuid,
    pub conversation_id: Uuid,
    pub message_id: Option<Uuid>,
    pub context_type: String,
    pub entity_id: Uuid,
    pub entity_table: String,
    pub access_reason: Option<String>,
    #[serde(default)]
    pub data_summary: Option<serde_json::Value>,
    pub accessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Both sides of one exchange: the stored user message and the
/// assistant's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub assistant_message: Message,
    #[serde(default)]
    pub contexts_accessed: Vec<ContextAccess>,
}

/// Assistant chat operations.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// List conversations, most recently active first.
    async fn list_conversations(&self) -> ApiResult<Vec<Conversation>>;

    /// Fetch one conversation with its messages, oldest first.
    async fn get_conversation(&self, conversation_id: Uuid) -> ApiResult<ConversationWithMessages>;

    /// Start a conversation.
    async fn create_conversation(&self, body: &ConversationCreate) -> ApiResult<Conversation>;

    /// Rename or archive a conversation.
    async fn update_conversation(
        &self,
        conversation_id: Uuid,
        body: &ConversationUpdate,
    ) -> ApiResult<Conversation>;

    /// Delete a conversation and its messages.
    async fn delete_conversation(&self, conversation_id: Uuid) -> ApiResult<()>;

    /// Send a message and wait for the assistant's reply.
    async fn send_message(
        &self,
        conversation_id: Uuid,
        content: &str,
    ) -> ApiResult<SendMessageResponse>;
}

pub struct HttpChatApi {
    http: Arc<HttpClient>,
}

impl HttpChatApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_conversations(&self) -> ApiResult<Vec<Conversation>> {
        self.http.get_json("/chat/conversations").await
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> ApiResult<ConversationWithMessages> {
        self.http
            .get_json(&format!("/chat/conversations/{conversation_id}"))
            .await
    }

    async fn create_conversation(&self, body: &ConversationCreate) -> ApiResult<Conversation> {
        self.http.post_json("/chat/conversations", body).await
    }

    async fn update_conversation(
        &self,
        conversation_id: Uuid,
        body: &ConversationUpdate,
    ) -> ApiResult<Conversation> {
        self.http
            .patch_json(&format!("/chat/conversations/{conversation_id}"), body)
            .await
    }

    async fn delete_conversation(&self, conversation_id: Uuid) -> ApiResult<()> {
        self.http
            .delete(&format!("/chat/conversations/{conversation_id}"))
            .await
    }

    async fn send_message(
        &self,
        conversation_id: Uuid,
        content: &str,
    ) -> ApiResult<SendMessageResponse> {
        let body = SendMessageRequest {
            content: content.to_owned(),
        };
        self.http
            .post_json(
                &format!("/chat/conversations/{conversation_id}/messages"),
                &body,
            )
            .await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use casekit_http::HttpClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> HttpChatApi {
        let http = HttpClient::new(HttpClientConfig::new(server.base_url())).unwrap();
        HttpChatApi::new(Arc::new(http))
    }

    fn message_body(id: &str, conversation: &str, role: &str, content: &str) -> serde_json::Value {
        json!({
            "message_id": id,
            "conversation_id": conversation,
            "role": role,
            "content": content,
            "created_at": "2026-02-01T10:00:00Z",
            "model_used": if role == "assistant" { json!("gpt-4o") } else { json!(null) },
            "tokens_used": null,
            "response_time_ms": null,
            "is_error": false,
            "error_message": null
        })
    }

    #[tokio::test]
    async fn conversation_detail_flattens_thread_fields() {
        let server = MockServer::start();
        let conversation = "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2001";
        let _m = server.mock(|when, then| {
            when.method(GET)
                .path(format!("/chat/conversations/{conversation}"));
            then.status(200).json_body(json!({
                "conversation_id": conversation,
                "user_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2002",
                "title": "Visa questions",
                "is_active": true,
                "created_at": "2026-02-01T09:00:00Z",
                "updated_at": "2026-02-01T10:00:00Z",
                "message_count": 2,
                "last_message": null,
                "messages": [
                    message_body("6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2003", conversation, "user", "When does my visa expire?"),
                    message_body("6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2004", conversation, "assistant", "Your visa expires on 2026-09-30.")
                ]
            }));
        });

        let detail = api_for(&server)
            .get_conversation(conversation.parse().unwrap())
            .await
            .unwrap();
        assert_eq!(detail.conversation.title.as_deref(), Some("Visa questions"));
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn send_message_returns_both_sides() {
        let server = MockServer::start();
        let conversation = "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2001";
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/chat/conversations/{conversation}/messages"))
                .json_body(json!({"content": "Hello"}));
            then.status(200).json_body(json!({
                "user_message": message_body("6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2005", conversation, "user", "Hello"),
                "assistant_message": message_body("6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b2006", conversation, "assistant", "Hi, how can I help?"),
                "contexts_accessed": []
            }));
        });

        let exchange = api_for(&server)
            .send_message(conversation.parse().unwrap(), "Hello")
            .await
            .unwrap();
        assert_eq!(exchange.user_message.content, "Hello");
        assert_eq!(exchange.assistant_message.role, "assistant");
        assert_eq!(mock.calls(), 1);
    }
}
