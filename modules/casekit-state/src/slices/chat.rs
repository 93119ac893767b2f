//! Chat slice: the conversation list and the opened thread.
//!
//! Conversations render most recent first, so a confirmed create is
//! prepended. Messages within the opened thread append in exchange
//! order.

use std::sync::Arc;

use casekit_api::chat::{
    ChatApi, Conversation, ConversationCreate, ConversationUpdate, ConversationWithMessages,
    SendMessageResponse,
};
use casekit_http::HttpError;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::lifecycle::{FetchGate, RequestLifecycle};

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub conversations: Vec<Conversation>,
    pub active: Option<ConversationWithMessages>,
    pub lifecycle: RequestLifecycle,
}

pub struct ChatSlice {
    api: Arc<dyn ChatApi>,
    state: RwLock<ChatState>,
    gate: FetchGate,
}

impl ChatSlice {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            state: RwLock::new(ChatState::default()),
            gate: FetchGate::new(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatState {
        self.state.read().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().lifecycle.clear_error();
    }

    pub async fn fetch_conversations(&self) -> Result<(), HttpError> {
        let ticket = self.gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_conversations().await {
            Ok(conversations) => {
                let mut state = self.state.write();
                if self.gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.conversations = conversations;
                } else {
                    tracing::debug!("discarding superseded conversation list response");
                }
                Ok(())
            }
            Err(error) => {
                if self.gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    /// Open a conversation: fetch the full thread and make it active.
    pub async fn open(&self, conversation_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.get_conversation(conversation_id).await {
            Ok(thread) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.active = Some(thread);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Start a conversation; prepended and opened with an empty thread.
    pub async fn create(&self, body: &ConversationCreate) -> Result<Conversation, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_conversation(body).await {
            Ok(conversation) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.conversations.insert(0, conversation.clone());
                state.active = Some(ConversationWithMessages {
                    conversation: conversation.clone(),
                    messages: Vec::new(),
                });
                Ok(conversation)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Rename or archive a conversation; the active thread header
    /// follows when it matches.
    pub async fn update(
        &self,
        conversation_id: Uuid,
        body: &ConversationUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_conversation(conversation_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .conversations
                    .iter_mut()
                    .find(|c| c.conversation_id == updated.conversation_id)
                {
                    *slot = updated.clone();
                }
                if let Some(active) = state.active.as_mut()
                    && active.conversation.conversation_id == updated.conversation_id
                {
                    active.conversation = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete(&self, conversation_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_conversation(conversation_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state
                    .conversations
                    .retain(|c| c.conversation_id != conversation_id);
                if state
                    .active
                    .as_ref()
                    .is_some_and(|a| a.conversation.conversation_id == conversation_id)
                {
                    state.active = None;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Send a message; both sides of the confirmed exchange append to
    /// the active thread.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<SendMessageResponse, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.send_message(conversation_id, content).await {
            Ok(exchange) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(active) = state.active.as_mut()
                    && active.conversation.conversation_id == conversation_id
                {
                    active.messages.push(exchange.user_message.clone());
                    active.messages.push(exchange.assistant_message.clone());
                }
                Ok(exchange)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }
}
