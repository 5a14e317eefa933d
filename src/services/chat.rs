use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ChatMessage, Conversation, Envelope, ExchangeReply, NewConversation, OutgoingMessage, Role,
};

pub const SEND_FAILED: &str = "Sorry, something went wrong sending your message. Please try again.";
pub const UNREACHABLE: &str = "Could not reach the server. Please check your connection.";

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn conversations(&self, user_id: &str) -> Result<Envelope<Vec<Conversation>>>;

    async fn messages(&self, conversation_id: &str) -> Result<Envelope<Vec<ChatMessage>>>;

    async fn create_conversation(&self, request: &NewConversation)
        -> Result<Envelope<Conversation>>;

    async fn delete_conversation(&self, conversation_id: &str) -> Result<Envelope<Value>>;

    async fn send_message(&self, message: &OutgoingMessage) -> Result<Envelope<ExchangeReply>>;
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub user_id: String,
    pub is_open: bool,
    pub is_minimized: bool,
    pub input: String,
    conversation: Option<Conversation>,
    conversations: Vec<Conversation>,
    messages: Vec<ChatMessage>,
    is_loading: bool,
    pending_id: Option<String>,
}

impl ChatSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// 1-based position of the current conversation in the list.
    pub fn position(&self) -> Option<usize> {
        let current = self.conversation.as_ref()?;
        self.conversations
            .iter()
            .position(|c| c.id == current.id)
            .map(|i| i + 1)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn needs_conversation(&self) -> bool {
        self.is_open && self.conversation.is_none()
    }

    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
        self.is_minimized = false;
    }

    pub fn toggle_minimized(&mut self) {
        self.is_minimized = !self.is_minimized;
    }

    /// Adopts the user's latest conversation, or starts a new one when there is none.
    pub async fn ensure_conversation(&mut self, backend: &dyn ChatBackend) -> Result<()> {
        if self.conversation.is_some() {
            return Ok(());
        }

        self.conversations = backend
            .conversations(&self.user_id)
            .await?
            .into_data()
            .unwrap_or_default();

        if let Some(latest) = self.conversations.first().cloned() {
            debug!("resuming conversation {}", latest.id);
            return self.open(backend, latest).await;
        }

        self.create(
            backend,
            "AI assistant".to_string(),
            "Quick chat with the AI assistant",
        )
        .await
    }

    /// Starts a fresh conversation titled after its place in the list.
    pub async fn new_conversation(&mut self, backend: &dyn ChatBackend) -> Result<()> {
        let title = format!("Conversation {}", self.conversations.len() + 1);
        self.create(backend, title, "New conversation with the AI assistant")
            .await
    }

    /// Switches to the conversation after the current one, wrapping around.
    pub async fn next_conversation(&mut self, backend: &dyn ChatBackend) -> Result<()> {
        if self.conversations.is_empty() {
            return Ok(());
        }
        let next = match self.position() {
            Some(position) => position % self.conversations.len(),
            None => 0,
        };
        let target = self.conversations[next].clone();
        if self.conversation.as_ref().map(|c| &c.id) == Some(&target.id) {
            return Ok(());
        }
        self.open(backend, target).await
    }

    /// Deletes a conversation; when it was the current one the first remaining
    /// conversation takes its place. Returns false when the backend refused.
    pub async fn delete_conversation(
        &mut self,
        backend: &dyn ChatBackend,
        conversation_id: &str,
    ) -> Result<bool> {
        if !backend.delete_conversation(conversation_id).await?.success {
            warn!("chat backend refused to delete conversation {conversation_id}");
            return Ok(false);
        }
        self.conversations.retain(|c| c.id != conversation_id);

        let was_current = self
            .conversation
            .as_ref()
            .is_some_and(|c| c.id == conversation_id);
        if was_current {
            self.conversation = None;
            self.messages.clear();
            if let Some(first) = self.conversations.first().cloned() {
                self.open(backend, first).await?;
            }
        }
        Ok(true)
    }

    pub async fn delete_current(&mut self, backend: &dyn ChatBackend) -> Result<bool> {
        let Some(id) = self.conversation.as_ref().map(|c| c.id.clone()) else {
            return Ok(false);
        };
        self.delete_conversation(backend, &id).await
    }

    async fn open(&mut self, backend: &dyn ChatBackend, conversation: Conversation) -> Result<()> {
        self.messages = backend
            .messages(&conversation.id)
            .await?
            .into_data()
            .unwrap_or_default();
        self.conversation = Some(conversation);
        Ok(())
    }

    async fn create(
        &mut self,
        backend: &dyn ChatBackend,
        title: String,
        description: &str,
    ) -> Result<()> {
        let request = NewConversation {
            user_id: self.user_id.clone(),
            title,
            description: description.to_string(),
        };
        if let Some(created) = backend.create_conversation(&request).await?.into_data() {
            debug!("created conversation {}", created.id);
            self.conversations.insert(0, created.clone());
            self.conversation = Some(created);
            self.messages.clear();
        }
        Ok(())
    }

    /// Takes over a conversation bootstrapped on a copy of this session, unless one
    /// was already set in the meantime.
    pub fn adopt(&mut self, loaded: ChatSession) {
        if self.conversation.is_none() {
            self.switch_to(loaded);
        }
    }

    /// Takes the conversation list and selection from a copy that created, switched
    /// or deleted conversations, keeping the local input and window state.
    pub fn switch_to(&mut self, loaded: ChatSession) {
        self.conversation = loaded.conversation;
        self.conversations = loaded.conversations;
        self.messages = loaded.messages;
    }

    /// Takes the input and shows it right away; returns the request to send, if any.
    pub fn begin_send(&mut self) -> Option<OutgoingMessage> {
        let content = self.input.trim().to_string();
        if content.is_empty() || self.is_loading {
            return None;
        }
        let conversation_id = self.conversation.as_ref()?.id.clone();

        self.input.clear();
        self.is_loading = true;

        let pending = local_message(Role::User, &content);
        self.pending_id = Some(pending.id.clone());
        self.messages.push(pending);

        Some(OutgoingMessage {
            conversation_id,
            content,
            images_url: Vec::new(),
        })
    }

    pub fn finish_send(&mut self, outcome: Result<Envelope<ExchangeReply>>) {
        self.is_loading = false;
        let pending_id = self.pending_id.take();

        match outcome {
            Ok(envelope) => match envelope.into_data() {
                Some(reply) => {
                    if let Some(id) = pending_id {
                        self.messages.retain(|m| m.id != id);
                    }
                    self.messages.push(reply.user_message);
                    self.messages.push(reply.ai_message);
                }
                None => {
                    warn!("chat backend rejected message");
                    self.messages.push(local_message(Role::Assistant, SEND_FAILED));
                }
            },
            Err(e) => {
                warn!("chat send failed: {e}");
                self.messages.push(local_message(Role::Assistant, UNREACHABLE));
            }
        }
    }

    pub async fn send(&mut self, backend: &dyn ChatBackend) {
        if let Some(outgoing) = self.begin_send() {
            let outcome = backend.send_message(&outgoing).await;
            self.finish_send(outcome);
        }
    }
}

fn local_message(role: Role, content: &str) -> ChatMessage {
    ChatMessage {
        id: format!("local-{}", Uuid::new_v4()),
        content: content.to_string(),
        role,
        created_at: Utc::now().to_rfc3339(),
    }
}
