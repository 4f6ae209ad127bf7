//! Conversation state for the chatbot

use super::user_message;
use crate::client::{ApiClient, ClientError};
use crate::types::{
    ChatRequest, ChatResponse, ChatbotFeedback, ConversationCreate, ConversationHistory,
    ConversationResponse, Language, Message, MessageAck, MessageRole,
};
use chrono::Utc;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// A single conversation with the chatbot
///
/// Messages are appended optimistically: the user's message shows up
/// immediately and is taken back out if the server never answers it.
#[derive(Debug)]
pub struct ChatSession {
    client: ApiClient,
    conversation_id: Option<String>,
    messages: Vec<Message>,
    language: Language,
    user_agent: String,
    error: Option<String>,
}

impl ChatSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            conversation_id: None,
            messages: Vec::new(),
            language: Language::default(),
            user_agent: concat!("kipesa-client/", env!("CARGO_PKG_VERSION")).to_string(),
            error: None,
        }
    }

    /// Identify the caller in the context sent with every message
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.conversation_id.is_some()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn messages_by(&self, role: MessageRole) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.role == role)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Message describing the last failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Forget the conversation
    pub fn clear(&mut self) {
        self.conversation_id = None;
        self.messages.clear();
        self.error = None;
    }

    /// Open a new conversation, replacing the current one
    pub async fn start(
        &mut self,
        initial_message: &str,
        language: Language,
    ) -> Result<ConversationResponse, ClientError> {
        let request = ConversationCreate {
            initial_message: initial_message.to_string(),
            language,
            user_id: None,
            context: Some(self.context()),
        };

        self.error = None;
        let response = match self.client.start_conversation(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.error = Some(user_message(&err, "Failed to start conversation"));
                return Err(err);
            }
        };
        self.conversation_id = Some(response.conversation_id.clone());
        self.messages = response.messages.clone();
        self.language = response.language;
        debug!(conversation = %response.conversation_id, "Conversation started");
        Ok(response)
    }

    /// Send a message and append the reply
    ///
    /// Blank messages are ignored and yield `Ok(None)`.
    pub async fn send(&mut self, message: &str) -> Result<Option<ChatResponse>, ClientError> {
        if message.trim().is_empty() {
            return Ok(None);
        }
        self.error = None;

        self.messages.push(Message {
            role: MessageRole::User,
            content: message.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            metadata: None,
        });

        let request = ChatRequest {
            message: message.to_string(),
            conversation_id: self.conversation_id.clone(),
            language: self.language,
            user_id: None,
            context: Some(self.context()),
        };

        let response = match self.client.chat(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.messages.pop();
                self.error = Some(user_message(&err, "Failed to send message"));
                return Err(err);
            }
        };

        if self.conversation_id.is_none() {
            self.conversation_id = Some(response.conversation_id.clone());
        }

        self.messages.push(Message {
            role: MessageRole::Assistant,
            content: response.message.clone(),
            timestamp: Utc::now().to_rfc3339(),
            metadata: Some(json!({
                "confidence": response.confidence,
                "intent": response.intent,
                "sentiment": response.sentiment,
                "response_time": response.response_time,
            })),
        });

        Ok(Some(response))
    }

    /// Replace local state with a conversation stored on the server
    pub async fn load_history(
        &mut self,
        conversation_id: &str,
    ) -> Result<ConversationHistory, ClientError> {
        self.error = None;
        let history = match self.client.conversation_history(conversation_id).await {
            Ok(history) => history,
            Err(err) => {
                self.error = Some(user_message(&err, "Failed to load conversation history"));
                return Err(err);
            }
        };
        self.conversation_id = Some(history.conversation_id.clone());
        self.messages = history.messages.clone();
        Ok(history)
    }

    /// Rate a message of the current conversation
    ///
    /// Returns `Ok(None)` when no conversation has been started.
    pub async fn submit_feedback(
        &self,
        message_id: &str,
        rating: u8,
        feedback: Option<String>,
        helpful: bool,
    ) -> Result<Option<MessageAck>, ClientError> {
        let Some(conversation_id) = self.conversation_id.clone() else {
            return Ok(None);
        };

        let feedback = ChatbotFeedback {
            conversation_id,
            message_id: message_id.to_string(),
            rating,
            feedback,
            helpful,
        };
        self.client.submit_feedback(&feedback).await.map(Some)
    }

    fn context(&self) -> JsonValue {
        json!({
            "user_agent": self.user_agent,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }
}
