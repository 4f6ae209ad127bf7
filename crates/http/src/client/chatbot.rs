//! Chatbot API client methods

use super::{ApiClient, ClientError, RequestOptions};
use crate::types::{
    ChatRequest, ChatResponse, ChatbotAnalytics, ChatbotFeedback, ChatbotHealth,
    ConversationCreate, ConversationHistory, ConversationResponse, MessageAck, SupportedIntents,
    SupportedLanguages,
};

impl ApiClient {
    /// Start a conversation with an initial message
    pub async fn start_conversation(
        &self,
        request: &ConversationCreate,
    ) -> Result<ConversationResponse, ClientError> {
        self.post("/chatbot/conversation", request).await
    }

    /// Send a message and receive the assistant's reply
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        self.post("/chatbot/chat", request).await
    }

    /// Fetch the messages of an existing conversation
    pub async fn conversation_history(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationHistory, ClientError> {
        let id = urlencoding::encode(conversation_id);
        self.get(&format!("/chatbot/conversation/{id}")).await
    }

    /// Rate an assistant message
    pub async fn submit_feedback(
        &self,
        feedback: &ChatbotFeedback,
    ) -> Result<MessageAck, ClientError> {
        self.post("/chatbot/feedback", feedback).await
    }

    /// Aggregate statistics, optionally limited to a date range
    pub async fn analytics(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<ChatbotAnalytics, ClientError> {
        let options = RequestOptions::new()
            .query_opt("start_date", start_date)
            .query_opt("end_date", end_date);
        self.get_with("/chatbot/analytics", options).await
    }

    pub async fn supported_languages(&self) -> Result<SupportedLanguages, ClientError> {
        self.get("/chatbot/languages").await
    }

    pub async fn supported_intents(&self) -> Result<SupportedIntents, ClientError> {
        self.get("/chatbot/intents").await
    }

    pub async fn chatbot_health(&self) -> Result<ChatbotHealth, ClientError> {
        self.get("/chatbot/health").await
    }
}
