//! Request and response bodies exchanged with the Kipesa API

use crate::session::AccessToken;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

// Authentication

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Account registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Profile of the authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_language_code")]
    pub language: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_language_code() -> String {
    "en".to_string()
}

// Finance

/// New income source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeSourceCreate {
    pub name: String,
    pub amount: f64,
    pub frequency: Option<String>,
    pub description: Option<String>,
}

/// Stored income source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// New expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCreate {
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: String,
}

/// Stored expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// New budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetCreate {
    pub amount: f64,
    pub category: String,
    /// e.g. `monthly`, `yearly`
    pub period: String,
}

/// Stored budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub amount: f64,
    pub category: String,
    pub period: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// New savings goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalCreate {
    pub target_amount: f64,
    pub description: Option<String>,
    pub target_date: String,
}

/// Stored savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub target_amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub target_date: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

// Chatbot

/// Conversation language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "sw")]
    Swahili,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Swahili => "sw",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "sw" | "swahili" => Ok(Self::Swahili),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

/// Start a new conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationCreate {
    pub initial_message: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
}

/// Newly created conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub language: Language,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Send a message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
}

/// Assistant reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: String,
    pub language: Language,
    pub confidence: f64,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub sentiment: Option<String>,
    pub response_time: f64,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Full message history of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub total_messages: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Rating of an assistant message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotFeedback {
    pub conversation_id: String,
    pub message_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub helpful: bool,
}

/// Aggregate chatbot statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotAnalytics {
    pub total_conversations: u64,
    pub total_messages: u64,
    pub average_response_time: f64,
    pub average_confidence: f64,
    #[serde(default)]
    pub language_distribution: HashMap<String, u64>,
    #[serde(default)]
    pub top_intents: Vec<JsonValue>,
    #[serde(default)]
    pub sentiment_distribution: HashMap<String, u64>,
}

/// Server acknowledgement carrying a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAck {
    pub message: String,
}

/// Language offered by the chatbot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedLanguages {
    pub languages: Vec<LanguageInfo>,
}

/// Intent the chatbot can recognise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentInfo {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedIntents {
    pub intents: Vec<IntentInfo>,
}

/// Chatbot health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotHealth {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}
