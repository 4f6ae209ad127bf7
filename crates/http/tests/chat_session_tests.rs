//! Conversation state against a mock chatbot API

use kipesa_http::types::{Language, MessageRole};
use kipesa_http::{ApiClient, ChatSession};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(conversation_id: &str, message: &str) -> serde_json::Value {
    json!({
        "conversation_id": conversation_id,
        "message": message,
        "language": "sw",
        "confidence": 0.92,
        "intent": "budgeting",
        "sentiment": "neutral",
        "response_time": 0.41
    })
}

#[tokio::test]
async fn test_send_appends_exchange_and_adopts_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/chat"))
        .and(body_partial_json(json!({"message": "Nataka kuweka akiba", "language": "sw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_reply("conv-1", "Anza na bajeti ya kila mwezi.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());
    chat.set_language(Language::Swahili);

    let reply = chat.send("Nataka kuweka akiba").await.unwrap().unwrap();

    assert_eq!(reply.intent.as_deref(), Some("budgeting"));
    assert_eq!(chat.conversation_id(), Some("conv-1"));
    assert_eq!(chat.messages().len(), 2);
    assert_eq!(chat.messages()[0].role, MessageRole::User);

    let last = chat.last_message().unwrap();
    assert_eq!(last.role, MessageRole::Assistant);
    assert_eq!(last.content, "Anza na bajeti ya kila mwezi.");
    assert_eq!(last.metadata.as_ref().unwrap()["intent"], "budgeting");
}

#[tokio::test]
async fn test_follow_up_reuses_conversation_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/chat"))
        .and(body_partial_json(json!({"conversation_id": "conv-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("conv-1", "Sawa.")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chatbot/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("conv-1", "Karibu!")))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());
    chat.send("Habari").await.unwrap();
    chat.send("Asante").await.unwrap();

    assert_eq!(chat.messages_by(MessageRole::User).count(), 2);
    assert_eq!(chat.messages_by(MessageRole::Assistant).count(), 2);
}

#[tokio::test]
async fn test_failed_send_takes_back_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Model unavailable"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());

    let err = chat.send("How do I save?").await.unwrap_err();
    assert_eq!(err.detail_message(), Some("Model unavailable"));
    assert_eq!(chat.last_error(), Some("Model unavailable"));
    assert!(chat.messages().is_empty());
    assert!(!chat.is_started());
}

#[tokio::test]
async fn test_failures_without_detail_use_generic_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/conversation"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chatbot/chat"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chatbot/conversation/conv-1"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());

    assert!(chat.start("Hello", Language::English).await.is_err());
    assert_eq!(chat.last_error(), Some("Failed to start conversation"));

    assert!(chat.send("Hello").await.is_err());
    assert_eq!(chat.last_error(), Some("Failed to send message"));

    assert!(chat.load_history("conv-1").await.is_err());
    assert_eq!(chat.last_error(), Some("Failed to load conversation history"));

    chat.clear();
    assert!(chat.last_error().is_none());
}

#[tokio::test]
async fn test_blank_message_is_not_sent() {
    let server = MockServer::start().await;
    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());

    assert!(chat.send("   ").await.unwrap().is_none());
    assert!(chat.messages().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_adopts_server_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/conversation"))
        .and(body_partial_json(json!({"initial_message": "Hello", "language": "en"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv-9",
            "language": "en",
            "messages": [
                {"role": "user", "content": "Hello", "timestamp": "2025-03-01T10:00:00"},
                {"role": "assistant", "content": "Hi! How can I help with your money today?", "timestamp": "2025-03-01T10:00:01"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());
    let response = chat.start("Hello", Language::English).await.unwrap();

    assert_eq!(response.conversation_id, "conv-9");
    assert_eq!(chat.conversation_id(), Some("conv-9"));
    assert_eq!(chat.messages().len(), 2);
    assert_eq!(chat.language(), Language::English);

    chat.clear();
    assert!(!chat.is_started());
    assert!(chat.messages().is_empty());
}

#[tokio::test]
async fn test_load_history_replaces_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chatbot/conversation/conv-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv-3",
            "messages": [
                {"role": "user", "content": "Budget?", "timestamp": "2025-03-01T10:00:00"}
            ],
            "total_messages": 1
        })))
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());
    let history = chat.load_history("conv-3").await.unwrap();

    assert_eq!(history.total_messages, Some(1));
    assert_eq!(chat.conversation_id(), Some("conv-3"));
    assert_eq!(chat.messages()[0].content, "Budget?");
}

#[tokio::test]
async fn test_feedback_requires_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/feedback"))
        .and(body_partial_json(json!({"conversation_id": "conv-3", "message_id": "m-2", "rating": 4})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Feedback submitted successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chatbot/conversation/conv-3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"conversation_id": "conv-3", "messages": []})),
        )
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(ApiClient::new(server.uri()).unwrap());
    assert!(chat.submit_feedback("m-2", 4, None, true).await.unwrap().is_none());

    chat.load_history("conv-3").await.unwrap();
    let ack = chat
        .submit_feedback("m-2", 4, Some("Helpful".to_string()), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ack.message, "Feedback submitted successfully");
}
