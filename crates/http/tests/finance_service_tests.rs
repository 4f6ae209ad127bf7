//! Finance records against a mock Kipesa API

use kipesa_http::types::{ExpenseCreate, IncomeSourceCreate};
use kipesa_http::{ApiClient, FinanceService, Session};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> FinanceService {
    let client = ApiClient::builder()
        .base_url(server.uri())
        .session(Session::with_token("abc"))
        .build()
        .unwrap();
    FinanceService::new(client)
}

fn salary() -> IncomeSourceCreate {
    IncomeSourceCreate {
        name: "Salary".to_string(),
        amount: 45000.0,
        frequency: Some("monthly".to_string()),
        description: None,
    }
}

#[tokio::test]
async fn test_fetch_stores_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/finance/budgets"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "amount": 8000.0, "category": "food", "period": "monthly"},
            {"id": 2, "amount": 3000.0, "category": "transport", "period": "monthly"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let finance = service_for(&server);
    let budgets = finance.fetch_budgets().await.unwrap();

    assert_eq!(budgets.len(), 2);
    assert_eq!(finance.budgets(), budgets);
    assert!(finance.expenses().is_empty());
    assert!(finance.last_error().is_none());
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/finance/savings-goals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "target_amount": 100000.0, "target_date": "2025-12-31"}
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance/savings-goals"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let finance = service_for(&server);
    finance.fetch_savings_goals().await.unwrap();

    let err = finance.fetch_savings_goals().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(finance.last_error().as_deref(), Some("Failed to fetch savings goals"));
    assert_eq!(finance.savings_goals().len(), 1);
    assert_eq!(finance.savings_goals()[0].id, 5);
}

#[tokio::test]
async fn test_fetch_failure_reports_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/finance/expenses"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})),
        )
        .mount(&server)
        .await;

    let finance = service_for(&server);

    assert!(finance.fetch_expenses().await.is_err());
    assert_eq!(finance.last_error().as_deref(), Some("Not authenticated"));
}

#[tokio::test]
async fn test_create_refreshes_listing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/finance/income-sources"))
        .and(body_partial_json(json!({"name": "Salary", "amount": 45000.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "name": "Salary", "amount": 45000.0, "frequency": "monthly"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance/income-sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "name": "Shop", "amount": 12000.0},
            {"id": 3, "name": "Salary", "amount": 45000.0, "frequency": "monthly"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let finance = service_for(&server);
    let created = finance.create_income_source(&salary()).await.unwrap();

    assert_eq!(created.id, 3);
    assert_eq!(finance.income_sources().len(), 2);
    assert!(finance.income_sources().contains(&created));
    assert!(finance.last_error().is_none());
}

#[tokio::test]
async fn test_create_succeeds_when_refresh_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/finance/expenses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "amount": 250.0, "category": "food", "date": "2025-03-04"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance/expenses"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let finance = service_for(&server);
    let expense = ExpenseCreate {
        amount: 250.0,
        category: "food".to_string(),
        description: None,
        date: "2025-03-04".to_string(),
    };

    let created = finance.create_expense(&expense).await.unwrap();
    assert_eq!(created.id, 9);
    assert_eq!(finance.last_error().as_deref(), Some("Failed to fetch expenses"));
}

#[tokio::test]
async fn test_failed_create_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/finance/income-sources"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;

    let finance = service_for(&server);

    assert!(finance.create_income_source(&salary()).await.is_err());
    assert_eq!(finance.last_error().as_deref(), Some("Failed to create income source"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}
