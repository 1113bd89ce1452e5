//! API integration tests
//!
//! Run against a live server with a bootstrap account configured:
//! `cargo test --test api_tests -- --ignored --test-threads=1`
//!
//! Run them one at a time: the logout test revokes every token of the
//! shared account.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

fn credentials() -> (String, String) {
    (
        std::env::var("VISITDESK_TEST_EMAIL").unwrap_or_else(|_| "staff@example.com".to_string()),
        std::env::var("VISITDESK_TEST_PASSWORD").unwrap_or_else(|_| "password123".to_string()),
    )
}

/// Helper to get a bearer token
async fn get_auth_token(client: &Client) -> String {
    let (email, password) = credentials();
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["data"]["token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

async fn register_visitor(client: &Client, token: &str, name: &str) -> Value {
    let response = client
        .post(format!("{}/visitors", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "full_name": name,
            "email": "integration@example.com",
            "phone_number": "1234567890",
            "purpose_of_visit": "Integration test",
            "expected_check_in_date": Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            "nationality": "Testland"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].clone()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Invalid credentials.");
}

#[tokio::test]
#[ignore]
async fn test_register_and_check_in() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let visitor = register_visitor(&client, &token, "Integration Visitor").await;
    let code = visitor["unique_code"].as_str().expect("No code").to_string();

    let response = client
        .post(format!("{}/visitors/check-in", BASE_URL))
        .json(&json!({ "unique_code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/visitors/check-in", BASE_URL))
        .json(&json!({ "unique_code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{}/visitors/{}", BASE_URL, visitor["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_list_visitors_pending_filter() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/visitors", BASE_URL))
        .query(&[("checked_in_at", "null"), ("per_page", "5")])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["pagination"]["per_page"], 5);
    for visitor in body["data"].as_array().expect("data array") {
        assert_eq!(visitor["status"], "pending");
    }
}

#[tokio::test]
#[ignore]
async fn test_logout_revokes_token() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/auth/logout", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_check_ins_single_success() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let visitor = register_visitor(&client, &token, "Concurrent Visitor").await;
    let code = visitor["unique_code"].as_str().expect("No code").to_string();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            let code = code.clone();
            tokio::spawn(async move {
                let response = client
                    .post(format!("{}/visitors/check-in", BASE_URL))
                    .json(&json!({ "unique_code": code }))
                    .send()
                    .await
                    .expect("Failed to send request");
                let status = response.status();
                let body: Value = response.json().await.expect("Failed to parse response");
                (status, body)
            })
        })
        .collect();

    let mut successes = 0;
    let mut already = 0;
    for handle in handles {
        let (status, body) = handle.await.expect("check-in task panicked");
        match status {
            StatusCode::OK => successes += 1,
            StatusCode::BAD_REQUEST => {
                assert_eq!(body["message"], "Already checked in.");
                already += 1;
            }
            other => panic!("unexpected status {}: {}", other, body),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(already, 7);

    let response = client
        .delete(format!("{}/visitors/{}", BASE_URL, visitor["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

async fn listed_ids(client: &Client, token: &str, params: &[(&str, &str)]) -> Vec<String> {
    let response = client
        .get(format!("{}/visitors", BASE_URL))
        .query(params)
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|v| v["id"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
#[ignore]
async fn test_check_in_date_filters() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let name = format!("Filter Visitor {}", Utc::now().timestamp_millis());
    let visitor = register_visitor(&client, &token, &name).await;
    let id = visitor["id"].as_str().expect("No id").to_string();
    let code = visitor["unique_code"].as_str().expect("No code").to_string();

    let response = client
        .post(format!("{}/visitors/check-in", BASE_URL))
        .json(&json!({ "unique_code": code }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    let on_day = listed_ids(&client, &token, &[("search", name.as_str()), ("checked_in_at", today.as_str())]).await;
    assert!(on_day.contains(&id));

    let in_range = listed_ids(
        &client,
        &token,
        &[
            ("search", name.as_str()),
            ("checked_in_start", today.as_str()),
            ("checked_in_end", today.as_str()),
        ],
    )
    .await;
    assert!(in_range.contains(&id));

    let pending = listed_ids(&client, &token, &[("search", name.as_str()), ("checked_in_at", "null")]).await;
    assert!(!pending.contains(&id));

    let response = client
        .delete(format!("{}/visitors/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}
