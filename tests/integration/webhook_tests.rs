use super::*;
use serde_json::json;
use torob_pricer::{AppError, ProductId, ResultForwarder, ResultMap};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn webhook(url: String) -> HttpWebhook {
    HttpWebhook::new(&WebhookConfig { url, request_timeout: 5 }).expect("client construction should not fail")
}

#[tokio::test]
async fn test_forward_posts_json_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/custom/v1/update_product_prices"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"7": 125000, "42": 99000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut results = ResultMap::new();
    results.insert(ProductId::new("7"), 125_000);
    results.insert(ProductId::new("42"), 99_000);

    webhook(format!("{}/wp-json/custom/v1/update_product_prices", server.uri()))
        .forward(&results)
        .await
        .expect("forward should succeed");
}

#[tokio::test]
async fn test_forward_sends_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    webhook(server.uri()).forward(&ResultMap::new()).await.expect("forward should succeed");
}

#[tokio::test]
async fn test_non_success_status_is_forwarding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = webhook(server.uri()).forward(&ResultMap::new()).await.unwrap_err();

    match err {
        AppError::Forwarding { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "nope");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_slow_webhook_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let slow = HttpWebhook::new(&WebhookConfig { url: server.uri(), request_timeout: 1 })
        .expect("client construction should not fail");

    let err = slow.forward(&ResultMap::new()).await.unwrap_err();

    assert!(matches!(err, AppError::Http(ref e) if e.is_timeout()), "unexpected error: {}", err);
}
