//! Integration tests for the Telegram notifier.

use review_watch::{Config, Credentials, Disposition, Notifier, TelegramNotifier, WatchError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notifier(server: &MockServer) -> TelegramNotifier {
    let config = Config {
        telegram_api_url: server.uri(),
        request_timeout_secs: 5,
        ..Config::default()
    };
    let credentials = Credentials {
        practicum_token: "p-token".to_string(),
        telegram_token: "123abc".to_string(),
        chat_id: "-1001".to_string(),
    };
    TelegramNotifier::new(&config, &credentials).expect("Failed to build notifier")
}

#[tokio::test]
async fn test_send_posts_chat_id_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123abc/sendMessage"))
        .and(body_json(json!({"chat_id": "-1001", "text": "привет"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .send("привет")
        .await
        .expect("Send should succeed");
}

#[tokio::test]
async fn test_rejected_message_is_suppressed_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let err = notifier(&server)
        .send("hello")
        .await
        .expect_err("Send should fail");

    assert!(matches!(err, WatchError::Delivery { .. }));
    assert!(err.to_string().contains("chat not found"));
    assert_eq!(err.disposition(), Disposition::Suppressed);
}

#[tokio::test]
async fn test_non_json_reply_is_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = notifier(&server)
        .send("hello")
        .await
        .expect_err("Send should fail");

    assert!(matches!(err, WatchError::Delivery { .. }));
    assert!(!err.to_string().contains("123abc"));
}
