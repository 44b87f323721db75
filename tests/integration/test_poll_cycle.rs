//! End-to-end poll cycle tests.
//!
//! Drive the real review API client and Telegram notifier against mocked
//! HTTP servers and check what reaches the chat.

use std::time::Duration;

use review_watch::{
    ApiClient, Config, Credentials, CycleOutcome, PollLoop, TelegramNotifier, ALERT_PREFIX,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APPROVED_TEXT: &str = "Изменился статус проверки работы \"hw1\". Работа проверена: ревьюеру всё понравилось. Ура!";

fn credentials() -> Credentials {
    Credentials {
        practicum_token: "p-token".to_string(),
        telegram_token: "123abc".to_string(),
        chat_id: "42".to_string(),
    }
}

/// Builds a loop pointed at the two mock servers, starting at window 500.
fn poll_loop(api: &MockServer, chat: &MockServer) -> PollLoop<ApiClient, TelegramNotifier> {
    let config = Config {
        endpoint: format!("{}/api/user_api/homework_statuses/", api.uri()),
        telegram_api_url: chat.uri(),
        request_timeout_secs: 5,
        ..Config::default()
    }
    .with_retry_period(Duration::from_millis(10));

    let source = ApiClient::new(&config, &credentials()).expect("Failed to build API client");
    let notifier =
        TelegramNotifier::new(&config, &credentials()).expect("Failed to build notifier");
    PollLoop::with_window(source, notifier, config.retry_period, 500)
}

async fn mount_api_reply(api: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/user_api/homework_statuses/"))
        .and(header("Authorization", "OAuth p-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(api)
        .await;
}

fn telegram_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 1}}))
}

#[tokio::test]
async fn test_approved_homework_reaches_chat() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user_api/homework_statuses/"))
        .and(query_param("from_date", "500"))
        .and(header("Authorization", "OAuth p-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 1000
        })))
        .expect(1)
        .mount(&api)
        .await;

    Mock::given(method("POST"))
        .and(path("/bot123abc/sendMessage"))
        .and(body_json(json!({"chat_id": "42", "text": APPROVED_TEXT})))
        .respond_with(telegram_ok())
        .expect(1)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);
    let outcome = poll.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Notified {
            text: APPROVED_TEXT.to_string()
        }
    );
    assert_eq!(poll.window(), 1000);
}

#[tokio::test]
async fn test_unchanged_status_is_sent_once() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    mount_api_reply(
        &api,
        json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 1000
        }),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/bot123abc/sendMessage"))
        .respond_with(telegram_ok())
        .expect(1)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);
    poll.run_cycle().await;
    let second = poll.run_cycle().await;

    assert_eq!(second, CycleOutcome::Unchanged);

    let requests = api
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert_eq!(requests.len(), 2);
    assert!(requests[1].url.query().unwrap_or_default().contains("from_date=1000"));
}

#[tokio::test]
async fn test_empty_homeworks_sends_nothing() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    mount_api_reply(&api, json!({"homeworks": [], "current_date": 1000})).await;
    Mock::given(method("POST"))
        .respond_with(telegram_ok())
        .expect(0)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);

    assert_eq!(poll.run_cycle().await, CycleOutcome::NoUpdates);
    assert_eq!(poll.window(), 1000);
}

#[tokio::test]
async fn test_empty_response_is_only_logged() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    mount_api_reply(&api, json!({})).await;
    Mock::given(method("POST"))
        .respond_with(telegram_ok())
        .expect(0)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);

    assert!(matches!(
        poll.run_cycle().await,
        CycleOutcome::Suppressed { .. }
    ));
}

#[tokio::test]
async fn test_server_error_alerts_once_with_request_details() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123abc/sendMessage"))
        .respond_with(telegram_ok())
        .expect(1)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);
    let first = poll.run_cycle().await;
    let second = poll.run_cycle().await;

    match first {
        CycleOutcome::Alerted { message } => {
            assert!(message.starts_with(ALERT_PREFIX));
            assert!(message.contains("/api/user_api/homework_statuses/"));
            assert!(message.contains("from_date=500"));
            assert!(message.contains("500"));
            assert!(!message.contains("p-token"));
        }
        other => unreachable!("expected an alert, got {other:?}"),
    }
    assert!(matches!(second, CycleOutcome::AlertSkipped { .. }));
    assert_eq!(poll.window(), 500);
}

#[tokio::test]
async fn test_error_bodies_do_not_break_alert_dedup() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(5000)))
        .up_to_n_times(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("request-id 2"))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123abc/sendMessage"))
        .respond_with(telegram_ok())
        .expect(1)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);
    let first = poll.run_cycle().await;
    let second = poll.run_cycle().await;

    match first {
        CycleOutcome::Alerted { message } => {
            assert!(message.chars().count() < 4096);
            assert!(!message.contains("xxxx"));
        }
        other => unreachable!("expected an alert, got {other:?}"),
    }
    assert!(matches!(second, CycleOutcome::AlertSkipped { .. }));
}

#[tokio::test]
async fn test_unknown_status_alert_names_status() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    mount_api_reply(
        &api,
        json!({
            "homeworks": [{"homework_name": "hw1", "status": "lost"}],
            "current_date": 1000
        }),
    )
    .await;
    Mock::given(method("POST"))
        .respond_with(telegram_ok())
        .expect(1)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);
    let outcome = poll.run_cycle().await;

    assert!(matches!(
        outcome,
        CycleOutcome::Alerted { ref message } if message.contains("'lost'")
    ));
}

#[tokio::test]
async fn test_run_until_shutdown() {
    let api = MockServer::start().await;
    let chat = MockServer::start().await;

    mount_api_reply(
        &api,
        json!({
            "homeworks": [{"homework_name": "hw1", "status": "reviewing"}],
            "current_date": 1000
        }),
    )
    .await;
    Mock::given(method("POST"))
        .respond_with(telegram_ok())
        .expect(1)
        .mount(&chat)
        .await;

    let mut poll = poll_loop(&api, &chat);
    poll.run(tokio::time::sleep(Duration::from_millis(200)))
        .await;

    let requests = api
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert!(requests.len() >= 2);
}
