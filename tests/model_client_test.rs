use std::time::Duration;

use batch_answer::{Config, HttpModelClient, InvokeError, ModelClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        endpoint_url: format!("{}/v1/chat/completions", server.uri()),
        auth_token: "sk-test".to_string(),
        model_name: "Qwen3-4b".to_string(),
        system_prompt: "你是助手".to_string(),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn success_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_sends_expected_request_and_returns_content_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "Qwen3-4b",
            "messages": [
                { "role": "system", "content": "你是助手" },
                { "role": "user", "content": "1+1=?" }
            ],
            "extra_body": { "chat_template_kwargs": { "enable_thinking": true } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("\n答案 $\\boxed{2}$ ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&config_for(&server)).unwrap();
    let answer = client.invoke("1+1=?").await.unwrap();

    assert_eq!(answer, "\n答案 $\\boxed{2}$ ");
}

#[tokio::test]
async fn test_thinking_flag_follows_config() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "extra_body": { "chat_template_kwargs": { "enable_thinking": false } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        enable_thinking: false,
        ..config_for(&server)
    };
    let client = HttpModelClient::new(&config).unwrap();
    assert_eq!(client.invoke("q").await.unwrap(), "ok");
}

#[tokio::test]
async fn test_non_200_status_is_reported_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&config_for(&server)).unwrap();
    let err = client.invoke("q").await.unwrap_err();

    match err {
        InvokeError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model is loading");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_other_2xx_status_is_still_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_json(success_body("ok")))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&config_for(&server)).unwrap();
    let err = client.invoke("q").await.unwrap_err();
    assert!(matches!(err, InvokeError::Status { status: 202, .. }));
}

#[tokio::test]
async fn test_error_body_is_truncated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(5000)))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&config_for(&server)).unwrap();
    let err = client.invoke("q").await.unwrap_err();

    let InvokeError::Status { body, .. } = err else {
        panic!("expected status error");
    };
    assert!(body.chars().count() < 5000);
    assert!(body.starts_with("xxxx"));
}

#[tokio::test]
async fn test_malformed_json_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&config_for(&server)).unwrap();
    let err = client.invoke("q").await.unwrap_err();
    assert!(matches!(err, InvokeError::Malformed(_)));
}

#[tokio::test]
async fn test_missing_content_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&config_for(&server)).unwrap();
    let err = client.invoke("q").await.unwrap_err();
    assert!(matches!(err, InvokeError::MissingContent(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = Config {
        timeout_secs: 1,
        ..config_for(&server)
    };
    let client = HttpModelClient::new(&config).unwrap();
    let err = client.invoke("q").await.unwrap_err();
    assert!(matches!(err, InvokeError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_error() {
    // 先占用一个空闲端口再释放，之后没有任何进程监听它
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = Config {
        endpoint_url: format!("http://127.0.0.1:{port}/v1/chat/completions"),
        timeout_secs: 5,
        ..Default::default()
    };
    let client = HttpModelClient::new(&config).unwrap();
    let err = client.invoke("q").await.unwrap_err();
    assert!(matches!(err, InvokeError::Transport(_)), "got {err:?}");
}
