use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::post,
};
use serde_json::{Value, json};
use wanderwise_chat::ChatError;
use wanderwise_chat::config::EndpointConfig;
use wanderwise_chat::protocol::ChatRequest;
use wanderwise_chat::transport::{ChatTransport, DEFAULT_TIMEOUT_SECS, HttpChatTransport};
use wanderwise_chat::widget::{BubbleKind, ChatContainer, ChatWidget, TextInput};

/// Requests seen by the mock backend: content type and JSON body.
type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn spawn_backend(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{addr}"))
}

async fn travel_assistant(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((content_type, body.clone()));

    let message = body["message"].as_str().unwrap_or_default().trim().to_string();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "reply": "Please enter a message." })),
        );
    }
    let reply = if message == "Hello" {
        "Hi there".to_string()
    } else {
        format!("You asked about {message}")
    };
    (StatusCode::OK, Json(json!({ "reply": reply })))
}

fn assistant_app(seen: Seen) -> Router {
    Router::new()
        .route("/chat", post(travel_assistant))
        .with_state(seen)
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
    }
}

#[tokio::test]
async fn test_posts_json_and_decodes_reply() -> anyhow::Result<()> {
    let seen = Seen::default();
    let base = spawn_backend(assistant_app(Arc::clone(&seen))).await?;
    let transport = HttpChatTransport::new(&base)?;

    let response = transport.send(&request("Hello")).await?;
    assert_eq!(response.reply, "Hi there");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("application/json"));
    assert_eq!(seen[0].1, json!({ "message": "Hello" }));
    Ok(())
}

#[tokio::test]
async fn test_error_status_with_reply_is_returned() -> anyhow::Result<()> {
    let base = spawn_backend(assistant_app(Seen::default())).await?;
    let transport = HttpChatTransport::new(&base)?;

    // Bypass input trimming to exercise the backend's 400 path.
    let response = transport.send(&request("   ")).await?;
    assert_eq!(response.reply, "Please enter a message.");
    Ok(())
}

#[tokio::test]
async fn test_error_status_without_reply() -> anyhow::Result<()> {
    let app = Router::new().route(
        "/chat",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let base = spawn_backend(app).await?;
    let transport = HttpChatTransport::new(&base)?;

    match transport.send(&request("Hello")).await {
        Err(ChatError::Api { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "<html>bad gateway</html>");
        }
        other => panic!("expected API error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_success_with_malformed_body() -> anyhow::Result<()> {
    let app = Router::new()
        .route("/chat", post(|| async { "not json" }))
        .route(
            "/missing",
            post(|| async { Json(json!({ "answer": "wrong field" })) }),
        );
    let base = spawn_backend(app).await?;

    let transport = HttpChatTransport::new(&base)?;
    let err = transport.send(&request("Hello")).await.unwrap_err();
    assert!(matches!(err, ChatError::Decode(_)));

    let transport = HttpChatTransport::with_client(&base, "/missing", reqwest::Client::new())?;
    let err = transport.send(&request("Hello")).await.unwrap_err();
    assert!(matches!(err, ChatError::Decode(_)));
    Ok(())
}

#[tokio::test]
async fn test_connection_refused() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let transport = HttpChatTransport::new(format!("http://{addr}"))?;
    let err = transport.send(&request("Hello")).await.unwrap_err();
    assert!(matches!(err, ChatError::Http(_)));
    Ok(())
}

#[tokio::test]
async fn test_timeout_from_config() -> anyhow::Result<()> {
    let app = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "reply": "too late" }))
        }),
    );
    let base = spawn_backend(app).await?;
    let transport = HttpChatTransport::from_config(&EndpointConfig {
        base_url: base,
        chat_path: "/chat".to_string(),
        timeout_secs: 1,
    })?;

    match transport.send(&request("Hello")).await {
        Err(ChatError::Http(err)) => assert!(err.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_default_client_times_out() -> anyhow::Result<()> {
    let app = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Json(json!({ "reply": "an hour later" }))
        }),
    );
    let base = spawn_backend(app).await?;
    let transport = HttpChatTransport::new(&base)?;

    let started = tokio::time::Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(DEFAULT_TIMEOUT_SECS + 5),
        transport.send(&request("Hello")),
    )
    .await
    .expect("default timeout should end the request");

    match result {
        Err(ChatError::Http(err)) => assert!(err.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    Ok(())
}

#[tokio::test]
async fn test_widget_over_http() -> anyhow::Result<()> {
    let seen = Seen::default();
    let base = spawn_backend(assistant_app(Arc::clone(&seen))).await?;

    let container = ChatContainer::new();
    let input = TextInput::new();
    let widget = ChatWidget::new(container.clone(), input.clone(), HttpChatTransport::new(&base)?);

    input.set_value("  Hello  ");
    let reply = widget.send_current_message().await?.expect("message was sent");

    let bubbles = container.bubbles();
    assert_eq!(bubbles.len(), 2);
    assert_eq!(bubbles[0].text, "Hello");
    assert!(bubbles[0].is_user());
    assert_eq!(bubbles[1].id, reply);
    assert_eq!(bubbles[1].text, "Hi there");
    assert_eq!(bubbles[1].kind, BubbleKind::Message);
    assert_eq!(seen.lock().unwrap()[0].1, json!({ "message": "Hello" }));
    Ok(())
}

#[tokio::test]
async fn test_widget_over_http_backend_down() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let container = ChatContainer::new();
    let input = TextInput::new();
    let widget = ChatWidget::new(
        container.clone(),
        input.clone(),
        HttpChatTransport::new(format!("http://{addr}"))?,
    );

    input.set_value("Hello");
    assert!(widget.send_current_message().await.is_err());
    assert_eq!(container.last().map(|b| b.kind), Some(BubbleKind::Error));
    assert_eq!(input.value(), "");
    Ok(())
}
