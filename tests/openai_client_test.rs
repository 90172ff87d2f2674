//! OpenAI client tests against a local fake upstream served by warp

use futures::StreamExt;
use kb_relay::llm::openai::OpenAiClient;
use kb_relay::llm::{
    ChatMessage, ChatRole, FinishReason, GenerateRequest, GenerationConfig, LlmError, LlmProvider,
    Model, StreamEvent, UsageMetadata,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warp::http::StatusCode;
use warp::Filter;

/// Authorization header and JSON body of one upstream request
type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// Serve `reply` for `POST /v1/chat/completions` and return the base URL
fn fake_upstream<F, R>(reply: F) -> (String, Captured)
where
    F: Fn() -> R + Clone + Send + Sync + 'static,
    R: warp::Reply + 'static,
{
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    let route = warp::path!("v1" / "chat" / "completions")
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::json::<Value>())
        .map(move |auth: Option<String>, body: Value| {
            sink.lock().unwrap().push((auth, body));
            reply()
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    (format!("http://{}/v1", addr), captured)
}

fn request() -> GenerateRequest {
    GenerateRequest::new(
        vec![ChatMessage::system("Be brief."), ChatMessage::user("hi")],
        GenerationConfig::new(Model::Gpt4oMini).with_temperature(0.7),
    )
}

const SSE_BODY: &str = concat!(
    ": keep-alive\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4o-mini\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4o-mini\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"He\"},\"finish_reason\":null}]}\r\n\r\n",
    "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4o-mini\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"llo\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4o-mini\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}],\"usage\":{\"prompt_tokens\":9,\"completion_tokens\":2}}\n\n",
    "data: [DONE]\n\n",
);

#[tokio::test]
async fn test_stream_generate_over_http() {
    let (base_url, captured) =
        fake_upstream(|| warp::reply::with_header(SSE_BODY, "content-type", "text/event-stream"));
    let client = OpenAiClient::new("sk-test".to_string(), base_url).unwrap();

    let stream = client.stream_generate(request()).await.unwrap();
    let events: Vec<StreamEvent> = stream.map(|event| event.unwrap()).collect().await;

    assert_eq!(
        events,
        vec![
            StreamEvent::MessageStart {
                id: "chatcmpl-1".to_string(),
                model: "gpt-4o-mini".to_string(),
            },
            StreamEvent::ContentDelta {
                index: 0,
                text: String::new(),
            },
            StreamEvent::ContentDelta {
                index: 0,
                text: "He".to_string(),
            },
            StreamEvent::ContentDelta {
                index: 0,
                text: "llo".to_string(),
            },
            StreamEvent::MessageEnd {
                finish_reason: FinishReason::Stop,
                usage: Some(UsageMetadata::new(9, 2)),
            },
        ]
    );

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (auth, body) = &captured[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["stream"], true);
    assert_eq!(body["temperature"], json!(0.7));
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "Be brief."},
            {"role": "user", "content": "hi"}
        ])
    );
}

#[tokio::test]
async fn test_in_stream_error_envelope() {
    let body = concat!(
        "data: {\"id\":\"chatcmpl-2\",\"model\":\"gpt-4o-mini\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n",
        "data: {\"error\":{\"message\":\"The server is overloaded\",\"type\":\"server_error\",\"code\":null}}\n\n",
    );
    let (base_url, _) = fake_upstream(move || body);
    let client = OpenAiClient::new("sk-test".to_string(), base_url).unwrap();

    let events: Vec<StreamEvent> = client
        .stream_generate(request())
        .await
        .unwrap()
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(
        events[2],
        StreamEvent::Error {
            error: "server_error: The server is overloaded".to_string()
        }
    );
}

#[tokio::test]
async fn test_generate_over_http() {
    let (base_url, captured) = fake_upstream(|| {
        warp::reply::json(&json!({
            "id": "chatcmpl-3",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Paris"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1}
        }))
    });
    let client = OpenAiClient::new("sk-test".to_string(), base_url).unwrap();

    let completion = client.generate(request()).await.unwrap();

    assert_eq!(completion.role, ChatRole::Assistant);
    assert_eq!(completion.content.as_deref(), Some("Paris"));
    assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    assert_eq!(completion.usage, Some(UsageMetadata::new(12, 1)));
    assert_eq!(captured.lock().unwrap()[0].1["stream"], false);
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let (base_url, _) = fake_upstream(|| {
        warp::reply::with_header(
            warp::reply::with_status(
                warp::reply::json(&json!({
                    "error": {"message": "Slow down", "type": "requests", "code": "rate_limit_exceeded"}
                })),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            "retry-after",
            "7",
        )
    });
    let client = OpenAiClient::new("sk-test".to_string(), base_url).unwrap();

    match client.stream_generate(request()).await {
        Err(LlmError::RateLimitExceeded { retry_after }) => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        Err(other) => panic!("Expected rate limit error, got {:?}", other),
        Ok(_) => panic!("Expected rate limit error, got a stream"),
    }
}

#[tokio::test]
async fn test_unauthorized_uses_envelope_message() {
    let (base_url, _) = fake_upstream(|| {
        warp::reply::with_status(
            warp::reply::json(&json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error",
                    "code": "invalid_api_key"
                }
            })),
            StatusCode::UNAUTHORIZED,
        )
    });
    let client = OpenAiClient::new("sk-wrong".to_string(), base_url).unwrap();

    let err = client.generate(request()).await.unwrap_err();
    assert!(matches!(
        err,
        LlmError::AuthenticationError(ref message) if message == "Incorrect API key provided"
    ));
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let (base_url, _) = fake_upstream(|| {
        warp::reply::with_status("upstream exploded", StatusCode::BAD_GATEWAY)
    });
    let client = OpenAiClient::new("sk-test".to_string(), base_url).unwrap();

    let err = client.generate(request()).await.unwrap_err();
    match err {
        LlmError::HttpError { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("Expected HTTP error, got {:?}", other),
    }
}
