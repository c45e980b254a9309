//! End-to-end orchestration against loopback stub servers.

use merkabah_core::BackendId;
use merkabah_runtime::{
    ApiCredential, Backend, BackendDescriptor, BackendError, BackendReply, CredentialSource,
    HttpBackend, Orchestrator, OrchestratorConfig,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Read one full HTTP request, headers and body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&request);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&request).into_owned()
}

/// Serve one canned HTTP response and hand back the raw request.
async fn stub_server(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(request);
    });

    (format!("http://{addr}"), rx)
}

/// Send response headers promising more body than ever arrives, then stall.
async fn stalling_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1000\r\n\r\n{\"response\":")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    format!("http://{addr}")
}

fn key(value: &str) -> ApiCredential {
    ApiCredential::new(value, CredentialSource::Programmatic, "test key")
}

#[tokio::test]
async fn test_openai_dialect_round_trip() {
    let (url, request) = stub_server(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"Harmony is balance."}}]}"#,
    )
    .await;

    let orchestrator = Orchestrator::new([BackendDescriptor::new(BackendId::OpenAi)
        .with_endpoint(format!("{url}/v1/chat/completions"))
        .with_credential(key("sk-test"))]);

    let result = orchestrator.orchestrate("What is harmony?", None).await;
    assert_eq!(
        result.responses[&BackendId::OpenAi],
        BackendReply::Ok("Harmony is balance.".to_string())
    );

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
    assert!(request.contains(r#""content":"What is harmony?""#));
}

#[tokio::test]
async fn test_anthropic_dialect_sends_version_header() {
    let (url, request) = stub_server(
        "200 OK",
        r#"{"content":[{"type":"text","text":"Judged."}]}"#,
    )
    .await;

    let orchestrator = Orchestrator::new([BackendDescriptor::new(BackendId::Anthropic)
        .with_endpoint(format!("{url}/v1/messages"))
        .with_credential(key("ak-test"))]);

    let result = orchestrator.orchestrate("hi", None).await;
    assert_eq!(result.responses[&BackendId::Anthropic], BackendReply::Ok("Judged.".into()));

    let request = request.await.unwrap().to_lowercase();
    assert!(request.contains("x-api-key: ak-test"));
    assert!(request.contains("anthropic-version: 2023-06-01"));
    assert!(request.contains(r#""max_tokens":1024"#));
}

#[tokio::test]
async fn test_ollama_needs_no_credential_and_disables_streaming() {
    let (url, request) = stub_server("200 OK", r#"{"response":"Served.","done":true}"#).await;

    let orchestrator = Orchestrator::new([
        BackendDescriptor::new(BackendId::Ollama).with_endpoint(format!("{url}/api/generate"))
    ]);

    let result = orchestrator.orchestrate("hi", None).await;
    assert_eq!(result.responses[&BackendId::Ollama], BackendReply::Ok("Served.".into()));

    let request = request.await.unwrap();
    assert!(!request.to_lowercase().contains("authorization:"));
    assert!(request.contains(r#""stream":false"#));
}

#[tokio::test]
async fn test_non_success_status_is_remote_error() {
    let (url, _request) = stub_server("503 Service Unavailable", r#"{"error":"busy"}"#).await;

    let orchestrator = Orchestrator::new([BackendDescriptor::new(BackendId::DeepSeek)
        .with_endpoint(url)
        .with_credential(key("ds-test"))]);

    let result = orchestrator.orchestrate("hi", None).await;
    assert_eq!(
        result.responses[&BackendId::DeepSeek],
        BackendReply::Error(BackendError::RemoteError { backend: BackendId::DeepSeek, code: 503 })
    );
}

#[tokio::test]
async fn test_unexpected_body_is_malformed() {
    let (url, _request) = stub_server("200 OK", r#"{"choices":[]}"#).await;

    let orchestrator = Orchestrator::new([BackendDescriptor::new(BackendId::OpenAi)
        .with_endpoint(url)
        .with_credential(key("sk-test"))]);

    let result = orchestrator.orchestrate("hi", None).await;
    assert!(matches!(
        result.responses[&BackendId::OpenAi],
        BackendReply::Error(BackendError::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_mixed_round_from_config_never_fails_as_a_whole() {
    let (url, _request) = stub_server("200 OK", r#"{"response":"local answer"}"#).await;
    let yaml = format!(
        "backends:\n  ollama:\n    endpoint: {url}/api/generate\n    timeout: 5s\n  \
         anthropic:\n    enabled: false\n  deepseek:\n    enabled: false\n"
    );

    let config = OrchestratorConfig::from_yaml(&yaml).unwrap();
    let descriptors = config.resolve(|_| None);
    let orchestrator = Orchestrator::new(descriptors);
    assert_eq!(orchestrator.configured(), vec![BackendId::OpenAi, BackendId::Ollama]);

    let result = orchestrator.orchestrate("hi", None).await;
    assert_eq!(result.responses.len(), 2);
    assert_eq!(
        result.responses[&BackendId::OpenAi],
        BackendReply::Error(BackendError::MissingCredential { backend: BackendId::OpenAi })
    );
    assert_eq!(result.responses[&BackendId::Ollama], BackendReply::Ok("local answer".into()));
    assert!(result.harmony > 0.0 && result.harmony < 1.0);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["responses"]["openai"]["kind"], "missing_credential");
    assert_eq!(json["responses"]["ollama"]["text"], "local answer");
}

#[tokio::test]
async fn test_stalled_body_reports_timeout() {
    let url = stalling_server().await;
    let backend = HttpBackend::new(
        BackendDescriptor::new(BackendId::Ollama)
            .with_endpoint(format!("{url}/api/generate"))
            .with_timeout(Duration::from_millis(200)),
    );

    match backend.query("hi").await {
        Err(BackendError::Unreachable { backend: BackendId::Ollama, detail }) => {
            assert!(detail.starts_with("timed out after"), "{detail}");
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reconfigured_backend_reaches_new_endpoint() {
    let (url, request) = stub_server(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"moved"}}]}"#,
    )
    .await;

    let orchestrator = Orchestrator::new([BackendDescriptor::new(BackendId::DeepSeek)
        .with_endpoint("http://127.0.0.1:9/")
        .with_credential(key("ds-old"))]);
    orchestrator.configure_backend(
        BackendDescriptor::new(BackendId::DeepSeek)
            .with_endpoint(format!("{url}/chat/completions"))
            .with_credential(key("ds-new")),
    );

    let result = orchestrator.orchestrate("hi", None).await;
    assert_eq!(result.responses[&BackendId::DeepSeek], BackendReply::Ok("moved".into()));

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /chat/completions"));
    assert!(request.to_lowercase().contains("authorization: bearer ds-new"));
}

#[tokio::test]
async fn test_synthesis_report_covers_every_backend() {
    let (url, _request) = stub_server("200 OK", r#"{"response":"short"}"#).await;
    let orchestrator = Orchestrator::new([BackendDescriptor::new(BackendId::Ollama)
        .with_endpoint(url)
        .with_timeout(Duration::from_secs(5))]);

    let report = orchestrator.synthesize("hi").await;
    assert!(report.contains("[ollama - Servant]: short..."));
    assert!(report.contains("[openai - Witness]: N/A..."));
    assert!(report.contains("Harmony Score: 0.005"));
}
