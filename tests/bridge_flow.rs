//! End-to-end request cycles through a real WebSocket backend.

use std::time::Duration;

use axum::http::StatusCode;
use ws_bridge::config::UnsolicitedPolicy;

mod common;

#[tokio::test]
async fn test_sequential_requests_answered_in_order() {
    let backend = common::start_echo_backend(Duration::ZERO).await;
    let bridge = common::start_bridge(backend, |_| {}).await;
    let client = common::http_client();

    for i in 0..10 {
        let payload = format!("request-{}", i);
        // Method and path are irrelevant to the bridge
        let res = match i % 3 {
            0 => client.post(format!("{}/", bridge.base_url)),
            1 => client.put(format!("{}/some/path", bridge.base_url)),
            _ => client.patch(format!("{}/other?query=1", bridge.base_url)),
        }
        .body(payload.clone())
        .send()
        .await
        .expect("bridge unreachable");

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        assert_eq!(res.text().await.unwrap(), payload);
    }

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_requests_not_cross_wired() {
    let backend = common::start_echo_backend(Duration::from_millis(100)).await;
    let bridge = common::start_bridge(backend, |_| {}).await;
    let client = common::http_client();

    let mut handles = Vec::new();
    for i in 0..4 {
        let client = client.clone();
        let url = format!("{}/", bridge.base_url);
        handles.push(tokio::spawn(async move {
            let payload = format!("concurrent-{}", i);
            let res = client.post(url).body(payload.clone()).send().await.unwrap();
            (payload, res.status(), res.text().await.unwrap())
        }));
    }

    for handle in handles {
        let (payload, status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, payload, "each caller must get its own reply");
    }

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_body_is_percent_decoded() {
    let backend = common::start_echo_backend(Duration::ZERO).await;
    let bridge = common::start_bridge(backend, |_| {}).await;
    let client = common::http_client();

    let res = client
        .post(format!("{}/", bridge.base_url))
        .body("hello%20world")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "hello world");

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let mut backend = common::start_scripted_backend().await;
    let bridge = common::start_bridge(backend.addr, |_| {}).await;
    let client = common::http_client();

    let res = client
        .post(format!("{}/", bridge.base_url))
        .body("50%zz")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The session is unaffected
    let pending = tokio::spawn({
        let client = client.clone();
        let url = format!("{}/", bridge.base_url);
        async move { client.post(url).body("ok").send().await.unwrap().text().await.unwrap() }
    });
    assert_eq!(backend.next_received().await, "ok");
    backend.send("fine");
    assert_eq!(pending.await.unwrap(), "fine");

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_handshake_headers_forwarded() {
    let (backend, headers) = common::start_header_capture_backend().await;
    let bridge = common::start_bridge(backend, |config| {
        config.upstream.headers = vec![
            "Authorization: Bearer secret".to_string(),
            "X-Client: ws-bridge".to_string(),
        ];
    })
    .await;

    let headers = tokio::time::timeout(Duration::from_secs(2), headers)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(headers["authorization"], "Bearer secret");
    assert_eq!(headers["x-client"], "ws-bridge");

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_unsolicited_message_dropped() {
    let mut backend = common::start_scripted_backend().await;
    let bridge = common::start_bridge(backend.addr, |config| {
        config.bridge.unsolicited = UnsolicitedPolicy::Drop;
    })
    .await;
    let client = common::http_client();

    backend.send("unsolicited");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let pending = tokio::spawn({
        let url = format!("{}/", bridge.base_url);
        async move { client.post(url).body("ping").send().await.unwrap().text().await.unwrap() }
    });
    assert_eq!(backend.next_received().await, "ping");
    backend.send("pong");

    assert_eq!(pending.await.unwrap(), "pong");

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_burst_of_unsolicited_messages_dropped() {
    let mut backend = common::start_scripted_backend().await;
    let bridge = common::start_bridge(backend.addr, |_| {}).await;
    let client = common::http_client();

    // More than the slot can hold, so the reader must keep discarding
    for i in 1..=5 {
        backend.send(&format!("u{}", i));
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    for round in ["ping", "again"] {
        let pending = tokio::spawn({
            let client = client.clone();
            let url = format!("{}/", bridge.base_url);
            async move { client.post(url).body(round).send().await.unwrap().text().await.unwrap() }
        });
        assert_eq!(backend.next_received().await, round);
        backend.send(&format!("{}-reply", round));
        assert_eq!(pending.await.unwrap(), format!("{}-reply", round));
    }

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn test_unsolicited_message_delivered_to_next_cycle() {
    let mut backend = common::start_scripted_backend().await;
    let bridge = common::start_bridge(backend.addr, |config| {
        config.bridge.unsolicited = UnsolicitedPolicy::Deliver;
    })
    .await;
    let client = common::http_client();

    backend.send("unsolicited");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client
        .post(format!("{}/", bridge.base_url))
        .body("first")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "unsolicited");
    assert_eq!(backend.next_received().await, "first");

    // Delivered once: the next cycle waits for a fresh message
    let pending = tokio::spawn({
        let url = format!("{}/", bridge.base_url);
        async move { client.post(url).body("second").send().await.unwrap().text().await.unwrap() }
    });
    assert_eq!(backend.next_received().await, "second");
    backend.send("reply");
    assert_eq!(pending.await.unwrap(), "reply");

    bridge.shutdown.trigger();
}
