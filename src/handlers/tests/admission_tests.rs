use std::time::Duration;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{json, Value};

use super::{multipart, ok_script, peer, Harness, SECRET};

fn health(key: Option<&str>) -> TestRequest {
    let req = TestRequest::get().uri("/health").peer_addr(peer());
    match key {
        Some(key) => req.insert_header(("X-API-Key", key.to_string())),
        None => req,
    }
}

#[actix_web::test]
async fn test_health_is_repeatable() {
    let harness = Harness::new(Some(SECRET), ok_script());
    let app = test_app!(harness);

    for _ in 0..10 {
        let resp = test::call_service(&app, health(Some(SECRET)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}

#[actix_web::test]
async fn test_61st_request_is_throttled_on_any_endpoint() {
    let harness = Harness::new(Some(SECRET), ok_script());
    let app = test_app!(harness);

    for i in 0..60 {
        let req = if i % 2 == 0 {
            health(Some(SECRET)).to_request()
        } else {
            // Admitted, then refused by validation; still counts
            TestRequest::post()
                .uri("/transcribe")
                .peer_addr(peer())
                .insert_header(("X-API-Key", SECRET))
                .insert_header((CONTENT_TYPE, "application/json"))
                .set_payload("{}")
                .to_request()
        };
        let resp = test::call_service(&app, req).await;
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS, "request {}", i + 1);
    }

    let (header, body) = multipart("file", Some("clip.wav"), Some("audio/wav"), b"RIFF");
    let req = TestRequest::post()
        .uri("/transcribe-file")
        .peer_addr(peer())
        .insert_header(("X-API-Key", SECRET))
        .insert_header((CONTENT_TYPE, header))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Too Many Requests" }));

    // Throttled requests never reach the handler
    assert!(harness.engine.calls().is_empty());
    assert_eq!(harness.staged_files(), 0);

    let resp = test::call_service(&app, health(Some(SECRET)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    harness.clock.advance(Duration::from_secs(61));
    let resp = test::call_service(&app, health(Some(SECRET)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_wrong_key_is_unauthorized_and_counted() {
    let harness = Harness::new(Some(SECRET), ok_script());
    let app = test_app!(harness);

    let resp = test::call_service(&app, health(Some("wrong")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let limiter = harness.guard.limiter();
    assert_eq!(limiter.recorded("wrong|10.0.0.1"), 1);
    assert_eq!(limiter.recorded(&format!("{}|10.0.0.1", SECRET)), 0);
}

#[actix_web::test]
async fn test_missing_or_oversized_key_is_unauthorized() {
    let harness = Harness::new(Some(SECRET), ok_script());
    let app = test_app!(harness);

    let resp = test::call_service(&app, health(None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.guard.limiter().recorded("no-key|10.0.0.1"), 1);

    let long_key = "k".repeat(257);
    let resp = test::call_service(&app, health(Some(&long_key)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_unauthorized_upload_is_not_read() {
    let harness = Harness::new(Some(SECRET), ok_script());
    let app = test_app!(harness);

    let (header, body) = multipart("file", Some("clip.wav"), Some("audio/wav"), b"RIFF");
    let req = TestRequest::post()
        .uri("/transcribe-file")
        .peer_addr(peer())
        .insert_header(("X-API-Key", "wrong"))
        .insert_header((CONTENT_TYPE, header))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.engine.calls().is_empty());
    assert_eq!(harness.staged_files(), 0);
}

#[actix_web::test]
async fn test_open_gateway_limits_per_origin() {
    let harness = Harness::with_limits(None, ok_script(), 2, 1024);
    let app = test_app!(harness);

    for _ in 0..2 {
        let resp = test::call_service(&app, health(None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = test::call_service(&app, health(Some("ignored")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = TestRequest::get()
        .uri("/health")
        .peer_addr("10.0.0.2:5000".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, other).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
