//! Backup endpoint integration tests.

mod common;

use std::path::PathBuf;

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use serde_json::Value;

use backup_hook_core::{sign, BackupResponse, ErrorResponse, Secret};
use common::{test_config, SpyOutcome, TestHarness, TEST_SCRIPT, TEST_SECRET};

const FOO_BAR: &[u8] = br#"{"args":["foo","bar"]}"#;

#[tokio::test]
async fn signed_request_runs_script_with_args_in_order() {
    let harness = TestHarness::new();

    let response = harness.signed_post(FOO_BAR).await;

    response.assert_status_ok();
    let body: BackupResponse = response.json();
    assert_eq!(body.message, "Backup initiated successfully");
    assert_eq!(body.output, "backup complete\n");

    let calls = harness.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, PathBuf::from(TEST_SCRIPT));
    assert_eq!(calls[0].1, vec!["foo", "bar"]);
}

#[tokio::test]
async fn empty_body_runs_script_without_args() {
    let harness = TestHarness::new();

    let response = harness.signed_post(b"").await;

    response.assert_status_ok();
    let calls = harness.runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.is_empty());
}

#[tokio::test]
async fn absent_args_field_runs_script_without_args() {
    let harness = TestHarness::new();

    let response = harness.signed_post(b"{}").await;

    response.assert_status_ok();
    assert_eq!(harness.runner.calls()[0].1, Vec::<String>::new());
}

#[tokio::test]
async fn signature_over_reserialized_body_is_rejected() {
    let harness = TestHarness::new();
    let reformatted = br#"{ "args": [ "foo", "bar" ] }"#;
    let signature = sign(reformatted, &Secret::from(TEST_SECRET));

    let response = harness.post_with_signature(FOO_BAR, &signature).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Invalid signature");
    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn wrong_method_is_rejected_even_with_valid_signature() {
    let harness = TestHarness::new();
    let signature = sign(FOO_BAR, &Secret::from(TEST_SECRET));

    let requests = [
        harness.server.get("/backup"),
        harness.server.put("/backup").bytes(Bytes::from_static(FOO_BAR)),
        harness.server.delete("/backup"),
        harness.server.patch("/backup").bytes(Bytes::from_static(FOO_BAR)),
    ];

    for request in requests {
        let response = request
            .add_header(
                common::signature_header(),
                signature.parse::<axum::http::HeaderValue>().expect("valid header value"),
            )
            .await;

        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "Method not allowed");
    }

    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn wrong_method_without_signature_is_still_405() {
    let harness = TestHarness::new();

    let response = harness.server.get("/backup").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/backup")
        .bytes(Bytes::from_static(FOO_BAR))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Missing signature");
    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn empty_signature_counts_as_missing() {
    let harness = TestHarness::new();

    let response = harness.post_with_signature(FOO_BAR, "").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Missing signature");
}

#[tokio::test]
async fn non_hex_signature_is_invalid() {
    let harness = TestHarness::new();

    let response = harness
        .post_with_signature(FOO_BAR, "sha256=definitely-not-hex")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Invalid signature");
    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn signature_from_other_secret_is_invalid() {
    let harness = TestHarness::new();
    let signature = sign(FOO_BAR, &Secret::from("someone-else"));

    let response = harness.post_with_signature(FOO_BAR, &signature).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn unprefixed_signature_is_accepted() {
    let harness = TestHarness::new();
    let signature = sign(FOO_BAR, &Secret::from(TEST_SECRET));
    let bare = signature.trim_start_matches("sha256=");

    let response = harness.post_with_signature(FOO_BAR, bare).await;

    response.assert_status_ok();
    assert_eq!(harness.runner.call_count(), 1);
}

#[tokio::test]
async fn malformed_json_is_rejected_and_script_never_runs() {
    let harness = TestHarness::new();

    for body in [
        &b"{\"args\": [\"foo\""[..],
        b"not json",
        br#"{"args":"foo"}"#,
        br#"{"args":[1,2,3]}"#,
    ] {
        let response = harness.signed_post(body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.error, "Invalid JSON in request body");
    }

    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn nul_byte_argument_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .signed_post(br#"{"args":["foo","b\u0000r"]}"#)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn script_failure_returns_500_without_output() {
    let harness = TestHarness::with_outcome(SpyOutcome::Fail {
        exit_code: 2,
        output: "tar: /srv/private/db.sql: Permission denied",
    });

    let response = harness.signed_post(FOO_BAR).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body, serde_json::json!({ "error": "Backup script failed" }));
    assert_eq!(harness.runner.call_count(), 1);
}

#[tokio::test]
async fn oversized_body_is_rejected_before_verification() {
    let mut config = test_config();
    config.max_body_bytes = 64;
    let harness = TestHarness::with_config(config, SpyOutcome::Succeed(""));

    let args: Vec<String> = (0..50).map(|i| format!("arg-{i}")).collect();
    let body = serde_json::to_vec(&serde_json::json!({ "args": args })).unwrap();

    let response = harness.signed_post(&body).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "Request body too large");
    assert_eq!(harness.runner.call_count(), 0);
}

#[tokio::test]
async fn error_bodies_carry_only_the_error_field() {
    let harness = TestHarness::new();

    let response = harness.post_with_signature(FOO_BAR, "sha256=00").await;

    let body: Value = response.json();
    let object = body.as_object().expect("error body is an object");
    assert_eq!(object.len(), 1);
    assert!(object.contains_key("error"));
    assert!(!body.to_string().contains(TEST_SECRET));
}

#[tokio::test]
async fn each_request_runs_independently() {
    let harness = TestHarness::new();

    harness
        .signed_post(br#"{"args":["first"]}"#)
        .await
        .assert_status_ok();
    harness
        .signed_post(br#"{"args":["second","run"]}"#)
        .await
        .assert_status_ok();

    let calls = harness.runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, vec!["first"]);
    assert_eq!(calls[1].1, vec!["second", "run"]);
}
