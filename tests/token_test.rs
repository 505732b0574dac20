//! Integration tests for token issuance and token-protected streaming.

mod common;

use std::collections::HashMap;

use common::TestHarness;

async fn issue_token(addr: std::net::SocketAddr, key: &str) -> String {
    let client = reqwest::Client::new();
    let tokens: HashMap<String, String> = client
        .post(format!("http://{addr}/token/media/batch-tokens"))
        .json(&vec![key.to_string()])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    tokens.get(key).cloned().expect("token missing for key")
}

#[tokio::test]
async fn batch_tokens_issues_one_token_per_key() {
    let (_h, addr) = TestHarness::with_server().await;

    let client = reqwest::Client::new();
    let tokens: HashMap<String, String> = client
        .post(format!("http://{addr}/token/media/batch-tokens"))
        .json(&vec!["a.mp4".to_string(), "b.mp4".to_string()])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(tokens.len(), 2);
    assert!(tokens.contains_key("a.mp4"));
    assert!(tokens.contains_key("b.mp4"));
    assert_ne!(tokens["a.mp4"], tokens["b.mp4"]);
}

#[tokio::test]
async fn signed_stream_serves_the_granted_key() {
    let (h, addr) = TestHarness::with_server().await;
    let data: Vec<u8> = (0..=255u8).cycle().take(512).collect();
    h.write_media("secret.mp4", &data);

    let token = issue_token(addr, "secret.mp4").await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/token/media/signed/{token}"))
        .header("Range", "bytes=10-19")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap().to_str().unwrap(),
        "bytes 10-19/512"
    );
    assert_eq!(&resp.bytes().await.unwrap()[..], &data[10..20]);
}

#[tokio::test]
async fn signed_stream_without_range_is_200_full_body() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_media("secret.mp4", &[3u8; 256]);

    let token = issue_token(addr, "secret.mp4").await;

    let resp = reqwest::get(format!("http://{addr}/token/media/signed/{token}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("content-range").is_none());
    assert_eq!(resp.bytes().await.unwrap().len(), 256);
}

#[tokio::test]
async fn signed_head_reports_size() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_media("secret.mp4", &[3u8; 777]);

    let token = issue_token(addr, "secret.mp4").await;

    let client = reqwest::Client::new();
    let resp = client
        .head(format!("http://{addr}/token/media/signed/{token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-length").unwrap().to_str().unwrap(),
        "777"
    );
}

#[tokio::test]
async fn tampered_token_is_401() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_media("secret.mp4", &[3u8; 64]);

    let token = issue_token(addr, "secret.mp4").await;
    let tampered = format!("{}x", token);

    let resp = reqwest::get(format!("http://{addr}/token/media/signed/{tampered}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn garbage_token_is_401() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/token/media/signed/not-a-token"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn token_for_missing_key_redeems_as_404() {
    let (_h, addr) = TestHarness::with_server().await;

    let token = issue_token(addr, "ghost.mp4").await;

    let resp = reqwest::get(format!("http://{addr}/token/media/signed/{token}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
