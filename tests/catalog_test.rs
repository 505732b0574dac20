//! Integration tests for the catalog listing endpoint.

mod common;

use common::TestHarness;

#[tokio::test]
async fn media_listing_reflects_refreshed_snapshot() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_media("a.mp4", b"a");
    h.write_media("b.mkv", b"b");

    // Empty until the first refresh runs.
    let keys: Vec<String> = reqwest::get(format!("http://{addr}/media"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(keys.is_empty());

    h.ctx.catalog.refresh().await;

    let keys: Vec<String> = reqwest::get(format!("http://{addr}/media"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(keys, vec!["a.mp4".to_string(), "b.mkv".to_string()]);
}

#[tokio::test]
async fn media_listing_picks_up_new_files_on_next_refresh() {
    let (h, addr) = TestHarness::with_server().await;
    h.write_media("first.mp4", b"1");
    h.ctx.catalog.refresh().await;

    h.write_media("second.mp4", b"2");

    // Stale until refreshed: the endpoint serves the snapshot, not a live listing.
    let keys: Vec<String> = reqwest::get(format!("http://{addr}/media"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(keys, vec!["first.mp4".to_string()]);

    h.ctx.catalog.refresh().await;

    let keys: Vec<String> = reqwest::get(format!("http://{addr}/media"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        keys,
        vec!["first.mp4".to_string(), "second.mp4".to_string()]
    );
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
}
