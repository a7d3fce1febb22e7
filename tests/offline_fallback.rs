//! End-to-end behavior of the proxy against a switchable upstream.

use std::time::Duration;

mod common;

use common::{body, client, proxy_config, start_proxy, MockUpstream};

const INDEX: &str = "/alink/index.html";
const APP_JS: &str = "/alink/js/app.js";

#[tokio::test]
async fn test_runtime_cache_serves_when_offline() {
    let (upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX])).await;
    let client = client();

    let (status, online) = body(&client, &proxy.url("/alink/assets")).await;
    assert_eq!(status, 200);
    assert_eq!(online, "/alink/assets#1");

    upstream.set_offline(true);
    let (status, offline) = body(&client, &proxy.url("/alink/assets")).await;
    assert_eq!(status, 200);
    assert_eq!(offline, online);
    assert_eq!(upstream.hits("/alink/assets"), 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_offline_deep_link_serves_entry_point() {
    let (upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX])).await;
    let client = client();

    // Wait for the precache install to finish before cutting the network.
    let (_, index) = body(&client, &proxy.url(INDEX)).await;
    assert_eq!(index, "/alink/index.html#1");

    upstream.set_offline(true);
    let (status, deep) = body(&client, &proxy.url("/alink/assets/9/edit")).await;
    assert_eq!(status, 200);
    assert_eq!(deep, index);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_offline_uncached_script_is_network_error() {
    let (upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX])).await;
    let client = client();
    body(&client, &proxy.url(INDEX)).await;

    upstream.set_offline(true);
    let res = client
        .get(proxy.url("/alink/js/missing.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 502);
    assert_eq!(res.headers()["x-offline-proxy"], "network-error");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_precached_script_served_offline() {
    let (upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX, APP_JS])).await;
    let client = client();
    body(&client, &proxy.url(INDEX)).await;

    upstream.set_offline(true);
    let (status, script) = body(&client, &proxy.url(APP_JS)).await;
    assert_eq!(status, 200);
    assert_eq!(script, "/alink/js/app.js#1");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_api_never_answered_from_cache() {
    let (upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX])).await;
    let client = client();

    let (status, online) = body(&client, &proxy.url("/api/asset/7")).await;
    assert_eq!(status, 200);
    assert_eq!(online, "/api/asset/7#1");

    upstream.set_offline(true);
    let (status, _) = body(&client, &proxy.url("/api/asset/7")).await;
    assert_eq!(status, 502);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_skip_cache_header_fetches_fresh_copy() {
    let (_upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX])).await;
    let client = client();
    let url = proxy.url("/alink/assets");

    assert_eq!(body(&client, &url).await.1, "/alink/assets#1");
    assert_eq!(body(&client, &url).await.1, "/alink/assets#1");

    let fresh = client
        .get(&url)
        .header("x-skip-cache", "1")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(fresh, "/alink/assets#2");

    // The refresh also updated the runtime cache.
    assert_eq!(body(&client, &url).await.1, "/alink/assets#2");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_update_waits_for_skip_waiting() {
    let (_upstream, addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(addr, &[INDEX])).await;
    let client = client();

    assert_eq!(body(&client, &proxy.url("/alink/")).await.1, "/alink/index.html#1");

    let mut next = proxy_config(addr, &[]);
    next.deployment.release = "2".into();
    next.precache.entries = vec![offline_proxy::cache::PrecacheEntry::new(INDEX, Some("r2"))];
    proxy.updates.send(next).unwrap();

    // Until a client asks for it, the old deployment keeps serving.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(body(&client, &proxy.url("/alink/")).await.1, "/alink/index.html#1");

    let mut served = String::new();
    for _ in 0..50 {
        let res = client
            .post(proxy.url("/__offline/message"))
            .json(&serde_json::json!({ "type": "SKIP_WAITING" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 202);

        served = body(&client, &proxy.url("/alink/")).await.1;
        if served != "/alink/index.html#1" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(served, "/alink/index.html#2");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_activated_update_serves_from_its_own_upstream() {
    let (first, first_addr) = MockUpstream::start().await;
    let (second, second_addr) = MockUpstream::start().await;
    let proxy = start_proxy(proxy_config(first_addr, &[INDEX])).await;
    let client = client();
    body(&client, &proxy.url(INDEX)).await;

    let mut next = proxy_config(second_addr, &[INDEX]);
    next.deployment.release = "2".into();
    proxy.updates.send(next).unwrap();

    for attempt in 0..50 {
        client
            .post(proxy.url("/__offline/message"))
            .json(&serde_json::json!({ "type": "SKIP_WAITING" }))
            .send()
            .await
            .unwrap();
        body(&client, &proxy.url(&format!("/alink/assets?attempt={attempt}"))).await;
        if second.hits("/alink/assets") > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(second.hits("/alink/assets") > 0);

    first.set_offline(true);
    second.set_offline(true);
    let (status, deep) = body(&client, &proxy.url("/alink/assets/9/edit")).await;
    assert_eq!(status, 200);
    assert_eq!(deep, "/alink/index.html#1");

    proxy.shutdown.trigger();
}
