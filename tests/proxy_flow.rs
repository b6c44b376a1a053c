//! End-to-end behaviour of the forward proxy against a mock origin.

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE, VIA};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use async_http_proxy::ProxyConfig;

mod common;

const VIA_VALUE: &str = "http/1.1 async http proxy";

#[tokio::test]
async fn full_document_without_range() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let res = proxy
        .client()
        .get(format!("http://{}/", origin))
        .send()
        .await
        .expect("Proxy unreachable");

    assert!(matches!(res.status().as_u16(), 200 | 206));
    assert_eq!(res.headers()[VIA], VIA_VALUE);
    assert_eq!(res.headers()["accept-ranges"], "bytes");
    assert_eq!(res.headers()[CONTENT_LENGTH], "1256");
    assert_eq!(res.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
    assert_eq!(res.bytes().await.unwrap().to_vec(), common::document());
}

#[tokio::test]
async fn query_range_is_applied() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let res = proxy
        .client()
        .get(format!("http://{}/?range=100-", origin))
        .send()
        .await
        .unwrap();

    assert!(matches!(res.status().as_u16(), 200 | 206));
    assert_eq!(res.headers()[VIA], VIA_VALUE);
    assert_eq!(res.headers()[CONTENT_LENGTH], "1156");
    assert_eq!(res.bytes().await.unwrap().to_vec(), common::document()[100..].to_vec());
}

#[tokio::test]
async fn header_range_passes_through() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let res = proxy
        .client()
        .get(format!("http://{}/", origin))
        .header(RANGE, "bytes=100-")
        .send()
        .await
        .unwrap();

    assert!(matches!(res.status().as_u16(), 200 | 206));
    assert_eq!(res.headers()[CONTENT_LENGTH], "1156");
}

#[tokio::test]
async fn conflicting_ranges_are_416_without_upstream_call() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let res = proxy
        .client()
        .get(format!("http://{}/?range=0-", origin))
        .header(RANGE, "bytes=1-")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(res.headers()[CONTENT_LENGTH], "0");
    assert_eq!(proxy.stats.bytes(), 0);
}

#[tokio::test]
async fn unsupported_method_is_400() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let method = Method::from_bytes(b"BAD_HTTP_METHOD").unwrap();
    let res = proxy
        .client()
        .request(method, format!("http://{}/", origin))
        .header(RANGE, "bytes=100-")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()[VIA], VIA_VALUE);
    assert_eq!(res.headers()[CONTENT_LENGTH], "0");
}

#[tokio::test]
async fn forwarded_request_headers() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;
    let client = proxy.client();

    let echo: Value = client
        .get(format!("http://{}/echo", origin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(echo["range"], "bytes=0-");
    assert_eq!(echo["x-forwarded-for"], "127.0.0.1");
    assert_eq!(echo["x-forwarded-proto"], "http");
    assert_eq!(echo["host"], origin.to_string());

    let echo: Value = client
        .get(format!("http://{}/echo?range=100-", origin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(echo["range"], "bytes=100-");
}

#[tokio::test]
async fn stats_report_declared_bytes() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let res = proxy
        .client()
        .get(format!("http://{}/?range=100-", origin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.bytes().await.unwrap().len(), 1156);

    let res = proxy
        .direct_client()
        .get(format!("http://{}/stats", proxy.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");

    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["bytes"], 1156);
    assert!(stats["uptime"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn sequential_requests_sum_declared_lengths() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;
    let client = proxy.client();

    let before = proxy.stats.bytes();
    for url in [
        format!("http://{}/", origin),
        format!("http://{}/?range=100-", origin),
    ] {
        let res = client.get(url).send().await.unwrap();
        res.bytes().await.unwrap();
    }
    assert_eq!(proxy.stats.bytes(), before + 1256 + 1156);
}

#[tokio::test]
async fn stats_for_remote_host_is_forwarded() {
    let origin = common::start_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    // Absolute-form target on the origin, Host naming a non-loopback address.
    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!(
        "GET http://{}/stats HTTP/1.1\r\nHost: 192.0.2.10\r\nConnection: close\r\n\r\n",
        origin
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.to_ascii_lowercase().contains("via: http/1.1 async http proxy"));
    assert!(response.ends_with("origin stats"));
}

#[tokio::test]
async fn origin_form_naming_the_proxy_does_not_loop() {
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    // Origin-form target whose Host is the proxy itself.
    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!(
        "GET /echo HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        proxy.addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    tokio::time::timeout(
        std::time::Duration::from_secs(10),
        stream.read_to_string(&mut response),
    )
    .await
    .expect("proxy kept forwarding to itself")
    .unwrap();

    assert!(response.starts_with("HTTP/1.1 400"));
    assert_eq!(proxy.stats.bytes(), 0);
}

#[tokio::test]
async fn stats_disabled_proxies_everything() {
    let origin = common::start_origin().await;
    let mut config = ProxyConfig::default();
    config.stats.enabled = false;
    let proxy = common::start_proxy(config).await;

    let body = proxy
        .client()
        .get(format!("http://{}/stats", origin))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "origin stats");
}
