//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use searchgate::config::{NodeConfig, ProxyConfig};
use searchgate::http::HttpServer;

/// Start a mock backend node that returns a fixed 200 response and
/// counts the requests it receives.
pub async fn start_mock_node(addr: SocketAddr, response: &'static str) -> Arc<AtomicU32> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    hits
}

/// Base config pointing at the given nodes, hardened for test stability.
pub fn test_config(proxy_addr: SocketAddr, node_addrs: &[SocketAddr]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.nodes = node_addrs
        .iter()
        .map(|a| NodeConfig {
            host: a.ip().to_string(),
            port: a.port(),
        })
        .collect();
    config.timeouts.forward_secs = 2;
    config.timeouts.request_secs = 10;
    config
}

/// Build the proxy and serve it on `proxy_addr` until the returned
/// sender is dropped or triggered.
pub async fn spawn_proxy(config: ProxyConfig) -> broadcast::Sender<()> {
    let proxy_addr: SocketAddr = config.listener.bind_address.parse().unwrap();
    let (tx, rx) = broadcast::channel(1);
    let server = HttpServer::new(config).expect("server should build from test config");
    let listener = TcpListener::bind(proxy_addr).await.unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Give the accept loop a moment to come up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx
}

/// A reqwest client that never reuses pooled connections between tests.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
