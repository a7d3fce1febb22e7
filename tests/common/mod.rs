//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use offline_proxy::config::ProxyConfig;
use offline_proxy::cache::PrecacheEntry;
use offline_proxy::{HttpServer, Shutdown};

/// A mock upstream that answers every path with `{path}#{n}`, where `n`
/// counts requests for that path. While offline it closes connections
/// without answering.
#[derive(Clone, Default)]
pub struct MockUpstream {
    offline: Arc<AtomicBool>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockUpstream {
    /// Start on an ephemeral port and return the bound address.
    pub async fn start() -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let upstream = Self::default();

        let server = upstream.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move {
                    if server.offline.load(Ordering::SeqCst) {
                        drop(socket);
                        return;
                    }
                    let (read, mut write) = socket.into_split();
                    let mut reader = BufReader::new(read);

                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    loop {
                        let mut line = String::new();
                        match reader.read_line(&mut line).await {
                            Ok(0) => break,
                            Ok(_) if line == "\r\n" => break,
                            Ok(_) => continue,
                            Err(_) => return,
                        }
                    }

                    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
                    let path = target.split('?').next().unwrap_or("/").to_string();
                    let n = {
                        let mut hits = server.hits.lock().unwrap();
                        let count = hits.entry(path.clone()).or_insert(0);
                        *count += 1;
                        *count
                    };

                    let body = format!("{path}#{n}");
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = write.write_all(response.as_bytes()).await;
                    let _ = write.shutdown().await;
                });
            }
        });

        (upstream, addr)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Requests answered for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

/// Proxy config pointing at `upstream`, precaching `precache` at revision `r1`.
pub fn proxy_config(upstream: SocketAddr, precache: &[&str]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.origin = format!("http://{upstream}");
    config.observability.metrics_enabled = false;
    config.timeouts.request_secs = 5;
    config.precache.entries = precache
        .iter()
        .map(|url| PrecacheEntry::new(*url, Some("r1")))
        .collect();
    config
}

/// A running proxy and the handles that control it.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<ProxyConfig>,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (updates, update_rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config).unwrap();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, update_rx, shutdown_rx).await.unwrap();
    });

    RunningProxy {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub async fn body(client: &reqwest::Client, url: &str) -> (u16, String) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}
