//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{Request, Response},
    response::{IntoResponse, Redirect},
    routing::any,
    Router,
};
use cors_relay::{HttpServer, RelayConfig, Shutdown};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Counts requests that reached a mock backend.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Start the relay on an ephemeral port. Call `trigger()` on the returned
/// handle to stop it.
pub async fn start_relay(mut config: RelayConfig) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.port = 0;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let signalled = shutdown.signalled();
    tokio::spawn(async move {
        let _ = server.run(listener, signalled).await;
    });

    (addr, shutdown)
}

/// Start a backend that echoes the request back.
///
/// Response headers: `x-echo-method`, `x-echo-uri`, and `x-echo-<name>` for every
/// request header. The response body is the request body.
pub async fn start_echo_backend() -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/", any(echo))
        .route("/{*path}", any(echo))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}

async fn echo(State(hits): State<Hits>, request: Request<Body>) -> Response<Body> {
    hits.record();
    let (parts, body) = request.into_parts();

    let mut builder = Response::builder()
        .status(200)
        .header("x-echo-method", parts.method.as_str())
        .header("x-echo-uri", parts.uri.to_string());
    for (name, value) in parts.headers.iter() {
        builder = builder.header(format!("x-echo-{}", name), value.clone());
    }
    builder.body(body).unwrap()
}

/// Start a backend that answers every connection with a fixed raw HTTP response.
pub async fn start_raw_backend(response: &'static str) -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.record();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

/// Start a backend that waits `delay` before answering 200 "late".
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let app = Router::new().route(
        "/{*path}",
        any(move || async move {
            tokio::time::sleep(delay).await;
            "late"
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that reads the whole request body before answering with it.
pub async fn start_buffering_backend() -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route(
            "/{*path}",
            any(|State(hits): State<Hits>, body: Bytes| async move {
                hits.record();
                body
            }),
        )
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}

/// Start a backend whose `/hop/{n}` redirects to `/hop/{n+1}` until `n`
/// reaches `hops`, where it answers 200 "landed".
pub async fn start_redirect_chain_backend(hops: u32) -> SocketAddr {
    let app = Router::new().route(
        "/hop/{n}",
        any(move |Path(n): Path<u32>| async move {
            if n < hops {
                Redirect::to(&format!("/hop/{}", n + 1)).into_response()
            } else {
                "landed".into_response()
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that sends a chunked response with a first chunk `first`,
/// then stalls for `stall` before finishing.
pub async fn start_stalling_backend(stall: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\
                            Transfer-Encoding: chunked\r\n\r\n5\r\nfirst\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                tokio::time::sleep(stall).await;
                let _ = socket.write_all(b"4\r\nlast\r\n0\r\n\r\n").await;
            });
        }
    });

    addr
}

/// Start a backend that streams a `tick` chunk every 100ms and never finishes.
/// The receiver fires once its single connection has been closed by the peer.
pub async fn start_endless_backend() -> (SocketAddr, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        read_request_head(&mut socket).await;
        let (mut reader, mut writer) = socket.split();
        let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n";
        if writer.write_all(head.as_bytes()).await.is_ok() {
            let mut buf = [0u8; 64];
            loop {
                tokio::select! {
                    read = reader.read(&mut buf) => {
                        if matches!(read, Ok(0) | Err(_)) {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        if writer.write_all(b"4\r\ntick\r\n").await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
        let _ = closed_tx.send(());
    });

    (addr, closed_rx)
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Test client: no ambient proxies, no redirect following.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Relay URL targeting `target` (which may omit its scheme).
pub fn relay_url(relay: SocketAddr, target: &str) -> String {
    format!("http://{}/{}", relay, target)
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}
