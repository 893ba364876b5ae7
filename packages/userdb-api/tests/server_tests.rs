//! Server tests over real TCP connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

use userdb_api::router::Router;
use userdb_api::server::Server;
use userdb_core::config::DbConfig;
use userdb_core::database::Database;

const WAIT: Duration = Duration::from_secs(5);

fn router(config: DbConfig) -> Router {
    Router::new(Arc::new(Database::new(config.clone())), Arc::new(config))
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Reads from `stream` until the end of the response head.
async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&head).into_owned()
}

#[tokio::test]
async fn test_slow_body_times_out() {
    let config = DbConfig {
        request_timeout_ms: 200,
        ..DbConfig::default()
    };
    let (listener, addr) = bind().await;
    let server = tokio::spawn(Server::new(router(config)).serve(listener));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    // Announce 100 bytes and send only the start of the body
    stream
        .write_all(
            b"POST /add-user HTTP/1.1\r\n\
              Host: localhost\r\n\
              Content-Type: application/json\r\n\
              Content-Length: 100\r\n\r\n\
              {\"username\": ",
        )
        .await
        .unwrap();

    let head = timeout(WAIT, read_head(&mut stream)).await.unwrap();
    assert!(head.starts_with("HTTP/1.1 408"), "unexpected response: {}", head);

    server.abort();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let config = DbConfig {
        shutdown_timeout_ms: 500,
        ..DbConfig::default()
    };
    let (listener, addr) = bind().await;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::new(router(config)).serve_with_shutdown(listener, async {
        let _ = stop_rx.await;
    }));

    // Keep-alive connection that stays open across the shutdown
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let head = timeout(WAIT, read_head(&mut stream)).await.unwrap();
    assert!(head.starts_with("HTTP/1.1 200"), "unexpected response: {}", head);

    stop_tx.send(()).unwrap();
    let result = timeout(WAIT, server).await.unwrap().unwrap();
    assert!(result.is_ok());

    assert!(TcpStream::connect(addr).await.is_err());

    // Idle connection was closed during the drain
    let mut rest = Vec::new();
    let read = timeout(WAIT, stream.read_to_end(&mut rest)).await.unwrap();
    assert!(read.is_err() || !String::from_utf8_lossy(&rest).contains("HTTP/1.1"));
}
