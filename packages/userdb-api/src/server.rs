//! Hyper server setup and request handling.

use std::convert::Infallible;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time;

use crate::router::Router;

/// HTTP server for the user database API.
pub struct Server {
    router: Arc<Router>,
}

impl Server {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Serves connections from `listener` until the process exits.
    pub async fn serve(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Serves connections from `listener` until `signal` completes.
    ///
    /// Once the signal fires no new connections are accepted and open
    /// ones are asked to finish their current request. Connections still
    /// open after the configured shutdown timeout are dropped.
    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        signal: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on http://{}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        let mut signal = pin!(signal);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            tracing::warn!("Failed to accept connection: {}", err);
                            continue;
                        }
                    };
                    let router = Arc::clone(&self.router);
                    let shutdown_rx = shutdown_rx.clone();
                    connections.spawn(serve_connection(stream, peer, router, shutdown_rx));
                }
                _ = &mut signal => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        let _ = shutdown_tx.send(true);
        let timeout = Duration::from_millis(self.router.state().config.shutdown_timeout_ms);
        tracing::info!(
            "Shutting down, waiting up to {:?} for {} connection(s)",
            timeout,
            connections.len()
        );

        let drained = time::timeout(timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Dropping {} connection(s) after shutdown timeout", connections.len());
            connections.abort_all();
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: std::net::SocketAddr,
    router: Arc<Router>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let builder = ConnectionBuilder::new(TokioExecutor::new());
    let service = hyper::service::service_fn(move |req| handle_request(req, Arc::clone(&router)));
    let mut conn = pin!(builder.serve_connection(io, service));

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown_rx.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(err) = result {
        tracing::debug!("Error serving connection from {}: {}", peer, err);
    }
}

/// Handles an incoming HTTP request.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = router.handle(req).await;
    Ok(response.map(Full::new))
}
