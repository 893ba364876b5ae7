//! Runs every suite against an in-process server.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use userdb_api::{router::Router, server::Server};
use userdb_core::config::DbConfig;
use userdb_core::database::Database;
use userdb_functional::suites::Suite;
use userdb_functional::HttpConnector;

/// Starts a server on an ephemeral port and connects to it.
async fn start_server() -> HttpConnector {
    let config = DbConfig::default();
    let router = Router::new(Arc::new(Database::new(config.clone())), Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(Server::new(router).serve(listener));

    HttpConnector::connect_with(url, 20, Duration::from_millis(50))
        .await
        .unwrap()
}

async fn run_suite(suite: Suite) {
    let conn = start_server().await;
    let report = suite.run(&conn).await;
    assert!(report.is_success(), "{}", report);
    assert!(report.total() > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_users_suite() {
    run_suite(Suite::Users).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_products_suite() {
    run_suite(Suite::Products).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_projects_suite() {
    run_suite(Suite::Projects).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_assets_suite() {
    run_suite(Suite::Assets).await;
}
