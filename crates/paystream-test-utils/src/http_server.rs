//! Shared async HTTP test server helpers.

use axum::Router;
use tokio::net::TcpListener;
use url::Url;

/// Axum router served on a random localhost port until dropped.
pub struct TestHttpServer {
    base_url: Url,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestHttpServer {
    /// Spawn `router` on a random localhost port.
    ///
    /// The listener is bound before this returns, so requests made right
    /// away queue instead of failing.
    pub async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test HTTP listener");
        let addr = listener
            .local_addr()
            .expect("read test listener local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });
        tokio::spawn(async move {
            if let Err(error) = server.await {
                tracing::warn!(%error, "test HTTP server stopped");
            }
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("parse base URL"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// `path` resolved against the server root.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("join server URL path")
    }

    /// Server root, slash-terminated.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}
