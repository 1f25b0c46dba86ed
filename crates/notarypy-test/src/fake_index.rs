//! A local stand-in for the package index's integrity API.
//!
//! [`FakeIndex`] binds an axum server to an ephemeral loopback port and
//! answers provenance requests from a scripted table. Unscripted paths get
//! `404 Not Found`, like PyPI does for files without attestations.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A scripted index response.
#[derive(Debug, Clone)]
pub struct FakeResponse {
    status: u16,
    body: String,
    content_type: &'static str,
    delay: Option<Duration>,
}

impl FakeResponse {
    /// `200 OK` with a JSON body.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            content_type: "application/json",
            delay: None,
        }
    }

    /// A response with the given status and a plain-text body.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain",
            delay: None,
        }
    }

    /// An empty response with the given status.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::text(status, "")
    }

    /// Hold the response back for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl IntoResponse for FakeResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    routes: Mutex<HashMap<String, FakeResponse>>,
    hits: AtomicUsize,
}

/// Local fake of `GET /integrity/{package}/{version}/{filename}/provenance`.
#[derive(Debug)]
pub struct FakeIndex {
    addr: SocketAddr,
    state: Arc<FakeState>,
    handle: JoinHandle<()>,
}

impl FakeIndex {
    /// Start the server on `127.0.0.1` with an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(FakeState::default());

        let app = Router::new()
            .fallback(serve_provenance)
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "fake index stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL to configure an index client with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Script the response for one distribution file.
    pub fn respond(&self, package: &str, version: &str, filename: &str, response: FakeResponse) {
        let path = format!("/integrity/{package}/{version}/{filename}/provenance");
        if let Ok(mut routes) = self.state.routes.lock() {
            routes.insert(path, response);
        }
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

impl Drop for FakeIndex {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_provenance(State(state): State<Arc<FakeState>>, uri: Uri) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let scripted = state
        .routes
        .lock()
        .ok()
        .and_then(|routes| routes.get(uri.path()).cloned());

    let Some(response) = scripted else {
        return FakeResponse::text(404, "Not Found").into_response();
    };

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }
    response.into_response()
}
