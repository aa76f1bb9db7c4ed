use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::Response;
use postgrid_core::{ClientId, Viewer};

use crate::state::AppState;

/// Who is asking, resolved once per request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub viewer: Viewer,
    pub client: ClientId,
}

impl RequestContext {
    fn from_request(state: &AppState, headers: &HeaderMap, remote: Option<SocketAddr>) -> Self {
        let header_text = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

        Self {
            viewer: state.tokens.resolve(headers.get(header::AUTHORIZATION)),
            client: ClientId::from_headers(
                header_text("x-forwarded-for"),
                header_text("x-real-ip"),
                remote.map(|addr| addr.ip()),
            ),
        }
    }
}

/// Attach a [`RequestContext`] to the request extensions.
pub async fn request_context(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    let remote = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
    let context = RequestContext::from_request(&state, request.headers(), remote);
    request.extensions_mut().insert(context);

    next.run(request).await
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}
