//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with all middleware layers
//! - Resolve each request's effective identity (trust + allow-list)
//! - Consult the authorizer and issue challenge/denied terminals
//! - Forward permitted requests across the node candidate sequence
//! - Report attempt outcomes back to the health tracker
//!
//! # Request state machine
//! ```text
//! Accepted → Identified → AccessDecided
//!     → Challenged (terminal, 401)
//!     | Denied    (terminal, 403)
//!     | Forwarding → Relayed (terminal)
//!                  | Retrying → Forwarding
//!                  | Exhausted (terminal, 503)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::uri::{Authority, Scheme},
    http::{header, HeaderMap, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::access::{
    self, AccessDecision, AccessPolicy, AccessPolicyError, Authorizer, ClientAddr, Credentials,
    Identity, StaticAuthorizer,
};
use crate::cluster::{pool::PoolError, HealthTracker, Node, NodePool};
use crate::config::ProxyConfig;
use crate::error::RequestError;
use crate::observability::metrics;

/// Error building the server from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    AccessPolicy(#[from] AccessPolicyError),
}

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<NodePool>,
    pub health: Arc<HealthTracker>,
    pub policy: Arc<AccessPolicy>,
    pub authorizer: Arc<dyn Authorizer>,
    pub client: Client<HttpConnector, Body>,
    pub forward_timeout: Duration,
    pub max_body_size: usize,
}

/// HTTP server for the search proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Build the server from validated configuration, using the static
    /// config-backed authorizer.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let authorizer: Arc<dyn Authorizer> =
            Arc::new(StaticAuthorizer::from_config(&config.access));
        Self::with_authorizer(config, authorizer)
    }

    /// Build the server with a custom authorization collaborator.
    pub fn with_authorizer(
        config: ProxyConfig,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, StartupError> {
        let pool = Arc::new(NodePool::from_config(&config.nodes)?);
        let health = Arc::new(HealthTracker::new(Duration::from_secs(
            config.cluster.cooldown_secs,
        )));
        let policy = Arc::new(AccessPolicy::from_config(&config.access)?);

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            pool,
            health,
            policy,
            authorizer,
            client,
            forward_timeout: Duration::from_secs(config.timeouts.forward_secs),
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server on a plaintext listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS terminated at the listener.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Main dispatcher: identity resolution, access decision, forwarding.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Identified
    let direct = ClientAddr::from_socket(peer);
    let ctx = access::trust::resolve(direct, request.headers(), &state.policy.trusted_proxies);

    tracing::debug!(
        request_id = %request_id,
        peer = %ctx.direct,
        effective = %ctx.effective,
        method = %request.method(),
        path = %request.uri().path(),
        "Dispatching request"
    );

    // AccessDecided
    let credentials = ctx
        .forwarded_credentials
        .clone()
        .or_else(|| Credentials::from_headers(request.headers()));

    let identity = match credentials {
        Some(credentials) => Identity::Credentials(credentials),
        None => {
            if !access::is_anonymous_eligible(&ctx.effective, &state.policy.allow_from) {
                tracing::info!(
                    request_id = %request_id,
                    client = %ctx.effective,
                    "No credentials and not anonymous-eligible, challenging"
                );
                metrics::record_request("challenged");
                return RequestError::AuthenticationRequired.into_response();
            }
            Identity::Anonymous(ctx.effective.clone())
        }
    };

    let roles = match state.authorizer.authorize(&identity).await {
        AccessDecision::Allowed(roles) => roles,
        AccessDecision::Denied => {
            tracing::warn!(
                request_id = %request_id,
                client = %ctx.effective,
                "Access denied by authorizer"
            );
            metrics::record_request("denied");
            return RequestError::AccessDenied.into_response();
        }
        AccessDecision::NeedsChallenge => {
            metrics::record_request("challenged");
            return RequestError::AuthenticationRequired.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        client = %ctx.effective,
        roles = ?roles,
        "Request authorized"
    );

    // Forwarding / Retrying / Relayed / Exhausted
    forward(&state, &request_id, request).await
}

/// Consume the candidate sequence one node at a time, replaying the
/// buffered request until one node answers or the sequence is exhausted.
async fn forward(state: &AppState, request_id: &str, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    // Buffer the body so failed attempts can be replayed on the next
    // candidate without involving the client.
    let body_bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(err) if is_length_limit(&err) => {
            metrics::record_request("body_too_large");
            return RequestError::BodyTooLarge {
                limit: state.max_body_size,
            }
            .into_response();
        }
        Err(err) => {
            // The client connection broke mid-read; nothing to replay.
            tracing::warn!(
                request_id = %request_id,
                error = %err,
                "Failed to read request body"
            );
            metrics::record_request("body_read_failed");
            return (StatusCode::BAD_REQUEST, "Failed to read request body\n").into_response();
        }
    };

    let candidates = state.pool.candidates(&state.health, Instant::now());

    for node in &candidates {
        let req = match build_attempt(&parts, &body_bytes, node, request_id) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream request");
                metrics::record_request("exhausted");
                return RequestError::BackendExhausted.into_response();
            }
        };

        let failure = match tokio::time::timeout(state.forward_timeout, state.client.request(req))
            .await
        {
            Ok(Ok(upstream)) => {
                // Any HTTP response means the node is reachable; status
                // semantics belong to the search backend.
                state.health.report_success(node);
                metrics::record_forward_attempt(&node.authority(), true);
                metrics::record_request("relayed");

                tracing::debug!(
                    request_id = %request_id,
                    node = %node,
                    status = %upstream.status(),
                    "Relaying backend response"
                );
                let (parts, body) = upstream.into_parts();
                return Response::from_parts(parts, Body::new(body)).into_response();
            }
            Ok(Err(e)) => RequestError::NodeUnreachable {
                node: node.to_string(),
                reason: e.to_string(),
            },
            Err(_) => RequestError::NodeUnreachable {
                node: node.to_string(),
                reason: "forward attempt timed out".to_string(),
            },
        };

        state.health.report_failure(node, Instant::now());
        metrics::record_forward_attempt(&node.authority(), false);
        tracing::warn!(
            request_id = %request_id,
            error = %failure,
            "Forward attempt failed, trying next candidate"
        );
    }

    tracing::error!(
        request_id = %request_id,
        attempts = candidates.len(),
        "All candidate nodes failed"
    );
    metrics::record_request("exhausted");
    RequestError::BackendExhausted.into_response()
}

/// Whether a body read error came from the replay buffer limit rather
/// than the client connection.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}

/// Build the outbound request for one node attempt.
fn build_attempt(
    parts: &axum::http::request::Parts,
    body: &axum::body::Bytes,
    node: &Node,
    request_id: &str,
) -> Result<Request<Body>, axum::http::Error> {
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Authority::try_from(node.authority().as_str()).ok();
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some("/".parse().expect("static path"));
    }
    let uri = Uri::from_parts(uri_parts).unwrap_or_else(|_| parts.uri.clone());

    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);

    if let Some(headers) = builder.headers_mut() {
        copy_end_to_end_headers(&parts.headers, headers);
        if let Ok(value) = header::HeaderValue::from_str(request_id) {
            headers.insert("x-request-id", value);
        }
    }

    builder.body(Body::from(body.clone()))
}

/// Copy request headers, dropping hop-by-hop fields and the host header
/// (hyper derives the latter from the rewritten URI).
fn copy_end_to_end_headers(from: &HeaderMap, to: &mut HeaderMap) {
    const HOP_BY_HOP: [header::HeaderName; 8] = [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::HOST,
    ];

    for (name, value) in from.iter() {
        if HOP_BY_HOP.contains(name) || name.as_str() == "keep-alive" {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut from = HeaderMap::new();
        from.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        from.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        from.insert(header::HOST, HeaderValue::from_static("proxy.example.org"));
        from.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic eDp5"));
        from.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let mut to = HeaderMap::new();
        copy_end_to_end_headers(&from, &mut to);

        assert!(to.get(header::CONNECTION).is_none());
        assert!(to.get("keep-alive").is_none());
        assert!(to.get(header::HOST).is_none());
        assert!(to.get(header::AUTHORIZATION).is_some());
        assert!(to.get(header::ACCEPT).is_some());
    }

    #[tokio::test]
    async fn length_limit_is_distinguished_from_transport_errors() {
        let over_limit = axum::body::to_bytes(Body::from(vec![0u8; 64]), 8)
            .await
            .unwrap_err();
        assert!(is_length_limit(&over_limit));

        let broken_connection = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "peer reset",
        ));
        assert!(!is_length_limit(&broken_connection));
    }

    #[test]
    fn attempt_uri_targets_the_node() {
        let node = Node::new("127.0.0.1", 9201).unwrap();
        let request = Request::builder()
            .method("GET")
            .uri("/index/_search?q=*")
            .body(Body::empty())
            .unwrap();
        let (parts, _) = request.into_parts();

        let attempt = build_attempt(&parts, &axum::body::Bytes::new(), &node, "rid").unwrap();
        assert_eq!(
            attempt.uri().to_string(),
            "http://127.0.0.1:9201/index/_search?q=*"
        );
        assert_eq!(
            attempt.headers().get("x-request-id").unwrap(),
            &HeaderValue::from_static("rid")
        );
    }
}
