use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, info_span};

use crate::{
    auth::{Authenticator, Credentials},
    process::wait_for_sigint_or_sigterm,
    pwd::PasswordEncoder,
    store::CredentialStore,
};

pub const PATH_HEALTH: &str = "/_health";
pub const PATH_LOGIN: &str = "/login";
pub const PATH_SIGNUP: &str = "/signup";

pub struct ApiContext<P: PasswordEncoder, S: CredentialStore> {
    pub auth: Authenticator<P, S>,
}

pub async fn start_api<P: PasswordEncoder + 'static, S: CredentialStore + 'static>(
    addr: SocketAddr,
    ctx: Arc<ApiContext<P, S>>,
) -> anyhow::Result<()> {
    debug!("binding tcp listener");
    let tcp = TcpListener::bind(addr).await?;
    info!(%addr, "server started");
    axum::serve(tcp, create_router(ctx))
        .with_graceful_shutdown(async {
            if let Err(err) = wait_for_sigint_or_sigterm().await {
                error!("failed to listen for signals: {err}");
            }
        })
        .await?;
    info!("server stopped");
    Ok(())
}

type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Error(
    #[from]
    #[source]
    crate::auth::Error,
);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        use crate::auth::Error::*;

        match self.0 {
            AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                Json(MessageResponse::new("Invalid credentials")),
            )
                .into_response(),
            DuplicateUsername => (
                StatusCode::CONFLICT,
                Json(MessageResponse::new("Username already exists")),
            )
                .into_response(),
            Validation(err) => (StatusCode::BAD_REQUEST, Json(err)).into_response(),
            err => {
                error!("{err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    message: String,
}

impl MessageResponse {
    fn new<MESSAGE: Into<String>>(msg: MESSAGE) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

fn create_router<P: PasswordEncoder + 'static, S: CredentialStore + 'static>(
    ctx: Arc<ApiContext<P, S>>,
) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or_default();
        let span = info_span!(
            "http_request",
            http.method = %req.method(),
            http.path = path,
        );
        debug!(parent: &span, "http request received");
        span
    });
    Router::new()
        .route(PATH_HEALTH, get(health))
        .route(PATH_LOGIN, post(login::<P, S>))
        .route(PATH_SIGNUP, post(signup::<P, S>))
        .with_state(ctx)
        .layer(trace_layer)
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn login<P: PasswordEncoder + 'static, S: CredentialStore + 'static>(
    State(ctx): State<Arc<ApiContext<P, S>>>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    ctx.auth.authenticate(&creds).await?;
    let resp = MessageResponse::new(format!("Welcome, {}!", creds.username));
    Ok((StatusCode::OK, Json(resp)))
}

async fn signup<P: PasswordEncoder + 'static, S: CredentialStore + 'static>(
    State(ctx): State<Arc<ApiContext<P, S>>>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    ctx.auth.register(&creds).await?;
    let resp = MessageResponse::new(format!("User {} created successfully", creds.username));
    Ok((StatusCode::CREATED, Json(resp)))
}

// Tests
