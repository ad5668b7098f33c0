use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::{Html, IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::command;
use crate::netif::NetworkInterface;
use crate::render;
use crate::state::SharedState;

#[derive(Clone)]
pub struct AppState {
    pub shared: SharedState,
    pub netif: Arc<dyn NetworkInterface>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .fallback(handle_command)
        .with_state(app)
}

/// Everything outside /api is a controller command. The request line is
/// rebuilt from the transport and fed to the core parser, the command is
/// applied under the write lock, and the chosen view is rendered from the
/// same locked snapshot.
async fn handle_command(State(app): State<AppState>, req: Request) -> Html<String> {
    let request_line = format!("{} {} HTTP/1.1", req.method(), req.uri());
    let cmd = command::parse(&request_line);

    let mut st = app.shared.write().await;
    let applied = st.apply(cmd);
    if applied.network_changed {
        // Reinitializing the interface may drop connections; acceptable.
        app.netif.apply(&st.network);
    }
    Html(render::page(applied.view, &st))
}

async fn api_status(State(app): State<AppState>) -> impl IntoResponse {
    let st = app.shared.read().await;
    Json(st.to_status())
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(app: AppState) {
    let port: u16 = env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind web port");

    info!(%addr, "web surface listening");

    axum::serve(listener, router(app))
        .await
        .expect("web server error");
}

// ===========================================================================
// Tests
// ===========================================================================
