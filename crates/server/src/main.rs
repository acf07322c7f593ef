use std::{net::SocketAddr, sync::atomic::Ordering, sync::Arc, time::Instant};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ClientAction, GameUpdate},
};
use storage::Storage;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod game;

use app_state::AppState;
use config::{load_settings, normalize_database_url};
use game::{GameAuthority, RateLimiter, RATE_WINDOW};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState::new(
        GameAuthority::new(storage),
        RateLimiter::new(settings.pulls_per_second, RATE_WINDOW),
    );
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/state", get(http_state))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state.game.storage().health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Unavailable, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameUpdate>, (StatusCode, Json<ApiError>)> {
    let update = state.current_update().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok(Json(update))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    info!(ip = %addr.ip(), "new player connecting");
    ws.on_upgrade(move |socket| ws_connection(state, socket, addr))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket, addr: SocketAddr) {
    let ip = addr.ip();
    let players = state.active_users.fetch_add(1, Ordering::SeqCst) + 1;
    info!(%ip, players, "player connected");

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before reading the snapshot so no broadcast slips between them.
    let mut updates = BroadcastStream::new(state.events.subscribe());
    let initial = match state.current_update().await {
        Ok(update) => Some(update),
        Err(err) => {
            error!(%ip, %err, "failed to load state for new player");
            None
        }
    };

    let send_task = tokio::spawn(async move {
        if let Some(update) = initial {
            if send_update(&mut sender, &update).await.is_err() {
                return;
            }
        }
        while let Some(item) = updates.next().await {
            match item {
                Ok(update) => {
                    if send_update(&mut sender, &update).await.is_err() {
                        break;
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(%ip, skipped, "player fell behind; skipping stale states");
                }
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => handle_client_text(&state, ip, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    let players = state.active_users.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
    info!(%ip, players, "player disconnected");
}

async fn send_update(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    update: &GameUpdate,
) -> Result<(), axum::Error> {
    let text = match update.encode() {
        Ok(v) => v,
        Err(err) => {
            error!(%err, "failed to encode state");
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

async fn handle_client_text(state: &AppState, ip: std::net::IpAddr, text: &str) {
    let action = match ClientAction::decode(text) {
        Ok(action) => action,
        Err(err) => {
            warn!(%ip, %err, "invalid message");
            return;
        }
    };

    match action {
        ClientAction::Pull { direction } => {
            if !state.limiter.lock().await.allow(ip, Instant::now()) {
                warn!(%ip, "rate limit exceeded");
                return;
            }
            match state.game.pull(direction).await {
                Ok(outcome) => state.publish(&outcome),
                Err(err) => error!(%ip, %err, direction = direction.as_str(), "failed to apply pull"),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
