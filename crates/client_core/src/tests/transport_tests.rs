use std::{sync::Arc, time::Duration};

use super::*;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::mpsc};

#[derive(Clone)]
struct ScriptedServer {
    frames: Arc<Vec<String>>,
    received: mpsc::UnboundedSender<String>,
    close_after_script: bool,
}

async fn ws_route(ws: WebSocketUpgrade, State(server): State<ScriptedServer>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_script(socket, server))
}

async fn run_script(mut socket: WebSocket, server: ScriptedServer) {
    for frame in server.frames.iter() {
        if socket.send(AxumMessage::Text(frame.clone())).await.is_err() {
            return;
        }
    }
    if server.close_after_script {
        let _ = socket.send(AxumMessage::Close(None)).await;
        return;
    }
    while let Some(Ok(msg)) = socket.recv().await {
        if let AxumMessage::Text(text) = msg {
            let _ = server.received.send(text);
        }
    }
}

async fn spawn_scripted_server(
    frames: Vec<String>,
    close_after_script: bool,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route("/ws", get(ws_route)).with_state(ScriptedServer {
        frames: Arc::new(frames),
        received: tx,
        close_after_script,
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("ws://{addr}/ws"), rx)
}

async fn next_event(rx: &mut broadcast::Receiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event timeout")
        .expect("event channel open")
}

#[tokio::test]
async fn delivers_first_state_to_initial_receiver() {
    let (url, _received) = spawn_scripted_server(
        vec![r#"{"position":3,"left_pulls":1,"right_pulls":4,"active_users":2}"#.to_string()],
        false,
    )
    .await;
    let (_client, mut events) = GameClient::connect(&url).await.expect("connect");

    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Update(GameUpdate {
            position: 3,
            left_pulls: 1,
            right_pulls: 4,
            active_users: Some(2),
        })
    );
}

#[tokio::test]
async fn malformed_frame_reports_error_and_keeps_reading() {
    let (url, _received) = spawn_scripted_server(
        vec![
            "not json".to_string(),
            r#"{"position":0,"left_pulls":0,"right_pulls":0}"#.to_string(),
        ],
        false,
    )
    .await;
    let (_client, mut events) = GameClient::connect(&url).await.expect("connect");

    match next_event(&mut events).await {
        ClientEvent::Error(message) => assert!(message.contains("malformed")),
        other => panic!("expected error event, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::Update(_)
    ));
}

#[tokio::test]
async fn server_close_reports_disconnect() {
    let (url, _received) = spawn_scripted_server(Vec::new(), true).await;
    let (_client, mut events) = GameClient::connect(&url).await.expect("connect");
    assert_eq!(next_event(&mut events).await, ClientEvent::Disconnected);
}

#[tokio::test]
async fn send_pull_writes_pull_action() {
    let (url, mut received) = spawn_scripted_server(Vec::new(), false).await;
    let (client, _events) = GameClient::connect(&url).await.expect("connect");

    client.send_pull(Side::Left).await.expect("send left");
    client.send_pull(Side::Right).await.expect("send right");

    for expected in ["left", "right"] {
        let text = tokio::time::timeout(Duration::from_secs(2), received.recv())
            .await
            .expect("frame timeout")
            .expect("frame");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(
            value,
            serde_json::json!({ "action": "pull", "direction": expected })
        );
    }
}

#[tokio::test]
async fn rejects_non_websocket_url() {
    let err = GameClient::connect("http://localhost:3000/ws")
        .await
        .err()
        .expect("must fail");
    assert!(matches!(err, ClientError::InvalidUrl { .. }));
}

#[tokio::test]
async fn unreachable_server_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = GameClient::connect(&format!("ws://{addr}/ws"))
        .await
        .err()
        .expect("must fail");
    assert!(matches!(err, ClientError::Connect { .. }));
}

#[test]
fn accepts_ws_and_wss_urls() {
    assert!(validate_server_url("ws://localhost:3000/ws").is_ok());
    assert!(validate_server_url("wss://example.com/ws").is_ok());
    assert!(validate_server_url("localhost:3000").is_err());
}
