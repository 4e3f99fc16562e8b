//! Push-channel lifecycle integration tests against a mock server.

use desk_channel::{ChannelConfig, ConnectionState, EventChannel, PushEvent, Topic};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// A mock push server: accepts connections, counts them, and can broadcast
/// frames to or force-drop every connected client.
struct MockPushServer {
    addr: SocketAddr,
    frames: broadcast::Sender<String>,
    kick: broadcast::Sender<()>,
    connections: Arc<AtomicU32>,
}

impl MockPushServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames, _) = broadcast::channel::<String>(64);
        let (kick, _) = broadcast::channel::<()>(4);
        let connections = Arc::new(AtomicU32::new(0));

        let frames_tx = frames.clone();
        let kick_tx = kick.clone();
        let connections_clone = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let frames_rx = frames_tx.subscribe();
                let kick_rx = kick_tx.subscribe();
                let connections = connections_clone.clone();
                tokio::spawn(handle_client(stream, frames_rx, kick_rx, connections));
            }
        });

        Self {
            addr,
            frames,
            kick,
            connections,
        }
    }

    fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    fn push(&self, frame: &str) {
        let _ = self.frames.send(frame.to_string());
    }

    /// Force-close every connected client, simulating an unexpected drop.
    fn drop_clients(&self) {
        let _ = self.kick.send(());
    }

    fn connection_count(&self) -> u32 {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn handle_client(
    stream: TcpStream,
    mut frames: broadcast::Receiver<String>,
    mut kick: broadcast::Receiver<()>,
    connections: Arc<AtomicU32>,
) {
    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(_) => return,
    };
    connections.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if ws.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = kick.recv() => {
                let _ = ws.close(None).await;
                break;
            }
            msg = ws.next() => match msg {
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}

fn test_config(url: String) -> ChannelConfig {
    ChannelConfig {
        url,
        reconnect_base_delay_ms: 50,
        reconnect_max_delay_ms: 500,
    }
}

/// Poll until `cond` holds, failing the test after 5 seconds.
async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn collect_events(channel: &EventChannel, topic: Topic) -> mpsc::UnboundedReceiver<PushEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    channel.on(topic, move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

#[tokio::test]
async fn test_delivers_market_data_events() {
    let server = MockPushServer::start().await;
    let channel = EventChannel::new(test_config(server.url()));
    let mut events = collect_events(&channel, Topic::MarketData);

    channel.connect();
    wait_until("client connected", || server.connection_count() >= 1).await;

    server.push(r#"{"topic": "market_data", "data": {"symbol": "AAPL", "data": "{}"}}"#);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event delivered")
        .unwrap();
    assert_eq!(event.topic, Topic::MarketData);
    assert_eq!(event.data["symbol"], json!("AAPL"));
    assert_eq!(channel.state(), ConnectionState::Connected);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_malformed_frame_does_not_break_the_stream() {
    let server = MockPushServer::start().await;
    let channel = EventChannel::new(test_config(server.url()));
    let mut events = collect_events(&channel, Topic::ChartData);

    channel.connect();
    wait_until("client connected", || server.connection_count() >= 1).await;

    server.push("this is not json");
    server.push(r#"{"topic": "unknown_topic", "data": {}}"#);
    server.push(r#"{"topic": "chart_data", "data": {"index": []}}"#);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("subsequent event still delivered")
        .unwrap();
    assert_eq!(event.topic, Topic::ChartData);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_reconnects_after_unexpected_drop() {
    let server = MockPushServer::start().await;
    let channel = EventChannel::new(test_config(server.url()));

    let connects = Arc::new(AtomicU32::new(0));
    let connects_clone = connects.clone();
    channel.on(Topic::Connected, move |_| {
        connects_clone.fetch_add(1, Ordering::SeqCst);
    });
    let disconnects = Arc::new(AtomicU32::new(0));
    let disconnects_clone = disconnects.clone();
    channel.on(Topic::Disconnected, move |_| {
        disconnects_clone.fetch_add(1, Ordering::SeqCst);
    });

    channel.connect();
    wait_until("first connection", || server.connection_count() >= 1).await;

    server.drop_clients();
    wait_until("reconnection", || server.connection_count() >= 2).await;
    wait_until("connected re-fired", || connects.load(Ordering::SeqCst) >= 2).await;
    assert!(disconnects.load(Ordering::SeqCst) >= 1);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_silences_all_handlers() {
    let server = MockPushServer::start().await;
    let channel = EventChannel::new(test_config(server.url()));
    let mut events = collect_events(&channel, Topic::MarketData);

    channel.connect();
    wait_until("client connected", || server.connection_count() >= 1).await;

    channel.disconnect().await;
    assert_eq!(channel.state(), ConnectionState::Disconnected);

    server.push(r#"{"topic": "market_data", "data": {"symbol": "MSFT"}}"#);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(
        events.try_recv().is_err(),
        "no events may be delivered after disconnect"
    );

    // connect() after disconnect stays down.
    channel.connect();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(channel.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let server = MockPushServer::start().await;
    let channel = EventChannel::new(test_config(server.url()));

    channel.connect();
    channel.connect();
    channel.connect();
    wait_until("client connected", || server.connection_count() >= 1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connection_count(), 1);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_during_backoff_exits_promptly() {
    // No server listening: the channel sits in its backoff loop.
    let channel = EventChannel::new(test_config("ws://127.0.0.1:9".to_string()));
    channel.connect();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(2), channel.disconnect())
        .await
        .expect("disconnect must not hang during backoff");
    assert_eq!(channel.state(), ConnectionState::Disconnected);
}
