use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::client_bridge::{EventSink, TransportError};
use crate::models::{ReceivedMessage, SendMessage};

/// What a tab's connection reports to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    Message(SendMessage),
}

/// Outbound queue of a `WsConnection`. Events queued while the connection is
/// down are sent once it is back.
#[derive(Clone)]
pub struct ConnectionSink {
    outbound: mpsc::UnboundedSender<ReceivedMessage>,
}

impl EventSink for ConnectionSink {
    fn emit(&self, message: ReceivedMessage) -> Result<(), TransportError> {
        self.outbound.send(message).map_err(|_| TransportError::Closed)
    }
}

/// One persistent connection per tab, reconnecting after transport loss
pub struct WsConnection {
    pub sink: ConnectionSink,
    pub events: mpsc::UnboundedReceiver<ConnectionEvent>,
    task: JoinHandle<()>,
}

impl WsConnection {
    /// Start the connection task. It stops once all sinks or the event
    /// receiver are dropped, or on `shutdown`.
    pub fn spawn(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(url.into(), reconnect_delay, outbound_rx, events_tx));
        Self {
            sink: ConnectionSink { outbound: outbound_tx },
            events: events_rx,
            task,
        }
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

enum PumpOutcome {
    /// The owner is gone; stop for good
    Shutdown,
    /// The transport dropped; try again
    Lost,
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn run_connection(
    url: String,
    reconnect_delay: Duration,
    mut outbound: mpsc::UnboundedReceiver<ReceivedMessage>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!("Connection successful: {}", url);
                if events.send(ConnectionEvent::Connected).is_err() {
                    return;
                }
                match pump(socket, &mut outbound, &events).await {
                    PumpOutcome::Shutdown => return,
                    PumpOutcome::Lost => {
                        info!("Disconnected from server: {}", url);
                        if events.send(ConnectionEvent::Disconnected).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => warn!("Failed to connect to {}: {}", url, e),
        }

        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            _ = events.closed() => return,
        }
    }
}

async fn pump(
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<ReceivedMessage>,
    events: &mpsc::UnboundedSender<ConnectionEvent>,
) -> PumpOutcome {
    let (mut write, mut read) = socket.split();
    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(message) = queued else {
                    let _ = write.close().await;
                    return PumpOutcome::Shutdown;
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to encode outbound event: {}", e);
                        continue;
                    }
                };
                // A failed send is not retried
                if let Err(e) = write.send(WsMessage::text(text)).await {
                    warn!("Send failed: {}", e);
                    return PumpOutcome::Lost;
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<SendMessage>(text.as_str()) {
                            Ok(message) => {
                                if events.send(ConnectionEvent::Message(message)).is_err() {
                                    return PumpOutcome::Shutdown;
                                }
                            }
                            Err(e) => error!("Failed to parse server event: {}", e),
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return PumpOutcome::Lost,
                    Some(Ok(_)) => debug!("Ignoring non-text frame"),
                    Some(Err(e)) => {
                        warn!("Connection error: {}", e);
                        return PumpOutcome::Lost;
                    }
                }
            }
        }
    }
}
