//! Websocket transport for the venue's full feed.
//!
//! The client owns the connection and nothing else: text frames are
//! posted onto the core task's queue, raw `HEARTBEAT` frames update a
//! liveness timestamp, and a drop triggers a delayed reconnect with a
//! [`CoreInput::Reset`] posted first so every book re-bootstraps.
//! Outbound subscribe frames queue on a channel and are flushed once a
//! connection is up.

use crate::feed::error::FeedError;
use crate::feed::message::HEARTBEAT_FRAME;
use crate::orderbook::manager::CoreInput;
use crate::utils::current_time_millis;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle for sending outbound frames to the live connection and
/// querying feed liveness.
#[derive(Clone)]
pub struct FeedHandle {
    outbound: mpsc::UnboundedSender<String>,
    last_heartbeat_ms: Arc<AtomicI64>,
}

impl FeedHandle {
    /// Queue a frame for the connection. Returns false when the client
    /// has shut down.
    pub fn send(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }

    /// Milliseconds since the last raw heartbeat, once one was seen.
    pub fn heartbeat_age_ms(&self) -> Option<i64> {
        let at = self.last_heartbeat_ms.load(Ordering::Relaxed);
        (at > 0).then(|| current_time_millis() as i64 - at)
    }
}

/// The feed connection driver.
pub struct FeedClient {
    url: String,
    core_tx: mpsc::UnboundedSender<CoreInput>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    last_heartbeat_ms: Arc<AtomicI64>,
}

impl FeedClient {
    /// Create a client and its handle. Nothing connects until [`run`].
    ///
    /// [`run`]: FeedClient::run
    pub fn new(
        url: impl Into<String>,
        core_tx: mpsc::UnboundedSender<CoreInput>,
    ) -> (Self, FeedHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let last_heartbeat_ms = Arc::new(AtomicI64::new(0));
        let handle = FeedHandle {
            outbound: outbound_tx,
            last_heartbeat_ms: Arc::clone(&last_heartbeat_ms),
        };
        (
            Self {
                url: url.into(),
                core_tx,
                outbound_rx,
                last_heartbeat_ms,
            },
            handle,
        )
    }

    /// Connect and pump frames until the core task goes away,
    /// reconnecting with exponential delay after every drop.
    pub async fn run(mut self) {
        let mut delay = INITIAL_RECONNECT_DELAY;
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!(url = %self.url, "feed connected");
                    delay = INITIAL_RECONNECT_DELAY;
                    match self.pump(stream).await {
                        Ok(()) => return,
                        Err(error) => warn!(url = %self.url, %error, "feed disconnected"),
                    }
                }
                Err(error) => warn!(url = %self.url, %error, "feed connect failed"),
            }
            if self.core_tx.send(CoreInput::Reset).is_err() {
                return;
            }
            debug!(url = %self.url, ?delay, "reconnecting");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_RECONNECT_DELAY);
        }
    }

    /// Drive one connection. `Ok` means orderly shutdown (core queue or
    /// every handle dropped); `Err` asks the caller to reconnect.
    async fn pump(&mut self, mut stream: WsStream) -> Result<(), FeedError> {
        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.on_text(&text)?,
                    Some(Ok(Message::Ping(payload))) => stream.send(Message::Pong(payload)).await?,
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(FeedError::Transport {
                            message: "connection closed by peer".to_string(),
                        });
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => return Err(error.into()),
                },
                outbound = self.outbound_rx.recv() => match outbound {
                    Some(frame) => {
                        debug!(frame = %frame, "sending outbound frame");
                        stream.send(Message::Text(frame)).await?;
                    }
                    None => return Ok(()),
                },
            }
        }
    }

    fn on_text(&self, text: &str) -> Result<(), FeedError> {
        if text == HEARTBEAT_FRAME {
            self.last_heartbeat_ms
                .store(current_time_millis() as i64, Ordering::Relaxed);
            return Ok(());
        }
        self.core_tx
            .send(CoreInput::Frame(text.to_string()))
            .map_err(|_| FeedError::Transport {
                message: "core task queue closed".to_string(),
            })
    }
}
