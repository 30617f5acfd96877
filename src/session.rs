//! Session state machine — owns the connection and drives the read loop.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` dials the barrage server, sends `loginreq` then `joingroup`
//!    (no auth challenge exists; the server accepts any room id).
//! 2. `run` spawns the keepalive scheduler and reads until end of stream,
//!    an I/O error, or a shutdown request.
//! 3. Shutdown request → `Closing`: send `logout`, cancel the scheduler,
//!    drop the connection → `Closed`. EOF and I/O errors skip the logout
//!    frame and go straight to `Closed`.
//!
//! CONCURRENCY
//! ===========
//! The read loop and the keepalive scheduler both write to the socket, so
//! outbound frames go through a shared mutex-guarded writer: one lock per
//! whole frame, partial writes never interleave. The scheduler is cancelled
//! before teardown so it can never write to a closed handle. Any read or
//! write failure is terminal for the session; the caller decides whether to
//! start a fresh one.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::codec;
use crate::db::ChatStore;
use crate::event::{Event, classify};
use crate::keepalive;
use crate::payload;

/// Well-known barrage endpoint.
pub const BARRAGE_SERVER: &str = "openbarrage.douyutv.com:8601";

/// Broadcast group sentinel. The server fans rooms out over fixed groups;
/// `-9999` subscribes to the room's full barrage stream.
const GROUP_ID: &str = "-9999";

const LOGOUT_BODY: &[u8] = b"type@=logout/";

const READ_BUF_LEN: usize = 1024;

/// Send-only handle shared by the read loop and the keepalive scheduler.
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Sync + Unpin>>>;

/// Fatal session failures. Malformed frames are not errors (they are
/// dropped); only connection-level trouble surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connect to barrage server failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("session i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Forward-only lifecycle. `Closed` is reachable from any state on fatal
/// error; there are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    LoggedIn,
    Joined,
    Running,
    Closing,
    Closed,
}

/// One logical connection to the barrage server for a single room.
pub struct Session {
    room_id: String,
    state: SessionState,
    reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
    writer: SharedWriter,
    /// Bytes received but not yet framed. Survives across reads so frames
    /// split over several socket deliveries reassemble.
    recv_buf: Vec<u8>,
    store: Option<Arc<dyn ChatStore>>,
}

impl Session {
    /// Dial the barrage server, log in and join the room's broadcast group.
    ///
    /// # Errors
    ///
    /// [`SessionError::Connect`] if the dial fails, [`SessionError::Io`] if
    /// a handshake frame cannot be written.
    pub async fn connect(
        room_id: &str,
        store: Option<Arc<dyn ChatStore>>,
    ) -> Result<Self, SessionError> {
        info!(room_id, server = BARRAGE_SERVER, "connecting");
        let stream = TcpStream::connect(BARRAGE_SERVER)
            .await
            .map_err(SessionError::Connect)?;
        let (read_half, write_half) = stream.into_split();

        let mut session = Self::with_transport(room_id, read_half, write_half, store);
        session.state = SessionState::Connecting;
        session.handshake().await?;
        Ok(session)
    }

    /// Build a session over an arbitrary transport. `connect` uses the TCP
    /// split halves; tests use in-memory duplex pipes.
    pub fn with_transport(
        room_id: &str,
        reader: impl AsyncRead + Send + Sync + Unpin + 'static,
        writer: impl AsyncWrite + Send + Sync + Unpin + 'static,
        store: Option<Arc<dyn ChatStore>>,
    ) -> Self {
        Self {
            room_id: room_id.to_owned(),
            state: SessionState::default(),
            reader: Box::new(reader),
            writer: Arc::new(Mutex::new(Box::new(writer))),
            recv_buf: Vec::new(),
            store,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Send the login and join-group frames. The server does not check user
    /// auth, so there is nothing to wait for between the two.
    async fn handshake(&mut self) -> Result<(), SessionError> {
        let login = payload::serialize(&[("type", "loginreq"), ("roomid", &self.room_id)]);
        send_frame(&self.writer, &login).await?;
        self.state = SessionState::LoggedIn;

        let join = payload::serialize(&[
            ("type", "joingroup"),
            ("rid", &self.room_id),
            ("gid", GROUP_ID),
        ]);
        send_frame(&self.writer, &join).await?;
        self.state = SessionState::Joined;

        info!(room_id = %self.room_id, "joined barrage group");
        Ok(())
    }

    /// Drive the session until end of stream, an I/O error, or `shutdown`
    /// flips to true. Spawns the keepalive scheduler for the duration and
    /// cancels it before returning.
    ///
    /// # Errors
    ///
    /// [`SessionError::Io`] on read or write failure. EOF and requested
    /// shutdown both return `Ok(())`.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), SessionError> {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let scheduler = keepalive::spawn(self.writer.clone(), cancel_rx);
        self.state = SessionState::Running;
        info!(room_id = %self.room_id, "session running");

        let mut buf = [0u8; READ_BUF_LEN];
        let result = loop {
            tokio::select! {
                read = self.reader.read(&mut buf) => match read {
                    Ok(0) => {
                        info!("server closed the connection");
                        break Ok(());
                    }
                    Ok(n) => {
                        if let Err(e) = self.process_bytes(&buf[..n]).await {
                            break Err(e);
                        }
                    }
                    Err(e) => break Err(SessionError::Io(e)),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.state = SessionState::Closing;
                        info!(room_id = %self.room_id, "logging out");
                        break send_frame(&self.writer, LOGOUT_BODY).await;
                    }
                }
            }
        };

        // Cancel the scheduler and wait for it to stop before the writer
        // goes away; a late keepalive would race with teardown.
        let _ = cancel_tx.send(true);
        let _ = scheduler.await;
        self.state = SessionState::Closed;
        info!(room_id = %self.room_id, "session closed");
        result
    }

    /// Append one socket delivery to the receive buffer and dispatch every
    /// complete frame it yields. The remainder stays buffered for the next
    /// read.
    async fn process_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.recv_buf.extend_from_slice(bytes);
        let (bodies, rest) = codec::feed(&self.recv_buf);
        self.recv_buf = rest;

        for body in bodies {
            self.dispatch(&body).await?;
        }
        Ok(())
    }

    /// Parse one frame body and route the decoded event.
    async fn dispatch(&mut self, body: &[u8]) -> Result<(), SessionError> {
        let fields = match payload::parse(body) {
            Ok(fields) => fields,
            Err(e) => {
                // The frame is dropped; the stream itself is fine.
                debug!(error = %e, "dropping unparseable frame");
                return Ok(());
            }
        };

        match classify(fields) {
            Event::LoginResult { live_stat } => {
                // live_stat reads 0 whether or not the stream is live, so it
                // is logged and nothing more.
                info!(%live_stat, "login acknowledged");
            }
            Event::KeepaliveTick => {
                send_frame(&self.writer, &keepalive_reply(unix_seconds())).await?;
            }
            Event::PingRequest => {
                // The expected pingresp format is undocumented; staying
                // silent is the known-safe behavior.
                debug!("ping probe ignored");
            }
            Event::UserEnter { nickname, level } => {
                println!("welcome {nickname} (level {level}) to the room");
            }
            Event::ChatMessage { nickname, text } => {
                println!("{nickname}: {text}");
                self.persist_chat(&nickname, &text).await;
            }
            Event::Other(fields) => {
                debug!(
                    kind = fields.get(payload::TYPE_KEY).map_or("", String::as_str),
                    "unhandled message type"
                );
            }
        }
        Ok(())
    }

    /// Fire-and-forget: a store failure is logged and never aborts the
    /// session.
    async fn persist_chat(&self, nickname: &str, text: &str) {
        let Some(store) = &self.store else {
            return;
        };
        match store.store(&self.room_id, nickname, text).await {
            Ok(rows) => debug!(rows, "chat message stored"),
            Err(e) => warn!(error = %e, nickname, "chat message store failed"),
        }
    }
}

/// Write one encoded frame. One lock per whole frame keeps concurrent
/// senders (read-loop replies, keepalive) from interleaving partial writes.
pub(crate) async fn send_frame(writer: &SharedWriter, body: &[u8]) -> Result<(), SessionError> {
    let bytes = codec::encode(body);
    let mut writer = writer.lock().await;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Body for the synchronous reply to a server `keeplive` probe.
fn keepalive_reply(unix_seconds: u64) -> Vec<u8> {
    payload::serialize(&[("type", "keeplive"), ("tick", &unix_seconds.to_string())])
}

/// Seconds since the Unix epoch, 0 if the clock predates 1970.
fn unix_seconds() -> u64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    dur.as_secs()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
