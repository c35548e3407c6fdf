// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The public VNC client facade.
//!
//! [`VncClient`] wraps the protocol session with a transport: any stream
//! implementing `AsyncRead + AsyncWrite + Unpin + Send` can be attached, so
//! the same client works over TCP, TLS wrappers or in-memory pipes. The
//! client reads and writes the stream but never closes it; connection
//! establishment and teardown belong to the caller.
//!
//! A read task drains the transport into the session and flushes whatever
//! the session owes the server. Observers consume [`ClientEvent`]s from the
//! channel returned by [`VncClient::new`]. Input helpers serialize whole
//! messages under a lock, so concurrent callers can never interleave a
//! partial message.

use std::sync::Arc;

use bytes::BytesMut;
use log::error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::events::ClientEvent;
use crate::framebuffer::Framebuffer;
use crate::keysym::Key;
use crate::protocol::{ProtocolVersion, SecurityType};
use crate::session::{ConnectionState, MouseButton, ProtocolSession};

/// Configuration for a [`VncClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Password for VNC authentication. May also be supplied later with
    /// [`VncClient::set_password`] when the server asks for one.
    pub password: Option<String>,
}

/// Write half of the attached transport.
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// An RFB (VNC) client.
///
/// Create one with [`new`](Self::new), then [`attach`](Self::attach) a
/// connected byte stream. The handshake runs automatically; once `Running`,
/// the framebuffer mirrors the remote screen and the input helpers forward
/// keyboard and pointer activity.
#[derive(Clone)]
pub struct VncClient {
    session: Arc<Mutex<ProtocolSession>>,
    writer: Arc<Mutex<Option<Writer>>>,
}

impl VncClient {
    /// Creates a client and the channel its events are delivered on.
    pub fn new(config: ClientConfig) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client = Self {
            session: Arc::new(Mutex::new(ProtocolSession::new(config.password, event_tx))),
            writer: Arc::new(Mutex::new(None)),
        };
        (client, event_rx)
    }

    /// Attaches a connected transport and spawns the read task.
    ///
    /// The stream is split; the write half serves the session's outbound
    /// bytes and input events, the read half feeds the state machine until
    /// the peer closes or errors. The returned handle completes when the
    /// read task exits.
    pub async fn attach<S>(&self, stream: S) -> JoinHandle<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut read_half, write_half) = tokio::io::split(stream);
        *self.writer.lock().await = Some(Box::new(write_half));
        self.session.lock().await.handle_connect();

        let session = Arc::clone(&self.session);
        let writer = Arc::clone(&self.writer);
        tokio::spawn(async move {
            let mut buf = BytesMut::with_capacity(8192);
            loop {
                buf.clear();
                match read_half.read_buf(&mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let outbound = {
                            let mut session = session.lock().await;
                            session.feed(&buf);
                            session.take_outbound()
                        };
                        if !outbound.is_empty() {
                            let mut writer = writer.lock().await;
                            if let Some(writer) = writer.as_mut() {
                                if let Err(e) = writer.write_all(&outbound).await {
                                    error!("VNC transport write failed: {e}");
                                    break;
                                }
                                let _ = writer.flush().await;
                            }
                        }
                    }
                    Err(e) => {
                        error!("VNC transport read failed: {e}");
                        break;
                    }
                }
            }
            // The transport belongs to the caller; just let go of it.
            *writer.lock().await = None;
            session.lock().await.handle_disconnect();
        })
    }

    /// Runs a session operation and flushes any bytes it produced.
    async fn with_session<R>(&self, op: impl FnOnce(&mut ProtocolSession) -> R) -> R {
        let (result, outbound) = {
            let mut session = self.session.lock().await;
            let result = op(&mut session);
            (result, session.take_outbound())
        };
        if !outbound.is_empty() {
            let mut writer = self.writer.lock().await;
            if let Some(writer) = writer.as_mut() {
                if let Err(e) = writer.write_all(&outbound).await {
                    error!("VNC transport write failed: {e}");
                } else {
                    let _ = writer.flush().await;
                }
            }
        }
        result
    }

    /// Supplies the password, answering a pending challenge if the server
    /// is already waiting on one.
    pub async fn set_password(&self, password: impl Into<String>) {
        let password = password.into();
        self.with_session(|session| session.set_password(password)).await;
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.session.lock().await.state()
    }

    /// The negotiated protocol version.
    pub async fn protocol_version(&self) -> ProtocolVersion {
        self.session.lock().await.protocol_version()
    }

    /// The selected security type, once negotiated.
    pub async fn security_type(&self) -> Option<SecurityType> {
        self.session.lock().await.security_type()
    }

    /// The remote framebuffer dimensions, `(0, 0)` before `ServerInit`.
    pub async fn framebuffer_size(&self) -> (u16, u16) {
        let session = self.session.lock().await;
        (session.framebuffer().width(), session.framebuffer().height())
    }

    /// Reads the framebuffer under the client's lock.
    ///
    /// The closure must not call back into the client.
    pub async fn with_framebuffer<R>(&self, read: impl FnOnce(&Framebuffer) -> R) -> R {
        read(self.session.lock().await.framebuffer())
    }

    /// Moves the pointer with no buttons held.
    pub async fn pointer_move(&self, x: u16, y: u16) {
        self.with_session(|session| session.pointer_move(x, y)).await;
    }

    /// Presses and releases a button at the given position.
    pub async fn click(&self, x: u16, y: u16, button: MouseButton) {
        self.with_session(|session| session.click(x, y, button)).await;
    }

    /// Drags from the last pointer position to `(x, y)` with a button held.
    pub async fn drag(&self, x: u16, y: u16, button: MouseButton) {
        self.with_session(|session| session.drag(x, y, button)).await;
    }

    /// Presses or releases a named key.
    pub async fn send_key(&self, key: Key, down: bool) {
        self.with_session(|session| session.send_key(key, down)).await;
    }

    /// Types text as press/release pairs, one per character.
    pub async fn send_text(&self, text: &str) {
        self.with_session(|session| session.send_text(text)).await;
    }
}
