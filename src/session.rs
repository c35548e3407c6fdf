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

//! The VNC client protocol state machine.
//!
//! This module drives handshake, authentication, initialization and
//! steady-state message parsing from a byte stream that may deliver any
//! message in arbitrarily small fragments.
//!
//! # Parsing Contract
//!
//! Every parser is transactional: it inspects the buffered byte count, and
//! either consumes exactly one complete unit of work (advancing the state)
//! or consumes nothing and reports that more bytes are needed. The
//! dispatcher keeps re-running parsers while they advance and bytes remain,
//! so callers never loop themselves; while a framebuffer update rectangle is
//! waiting for more bytes the dispatcher stops rather than spinning. A guard
//! flag makes re-entrant dispatch a no-op, so event observers can never
//! recurse into the read path.
//!
//! Protocol failures are surfaced as log records and state transitions,
//! never by unwinding out of a parser.

use bytes::{Buf, BufMut, BytesMut};
use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::auth::VncAuth;
use crate::encoding::hextile::HextileDecoder;
use crate::encoding::tight::TightDecoder;
use crate::encoding::zrle::ZrleDecoder;
use crate::encoding::{raw, DecodeResult};
use crate::events::{ClientEvent, ProtocolError};
use crate::framebuffer::{Framebuffer, Region};
use crate::keysym::{char_keysym, Key};
use crate::protocol::{
    PixelFormat, ProtocolVersion, Rectangle, SecurityType, ServerInit,
    CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST,
    CLIENT_MSG_KEY_EVENT, CLIENT_MSG_POINTER_EVENT, CLIENT_MSG_SET_ENCODINGS,
    CLIENT_MSG_SET_PIXEL_FORMAT, ENCODING_HEXTILE, ENCODING_RAW, ENCODING_TIGHT, ENCODING_ZRLE,
    SECURITY_RESULT_OK, SECURITY_TYPE_NONE, SECURITY_TYPE_VNC_AUTH,
    SERVER_MSG_FRAMEBUFFER_UPDATE,
};

/// Lifecycle of the connection; determines which bytes are parsed next.
///
/// Transitions are unidirectional along the handshake path. Disconnect
/// resets to `AwaitProtocolVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Expecting the server's 12-byte version banner.
    AwaitProtocolVersion,
    /// Expecting the security type word (3.3) or list (3.7/3.8).
    AwaitSecurityList,
    /// Expecting the 4-byte SecurityResult.
    AwaitSecurityResult,
    /// Expecting the 16-byte VNC authentication challenge, or a password.
    AwaitVncChallenge,
    /// Internal transient: the client owes the server a ClientInit byte.
    AwaitClientInit,
    /// Expecting the ServerInit message.
    AwaitServerInit,
    /// Steady state: server messages in, input events out.
    Running,
}

/// A mouse button in a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// The bit this button occupies in the pointer event button mask.
    pub fn mask(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 4,
        }
    }
}

/// Result of one parser invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// A complete unit of work was consumed and state moved on.
    Advanced,
    /// Not enough bytes; nothing was consumed.
    Incomplete,
}

/// Resumable cursor through a FramebufferUpdate message.
///
/// While this is present no other server message type may begin parsing.
#[derive(Debug)]
struct UpdateProgress {
    total_rects: u16,
    current_rect: u16,
    /// Header of the rectangle currently being decoded, once read.
    header: Option<Rectangle>,
}

/// The stream-driven protocol core of the VNC client.
///
/// The session owns the framebuffer, the negotiated pixel format, the
/// in-flight update cursor and the persistent zlib streams. It is fed
/// inbound bytes with [`feed`](Self::feed) and accumulates outbound bytes
/// which the transport layer drains with
/// [`take_outbound`](Self::take_outbound). All methods run on the caller's
/// single execution context; there is no internal locking or blocking.
pub struct ProtocolSession {
    state: ConnectionState,
    version: ProtocolVersion,
    security_type: Option<SecurityType>,
    pixel_format: PixelFormat,
    framebuffer: Framebuffer,
    desktop_name: String,
    auth: VncAuth,
    /// Challenge buffered until a password is supplied.
    pending_challenge: Option<[u8; 16]>,
    inbound: BytesMut,
    outbound: BytesMut,
    events: mpsc::UnboundedSender<ClientEvent>,
    /// Re-entrancy guard for the dispatcher.
    dispatching: bool,
    /// Set when the connection is beyond recovery; cleared on disconnect.
    failed: bool,
    update: Option<UpdateProgress>,
    hextile: HextileDecoder,
    zrle: ZrleDecoder,
    tight: TightDecoder,
    /// Last pointer position, for drag gestures.
    pointer: (u16, u16),
}

impl ProtocolSession {
    /// Creates a session with an optional pre-configured password. Events
    /// are delivered on the given channel.
    pub fn new(password: Option<String>, events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            state: ConnectionState::AwaitProtocolVersion,
            version: ProtocolVersion::Unknown,
            security_type: None,
            pixel_format: PixelFormat::rgb32(),
            framebuffer: Framebuffer::empty(),
            desktop_name: String::new(),
            auth: VncAuth::new(password),
            pending_challenge: None,
            inbound: BytesMut::with_capacity(4096),
            outbound: BytesMut::with_capacity(1024),
            events,
            dispatching: false,
            failed: false,
            update: None,
            hextile: HextileDecoder::new(),
            zrle: ZrleDecoder::new(),
            tight: TightDecoder::new(),
            pointer: (0, 0),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The negotiated protocol version, `Unknown` before the handshake.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }

    /// The selected security type, once negotiated.
    pub fn security_type(&self) -> Option<SecurityType> {
        self.security_type
    }

    /// The remote screen. Empty before `ServerInit`.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// The desktop name reported by `ServerInit`.
    pub fn desktop_name(&self) -> &str {
        &self.desktop_name
    }

    /// Appends received bytes and runs the dispatcher.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend_from_slice(bytes);
        self.process();
    }

    /// Drains the bytes owed to the server.
    pub fn take_outbound(&mut self) -> BytesMut {
        self.outbound.split()
    }

    /// Whether outbound bytes are waiting to be written.
    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Runs parsers until one reports it needs more bytes.
    ///
    /// Re-entrant invocations (a parser indirectly triggering another read)
    /// are no-ops; the outer invocation keeps draining the buffer.
    pub fn process(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        loop {
            if self.failed {
                // The stream is beyond recovery; drop whatever arrives.
                self.inbound.clear();
                break;
            }
            let step = match self.state {
                ConnectionState::AwaitProtocolVersion => self.parse_protocol_version(),
                ConnectionState::AwaitSecurityList => self.parse_security_list(),
                ConnectionState::AwaitSecurityResult => self.parse_security_result(),
                ConnectionState::AwaitVncChallenge => self.parse_vnc_challenge(),
                ConnectionState::AwaitClientInit => self.send_client_init(),
                ConnectionState::AwaitServerInit => self.parse_server_init(),
                ConnectionState::Running => {
                    if self.update.is_some() {
                        self.parse_update()
                    } else {
                        self.parse_server_message()
                    }
                }
            };
            match step {
                Step::Incomplete => break,
                Step::Advanced => {
                    // ClientInit is transient: it advances without consuming,
                    // so keep going even on an empty buffer.
                    if self.inbound.is_empty() && self.state != ConnectionState::AwaitClientInit {
                        break;
                    }
                }
            }
        }
        self.dispatching = false;
    }

    /// Called when the transport comes up: the server speaks first.
    pub fn handle_connect(&mut self) {
        self.state = ConnectionState::AwaitProtocolVersion;
        self.emit(ClientEvent::ConnectionChanged { connected: true });
    }

    /// Called when the transport goes away.
    ///
    /// Connection state resets to the start of the handshake, the
    /// framebuffer is discarded, every zlib stream is ended, and any pending
    /// challenge or in-flight decode progress is forgotten. The configured
    /// password survives for the next connection.
    pub fn handle_disconnect(&mut self) {
        self.state = ConnectionState::AwaitProtocolVersion;
        self.version = ProtocolVersion::Unknown;
        self.security_type = None;
        self.pixel_format = PixelFormat::rgb32();
        self.framebuffer.reset();
        self.desktop_name.clear();
        self.pending_challenge = None;
        self.inbound.clear();
        self.outbound.clear();
        self.failed = false;
        self.update = None;
        self.hextile.reset();
        self.zrle.reset();
        self.tight.reset();
        self.emit(ClientEvent::ConnectionChanged { connected: false });
    }

    /// Supplies the password, answering a buffered challenge if one is
    /// waiting.
    pub fn set_password(&mut self, password: String) {
        self.auth.set_password(password);
        if self.state != ConnectionState::AwaitVncChallenge {
            return;
        }
        if let Some(challenge) = self.pending_challenge.take() {
            if let Some(response) = self.auth.challenge_response(&challenge) {
                self.outbound.put_slice(&response);
                self.advance_after_auth();
                // Deferred wake-up: bytes may already be buffered.
                self.process();
            }
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    /// Marks the connection unusable until the transport disconnects.
    fn fail(&mut self) {
        self.failed = true;
        self.update = None;
    }

    // Handshaking parsers

    fn parse_protocol_version(&mut self) -> Step {
        if self.inbound.len() < 12 {
            return Step::Incomplete;
        }
        let banner = self.inbound.split_to(12);
        self.version = ProtocolVersion::from_banner(&banner);
        let Some(echo) = self.version.banner() else {
            error!(
                "{}",
                ProtocolError::UnsupportedProtocolVersion(
                    String::from_utf8_lossy(&banner).into_owned()
                )
            );
            self.fail();
            return Step::Advanced;
        };
        info!("VNC server speaks {:?}", self.version);
        self.emit(ClientEvent::ProtocolVersionChanged {
            version: self.version,
        });
        self.outbound.put_slice(echo);
        self.state = ConnectionState::AwaitSecurityList;
        Step::Advanced
    }

    fn parse_security_list(&mut self) -> Step {
        match self.version {
            ProtocolVersion::Rfb33 => self.parse_security_33(),
            _ => self.parse_security_37(),
        }
    }

    /// RFB 3.3: the server dictates the type as a 32-bit big-endian word.
    fn parse_security_33(&mut self) -> Step {
        if self.inbound.len() < 4 {
            return Step::Incomplete;
        }
        let word = u32::from_be_bytes([
            self.inbound[0],
            self.inbound[1],
            self.inbound[2],
            self.inbound[3],
        ]);
        if word == 0 {
            // A failure reason string follows the zero word.
            return self.parse_failure_reason(4, "security negotiation failed");
        }
        self.inbound.advance(4);
        let selected = SecurityType::from_wire(word as u8);
        match selected {
            SecurityType::None => {
                self.set_security_type(selected);
                self.state = ConnectionState::AwaitClientInit;
            }
            SecurityType::VncAuthentication => {
                self.set_security_type(selected);
                self.state = ConnectionState::AwaitVncChallenge;
            }
            other => {
                error!(
                    "{}",
                    ProtocolError::SecurityNegotiationFailed(format!(
                        "server dictated unsupported type {other:?}"
                    ))
                );
                self.fail();
            }
        }
        Step::Advanced
    }

    /// RFB 3.7/3.8: the server offers a list and the client picks.
    fn parse_security_37(&mut self) -> Step {
        let Some(&count) = self.inbound.first() else {
            return Step::Incomplete;
        };
        if count == 0 {
            return self.parse_failure_reason(1, "security negotiation failed");
        }
        let count = usize::from(count);
        if self.inbound.len() < 1 + count {
            return Step::Incomplete;
        }
        self.inbound.advance(1);
        let offered = self.inbound.split_to(count);

        let selected = if offered.contains(&SECURITY_TYPE_VNC_AUTH) {
            SecurityType::VncAuthentication
        } else if offered.contains(&SECURITY_TYPE_NONE) {
            SecurityType::None
        } else {
            SecurityType::Invalid
        };
        if selected == SecurityType::Invalid {
            error!(
                "{}",
                ProtocolError::SecurityNegotiationFailed(format!(
                    "no usable type in server offer {:?}",
                    offered.as_ref()
                ))
            );
            self.fail();
            return Step::Advanced;
        }

        self.outbound.put_u8(selected.to_wire());
        self.set_security_type(selected);
        self.state = match selected {
            SecurityType::VncAuthentication => ConnectionState::AwaitVncChallenge,
            _ if self.version == ProtocolVersion::Rfb38 => ConnectionState::AwaitSecurityResult,
            _ => ConnectionState::AwaitClientInit,
        };
        Step::Advanced
    }

    fn set_security_type(&mut self, security_type: SecurityType) {
        self.security_type = Some(security_type);
        self.emit(ClientEvent::SecurityTypeChanged { security_type });
    }

    /// Reads `skip` already-inspected bytes, a 4-byte length and the reason
    /// string, then gives up on the connection.
    fn parse_failure_reason(&mut self, skip: usize, context: &str) -> Step {
        if self.inbound.len() < skip + 4 {
            return Step::Incomplete;
        }
        let len = u32::from_be_bytes([
            self.inbound[skip],
            self.inbound[skip + 1],
            self.inbound[skip + 2],
            self.inbound[skip + 3],
        ]) as usize;
        if self.inbound.len() < skip + 4 + len {
            return Step::Incomplete;
        }
        self.inbound.advance(skip + 4);
        let reason = self.inbound.split_to(len);
        error!("{context}: {}", String::from_utf8_lossy(&reason));
        self.fail();
        Step::Advanced
    }

    fn parse_vnc_challenge(&mut self) -> Step {
        if self.inbound.len() < 16 {
            return Step::Incomplete;
        }
        let mut challenge = [0u8; 16];
        challenge.copy_from_slice(&self.inbound.split_to(16));

        if let Some(response) = self.auth.challenge_response(&challenge) {
            self.outbound.put_slice(&response);
            self.advance_after_auth();
        } else {
            // Hold the challenge until set_password supplies one.
            self.pending_challenge = Some(challenge);
            self.emit(ClientEvent::PasswordRequested);
        }
        Step::Advanced
    }

    fn advance_after_auth(&mut self) {
        self.state = if self.version == ProtocolVersion::Rfb33 {
            ConnectionState::AwaitClientInit
        } else {
            ConnectionState::AwaitSecurityResult
        };
    }

    fn parse_security_result(&mut self) -> Step {
        if self.inbound.len() < 4 {
            return Step::Incomplete;
        }
        let result = u32::from_be_bytes([
            self.inbound[0],
            self.inbound[1],
            self.inbound[2],
            self.inbound[3],
        ]);
        if result == SECURITY_RESULT_OK {
            self.inbound.advance(4);
            self.state = ConnectionState::AwaitClientInit;
            return Step::Advanced;
        }
        if self.version == ProtocolVersion::Rfb38 {
            // 3.8 appends a reason string; the server closes afterwards.
            return self.parse_failure_reason(4, "authentication failed");
        }
        self.inbound.advance(4);
        error!(
            "{}",
            ProtocolError::AuthenticationFailed(format!("security result {result}"))
        );
        self.fail();
        Step::Advanced
    }

    /// Transient state: sends ClientInit (shared flag set) and moves on.
    fn send_client_init(&mut self) -> Step {
        self.outbound.put_u8(1);
        self.state = ConnectionState::AwaitServerInit;
        Step::Advanced
    }

    fn parse_server_init(&mut self) -> Step {
        // Fixed part: width + height + pixel format + name length.
        if self.inbound.len() < 2 + 2 + 16 + 4 {
            return Step::Incomplete;
        }
        let name_len = u32::from_be_bytes([
            self.inbound[20],
            self.inbound[21],
            self.inbound[22],
            self.inbound[23],
        ]) as usize;
        if self.inbound.len() < 24 + name_len {
            return Step::Incomplete;
        }

        let framebuffer_width = self.inbound.get_u16();
        let framebuffer_height = self.inbound.get_u16();
        let pixel_format = PixelFormat::from_bytes(&mut self.inbound);
        self.inbound.advance(4); // name length, already peeked
        let name = self.inbound.split_to(name_len);
        let init = ServerInit {
            framebuffer_width,
            framebuffer_height,
            pixel_format,
            name: String::from_utf8_lossy(&name).into_owned(),
        };

        info!(
            "ServerInit: {}x{} \"{}\", {} bpp",
            init.framebuffer_width,
            init.framebuffer_height,
            init.name,
            init.pixel_format.bits_per_pixel
        );
        if !init.pixel_format.is_supported() {
            warn!(
                "{}",
                ProtocolError::UnsupportedPixelFormat {
                    bits_per_pixel: init.pixel_format.bits_per_pixel
                }
            );
        }

        self.framebuffer = Framebuffer::new(init.framebuffer_width, init.framebuffer_height);
        self.emit(ClientEvent::FramebufferSizeChanged {
            width: init.framebuffer_width,
            height: init.framebuffer_height,
        });
        self.pixel_format = init.pixel_format;
        self.desktop_name = init.name;

        self.send_set_pixel_format();
        self.send_set_encodings();
        self.send_framebuffer_update_request(false);
        self.state = ConnectionState::Running;
        Step::Advanced
    }

    // Client-to-server messages

    /// Echoes the server's pixel format back so it stays in effect.
    fn send_set_pixel_format(&mut self) {
        self.outbound.put_u8(CLIENT_MSG_SET_PIXEL_FORMAT);
        self.outbound.put_slice(&[0u8; 3]); // padding
        let format = self.pixel_format.clone();
        format.write_to(&mut self.outbound);
    }

    /// Advertises the supported encodings, best first.
    fn send_set_encodings(&mut self) {
        let encodings = [ENCODING_TIGHT, ENCODING_ZRLE, ENCODING_HEXTILE, ENCODING_RAW];
        self.outbound.put_u8(CLIENT_MSG_SET_ENCODINGS);
        self.outbound.put_u8(0); // padding
        self.outbound.put_u16(encodings.len() as u16);
        for encoding in encodings {
            self.outbound.put_i32(encoding);
        }
    }

    /// Requests an update covering the whole framebuffer.
    fn send_framebuffer_update_request(&mut self, incremental: bool) {
        self.outbound.put_u8(CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST);
        self.outbound.put_u8(u8::from(incremental));
        self.outbound.put_u16(0);
        self.outbound.put_u16(0);
        self.outbound.put_u16(self.framebuffer.width());
        self.outbound.put_u16(self.framebuffer.height());
    }

    // Server-to-client messages

    fn parse_server_message(&mut self) -> Step {
        let Some(&message_type) = self.inbound.first() else {
            return Step::Incomplete;
        };
        if message_type != SERVER_MSG_FRAMEBUFFER_UPDATE {
            error!("{}", ProtocolError::UnknownServerMessage(message_type));
            self.fail();
            return Step::Advanced;
        }
        // Message type, padding, big-endian rectangle count.
        if self.inbound.len() < 4 {
            return Step::Incomplete;
        }
        self.inbound.advance(2);
        let total_rects = self.inbound.get_u16();
        #[cfg(feature = "debug-logging")]
        log::debug!("FramebufferUpdate with {total_rects} rectangles");
        if total_rects == 0 {
            self.send_framebuffer_update_request(true);
        } else {
            self.update = Some(UpdateProgress {
                total_rects,
                current_rect: 0,
                header: None,
            });
        }
        Step::Advanced
    }

    /// Advances the in-flight framebuffer update by one unit: a rectangle
    /// header, or as much of a rectangle body as the decoder completes.
    fn parse_update(&mut self) -> Step {
        let rect = {
            let Some(update) = self.update.as_mut() else {
                return Step::Incomplete;
            };
            if update.header.is_none() {
                if self.inbound.len() < 12 {
                    return Step::Incomplete;
                }
                update.header = Some(Rectangle::read_header(&mut self.inbound));
            }
            update.header.expect("header read above")
        };

        let result = if rect.area() == 0 {
            DecodeResult::Done
        } else {
            match rect.encoding {
                ENCODING_RAW => raw::decode(
                    &mut self.inbound,
                    &rect,
                    &self.pixel_format,
                    &mut self.framebuffer,
                ),
                ENCODING_HEXTILE => self.hextile.decode(
                    &mut self.inbound,
                    &rect,
                    &self.pixel_format,
                    &mut self.framebuffer,
                ),
                ENCODING_ZRLE => self.zrle.decode(
                    &mut self.inbound,
                    &rect,
                    &self.pixel_format,
                    &mut self.framebuffer,
                ),
                ENCODING_TIGHT => self.tight.decode(
                    &mut self.inbound,
                    &rect,
                    &self.pixel_format,
                    &mut self.framebuffer,
                ),
                other => {
                    // Without knowing the payload length there is no way to
                    // resynchronize.
                    error!("{}", ProtocolError::UnsupportedEncoding(other));
                    DecodeResult::Fatal
                }
            }
        };

        match result {
            DecodeResult::Incomplete => Step::Incomplete,
            DecodeResult::Fatal => {
                self.fail();
                Step::Advanced
            }
            DecodeResult::Done => {
                self.emit(ClientEvent::ImageChanged {
                    region: Region::new(rect.x, rect.y, rect.width, rect.height),
                });
                let finished = {
                    let update = self.update.as_mut().expect("update in flight");
                    update.header = None;
                    update.current_rect += 1;
                    update.current_rect >= update.total_rects
                };
                if finished {
                    self.update = None;
                    // Keep the stream flowing.
                    self.send_framebuffer_update_request(true);
                }
                Step::Advanced
            }
        }
    }

    // Input events. Each call serializes one or more whole messages onto the
    // outbound buffer, so they are never interleaved with a partial message.

    fn send_key_event(&mut self, keysym: u32, down: bool) {
        self.outbound.put_u8(CLIENT_MSG_KEY_EVENT);
        self.outbound.put_u8(u8::from(down));
        self.outbound.put_u16(0); // padding
        self.outbound.put_u32(keysym);
    }

    fn send_pointer_event(&mut self, button_mask: u8, x: u16, y: u16) {
        self.outbound.put_u8(CLIENT_MSG_POINTER_EVENT);
        self.outbound.put_u8(button_mask);
        self.outbound.put_u16(x);
        self.outbound.put_u16(y);
    }

    /// Presses or releases a named key.
    pub fn send_key(&mut self, key: Key, down: bool) {
        self.send_key_event(key.keysym(), down);
    }

    /// Types text as press/release pairs, one per character.
    pub fn send_text(&mut self, text: &str) {
        for ch in text.chars() {
            let keysym = char_keysym(ch);
            self.send_key_event(keysym, true);
            self.send_key_event(keysym, false);
        }
    }

    /// Moves the pointer with no buttons held.
    pub fn pointer_move(&mut self, x: u16, y: u16) {
        self.send_pointer_event(0, x, y);
        self.pointer = (x, y);
    }

    /// Clicks a button at the given position.
    pub fn click(&mut self, x: u16, y: u16, button: MouseButton) {
        self.send_pointer_event(button.mask(), x, y);
        self.send_pointer_event(0, x, y);
        self.pointer = (x, y);
    }

    /// Drags from the last pointer position to `(x, y)` with a button held.
    pub fn drag(&mut self, x: u16, y: u16, button: MouseButton) {
        let (from_x, from_y) = self.pointer;
        self.send_pointer_event(button.mask(), from_x, from_y);
        self.send_pointer_event(button.mask(), x, y);
        self.send_pointer_event(0, x, y);
        self.pointer = (x, y);
    }
}
