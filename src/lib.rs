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

//! RFB (VNC) client library.
//!
//! This crate implements the client side of the Remote Framebuffer protocol
//! (RFC 6143): it negotiates protocol version and security over a byte
//! stream, authenticates with the DES challenge-response scheme when asked,
//! mirrors the remote screen into an in-memory RGB framebuffer that is
//! updated incrementally, and sends keyboard and pointer events back to the
//! server.
//!
//! # Architecture
//!
//! The implementation is organized into several key components:
//!
//! - **`protocol`**: RFB protocol constants, message types, and data structures
//! - **`session`**: the stream-driven protocol state machine and update dispatch
//! - **`client`**: the public facade binding a session to an async transport
//! - **`framebuffer`**: the canonical RGB pixel grid and change regions
//! - **`encoding`**: rectangle decoders (Raw, Hextile, ZRLE, Tight)
//! - **`auth`**: VNC authentication (DES with bit-reversed keys)
//! - **`keysym`**: named-key to X11 keysym mapping
//! - **`events`**: events delivered to the application
//!
//! # Features
//!
//! - **Protocol versions**: RFB 3.3, 3.7 and 3.8
//! - **Encodings**: Tight (zlib/JPEG), ZRLE, Hextile and Raw, preferred in
//!   that order, with persistent zlib dictionaries across rectangles
//! - **Fragment-safe parsing**: every message may arrive in arbitrarily
//!   small pieces; parsing resumes without loss
//! - **Transport-agnostic**: any `AsyncRead + AsyncWrite` stream works
//!
//! # Example Flow
//!
//! ```ignore
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:5900").await?;
//! let (client, mut events) = VncClient::new(ClientConfig::default());
//! client.attach(stream).await;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ClientEvent::ImageChanged { region } => { /* repaint */ }
//!         ClientEvent::PasswordRequested => client.set_password("secret").await,
//!         _ => {}
//!     }
//! }
//! ```

pub mod auth;
pub mod client;
pub mod encoding;
pub mod events;
pub mod framebuffer;
pub mod keysym;
pub mod protocol;
pub mod session;

pub use client::{ClientConfig, VncClient};
pub use events::{ClientEvent, ProtocolError};
pub use framebuffer::{Framebuffer, Region, Rgb};
pub use keysym::Key;
pub use protocol::{PixelFormat, ProtocolVersion, SecurityType};
pub use session::{ConnectionState, MouseButton, ProtocolSession};
