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

//! VNC authentication implementation.
//!
//! This module implements the client half of VNC Authentication (security
//! type 2) as specified in RFC 6143 Section 7.2.2. It uses DES encryption
//! with a VNC-specific bit reversal quirk for challenge-response
//! authentication.
//!
//! # Protocol
//!
//! The VNC authentication handshake works as follows:
//! 1. Server generates a 16-byte random challenge
//! 2. Server sends the challenge to the client
//! 3. Client encrypts the challenge using the password as the DES key (with
//!    bit-reversed bytes)
//! 4. Client sends the encrypted result back to the server
//! 5. Server verifies the response matches its own encryption of the challenge
//!
//! # Security Note
//!
//! VNC Authentication is a legacy protocol and has known security limitations.
//! It should only be used on trusted networks or in conjunction with TLS/SSL
//! tunneling.

use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;

/// Handles the client side of VNC Authentication.
///
/// This struct holds the configured password and produces the DES-encrypted
/// response for a server challenge. The password may be supplied before the
/// connection or later, in answer to a buffered challenge.
pub struct VncAuth {
    /// The VNC password, if set.
    password: Option<String>,
}

impl VncAuth {
    /// Creates a new `VncAuth` instance.
    ///
    /// # Arguments
    ///
    /// * `password` - An `Option<String>` containing the VNC password. If
    ///   `None`, challenges are buffered until a password is supplied.
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }

    /// Stores or replaces the password.
    pub fn set_password(&mut self, password: String) {
        self.password = Some(password);
    }

    /// Whether a password has been configured.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Computes the 16-byte response for a server challenge.
    ///
    /// Returns `None` when no password has been configured yet.
    pub fn challenge_response(&self, challenge: &[u8; 16]) -> Option<[u8; 16]> {
        self.password
            .as_ref()
            .map(|password| encrypt_challenge(challenge, password))
    }
}

/// Encrypts a 16-byte challenge with the VNC password using DES encryption.
///
/// This function implements the VNC-specific DES encryption, which involves
/// reversing the bits of each password byte before using it as the DES key.
/// The 16-byte challenge is encrypted as two 8-byte DES blocks in ECB mode.
fn encrypt_challenge(challenge: &[u8; 16], password: &str) -> [u8; 16] {
    let cipher = Des::new_from_slice(&vnc_key(password)).expect("8-byte key");

    let mut response = [0u8; 16];

    // First block
    let mut block1_bytes = [0u8; 8];
    block1_bytes.copy_from_slice(&challenge[0..8]);
    let mut block1 = block1_bytes.into();
    cipher.encrypt_block(&mut block1);
    response[0..8].copy_from_slice(&block1);

    // Second block
    let mut block2_bytes = [0u8; 8];
    block2_bytes.copy_from_slice(&challenge[8..16]);
    let mut block2 = block2_bytes.into();
    cipher.encrypt_block(&mut block2);
    response[8..16].copy_from_slice(&block2);

    response
}

/// Builds the effective 8-byte DES key from a password.
///
/// The first 8 password characters are taken as Latin-1 bytes (truncating
/// longer passwords, zero-padding shorter ones) and each byte's bits are
/// reversed, the historical RFB deviation from standard DES key handling.
fn vnc_key(password: &str) -> [u8; 8] {
    let mut key = [0u8; 8];
    for (slot, ch) in key.iter_mut().zip(password.chars()) {
        *slot = reverse_bits((ch as u32 & 0xFF) as u8);
    }
    key
}

/// Reverses the bits within a single byte.
///
/// This utility function is used specifically in VNC authentication to
/// implement a historical quirk where password bytes have their bits reversed
/// before being used as a DES key.
///
/// # Example
///
/// `0b10110001` (177) becomes `0b10001101` (141).
fn reverse_bits(byte: u8) -> u8 {
    let mut result = 0u8;
    for i in 0..8 {
        if byte & (1 << i) != 0 {
            result |= 1 << (7 - i);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn des_ecb(key: [u8; 8], plain: [u8; 8]) -> [u8; 8] {
        let cipher = Des::new_from_slice(&key).expect("8-byte key");
        let mut block = plain.into();
        cipher.encrypt_block(&mut block);
        block.into()
    }

    // FIPS 46-3 vectors, independent of any VNC usage.

    #[test]
    fn des_zero_key_zero_plaintext() {
        assert_eq!(
            des_ecb([0; 8], [0; 8]),
            [0x8C, 0xA6, 0x4D, 0xE9, 0xC1, 0xB1, 0x23, 0xA7]
        );
    }

    #[test]
    fn des_classic_now_is_the_time_vector() {
        assert_eq!(
            des_ecb(
                [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF],
                [0x4E, 0x6F, 0x77, 0x20, 0x69, 0x73, 0x20, 0x74]
            ),
            [0x3F, 0xA4, 0x0E, 0x8A, 0x98, 0x4D, 0x48, 0x15]
        );
    }

    #[test]
    fn des_all_ones_vector() {
        assert_eq!(
            des_ecb([0xFF; 8], [0xFF; 8]),
            [0x73, 0x59, 0xB2, 0x16, 0x3E, 0x4E, 0xDC, 0x58]
        );
    }

    #[test]
    fn des_descending_key_vector() {
        assert_eq!(
            des_ecb(
                [0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32, 0x10],
                [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]
            ),
            [0xED, 0x39, 0xD9, 0x50, 0xFA, 0x74, 0xBC, 0xC4]
        );
    }

    #[test]
    fn bit_reversal() {
        assert_eq!(reverse_bits(0b1011_0001), 0b1000_1101);
        assert_eq!(reverse_bits(0x00), 0x00);
        assert_eq!(reverse_bits(0xFF), 0xFF);
        assert_eq!(reverse_bits(0x80), 0x01);
    }

    #[test]
    fn vnc_key_reverses_password_bytes() {
        // "password" = 70 61 73 73 77 6F 72 64, bit-reversed per byte.
        assert_eq!(
            vnc_key("password"),
            [0x0E, 0x86, 0xCE, 0xCE, 0xEE, 0xF6, 0x4E, 0x26]
        );
    }

    #[test]
    fn vnc_key_truncates_and_pads() {
        assert_eq!(vnc_key("passwordlonger"), vnc_key("password"));
        let short = vnc_key("ab");
        assert_eq!(&short[2..], &[0u8; 6]);
    }

    #[test]
    fn challenge_response_for_password_and_zero_challenge() {
        let auth = VncAuth::new(Some("password".to_string()));
        let response = auth.challenge_response(&[0u8; 16]).unwrap();
        // Both halves encrypt the same zero block under the same key.
        assert_eq!(response[0..8], response[8..16]);
        let expected = des_ecb(vnc_key("password"), [0u8; 8]);
        assert_eq!(&response[0..8], &expected);
    }

    #[test]
    fn empty_password_yields_zero_key_response() {
        let auth = VncAuth::new(Some(String::new()));
        let response = auth.challenge_response(&[0u8; 16]).unwrap();
        let expected = [0x8C, 0xA6, 0x4D, 0xE9, 0xC1, 0xB1, 0x23, 0xA7];
        assert_eq!(&response[0..8], &expected);
        assert_eq!(&response[8..16], &expected);
    }

    #[test]
    fn no_password_produces_no_response() {
        let auth = VncAuth::new(None);
        assert!(auth.challenge_response(&[0u8; 16]).is_none());
        assert!(!auth.has_password());
    }
}
