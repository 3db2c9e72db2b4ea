// Copyright 2021 RL78 SBL Programmer Developers
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

//! Frame serialization and parsing for the RL78 bootloader wire protocol.
//!
//! A frame is `header ∥ len ∥ data[len] ∥ checksum ∥ footer`, where `len`
//! is the wire encoding of `data`'s length (0 means 256) and `checksum` is
//! [`checksum`] of `data`.

use crate::constants::{
    DATA_CHUNK_SIZE, FRAME_FOOTER_END, FRAME_FOOTER_MORE, FRAME_HEADER_COMMAND,
    FRAME_HEADER_DATA,
};
use crate::error::Error;

/// Compute the checksum of `data`: `(-len - sum(data)) mod 256`, where
/// `len` is `data.len()` (always 1..=256 for real frames).
pub fn checksum(data: &[u8]) -> u8 {
    let mut sum: i32 = -(data.len() as i32);
    for &byte in data {
        sum -= i32::from(byte);
    }
    (sum & 0xFF) as u8
}

/// Encode an effective length (1..=256) as the wire length byte (0 means
/// 256).
fn len_byte(effective_len: usize) -> u8 {
    if effective_len == 256 {
        0
    } else {
        effective_len as u8
    }
}

/// The effective (decoded) length of `buf`, or `None` if `buf` is too
/// short to contain a length byte.
fn effective_len(buf: &[u8]) -> Option<usize> {
    let raw = *buf.get(1)?;
    Some(if raw == 0 { 256 } else { raw as usize })
}

/// Build a command request frame: `0x01 ∥ len ∥ cmd ∥ info ∥ checksum ∥ 0x03`.
pub fn build_command(cmd: u8, info: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + info.len());
    payload.push(cmd);
    payload.extend_from_slice(info);

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.push(FRAME_HEADER_COMMAND);
    frame.push(len_byte(payload.len()));
    frame.extend_from_slice(&payload);
    frame.push(checksum(&payload));
    frame.push(FRAME_FOOTER_END);
    frame
}

/// Build an outbound data frame carrying one 256-byte chunk.
/// `last` selects the footer: `0x03` for the final chunk, `0x17` if more
/// chunks follow.
pub fn build_data(payload: &[u8; DATA_CHUNK_SIZE], last: bool) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + DATA_CHUNK_SIZE);
    frame.push(FRAME_HEADER_DATA);
    frame.push(0x00); // always 256 bytes.
    frame.extend_from_slice(payload);
    frame.push(checksum(payload));
    frame.push(if last {
        FRAME_FOOTER_END
    } else {
        FRAME_FOOTER_MORE
    });
    frame
}

/// Returns true once `buf` holds a complete frame under the length
/// field's encoding.
pub fn is_complete(buf: &[u8]) -> bool {
    if buf.len() < 5 {
        return false;
    }
    match effective_len(buf) {
        Some(len) => len == buf.len() - 4,
        None => false,
    }
}

/// Validate that `buf` is a complete frame whose checksum matches its
/// payload. The footer byte is not otherwise interpreted here.
pub fn validate(buf: &[u8]) -> Result<(), Error> {
    if !is_complete(buf) {
        return Err(Error::Framing(format!(
            "incomplete frame ({} bytes)",
            buf.len()
        )));
    }

    let len = effective_len(buf).expect("checked by is_complete");
    let data = &buf[2..2 + len];
    let expected = checksum(data);
    let actual = buf[2 + len];

    if expected != actual {
        return Err(Error::Framing(format!(
            "checksum mismatch: expected {:#04x}, found {:#04x}",
            expected, actual
        )));
    }

    Ok(())
}

/// Encode a 24-bit address as three little-endian bytes.
pub fn encode_le24(value: u32) -> [u8; 3] {
    [
        (value & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        ((value >> 16) & 0xFF) as u8,
    ]
}

/// Decode three little-endian bytes into a 24-bit address.
pub fn decode_le24(bytes: [u8; 3]) -> u32 {
    u32::from(bytes[0]) | (u32::from(bytes[1]) << 8) | (u32::from(bytes[2]) << 16)
}
