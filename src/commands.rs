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

//! The RL78 bootloader command set, one function per protocol command.
//! Each function owns its request/response exchange and leaves block
//! iteration and higher-level orchestration to [`crate::session`].

use log::info;

use crate::codec::{self, encode_le24};
use crate::constants::{
    BAUD_RATE_115200, CMD_BAUD_RATE_SET, CMD_BLOCK_BLANK_CHECK, CMD_BLOCK_ERASE, CMD_CHECKSUM,
    CMD_PROGRAMMING, CMD_RESET, CMD_SILICON_SIGNATURE, CMD_VERIFY, DATA_CHUNK_SIZE, VOLTAGE_3V3,
};
use crate::error::{Error, Result};
use crate::serial_port::SerialAdapter;
use crate::signature::SiliconSignature;
use crate::status::StatusCode;
use crate::transport::Transport;

/// Result of a Blank Check command. The target reports "occupied" with
/// the same status byte the rest of the protocol treats as a hard error
/// (`0x1B`), so this is modeled as its own tri-state rather than folded
/// into [`StatusCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankState {
    Blank,
    Occupied,
}

/// The payload slice of a response frame: between the length byte and
/// the checksum byte.
fn payload_of(frame: &[u8]) -> &[u8] {
    &frame[2..frame.len() - 2]
}

/// Decode the status byte at `payload[index]`.
fn status_in(payload: &[u8], index: usize) -> Result<StatusCode> {
    let byte = *payload
        .get(index)
        .ok_or_else(|| Error::Framing("response frame has no status byte".into()))?;
    Ok(StatusCode::from_byte(byte))
}

/// Fail unless `payload[index]` is a Normal ACK.
fn require_ack(payload: &[u8], index: usize) -> Result<()> {
    let status = status_in(payload, index)?;
    if status.is_ack() {
        Ok(())
    } else {
        Err(Error::Command(status))
    }
}

/// `CMD_RESET` (0x00): ask the target to reset and re-enter the
/// bootloader's idle state.
pub fn reset<P: SerialAdapter>(transport: &mut Transport<'_, P>) -> Result<()> {
    let frame = codec::build_command(CMD_RESET, &[]);
    let reply = transport.exchange(&frame)?;
    require_ack(payload_of(&reply), 0)
}

/// `CMD_BAUD_RATE_SET` (0x9A): switch both ends to the bootloader's
/// fixed 115200 baud / 3.3V combination. Per the design notes, other
/// rate/voltage pairs are not exposed.
pub fn set_baud_rate<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
    baud_rate: u32,
) -> Result<()> {
    let frame = codec::build_command(CMD_BAUD_RATE_SET, &[BAUD_RATE_115200, VOLTAGE_3V3]);
    let reply = transport.exchange(&frame)?;
    let payload = payload_of(&reply);
    require_ack(payload, 0)?;

    if let (Some(&frequency_mhz), Some(&mode)) = (payload.get(1), payload.get(2)) {
        info!(
            "target reports {} MHz operation, {}",
            frequency_mhz,
            if mode == 0 { "full-speed" } else { "wide-voltage" }
        );
    }

    transport.set_port_baud_rate(baud_rate)
}

/// `CMD_SILICON_SIGNATURE` (0xC0): fetch device identity and flash
/// layout.
pub fn silicon_signature<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
) -> Result<SiliconSignature> {
    let frame = codec::build_command(CMD_SILICON_SIGNATURE, &[]);
    let ack = transport.exchange(&frame)?;
    require_ack(payload_of(&ack), 0)?;

    let data_frame = transport.receive()?;
    SiliconSignature::parse(payload_of(&data_frame))
}

/// `CMD_BLOCK_BLANK_CHECK` (0x32): check whether the 1024-byte block
/// spanning `[start, end]` (both 24-bit addresses, inclusive) is
/// erased.
pub fn blank_check<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
    start: u32,
    end: u32,
) -> Result<BlankState> {
    let mut info = Vec::with_capacity(7);
    info.extend_from_slice(&encode_le24(start));
    info.extend_from_slice(&encode_le24(end));
    info.push(0x00); // specified block.

    let frame = codec::build_command(CMD_BLOCK_BLANK_CHECK, &info);
    let reply = transport.exchange(&frame)?;
    let status = status_in(payload_of(&reply), 0)?;

    match status {
        StatusCode::NormalAck => Ok(BlankState::Blank),
        StatusCode::InternalVerifyOrBlankError => Ok(BlankState::Occupied),
        other => Err(Error::Command(other)),
    }
}

/// `CMD_BLOCK_ERASE` (0x22): erase the 1024-byte block starting at
/// `block_start` (a 24-bit address, expected to be block-aligned).
pub fn erase<P: SerialAdapter>(transport: &mut Transport<'_, P>, block_start: u32) -> Result<()> {
    let info = encode_le24(block_start);
    let frame = codec::build_command(CMD_BLOCK_ERASE, &info);
    let reply = transport.exchange(&frame)?;
    require_ack(payload_of(&reply), 0)
}

/// `CMD_PROGRAMMING` (0x40): write `chunks` (each exactly
/// [`DATA_CHUNK_SIZE`] bytes) over `[start, end]` inclusive. The caller
/// is responsible for chunking and padding a binary image; see
/// [`crate::session`].
pub fn program<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
    start: u32,
    end: u32,
    chunks: &[[u8; DATA_CHUNK_SIZE]],
) -> Result<()> {
    let mut info = Vec::with_capacity(6);
    info.extend_from_slice(&encode_le24(start));
    info.extend_from_slice(&encode_le24(end));

    let frame = codec::build_command(CMD_PROGRAMMING, &info);
    let ack = transport.exchange(&frame)?;
    require_ack(payload_of(&ack), 0)?;

    let final_frame = stream_chunks(transport, chunks)?;
    require_ack(payload_of(&final_frame), 0)
}

/// `CMD_VERIFY` (0x13): compare `chunks` against target flash over
/// `[start, end]` inclusive. The terminal reply must ACK at both
/// payload position 0 and 1.
pub fn verify<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
    start: u32,
    end: u32,
    chunks: &[[u8; DATA_CHUNK_SIZE]],
) -> Result<()> {
    let mut info = Vec::with_capacity(6);
    info.extend_from_slice(&encode_le24(start));
    info.extend_from_slice(&encode_le24(end));

    let frame = codec::build_command(CMD_VERIFY, &info);
    let ack = transport.exchange(&frame)?;
    require_ack(payload_of(&ack), 0)?;

    let final_frame = stream_chunks(transport, chunks)?;
    let payload = payload_of(&final_frame);
    require_ack(payload, 0)?;
    require_ack(payload, 1)
}

/// Stream `chunks` as data frames, acknowledging each one, then collect
/// the one additional final status frame the device emits after the
/// last chunk's ack. Shared by Programming and Verify, which differ
/// only in how that final frame is interpreted.
fn stream_chunks<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
    chunks: &[[u8; DATA_CHUNK_SIZE]],
) -> Result<Vec<u8>> {
    for (index, chunk) in chunks.iter().enumerate() {
        let last = index + 1 == chunks.len();
        let frame = codec::build_data(chunk, last);
        let reply = transport.exchange(&frame)?;
        require_ack(payload_of(&reply), 0)?;
    }
    transport.receive()
}

/// `CMD_CHECKSUM` (0xB0): ask the target for its own checksum of
/// `[start, end]` inclusive. The protocol returns a 16-bit checksum;
/// see the design notes for why this crate does not attempt to
/// reinterpret it as anything wider.
pub fn checksum<P: SerialAdapter>(
    transport: &mut Transport<'_, P>,
    start: u32,
    end: u32,
) -> Result<u16> {
    let mut info = Vec::with_capacity(6);
    info.extend_from_slice(&encode_le24(start));
    info.extend_from_slice(&encode_le24(end));

    let frame = codec::build_command(CMD_CHECKSUM, &info);
    let ack = transport.exchange(&frame)?;
    require_ack(payload_of(&ack), 0)?;

    let data_frame = transport.receive()?;
    let payload = payload_of(&data_frame);
    if payload.len() < 2 {
        return Err(Error::Framing("checksum response too short".into()));
    }
    Ok(u16::from(payload[0]) | (u16::from(payload[1]) << 8))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::MockPort;
    use crate::transport::NullTrace;

    fn ack_frame() -> Vec<u8> {
        codec::build_command(0x06, &[])
    }

    #[test]
    fn reset_waits_for_and_requires_an_ack() {
        let mut port = MockPort::with_inbound(ack_frame());
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);
        reset(&mut transport).unwrap();
        assert_eq!(port.written(), codec::build_command(CMD_RESET, &[]));
    }

    #[test]
    fn reset_propagates_a_non_ack_status() {
        let reply = codec::build_command(0x04, &[]); // command number error.
        let mut port = MockPort::with_inbound(reply);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);
        let err = reset(&mut transport).unwrap_err();
        assert!(matches!(err, Error::Command(StatusCode::CommandNumberError)));
    }

    #[test]
    fn blank_check_reports_occupied_without_erroring() {
        let reply = codec::build_command(0x1B, &[]);
        let mut port = MockPort::with_inbound(reply);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        let state = blank_check(&mut transport, 0x1000, 0x13FF).unwrap();
        assert_eq!(state, BlankState::Occupied);
    }

    #[test]
    fn blank_check_reports_blank_on_ack() {
        let mut port = MockPort::with_inbound(ack_frame());
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        let state = blank_check(&mut transport, 0x1000, 0x13FF).unwrap();
        assert_eq!(state, BlankState::Blank);
    }

    #[test]
    fn blank_check_propagates_a_genuine_protocol_error() {
        let reply = codec::build_command(0x10, &[]); // protect error.
        let mut port = MockPort::with_inbound(reply);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        let err = blank_check(&mut transport, 0x1000, 0x13FF).unwrap_err();
        assert!(matches!(err, Error::Command(StatusCode::ProtectError)));
    }

    #[test]
    fn program_sends_command_then_every_chunk_then_a_final_confirm() {
        let mut inbound = ack_frame(); // ack for CMD_PROGRAMMING.
        inbound.extend_from_slice(&ack_frame()); // ack for the one chunk.
        inbound.extend_from_slice(&ack_frame()); // final confirm frame.
        let mut port = MockPort::with_inbound(inbound);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        let chunks = [[0xFFu8; DATA_CHUNK_SIZE]];
        program(&mut transport, 0x1000, 0x10FF, &chunks).unwrap();

        let written = port.written();
        let expected_cmd = codec::build_command(CMD_PROGRAMMING, &{
            let mut info = encode_le24(0x1000).to_vec();
            info.extend_from_slice(&encode_le24(0x10FF));
            info
        });
        assert!(written.starts_with(&expected_cmd));
    }

    #[test]
    fn verify_fails_when_only_the_first_terminal_status_acks() {
        let mut inbound = ack_frame(); // ack for CMD_VERIFY.
        inbound.extend_from_slice(&ack_frame()); // ack for the one chunk.
        inbound.extend_from_slice(&codec::build_command(0x06, &[0x0F])); // verify error in 2nd slot.
        let mut port = MockPort::with_inbound(inbound);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        let chunks = [[0xFFu8; DATA_CHUNK_SIZE]];
        let err = verify(&mut transport, 0x1000, 0x10FF, &chunks).unwrap_err();
        assert!(matches!(err, Error::Command(StatusCode::VerifyError)));
    }

    #[test]
    fn checksum_decodes_the_16_bit_reply_with_no_status_byte() {
        let mut inbound = ack_frame();
        inbound.extend_from_slice(&codec::build_command(0x34, &[0x12]));
        let mut port = MockPort::with_inbound(inbound);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        let value = checksum(&mut transport, 0x1000, 0x13FF).unwrap();
        assert_eq!(value, 0x1234);
    }

    #[test]
    fn set_baud_rate_reconfigures_the_port_after_the_ack() {
        let reply = codec::build_command(0x06, &[25, 0x00]);
        let mut port = MockPort::with_inbound(reply);
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        set_baud_rate(&mut transport, 115200).unwrap();
        drop(transport);
        assert!(port
            .calls()
            .iter()
            .any(|call| *call == crate::test_support::Call::SetBaudRate(115200)));
    }

    #[test]
    fn erase_takes_only_a_single_block_address() {
        let mut port = MockPort::with_inbound(ack_frame());
        let mut trace = NullTrace;
        let mut transport = Transport::new(&mut port, &mut trace);

        erase(&mut transport, 0x1000).unwrap();
        assert_eq!(
            port.written(),
            codec::build_command(CMD_BLOCK_ERASE, &encode_le24(0x1000))
        );
    }
}
