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

//! Device status bytes, decoded into their documented meaning instead of
//! being passed around as bare integers.

use std::fmt;

/// A status byte reported by the target in a status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    CommandNumberError,
    ParameterError,
    NormalAck,
    ChecksumError,
    VerifyError,
    ProtectError,
    NegativeAck,
    EraseError,
    InternalVerifyOrBlankError,
    WriteError,
    /// Any status byte not documented by the protocol.
    Unknown(u8),
}

impl StatusCode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x04 => StatusCode::CommandNumberError,
            0x05 => StatusCode::ParameterError,
            0x06 => StatusCode::NormalAck,
            0x07 => StatusCode::ChecksumError,
            0x0F => StatusCode::VerifyError,
            0x10 => StatusCode::ProtectError,
            0x15 => StatusCode::NegativeAck,
            0x1A => StatusCode::EraseError,
            0x1B => StatusCode::InternalVerifyOrBlankError,
            0x1C => StatusCode::WriteError,
            other => StatusCode::Unknown(other),
        }
    }

    pub fn byte(self) -> u8 {
        match self {
            StatusCode::CommandNumberError => 0x04,
            StatusCode::ParameterError => 0x05,
            StatusCode::NormalAck => 0x06,
            StatusCode::ChecksumError => 0x07,
            StatusCode::VerifyError => 0x0F,
            StatusCode::ProtectError => 0x10,
            StatusCode::NegativeAck => 0x15,
            StatusCode::EraseError => 0x1A,
            StatusCode::InternalVerifyOrBlankError => 0x1B,
            StatusCode::WriteError => 0x1C,
            StatusCode::Unknown(b) => b,
        }
    }

    pub fn is_ack(self) -> bool {
        matches!(self, StatusCode::NormalAck)
    }

    fn text(self) -> &'static str {
        match self {
            StatusCode::CommandNumberError => "Command number error",
            StatusCode::ParameterError => "Parameter error",
            StatusCode::NormalAck => "Normal ACK",
            StatusCode::ChecksumError => "Checksum error",
            StatusCode::VerifyError => "Verify error",
            StatusCode::ProtectError => "Protect error",
            StatusCode::NegativeAck => "Negative ACK",
            StatusCode::EraseError => "Erase error",
            StatusCode::InternalVerifyOrBlankError => {
                "Internal-verify/blank error"
            }
            StatusCode::WriteError => "Write error",
            StatusCode::Unknown(_) => "Unknown error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} ({:#04x})", self.text(), self.byte())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_documented_codes() {
        for &byte in &[
            0x04, 0x05, 0x06, 0x07, 0x0F, 0x10, 0x15, 0x1A, 0x1B, 0x1C,
        ] {
            assert_eq!(StatusCode::from_byte(byte).byte(), byte);
        }
    }

    #[test]
    fn unknown_code_keeps_its_byte() {
        let status = StatusCode::from_byte(0x99);
        assert_eq!(status, StatusCode::Unknown(0x99));
        assert_eq!(status.byte(), 0x99);
        assert!(!status.is_ack());
    }

    #[test]
    fn blank_check_occupied_is_not_an_ack() {
        let status = StatusCode::from_byte(0x1B);
        assert_eq!(status, StatusCode::InternalVerifyOrBlankError);
        assert!(!status.is_ack());
    }

    #[test]
    fn display_matches_documented_text() {
        assert_eq!(
            StatusCode::ProtectError.to_string(),
            "Protect error (0x10)"
        );
    }
}
