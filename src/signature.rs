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

//! Parsed response to the Silicon Signature command.

use std::fmt;

use crate::codec::decode_le24;
use crate::error::{Error, Result};

/// Identity and flash layout of the connected target, parsed from the
/// Silicon Signature command's data frame (the second of its two
/// replies; the first is a plain status frame).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiliconSignature {
    pub device_code: [u8; 3],
    /// 10-byte ASCII device name, trimmed of trailing padding.
    pub device_name: String,
    pub code_flash_last_address: u32,
    pub data_flash_last_address: u32,
    pub firmware_version: [u8; 3],
}

impl SiliconSignature {
    /// Parse the data payload of a Silicon Signature data frame: device
    /// code (3 B), ASCII name (10 B), code-flash last address (3 B LE),
    /// data-flash last address (3 B LE), firmware version (3 B) — 22
    /// bytes total, with no status byte of its own.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 22 {
            return Err(Error::Framing(format!(
                "silicon signature frame too short ({} bytes)",
                payload.len()
            )));
        }

        let device_code = [payload[0], payload[1], payload[2]];
        let device_name = String::from_utf8_lossy(&payload[3..13])
            .trim_end()
            .to_string();

        let code_flash_last_address = decode_le24([payload[13], payload[14], payload[15]]);
        let data_flash_last_address = decode_le24([payload[16], payload[17], payload[18]]);
        let firmware_version = [payload[19], payload[20], payload[21]];

        Ok(SiliconSignature {
            device_code,
            device_name,
            code_flash_last_address,
            data_flash_last_address,
            firmware_version,
        })
    }
}

impl fmt::Display for SiliconSignature {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Device name       : {}", self.device_name)?;
        writeln!(
            fmt,
            "Device code       : {:02x}{:02x}{:02x}",
            self.device_code[0], self.device_code[1], self.device_code[2]
        )?;
        writeln!(
            fmt,
            "Code flash (last) : {:06x}",
            self.code_flash_last_address
        )?;
        writeln!(
            fmt,
            "Data flash (last) : {:06x}",
            self.data_flash_last_address
        )?;
        write!(
            fmt,
            "Firmware version  : {}.{}.{}",
            self.firmware_version[0], self.firmware_version[1], self.firmware_version[2]
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_payload() -> Vec<u8> {
        let mut data = vec![0x35u8, 0x00, 0x00];
        data.extend_from_slice(b"RL78/G13  ");
        data.extend_from_slice(&[0x00, 0x10, 0x00]);
        data.extend_from_slice(&[0x00, 0xF0, 0x00]);
        data.extend_from_slice(&[0x01, 0x02, 0x03]);
        data
    }

    #[test]
    fn parses_device_name_and_addresses() {
        let sig = SiliconSignature::parse(&sample_payload()).unwrap();
        assert_eq!(sig.device_code, [0x35, 0x00, 0x00]);
        assert_eq!(sig.device_name, "RL78/G13");
        assert_eq!(sig.code_flash_last_address, 0x001000);
        assert_eq!(sig.data_flash_last_address, 0x00F000);
        assert_eq!(sig.firmware_version, [0x01, 0x02, 0x03]);
    }

    #[test]
    fn rejects_a_short_frame() {
        assert!(matches!(
            SiliconSignature::parse(&[0x06, 0x35]),
            Err(Error::Framing(_))
        ));
    }

    #[test]
    fn display_renders_one_field_per_line() {
        let sig = SiliconSignature::parse(&sample_payload()).unwrap();
        let rendered = sig.to_string();
        assert!(rendered.contains("Device name       : RL78/G13"));
        assert!(rendered.contains("Code flash (last) : 001000"));
        assert!(rendered.contains("Firmware version  : 1.2.3"));
    }
}
