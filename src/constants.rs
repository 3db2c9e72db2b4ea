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

use std::time::Duration;

pub const CMD_RESET: u8             = 0x00;
pub const CMD_VERIFY: u8            = 0x13;
pub const CMD_BLOCK_ERASE: u8       = 0x22;
pub const CMD_BLOCK_BLANK_CHECK: u8 = 0x32;
pub const CMD_PROGRAMMING: u8       = 0x40;
pub const CMD_BAUD_RATE_SET: u8     = 0x9A;
pub const CMD_CHECKSUM: u8          = 0xB0;
pub const CMD_SILICON_SIGNATURE: u8 = 0xC0;

pub const FRAME_HEADER_COMMAND: u8 = 0x01;
pub const FRAME_HEADER_DATA: u8    = 0x02;
pub const FRAME_FOOTER_END: u8     = 0x03;
pub const FRAME_FOOTER_MORE: u8    = 0x17;

/// Parameters for `CMD_BAUD_RATE_SET`: pin the target back to 115200 baud
/// at 3.3V. See the Open Questions note in the design notes before
/// generalizing these.
pub const BAUD_RATE_115200: u8 = 0x00;
pub const VOLTAGE_3V3: u8      = 0x21;

/// Size of one erase/program/verify window in target flash.
pub const BLOCK_SIZE: usize = 1024;
/// Size of one outbound data frame's payload during Programming/Verify.
pub const DATA_CHUNK_SIZE: usize = 256;
/// Padding byte used to fill a short final block.
pub const PAD_BYTE: u8 = 0xFF;

/// Largest legal frame: 256 data bytes plus the 4-byte envelope.
pub const MAX_FRAME_LEN: usize = 260;

/// Back-off between empty, non-blocking reads while waiting for a frame.
pub const POLL_BACKOFF: Duration = Duration::from_micros(10);
/// Settle time between steps of the entry/shutdown sequences.
pub const ENTRY_SLEEP: Duration = Duration::from_millis(1);
