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

//! # RL78 Serial Bootloader Interface library
//!
//! This is a library to work with the single-wire/two-wire UART bootloader
//! built into Renesas RL78 microcontrollers: entering bootloader mode,
//! framing and exchanging protocol commands, and driving a full
//! erase/program/verify session from a binary image.
//!
//! # See also
//!
//! - Renesas RL78 Flash Self Programming Library / on-chip debugging
//!   documentation for the one-wire/two-wire UART bootloader protocol this
//!   crate implements.

#[rustfmt::skip]
pub mod constants;

pub mod codec;
pub mod commands;
pub mod entry;
pub mod error;
pub mod serial_port;
pub mod session;
pub mod signature;
pub mod status;
pub mod trace;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use session::{ChecksumReport, Mode, ProgressSink, SessionConfig, SessionState};
pub use signature::SiliconSignature;
pub use status::StatusCode;
