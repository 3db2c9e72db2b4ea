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

//! A fake [`SerialAdapter`] shared by unit tests across the crate, in the
//! same spirit as the `DummySerialPort` used to test the original TI
//! bootloader driver.

use std::collections::VecDeque;

use crate::error::Result;
use crate::serial_port::SerialAdapter;

/// One recorded call against a [`MockPort`], in the order it happened.
/// Used by the entry-sequence test, which cares about call ordering, not
/// just which calls were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Write(Vec<u8>),
    Flush,
    SetDtr(bool),
    SetBreak(bool),
    SetBaudRate(u32),
}

/// A fake serial port. Bytes queued with [`MockPort::with_inbound`] (or
/// [`MockPort::push_inbound`]) are handed back one at a time from
/// `read_byte`; every call is recorded into `calls` for assertions.
pub struct MockPort {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    calls: Vec<Call>,
}

impl MockPort {
    pub fn new() -> Self {
        MockPort {
            inbound: VecDeque::new(),
            written: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_inbound(bytes: Vec<u8>) -> Self {
        let mut port = MockPort::new();
        port.push_inbound(&bytes);
        port
    }

    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.clone()
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }
}

impl Default for MockPort {
    fn default() -> Self {
        MockPort::new()
    }
}

impl SerialAdapter for MockPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.written.extend_from_slice(data);
        self.calls.push(Call::Write(data.to_vec()));
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.inbound.pop_front())
    }

    fn flush(&mut self) -> Result<()> {
        self.calls.push(Call::Flush);
        Ok(())
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        self.calls.push(Call::SetDtr(level));
        Ok(())
    }

    fn set_break(&mut self, level: bool) -> Result<()> {
        self.calls.push(Call::SetBreak(level));
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.calls.push(Call::SetBaudRate(baud_rate));
        Ok(())
    }
}
