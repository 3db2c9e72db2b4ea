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

//! Frame-level transport over a [`SerialAdapter`]: assembling bytes into
//! frames, validating them, and handing whole frames to an injected
//! [`TraceSink`] instead of writing to a global log.

use crate::codec;
use crate::constants::{MAX_FRAME_LEN, POLL_BACKOFF};
use crate::error::{Error, Result};
use crate::serial_port::SerialAdapter;

/// Observer for raw frame traffic, injected into [`Transport`] so tests
/// and the CLI can both watch the wire without a global mutable flag.
pub trait TraceSink {
    fn sent(&mut self, frame: &[u8]);
    fn received(&mut self, frame: &[u8]);
}

/// A [`TraceSink`] that discards everything.
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn sent(&mut self, _frame: &[u8]) {}
    fn received(&mut self, _frame: &[u8]) {}
}

/// Frame-level transport: sends a whole frame, then collects bytes off
/// the wire until a complete, checksum-valid frame has arrived.
pub struct Transport<'a, P: SerialAdapter> {
    port: &'a mut P,
    trace: &'a mut dyn TraceSink,
}

impl<'a, P: SerialAdapter> Transport<'a, P> {
    pub fn new(port: &'a mut P, trace: &'a mut dyn TraceSink) -> Self {
        Transport { port, trace }
    }

    /// Send `frame`, then block (polling with a short back-off) until a
    /// complete response frame has been received and validated.
    pub fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        self.send(frame)?;
        self.receive()
    }

    /// Send a raw, already-encoded frame. Does not flush: `flush`
    /// discards both buffers, which would truncate what was just written.
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.trace.sent(frame);
        self.port.write_all(frame)
    }

    /// Reconfigure the underlying port's baud rate in place. Exposed here
    /// (rather than requiring callers to hold their own `&mut P`
    /// alongside a `Transport`) because `Transport` already owns the
    /// port's exclusive borrow for its lifetime.
    pub fn set_port_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.port.set_baud_rate(baud_rate)
    }

    /// Receive and validate one frame, without sending anything first.
    pub fn receive(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        loop {
            match self.port.read_byte()? {
                Some(byte) => {
                    buf.push(byte);
                    if buf.len() > MAX_FRAME_LEN {
                        return Err(Error::Framing(format!(
                            "frame exceeded {} bytes without completing",
                            MAX_FRAME_LEN
                        )));
                    }
                    if codec::is_complete(&buf) {
                        codec::validate(&buf)?;
                        self.trace.received(&buf);
                        return Ok(buf);
                    }
                }
                None => std::thread::sleep(POLL_BACKOFF),
            }
        }
    }
}
