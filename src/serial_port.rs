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

//! Serial port abstraction. [`SerialAdapter`] is the seam the rest of the
//! crate programs against; [`SystemSerialPort`] is the only production
//! implementation, backed by the `serialport` crate. Tests provide their
//! own fake implementation instead of opening a real device.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{Error, Result};

/// The set of serial-port operations the bootloader protocol needs:
/// byte-level I/O plus DTR and BREAK line control for the entry sequence.
///
/// A non-blocking `read_byte` is required: callers poll it in a loop with
/// their own back-off rather than relying on a blocking read, since the
/// protocol has no length-prefixed framing at the byte-stream level.
pub trait SerialAdapter {
    /// Write every byte of `data`, blocking until accepted by the driver.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read one byte without blocking. Returns `Ok(None)` if no byte is
    /// currently available.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Discard both the input and output buffers.
    fn flush(&mut self) -> Result<()>;

    /// Assert or deassert the DTR modem-control line.
    fn set_dtr(&mut self, level: bool) -> Result<()>;

    /// Assert or deassert a BREAK condition on the line.
    fn set_break(&mut self, level: bool) -> Result<()>;

    /// Reconfigure the port's baud rate in place, keeping the same
    /// framing (8 data bits, no parity, two stop bits).
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;
}

/// Production [`SerialAdapter`], backed by a `Box<dyn serialport::SerialPort>`.
pub struct SystemSerialPort {
    port: Box<dyn SerialPort>,
}

impl SystemSerialPort {
    /// Open `path` at `baud_rate`, 8 data bits / 2 stop bits / no parity,
    /// with a short read timeout so that `read_byte` can poll rather than
    /// block.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::Two)
            .timeout(Duration::from_micros(1))
            .open()
            .map_err(|err| Error::Io(io::Error::new(io::ErrorKind::Other, err)))?;

        Ok(SystemSerialPort { port })
    }
}

impl SerialAdapter for SystemSerialPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data).map_err(Error::Io)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(err)
                if err.kind() == io::ErrorKind::TimedOut
                    || err.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(|err| Error::Io(io::Error::new(io::ErrorKind::Other, err)))
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        self.port
            .write_data_terminal_ready(level)
            .map_err(|err| Error::Io(io::Error::new(io::ErrorKind::Other, err)))
    }

    fn set_break(&mut self, level: bool) -> Result<()> {
        let result = if level {
            self.port.set_break()
        } else {
            self.port.clear_break()
        };
        result.map_err(|err| Error::Io(io::Error::new(io::ErrorKind::Other, err)))
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.port
            .set_baud_rate(baud_rate)
            .map_err(|err| Error::Io(io::Error::new(io::ErrorKind::Other, err)))
    }
}
