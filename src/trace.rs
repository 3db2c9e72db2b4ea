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

//! A [`TraceSink`] that renders frames as `>>>`/`<<<`-prefixed hex dumps,
//! both to an injected writer (for `-t`/`--traffic`) and through the
//! `log` facade at `trace` level, so `RUST_LOG=trace` reproduces the
//! same output without the flag.

use std::io::Write;

use log::trace;

use crate::transport::TraceSink;

fn hex_line(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex-dumps every frame to `writer` and to the `log` facade.
pub struct HexTrace<W: Write> {
    writer: W,
}

impl<W: Write> HexTrace<W> {
    pub fn new(writer: W) -> Self {
        HexTrace { writer }
    }
}

impl<W: Write> TraceSink for HexTrace<W> {
    fn sent(&mut self, frame: &[u8]) {
        let line = hex_line(frame);
        trace!(">>> {}", line);
        let _ = writeln!(self.writer, ">>> {}", line);
    }

    fn received(&mut self, frame: &[u8]) {
        let line = hex_line(frame);
        trace!("<<< {}", line);
        let _ = writeln!(self.writer, "<<< {}", line);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_lowercase_space_separated_hex() {
        let mut buf = Vec::new();
        {
            let mut trace = HexTrace::new(&mut buf);
            trace.sent(&[0x01, 0x03, 0x9A, 0x00, 0x21, 0xC4, 0x03]);
            trace.received(&[0x01, 0x03, 0x06, 0xFD, 0x03]);
        }
        let rendered = String::from_utf8(buf).unwrap();
        assert_eq!(
            rendered,
            ">>> 01 03 9a 00 21 c4 03\n<<< 01 03 06 fd 03\n"
        );
    }
}
