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

//! The DTR/BREAK/magic-byte sequence that wakes the target's bootloader
//! and the corresponding shutdown sequence that hands it back to its
//! application firmware.

use std::thread::sleep;

use crate::constants::ENTRY_SLEEP;
use crate::error::Result;
use crate::serial_port::SerialAdapter;

/// Drive the target into bootloader mode: assert DTR and BREAK together
/// (holding reset low while signaling the entry condition), release
/// them in the documented order, then send the single magic byte
/// (`0x00`) that the target's boot ROM watches for on its RxD pin.
pub fn enter_bootloader<P: SerialAdapter>(port: &mut P) -> Result<()> {
    port.set_dtr(true)?;
    port.set_break(true)?;
    port.flush()?;

    port.set_dtr(false)?;
    sleep(ENTRY_SLEEP);

    port.set_break(false)?;
    port.flush()?;
    sleep(ENTRY_SLEEP);

    port.write_all(&[0x00])?;
    sleep(ENTRY_SLEEP);
    port.flush()
}

/// Release the target back to its application firmware by toggling DTR
/// through a reset pulse, without BREAK or the magic byte.
pub fn shutdown<P: SerialAdapter>(port: &mut P) -> Result<()> {
    port.set_dtr(true)?;
    sleep(ENTRY_SLEEP);
    port.set_dtr(false)?;
    port.flush()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::{Call, MockPort};

    #[test]
    fn enter_bootloader_follows_the_documented_call_order() {
        let mut port = MockPort::new();
        enter_bootloader(&mut port).unwrap();

        assert_eq!(
            port.calls(),
            &[
                Call::SetDtr(true),
                Call::SetBreak(true),
                Call::Flush,
                Call::SetDtr(false),
                Call::SetBreak(false),
                Call::Flush,
                Call::Write(vec![0x00]),
                Call::Flush,
            ]
        );
    }

    #[test]
    fn shutdown_pulses_dtr_without_break_or_magic_byte() {
        let mut port = MockPort::new();
        shutdown(&mut port).unwrap();

        assert_eq!(
            port.calls(),
            &[Call::SetDtr(true), Call::SetDtr(false), Call::Flush]
        );
    }
}
