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

//! Error types returned by this crate.

use std::{io, path::PathBuf};

use thiserror::Error as ThisError;

use crate::status::StatusCode;

/// Everything that can go wrong while driving the RL78 bootloader
/// protocol, distinguishable at the top level.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Bad or missing CLI configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O failure opening, reading, or writing the serial device, or
    /// manipulating its modem-control lines.
    #[error("I/O error on serial device: {0}")]
    Io(#[from] io::Error),

    /// A frame overflowed the receive buffer or failed checksum
    /// validation.
    #[error("framing error: {0}")]
    Framing(String),

    /// The device replied with a status other than Normal ACK where one
    /// was required.
    #[error("command failed: {0}")]
    Command(StatusCode),

    /// The input binary file could not be opened or read.
    #[error("failed to read binary file `{}`: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
