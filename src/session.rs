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

//! The top-level driver: runs the entry sequence, negotiates the
//! session, then streams a binary file block by block through the
//! blank-check/erase/program/verify pipeline, finishing with a
//! local-vs-remote checksum comparison.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::commands::{self, BlankState};
use crate::constants::{BLOCK_SIZE, DATA_CHUNK_SIZE, PAD_BYTE};
use crate::entry;
use crate::error::{Error, Result};
use crate::serial_port::SerialAdapter;
use crate::signature::SiliconSignature;
use crate::transport::{TraceSink, Transport};

/// Whether a session erases and programs before verifying, or only
/// verifies what is already on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ProgramAndVerify,
    VerifyOnly,
}

/// Every input the orchestrator needs, gathered in one place instead of
/// read from process-wide mutable flags.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub device_path: String,
    pub file_path: PathBuf,
    pub mode: Mode,
    /// Starting block number; block `N` covers `[N*1024, (N+1)*1024)`.
    pub offset: u64,
    /// Emit a `>>>`/`<<<` hex trace of every frame.
    pub trace: bool,
    /// Suppress the silicon signature printout and per-block progress.
    pub quiet: bool,
}

/// The monotonic lifecycle of one programming session. `can_advance_to`
/// documents the legal transitions; it is exercised only from debug
/// assertions and tests; it adds no branching to the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Opened,
    EnteredBootloader,
    BaudSet,
    ResetOk,
    SignatureRead,
    Streaming(u64),
    Checksummed,
    Closed,
    Failed,
}

impl SessionState {
    /// Whether `self -> next` is one of the documented forward
    /// transitions, or `next` is `Failed`/`Closed` (reachable from
    /// anywhere non-terminal).
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        if matches!(next, Failed) {
            return !matches!(self, Closed);
        }
        match (self, next) {
            (Opened, EnteredBootloader)
            | (EnteredBootloader, BaudSet)
            | (BaudSet, ResetOk)
            | (ResetOk, SignatureRead)
            | (SignatureRead, Streaming(_))
            | (Streaming(_), Streaming(_))
            | (Streaming(_), Checksummed)
            | (Checksummed, Closed)
            | (Failed, Closed) => true,
            _ => false,
        }
    }
}

/// Local-vs-remote checksum outcome for the streamed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumReport {
    pub local: u16,
    pub remote: u16,
}

impl ChecksumReport {
    pub fn matches(&self) -> bool {
        self.local == self.remote
    }
}

/// Observer for per-block progress, injected so the CLI can drive an
/// `indicatif` bar while tests and `--quiet` runs use a no-op.
pub trait ProgressSink {
    fn block_started(&mut self, block_no: u64, start_addr: u32, end_addr: u32, verify_only: bool);
    fn block_done(&mut self, block_no: u64);
    fn finished(&mut self, report: &ChecksumReport);
}

/// A [`ProgressSink`] that discards everything.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn block_started(&mut self, _: u64, _: u32, _: u32, _: bool) {}
    fn block_done(&mut self, _: u64) {}
    fn finished(&mut self, _: &ChecksumReport) {}
}

/// Run one full session against an already-opened port: entry sequence,
/// baud negotiation, reset, silicon signature, the per-block pipeline,
/// and the final checksum comparison. Always runs the shutdown ritual,
/// even on failure.
pub fn run_session<P: SerialAdapter>(
    config: &SessionConfig,
    port: &mut P,
    baud_rate: u32,
    trace: &mut dyn TraceSink,
    progress: &mut dyn ProgressSink,
) -> Result<(SiliconSignature, ChecksumReport)> {
    let result = run_session_inner(config, port, baud_rate, trace, progress);
    let shutdown_result = entry::shutdown(port);

    let outcome = result?;
    shutdown_result?;
    Ok(outcome)
}

fn run_session_inner<P: SerialAdapter>(
    config: &SessionConfig,
    port: &mut P,
    baud_rate: u32,
    trace: &mut dyn TraceSink,
    progress: &mut dyn ProgressSink,
) -> Result<(SiliconSignature, ChecksumReport)> {
    let mut state = SessionState::Opened;

    entry::enter_bootloader(port)?;
    debug_assert!(state.can_advance_to(SessionState::EnteredBootloader));
    state = SessionState::EnteredBootloader;

    let mut transport = Transport::new(port, trace);

    commands::set_baud_rate(&mut transport, baud_rate)?;
    debug_assert!(state.can_advance_to(SessionState::BaudSet));
    state = SessionState::BaudSet;

    commands::reset(&mut transport)?;
    debug_assert!(state.can_advance_to(SessionState::ResetOk));
    state = SessionState::ResetOk;

    let signature = commands::silicon_signature(&mut transport)?;
    debug_assert!(state.can_advance_to(SessionState::SignatureRead));
    state = SessionState::SignatureRead;
    info!("target identified: {}", signature.device_name);

    let mut file = open_binary(&config.file_path)?;
    let mut local_checksum: i64 = 0;
    let mut block_no = config.offset;
    let mut blocks_sent: u64 = 0;

    loop {
        let (block, bytes_read) = match read_chunk(&mut file, &config.file_path)? {
            Some(chunk) => chunk,
            None => break,
        };

        for &byte in block.iter() {
            local_checksum -= i64::from(byte);
        }

        let (start_addr, end_addr) = block_addr_range(block_no)?;
        let verify_only = config.mode == Mode::VerifyOnly;

        debug_assert!(state.can_advance_to(SessionState::Streaming(block_no)));
        state = SessionState::Streaming(block_no);
        progress.block_started(block_no, start_addr, end_addr, verify_only);

        let chunks = split_chunks(&block);

        match config.mode {
            Mode::ProgramAndVerify => {
                if commands::blank_check(&mut transport, start_addr, end_addr)? == BlankState::Occupied
                {
                    commands::erase(&mut transport, start_addr)?;
                }
                commands::program(&mut transport, start_addr, end_addr, &chunks)?;
                commands::verify(&mut transport, start_addr, end_addr, &chunks)?;
            }
            Mode::VerifyOnly => {
                commands::verify(&mut transport, start_addr, end_addr, &chunks)?;
            }
        }

        progress.block_done(block_no);
        debug!(
            "block {} ({} bytes real): {}",
            block_no,
            bytes_read,
            if verify_only { "verified" } else { "programmed and verified" }
        );

        block_no += 1;
        blocks_sent += 1;
    }

    if blocks_sent == 0 {
        return Err(Error::Config("input file was empty".into()));
    }

    let range_start = block_addr_range(config.offset)?.0;
    let range_end = block_addr_range(config.offset + blocks_sent - 1)?.1;
    let remote = commands::checksum(&mut transport, range_start, range_end)?;

    debug_assert!(state.can_advance_to(SessionState::Checksummed));

    let report = ChecksumReport {
        local: (local_checksum & 0xFFFF) as u16,
        remote,
    };
    progress.finished(&report);

    Ok((signature, report))
}

/// The 24-bit wire address range `[block_no*1024, block_no*1024+1023]`
/// for one block. Fails rather than silently wrapping if the block lies
/// outside the protocol's addressable 24-bit flash range.
fn block_addr_range(block_no: u64) -> Result<(u32, u32)> {
    let start = block_no
        .checked_mul(BLOCK_SIZE as u64)
        .filter(|&addr| addr + (BLOCK_SIZE as u64 - 1) <= 0x00FF_FFFF)
        .ok_or_else(|| {
            Error::Config(format!(
                "block {} is outside the addressable 24-bit flash range",
                block_no
            ))
        })?;
    Ok((start as u32, start as u32 + BLOCK_SIZE as u32 - 1))
}

fn open_binary(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Read one 1024-byte block from `file`, padding a short final block
/// with `0xFF`. Returns `None` at EOF (zero bytes read).
fn read_chunk(file: &mut File, path: &Path) -> Result<Option<([u8; BLOCK_SIZE], usize)>> {
    let mut buf = [PAD_BYTE; BLOCK_SIZE];
    let mut total = 0;

    while total < BLOCK_SIZE {
        let read = file.read(&mut buf[total..]).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })?;
        if read == 0 {
            break;
        }
        total += read;
    }

    if total == 0 {
        Ok(None)
    } else {
        Ok(Some((buf, total)))
    }
}

/// Split one 1024-byte block into four 256-byte data chunks, in the
/// order the Programming/Verify data stream expects them.
fn split_chunks(block: &[u8; BLOCK_SIZE]) -> [[u8; DATA_CHUNK_SIZE]; BLOCK_SIZE / DATA_CHUNK_SIZE] {
    let mut chunks = [[0u8; DATA_CHUNK_SIZE]; BLOCK_SIZE / DATA_CHUNK_SIZE];
    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.copy_from_slice(&block[i * DATA_CHUNK_SIZE..(i + 1) * DATA_CHUNK_SIZE]);
    }
    chunks
}
