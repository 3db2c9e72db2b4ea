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

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{crate_authors, crate_version, App, AppSettings, Arg};
use indicatif::{ProgressBar, ProgressStyle};

use rl78sbl::serial_port::SystemSerialPort;
use rl78sbl::session::{ChecksumReport, Mode, ProgressSink, SessionConfig};
use rl78sbl::trace::HexTrace;
use rl78sbl::transport::NullTrace;

const DEFAULT_BAUD_RATE: u32 = 115200;

fn main() -> Result<()> {
    let app = App::new("RL78 Serial Bootloader Programmer")
        .setting(AppSettings::ColoredHelp)
        .version(crate_version!())
        .author(crate_authors!())
        .about("Programmer for the Renesas RL78 single-wire/two-wire UART flash bootloader")
        .arg(
            Arg::with_name("device")
                .short("d")
                .long("device")
                .takes_value(true)
                .required(true)
                .help("TTY device connected to the target"),
        )
        .arg(
            Arg::with_name("file")
                .short("f")
                .long("file")
                .takes_value(true)
                .required(true)
                .help("Binary image to program"),
        )
        .arg(
            Arg::with_name("offset")
                .short("o")
                .long("offset")
                .takes_value(true)
                .default_value("0")
                .help("Starting block number (each block is 1024 bytes)"),
        )
        .arg(
            Arg::with_name("verify-only")
                .short("v")
                .long("verify-only")
                .help("Verify the image against target flash without erasing or programming"),
        )
        .arg(
            Arg::with_name("traffic")
                .short("t")
                .long("traffic")
                .help("Print a hex dump of every frame sent and received"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Suppress the silicon signature printout and per-block progress"),
        );

    let matches = app.get_matches();

    init_logger()?;

    let config = SessionConfig {
        device_path: matches.value_of("device").unwrap().to_string(),
        file_path: PathBuf::from(matches.value_of("file").unwrap()),
        mode: if matches.is_present("verify-only") {
            Mode::VerifyOnly
        } else {
            Mode::ProgramAndVerify
        },
        offset: matches
            .value_of("offset")
            .unwrap()
            .parse()
            .context("--offset must be a non-negative integer")?,
        trace: matches.is_present("traffic"),
        quiet: matches.is_present("quiet"),
    };

    log::info!("opening serial device `{}`", config.device_path);
    let mut port = SystemSerialPort::open(&config.device_path, DEFAULT_BAUD_RATE)
        .with_context(|| format!("couldn't open serial device `{}`", config.device_path))?;

    let stdout = io::stdout();
    let mut hex_trace;
    let mut null_trace = NullTrace;
    let trace: &mut dyn rl78sbl::transport::TraceSink = if config.trace {
        hex_trace = HexTrace::new(stdout.lock());
        &mut hex_trace
    } else {
        &mut null_trace
    };

    let mut progress: Box<dyn ProgressSink> = if config.quiet {
        Box::new(rl78sbl::session::NullProgress)
    } else {
        Box::new(CliProgress::new())
    };

    let (signature, report) = rl78sbl::session::run_session(
        &config,
        &mut port,
        DEFAULT_BAUD_RATE,
        trace,
        progress.as_mut(),
    )
    .context("programming session failed")?;

    if !config.quiet {
        println!("{}", signature);
        println!("Checksum Local : {:#06x}", report.local);
        println!("Checksum Remote: {:#06x}", report.remote);
    }

    if !report.matches() {
        anyhow::bail!(
            "checksum mismatch: local {:#06x} != remote {:#06x}",
            report.local,
            report.remote
        );
    }

    Ok(())
}

/// Drives an `indicatif` spinner across the programming/verification
/// loop, one tick per block.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner().template("{spinner} {msg} ({elapsed})"),
        );
        CliProgress { bar }
    }
}

impl ProgressSink for CliProgress {
    fn block_started(&mut self, block_no: u64, start_addr: u32, end_addr: u32, verify_only: bool) {
        let verb = if verify_only { "Verifying" } else { "Programming" };
        self.bar.set_message(&format!(
            "{} Block #{} ({:#08x} -> {:#08x})",
            verb, block_no, start_addr, end_addr
        ));
        self.bar.tick();
    }

    fn block_done(&mut self, _block_no: u64) {
        self.bar.tick();
    }

    fn finished(&mut self, report: &ChecksumReport) {
        self.bar.finish_with_message(&format!(
            "done (local {:#06x}, remote {:#06x})",
            report.local, report.remote
        ));
    }
}

fn init_logger() -> Result<()> {
    let mut logger = env_logger::Builder::from_env("RL78SBL_LOG");

    #[cfg(unix)]
    logger.format(log_format_color);
    #[cfg(not(unix))]
    logger.format(log_format_no_color);

    logger.try_init().context("failed to initialize logger")
}

#[cfg(unix)]
fn log_format_color(
    fmt: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> io::Result<()> {
    let level = match record.level() {
        log::Level::Error => ansi_term::Color::Red.bold().paint("ERROR"),
        log::Level::Warn => ansi_term::Color::Yellow.bold().paint("WARN"),
        log::Level::Info => ansi_term::Color::Green.bold().paint("INFO"),
        log::Level::Debug => ansi_term::Color::Cyan.bold().paint("DBG"),
        log::Level::Trace => ansi_term::Color::Cyan.bold().paint("TRACE"),
    };

    writeln!(fmt, "[{}] - {}", level, record.args())
}

#[cfg(not(unix))]
fn log_format_no_color(
    fmt: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> io::Result<()> {
    let level = match record.level() {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN",
        log::Level::Info => "INFO",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRACE",
    };

    writeln!(fmt, "[{}] - {}", level, record.args())
}
