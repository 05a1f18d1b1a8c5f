// Copyright 2024 FastLabs Developers
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

//! Bridge the [`log`] crate into the dispatcher.
//!
//! Severity constants map one-to-one, the pre-formatted message arrives as a
//! displayable value, and the record's module path, file and line become a
//! pre-built caller frame so records are attributed to the real user site.
//!
//! [`log`]: https://docs.rs/log/

use crate::frames::CallerFrame;
use crate::logger;
use crate::logger::Payload;
use crate::record::Level;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// The `log::Log` implementation delegating to the dispatcher.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Bridge {}

static BRIDGE: Bridge = Bridge {};

/// Route everything logged through the [`log`] crate into lumber.
///
/// # Errors
///
/// Returns an error if another `log` logger is already installed.
///
/// # Examples
///
/// ```
/// if lumber::bridge::log::install().is_err() {
///     eprintln!("a log logger is already installed");
/// }
/// ```
pub fn install() -> Result<(), log::SetLoggerError> {
    log::set_logger(&BRIDGE)?;
    // lumber does its own level filtering
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

impl log::Log for Bridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        logger::is_enabled_for(metadata.target(), metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        let message = record.args();

        match record.module_path() {
            Some(module_path) => {
                let frame = CallerFrame::new(
                    module_path.to_string(),
                    None,
                    record.file().map(str::to_string),
                    record.line(),
                );
                logger::log_with_frame(&frame, level, None, Payload::Display(&message));
            }
            // no static site available; the log crate's own frames sit
            // between this bridge and the user code
            None => logger::log_at_depth(1, level, None, Payload::Display(&message)),
        }
    }

    fn flush(&self) {
        logger::flush();
    }
}
