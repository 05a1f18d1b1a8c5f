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

//! Writers consume fully assembled log records.

use std::fmt;
use std::sync::Arc;

use crate::config::Configuration;
use crate::record::FieldSet;
use crate::record::Level;
use crate::record::LogRecord;
use crate::Error;

mod console;

pub use self::console::Console;

/// A downstream consumer of log records.
///
/// Writers are held behind [`Arc`] handles; a writer present in consecutive
/// configuration snapshots is initialized only once. In synchronous mode
/// `write` is called from any emitting thread and must tolerate concurrency;
/// with the writing thread enabled it is called from that thread only.
pub trait Writer: fmt::Debug + Send + Sync + 'static {
    /// The record fields this writer consumes on its own.
    ///
    /// Fields demanded by the writer's format tokens are collected separately
    /// and are additive to this set.
    fn required_fields(&self) -> FieldSet;

    /// A severity floor for this writer alone.
    ///
    /// Records below the floor are never handed to this writer, regardless of
    /// the configured levels. Defaults to no floor.
    fn severity_floor(&self) -> Option<Level> {
        None
    }

    /// Called exactly once before the first `write`, when a configuration
    /// containing this writer is activated.
    fn init(&self, config: &Configuration) -> Result<(), Error> {
        let _ = config;
        Ok(())
    }

    /// Consume one record.
    fn write(&self, record: &LogRecord) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Release held resources.
    ///
    /// Called by the writing thread at shutdown for every writer it has
    /// written to, or by an explicit [`shutdown`](crate::logger::shutdown).
    /// Default to a no-op.
    fn close(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Writer> From<T> for Arc<dyn Writer> {
    fn from(value: T) -> Self {
        Arc::new(value)
    }
}
