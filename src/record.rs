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

//! Log records, severity levels and record field sets.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use jiff::Zoned;

use crate::sys;
use crate::Error;

/// A Level is the importance or severity of a log event.
///
/// The higher the level, the more important or severe the event. [`Level::Off`]
/// is not a real severity; it compares greater than every real level and is
/// only meaningful as a threshold that disables output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// TRACE. A fine-grained debugging event.
    ///
    /// Typically disabled in default configurations.
    Trace = 0,
    /// DEBUG. A debugging event.
    Debug = 1,
    /// INFO. An informational event.
    ///
    /// Indicates that an event happened.
    Info = 2,
    /// WARN. A warning event.
    ///
    /// Not an error but is likely more important than an informational event.
    Warn = 3,
    /// ERROR. An error event.
    ///
    /// Something went wrong.
    Error = 4,
    /// OFF. Disables output entirely when used as a threshold.
    Off = 5,
}

impl Level {
    /// The real severity levels, most verbose first.
    pub const REAL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub const fn name(&self) -> &'static str {
        const LEVEL_NAMES: [&str; 6] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "OFF"];
        LEVEL_NAMES[*self as usize]
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (repr, level) in [
            ("trace", Level::Trace),
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warn", Level::Warn),
            ("warning", Level::Warn),
            ("error", Level::Error),
            ("off", Level::Off),
        ] {
            if s.eq_ignore_ascii_case(repr) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

/// A single field of a [`LogRecord`] that a writer or format token may demand.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u16)]
pub enum Field {
    /// The calendar-aware instant the record was created.
    Timestamp = 1 << 0,
    /// The id of the emitting process.
    ProcessId = 1 << 1,
    /// The handle of the emitting thread.
    Thread = 1 << 2,
    /// The fully qualified module path of the emitting code.
    Module = 1 << 3,
    /// The name of the emitting function.
    Method = 1 << 4,
    /// The source file of the emitting code.
    File = 1 << 5,
    /// The source line of the emitting code.
    Line = 1 << 6,
    /// The rendered message.
    Message = 1 << 7,
}

/// A set of [`Field`]s, cheap to copy and combine.
///
/// The union of the fields demanded by all writers active at a level decides
/// how much work record assembly performs; everything else stays unset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldSet(u16);

impl FieldSet {
    /// The empty set.
    pub const EMPTY: FieldSet = FieldSet(0);

    /// Return this set extended by `field`.
    pub const fn with(self, field: Field) -> FieldSet {
        FieldSet(self.0 | field as u16)
    }

    /// Return the union of this set and `other`.
    pub const fn union(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 | other.0)
    }

    /// Whether `field` is part of this set.
    pub const fn contains(self, field: Field) -> bool {
        self.0 & field as u16 != 0
    }

    /// Whether this set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for field in [
            Field::Timestamp,
            Field::ProcessId,
            Field::Thread,
            Field::Module,
            Field::Method,
            Field::File,
            Field::Line,
            Field::Message,
        ] {
            if self.contains(field) {
                set.entry(&field);
            }
        }
        set.finish()
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> FieldSet {
        iter.into_iter()
            .fold(FieldSet::EMPTY, |set, field| set.with(field))
    }
}

/// A handle identifying the thread that produced a record.
#[derive(Clone, Debug)]
pub struct ThreadHandle {
    id: u64,
    name: Option<String>,
}

impl ThreadHandle {
    /// Capture a handle for the calling thread.
    pub fn current() -> ThreadHandle {
        ThreadHandle {
            id: sys::thread_id(),
            name: std::thread::current().name().map(str::to_string),
        }
    }

    /// The process-local numeric id of the thread.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The name of the thread, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A shareable handle to an error attached to a log record.
///
/// The handle survives hand-off to the writing thread and is shared between
/// the per-writer records of a single emission.
pub type ErrorRef = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Wrap a concrete error into an [`ErrorRef`].
pub fn error_ref(error: impl std::error::Error + Send + Sync + 'static) -> ErrorRef {
    Arc::new(error)
}

/// The payload of a single emission as delivered to a writer.
///
/// Every field except the level is optional; whether a field is populated is
/// decided by the union of the fields the writers active at the record's
/// level demand. A record is fully populated before the first writer sees it
/// and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub(crate) timestamp: Option<Zoned>,
    pub(crate) process_id: Option<u32>,
    pub(crate) thread: Option<ThreadHandle>,
    pub(crate) module_path: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) file: Option<String>,
    pub(crate) line: Option<u32>,
    pub(crate) level: Level,
    pub(crate) message: Option<String>,
    pub(crate) error: Option<ErrorRef>,
    pub(crate) rendered: Option<String>,
}

impl LogRecord {
    /// The instant the record was created.
    pub fn timestamp(&self) -> Option<&Zoned> {
        self.timestamp.as_ref()
    }

    /// The id of the emitting process.
    pub fn process_id(&self) -> Option<u32> {
        self.process_id
    }

    /// The handle of the emitting thread.
    pub fn thread(&self) -> Option<&ThreadHandle> {
        self.thread.as_ref()
    }

    /// The fully qualified module path of the emitting code.
    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    /// The name of the emitting function.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The source file containing the emitting code.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The source line of the emitting code.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// The severity level of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The rendered message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The attached error, after sanitization.
    pub fn error(&self) -> Option<&ErrorRef> {
        self.error.as_ref()
    }

    /// The final text to emit, produced from the writer's format tokens.
    ///
    /// `None` for writers configured without format tokens; such writers
    /// consume the raw fields instead.
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }
}
