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

//! The dispatcher: entry points, level resolution, record assembly, fan-out.
//!
//! The active [`Configuration`] lives in a process-wide [`ArcSwap`] cell. An
//! emission loads the snapshot once and completes entirely against it; the
//! only cross-thread synchronization on this path is that single atomic
//! load. Emission calls never return errors: failures during assembly or
//! synchronous writes are reported through the internal logger and the
//! affected work is dropped.
//!
//! The logging macros attribute records to their call site statically. The
//! [`log_at_depth`] and [`log_with_frame`] entry points exist for facades:
//! the former discovers the caller at a given stack depth, the latter lets a
//! facade name the real user site itself.

use std::fmt;
use std::sync::Arc;
use std::sync::LazyLock;

use arc_swap::ArcSwap;

use crate::config::Configuration;
use crate::config::Configurator;
use crate::config::StackInfo;
use crate::format;
use crate::frames;
use crate::frames::CallerFrame;
use crate::internal;
use crate::record::ErrorRef;
use crate::record::Field;
use crate::record::Level;
use crate::record::LogRecord;
use crate::record::ThreadHandle;
use crate::sys;
use crate::Error;

static CONFIGURATION: LazyLock<ArcSwap<Configuration>> = LazyLock::new(|| {
    let config = Configurator::default_config()
        .build(None)
        .expect("the default configuration must be valid");
    for writer in config.writers() {
        if let Err(err) = writer.init(&config) {
            internal::error(&err, "Failed to initialize writer");
        }
    }
    ArcSwap::from_pointee(config)
});

pub(crate) fn current_configuration() -> Arc<Configuration> {
    CONFIGURATION.load_full()
}

/// Initialize new writers and publish the snapshot.
///
/// Writers already present in the previous snapshot (by handle identity) are
/// not initialized again. On error nothing is published. A writing thread
/// belonging to the previous snapshot and not carried over is drained and
/// joined so it is never left orphaned; writers removed by the swap are not
/// closed here.
pub(crate) fn set_configuration(config: Configuration) -> Result<(), Error> {
    let previous = CONFIGURATION.load_full();

    for writer in config.writers() {
        let known = previous.writers().any(|old| Arc::ptr_eq(old, writer));
        if !known {
            writer.init(&config)?;
        }
    }

    let retired = previous
        .writing_thread()
        .filter(|old| {
            config
                .writing_thread()
                .is_none_or(|new| !Arc::ptr_eq(*old, new))
        })
        .cloned();

    CONFIGURATION.store(Arc::new(config));

    if let Some(thread) = retired {
        thread.shutdown_and_join();
    }

    Ok(())
}

/// The message of one emission, before rendering.
#[derive(Clone, Copy)]
pub enum Payload<'a> {
    /// No message; the record may still carry an error.
    None,
    /// Any displayable value, rendered as-is.
    Display(&'a dyn fmt::Display),
    /// A `{}` pattern with positional arguments, rendered by the message
    /// formatter.
    Format(&'a str, &'a [&'a dyn fmt::Display]),
}

enum Site<'a> {
    Depth(usize),
    Frame(&'a CallerFrame),
}

/// Emit a record attributed to a pre-built caller frame.
///
/// This is the entry point used by the logging macros and by facades that
/// know the real user site.
pub fn log_with_frame(
    frame: &CallerFrame,
    level: Level,
    error: Option<ErrorRef>,
    payload: Payload<'_>,
) {
    if level == Level::Off {
        return;
    }
    let config = CONFIGURATION.load();
    if !config.output_possible(level) {
        return;
    }
    output(&config, Site::Frame(frame), level, error, payload);
}

/// Emit a record attributed to the caller `depth` frames above the nearest
/// frame outside this crate.
///
/// Facade layers pass the number of their own wrapper frames; direct callers
/// pass `0`.
pub fn log_at_depth(depth: usize, level: Level, error: Option<ErrorRef>, payload: Payload<'_>) {
    if level == Level::Off {
        return;
    }
    let config = CONFIGURATION.load();
    if !config.output_possible(level) {
        return;
    }
    output(&config, Site::Depth(depth), level, error, payload);
}

/// Whether an emission at `level` would currently produce output.
///
/// With per-module overrides configured this resolves the calling module
/// through caller-frame discovery.
pub fn is_enabled(level: Level) -> bool {
    if level == Level::Off {
        return false;
    }
    let config = CONFIGURATION.load();
    if !config.output_possible(level) {
        return false;
    }
    if !config.has_custom_levels() {
        return true;
    }
    let frame = frames::acquire(config.plugins().frame_provider(), 0, true);
    config.effective_level(frame.module_path()) <= level
}

/// Whether trace output is currently enabled.
pub fn is_trace_enabled() -> bool {
    is_enabled(Level::Trace)
}

/// Whether debug output is currently enabled.
pub fn is_debug_enabled() -> bool {
    is_enabled(Level::Debug)
}

/// Whether info output is currently enabled.
pub fn is_info_enabled() -> bool {
    is_enabled(Level::Info)
}

/// Whether warn output is currently enabled.
pub fn is_warn_enabled() -> bool {
    is_enabled(Level::Warn)
}

/// Whether error output is currently enabled.
pub fn is_error_enabled() -> bool {
    is_enabled(Level::Error)
}

/// Whether an emission from `module_path` at `level` would produce output.
///
/// Used by facades that know the emitting module without a stack walk.
pub fn is_enabled_for(module_path: &str, level: Level) -> bool {
    if level == Level::Off {
        return false;
    }
    let config = CONFIGURATION.load();
    config.output_possible(level)
        && (!config.has_custom_levels() || config.effective_level(module_path) <= level)
}

/// Flush the writers of the active configuration.
///
/// With the writing thread enabled this is a no-op; that thread flushes
/// after every batch and writers must only be touched from it.
pub fn flush() {
    let config = CONFIGURATION.load();
    if config.writing_thread().is_some() {
        return;
    }
    for writer in config.writers() {
        if let Err(err) = writer.flush() {
            internal::error(&err, "Failed to flush writer");
        }
    }
}

/// Shut down logging for this process.
///
/// With the writing thread enabled, drains the queue and joins the thread;
/// the thread flushes and closes every writer it has written to. Otherwise
/// flushes and closes the active writers directly.
pub fn shutdown() {
    let config = CONFIGURATION.load_full();
    match config.writing_thread() {
        Some(thread) => thread.shutdown_and_join(),
        None => {
            for writer in config.writers() {
                if let Err(err) = writer.flush() {
                    internal::error(&err, "Failed to flush writer");
                }
                if let Err(err) = writer.close() {
                    internal::error(&err, "Failed to close writer");
                }
            }
        }
    }
}

fn output(
    config: &Configuration,
    site: Site<'_>,
    level: Level,
    error: Option<ErrorRef>,
    payload: Payload<'_>,
) {
    let provider = config.plugins().frame_provider();

    // (frame, is_full): a frame acquired module-only may need upgrading later
    let (depth, mut frame): (usize, Option<(CallerFrame, bool)>) = match site {
        Site::Depth(depth) => (depth, None),
        Site::Frame(frame) => (0, Some((frame.clone(), true))),
    };

    let mut active_level = config.global_level();
    if config.has_custom_levels() {
        if frame.is_none() {
            let only_module = config.stack_info(level) == StackInfo::ModuleOnly;
            frame = Some((frames::acquire(provider, depth, only_module), !only_module));
        }
        if let Some((resolved, _)) = &frame {
            active_level = config.effective_level(resolved.module_path());
        }
    }

    if active_level > level {
        return;
    }

    if let Err(err) = assemble_and_dispatch(config, depth, frame, level, error, payload) {
        internal::error(&err, "Failed to create log entry");
    }
}

/// Assemble the per-writer records, then fan out.
///
/// Assembly is all-or-nothing: if rendering fails for any writer, no writer
/// receives the emission.
fn assemble_and_dispatch(
    config: &Configuration,
    depth: usize,
    acquired: Option<(CallerFrame, bool)>,
    level: Level,
    error: Option<ErrorRef>,
    payload: Payload<'_>,
) -> Result<(), Error> {
    let provider = config.plugins().frame_provider();
    let required = config.required_fields(level);

    let error = match (error, config.plugins().error_sanitizer()) {
        (Some(error), Some(sanitizer)) => Some(sanitizer.sanitize(error)),
        (error, _) => error,
    };

    let needs_full = required.contains(Field::Method)
        || required.contains(Field::File)
        || required.contains(Field::Line);
    let needs_frame = needs_full || required.contains(Field::Module);

    let mut frame = acquired;
    if needs_frame {
        match &frame {
            None => frame = Some((frames::acquire(provider, depth, !needs_full), needs_full)),
            // upgrade a module-only frame on first demand for the full one
            Some((_, false)) if needs_full => {
                frame = Some((frames::acquire(provider, depth, false), true));
            }
            Some(_) => {}
        }
    }

    let mut base = LogRecord {
        timestamp: required.contains(Field::Timestamp).then(jiff::Zoned::now),
        process_id: required.contains(Field::ProcessId).then(sys::process_id),
        thread: required.contains(Field::Thread).then(ThreadHandle::current),
        module_path: None,
        method: None,
        file: None,
        line: None,
        level,
        message: None,
        error,
        rendered: None,
    };

    if let Some((frame, _)) = &frame {
        if required.contains(Field::Module) {
            base.module_path = Some(frame.module_path().to_string());
        }
        if required.contains(Field::Method) {
            base.method = frame.method().map(str::to_string);
        }
        if required.contains(Field::File) {
            base.file = frame.file().map(str::to_string);
        }
        if required.contains(Field::Line) {
            base.line = frame.line();
        }
    }

    if required.contains(Field::Message) {
        base.message = match payload {
            Payload::None => None,
            Payload::Display(value) => {
                Some(format::render_display(value).map_err(Error::from_fmt_error)?)
            }
            Payload::Format(pattern, arguments) => {
                Some(format::format(pattern, arguments).map_err(Error::from_fmt_error)?)
            }
        };
    }

    let mut buffer = String::with_capacity(if base.error.is_some() { 1024 } else { 256 });
    let mut entries = Vec::new();
    for entry in config.active_writers(level) {
        let mut record = base.clone();
        if let Some(tokens) = &entry.tokens {
            buffer.clear();
            for token in tokens.iter() {
                token
                    .render(&record, &mut buffer, config.max_error_causes())
                    .map_err(Error::from_fmt_error)?;
            }
            buffer.push_str(sys::line_separator());
            record.rendered = Some(buffer.clone());
        }
        entries.push((entry, record));
    }

    match config.writing_thread() {
        None => {
            // isolated per writer: one failing writer must not starve the rest
            for (entry, record) in entries {
                if let Err(err) = entry.writer.write(&record) {
                    internal::error(&err, "Failed to write log entry");
                }
            }
        }
        Some(thread) => {
            for (entry, record) in entries {
                thread.enqueue(entry.writer.clone(), record);
            }
        }
    }

    Ok(())
}
