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

//! Caller frame discovery.
//!
//! The logging macros capture the caller site statically, so the strategies
//! in this module only run for entry points that receive a caller *depth*
//! instead of a frame: the `is_*_enabled` functions under custom levels, and
//! facades that cannot name their caller. Discovery walks the stack, skips
//! the frames of this crate and of the unwinder, skips `depth` further
//! frames, and materializes the one it lands on.
//!
//! Strategies are tried in order: an installed [`FrameProvider`] chain, a
//! name-only walk when just the module is needed, a single-frame resolution,
//! and a full captured backtrace as the last resort.
//!
//! [`FrameProvider`]: crate::plugins::FrameProvider

use std::borrow::Cow;
use std::sync::Arc;

use crate::internal;
use crate::plugins::FrameProvider;
use crate::Error;

/// The source site of an emission: module path, function, file and line.
///
/// Only the module path is always present. Frames built by the logging macros
/// carry file and line but no function name; frames synthesized by the fast
/// module-only lookup carry nothing but the module path.
#[derive(Clone, Debug)]
pub struct CallerFrame {
    module_path: Cow<'static, str>,
    method: Option<Cow<'static, str>>,
    file: Option<Cow<'static, str>>,
    line: Option<u32>,
}

impl CallerFrame {
    /// Create a frame from its parts.
    pub fn new(
        module_path: impl Into<Cow<'static, str>>,
        method: Option<String>,
        file: Option<String>,
        line: Option<u32>,
    ) -> CallerFrame {
        CallerFrame {
            module_path: module_path.into(),
            method: method.map(Cow::Owned),
            file: file.map(Cow::Owned),
            line,
        }
    }

    /// Create a frame for the invoking source location.
    ///
    /// Used by the logging macros with `module_path!()`, `file!()` and
    /// `line!()`.
    pub fn here(module_path: &'static str, file: &'static str, line: u32) -> CallerFrame {
        CallerFrame {
            module_path: Cow::Borrowed(module_path),
            method: None,
            file: Some(Cow::Borrowed(file)),
            line: Some(line),
        }
    }

    pub(crate) fn unknown() -> CallerFrame {
        CallerFrame {
            module_path: Cow::Borrowed("<unknown>"),
            method: None,
            file: None,
            line: None,
        }
    }

    /// The fully qualified module path of the caller.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// The name of the calling function, if known.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The source file of the caller, if known.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The source line of the caller, if known.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

/// Acquire the caller frame `depth` frames above the nearest caller outside
/// this crate.
///
/// With `only_module` the result may carry nothing but the module path;
/// callers needing file or line must ask again without it.
pub(crate) fn acquire(
    provider: Option<&Arc<dyn FrameProvider>>,
    depth: usize,
    only_module: bool,
) -> CallerFrame {
    if let Some(provider) = provider {
        // the call into the chain occupies one extra stack frame
        if let Some(frame) = provider.get(depth + 1, only_module) {
            return frame;
        }
    }

    if only_module {
        match walk(depth, true) {
            Ok(frame) => return frame,
            Err(err) => internal::warn(&err, "Failed to look up caller module"),
        }
    }

    match walk(depth, false) {
        Ok(frame) => return frame,
        Err(err) => internal::warn(&err, "Failed to resolve caller frame"),
    }

    captured_trace(depth)
}

/// Walk the live stack and resolve exactly one frame.
///
/// Cheaper than capturing a whole backtrace: the walk stops at the target
/// frame, and with `name_only` the file and line lookups are skipped.
fn walk(depth: usize, name_only: bool) -> Result<CallerFrame, Error> {
    let mut remaining = depth;
    let mut skipping_internals = true;
    let mut result = None;

    backtrace::trace(|frame| {
        let mut symbol_name = None;
        let mut located = None;

        backtrace::resolve_frame(frame, |symbol| {
            if symbol_name.is_none() {
                symbol_name = symbol.name().map(|name| format!("{name:#}"));
            }
            if !name_only && located.is_none() {
                located = Some((
                    symbol
                        .filename()
                        .and_then(|path| path.to_str())
                        .map(str::to_string),
                    symbol.lineno(),
                ));
            }
        });

        if skipping_internals {
            match &symbol_name {
                Some(name) if is_internal_symbol(name) => return true,
                // unresolvable frames at the top belong to the unwinder
                None => return true,
                Some(_) => skipping_internals = false,
            }
        }

        if remaining > 0 {
            remaining -= 1;
            return true;
        }

        result = symbol_name.map(|name| {
            let (file, line) = located.unwrap_or((None, None));
            CallerFrame::new(module_from_symbol(&name), method_from_symbol(&name), file, line)
        });
        false
    });

    result.ok_or_else(|| Error::new("no resolvable frame at the requested depth"))
}

/// Last-resort strategy: capture and resolve the whole stack, then index it.
fn captured_trace(depth: usize) -> CallerFrame {
    let trace = backtrace::Backtrace::new();
    let mut remaining = depth;
    let mut skipping_internals = true;

    for frame in trace.frames() {
        for symbol in frame.symbols() {
            let Some(name) = symbol.name().map(|name| format!("{name:#}")) else {
                continue;
            };

            if skipping_internals {
                if is_internal_symbol(&name) {
                    continue;
                }
                skipping_internals = false;
            }

            if remaining > 0 {
                remaining -= 1;
                continue;
            }

            return CallerFrame::new(
                module_from_symbol(&name),
                method_from_symbol(&name),
                symbol
                    .filename()
                    .and_then(|path| path.to_str())
                    .map(str::to_string),
                symbol.lineno(),
            );
        }
    }

    CallerFrame::unknown()
}

fn is_internal_symbol(name: &str) -> bool {
    name.starts_with("lumber::") || name.starts_with("backtrace::")
}

fn significant_segments(name: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = name.split("::").collect();
    while segments.last() == Some(&"{{closure}}") {
        segments.pop();
    }
    segments
}

fn module_from_symbol(name: &str) -> String {
    let mut segments = significant_segments(name);
    if segments.len() > 1 {
        segments.pop();
    }
    segments.join("::")
}

fn method_from_symbol(name: &str) -> Option<String> {
    significant_segments(name).last().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_module_and_method_from_symbols() {
        assert_eq!(module_from_symbol("app::db::connect"), "app::db");
        assert_eq!(method_from_symbol("app::db::connect").unwrap(), "connect");

        assert_eq!(module_from_symbol("app::db::connect::{{closure}}"), "app::db");
        assert_eq!(
            method_from_symbol("app::db::connect::{{closure}}").unwrap(),
            "connect"
        );

        assert_eq!(module_from_symbol("main"), "main");
        assert_eq!(method_from_symbol("main").unwrap(), "main");
    }

    #[test]
    fn static_frames_carry_their_site() {
        let frame = CallerFrame::here(module_path!(), file!(), line!());
        assert_eq!(frame.module_path(), "lumber::frames::tests");
        assert!(frame.file().unwrap().ends_with("frames.rs"));
        assert!(frame.line().is_some());
        assert!(frame.method().is_none());
    }
}
