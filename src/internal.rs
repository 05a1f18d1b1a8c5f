//! Last-resort diagnostics for failures inside the logging pipeline.
//!
//! Written straight to standard error, never through the dispatcher, so a
//! broken writer cannot feed its own failure back into itself. Repeating the
//! last message of a severity is suppressed to break feedback loops.

use std::io;
use std::io::Write;
use std::sync::Mutex;

use crate::Error;

static LAST_WARN: Mutex<Option<String>> = Mutex::new(None);
static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

pub(crate) fn error(cause: &Error, message: &str) {
    emit(&LAST_ERROR, format!("LOGGER ERROR: {message} ({cause})"));
}

pub(crate) fn warn(cause: &Error, message: &str) {
    emit(&LAST_WARN, format!("LOGGER WARN: {message} ({cause})"));
}

pub(crate) fn warn_message(message: &str) {
    emit(&LAST_WARN, format!("LOGGER WARN: {message}"));
}

fn emit(last: &Mutex<Option<String>>, line: String) {
    if let Ok(mut last) = last.lock() {
        if last.as_deref() == Some(line.as_str()) {
            return;
        }
        *last = Some(line.clone());
    }

    // best effort; there is nowhere left to report a failing stderr
    let _ = writeln!(io::stderr(), "{line}");
}
