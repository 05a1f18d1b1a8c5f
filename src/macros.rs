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

//! The logging macros.
//!
//! Four shapes per severity: a displayable message, a `{}` pattern with
//! arguments, an error, and an error with a pattern. The call site is
//! captured statically, so no stack walking happens on this path.

/// Emit a record at an explicit severity level.
///
/// # Examples
///
/// ```
/// use lumber::record::Level;
///
/// lumber::log!(Level::Info, "ready");
/// lumber::log!(Level::Info, "listening on {}", 8080);
///
/// let err = std::io::Error::other("boom");
/// lumber::log!(Level::Error, err: err);
/// ```
#[macro_export]
macro_rules! log {
    ($level:expr, err: $err:expr $(,)?) => {
        $crate::logger::log_with_frame(
            &$crate::CallerFrame::here(::core::module_path!(), ::core::file!(), ::core::line!()),
            $level,
            ::core::option::Option::Some($crate::record::error_ref($err)),
            $crate::logger::Payload::None,
        )
    };
    ($level:expr, err: $err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::logger::log_with_frame(
            &$crate::CallerFrame::here(::core::module_path!(), ::core::file!(), ::core::line!()),
            $level,
            ::core::option::Option::Some($crate::record::error_ref($err)),
            $crate::logger::Payload::Format($fmt, &[$(&$arg as &dyn ::core::fmt::Display),*]),
        )
    };
    ($level:expr, $fmt:literal, $($arg:expr),+ $(,)?) => {
        $crate::logger::log_with_frame(
            &$crate::CallerFrame::here(::core::module_path!(), ::core::file!(), ::core::line!()),
            $level,
            ::core::option::Option::None,
            $crate::logger::Payload::Format($fmt, &[$(&$arg as &dyn ::core::fmt::Display),+]),
        )
    };
    ($level:expr, $message:expr $(,)?) => {
        $crate::logger::log_with_frame(
            &$crate::CallerFrame::here(::core::module_path!(), ::core::file!(), ::core::line!()),
            $level,
            ::core::option::Option::None,
            $crate::logger::Payload::Display(&$message),
        )
    };
}

/// Emit a trace record.
///
/// # Examples
///
/// ```
/// lumber::trace!("Hello {}!", "World");
/// ```
#[macro_export]
macro_rules! trace {
    ($($args:tt)+) => {
        $crate::log!($crate::record::Level::Trace, $($args)+)
    };
}

/// Emit a debug record.
#[macro_export]
macro_rules! debug {
    ($($args:tt)+) => {
        $crate::log!($crate::record::Level::Debug, $($args)+)
    };
}

/// Emit an info record.
///
/// # Examples
///
/// ```
/// lumber::info!("service started");
/// ```
#[macro_export]
macro_rules! info {
    ($($args:tt)+) => {
        $crate::log!($crate::record::Level::Info, $($args)+)
    };
}

/// Emit a warn record.
#[macro_export]
macro_rules! warn {
    ($($args:tt)+) => {
        $crate::log!($crate::record::Level::Warn, $($args)+)
    };
}

/// Emit an error record.
///
/// # Examples
///
/// ```
/// let err = std::io::Error::other("disk full");
/// lumber::error!(err: err, "failed to persist {}", "state");
/// ```
#[macro_export]
macro_rules! error {
    ($($args:tt)+) => {
        $crate::log!($crate::record::Level::Error, $($args)+)
    };
}
