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

//! Lumber is a lightweight, embeddable logging library.
//!
//! # Overview
//!
//! Emissions are filtered against a global severity threshold and optional
//! per-module overrides, rendered through a configurable format pattern, and
//! handed to one or more writers — either on the emitting thread or through
//! a dedicated writing thread. The active configuration is an immutable
//! snapshot behind a single atomic cell: emitting threads take no lock, and
//! replacing the configuration never tears a record mid-assembly.
//!
//! # Examples
//!
//! Logging works out of the box at level `Info` with a console writer:
//!
//! ```
//! lumber::info!("Hello {}!", "World");
//! ```
//!
//! Reconfigure with the [`Configurator`]:
//!
//! ```no_run
//! use lumber::record::Level;
//! use lumber::writer::Console;
//!
//! lumber::Configurator::new()
//!     .level(Level::Debug)
//!     .level_for("noisy::dependency", Level::Warn)
//!     .format_pattern("{date} [{thread}] {level} {module}: {message}")
//!     .writer(Console::default())
//!     .writing_thread(true)
//!     .activate()
//!     .unwrap();
//!
//! lumber::debug!("now visible");
//! lumber::shutdown();
//! ```
//!
//! Programs using the [`log`] crate can route through lumber with
//! [`bridge::log::install`].
//!
//! [`log`]: https://docs.rs/log/

pub mod bridge;
pub mod config;
pub mod format;
pub mod frames;
pub mod logger;
pub mod pattern;
pub mod plugins;
pub mod record;
pub mod writer;

mod error;
pub use self::error::Error;

mod internal;
mod macros;
mod sys;

mod writing_thread;
pub use self::writing_thread::Overflow;
pub use self::writing_thread::WritingThread;

pub use self::config::Configuration;
pub use self::config::Configurator;
pub use self::frames::CallerFrame;
pub use self::logger::flush;
pub use self::logger::is_debug_enabled;
pub use self::logger::is_enabled;
pub use self::logger::is_error_enabled;
pub use self::logger::is_info_enabled;
pub use self::logger::is_trace_enabled;
pub use self::logger::is_warn_enabled;
pub use self::logger::shutdown;
pub use self::record::Level;
