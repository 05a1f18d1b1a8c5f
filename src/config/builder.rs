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

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Configuration;
use crate::config::WriterEntry;
use crate::logger;
use crate::pattern;
use crate::pattern::Token;
use crate::plugins::ErrorSanitizer;
use crate::plugins::FrameProvider;
use crate::plugins::Plugins;
use crate::record::Level;
use crate::writer::Console;
use crate::writer::Writer;
use crate::writing_thread::Overflow;
use crate::writing_thread::WritingThread;
use crate::Error;

pub(crate) const DEFAULT_FORMAT_PATTERN: &str = "{date} [{thread}] {level} {module}: {message}";

struct PendingWriter {
    writer: Arc<dyn Writer>,
    floor: Option<Level>,
    pattern: Option<Arc<str>>,
}

/// A builder producing and publishing [`Configuration`] snapshots.
///
/// # Examples
///
/// ```no_run
/// use lumber::record::Level;
/// use lumber::writer::Console;
///
/// lumber::Configurator::new()
///     .level(Level::Debug)
///     .level_for("noisy::dependency", Level::Warn)
///     .writer(Console::default())
///     .activate()
///     .unwrap();
/// ```
#[must_use = "call `activate` to publish the configuration"]
pub struct Configurator {
    level: Level,
    custom_levels: BTreeMap<String, Level>,
    writers: Vec<PendingWriter>,
    current_pattern: Option<Arc<str>>,
    writing_thread: bool,
    capacity: Option<usize>,
    overflow: Overflow,
    max_error_causes: Option<usize>,
    plugins: Plugins,
}

impl Configurator {
    /// Create a configurator with no writers.
    ///
    /// Until a writer is added, the resulting configuration discards every
    /// emission.
    pub fn new() -> Configurator {
        Configurator {
            level: Level::Info,
            custom_levels: BTreeMap::new(),
            writers: vec![],
            current_pattern: Some(Arc::from(DEFAULT_FORMAT_PATTERN)),
            writing_thread: false,
            capacity: None,
            overflow: Overflow::Block,
            max_error_causes: None,
            plugins: Plugins::default(),
        }
    }

    /// Create the stock configuration: level `Info` and a single console
    /// writer with the default format pattern.
    pub fn default_config() -> Configurator {
        Configurator::new().writer(Console::default())
    }

    /// Set the global severity threshold.
    pub fn level(mut self, level: Level) -> Configurator {
        self.level = level;
        self
    }

    /// Override the severity threshold for a module path and everything
    /// below it; `None` removes a previous override.
    ///
    /// Lookup at dispatch picks the longest configured prefix matching the
    /// emitting module on `::` boundaries.
    pub fn level_for(
        mut self,
        module_path: impl Into<String>,
        level: impl Into<Option<Level>>,
    ) -> Configurator {
        let module_path = module_path.into();
        match level.into() {
            Some(level) => {
                self.custom_levels.insert(module_path, level);
            }
            None => {
                self.custom_levels.remove(&module_path);
            }
        }
        self
    }

    /// Add a writer, rendering with the most recently set format pattern.
    pub fn writer(mut self, writer: impl Into<Arc<dyn Writer>>) -> Configurator {
        self.writers.push(PendingWriter {
            writer: writer.into(),
            floor: None,
            pattern: self.current_pattern.clone(),
        });
        self
    }

    /// Add a writer with its own severity floor.
    ///
    /// The writer only receives records at `floor` and above, regardless of
    /// the configured levels.
    pub fn writer_with_floor(
        mut self,
        writer: impl Into<Arc<dyn Writer>>,
        floor: Level,
    ) -> Configurator {
        self.writers.push(PendingWriter {
            writer: writer.into(),
            floor: Some(floor),
            pattern: self.current_pattern.clone(),
        });
        self
    }

    /// Remove all writers added so far.
    pub fn remove_all_writers(mut self) -> Configurator {
        self.writers.clear();
        self
    }

    /// Set the format pattern used by subsequently added writers.
    ///
    /// The pattern is parsed during [`activate`](Configurator::activate);
    /// malformed patterns fail activation.
    pub fn format_pattern(mut self, pattern: impl Into<String>) -> Configurator {
        self.current_pattern = Some(Arc::from(pattern.into()));
        self
    }

    /// Hand subsequently added writers raw records instead of rendered text.
    ///
    /// Such writers consume the record fields they declare; the record's
    /// rendered text stays unset for them.
    pub fn no_format_pattern(mut self) -> Configurator {
        self.current_pattern = None;
        self
    }

    /// Dispatch through the background writing thread instead of writing on
    /// the emitting thread.
    pub fn writing_thread(mut self, enabled: bool) -> Configurator {
        self.writing_thread = enabled;
        self
    }

    /// Bound the writing-thread queue; `None` keeps it unbounded.
    pub fn writing_thread_capacity(mut self, capacity: impl Into<Option<usize>>) -> Configurator {
        self.capacity = capacity.into();
        self
    }

    /// What producers do when a bounded writing-thread queue is full.
    pub fn overflow(mut self, overflow: Overflow) -> Configurator {
        self.overflow = overflow;
        self
    }

    /// Bound the rendered cause chain of attached errors.
    ///
    /// `Some(0)` renders only the top error, `None` the whole chain.
    pub fn max_error_causes(mut self, limit: impl Into<Option<usize>>) -> Configurator {
        self.max_error_causes = limit.into();
        self
    }

    /// Install a caller-frame provider.
    ///
    /// A provider installed on top of an existing one forms a chain: the
    /// older provider is asked first and `None` falls through to the newer.
    pub fn frame_provider(mut self, provider: impl Into<Arc<dyn FrameProvider>>) -> Configurator {
        self.plugins.add_frame_provider(provider.into());
        self
    }

    /// Install an error sanitizer.
    ///
    /// Sanitizers chain in registration order: the older instance runs first
    /// and its result feeds the newer one.
    pub fn error_sanitizer(
        mut self,
        sanitizer: impl Into<Arc<dyn ErrorSanitizer>>,
    ) -> Configurator {
        self.plugins.add_error_sanitizer(sanitizer.into());
        self
    }

    /// Build the configuration and publish it atomically.
    ///
    /// Writers not present in the previously active configuration are
    /// initialized exactly once before the snapshot becomes visible. Pattern
    /// and initialization failures surface here and leave the previous
    /// configuration in place. A writing thread is taken over from the
    /// previous configuration when both enable one; a thread the new
    /// configuration abandons is drained and joined.
    pub fn activate(self) -> Result<(), Error> {
        let previous = logger::current_configuration();

        let writing_thread = if self.writing_thread {
            match previous.writing_thread() {
                Some(thread) if thread.is_running() => Some(thread.clone()),
                _ => Some(Arc::new(WritingThread::spawn(self.capacity, self.overflow))),
            }
        } else {
            None
        };
        let spawned_fresh = writing_thread
            .as_ref()
            .is_some_and(|thread| !previous.writing_thread().is_some_and(|p| Arc::ptr_eq(p, thread)));

        let config = match self.build(writing_thread.clone()) {
            Ok(config) => config,
            Err(err) => {
                if spawned_fresh {
                    if let Some(thread) = writing_thread {
                        thread.shutdown_and_join();
                    }
                }
                return Err(err);
            }
        };

        match logger::set_configuration(config) {
            Ok(()) => Ok(()),
            Err(err) => {
                if spawned_fresh {
                    if let Some(thread) = writing_thread {
                        thread.shutdown_and_join();
                    }
                }
                Err(err)
            }
        }
    }

    pub(crate) fn build(self, writing_thread: Option<Arc<WritingThread>>) -> Result<Configuration, Error> {
        let mut parsed: HashMap<Arc<str>, Arc<[Token]>> = HashMap::new();
        let mut entries = Vec::with_capacity(self.writers.len());

        for pending in self.writers {
            let tokens = match pending.pattern {
                Some(text) => Some(match parsed.get(&text) {
                    Some(tokens) => tokens.clone(),
                    None => {
                        let tokens: Arc<[Token]> = pattern::parse(&text)?.into();
                        parsed.insert(text, tokens.clone());
                        tokens
                    }
                }),
                None => None,
            };
            entries.push(WriterEntry {
                writer: pending.writer,
                floor: pending.floor,
                tokens,
            });
        }

        Ok(Configuration::new(
            self.level,
            self.custom_levels.into_iter().collect(),
            entries,
            writing_thread,
            self.plugins,
            self.max_error_causes,
        ))
    }
}

impl Default for Configurator {
    fn default() -> Configurator {
        Configurator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_pattern() {
        let config = Configurator::default_config().build(None).unwrap();
        assert_eq!(config.global_level(), Level::Info);
        assert!(config.output_possible(Level::Info));
        assert!(!config.output_possible(Level::Debug));
    }

    #[test]
    fn malformed_pattern_fails_build() {
        let result = Configurator::new()
            .format_pattern("{bogus}")
            .writer(Console::default())
            .build(None);
        assert!(result.is_err());
    }

    #[test]
    fn pattern_applies_to_subsequent_writers_only() {
        let config = Configurator::new()
            .writer(Console::default())
            .no_format_pattern()
            .writer(Console::default())
            .build(None)
            .unwrap();

        let entries: Vec<_> = config.active_writers(Level::Info).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].tokens.is_some());
        assert!(entries[1].tokens.is_none());
    }

    #[test]
    fn level_for_none_removes_override() {
        let config = Configurator::new()
            .writer(Console::default())
            .level_for("a::b", Level::Debug)
            .level_for("a::b", None)
            .build(None)
            .unwrap();
        assert!(!config.has_custom_levels());
    }

    #[test]
    fn remove_all_writers_clears() {
        let config = Configurator::default_config()
            .remove_all_writers()
            .build(None)
            .unwrap();
        assert!(!config.output_possible(Level::Error));
    }
}
