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

//! Immutable configuration snapshots.
//!
//! A [`Configuration`] is built by the [`Configurator`], published atomically,
//! and never mutated afterwards. Emissions in flight keep reading the
//! snapshot they loaded even if a new one is published mid-call. Everything
//! the hot path asks per level — can any writer accept it, which fields must
//! be assembled, how much of the caller frame is needed — is precomputed at
//! build time.

use std::sync::Arc;

use crate::pattern::Token;
use crate::plugins::Plugins;
use crate::record::Field;
use crate::record::FieldSet;
use crate::record::Level;
use crate::writer::Writer;
use crate::writing_thread::WritingThread;

mod builder;

pub use self::builder::Configurator;

/// How much of the caller frame dispatch must acquire for a level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum StackInfo {
    /// The caller frame is not consulted at all.
    None,
    /// Only the module path is needed; a cheap name-only lookup suffices.
    ModuleOnly,
    /// Function, file or line are needed; a full frame must be resolved.
    Full,
}

#[derive(Debug)]
pub(crate) struct WriterEntry {
    pub(crate) writer: Arc<dyn Writer>,
    pub(crate) floor: Option<Level>,
    pub(crate) tokens: Option<Arc<[Token]>>,
}

impl WriterEntry {
    fn accepts(&self, level: Level) -> bool {
        let floor = self.floor.or_else(|| self.writer.severity_floor());
        floor.is_none_or(|floor| level >= floor)
    }

    fn required_fields(&self) -> FieldSet {
        let mut fields = self.writer.required_fields();
        if let Some(tokens) = &self.tokens {
            // token demands are additive to the writer's own declaration
            for token in tokens.iter() {
                fields = fields.union(token.required_fields());
            }
        }
        fields
    }
}

/// An immutable snapshot of the logging configuration.
#[derive(Debug)]
pub struct Configuration {
    level: Level,
    custom_levels: Vec<(String, Level)>,
    writers: Vec<WriterEntry>,
    writing_thread: Option<Arc<WritingThread>>,
    plugins: Plugins,
    max_error_causes: Option<usize>,

    // per-level caches, indexed by Level::index()
    active: [Vec<usize>; 5],
    required: [FieldSet; 5],
    stack_info: [StackInfo; 5],
    output_possible: [bool; 5],
}

impl Configuration {
    pub(crate) fn new(
        level: Level,
        custom_levels: Vec<(String, Level)>,
        writers: Vec<WriterEntry>,
        writing_thread: Option<Arc<WritingThread>>,
        plugins: Plugins,
        max_error_causes: Option<usize>,
    ) -> Configuration {
        let lowest_level = custom_levels
            .iter()
            .map(|(_, level)| *level)
            .fold(level, Level::min);
        let has_custom_levels = !custom_levels.is_empty();

        let mut active: [Vec<usize>; 5] = Default::default();
        let mut required = [FieldSet::EMPTY; 5];
        let mut stack_info = [StackInfo::None; 5];
        let mut output_possible = [false; 5];

        for record_level in Level::REAL {
            let index = record_level.index();

            for (position, entry) in writers.iter().enumerate() {
                if entry.accepts(record_level) {
                    active[index].push(position);
                    required[index] = required[index].union(entry.required_fields());
                }
            }

            let fields = required[index];
            let full = fields.contains(Field::Method)
                || fields.contains(Field::File)
                || fields.contains(Field::Line);
            stack_info[index] = if full {
                StackInfo::Full
            } else if fields.contains(Field::Module) || has_custom_levels {
                StackInfo::ModuleOnly
            } else {
                StackInfo::None
            };

            output_possible[index] = !active[index].is_empty() && record_level >= lowest_level;
        }

        Configuration {
            level,
            custom_levels,
            writers,
            writing_thread,
            plugins,
            max_error_causes,
            active,
            required,
            stack_info,
            output_possible,
        }
    }

    /// The global severity threshold.
    pub fn global_level(&self) -> Level {
        self.level
    }

    /// Whether any per-module overrides are configured.
    pub fn has_custom_levels(&self) -> bool {
        !self.custom_levels.is_empty()
    }

    /// The effective severity threshold for code in `module_path`.
    ///
    /// Resolved by the longest configured prefix matching the path on `::`
    /// boundaries; without a match the global level applies.
    pub fn effective_level(&self, module_path: &str) -> Level {
        let mut best: Option<(usize, Level)> = None;
        for (prefix, level) in &self.custom_levels {
            if prefix_matches(module_path, prefix)
                && best.is_none_or(|(length, _)| prefix.len() > length)
            {
                best = Some((prefix.len(), *level));
            }
        }
        best.map_or(self.level, |(_, level)| level)
    }

    /// Whether any writer can accept a record at `level`.
    ///
    /// `false` means an emission at `level` returns without any further work.
    pub fn output_possible(&self, level: Level) -> bool {
        level != Level::Off && self.output_possible[level.index()]
    }

    /// The bound on rendered error cause chains.
    pub fn max_error_causes(&self) -> Option<usize> {
        self.max_error_causes
    }

    pub(crate) fn required_fields(&self, level: Level) -> FieldSet {
        self.required[level.index()]
    }

    pub(crate) fn stack_info(&self, level: Level) -> StackInfo {
        self.stack_info[level.index()]
    }

    pub(crate) fn active_writers(&self, level: Level) -> impl Iterator<Item = &WriterEntry> {
        self.active[level.index()]
            .iter()
            .map(|position| &self.writers[*position])
    }

    pub(crate) fn writers(&self) -> impl Iterator<Item = &Arc<dyn Writer>> {
        self.writers.iter().map(|entry| &entry.writer)
    }

    pub(crate) fn writing_thread(&self) -> Option<&Arc<WritingThread>> {
        self.writing_thread.as_ref()
    }

    pub(crate) fn plugins(&self) -> &Plugins {
        &self.plugins
    }
}

fn prefix_matches(module_path: &str, prefix: &str) -> bool {
    module_path == prefix
        || (module_path.len() > prefix.len()
            && module_path.starts_with(prefix)
            && module_path[prefix.len()..].starts_with("::"))
}
