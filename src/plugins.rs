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

//! Pluggable caller-frame providers and error sanitizers.
//!
//! A configuration holds at most one head instance per plugin interface.
//! Registering a second instance wraps the current head in a two-input
//! chain: the older instance runs first and its result feeds the newer one.
//! Chaining more than two instances nests chains; acceptable, since more
//! than two plugins of the same kind at once is improbable.

use std::fmt;
use std::sync::Arc;

use crate::frames::CallerFrame;
use crate::record::ErrorRef;

/// A pluggable strategy for locating the caller frame of an emission.
///
/// `depth` counts stack frames above the dispatcher's entry point; an
/// implementation walking the stack itself must account for its own frames.
/// Returning `None` yields control to the built-in discovery strategies.
pub trait FrameProvider: fmt::Debug + Send + Sync + 'static {
    /// Return the frame at `depth`, or `None` to fall through.
    ///
    /// With `only_module` the result may be a synthetic frame carrying
    /// nothing but the module path.
    fn get(&self, depth: usize, only_module: bool) -> Option<CallerFrame>;
}

impl<T: FrameProvider> From<T> for Arc<dyn FrameProvider> {
    fn from(value: T) -> Self {
        Arc::new(value)
    }
}

/// A pluggable rewrite of errors before they are attached to a record.
pub trait ErrorSanitizer: fmt::Debug + Send + Sync + 'static {
    /// Return the sanitized form of `error`.
    fn sanitize(&self, error: ErrorRef) -> ErrorRef;
}

impl<T: ErrorSanitizer> From<T> for Arc<dyn ErrorSanitizer> {
    fn from(value: T) -> Self {
        Arc::new(value)
    }
}

/// The plugin instances carried by a configuration snapshot.
///
/// Immutable once the snapshot is published.
#[derive(Clone, Debug, Default)]
pub struct Plugins {
    frame_provider: Option<Arc<dyn FrameProvider>>,
    error_sanitizer: Option<Arc<dyn ErrorSanitizer>>,
}

impl Plugins {
    /// The installed frame provider chain, if any.
    pub fn frame_provider(&self) -> Option<&Arc<dyn FrameProvider>> {
        self.frame_provider.as_ref()
    }

    /// The installed error sanitizer chain, if any.
    pub fn error_sanitizer(&self) -> Option<&Arc<dyn ErrorSanitizer>> {
        self.error_sanitizer.as_ref()
    }

    pub(crate) fn add_frame_provider(&mut self, provider: Arc<dyn FrameProvider>) {
        self.frame_provider = Some(match self.frame_provider.take() {
            Some(prev) => Arc::new(ChainedFrameProvider {
                prev,
                next: provider,
            }),
            None => provider,
        });
    }

    pub(crate) fn add_error_sanitizer(&mut self, sanitizer: Arc<dyn ErrorSanitizer>) {
        self.error_sanitizer = Some(match self.error_sanitizer.take() {
            Some(prev) => Arc::new(ChainedErrorSanitizer {
                prev,
                next: sanitizer,
            }),
            None => sanitizer,
        });
    }

}

#[derive(Debug)]
struct ChainedFrameProvider {
    prev: Arc<dyn FrameProvider>,
    next: Arc<dyn FrameProvider>,
}

impl FrameProvider for ChainedFrameProvider {
    fn get(&self, depth: usize, only_module: bool) -> Option<CallerFrame> {
        // the chain link itself occupies a frame on the way to each provider
        self.prev
            .get(depth + 1, only_module)
            .or_else(|| self.next.get(depth + 1, only_module))
    }
}

#[derive(Debug)]
struct ChainedErrorSanitizer {
    prev: Arc<dyn ErrorSanitizer>,
    next: Arc<dyn ErrorSanitizer>,
}

impl ErrorSanitizer for ChainedErrorSanitizer {
    fn sanitize(&self, error: ErrorRef) -> ErrorRef {
        self.next.sanitize(self.prev.sanitize(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::error_ref;
    use crate::Error;

    #[derive(Debug)]
    struct Tagging(&'static str);

    impl ErrorSanitizer for Tagging {
        fn sanitize(&self, error: ErrorRef) -> ErrorRef {
            error_ref(Error::new(format!("{}({error})", self.0)))
        }
    }

    #[test]
    fn sanitizers_compose_in_registration_order() {
        let mut plugins = Plugins::default();
        plugins.add_error_sanitizer(Arc::new(Tagging("s1")));
        plugins.add_error_sanitizer(Arc::new(Tagging("s2")));

        let sanitized = plugins
            .error_sanitizer()
            .unwrap()
            .sanitize(error_ref(Error::new("boom")));
        assert_eq!(sanitized.to_string(), "s2(s1(boom))");
    }

    #[derive(Debug)]
    struct Fixed {
        module: &'static str,
        seen_depth: std::sync::Mutex<Option<usize>>,
        answer: bool,
    }

    impl Fixed {
        fn new(module: &'static str, answer: bool) -> Fixed {
            Fixed {
                module,
                seen_depth: std::sync::Mutex::new(None),
                answer,
            }
        }
    }

    impl FrameProvider for Fixed {
        fn get(&self, depth: usize, _only_module: bool) -> Option<CallerFrame> {
            *self.seen_depth.lock().unwrap() = Some(depth);
            self.answer
                .then(|| CallerFrame::new(self.module, None, None, None))
        }
    }

    #[test]
    fn provider_chain_falls_through_and_adjusts_depth() {
        let first = Arc::new(Fixed::new("first", false));
        let second = Arc::new(Fixed::new("second", true));

        let mut plugins = Plugins::default();
        plugins.add_frame_provider(first.clone());
        plugins.add_frame_provider(second.clone());

        let frame = plugins.frame_provider().unwrap().get(3, false).unwrap();
        assert_eq!(frame.module_path(), "second");
        // each chain link passes on depth + 1 for its own frame
        assert_eq!(first.seen_depth.lock().unwrap().unwrap(), 4);
        assert_eq!(second.seen_depth.lock().unwrap().unwrap(), 4);
    }

    #[test]
    fn first_provider_wins_when_it_answers() {
        let first = Arc::new(Fixed::new("first", true));
        let second = Arc::new(Fixed::new("second", true));

        let mut plugins = Plugins::default();
        plugins.add_frame_provider(first);
        plugins.add_frame_provider(second.clone());

        let frame = plugins.frame_provider().unwrap().get(0, true).unwrap();
        assert_eq!(frame.module_path(), "first");
        assert!(second.seen_depth.lock().unwrap().is_none());
    }
}
