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

//! Format patterns and their render tokens.
//!
//! A format pattern such as `"{date} [{thread}] {level} {module}: {message}"`
//! is parsed once by the configurator into a sequence of [`Token`]s. During
//! dispatch every token appends its rendering of the record into a reusable
//! buffer; the concatenation plus the platform line terminator becomes the
//! record's final text.

use std::fmt;
use std::fmt::Write;

use crate::record::Field;
use crate::record::FieldSet;
use crate::record::LogRecord;
use crate::sys;

mod parse;

pub use self::parse::parse;

/// The timestamp rendering used by `{date}` without an explicit format.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One element of a parsed format pattern.
///
/// Every token declares the record fields it consumes; record assembly only
/// populates the union of the declared fields of all tokens and writers
/// active at the record's level. A token rendering a field the record does
/// not carry appends nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Literal text copied into the output unchanged.
    Literal(String),
    /// The id of the emitting process.
    ProcessId,
    /// The name of the emitting thread.
    Thread,
    /// The numeric id of the emitting thread.
    ThreadId,
    /// The fully qualified module path of the emitting code.
    Module,
    /// The parent of the emitting module path; empty for a top-level module.
    Parent,
    /// The last segment of the emitting module path.
    ModuleName,
    /// The name of the emitting function.
    Method,
    /// The source file of the emitting code.
    File,
    /// The source line of the emitting code.
    Line,
    /// The severity level of the record.
    Level,
    /// The record timestamp, rendered with a strftime format.
    Date(Option<String>),
    /// The rendered message, followed by the attached error and its cause
    /// chain if one is present.
    Message,
}

impl Token {
    /// The record fields this token consumes.
    pub fn required_fields(&self) -> FieldSet {
        let field = match self {
            Token::Literal(_) | Token::Level => return FieldSet::EMPTY,
            Token::ProcessId => Field::ProcessId,
            Token::Thread | Token::ThreadId => Field::Thread,
            Token::Module | Token::Parent | Token::ModuleName => Field::Module,
            Token::Method => Field::Method,
            Token::File => Field::File,
            Token::Line => Field::Line,
            Token::Date(_) => Field::Timestamp,
            Token::Message => Field::Message,
        };
        FieldSet::EMPTY.with(field)
    }

    /// Append this token's rendering of `record` to `out`.
    ///
    /// `max_error_causes` bounds the rendered cause chain of an attached
    /// error: `None` renders the whole chain, `Some(0)` only the top error.
    pub fn render(
        &self,
        record: &LogRecord,
        out: &mut String,
        max_error_causes: Option<usize>,
    ) -> fmt::Result {
        match self {
            Token::Literal(text) => out.push_str(text),
            Token::ProcessId => {
                if let Some(pid) = record.process_id() {
                    write!(out, "{pid}")?;
                }
            }
            Token::Thread => {
                if let Some(name) = record.thread().and_then(|thread| thread.name()) {
                    out.push_str(name);
                }
            }
            Token::ThreadId => {
                if let Some(thread) = record.thread() {
                    write!(out, "{}", thread.id())?;
                }
            }
            Token::Module => {
                if let Some(module) = record.module_path() {
                    out.push_str(module);
                }
            }
            Token::Parent => {
                if let Some(module) = record.module_path() {
                    if let Some(split) = module.rfind("::") {
                        out.push_str(&module[..split]);
                    }
                }
            }
            Token::ModuleName => {
                if let Some(module) = record.module_path() {
                    let name = module.rsplit("::").next().unwrap_or(module);
                    out.push_str(name);
                }
            }
            Token::Method => {
                if let Some(method) = record.method() {
                    out.push_str(method);
                }
            }
            Token::File => {
                if let Some(file) = record.file() {
                    out.push_str(file);
                }
            }
            Token::Line => {
                if let Some(line) = record.line() {
                    write!(out, "{line}")?;
                }
            }
            Token::Level => out.push_str(record.level().name()),
            Token::Date(format) => {
                if let Some(timestamp) = record.timestamp() {
                    let format = format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
                    write!(out, "{}", timestamp.strftime(format))?;
                }
            }
            Token::Message => {
                if let Some(message) = record.message() {
                    out.push_str(message);
                }
                if let Some(error) = record.error() {
                    if record.message().is_some() {
                        out.push_str(": ");
                    }
                    write!(out, "{error}")?;
                    render_causes(error.source(), out, max_error_causes)?;
                }
            }
        }

        Ok(())
    }
}

fn render_causes(
    mut cause: Option<&(dyn std::error::Error + 'static)>,
    out: &mut String,
    limit: Option<usize>,
) -> fmt::Result {
    let mut remaining = limit;
    while let Some(error) = cause {
        match &mut remaining {
            Some(0) => break,
            Some(n) => *n -= 1,
            None => {}
        }
        write!(out, "{}  caused by: {error}", sys::line_separator())?;
        cause = error.source();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::error_ref;
    use crate::record::Level;
    use crate::record::ThreadHandle;

    fn record() -> LogRecord {
        LogRecord {
            timestamp: Some(jiff::Zoned::now()),
            process_id: Some(42),
            thread: Some(ThreadHandle::current()),
            module_path: Some("com::test::MyClass".to_string()),
            method: Some("run".to_string()),
            file: Some("my_class.rs".to_string()),
            line: Some(17),
            level: Level::Info,
            message: Some("it happened".to_string()),
            error: None,
            rendered: None,
        }
    }

    fn render(token: Token, record: &LogRecord) -> String {
        let mut out = String::new();
        token.render(record, &mut out, None).unwrap();
        out
    }

    #[test]
    fn renders_module_family() {
        let record = record();
        assert_eq!(render(Token::Module, &record), "com::test::MyClass");
        assert_eq!(render(Token::Parent, &record), "com::test");
        assert_eq!(render(Token::ModuleName, &record), "MyClass");
    }

    #[test]
    fn parent_of_top_level_module_is_empty() {
        let mut record = record();
        record.module_path = Some("MyClass".to_string());
        assert_eq!(render(Token::Parent, &record), "");
        assert_eq!(render(Token::ModuleName, &record), "MyClass");
    }

    #[test]
    fn renders_scalar_fields() {
        let record = record();
        assert_eq!(render(Token::ProcessId, &record), "42");
        assert_eq!(render(Token::Line, &record), "17");
        assert_eq!(render(Token::Level, &record), "INFO");
        assert_eq!(render(Token::Method, &record), "run");
        assert_eq!(render(Token::File, &record), "my_class.rs");
    }

    #[test]
    fn missing_fields_render_empty() {
        let mut record = record();
        record.module_path = None;
        record.line = None;
        record.method = None;
        assert_eq!(render(Token::Module, &record), "");
        assert_eq!(render(Token::Parent, &record), "");
        assert_eq!(render(Token::Line, &record), "");
        assert_eq!(render(Token::Method, &record), "");
    }

    #[derive(Debug)]
    struct Fault {
        label: &'static str,
        cause: Option<Box<Fault>>,
    }

    impl Fault {
        fn new(label: &'static str) -> Fault {
            Fault { label, cause: None }
        }

        fn caused_by(label: &'static str, cause: Fault) -> Fault {
            Fault {
                label,
                cause: Some(Box::new(cause)),
            }
        }
    }

    impl fmt::Display for Fault {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label)
        }
    }

    impl std::error::Error for Fault {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.cause
                .as_deref()
                .map(|cause| cause as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn message_appends_error_chain() {
        let mut record = record();
        record.error = Some(error_ref(Fault::caused_by(
            "request failed",
            Fault::new("connection reset"),
        )));

        let rendered = render(Token::Message, &record);
        let expected = format!(
            "it happened: request failed{}  caused by: connection reset",
            sys::line_separator()
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn error_chain_respects_cause_limit() {
        let mut record = record();
        record.message = None;
        record.error = Some(error_ref(Fault::caused_by("outer", Fault::new("inner"))));

        let mut out = String::new();
        Token::Message.render(&record, &mut out, Some(0)).unwrap();
        assert_eq!(out, "outer");
    }

    #[test]
    fn date_uses_explicit_format() {
        let record = record();
        let year = render(Token::Date(Some("%Y".to_string())), &record);
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn declared_fields_match_rendering() {
        assert!(Token::Message
            .required_fields()
            .contains(Field::Message));
        assert!(Token::Date(None)
            .required_fields()
            .contains(Field::Timestamp));
        assert!(Token::Parent.required_fields().contains(Field::Module));
        assert!(Token::Literal("x".to_string()).required_fields().is_empty());
        assert!(Token::Level.required_fields().is_empty());
    }
}
