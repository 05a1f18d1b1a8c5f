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

//! Runtime `{}` placeholder substitution for log messages.
//!
//! Unlike `std::fmt`, the pattern is a runtime value and missing arguments
//! are not an error: every `{}` consumes the next positional argument, excess
//! arguments are ignored, and a `{}` without a matching argument stays in the
//! output verbatim. `{{` and `}}` produce literal braces.

use std::fmt;
use std::fmt::Write;

/// Substitute `{}` placeholders in `pattern` with the textual representation
/// of the given arguments.
///
/// A failing `Display` implementation surfaces as `fmt::Error`; the caller
/// treats that as a failed record assembly.
pub fn format(pattern: &str, arguments: &[&dyn fmt::Display]) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut args = arguments.iter();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    out.push('{');
                }
                Some('}') => {
                    chars.next();
                    match args.next() {
                        Some(argument) => write!(out, "{argument}")?,
                        None => out.push_str("{}"),
                    }
                }
                _ => out.push('{'),
            },
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Render a message given as a plain value.
pub fn render_display(value: &dyn fmt::Display) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(out, "{value}")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(values: &'a [&'a dyn fmt::Display]) -> &'a [&'a dyn fmt::Display] {
        values
    }

    #[test]
    fn substitutes_positional_arguments() {
        let rendered = format("{} + {} = {}", args(&[&1, &2, &3])).unwrap();
        assert_eq!(rendered, "1 + 2 = 3");
    }

    #[test]
    fn identity_without_placeholders() {
        assert_eq!(format("no args", args(&[])).unwrap(), "no args");
        assert_eq!(format("no args", args(&[&42])).unwrap(), "no args");
    }

    #[test]
    fn missing_arguments_stay_verbatim() {
        assert_eq!(format("a {} b", args(&[])).unwrap(), "a {} b");
        assert_eq!(format("{} and {}", args(&[&"x"])).unwrap(), "x and {}");
    }

    #[test]
    fn escaped_braces() {
        assert_eq!(format("{{}}", args(&[&1])).unwrap(), "{}");
        assert_eq!(format("a {{literal}} b", args(&[])).unwrap(), "a {literal} b");
        assert_eq!(format("{{{}}}", args(&[&7])).unwrap(), "{7}");
    }

    #[test]
    fn stray_braces_are_literal() {
        assert_eq!(format("a { b", args(&[&1])).unwrap(), "a { b");
        assert_eq!(format("a } b", args(&[])).unwrap(), "a } b");
    }

    #[test]
    fn renders_display_values() {
        assert_eq!(render_display(&"plain").unwrap(), "plain");
        assert_eq!(render_display(&1.5).unwrap(), "1.5");
    }

    #[test]
    fn failing_display_surfaces() {
        struct Broken;

        impl fmt::Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        assert!(format("{}", args(&[&Broken])).is_err());
        assert!(render_display(&Broken).is_err());
    }
}
