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

use crate::pattern::Token;
use crate::Error;

/// Parse a format pattern into its token sequence.
///
/// A pattern is literal text interspersed with placeholders of the form
/// `{token}` or `{token:options}`; `{{` and `}}` stand for literal braces.
/// Unknown tokens, stray options and invalid date formats are configuration
/// errors surfaced to the caller.
pub fn parse(pattern: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(Error::new(format!(
                        "unclosed placeholder in format pattern {pattern:?}"
                    )));
                }

                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(token_for(&name)?);
            }
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    Ok(tokens)
}

fn token_for(placeholder: &str) -> Result<Token, Error> {
    let (name, options) = match placeholder.split_once(':') {
        Some((name, options)) => (name, Some(options)),
        None => (placeholder, None),
    };

    let token = match name {
        "pid" => Token::ProcessId,
        "thread" => Token::Thread,
        "thread_id" => Token::ThreadId,
        "module" => Token::Module,
        "parent" => Token::Parent,
        "module_name" => Token::ModuleName,
        "method" => Token::Method,
        "file" => Token::File,
        "line" => Token::Line,
        "level" => Token::Level,
        "message" => Token::Message,
        "date" => {
            if let Some(format) = options {
                // reject malformed strftime formats at configuration time
                jiff::fmt::strtime::format(format, &jiff::Zoned::now()).map_err(|err| {
                    Error::new(format!("invalid date format {format:?}")).with_source(err)
                })?;
                return Ok(Token::Date(Some(format.to_string())));
            }
            return Ok(Token::Date(None));
        }
        _ => {
            return Err(Error::new(format!(
                "unknown token {{{name}}} in format pattern"
            )))
        }
    };

    if options.is_some() {
        return Err(Error::new(format!(
            "token {{{name}}} does not accept options"
        )));
    }

    Ok(token)
}
