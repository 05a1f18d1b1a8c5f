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

use std::io::Write;

use crate::record::FieldSet;
use crate::record::Level;
use crate::record::LogRecord;
use crate::writer::Writer;
use crate::Error;

/// A writer that emits rendered records to the console.
///
/// Records at [`Level::Warn`] and above go to standard error, everything else
/// to standard output.
///
/// # Examples
///
/// ```
/// use lumber::writer::Console;
///
/// let console = Console::default();
/// ```
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Console {}

impl Writer for Console {
    fn required_fields(&self) -> FieldSet {
        // everything this writer needs is demanded by its format tokens
        FieldSet::EMPTY
    }

    fn write(&self, record: &LogRecord) -> Result<(), Error> {
        let text = record.rendered().or(record.message()).unwrap_or_default();
        if record.level() >= Level::Warn {
            std::io::stderr()
                .write_all(text.as_bytes())
                .map_err(Error::from_io_error)?;
        } else {
            std::io::stdout()
                .write_all(text.as_bytes())
                .map_err(Error::from_io_error)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)?;
        std::io::stderr().flush().map_err(Error::from_io_error)?;
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        self.flush()
    }
}
