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

//! The `log`-crate facade mapped onto the dispatcher.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use lumber::record::Field;
use lumber::record::FieldSet;
use lumber::record::Level;
use lumber::record::LogRecord;
use lumber::writer::Writer;
use lumber::Configurator;
use lumber::Error;

static CONFIG_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    CONFIG_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct Store {
    fields: FieldSet,
    records: Mutex<Vec<LogRecord>>,
}

impl Store {
    fn new(fields: FieldSet) -> Arc<Store> {
        Arc::new(Store {
            fields,
            records: Mutex::new(Vec::new()),
        })
    }

    fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl Writer for Store {
    fn required_fields(&self) -> FieldSet {
        self.fields
    }

    fn write(&self, record: &LogRecord) -> Result<(), Error> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[test]
fn log_crate_records_route_into_the_dispatcher() {
    let _guard = lock();

    let store = Store::new(
        FieldSet::EMPTY
            .with(Field::Message)
            .with(Field::Module)
            .with(Field::File)
            .with(Field::Line),
    );
    let writer: Arc<dyn Writer> = store.clone();
    Configurator::new()
        .level(Level::Trace)
        .no_format_pattern()
        .writer(writer)
        .activate()
        .unwrap();

    // install may have happened in another test of this binary already
    let _ = lumber::bridge::log::install();

    log::info!("hello {}", 7);
    log::error!("bad news");

    let records = store.records();
    assert_eq!(records.len(), 2);

    let info = &records[0];
    assert_eq!(info.level(), Level::Info);
    assert_eq!(info.message(), Some("hello 7"));
    assert_eq!(info.module_path(), Some(module_path!()));
    assert!(info.file().unwrap().ends_with("bridge.rs"));
    assert!(info.line().is_some());

    assert_eq!(records[1].level(), Level::Error);
    store.clear();
}

#[test]
fn log_crate_level_checks_follow_the_configuration() {
    let _guard = lock();

    let store = Store::new(FieldSet::EMPTY.with(Field::Message));
    let writer: Arc<dyn Writer> = store.clone();
    Configurator::new()
        .level(Level::Warn)
        .no_format_pattern()
        .writer(writer)
        .activate()
        .unwrap();

    // install may have happened in another test of this binary already
    let _ = lumber::bridge::log::install();

    assert!(!log::log_enabled!(log::Level::Info));
    assert!(log::log_enabled!(log::Level::Warn));

    log::info!("filtered out");
    log::warn!("kept");

    let messages: Vec<_> = store
        .records()
        .iter()
        .map(|record| record.message().unwrap_or_default().to_string())
        .collect();
    assert_eq!(messages, vec!["kept".to_string()]);
}
