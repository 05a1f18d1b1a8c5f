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

//! Lifecycle and ordering guarantees of the writing thread.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
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

#[derive(Debug, Default)]
struct Store {
    gate_closed: AtomicBool,
    flushed: AtomicBool,
    closed: AtomicBool,
    messages: Mutex<Vec<String>>,
}

impl Store {
    fn new() -> Arc<Store> {
        Arc::new(Store::default())
    }

    fn gated() -> Arc<Store> {
        let store = Store::new();
        store.gate_closed.store(true, Ordering::SeqCst);
        store
    }

    fn open_gate(&self) {
        self.gate_closed.store(false, Ordering::SeqCst);
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Writer for Store {
    fn required_fields(&self) -> FieldSet {
        FieldSet::EMPTY.with(Field::Message)
    }

    fn write(&self, record: &LogRecord) -> Result<(), Error> {
        while self.gate_closed.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        self.messages
            .lock()
            .unwrap()
            .push(record.message().unwrap_or_default().to_string());
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        self.flushed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn activate(store: &Arc<Store>) {
    let writer: Arc<dyn Writer> = store.clone();
    Configurator::new()
        .level(Level::Trace)
        .no_format_pattern()
        .writer(writer)
        .writing_thread(true)
        .activate()
        .unwrap();
}

#[test]
fn emission_does_not_deliver_on_the_calling_thread() {
    let _guard = lock();

    let store = Store::gated();
    activate(&store);

    // returns immediately even though the writer is blocked
    lumber::info!("queued");
    assert!(store.messages().is_empty());

    store.open_gate();
    lumber::shutdown();

    assert_eq!(store.messages(), vec!["queued".to_string()]);
    assert!(store.flushed.load(Ordering::SeqCst));
    assert!(store.closed.load(Ordering::SeqCst));
}

#[test]
fn shutdown_delivers_everything_enqueued_before() {
    let _guard = lock();

    let store = Store::new();
    activate(&store);

    for i in 0..100 {
        lumber::info!("entry {}", i);
    }
    lumber::shutdown();

    let messages = store.messages();
    assert_eq!(messages.len(), 100);
    assert_eq!(messages[0], "entry 0");
    assert_eq!(messages[99], "entry 99");
}

#[test]
fn delivery_preserves_enqueue_order_per_producer() {
    let _guard = lock();

    let store = Store::new();
    activate(&store);

    let producers: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|name| {
            std::thread::spawn(move || {
                for i in 0..100 {
                    lumber::info!("{}-{}", name, i);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    lumber::shutdown();

    let messages = store.messages();
    assert_eq!(messages.len(), 200);
    for name in ["a", "b"] {
        let sequence: Vec<&String> = messages
            .iter()
            .filter(|message| message.starts_with(name))
            .collect();
        assert_eq!(sequence.len(), 100);
        for (i, message) in sequence.iter().enumerate() {
            assert_eq!(**message, format!("{name}-{i}"));
        }
    }
}

#[test]
fn enqueue_after_shutdown_is_discarded() {
    let _guard = lock();

    let store = Store::new();
    activate(&store);

    lumber::info!("before");
    lumber::shutdown();
    lumber::info!("after");

    assert_eq!(store.messages(), vec!["before".to_string()]);
}

#[test]
fn bounded_queue_drops_incoming_when_full() {
    let _guard = lock();

    let store = Store::gated();
    let writer: Arc<dyn Writer> = store.clone();
    Configurator::new()
        .level(Level::Trace)
        .no_format_pattern()
        .writer(writer)
        .writing_thread(true)
        .writing_thread_capacity(1)
        .overflow(lumber::Overflow::DropIncoming)
        .activate()
        .unwrap();

    // the consumer is blocked on the first entry; the queue holds at most
    // one more, the rest is dropped without blocking this thread
    for i in 0..10 {
        lumber::info!("burst {}", i);
    }
    store.open_gate();
    lumber::shutdown();

    let delivered = store.messages().len();
    assert!(delivered >= 1);
    assert!(delivered <= 2);
}

#[test]
fn failing_writer_does_not_stop_the_consumer() {
    let _guard = lock();

    #[derive(Debug)]
    struct Failing;

    impl Writer for Failing {
        fn required_fields(&self) -> FieldSet {
            FieldSet::EMPTY
        }

        fn write(&self, _: &LogRecord) -> Result<(), Error> {
            Err(Error::new("writer is broken"))
        }
    }

    let store = Store::new();
    let store_writer: Arc<dyn Writer> = store.clone();
    Configurator::new()
        .level(Level::Trace)
        .no_format_pattern()
        .writer(Failing)
        .writer(store_writer)
        .writing_thread(true)
        .activate()
        .unwrap();

    lumber::error!("still delivered");
    lumber::shutdown();

    assert_eq!(store.messages(), vec!["still delivered".to_string()]);
}
