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

//! The background thread performing writer calls in asynchronous mode.
//!
//! Producers enqueue `(writer, record)` pairs; a single consumer drains them
//! in order, so delivery to any one writer follows enqueue order. The thread
//! moves through `Running -> Draining -> Terminated` and never back: once
//! [`WritingThread::shutdown`] has been called, further enqueues are reported
//! and discarded, everything enqueued before is still delivered, and every
//! writer the thread has written to is flushed and closed before it exits.

use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::TryRecvError;
use crossbeam_channel::TrySendError;

use crate::internal;
use crate::record::LogRecord;
use crate::writer::Writer;

/// How producers behave when the queue is bounded and full.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum Overflow {
    /// Block until the queue has room.
    Block,
    /// Drop the incoming record.
    DropIncoming,
}

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const TERMINATED: u8 = 2;

enum Task {
    Entry {
        writer: Arc<dyn Writer>,
        record: LogRecord,
    },
    Shutdown,
}

/// Handle to the background writer thread.
#[derive(Debug)]
pub struct WritingThread {
    sender: Sender<Task>,
    overflow: Overflow,
    state: Arc<AtomicU8>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WritingThread {
    pub(crate) fn spawn(capacity: Option<usize>, overflow: Overflow) -> WritingThread {
        let (sender, receiver) = match capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity),
            None => crossbeam_channel::unbounded(),
        };

        let state = Arc::new(AtomicU8::new(RUNNING));
        let worker = Worker {
            receiver,
            state: state.clone(),
            written: Vec::new(),
        };

        let handle = std::thread::Builder::new()
            .name("lumber-writer".to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn the writing thread");

        WritingThread {
            sender,
            overflow,
            state,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Whether the thread still accepts records.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    pub(crate) fn enqueue(&self, writer: Arc<dyn Writer>, record: LogRecord) {
        if !self.is_running() {
            internal::warn_message("Discarding log entry enqueued after shutdown");
            return;
        }

        let task = Task::Entry { writer, record };
        match self.overflow {
            Overflow::Block => {
                if self.sender.send(task).is_err() {
                    internal::warn_message("Writing thread is gone, discarding log entry");
                }
            }
            Overflow::DropIncoming => match self.sender.try_send(task) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {
                    internal::warn_message("Writing thread is gone, discarding log entry");
                }
            },
        }
    }

    /// Stop accepting records and begin draining.
    ///
    /// Everything enqueued before this call is still delivered. Idempotent.
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(RUNNING, DRAINING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let _ = self.sender.send(Task::Shutdown);
        }
    }

    /// Block until the consumer has drained the queue and exited.
    pub fn join(&self) {
        let handle = self.handle.lock().ok().and_then(|mut handle| handle.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub(crate) fn shutdown_and_join(&self) {
        self.shutdown();
        self.join();
    }
}

enum Batch {
    Continue,
    Shutdown,
}

struct Worker {
    receiver: Receiver<Task>,
    state: Arc<AtomicU8>,
    written: Vec<Arc<dyn Writer>>,
}

impl Worker {
    fn run(mut self) {
        loop {
            match self.receiver.recv() {
                Ok(Task::Entry { writer, record }) => {
                    self.write(writer, &record);
                    if let Batch::Shutdown = self.process_available() {
                        break;
                    }
                }
                Ok(Task::Shutdown) | Err(_) => break,
            }
        }

        self.drain();
        self.close_all();
        self.state.store(TERMINATED, Ordering::Release);
    }

    /// Burst-process everything already queued, then flush once.
    fn process_available(&mut self) -> Batch {
        let outcome = loop {
            match self.receiver.try_recv() {
                Ok(Task::Entry { writer, record }) => self.write(writer, &record),
                Ok(Task::Shutdown) => break Batch::Shutdown,
                Err(TryRecvError::Empty) => break Batch::Continue,
                Err(TryRecvError::Disconnected) => break Batch::Shutdown,
            }
        };
        self.flush_all();
        outcome
    }

    fn write(&mut self, writer: Arc<dyn Writer>, record: &LogRecord) {
        if let Err(err) = writer.write(record) {
            internal::error(&err, "Failed to write log entry");
        }
        if !self.written.iter().any(|known| Arc::ptr_eq(known, &writer)) {
            self.written.push(writer);
        }
    }

    /// Entries enqueued concurrently with shutdown are delivered, not lost.
    fn drain(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(Task::Entry { writer, record }) => self.write(writer, &record),
                Ok(Task::Shutdown) => {}
                Err(_) => break,
            }
        }
    }

    fn flush_all(&self) {
        for writer in &self.written {
            if let Err(err) = writer.flush() {
                internal::error(&err, "Failed to flush writer");
            }
        }
    }

    fn close_all(&self) {
        self.flush_all();
        for writer in &self.written {
            if let Err(err) = writer.close() {
                internal::error(&err, "Failed to close writer");
            }
        }
    }
}
