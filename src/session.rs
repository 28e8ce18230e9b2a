//! Session
//!
//! One interactive session: a bus, an engine, the dispatcher wiring, and the
//! presentation-side subscriptions that collect output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bus::{topics, Event, EventBus, Payload};
use crate::config::{BackendKind, Config};
use crate::dispatcher::{Dispatcher, SharedEngine};
use crate::engine::{Engine, Output, StorageEngine};
use crate::error::{NestError, Result};
use crate::memtable::MemTable;
use crate::network::RemoteStore;

/// A running command session
///
/// Created once at startup; the bus lives exactly as long as the session
/// and is cleared when it is dropped.
pub struct Session {
    bus: Arc<EventBus>,
    engine: SharedEngine,

    /// Lines emitted on OUTPUT since the last `execute` returned
    outputs: Arc<Mutex<Vec<String>>>,

    /// Cleared by SHUTDOWN
    running: Arc<AtomicBool>,
}

impl Session {
    /// Open a session on the backend named by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let engine: Box<dyn StorageEngine> = match config.backend {
            BackendKind::Memory => Box::new(Engine::new(MemTable::new())),
            BackendKind::Remote => Box::new(Engine::new(RemoteStore::connect(config)?)),
        };

        tracing::debug!("Session opened on {} backend", config.backend);
        Ok(Self::with_engine(engine))
    }

    /// Open a session on an already-built engine
    pub fn with_engine(engine: Box<dyn StorageEngine>) -> Self {
        let bus = Arc::new(EventBus::new());
        let engine: SharedEngine = Arc::new(Mutex::new(engine));
        let outputs = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        Dispatcher::attach(&bus, Arc::clone(&engine));

        let sink = Arc::clone(&outputs);
        bus.subscribe(topics::OUTPUT, move |_: &EventBus, event: &Event| {
            let line = match &event.payload {
                Payload::Output(output) => output.to_string(),
                Payload::Text(text) => text.clone(),
                other => format!("{:?}", other),
            };
            sink.lock().push(line);
            Ok(())
        });

        let flag = Arc::clone(&running);
        bus.subscribe(topics::SHUTDOWN, move |_: &EventBus, _: &Event| {
            tracing::debug!("Shutdown requested");
            flag.store(false, Ordering::Relaxed);
            Ok(())
        });

        Self {
            bus,
            engine,
            outputs,
            running,
        }
    }

    /// Feed one input line; returns the output lines it produced
    ///
    /// Malformed arguments are reported as the diagnostic line and the
    /// session continues. Backend failures are returned as errors.
    pub fn execute(&self, line: &str) -> Result<Vec<String>> {
        let result = self.bus.publish(Event::input(line));
        let lines = std::mem::take(&mut *self.outputs.lock());

        match result {
            Ok(()) => Ok(lines),
            Err(NestError::InvalidArguments { verb, reason }) => {
                tracing::debug!("Rejected {}: {}", verb, reason);
                let mut lines = lines;
                lines.push(Output::UnknownCommand.to_string());
                Ok(lines)
            }
            Err(e) => Err(e),
        }
    }

    /// False once END has been processed
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// The session's bus, for extra subscribers
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Number of open transactions
    pub fn transaction_depth(&self) -> usize {
        self.engine.lock().transaction_depth()
    }

    /// Tear down the session; open transactions are abandoned in place
    pub fn close(self) {
        let depth = self.transaction_depth();
        if depth > 0 {
            tracing::debug!("Closing session with {} open transaction(s)", depth);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.bus.clear();
    }
}
