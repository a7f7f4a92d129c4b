//! Event sinks.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::events::{EventKind, SimulationEvent};

/// Consumer of bus events.
pub trait EventSink: Send {
    /// Processes one event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called once when the run ends.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Collects events in memory.
///
/// Clones share the same buffer, so a clone kept by the caller can read
/// what the boxed copy inside the bus received.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn events(&self) -> Vec<SimulationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`.
///
/// Per-iteration events go to `debug`, everything else to `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        match &event.kind {
            EventKind::NewtonIteration { .. } | EventKind::TimestepBegin { .. } => {
                debug!(timestep = event.timestep, event = ?event.kind, "simulation_event");
            }
            kind => {
                info!(
                    timestep = event.timestep,
                    kind = kind.name(),
                    event = ?kind,
                    "simulation_event"
                );
            }
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

/// Writes one JSON object per event to a writer (JSON Lines).
///
/// Write errors are logged and the sink stops writing.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    failed: bool,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn handle(&mut self, event: &SimulationEvent) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = result {
            warn!(error = %err, "json lines sink disabled after write failure");
            self.failed = true;
        }
    }

    fn finalize(&mut self) {
        if let Err(err) = self.writer.flush() {
            warn!(error = %err, "json lines sink flush failed");
        }
    }

    fn name(&self) -> &str {
        "json_lines_sink"
    }
}
