//! # drape-telemetry
//!
//! Structured per-step simulation events (timing, Newton progress,
//! contacts, energy, collision quality, timestep changes) dispatched
//! through an event bus to pluggable sinks.
//!
//! ## Key Types
//!
//! - [`SimulationEvent`] / [`EventKind`] — Serializable event payloads
//! - [`EventBus`] — Channel-backed dispatcher
//! - [`VecSink`] / [`TracingSink`] / [`JsonLinesSink`] — In-memory, `tracing`
//!   and JSON Lines sinks

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, JsonLinesSink, TracingSink, VecSink};
