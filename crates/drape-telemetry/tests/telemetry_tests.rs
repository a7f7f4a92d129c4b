//! Integration tests for drape-telemetry.

use std::thread;

use drape_telemetry::{
    EventBus, EventKind, EventSink, JsonLinesSink, SimulationEvent, TracingSink, VecSink,
};

fn begin(step: u32) -> SimulationEvent {
    SimulationEvent::new(
        step,
        EventKind::TimestepBegin {
            sim_time: step as f64 * 0.002,
            dt: 0.002,
        },
    )
}

#[test]
fn emit_and_flush_in_order() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));

    bus.emit(begin(0));
    bus.emit(SimulationEvent::new(0, EventKind::TimestepEnd { wall_time: 0.001 }));
    assert!(sink.is_empty());

    assert_eq!(bus.flush(), 2);
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], begin(0));
    assert_eq!(events[1].kind.name(), "timestep_end");
}

#[test]
fn disabled_bus_drops_events() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    assert!(!bus.is_enabled());

    bus.emit(begin(0));
    assert_eq!(bus.flush(), 0);
    assert!(sink.is_empty());
}

#[test]
fn every_sink_sees_every_event() {
    let mut bus = EventBus::new();
    let a = VecSink::new();
    let b = VecSink::new();
    bus.add_sink(Box::new(a.clone()));
    bus.add_sink(Box::new(b.clone()));
    bus.add_sink(Box::new(TracingSink::new()));
    assert_eq!(bus.sink_count(), 3);
    assert_eq!(bus.sink_names(), vec!["vec_sink", "vec_sink", "tracing_sink"]);

    for step in 0..5 {
        bus.emit(begin(step));
    }
    bus.finish();
    assert_eq!(a.len(), 5);
    assert_eq!(b.events(), a.events());
}

#[test]
fn sender_works_across_threads() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));

    let sender = bus.sender();
    let handle = thread::spawn(move || {
        for step in 0..3 {
            sender.send(begin(step)).unwrap();
        }
    });
    handle.join().unwrap();

    bus.flush();
    let steps: Vec<u32> = sink.events().iter().map(|e| e.timestep).collect();
    assert_eq!(steps, vec![0, 1, 2]);
}

#[test]
fn events_round_trip_through_json() {
    let events = vec![
        SimulationEvent::new(
            5,
            EventKind::Energy {
                kinetic: 1.0,
                elastic: 0.5,
                barrier: 0.01,
                total: 1.51,
                drift_percent: -0.2,
            },
        ),
        SimulationEvent::new(
            6,
            EventKind::NewtonIteration {
                iteration: 2,
                gradient_norm: 1e-4,
                step_length: 3e-5,
                pcg_iterations: 17,
                ccd_limited: true,
            },
        ),
        SimulationEvent::new(
            7,
            EventKind::CollisionQuality {
                level: "good".into(),
                penetrations: 1,
                max_penetration: 2e-5,
            },
        ),
        SimulationEvent::new(
            8,
            EventKind::TimestepAdapted {
                old_dt: 0.002,
                new_dt: 0.003,
                max_velocity: 0.1,
            },
        ),
    ];
    for event in events {
        let json = serde_json::to_string(&event).unwrap();
        let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, event);
    }
}

#[test]
fn convergence_event_is_tagged() {
    let event = SimulationEvent::new(
        10,
        EventKind::Convergence {
            newton_iterations: 4,
            pcg_iterations: 120,
            final_gradient_norm: 1e-8,
            converged: true,
            stalled: false,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"convergence\""));
    assert!(json.contains("\"converged\":true"));
}

#[test]
fn custom_sink_receives_finalize() {
    struct Counting {
        handled: usize,
        finalized: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }
    impl EventSink for Counting {
        fn handle(&mut self, _event: &SimulationEvent) {
            self.handled += 1;
        }
        fn finalize(&mut self) {
            self.finalized
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
        fn name(&self) -> &str {
            "counting"
        }
    }

    let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(Counting {
        handled: 0,
        finalized: flag.clone(),
    }));
    bus.emit(begin(0));
    bus.finish();
    assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn json_lines_sink_writes_one_object_per_line() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.handle(&begin(0));
    sink.handle(&begin(1));
    sink.finalize();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let second: SimulationEvent = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second, begin(1));
}
