//! Integration tests for pennant-telemetry.

use pennant_telemetry::bus::EventBus;
use pennant_telemetry::events::{EventKind, SimulationEvent};
use pennant_telemetry::sinks::{EventSink, TracingSink, VecSink};
use pennant_types::ClothId;

#[test]
fn emit_and_flush() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));

    bus.emit(SimulationEvent::new(0, EventKind::TickBegin { instances: 1 }));
    bus.emit(SimulationEvent::new(
        0,
        EventKind::TickEnd {
            wall_time: 0.001,
            synced: 1,
            skipped: 0,
        },
    ));
    assert!(sink.is_empty());

    assert_eq!(bus.flush(), 2);
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].label(), "tick_begin");
    assert_eq!(events[1].label(), "tick_end");
}

#[test]
fn disabled_bus_drops_events() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    assert!(!bus.is_enabled());

    bus.emit(SimulationEvent::new(0, EventKind::TickBegin { instances: 0 }));
    assert_eq!(bus.flush(), 0);
    assert!(sink.is_empty());
}

#[test]
fn multiple_sinks_see_every_event() {
    let mut bus = EventBus::new();
    let a = VecSink::new();
    let b = VecSink::new();
    bus.add_sink(Box::new(a.clone()));
    bus.add_sink(Box::new(b.clone()));
    bus.add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));
    assert_eq!(bus.sink_count(), 3);

    bus.emit(SimulationEvent::new(4, EventKind::InstanceRemoved { cloth: ClothId(2) }));
    bus.finalize();
    assert_eq!(a.events(), b.events());
    assert_eq!(a.len(), 1);
}

#[test]
fn tracing_sink_accepts_every_level() {
    for level in [
        tracing::Level::ERROR,
        tracing::Level::WARN,
        tracing::Level::INFO,
        tracing::Level::DEBUG,
        tracing::Level::TRACE,
    ] {
        let mut sink = TracingSink::new(level);
        assert_eq!(sink.level(), level);
        sink.handle(&SimulationEvent::new(0, EventKind::TickBegin { instances: 0 }));
        assert_eq!(sink.name(), "tracing_sink");
    }
}

#[test]
fn event_serialization() {
    let event = SimulationEvent::new(
        5,
        EventKind::StageDispatched {
            cloth: ClothId(1),
            stage: "normals".into(),
            groups: 20,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
}

#[test]
fn sync_skipped_event_carries_reason() {
    let event = SimulationEvent::new(
        10,
        EventKind::SyncSkipped {
            cloth: ClothId(0),
            reason: "render mesh 0 is held".into(),
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("render mesh 0 is held"));
    assert_eq!(event.label(), "sync_skipped");
}

#[test]
fn custom_event_uses_its_label() {
    let event = SimulationEvent::new(
        1,
        EventKind::Custom {
            label: "resize".into(),
            payload: "{}".into(),
        },
    );
    assert_eq!(event.label(), "resize");
}
