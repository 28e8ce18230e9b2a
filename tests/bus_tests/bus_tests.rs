//! EventBus Tests
//!
//! Tests verify:
//! - Registration-order delivery
//! - Topic isolation
//! - Synchronous nested publishing
//! - Failure stops later handlers and reaches the publisher
//! - Subscribing from inside a handler
//! - Teardown

use std::sync::Arc;

use nestkv::bus::{topics, Event, EventBus, Payload};
use nestkv::NestError;
use parking_lot::Mutex;

fn recorder() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

// =============================================================================
// Delivery Tests
// =============================================================================

#[test]
fn test_publish_without_subscribers_is_ok() {
    let bus = EventBus::new();
    bus.publish(Event::new("NOBODY", Payload::Empty)).unwrap();
}

#[test]
fn test_handlers_run_in_registration_order() {
    let bus = EventBus::new();
    let log = recorder();

    for name in ["first", "second", "third"] {
        let log = Arc::clone(&log);
        bus.subscribe("T", move |_: &EventBus, _: &Event| {
            log.lock().push(name.to_string());
            Ok(())
        });
    }

    bus.publish(Event::new("T", Payload::Empty)).unwrap();

    assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    assert_eq!(bus.subscriber_count("T"), 3);
}

#[test]
fn test_topics_are_isolated() {
    let bus = EventBus::new();
    let log = recorder();

    let a = Arc::clone(&log);
    bus.subscribe("A", move |_: &EventBus, _: &Event| {
        a.lock().push("A".to_string());
        Ok(())
    });
    let b = Arc::clone(&log);
    bus.subscribe("B", move |_: &EventBus, _: &Event| {
        b.lock().push("B".to_string());
        Ok(())
    });

    bus.publish(Event::new("B", Payload::Empty)).unwrap();

    assert_eq!(*log.lock(), vec!["B"]);
}

#[test]
fn test_handler_receives_payload() {
    let bus = EventBus::new();
    let log = recorder();

    let sink = Arc::clone(&log);
    bus.subscribe(topics::INPUT, move |_: &EventBus, event: &Event| {
        if let Payload::Text(line) = &event.payload {
            sink.lock().push(line.clone());
        }
        Ok(())
    });

    bus.publish(Event::input("GET a")).unwrap();

    assert_eq!(*log.lock(), vec!["GET a"]);
}

#[test]
fn test_nested_publish_completes_before_outer_returns() {
    let bus = EventBus::new();
    let log = recorder();

    let outer = Arc::clone(&log);
    bus.subscribe("OUTER", move |bus: &EventBus, _: &Event| {
        outer.lock().push("outer-start".to_string());
        bus.publish(Event::new("INNER", Payload::Empty))?;
        outer.lock().push("outer-end".to_string());
        Ok(())
    });
    let inner = Arc::clone(&log);
    bus.subscribe("INNER", move |_: &EventBus, _: &Event| {
        inner.lock().push("inner".to_string());
        Ok(())
    });

    bus.publish(Event::new("OUTER", Payload::Empty)).unwrap();

    assert_eq!(*log.lock(), vec!["outer-start", "inner", "outer-end"]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failing_handler_stops_later_handlers() {
    let bus = EventBus::new();
    let log = recorder();

    let before = Arc::clone(&log);
    bus.subscribe("T", move |_: &EventBus, _: &Event| {
        before.lock().push("before".to_string());
        Ok(())
    });
    bus.subscribe("T", |_: &EventBus, _: &Event| {
        Err(NestError::Backend("boom".to_string()))
    });
    let after = Arc::clone(&log);
    bus.subscribe("T", move |_: &EventBus, _: &Event| {
        after.lock().push("after".to_string());
        Ok(())
    });

    let result = bus.publish(Event::new("T", Payload::Empty));

    assert!(matches!(result, Err(NestError::Backend(ref msg)) if msg == "boom"));
    assert_eq!(*log.lock(), vec!["before"]);
}

#[test]
fn test_nested_failure_reaches_outer_publisher() {
    let bus = EventBus::new();

    bus.subscribe("OUTER", |bus: &EventBus, _: &Event| {
        bus.publish(Event::new("INNER", Payload::Empty))
    });
    bus.subscribe("INNER", |_: &EventBus, _: &Event| {
        Err(NestError::Remote("down".to_string()))
    });

    let result = bus.publish(Event::new("OUTER", Payload::Empty));
    assert!(matches!(result, Err(NestError::Remote(_))));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_subscribe_during_publish_applies_to_next_publish() {
    let bus = EventBus::new();
    let log = recorder();

    let sink = Arc::clone(&log);
    bus.subscribe("T", move |bus: &EventBus, _: &Event| {
        let late = Arc::clone(&sink);
        bus.subscribe("T", move |_: &EventBus, _: &Event| {
            late.lock().push("late".to_string());
            Ok(())
        });
        Ok(())
    });

    bus.publish(Event::new("T", Payload::Empty)).unwrap();
    assert!(log.lock().is_empty());

    bus.publish(Event::new("T", Payload::Empty)).unwrap();
    assert_eq!(*log.lock(), vec!["late"]);
}

#[test]
fn test_clear_drops_all_subscriptions() {
    let bus = EventBus::new();
    bus.subscribe(topics::OUTPUT, |_: &EventBus, _: &Event| Ok(()));
    bus.subscribe(topics::SHUTDOWN, |_: &EventBus, _: &Event| Ok(()));

    bus.clear();

    assert_eq!(bus.subscriber_count(topics::OUTPUT), 0);
    assert_eq!(bus.subscriber_count(topics::SHUTDOWN), 0);
}
