//! Session Tests
//!
//! End-to-end command scripts through bus, dispatcher and local engine.
//!
//! These tests verify:
//! - Line-level behavior of every verb
//! - Sentinel outputs (NULL, NO TRANSACTION, diagnostic)
//! - Malformed arity handling
//! - END shutdown semantics
//! - Payload unwrapping per verb

use std::sync::Arc;

use nestkv::bus::{topics, Event, EventBus, Payload};
use nestkv::command::Verb;
use nestkv::dispatcher::unwrap_payload;
use nestkv::engine::Operation;
use nestkv::{Config, NestError, Session};
use parking_lot::Mutex;

const UNKNOWN: &str = "Unknown command or invalid arguments";

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_session() -> Session {
    Session::open(&Config::default()).unwrap()
}

/// Run every line and collect all output lines in order
fn run_script(session: &Session, lines: &[&str]) -> Vec<String> {
    let mut outputs = Vec::new();
    for line in lines {
        outputs.extend(session.execute(line).unwrap());
    }
    outputs
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_session_set_get() {
    let session = setup_session();

    let out = run_script(&session, &["SET a 10", "GET a", "GET b"]);

    assert_eq!(out, vec!["10", "NULL"]);
}

#[test]
fn test_session_last_write_wins_and_unset() {
    let session = setup_session();

    let out = run_script(
        &session,
        &["SET a 1", "SET a 2", "GET a", "UNSET a", "GET a", "UNSET a", "GET a"],
    );

    assert_eq!(out, vec!["2", "NULL", "NULL"]);
}

#[test]
fn test_session_counts_and_find() {
    let session = setup_session();

    let out = run_script(
        &session,
        &[
            "SET b 10", "SET a 10", "SET c 20", "COUNTS 10", "FIND 10", "FIND 30", "COUNTS 30",
        ],
    );

    assert_eq!(out, vec!["2", "a b", "NULL", "0"]);
}

#[test]
fn test_session_verbs_are_case_insensitive() {
    let session = setup_session();

    let out = run_script(&session, &["set a 1", "get a", "Counts 1"]);

    assert_eq!(out, vec!["1", "1"]);
}

#[test]
fn test_session_blank_line_produces_nothing() {
    let session = setup_session();

    assert!(session.execute("").unwrap().is_empty());
    assert!(session.execute("    ").unwrap().is_empty());
}

// =============================================================================
// Transaction Tests
// =============================================================================

#[test]
fn test_session_no_transaction() {
    let session = setup_session();

    let out = run_script(&session, &["ROLLBACK", "COMMIT"]);

    assert_eq!(out, vec!["NO TRANSACTION", "NO TRANSACTION"]);
}

#[test]
fn test_session_rollback_single_write() {
    let session = setup_session();

    let out = run_script(&session, &["SET x 1", "BEGIN", "SET x 2", "ROLLBACK", "GET x"]);

    assert_eq!(out, vec!["1"]);
}

#[test]
fn test_session_rollback_drift() {
    let session = setup_session();

    let out = run_script(
        &session,
        &["SET x 1", "BEGIN", "SET x 2", "SET x 3", "ROLLBACK", "GET x"],
    );

    assert_eq!(out, vec!["2"]);
}

#[test]
fn test_session_commit_permanence_across_nesting() {
    let session = setup_session();

    let out = run_script(
        &session,
        &[
            "BEGIN", "SET x 1", "BEGIN", "SET y 2", "COMMIT", "ROLLBACK", "GET y", "GET x",
        ],
    );

    assert_eq!(out, vec!["2", "NULL"]);
}

#[test]
fn test_session_nested_transactions() {
    let session = setup_session();

    let out = run_script(
        &session,
        &[
            "BEGIN", "SET a 10", "GET a", "BEGIN", "SET a 20", "GET a", "ROLLBACK", "GET a",
            "ROLLBACK", "GET a", "ROLLBACK",
        ],
    );

    assert_eq!(out, vec!["10", "20", "10", "NULL", "NO TRANSACTION"]);
}

#[test]
fn test_session_counts_inside_transaction() {
    let session = setup_session();

    let out = run_script(
        &session,
        &[
            "SET a 10", "BEGIN", "COUNTS 10", "SET b 10", "COUNTS 10", "ROLLBACK", "COUNTS 10",
        ],
    );

    assert_eq!(out, vec!["1", "2", "1"]);
}

#[test]
fn test_session_begin_ignores_arguments() {
    let session = setup_session();

    let out = run_script(&session, &["BEGIN now", "SET a 1", "ROLLBACK", "GET a"]);

    assert_eq!(out, vec!["NULL"]);
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_session_unknown_verb() {
    let session = setup_session();

    let out = run_script(&session, &["SET a 1", "FROB x", "GET a"]);

    assert_eq!(out, vec![UNKNOWN, "1"]);
}

#[test]
fn test_session_set_with_one_argument() {
    let session = setup_session();

    let out = run_script(&session, &["SET a", "GET a"]);

    assert_eq!(out, vec![UNKNOWN, "NULL"]);
}

#[test]
fn test_session_set_with_three_arguments() {
    let session = setup_session();

    let out = run_script(&session, &["SET a b c", "GET a"]);

    assert_eq!(out, vec![UNKNOWN, "NULL"]);
}

#[test]
fn test_session_get_with_wrong_arity() {
    let session = setup_session();

    let out = run_script(&session, &["GET", "GET a b", "FIND", "COUNTS 1 2", "UNSET"]);

    assert_eq!(out, vec![UNKNOWN; 5]);
}

#[test]
fn test_session_continues_after_malformed_input() {
    let session = setup_session();

    run_script(&session, &["FROB", "SET a"]);

    assert!(session.is_running());
    assert_eq!(session.execute("SET a 5").unwrap(), Vec::<String>::new());
    assert_eq!(session.execute("GET a").unwrap(), vec!["5"]);
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_session_end_stops_running() {
    let session = setup_session();
    assert!(session.is_running());

    let out = session.execute("END").unwrap();

    assert!(out.is_empty());
    assert!(!session.is_running());
}

#[test]
fn test_session_end_abandons_open_transactions() {
    let session = setup_session();

    run_script(&session, &["BEGIN", "SET a 1", "BEGIN", "END"]);

    assert!(!session.is_running());
    assert_eq!(session.transaction_depth(), 2);
    session.close();
}

#[test]
fn test_session_drop_clears_bus() {
    let session = setup_session();
    let bus = Arc::clone(session.bus());
    assert!(bus.subscriber_count(topics::INPUT) > 0);

    drop(session);

    assert_eq!(bus.subscriber_count(topics::INPUT), 0);
    assert_eq!(bus.subscriber_count(topics::OUTPUT), 0);
}

// =============================================================================
// Bus Integration Tests
// =============================================================================

#[test]
fn test_session_extra_output_subscriber_sees_outputs_in_order() {
    let session = setup_session();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    session
        .bus()
        .subscribe(topics::OUTPUT, move |_: &EventBus, event: &Event| {
            if let Payload::Output(output) = &event.payload {
                sink.lock().push(output.to_string());
            }
            Ok(())
        });

    run_script(&session, &["SET a 1", "GET a", "COMMIT", "FIND 1"]);

    assert_eq!(*seen.lock(), vec!["1", "NO TRANSACTION", "a"]);
}

#[test]
fn test_session_verb_events_can_be_published_directly() {
    let session = setup_session();

    session
        .bus()
        .publish(Event::new(
            "SET",
            Payload::List(vec!["k".to_string(), "v".to_string()]),
        ))
        .unwrap();

    assert_eq!(session.execute("GET k").unwrap(), vec!["v"]);
}

#[test]
fn test_session_direct_publish_with_bad_shape_fails() {
    let session = setup_session();

    let result = session
        .bus()
        .publish(Event::new("SET", Payload::Text("k".to_string())));

    assert!(matches!(result, Err(NestError::InvalidArguments { .. })));
}

// =============================================================================
// Payload Unwrapping Tests
// =============================================================================

#[test]
fn test_unwrap_set_requires_pair() {
    let pair = Payload::List(vec!["k".to_string(), "v".to_string()]);
    assert_eq!(
        unwrap_payload(Verb::Set, &pair).unwrap(),
        Operation::Set {
            key: "k".to_string(),
            value: "v".to_string()
        }
    );

    assert!(unwrap_payload(Verb::Set, &Payload::Text("kv".to_string())).is_err());
    assert!(unwrap_payload(Verb::Set, &Payload::List(vec![])).is_err());
}

#[test]
fn test_unwrap_single_argument_verbs() {
    let arg = Payload::Text("x".to_string());

    assert_eq!(
        unwrap_payload(Verb::Get, &arg).unwrap(),
        Operation::Get { key: "x".to_string() }
    );
    assert_eq!(
        unwrap_payload(Verb::Unset, &arg).unwrap(),
        Operation::Unset { key: "x".to_string() }
    );
    assert_eq!(
        unwrap_payload(Verb::Counts, &arg).unwrap(),
        Operation::Counts { value: "x".to_string() }
    );
    assert_eq!(
        unwrap_payload(Verb::Find, &arg).unwrap(),
        Operation::Find { value: "x".to_string() }
    );
}

#[test]
fn test_unwrap_zero_argument_verbs_ignore_payload() {
    let junk = Payload::List(vec!["a".to_string(), "b".to_string()]);

    assert_eq!(unwrap_payload(Verb::Begin, &junk).unwrap(), Operation::Begin);
    assert_eq!(unwrap_payload(Verb::Rollback, &Payload::Empty).unwrap(), Operation::Rollback);
    assert_eq!(unwrap_payload(Verb::Commit, &junk).unwrap(), Operation::Commit);
}

#[test]
fn test_unwrap_end_is_not_an_operation() {
    assert!(unwrap_payload(Verb::End, &Payload::Empty).is_err());
}
