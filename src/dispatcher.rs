//! Dispatcher
//!
//! Binds the command grammar to a storage engine through the bus.
//!
//! ## Subscriptions
//! - `INPUT`: parse the line, then publish the verb event, `SHUTDOWN`, or
//!   the diagnostic `OUTPUT`
//! - one topic per dispatched verb: unwrap the payload into an
//!   `Operation`, execute it, publish any result as `OUTPUT`

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bus::{topics, Event, EventBus, Payload};
use crate::command::{parse_line, ParsedLine, Verb};
use crate::engine::{Operation, Output, StorageEngine};
use crate::error::{NestError, Result};

/// Engine shared between the verb handlers of one session
///
/// The mutex is the session's single exclusion boundary around the store
/// and its transaction stack.
pub type SharedEngine = Arc<Mutex<Box<dyn StorageEngine>>>;

/// Wires an engine onto a bus
pub struct Dispatcher;

impl Dispatcher {
    /// Subscribe the INPUT handler and every verb handler on `bus`
    pub fn attach(bus: &EventBus, engine: SharedEngine) {
        bus.subscribe(topics::INPUT, handle_input);

        for verb in Verb::DISPATCHED {
            let engine = Arc::clone(&engine);
            bus.subscribe(verb.as_str(), move |bus: &EventBus, event: &Event| {
                let operation = unwrap_payload(verb, &event.payload)?;
                tracing::trace!("Executing {:?}", operation);

                let output = engine.lock().execute(operation)?;
                match output {
                    Some(output) => bus.publish(Event::output(output)),
                    None => Ok(()),
                }
            });
        }
    }
}

/// Translate a raw line into the next event
fn handle_input(bus: &EventBus, event: &Event) -> Result<()> {
    let line = match &event.payload {
        Payload::Text(line) => line,
        other => {
            return Err(NestError::invalid_arguments(
                topics::INPUT,
                format!("expected a line, got {:?}", other),
            ))
        }
    };

    match parse_line(line) {
        ParsedLine::Empty => Ok(()),
        ParsedLine::Shutdown => bus.publish(Event::shutdown()),
        ParsedLine::Command { verb, args } => bus.publish(Event::new(verb.as_str(), args.into())),
        ParsedLine::Unrecognized { line } => {
            tracing::debug!("Unrecognized command: {}", line);
            bus.publish(Event::output(Output::UnknownCommand))
        }
    }
}

/// Unpack a verb's payload into a typed operation
///
/// SET needs a two-element list; GET/UNSET/COUNTS/FIND need a single
/// string; BEGIN/ROLLBACK/COMMIT ignore the payload.
pub fn unwrap_payload(verb: Verb, payload: &Payload) -> Result<Operation> {
    let operation = match verb {
        Verb::Set => match payload {
            Payload::List(args) if args.len() == 2 => Operation::Set {
                key: args[0].clone(),
                value: args[1].clone(),
            },
            other => return Err(shape_error(verb, "a key and a value", other)),
        },
        Verb::Get | Verb::Unset | Verb::Counts | Verb::Find => {
            let arg = match payload {
                Payload::Text(arg) => arg.clone(),
                other => return Err(shape_error(verb, "a single argument", other)),
            };
            match verb {
                Verb::Get => Operation::Get { key: arg },
                Verb::Unset => Operation::Unset { key: arg },
                Verb::Counts => Operation::Counts { value: arg },
                _ => Operation::Find { value: arg },
            }
        }
        Verb::Begin => Operation::Begin,
        Verb::Rollback => Operation::Rollback,
        Verb::Commit => Operation::Commit,
        Verb::End => {
            return Err(NestError::invalid_arguments(
                verb.as_str(),
                "END is not a storage operation",
            ))
        }
    };

    Ok(operation)
}

fn shape_error(verb: Verb, expected: &str, got: &Payload) -> NestError {
    let got = match got {
        Payload::Empty => "nothing".to_string(),
        Payload::Text(_) => "a single argument".to_string(),
        Payload::List(args) => format!("{} arguments", args.len()),
        Payload::Output(_) => "an output".to_string(),
    };
    NestError::invalid_arguments(verb.as_str(), format!("expected {}, got {}", expected, got))
}
