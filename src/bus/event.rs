//! Event definitions
//!
//! An event is a topic name plus a payload. Commands, outputs and the
//! shutdown signal all travel as events.

use crate::engine::Output;

/// Well-known topic names
pub mod topics {
    /// Raw input line, payload is `Payload::Text`
    pub const INPUT: &str = "INPUT";

    /// Result line for the presentation layer, payload is `Payload::Output`
    pub const OUTPUT: &str = "OUTPUT";

    /// Session termination, payload is `Payload::Empty`
    pub const SHUTDOWN: &str = "SHUTDOWN";
}

/// Data carried by an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No data
    Empty,

    /// A single string (one argument, or a raw line)
    Text(String),

    /// Zero or several arguments
    List(Vec<String>),

    /// A rendered-on-demand result
    Output(Output),
}

/// A single published event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Topic the event is routed by
    pub topic: String,

    pub payload: Payload,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// An INPUT event carrying a raw line
    pub fn input(line: impl Into<String>) -> Self {
        Self::new(topics::INPUT, Payload::Text(line.into()))
    }

    /// An OUTPUT event carrying a result
    pub fn output(output: Output) -> Self {
        Self::new(topics::OUTPUT, Payload::Output(output))
    }

    pub fn shutdown() -> Self {
        Self::new(topics::SHUTDOWN, Payload::Empty)
    }
}
