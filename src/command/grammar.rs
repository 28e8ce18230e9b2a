//! Line grammar
//!
//! Turns one raw input line into a structured command.

use crate::bus::Payload;

use super::Verb;

/// Diagnostic emitted for unknown verbs and malformed arguments
pub const UNKNOWN_COMMAND: &str = "Unknown command or invalid arguments";

/// Arguments following the verb
///
/// Packaging is verb-agnostic: exactly one token becomes `Single`, any other
/// count (including zero) stays a `List`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    Single(String),
    List(Vec<String>),
}

impl Args {
    fn package(mut tokens: Vec<String>) -> Self {
        if tokens.len() == 1 {
            Args::Single(tokens.remove(0))
        } else {
            Args::List(tokens)
        }
    }
}

impl From<Args> for Payload {
    fn from(args: Args) -> Self {
        match args {
            Args::Single(value) => Payload::Text(value),
            Args::List(values) => Payload::List(values),
        }
    }
}

/// Outcome of parsing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Blank line, nothing to do
    Empty,

    /// `END`, arguments ignored
    Shutdown,

    /// A verb bound for the storage engine
    Command { verb: Verb, args: Args },

    /// Unknown verb; carries the trimmed line
    Unrecognized { line: String },
}

/// Parse a single input line
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    let mut tokens = line.split_whitespace();

    let first = match tokens.next() {
        Some(token) => token.to_uppercase(),
        None => return ParsedLine::Empty,
    };

    match Verb::from_token(&first) {
        Some(Verb::End) => ParsedLine::Shutdown,
        Some(verb) => ParsedLine::Command {
            verb,
            args: Args::package(tokens.map(str::to_string).collect()),
        },
        None => ParsedLine::Unrecognized {
            line: line.to_string(),
        },
    }
}
