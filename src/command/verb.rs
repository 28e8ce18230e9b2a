//! Verb definitions
//!
//! The fixed set of command words a line may start with.

use std::fmt;

/// Recognized command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Set,
    Get,
    Unset,
    Counts,
    Find,
    Begin,
    Rollback,
    Commit,
    /// Terminates the session, never routed to storage
    End,
}

impl Verb {
    /// Verbs routed to the storage engine
    pub const DISPATCHED: [Verb; 8] = [
        Verb::Set,
        Verb::Get,
        Verb::Unset,
        Verb::Counts,
        Verb::Find,
        Verb::Begin,
        Verb::Rollback,
        Verb::Commit,
    ];

    /// Look up an already-uppercased token
    pub fn from_token(token: &str) -> Option<Verb> {
        match token {
            "SET" => Some(Verb::Set),
            "GET" => Some(Verb::Get),
            "UNSET" => Some(Verb::Unset),
            "COUNTS" => Some(Verb::Counts),
            "FIND" => Some(Verb::Find),
            "BEGIN" => Some(Verb::Begin),
            "ROLLBACK" => Some(Verb::Rollback),
            "COMMIT" => Some(Verb::Commit),
            "END" => Some(Verb::End),
            _ => None,
        }
    }

    /// Canonical token, also used as the verb's bus topic
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Set => "SET",
            Verb::Get => "GET",
            Verb::Unset => "UNSET",
            Verb::Counts => "COUNTS",
            Verb::Find => "FIND",
            Verb::Begin => "BEGIN",
            Verb::Rollback => "ROLLBACK",
            Verb::Commit => "COMMIT",
            Verb::End => "END",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
