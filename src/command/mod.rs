//! Command Grammar
//!
//! Pure mapping from a raw text line to a typed command.
//!
//! ## Line Format
//! ```text
//! <VERB> [arg ...]
//! ```
//! - Leading/trailing whitespace is ignored, tokens split on whitespace
//! - The verb is case-insensitive
//! - One argument is packaged as a bare string, any other count as a list
//!
//! ### Verbs
//! - SET k v, GET k, UNSET k, COUNTS v, FIND v
//! - BEGIN, ROLLBACK, COMMIT
//! - END (terminates the session)

mod verb;
mod grammar;

pub use verb::Verb;
pub use grammar::{parse_line, Args, ParsedLine, UNKNOWN_COMMAND};
