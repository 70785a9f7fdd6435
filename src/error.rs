use thiserror::Error;

/// Errors surfaced while compiling rules into a graph or while driving the
/// simulator. I/O failures are not represented here: the binary wraps
/// `std::io::Error` directly with `anyhow`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("rule {head:?} is malformed: {reason}")]
    MalformedRule { head: String, reason: String },

    #[error("rule references unknown head {reference:?}")]
    UnknownHead { reference: String },

    #[error("revert_step called without a preceding step")]
    NothingToRevert,
}
