use thiserror::Error;

// -----------------------------------------------------------------------------
// CorruptedData

/// The bytes handed to a decoder do not describe a value.
///
/// This is the recoverable failure class: damaged or truncated buffers.
/// Disagreement between encoder and decoder about the schema (unknown
/// pointer tags, dangling back-references, unregistered classes) is a
/// programming error and panics instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CorruptedData {
    #[error("buffer of {len} bytes is shorter than the integrity header")]
    HeaderTooShort { len: usize },

    #[error("header declares {declared} payload bytes but {actual} are present")]
    LengthMismatch { declared: u64, actual: usize },

    #[error("checksum mismatch: stored {stored:#018x}, computed {computed:#018x}")]
    ChecksumMismatch { stored: u64, computed: u64 },

    #[error("payload ended early: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    #[error("invalid {what} in payload")]
    InvalidValue { what: &'static str },

    #[error("duplicate key in an associative container")]
    DuplicateKey,

    #[error("{remaining} bytes left unread after the payload")]
    TrailingBytes { remaining: usize },
}

/// Result alias used throughout the crate.
pub type Result<T, E = CorruptedData> = core::result::Result<T, E>;

// -----------------------------------------------------------------------------
// LatticeError

/// A polymorphic class list that cannot produce a class-id table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LatticeError {
    #[error("hierarchy declares no classes")]
    Empty,

    #[error("class `{0}` is declared more than once")]
    DuplicateClass(&'static str),

    #[error("class `{class}` names unknown parent `{parent}`")]
    UnknownParent {
        class: &'static str,
        parent: &'static str,
    },

    #[error("class `{0}` is its own ancestor")]
    Cycle(&'static str),

    #[error("class `{class}` does not derive from the base class `{base}`")]
    Unreachable {
        class: &'static str,
        base: &'static str,
    },
}
