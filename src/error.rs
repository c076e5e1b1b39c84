//! Error types for NRRD reading and writing.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing an NRRD file.
///
/// Every failure aborts the current call; no partial results are returned.
/// The only non-fatal signal is the duplicate-field warning, which is
/// emitted through the `log` facade when duplicates are allowed.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid magic line, unsupported version, or a header line
    /// that does not match the field grammar.
    #[error("{0}")]
    MalformedHeader(String),

    /// A field-type name that the registry does not know.
    #[error("Invalid field type given: {0}")]
    UnknownField(String),

    /// A field appeared more than once in the header.
    #[error("Duplicate header field: {0}")]
    DuplicateField(String),

    /// A field value does not parse as its declared shape.
    #[error("{0}")]
    TypeMismatch(String),

    /// Header-level invariant broken: dimension/sizes mismatch, negative
    /// sizes, missing required field, invalid skip values, unsupported
    /// data-file form.
    #[error("{0}")]
    InvariantViolation(String),

    /// Payload could not be decoded or encoded: decompression failure,
    /// element count mismatch, short read, invalid endian value.
    #[error("{0}")]
    Encoding(String),

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A scalar type this implementation does not carry (e.g. `block`).
    #[error("{0}")]
    UnsupportedType(String),
}
