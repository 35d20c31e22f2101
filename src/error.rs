//! Error types for query-sig.

use thiserror::Error;

use crate::cardinality::Cardinality;

/// Top-level error for analyzing a query.
#[derive(Error, Debug)]
pub enum Error {
    /// Obtaining descriptors from the server failed.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// The descriptors broke an assumption the walker relies on.
    #[error("descriptor contract violated: {0}")]
    Descriptor(#[from] DescriptorError),

    /// A query name does not yield a valid TypeScript identifier.
    #[error("cannot derive a type name from {0:?}")]
    InvalidQueryName(String),
}

impl Error {
    pub fn is_negotiation(&self) -> bool {
        matches!(self, Error::Negotiation(_))
    }

    pub fn is_descriptor(&self) -> bool {
        matches!(self, Error::Descriptor(_))
    }
}

/// Inconsistencies between the negotiated descriptors and the walker.
///
/// These are never recovered from: no partial signature is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("field {field:?} has a set descriptor, but its cardinality is {cardinality}")]
    SetUnderSingleField { field: String, cardinality: Cardinality },

    #[error("expected range subtype to be scalar: {range} over {found}")]
    NonScalarRange { range: &'static str, found: &'static str },

    #[error("unexpected descriptor kind: {0}")]
    UnexpectedKind(&'static str),

    #[error("unexpected cardinality: {0}")]
    UnexpectedCardinality(Cardinality),

    #[error("unknown cardinality tag: {0:#04x}")]
    UnknownCardinalityTag(u8),
}

/// Errors raised while obtaining descriptors from a connection.
#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query rejected: {reason}")]
    QueryRejected { query: String, reason: String },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("invalid fixture: {0}")]
    Fixture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
