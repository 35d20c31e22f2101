//! Result cardinality and the wrapper that lifts a signature to it.
use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;
use crate::ir::Sig;

/// How many values a position may hold at runtime.
///
/// The discriminants are the single-byte tags the server uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Cardinality {
    NoResult = 0x6e,
    AtMostOne = 0x6f,
    One = 0x41,
    Many = 0x6d,
    AtLeastOne = 0x4d,
}

impl Cardinality {
    /// `MANY` or `AT_LEAST_ONE`.
    pub fn is_multi(self) -> bool {
        matches!(self, Cardinality::Many | Cardinality::AtLeastOne)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::NoResult => "NO_RESULT",
            Cardinality::AtMostOne => "AT_MOST_ONE",
            Cardinality::One => "ONE",
            Cardinality::Many => "MANY",
            Cardinality::AtLeastOne => "AT_LEAST_ONE",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for Cardinality {
    type Error = DescriptorError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x6e => Ok(Cardinality::NoResult),
            0x6f => Ok(Cardinality::AtMostOne),
            0x41 => Ok(Cardinality::One),
            0x6d => Ok(Cardinality::Many),
            0x4d => Ok(Cardinality::AtLeastOne),
            other => Err(DescriptorError::UnknownCardinalityTag(other)),
        }
    }
}

// ------------------------------- Wrapper ---------------------------------- //

/// Lift `sig` to the shape implied by `cardinality`.
///
/// - `ONE`          → `T`
/// - `MANY`         → `T[]`
/// - `AT_MOST_ONE`  → `T | null`
/// - `AT_LEAST_ONE` → `[(T), ...(T)[]]`
pub fn wrap(sig: Sig, cardinality: Cardinality) -> Result<Sig, DescriptorError> {
    match cardinality {
        Cardinality::One => Ok(sig),
        Cardinality::Many => Ok(Sig::Array { item: Box::new(sig), readonly: false }),
        Cardinality::AtMostOne => Ok(Sig::Nullable(Box::new(sig))),
        Cardinality::AtLeastOne => Ok(Sig::NonEmpty(Box::new(sig))),
        Cardinality::NoResult => Err(DescriptorError::UnexpectedCardinality(cardinality)),
    }
}

/// String-level form of [`wrap`]: treats `sig` as an opaque, already rendered type.
pub fn wrap_str(sig: &str, cardinality: Cardinality) -> Result<String, DescriptorError> {
    let wrapped = wrap(Sig::Named(sig.to_string()), cardinality)?;
    Ok(crate::codegen::render(&wrapped))
}

// ------------------------------- Tests ------------------------------------ //
