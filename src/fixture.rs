//! A negotiator that replays descriptors recorded in a JSON document instead
//! of talking to a server.
//!
//! ```json
//! {
//!   "queries": {
//!     "select 1": { "cardinality": "ONE", "input": { "kind": "null" },
//!                   "output": { "kind": "scalar", "name": "number" } },
//!     "select nope": { "error": "object type or alias 'default::nope' does not exist" }
//!   }
//! }
//! ```
//!
//! Query text is matched after trimming surrounding whitespace.
use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::cardinality::Cardinality;
use crate::descriptor::Descriptor;
use crate::error::NegotiationError;
use crate::protocol::{Negotiated, Negotiator, OutputFormat, Session};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureDoc {
    queries: IndexMap<String, FixtureEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FixtureEntry {
    cardinality: Option<Cardinality>,
    input: Option<Descriptor>,
    output: Option<Descriptor>,
    /// server rejected the query with this message
    error: Option<String>,
    /// server could not describe a type used by the query
    unsupported_type: Option<String>,
}

#[derive(Debug, Clone)]
enum Recorded {
    Parsed(Negotiated),
    Rejected(String),
    Unsupported(String),
}

/// Connection handed out by a [`crate::pool::Pool`] in front of a
/// [`FixtureNegotiator`]. Counts the exchanges made over it.
#[derive(Debug, Default)]
pub struct FixtureConnection {
    pub id: usize,
    pub exchanges: u64,
}

impl FixtureConnection {
    /// `n` fresh connections with ids `0..n`.
    pub fn open(n: usize) -> Vec<Self> {
        (0..n).map(|id| Self { id, exchanges: 0 }).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureNegotiator {
    queries: IndexMap<String, Recorded>,
}

impl FixtureNegotiator {
    pub fn from_json(src: &str) -> Result<Self, NegotiationError> {
        let doc = crate::path_de::from_str_with_path::<FixtureDoc>(src).map_err(NegotiationError::Fixture)?;
        Self::from_doc(doc)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, NegotiationError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let doc = crate::path_de::from_slice_with_path::<FixtureDoc>(&bytes).map_err(|error| {
            NegotiationError::Fixture(format!("{}: {error}", path.as_ref().display()))
        })?;
        Self::from_doc(doc)
    }

    fn from_doc(doc: FixtureDoc) -> Result<Self, NegotiationError> {
        let mut queries = IndexMap::with_capacity(doc.queries.len());
        for (query, entry) in doc.queries {
            let recorded = match entry {
                FixtureEntry { error: Some(reason), .. } => Recorded::Rejected(reason),
                FixtureEntry { unsupported_type: Some(ty), .. } => Recorded::Unsupported(ty),
                FixtureEntry { cardinality: Some(cardinality), input: Some(input), output: Some(output), .. } => {
                    Recorded::Parsed(Negotiated { cardinality, input, output })
                }
                _ => {
                    return Err(NegotiationError::Fixture(format!(
                        "entry for {query:?} needs `cardinality`, `input` and `output`, or `error`"
                    )));
                }
            };
            queries.insert(query.trim().to_string(), recorded);
        }
        Ok(Self { queries })
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Recorded query texts, in document order.
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }
}

#[async_trait]
impl Negotiator for FixtureNegotiator {
    type Connection = FixtureConnection;

    async fn negotiate(
        &self,
        conn: &mut FixtureConnection,
        query: &str,
        output_format: OutputFormat,
        expected_cardinality: Cardinality,
        session: &Session,
    ) -> Result<Negotiated, NegotiationError> {
        conn.exchanges += 1;
        tracing::trace!(
            conn = conn.id,
            ?output_format,
            %expected_cardinality,
            module = %session.module,
            "replaying parse"
        );
        match self.queries.get(query.trim()) {
            Some(Recorded::Parsed(negotiated)) => Ok(negotiated.clone()),
            Some(Recorded::Rejected(reason)) => Err(NegotiationError::QueryRejected {
                query: query.to_string(),
                reason: reason.clone(),
            }),
            Some(Recorded::Unsupported(ty)) => Err(NegotiationError::UnsupportedType(ty.clone())),
            None => Err(NegotiationError::QueryRejected {
                query: query.to_string(),
                reason: "no recorded descriptors for this query".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "queries": {
            "select 1": {
                "cardinality": "ONE",
                "input": { "kind": "null" },
                "output": { "kind": "scalar", "name": "number" }
            },
            "select nope": { "error": "nope does not exist" },
            "select <cfg::memory>1": { "unsupported_type": "cfg::memory" }
        }
    }"#;

    async fn run(neg: &FixtureNegotiator, conn: &mut FixtureConnection, q: &str) -> Result<Negotiated, NegotiationError> {
        neg.negotiate(conn, q, OutputFormat::Binary, Cardinality::Many, &Session::default()).await
    }

    #[tokio::test]
    async fn replays_and_counts_exchanges() {
        let neg = FixtureNegotiator::from_json(DOC).unwrap();
        assert_eq!(neg.len(), 3);
        assert_eq!(neg.queries().next(), Some("select 1"));

        let mut conn = FixtureConnection::default();
        let n = run(&neg, &mut conn, "  select 1\n").await.unwrap();
        assert_eq!(n.cardinality, Cardinality::One);
        assert_eq!(n.output, Descriptor::scalar("number"));

        let err = run(&neg, &mut conn, "select nope").await.unwrap_err();
        assert!(matches!(err, NegotiationError::QueryRejected { ref reason, .. } if reason == "nope does not exist"));

        let err = run(&neg, &mut conn, "select <cfg::memory>1").await.unwrap_err();
        assert!(matches!(err, NegotiationError::UnsupportedType(ref t) if t == "cfg::memory"));

        assert!(run(&neg, &mut conn, "select 2").await.is_err());
        assert_eq!(conn.exchanges, 4);
    }

    #[test]
    fn incomplete_entry_is_rejected() {
        let err = FixtureNegotiator::from_json(r#"{ "queries": { "q": { "cardinality": "ONE" } } }"#).unwrap_err();
        assert!(matches!(err, NegotiationError::Fixture(ref m) if m.contains("\"q\"")));
    }

    #[test]
    fn malformed_document_reports_path() {
        let err = FixtureNegotiator::from_json(r#"{ "queries": { "q": { "cardinality": "SOME" } } }"#).unwrap_err();
        let NegotiationError::Fixture(msg) = err else { panic!("expected fixture error") };
        assert!(msg.contains("queries.q.cardinality"), "{msg}");
    }
}
