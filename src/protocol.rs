//! Contract with the component that parses a query against a live connection
//! and reports back its descriptors.
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cardinality::Cardinality;
use crate::descriptor::Descriptor;
use crate::error::NegotiationError;

/// Encoding the server is asked to use for result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Binary,
    Json,
    JsonElements,
    None,
}

/// Session state sent along with a parse request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub module: String,
    pub aliases: IndexMap<String, String>,
    pub globals: IndexMap<String, serde_json::Value>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            module: "default".to_string(),
            aliases: IndexMap::new(),
            globals: IndexMap::new(),
        }
    }
}

/// What the server reports for a parsed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiated {
    pub cardinality: Cardinality,
    pub input: Descriptor,
    pub output: Descriptor,
}

/// Obtains descriptors for a query over one borrowed connection.
///
/// Implementations perform exactly one request/response exchange per call and
/// do not retry.
#[async_trait]
pub trait Negotiator: Send + Sync {
    type Connection: Send;

    async fn negotiate(
        &self,
        conn: &mut Self::Connection,
        query: &str,
        output_format: OutputFormat,
        expected_cardinality: Cardinality,
        session: &Session,
    ) -> Result<Negotiated, NegotiationError>;
}
