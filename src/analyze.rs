//! Query → argument and result type signatures.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cardinality::{Cardinality, wrap};
use crate::codegen::render;
use crate::descriptor::Descriptor;
use crate::error::{DescriptorError, Error};
use crate::pool::Client;
use crate::protocol::{Negotiated, Negotiator};
use crate::walk::{Context, Imports, walk};

/// Type signatures inferred for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryType {
    pub args_type: String,
    pub result_type: String,
    pub cardinality: Cardinality,
    pub query: String,
    /// External type names both signatures need in scope.
    pub imports: BTreeSet<String>,
}

/// Negotiate `query` over `client` and derive its argument and result types.
///
/// Errors from either stage are returned as-is; nothing is retried.
pub async fn analyze_query<N: Negotiator>(client: &Client<N>, query: &str) -> Result<QueryType, Error> {
    let Negotiated { cardinality, input, output } = client.parse(query).await?;
    let query_type = describe(query, cardinality, &input, &output)?;
    tracing::debug!(
        cardinality = %query_type.cardinality,
        imports = query_type.imports.len(),
        "analyzed query"
    );
    Ok(query_type)
}

/// Derive the signatures for already negotiated descriptors.
///
/// Parameters are walked with optional keys and immutable containers; the
/// result is walked plainly and then lifted to the query's own cardinality.
pub fn describe(
    query: &str,
    cardinality: Cardinality,
    input: &Descriptor,
    output: &Descriptor,
) -> Result<QueryType, DescriptorError> {
    let imports = Imports::new();

    let args = walk(input, Context::args(&imports))?;
    let result = walk(output, Context::result(&imports))?;
    let result = wrap(result, cardinality)?;

    Ok(QueryType {
        args_type: render(&args),
        result_type: render(&result),
        cardinality,
        query: query.to_string(),
        imports: imports.into_set(),
    })
}

// ------------------------------- Tests ------------------------------------ //
