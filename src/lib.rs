//! Derive TypeScript type signatures for a query's parameters and result
//! rows from the descriptor tree a database server negotiates for it.
//!
//! Pipeline: [`pool::Client::parse`] → [`walk::walk`] (once for args, once for
//! the result) → [`cardinality::wrap`] → [`analyze::QueryType`].
pub mod analyze;
pub mod cardinality;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fixture;
pub mod ir;
pub mod path_de;
pub mod pool;
pub mod protocol;
pub mod walk;

pub use analyze::{QueryType, analyze_query, describe};
pub use cardinality::Cardinality;
pub use descriptor::Descriptor;
pub use error::{DescriptorError, Error, NegotiationError};
