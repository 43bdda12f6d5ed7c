//! Core request and response types.

pub mod query;
pub mod request;

pub use query::{CypherQuery, StructuredQuery};
pub use request::{ProviderChoice, QueryRequest};
