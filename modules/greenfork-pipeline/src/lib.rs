//! Ingestion path: external recipe URL → normalized, deduplicated, owned
//! recipe record.
//!
//! Flow: fetch → extract text → transform (plant-based rewrite) → duplicate
//! check → persist. One flow per request; concurrent requests for different
//! URLs need no coordination.

mod error;
mod extract;
mod fetch;
mod identity;
mod ingest;
mod persist;
mod transform;

pub use error::{PipelineError, TransformError};
pub use extract::extract_recipe_text;
pub use fetch::{HttpFetcher, PageSource};
pub use identity::{DuplicateCheck, IdentityResolver, DUPLICATE_SIMILARITY_THRESHOLD};
pub use ingest::{IngestResponse, IngestService};
pub use persist::{IdGenerator, Persister, UuidGenerator};
pub use transform::Transformer;
