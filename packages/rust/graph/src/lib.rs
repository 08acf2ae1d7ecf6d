//! Taxonomy graph: model, identifier templates, assembly, validation and
//! serialization.
//!
//! [`assemble`] turns extracted records into a SKOS/ELM graph;
//! [`prune_noise`] removes page furniture that survived extraction;
//! [`write_turtle`] and [`write_json`] serialize the result.

pub mod assembler;
pub mod ids;
pub mod model;
pub mod turtle;
pub mod validate;

pub use assembler::{Assembly, AssemblyStats, assemble};
pub use ids::IdentifierScheme;
pub use model::{Edge, Iri, Label, Node, NodeKind, Relation, TaxonomyGraph};
pub use turtle::{Prefixes, write_json, write_turtle};
pub use validate::{ValidationReport, prune_noise};
