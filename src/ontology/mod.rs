//! The ontology graph model.
//!
//! A [`Graph`] is the arena of one document: the user ontology, the imported
//! ontologies, and every class, property, datatype, instance and literal they
//! own. Structural edits keep `parent`/`children` and instance ownership in
//! agreement; everything else (views, drag and drop, collaboration) is built
//! on top of these primitives.

pub mod codec;
pub mod entities;
pub mod graph;
pub mod presets;
pub mod value_objects;
pub mod vocab;

pub use codec::{load_graph, to_turtle, CodecError, LoadOptions, RdfFormat};
pub use entities::{Facet, InversePair, Link, Ontology, Resource};
pub use graph::{Descendants, Graph, GraphError};
pub use value_objects::{
    split_namespace, Iri, IriError, LangString, NodeRef, OntologyId, ResourceId, ResourceKind,
    RootList,
};
