use std::collections::HashMap;

use oxrdf::{Literal, NamedNode, Term, Triple};
use oxttl::TurtleSerializer;

use super::CodecError;
use crate::ontology::{
    entities::Resource,
    graph::{Graph, GraphError},
    value_objects::{LangString, OntologyId, ResourceId, ResourceKind, RootList},
    vocab,
};

/// Serializes the terminology and the assertions of `ontology` as Turtle.
///
/// Statements are grouped by subject in tree order, so the output of an
/// unchanged document is stable.
pub fn to_turtle(graph: &Graph, ontology: OntologyId) -> Result<String, CodecError> {
    let onto = graph
        .ontology(ontology)
        .ok_or(GraphError::MissingOntology(ontology))?;

    let mut out = Statements::default();
    out.prefix(&onto.prefix, &onto.namespace());
    out.prefix("rdf", vocab::RDF);
    out.prefix("rdfs", vocab::RDFS);
    if !onto.inverse_pairs().is_empty() {
        out.prefix("owl", vocab::OWL);
    }

    let classes: Vec<ResourceId> = graph.forest(ontology, RootList::Classes).collect();
    let properties: Vec<ResourceId> = graph.forest(ontology, RootList::Properties).collect();

    for id in &classes {
        let Some(resource) = graph.resource(*id) else {
            continue;
        };
        let subject = out.reference(graph, *id)?;
        let class_type = match resource.kind() {
            ResourceKind::Datatype => vocab::RDFS_DATATYPE,
            _ => vocab::RDFS_CLASS,
        };
        out.iri(&subject, vocab::RDF_TYPE, class_type)?;
        out.texts(&subject, resource)?;
        if let Some(parent) = resource.parent() {
            let parent = out.reference(graph, parent)?;
            out.iri(&subject, vocab::RDFS_SUB_CLASS_OF, &parent)?;
        }
    }

    for id in &properties {
        let Some(resource) = graph.resource(*id) else {
            continue;
        };
        let subject = out.reference(graph, *id)?;
        out.iri(&subject, vocab::RDF_TYPE, vocab::RDF_PROPERTY)?;
        out.texts(&subject, resource)?;
        if let Some(parent) = resource.parent() {
            let parent = out.reference(graph, parent)?;
            out.iri(&subject, vocab::RDFS_SUB_PROPERTY_OF, &parent)?;
        }
        if let Some(domain) = resource.domain() {
            let domain = out.reference(graph, domain)?;
            out.iri(&subject, vocab::RDFS_DOMAIN, &domain)?;
        }
        if let Some(range) = resource.range() {
            let range = out.reference(graph, range)?;
            out.iri(&subject, vocab::RDFS_RANGE, &range)?;
        }
    }

    for pair in onto.inverse_pairs() {
        let source = out.reference(graph, pair.source)?;
        let target = out.reference(graph, pair.target)?;
        out.iri(&source, vocab::OWL_INVERSE_OF, &target)?;
    }

    // assertions
    let mut has_instances = false;
    for class in &classes {
        let Some(class_node) = graph.resource(*class) else {
            continue;
        };
        let class_iri = out.reference(graph, *class)?;
        for instance in class_node.instances() {
            let Some(resource) = graph.resource(*instance) else {
                continue;
            };
            has_instances = true;
            let subject = out.reference(graph, *instance)?;
            out.iri(&subject, vocab::RDF_TYPE, &class_iri)?;
            out.texts(&subject, resource)?;
        }
    }

    for property in &properties {
        let Some(links) = graph.resource(*property).and_then(Resource::links) else {
            continue;
        };
        if links.is_empty() {
            continue;
        }
        let predicate = out.reference(graph, *property)?;
        for link in links {
            has_instances = true;
            let subject = out.reference(graph, link.subject)?;
            match graph
                .resource(link.object)
                .and_then(Resource::literal_value)
            {
                Some(value) => out.push(&subject, &predicate, Literal::new_simple_literal(value))?,
                None => {
                    let object = out.reference(graph, link.object)?;
                    out.iri(&subject, &predicate, &object)?;
                }
            }
        }
    }
    if has_instances {
        out.prefix(&onto.instance_prefix, &onto.instance_namespace);
    }

    out.write()
}

/// Triples grouped by subject, plus the prefixes they need.
#[derive(Default)]
struct Statements {
    prefixes: Vec<(String, String)>,
    groups: Vec<Vec<Triple>>,
    by_subject: HashMap<String, usize>,
}

impl Statements {
    /// Binds `prefix` unless the name is taken or not writable.
    fn prefix(&mut self, prefix: &str, namespace: &str) {
        if !is_prefix_name(prefix) || NamedNode::new(namespace).is_err() {
            tracing::debug!(prefix, namespace, "prefix not declared in turtle output");
            return;
        }
        if self.prefixes.iter().any(|(bound, _)| bound == prefix) {
            return;
        }
        self.prefixes.push((prefix.to_string(), namespace.to_string()));
    }

    /// The URI of `id`, declaring the prefix of its owner on the way.
    fn reference(&mut self, graph: &Graph, id: ResourceId) -> Result<String, CodecError> {
        let resource = graph
            .resource(id)
            .ok_or(GraphError::MissingResource(id))?;
        if let Some(owner) = graph.ontology(resource.owner()) {
            match resource.kind() {
                ResourceKind::Instance => {
                    self.prefix(&owner.instance_prefix, &owner.instance_namespace);
                }
                _ => self.prefix(&owner.prefix, &owner.namespace()),
            }
        }
        graph
            .uri_of(id)
            .ok_or(GraphError::MissingResource(id).into())
    }

    fn texts(&mut self, subject: &str, resource: &Resource) -> Result<(), CodecError> {
        self.text(subject, vocab::RDFS_LABEL, &resource.label)?;
        self.text(subject, vocab::RDFS_COMMENT, &resource.comment)
    }

    fn text(&mut self, subject: &str, predicate: &str, text: &LangString) -> Result<(), CodecError> {
        for (lang, value) in text.iter() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let literal = if lang.is_empty() {
                Literal::new_simple_literal(value)
            } else {
                Literal::new_language_tagged_literal(value, lang).map_err(|err| {
                    CodecError::InvalidTerm {
                        term: format!("\"{value}\"@{lang}"),
                        message: err.to_string(),
                    }
                })?
            };
            self.push(subject, predicate, literal)?;
        }
        Ok(())
    }

    fn iri(&mut self, subject: &str, predicate: &str, object: &str) -> Result<(), CodecError> {
        self.push(subject, predicate, named(object)?)
    }

    fn push(
        &mut self,
        subject: &str,
        predicate: &str,
        object: impl Into<Term>,
    ) -> Result<(), CodecError> {
        let triple = Triple::new(named(subject)?, named(predicate)?, object);
        let next = self.groups.len();
        let group = *self.by_subject.entry(subject.to_string()).or_insert(next);
        if group == next {
            self.groups.push(Vec::new());
        }
        self.groups[group].push(triple);
        Ok(())
    }

    fn write(self) -> Result<String, CodecError> {
        let mut serializer = TurtleSerializer::new();
        for (prefix, namespace) in &self.prefixes {
            serializer = serializer
                .with_prefix(prefix, namespace)
                .map_err(|err| CodecError::InvalidTerm {
                    term: namespace.clone(),
                    message: err.to_string(),
                })?;
        }
        let mut writer = serializer.for_writer(Vec::new());
        for triple in self.groups.iter().flatten() {
            writer.serialize_triple(triple)?;
        }
        let bytes = writer.finish()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn named(iri: &str) -> Result<NamedNode, CodecError> {
    NamedNode::new(iri).map_err(|err| CodecError::InvalidTerm {
        term: iri.to_string(),
        message: err.to_string(),
    })
}

/// `PN_PREFIX` of the Turtle grammar, restricted to ASCII.
fn is_prefix_name(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && !prefix.ends_with('.')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{is_prefix_name, to_turtle};
    use crate::ontology::{
        graph::Graph,
        value_objects::{LangString, ResourceKind},
    };

    #[rstest]
    #[case("ex", true)]
    #[case("foaf2", true)]
    #[case("my-voc", true)]
    #[case("", false)]
    #[case("1abc", false)]
    #[case("a.", false)]
    fn prefix_names(#[case] prefix: &str, #[case] expected: bool) {
        assert_eq!(is_prefix_name(prefix), expected);
    }

    #[test]
    fn writes_classes_with_trimmed_labels() {
        let mut graph = Graph::new();
        let user = graph.user_ontology();
        {
            let onto = graph.ontology_mut(user).expect("user ontology");
            onto.prefix = "ex".into();
            onto.set_namespace("http://example.com/ex/");
        }
        let person = graph
            .create_resource(user, ResourceKind::Class, "Person")
            .expect("class");
        graph.add_root(user, person).expect("root");
        graph.resource_mut(person).expect("person").label =
            [("en", " Person "), ("de", "   ")].into_iter().collect::<LangString>();

        let turtle = to_turtle(&graph, user).expect("turtle");
        assert!(turtle.contains("@prefix ex: <http://example.com/ex/> ."));
        assert!(turtle.contains("ex:Person a rdfs:Class"));
        assert!(turtle.contains("\"Person\"@en"));
        assert!(!turtle.contains("@de"));
        assert!(!turtle.contains("owl:"));
    }
}
