use std::collections::HashMap;

use super::{
    parse::{parse_any, Document, Node, Statement},
    CodecError, RdfFormat,
};
use crate::ontology::{
    graph::Graph,
    value_objects::{split_namespace, LangString, OntologyId, ResourceId, ResourceKind},
    vocab,
};

/// How a document is read into the arena.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Prefix of the ontology being loaded, usually guessed from a file name.
    pub prefix: String,
    pub format: Option<RdfFormat>,
    /// Whether instances and their assertions are read as well.
    pub abox: bool,
}

impl LoadOptions {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            format: None,
            abox: true,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: Option<RdfFormat>) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn terminology_only(mut self) -> Self {
        self.abox = false;
        self
    }
}

const DECLARATIONS: [(&str, ResourceKind); 6] = [
    (vocab::RDFS_CLASS, ResourceKind::Class),
    (vocab::OWL_CLASS, ResourceKind::Class),
    (vocab::RDFS_DATATYPE, ResourceKind::Datatype),
    (vocab::RDF_PROPERTY, ResourceKind::Property),
    (vocab::OWL_OBJECT_PROPERTY, ResourceKind::Property),
    (vocab::OWL_DATATYPE_PROPERTY, ResourceKind::Property),
];

/// Parses `bytes` and materialises them as a new, not yet loaded, ontology of
/// `graph`. The caller decides whether it becomes the user ontology or an
/// import. Nothing is added to the arena when parsing fails.
pub fn load_graph(
    graph: &mut Graph,
    bytes: &[u8],
    options: &LoadOptions,
) -> Result<OntologyId, CodecError> {
    let (format, document) =
        parse_any(bytes, options.format).map_err(|attempts| CodecError::Unparsable { attempts })?;
    tracing::debug!(
        %format,
        prefix = options.prefix,
        statements = document.statements.len(),
        "rdf document parsed"
    );

    let mut loader = Loader::new(graph, &document, &options.prefix);
    loader.terminology()?;
    if options.abox {
        loader.assertions()?;
    }
    Ok(loader.ontology)
}

struct Loader<'a> {
    graph: &'a mut Graph,
    document: &'a Document,
    by_subject: HashMap<&'a str, Vec<&'a Statement>>,
    ontology: OntologyId,
    owners: HashMap<String, OntologyId>,
    namespace_known: bool,
    declared: HashMap<String, ResourceId>,
    builtins: HashMap<String, ResourceId>,
}

impl<'a> Loader<'a> {
    fn new(graph: &'a mut Graph, document: &'a Document, prefix: &str) -> Self {
        let mut by_subject: HashMap<&str, Vec<&Statement>> = HashMap::new();
        for statement in &document.statements {
            if let Node::Iri(subject) = &statement.subject {
                by_subject.entry(subject.as_str()).or_default().push(statement);
            }
        }

        let ontology = graph.create_ontology();
        let mut namespace_known = false;
        if let Some(onto) = graph.ontology_mut(ontology) {
            onto.prefix = prefix.to_string();
            if let Some(namespace) = document.namespace_of(prefix) {
                onto.set_namespace(namespace);
                namespace_known = true;
            }
        }

        Self {
            graph,
            document,
            by_subject,
            ontology,
            owners: HashMap::new(),
            namespace_known,
            declared: HashMap::new(),
            builtins: HashMap::new(),
        }
    }

    fn statements_of(&self, subject: &str) -> impl Iterator<Item = &'a Statement> + '_ {
        self.by_subject.get(subject).into_iter().flatten().copied()
    }

    fn with_predicate(&self, predicate: &'a str) -> impl Iterator<Item = &'a Statement> + 'a {
        self.document
            .statements
            .iter()
            .filter(move |statement| statement.predicate == predicate)
    }

    /// Every foreign prefix becomes an owner ontology for imported copies.
    fn owner_ontologies(&mut self, own_prefix: &str) -> Result<(), CodecError> {
        let document = self.document;
        for (prefix, namespace) in &document.prefixes {
            if prefix == own_prefix {
                self.owners.insert(prefix.clone(), self.ontology);
                continue;
            }
            let owner = self.graph.create_ontology();
            if let Some(onto) = self.graph.ontology_mut(owner) {
                onto.prefix = prefix.clone();
                onto.set_namespace(namespace);
            }
            self.owners.insert(prefix.clone(), owner);

            if namespace == vocab::XSD {
                for name in vocab::XSD_BUILTINS {
                    self.builtin(owner, namespace, name)?;
                }
            }
            if namespace == vocab::RDFS {
                self.builtin(owner, namespace, "Literal")?;
            }
        }
        Ok(())
    }

    fn builtin(&mut self, owner: OntologyId, namespace: &str, name: &str) -> Result<(), CodecError> {
        let id = self
            .graph
            .create_resource(owner, ResourceKind::Class, name)?;
        if let Some(resource) = self.graph.resource_mut(id) {
            resource.imported = true;
        }
        self.builtins.insert(format!("{namespace}{name}"), id);
        Ok(())
    }

    /// Resolves an object IRI against declared resources first, then built-ins.
    fn lookup(&self, iri: &str) -> Option<ResourceId> {
        self.declared
            .get(iri)
            .or_else(|| self.builtins.get(iri))
            .copied()
    }

    fn text(&self, subject: &str, predicate: &str) -> LangString {
        self.statements_of(subject)
            .filter(|statement| statement.predicate == predicate)
            .filter_map(|statement| match &statement.object {
                Node::Literal { value, lang } => {
                    Some((lang.clone().unwrap_or_default(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Creates the resource for `iri`, owned by the ontology its namespace
    /// prefix maps to, or by the loaded ontology.
    fn declare(&mut self, iri: &str, kind: ResourceKind) -> Result<ResourceId, CodecError> {
        let (namespace, local_name) = split_namespace(iri);
        let owner = self
            .document
            .prefix_of(namespace)
            .and_then(|prefix| self.owners.get(prefix))
            .copied()
            .unwrap_or(self.ontology);

        if owner == self.ontology && !self.namespace_known {
            if let Some(onto) = self.graph.ontology_mut(self.ontology) {
                onto.set_namespace(namespace);
            }
            self.namespace_known = true;
        }

        let id = self.graph.create_resource(owner, kind, local_name)?;
        let label = self.text(iri, vocab::RDFS_LABEL);
        let comment = self.text(iri, vocab::RDFS_COMMENT);
        if let Some(resource) = self.graph.resource_mut(id) {
            resource.imported = owner != self.ontology;
            resource.label = label;
            resource.comment = comment;
        }
        Ok(id)
    }

    fn terminology(&mut self) -> Result<(), CodecError> {
        let prefix = self
            .graph
            .ontology(self.ontology)
            .map(|onto| onto.prefix.clone())
            .unwrap_or_default();
        self.owner_ontologies(&prefix)?;

        let mut roots = Vec::new();
        for (type_iri, kind) in DECLARATIONS {
            let subjects: Vec<&str> = self
                .with_predicate(vocab::RDF_TYPE)
                .filter(|statement| statement.object.as_iri() == Some(type_iri))
                .filter_map(|statement| statement.subject.as_iri())
                .collect();
            for subject in subjects {
                if self.declared.contains_key(subject) {
                    continue;
                }
                let id = self.declare(subject, kind)?;
                self.declared.insert(subject.to_string(), id);
                roots.push(id);
            }
        }

        for predicate in [vocab::RDFS_SUB_CLASS_OF, vocab::RDFS_SUB_PROPERTY_OF] {
            for (child, parent) in self.relations(predicate) {
                match self.graph.add_child(parent, child) {
                    Ok(()) => roots.retain(|id| *id != child),
                    Err(err) => tracing::debug!(error = %err, "skipping hierarchy edge"),
                }
            }
        }

        for (property, class) in self.relations(vocab::RDFS_DOMAIN) {
            if self.graph.set_domain(property, Some(class)).is_err() {
                tracing::debug!(%property, "rdfs:domain on a non-property ignored");
            }
        }
        for (property, class) in self.relations(vocab::RDFS_RANGE) {
            if self.graph.set_range(property, Some(class)).is_err() {
                tracing::debug!(%property, "rdfs:range on a non-property ignored");
            }
        }

        for id in roots {
            self.graph.add_root(self.ontology, id)?;
        }
        self.graph.sort_roots(self.ontology);

        for (source, target) in self.relations(vocab::OWL_INVERSE_OF) {
            self.graph.add_inverse_of(self.ontology, source, target)?;
        }
        Ok(())
    }

    /// `(subject, object)` resource pairs linked by `predicate`.
    fn relations(&self, predicate: &'a str) -> Vec<(ResourceId, ResourceId)> {
        self.with_predicate(predicate)
            .filter_map(|statement| {
                let subject = self.declared.get(statement.subject.as_iri()?)?;
                let object = self.lookup(statement.object.as_iri()?)?;
                Some((*subject, object))
            })
            .collect()
    }

    fn assertions(&mut self) -> Result<(), CodecError> {
        let typed: Vec<(&str, ResourceId)> = self
            .with_predicate(vocab::RDF_TYPE)
            .filter_map(|statement| {
                let subject = statement.subject.as_iri()?;
                let class = *self.declared.get(statement.object.as_iri()?)?;
                (self.graph.kind_of(class) == Some(ResourceKind::Class)).then_some((subject, class))
            })
            .collect();

        let mut instances: Vec<(&str, ResourceId)> = Vec::new();
        let mut by_iri: HashMap<&str, ResourceId> = HashMap::new();
        for (subject, class) in typed {
            if by_iri.contains_key(subject) {
                continue;
            }
            let (namespace, local_name) = split_namespace(subject);
            let instance_prefix = self.document.prefix_of(namespace).map(str::to_string);
            if let Some(onto) = self.graph.ontology_mut(self.ontology) {
                if let Some(prefix) = instance_prefix {
                    onto.instance_namespace = namespace.to_string();
                    onto.instance_prefix = prefix;
                } else if onto.instance_namespace.is_empty() {
                    onto.instance_namespace = namespace.to_string();
                }
            }

            let id = self
                .graph
                .create_resource(self.ontology, ResourceKind::Instance, local_name)?;
            let label = self.text(subject, vocab::RDFS_LABEL);
            let comment = self.text(subject, vocab::RDFS_COMMENT);
            if let Some(resource) = self.graph.resource_mut(id) {
                resource.label = label;
                resource.comment = comment;
            }
            self.graph.add_instance(class, id)?;
            by_iri.insert(subject, id);
            instances.push((subject, id));
        }

        for (subject, instance) in instances {
            let statements: Vec<&Statement> = self.statements_of(subject).collect();
            for statement in statements {
                let Some(property) = self.declared.get(&statement.predicate).copied() else {
                    continue;
                };
                if self.graph.kind_of(property) != Some(ResourceKind::Property) {
                    continue;
                }
                let object = match &statement.object {
                    Node::Literal { value, .. } => {
                        let literal =
                            self.graph
                                .create_resource(self.ontology, ResourceKind::Literal, "")?;
                        if let Some(resource) = self.graph.resource_mut(literal) {
                            resource.comment.set("", value.clone());
                        }
                        literal
                    }
                    Node::Iri(iri) => match by_iri.get(iri.as_str()) {
                        Some(object) => *object,
                        None => continue,
                    },
                    Node::Blank(_) => continue,
                };
                self.graph.add_link(property, instance, object)?;
            }
        }
        Ok(())
    }
}
