use std::collections::BTreeSet;

use super::value_objects::{LangString, OntologyId, ResourceId, ResourceKind, RootList};

/// A property-value assertion `(subject, object)` held by a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    pub subject: ResourceId,
    pub object: ResourceId,
}

impl Link {
    #[must_use]
    pub fn new(subject: ResourceId, object: ResourceId) -> Self {
        Self { subject, object }
    }

    #[must_use]
    pub fn involves(&self, resource: ResourceId) -> bool {
        self.subject == resource || self.object == resource
    }
}

/// Kind specific state of a [`Resource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Facet {
    Class {
        instances: Vec<ResourceId>,
    },
    Property {
        domain: Option<ResourceId>,
        range: Option<ResourceId>,
        links: BTreeSet<Link>,
    },
    Datatype,
    Instance,
    Literal,
}

impl Facet {
    /// Creates the empty facet for `kind`.
    #[must_use]
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Class => Self::Class {
                instances: Vec::new(),
            },
            ResourceKind::Property => Self::Property {
                domain: None,
                range: None,
                links: BTreeSet::new(),
            },
            ResourceKind::Datatype => Self::Datatype,
            ResourceKind::Instance => Self::Instance,
            ResourceKind::Literal => Self::Literal,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Class { .. } => ResourceKind::Class,
            Self::Property { .. } => ResourceKind::Property,
            Self::Datatype => ResourceKind::Datatype,
            Self::Instance => ResourceKind::Instance,
            Self::Literal => ResourceKind::Literal,
        }
    }
}

/// A graph node owned by exactly one ontology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    owner: OntologyId,
    pub local_name: String,
    pub label: LangString,
    pub comment: LangString,
    pub imported: bool,
    pub(crate) parent: Option<ResourceId>,
    pub(crate) children: Vec<ResourceId>,
    pub(crate) facet: Facet,
}

impl Resource {
    pub(crate) fn new(
        id: ResourceId,
        owner: OntologyId,
        kind: ResourceKind,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            owner,
            local_name: local_name.into(),
            label: LangString::new(),
            comment: LangString::new(),
            imported: false,
            parent: None,
            children: Vec::new(),
            facet: Facet::empty(kind),
        }
    }

    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> OntologyId {
        self.owner
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.facet.kind()
    }

    #[must_use]
    pub fn facet(&self) -> &Facet {
        &self.facet
    }

    /// The owning parent: a super class/property, or the class of an instance.
    #[must_use]
    pub fn parent(&self) -> Option<ResourceId> {
        self.parent
    }

    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub fn children(&self) -> &[ResourceId] {
        &self.children
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        matches!(
            self.facet,
            Facet::Class { .. } | Facet::Property { .. } | Facet::Datatype
        )
    }

    #[must_use]
    pub fn has_domain_range(&self) -> bool {
        matches!(self.facet, Facet::Property { .. })
    }

    #[must_use]
    pub fn has_instances(&self) -> bool {
        matches!(self.facet, Facet::Class { .. })
    }

    #[must_use]
    pub fn has_links(&self) -> bool {
        matches!(self.facet, Facet::Property { .. })
    }

    #[must_use]
    pub fn domain(&self) -> Option<ResourceId> {
        match &self.facet {
            Facet::Property { domain, .. } => *domain,
            _ => None,
        }
    }

    #[must_use]
    pub fn range(&self) -> Option<ResourceId> {
        match &self.facet {
            Facet::Property { range, .. } => *range,
            _ => None,
        }
    }

    /// Instances of a class; empty for every other kind.
    #[must_use]
    pub fn instances(&self) -> &[ResourceId] {
        match &self.facet {
            Facet::Class { instances } => instances,
            _ => &[],
        }
    }

    /// Assertions of a property, if this is one.
    #[must_use]
    pub fn links(&self) -> Option<&BTreeSet<Link>> {
        match &self.facet {
            Facet::Property { links, .. } => Some(links),
            _ => None,
        }
    }

    /// Lexical value of a literal node.
    #[must_use]
    pub fn literal_value(&self) -> Option<&str> {
        match self.facet {
            Facet::Literal => self.comment.get(""),
            _ => None,
        }
    }
}

/// Ordered pair of properties declared as inverses of each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InversePair {
    pub source: ResourceId,
    pub target: ResourceId,
}

impl InversePair {
    #[must_use]
    pub fn involves(&self, resource: ResourceId) -> bool {
        self.source == resource || self.target == resource
    }
}

/// A named graph container with its own root lists and header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ontology {
    id: OntologyId,
    pub uri: String,
    pub prefix: String,
    pub name: String,
    pub fragment: String,
    pub instance_namespace: String,
    pub instance_prefix: String,
    pub(crate) root_classes: Vec<ResourceId>,
    pub(crate) root_properties: Vec<ResourceId>,
    pub(crate) inverse_of: BTreeSet<InversePair>,
}

impl Ontology {
    pub(crate) fn new(id: OntologyId) -> Self {
        Self {
            id,
            uri: String::new(),
            prefix: String::new(),
            name: String::new(),
            fragment: String::new(),
            instance_namespace: String::new(),
            instance_prefix: String::new(),
            root_classes: Vec::new(),
            root_properties: Vec::new(),
            inverse_of: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> OntologyId {
        self.id
    }

    /// The namespace of non-instance resources: `uri + fragment`.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{}{}", self.uri, self.fragment)
    }

    /// Sets `uri`, moving a trailing `/` or `#` into `fragment`.
    pub fn set_namespace(&mut self, namespace: &str) {
        match namespace.chars().last() {
            Some(last @ ('/' | '#')) => {
                self.uri = namespace[..namespace.len() - 1].to_string();
                self.fragment = last.to_string();
            }
            _ => {
                self.uri = namespace.to_string();
                self.fragment = String::new();
            }
        }
    }

    #[must_use]
    pub fn roots(&self, list: RootList) -> &[ResourceId] {
        match list {
            RootList::Classes => &self.root_classes,
            RootList::Properties => &self.root_properties,
        }
    }

    pub(crate) fn roots_mut(&mut self, list: RootList) -> &mut Vec<ResourceId> {
        match list {
            RootList::Classes => &mut self.root_classes,
            RootList::Properties => &mut self.root_properties,
        }
    }

    #[must_use]
    pub fn root_classes(&self) -> &[ResourceId] {
        &self.root_classes
    }

    #[must_use]
    pub fn root_properties(&self) -> &[ResourceId] {
        &self.root_properties
    }

    #[must_use]
    pub fn inverse_pairs(&self) -> &BTreeSet<InversePair> {
        &self.inverse_of
    }
}

#[cfg(test)]
mod tests {
    use super::{Facet, Link, Ontology, Resource};
    use crate::ontology::value_objects::{OntologyId, ResourceId, ResourceKind};

    #[test]
    fn facets_expose_kind_capabilities() {
        let class = Resource::new(ResourceId(2), OntologyId(1), ResourceKind::Class, "Person");
        assert!(class.has_instances());
        assert!(class.has_children());
        assert!(!class.has_links());

        let property =
            Resource::new(ResourceId(3), OntologyId(1), ResourceKind::Property, "knows");
        assert!(property.has_domain_range());
        assert!(property.has_links());
        assert!(property.links().is_some_and(|links| links.is_empty()));

        let instance =
            Resource::new(ResourceId(4), OntologyId(1), ResourceKind::Instance, "alice");
        assert!(!instance.has_children());
        assert!(instance.instances().is_empty());
        assert_eq!(instance.facet(), &Facet::Instance);
    }

    #[test]
    fn literal_value_lives_in_untagged_comment() {
        let mut literal = Resource::new(ResourceId(5), OntologyId(1), ResourceKind::Literal, "");
        literal.comment.set("", "42");
        assert_eq!(literal.literal_value(), Some("42"));
    }

    #[test]
    fn namespace_splits_trailing_fragment() {
        let mut ontology = Ontology::new(OntologyId(1));
        ontology.set_namespace("http://xmlns.com/foaf/0.1/");
        assert_eq!(ontology.uri, "http://xmlns.com/foaf/0.1");
        assert_eq!(ontology.fragment, "/");
        assert_eq!(ontology.namespace(), "http://xmlns.com/foaf/0.1/");

        ontology.set_namespace("urn:example");
        assert_eq!(ontology.fragment, "");
        assert_eq!(ontology.namespace(), "urn:example");
    }

    #[test]
    fn link_involvement() {
        let link = Link::new(ResourceId(1), ResourceId(2));
        assert!(link.involves(ResourceId(2)));
        assert!(!link.involves(ResourceId(3)));
    }
}
