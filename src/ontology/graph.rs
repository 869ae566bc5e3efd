//! The document arena holding every ontology and resource of one editor.
//!
//! Identities are handed out from a single monotonically increasing counter
//! shared by ontologies and resources, so a wire identity resolves to exactly
//! one node of the document. Storage never evicts: a detached resource stays
//! addressable, which keeps `domain`/`range` references valid after the
//! referenced node was removed from its tree.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;

use super::{
    entities::{Facet, InversePair, Link, Ontology, Resource},
    value_objects::{NodeRef, OntologyId, ResourceId, ResourceKind, RootList},
};

/// Errors raised by structural graph operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("resource `{0}` does not exist")]
    MissingResource(ResourceId),
    #[error("ontology `{0}` does not exist")]
    MissingOntology(OntologyId),
    #[error("resource `{0}` cannot become its own child")]
    SelfParent(ResourceId),
    #[error("moving `{child}` under `{parent}` would create a cycle")]
    Cycle {
        parent: ResourceId,
        child: ResourceId,
    },
    #[error("{kind} resources have no root list")]
    NoRootList { kind: ResourceKind },
    #[error("resource `{id}` is a {actual}, expected {expected}")]
    KindMismatch {
        id: ResourceId,
        actual: ResourceKind,
        expected: &'static str,
    },
}

type PropertyFacet<'a> = (
    &'a mut Option<ResourceId>,
    &'a mut Option<ResourceId>,
    &'a mut BTreeSet<Link>,
);

/// One editable document: the loaded ontologies and every node they own.
#[derive(Clone, Debug)]
pub struct Graph {
    next_identity: u64,
    ontologies: BTreeMap<OntologyId, Ontology>,
    resources: BTreeMap<ResourceId, Resource>,
    loaded: Vec<OntologyId>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates a document holding one blank user ontology.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            next_identity: 1,
            ontologies: BTreeMap::new(),
            resources: BTreeMap::new(),
            loaded: Vec::new(),
        };
        let user = graph.create_ontology();
        graph.loaded.push(user);
        graph
    }

    fn allocate(&mut self) -> u64 {
        let identity = self.next_identity;
        self.next_identity += 1;
        identity
    }

    // ---------------------------------------------------------------------
    // ontologies

    /// Creates a detached ontology. It is addressable but not part of the
    /// loaded list until [`Graph::load`] or [`Graph::set_user_ontology`].
    pub fn create_ontology(&mut self) -> OntologyId {
        let id = OntologyId(self.allocate());
        self.ontologies.insert(id, Ontology::new(id));
        id
    }

    #[must_use]
    pub fn ontology(&self, id: OntologyId) -> Option<&Ontology> {
        self.ontologies.get(&id)
    }

    pub fn ontology_mut(&mut self, id: OntologyId) -> Option<&mut Ontology> {
        self.ontologies.get_mut(&id)
    }

    /// Loaded ontologies, the user ontology first.
    #[must_use]
    pub fn loaded(&self) -> &[OntologyId] {
        &self.loaded
    }

    pub fn loaded_ontologies(&self) -> impl Iterator<Item = &Ontology> {
        self.loaded.iter().filter_map(|id| self.ontologies.get(id))
    }

    #[must_use]
    pub fn user_ontology(&self) -> OntologyId {
        self.loaded[0]
    }

    #[must_use]
    pub fn is_user_ontology(&self, id: OntologyId) -> bool {
        self.user_ontology() == id
    }

    /// Position of `id` in the loaded list.
    #[must_use]
    pub fn index_of(&self, id: OntologyId) -> Option<usize> {
        self.loaded.iter().position(|loaded| *loaded == id)
    }

    /// Returns the loaded ontology using `prefix`.
    #[must_use]
    pub fn find_loaded_by_prefix(&self, prefix: &str) -> Option<OntologyId> {
        self.loaded_ontologies()
            .find(|ontology| ontology.prefix == prefix)
            .map(Ontology::id)
    }

    /// Makes `id` the user ontology, dropping every other loaded ontology.
    pub fn set_user_ontology(&mut self, id: OntologyId) -> Result<(), GraphError> {
        if !self.ontologies.contains_key(&id) {
            return Err(GraphError::MissingOntology(id));
        }
        self.loaded.clear();
        self.loaded.push(id);
        Ok(())
    }

    /// Appends `id` to the loaded list; a no-op when it is already loaded.
    pub fn load(&mut self, id: OntologyId) -> Result<(), GraphError> {
        if !self.ontologies.contains_key(&id) {
            return Err(GraphError::MissingOntology(id));
        }
        if !self.loaded.contains(&id) {
            self.loaded.push(id);
        }
        Ok(())
    }

    /// Removes an imported ontology from the loaded list. The user ontology
    /// cannot be unloaded.
    pub fn unload_ontology(&mut self, id: OntologyId) -> bool {
        if self.is_user_ontology(id) {
            return false;
        }
        let before = self.loaded.len();
        self.loaded.retain(|loaded| *loaded != id);
        before != self.loaded.len()
    }

    // ---------------------------------------------------------------------
    // resources

    /// Creates a detached resource owned by `owner`.
    pub fn create_resource(
        &mut self,
        owner: OntologyId,
        kind: ResourceKind,
        local_name: impl Into<String>,
    ) -> Result<ResourceId, GraphError> {
        if !self.ontologies.contains_key(&owner) {
            return Err(GraphError::MissingOntology(owner));
        }
        let id = ResourceId(self.allocate());
        self.resources
            .insert(id, Resource::new(id, owner, kind, local_name));
        Ok(id)
    }

    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn resource_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(&id)
    }

    fn get(&self, id: ResourceId) -> Result<&Resource, GraphError> {
        self.resources
            .get(&id)
            .ok_or(GraphError::MissingResource(id))
    }

    fn get_mut(&mut self, id: ResourceId) -> Result<&mut Resource, GraphError> {
        self.resources
            .get_mut(&id)
            .ok_or(GraphError::MissingResource(id))
    }

    #[must_use]
    pub fn kind_of(&self, id: ResourceId) -> Option<ResourceKind> {
        self.resource(id).map(Resource::kind)
    }

    /// Produces a reference-only copy: same kind and local name, marked
    /// imported, without label, comment, children, links or domain/range.
    pub fn copy_only_ref(&mut self, id: ResourceId) -> Result<ResourceId, GraphError> {
        let (owner, kind, local_name) = {
            let source = self.get(id)?;
            (source.owner(), source.kind(), source.local_name.clone())
        };
        let copy = self.create_resource(owner, kind, local_name)?;
        self.get_mut(copy)?.imported = true;
        Ok(copy)
    }

    /// Resolves the URI of a resource from its owner's header.
    #[must_use]
    pub fn uri_of(&self, id: ResourceId) -> Option<String> {
        let resource = self.resource(id)?;
        let owner = self.ontology(resource.owner())?;
        Some(match resource.kind() {
            ResourceKind::Instance => {
                format!("{}{}", owner.instance_namespace, resource.local_name)
            }
            _ => format!("{}{}", owner.namespace(), resource.local_name),
        })
    }

    /// Name shown in trees: `prefix:localName` for imported resources.
    #[must_use]
    pub fn display_name(&self, id: ResourceId) -> Option<String> {
        let resource = self.resource(id)?;
        if !resource.imported {
            return Some(resource.local_name.clone());
        }
        let prefix = self
            .ontology(resource.owner())
            .map(|owner| owner.prefix.as_str())
            .unwrap_or_default();
        Some(format!("{prefix}:{}", resource.local_name))
    }

    // ---------------------------------------------------------------------
    // tree edges

    /// Moves `child` under `parent`, detaching it from its previous position.
    pub fn add_child(&mut self, parent: ResourceId, child: ResourceId) -> Result<(), GraphError> {
        if parent == child {
            return Err(GraphError::SelfParent(child));
        }
        let parent_node = self.get(parent)?;
        if !parent_node.has_children() {
            return Err(GraphError::KindMismatch {
                id: parent,
                actual: parent_node.kind(),
                expected: "class, datatype or property",
            });
        }
        self.get(child)?;
        if self.is_descendant(parent, child) {
            return Err(GraphError::Cycle { parent, child });
        }

        self.detach(child);
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detaches `child` from `parent`. Returns `false` when it was not a child.
    pub fn remove_child(&mut self, parent: ResourceId, child: ResourceId) -> bool {
        let Some(parent_node) = self.resources.get_mut(&parent) else {
            return false;
        };
        let before = parent_node.children.len();
        parent_node.children.retain(|id| *id != child);
        if before == parent_node.children.len() {
            return false;
        }
        if let Some(child_node) = self.resources.get_mut(&child) {
            child_node.parent = None;
        }
        true
    }

    /// Appends `resource` to the root list of `ontology` matching its kind.
    pub fn add_root(&mut self, ontology: OntologyId, resource: ResourceId) -> Result<(), GraphError> {
        let kind = self.get(resource)?.kind();
        let list = kind.root_list().ok_or(GraphError::NoRootList { kind })?;
        let roots = self
            .ontologies
            .get_mut(&ontology)
            .ok_or(GraphError::MissingOntology(ontology))?
            .roots_mut(list);
        if !roots.contains(&resource) {
            roots.push(resource);
        }
        Ok(())
    }

    /// Removes `resource` from the root list of `ontology`.
    pub fn remove_from_root(&mut self, ontology: OntologyId, resource: ResourceId) -> bool {
        let Some(list) = self.kind_of(resource).and_then(ResourceKind::root_list) else {
            return false;
        };
        let Some(ontology) = self.ontologies.get_mut(&ontology) else {
            return false;
        };
        let roots = ontology.roots_mut(list);
        let before = roots.len();
        roots.retain(|id| *id != resource);
        before != roots.len()
    }

    /// The ontology whose root list holds `resource`: the user ontology for
    /// imported copies, the owner otherwise.
    #[must_use]
    pub fn root_host(&self, resource: ResourceId) -> Option<OntologyId> {
        let node = self.resource(resource)?;
        Some(if node.imported {
            self.user_ontology()
        } else {
            node.owner()
        })
    }

    /// Detaches `resource` from wherever it currently hangs: its parent's
    /// children or instances, or any root list.
    pub fn detach(&mut self, resource: ResourceId) -> bool {
        let Some(node) = self.resources.get(&resource) else {
            return false;
        };
        if let Some(parent) = node.parent {
            if node.kind() == ResourceKind::Instance {
                return self.remove_instance(parent, resource);
            }
            return self.remove_child(parent, resource);
        }
        let Some(list) = node.kind().root_list() else {
            return false;
        };
        let mut detached = false;
        for ontology in self.ontologies.values_mut() {
            let roots = ontology.roots_mut(list);
            let before = roots.len();
            roots.retain(|id| *id != resource);
            detached |= before != roots.len();
        }
        detached
    }

    /// Whether `candidate` lies in the subtree rooted at `root` (root inclusive).
    #[must_use]
    pub fn is_descendant(&self, candidate: ResourceId, root: ResourceId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.resource(id).and_then(Resource::parent);
        }
        false
    }

    /// Ancestors of `resource` from the top of its tree down to its parent.
    #[must_use]
    pub fn parent_path(&self, resource: ResourceId) -> Vec<ResourceId> {
        let mut path = Vec::new();
        let mut current = self.resource(resource).and_then(Resource::parent);
        while let Some(id) = current {
            path.push(id);
            current = self.resource(id).and_then(Resource::parent);
        }
        path.reverse();
        path
    }

    /// Breadth-first traversal over `children`, root inclusive.
    #[must_use]
    pub fn descendants(&self, root: ResourceId) -> Descendants<'_> {
        Descendants::new(self, [root])
    }

    /// Breadth-first traversal over every tree of an ontology's root list.
    #[must_use]
    pub fn forest(&self, ontology: OntologyId, list: RootList) -> Descendants<'_> {
        let roots = self
            .ontology(ontology)
            .map(|ontology| ontology.roots(list).to_vec())
            .unwrap_or_default();
        Descendants::new(self, roots)
    }

    /// Sorts both root lists case-insensitively by local name.
    pub fn sort_roots(&mut self, ontology: OntologyId) {
        let Some(mut onto) = self.ontologies.remove(&ontology) else {
            return;
        };
        for list in [RootList::Classes, RootList::Properties] {
            onto.roots_mut(list).sort_by_cached_key(|id| {
                self.resource(*id)
                    .map(|resource| resource.local_name.to_lowercase())
                    .unwrap_or_default()
            });
        }
        self.ontologies.insert(ontology, onto);
    }

    // ---------------------------------------------------------------------
    // instances

    /// Attaches `instance` to `class`, detaching it from a previous class.
    pub fn add_instance(&mut self, class: ResourceId, instance: ResourceId) -> Result<(), GraphError> {
        let instance_kind = self.get(instance)?.kind();
        if instance_kind != ResourceKind::Instance {
            return Err(GraphError::KindMismatch {
                id: instance,
                actual: instance_kind,
                expected: "instance",
            });
        }
        let class_node = self.get(class)?;
        if !class_node.has_instances() {
            return Err(GraphError::KindMismatch {
                id: class,
                actual: class_node.kind(),
                expected: "class",
            });
        }
        self.detach(instance);
        if let Facet::Class { instances } = &mut self.get_mut(class)?.facet {
            instances.push(instance);
        }
        self.get_mut(instance)?.parent = Some(class);
        Ok(())
    }

    pub fn remove_instance(&mut self, class: ResourceId, instance: ResourceId) -> bool {
        let Some(Facet::Class { instances }) =
            self.resources.get_mut(&class).map(|class| &mut class.facet)
        else {
            return false;
        };
        let before = instances.len();
        instances.retain(|id| *id != instance);
        if before == instances.len() {
            return false;
        }
        if let Some(node) = self.resources.get_mut(&instance) {
            node.parent = None;
        }
        true
    }

    // ---------------------------------------------------------------------
    // references

    fn property_facet(
        &mut self,
        property: ResourceId,
    ) -> Result<PropertyFacet<'_>, GraphError> {
        let node = self.get_mut(property)?;
        let actual = node.kind();
        match &mut node.facet {
            Facet::Property {
                domain,
                range,
                links,
            } => Ok((domain, range, links)),
            _ => Err(GraphError::KindMismatch {
                id: property,
                actual,
                expected: "property",
            }),
        }
    }

    /// Assigns the domain of a property; `None` clears it.
    pub fn set_domain(
        &mut self,
        property: ResourceId,
        class: Option<ResourceId>,
    ) -> Result<(), GraphError> {
        let (domain, _, _) = self.property_facet(property)?;
        *domain = class;
        Ok(())
    }

    /// Assigns the range of a property; `None` clears it.
    pub fn set_range(
        &mut self,
        property: ResourceId,
        class: Option<ResourceId>,
    ) -> Result<(), GraphError> {
        let (_, range, _) = self.property_facet(property)?;
        *range = class;
        Ok(())
    }

    /// Adds `(subject, object)` to the property's links. Returns `false` for
    /// an already present pair.
    pub fn add_link(
        &mut self,
        property: ResourceId,
        subject: ResourceId,
        object: ResourceId,
    ) -> Result<bool, GraphError> {
        let (_, _, links) = self.property_facet(property)?;
        Ok(links.insert(Link::new(subject, object)))
    }

    pub fn remove_link(
        &mut self,
        property: ResourceId,
        subject: ResourceId,
        object: ResourceId,
    ) -> Result<bool, GraphError> {
        let (_, _, links) = self.property_facet(property)?;
        Ok(links.remove(&Link::new(subject, object)))
    }

    fn links(&self, property: ResourceId) -> impl Iterator<Item = &Link> {
        self.resource(property)
            .and_then(Resource::links)
            .into_iter()
            .flatten()
    }

    #[must_use]
    pub fn links_of_subject(&self, property: ResourceId, subject: ResourceId) -> Vec<Link> {
        self.links(property)
            .filter(|link| link.subject == subject)
            .copied()
            .collect()
    }

    #[must_use]
    pub fn links_of_object(&self, property: ResourceId, object: ResourceId) -> Vec<Link> {
        self.links(property)
            .filter(|link| link.object == object)
            .copied()
            .collect()
    }

    #[must_use]
    pub fn objects(&self, property: ResourceId, subject: ResourceId) -> Vec<ResourceId> {
        self.links_of_subject(property, subject)
            .into_iter()
            .map(|link| link.object)
            .collect()
    }

    #[must_use]
    pub fn subjects(&self, property: ResourceId, object: ResourceId) -> Vec<ResourceId> {
        self.links_of_object(property, object)
            .into_iter()
            .map(|link| link.subject)
            .collect()
    }

    /// Removes every link mentioning `resource`, across the property trees of
    /// every loaded ontology. Returns the number of removed links.
    pub fn remove_links_having(&mut self, resource: ResourceId) -> usize {
        let properties: Vec<ResourceId> = self
            .loaded
            .iter()
            .flat_map(|ontology| self.forest(*ontology, RootList::Properties))
            .collect();
        let mut removed = 0;
        for property in properties {
            if let Some(Facet::Property { links, .. }) =
                self.resources.get_mut(&property).map(|node| &mut node.facet)
            {
                let before = links.len();
                links.retain(|link| !link.involves(resource));
                removed += before - links.len();
            }
        }
        removed
    }

    /// Registers `(a, b)` as inverse properties in `ontology`.
    pub fn add_inverse_of(
        &mut self,
        ontology: OntologyId,
        a: ResourceId,
        b: ResourceId,
    ) -> Result<bool, GraphError> {
        let onto = self
            .ontologies
            .get_mut(&ontology)
            .ok_or(GraphError::MissingOntology(ontology))?;
        Ok(onto.inverse_of.insert(InversePair {
            source: a,
            target: b,
        }))
    }

    /// Removes every pair of `ontology` where `resource` appears on either side.
    pub fn remove_inverse_of(&mut self, ontology: OntologyId, resource: ResourceId) -> usize {
        let Some(onto) = self.ontologies.get_mut(&ontology) else {
            return 0;
        };
        let before = onto.inverse_of.len();
        onto.inverse_of.retain(|pair| !pair.involves(resource));
        before - onto.inverse_of.len()
    }

    /// The property declared inverse of `resource`, where it is the source.
    #[must_use]
    pub fn inverse_of(&self, ontology: OntologyId, resource: ResourceId) -> Option<ResourceId> {
        self.ontology(ontology)?
            .inverse_of
            .iter()
            .find(|pair| pair.source == resource)
            .map(|pair| pair.target)
    }

    // ---------------------------------------------------------------------
    // lookup

    /// Every resource reachable from the loaded ontologies, in scan order:
    /// tree nodes, then their instances, then their link endpoints.
    pub fn reachable(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.loaded.iter().flat_map(move |ontology| {
            [RootList::Classes, RootList::Properties]
                .into_iter()
                .flat_map(move |list| self.forest(*ontology, list))
                .flat_map(move |id| {
                    let node = self.resource(id);
                    let instances = node.map(Resource::instances).unwrap_or_default();
                    let endpoints = node
                        .and_then(Resource::links)
                        .into_iter()
                        .flatten()
                        .flat_map(|link| [link.subject, link.object]);
                    std::iter::once(id)
                        .chain(instances.iter().copied())
                        .chain(endpoints)
                })
        })
    }

    /// Resolves a wire identity by scanning the loaded ontologies.
    #[must_use]
    pub fn find_by_identity(&self, identity: u64) -> Option<NodeRef> {
        if let Some(ontology) = self.loaded.iter().find(|id| id.get() == identity) {
            return Some(NodeRef::Ontology(*ontology));
        }
        self.reachable()
            .find(|id| id.get() == identity)
            .map(NodeRef::Resource)
    }

    /// Resolves a resource of the loaded ontologies by its URI.
    #[must_use]
    pub fn find_by_uri(&self, uri: &str) -> Option<ResourceId> {
        self.reachable()
            .find(|id| self.uri_of(*id).is_some_and(|candidate| candidate == uri))
    }
}

/// Lazy breadth-first iterator over resource trees.
///
/// Cloning the iterator restarts nothing; call [`Graph::descendants`] again
/// for a fresh traversal.
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    graph: &'a Graph,
    queue: VecDeque<ResourceId>,
}

impl<'a> Descendants<'a> {
    fn new(graph: &'a Graph, roots: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            graph,
            queue: roots.into_iter().collect(),
        }
    }
}

impl Iterator for Descendants<'_> {
    type Item = ResourceId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.queue.pop_front()?;
            if let Some(node) = self.graph.resource(id) {
                self.queue.extend(node.children.iter().copied());
                return Some(id);
            }
        }
    }
}
