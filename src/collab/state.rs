//! Builds the serialized state of a document.

use crate::ontology::{Graph, OntologyId, Resource, ResourceId, RootList};

use super::protocol::{Forest, LinkDescriptor, OntologyState, ResourceDescriptor, StateSnapshot};

/// Serializes every loaded ontology of `graph`.
#[must_use]
pub fn snapshot(graph: &Graph) -> StateSnapshot {
    let ontologies = graph
        .loaded()
        .iter()
        .enumerate()
        .filter_map(|(index, id)| {
            let ontology = graph.ontology(*id)?;
            let describer = Describer::new(graph, index, *id);
            Some(OntologyState {
                uri: ontology.uri.clone(),
                prefix: ontology.prefix.clone(),
                identity: id.get(),
                index,
                is_user: index == 0,
                classes: describer.forest(ontology.roots(RootList::Classes)),
                properties: describer.forest(ontology.roots(RootList::Properties)),
            })
        })
        .collect();
    StateSnapshot { ontologies }
}

/// Serializes one resource as seen from the user ontology, without children
/// or instances.
#[must_use]
pub fn describe(graph: &Graph, id: ResourceId) -> Option<ResourceDescriptor> {
    Describer::new(graph, 0, graph.user_ontology()).describe(id, false)
}

struct Describer<'a> {
    graph: &'a Graph,
    index: usize,
    host: OntologyId,
}

impl<'a> Describer<'a> {
    fn new(graph: &'a Graph, index: usize, host: OntologyId) -> Self {
        Self { graph, index, host }
    }

    fn forest(&self, roots: &[ResourceId]) -> Forest {
        Forest {
            children: self.sorted(roots),
        }
    }

    fn sorted(&self, ids: &[ResourceId]) -> Vec<ResourceDescriptor> {
        let mut resources: Vec<&Resource> =
            ids.iter().filter_map(|id| self.graph.resource(*id)).collect();
        resources.sort_by_cached_key(|resource| resource.local_name.to_lowercase());
        resources
            .into_iter()
            .filter_map(|resource| self.describe(resource.id(), true))
            .collect()
    }

    fn shallow(&self, id: Option<ResourceId>) -> Option<Box<ResourceDescriptor>> {
        id.and_then(|id| self.describe(id, false)).map(Box::new)
    }

    fn describe(&self, id: ResourceId, recursive: bool) -> Option<ResourceDescriptor> {
        let resource = self.graph.resource(id)?;
        let owner = if resource.imported {
            self.graph.ontology(resource.owner())
        } else {
            None
        };
        let (children, instances) = if recursive {
            let instances = resource
                .instances()
                .iter()
                .filter_map(|instance| self.describe(*instance, false))
                .collect();
            (self.sorted(resource.children()), instances)
        } else {
            (Vec::new(), Vec::new())
        };
        let links = resource
            .links()
            .into_iter()
            .flatten()
            .map(|link| LinkDescriptor {
                subject: link.subject.get(),
                object: link.object.get(),
                value: self
                    .graph
                    .resource(link.object)
                    .and_then(|object| object.literal_value())
                    .map(str::to_string),
            })
            .collect();

        Some(ResourceDescriptor {
            identity: id.get(),
            kind: resource.kind(),
            imported: resource.imported,
            owner_ontology_index: self.index,
            prefix: owner.map(|ontology| ontology.prefix.clone()),
            uri: owner.map(|ontology| ontology.uri.clone()),
            local_name: resource.local_name.clone(),
            label: resource.label.clone(),
            comment: resource.comment.clone(),
            parent: self.shallow(resource.parent()),
            domain: self.shallow(resource.domain()),
            range: self.shallow(resource.range()),
            inverse_of: self.graph.inverse_of(self.host, id).map(ResourceId::get),
            children,
            instances,
            links,
        })
    }
}
