//! Tree projections of a document.
//!
//! The same [`Graph`] is shown through three views: the Domain view (classes
//! without datatypes), the Property view, and the Range view (classes and
//! datatypes). Every view is a forest `Root -> loaded ontologies -> root list
//! -> children`. Mutations are reported to subscribed [`ViewListener`]s as
//! [`TreeEvent`]s that locate the touched node by its parent path and its
//! index in the projected child list of that parent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ontology::{Graph, NodeRef, OntologyId, Resource, ResourceId, ResourceKind, RootList};

/// One of the three synchronized trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    Domain,
    Property,
    Range,
}

impl View {
    pub const ALL: [Self; 3] = [Self::Domain, Self::Property, Self::Range];

    #[must_use]
    pub fn root_list(self) -> RootList {
        match self {
            Self::Domain | Self::Range => RootList::Classes,
            Self::Property => RootList::Properties,
        }
    }

    #[must_use]
    pub fn includes_datatypes(self) -> bool {
        matches!(self, Self::Range)
    }

    /// Whether a resource of `kind` is visible in this view.
    #[must_use]
    pub fn shows(self, kind: ResourceKind) -> bool {
        match (self, kind) {
            (Self::Domain | Self::Range, ResourceKind::Class)
            | (Self::Property, ResourceKind::Property) => true,
            (Self::Range, ResourceKind::Datatype) => self.includes_datatypes(),
            _ => false,
        }
    }

    /// Views an event about a resource of `kind` is routed to.
    #[must_use]
    pub fn routed(kind: ResourceKind) -> &'static [Self] {
        match kind {
            ResourceKind::Class | ResourceKind::Datatype => &[Self::Domain, Self::Range],
            ResourceKind::Property => &[Self::Property],
            ResourceKind::Instance | ResourceKind::Literal => &[],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Domain => "Domain",
            Self::Property => "Property",
            Self::Range => "Range",
        };
        f.write_str(name)
    }
}

/// A node of a projected forest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeNode {
    Root,
    Ontology(OntologyId),
    Resource(ResourceId),
}

impl From<NodeRef> for TreeNode {
    fn from(value: NodeRef) -> Self {
        match value {
            NodeRef::Ontology(id) => Self::Ontology(id),
            NodeRef::Resource(id) => Self::Resource(id),
        }
    }
}

impl From<OntologyId> for TreeNode {
    fn from(value: OntologyId) -> Self {
        Self::Ontology(value)
    }
}

impl From<ResourceId> for TreeNode {
    fn from(value: ResourceId) -> Self {
        Self::Resource(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modification {
    Inserted,
    Removed,
    Changed,
    Structure,
}

/// A change notification for one view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEvent {
    pub view: View,
    pub modification: Modification,
    /// From [`TreeNode::Root`] down to the parent of `node`.
    pub path: Vec<TreeNode>,
    /// Position of `node` among the projected children of its parent.
    pub index: usize,
    pub node: TreeNode,
}

impl TreeEvent {
    #[must_use]
    pub fn parent(&self) -> TreeNode {
        self.path.last().copied().unwrap_or(TreeNode::Root)
    }
}

/// Read only tree model of one view over a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeProjection {
    view: View,
}

impl TreeProjection {
    #[must_use]
    pub fn new(view: View) -> Self {
        Self { view }
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    fn visible(&self, graph: &Graph, id: ResourceId) -> bool {
        graph
            .kind_of(id)
            .is_some_and(|kind| self.view.shows(kind))
    }

    /// The projected children of `node`, in tree order.
    #[must_use]
    pub fn children(&self, graph: &Graph, node: TreeNode) -> Vec<TreeNode> {
        match node {
            TreeNode::Root => graph.loaded().iter().copied().map(TreeNode::Ontology).collect(),
            TreeNode::Ontology(id) => graph
                .ontology(id)
                .map(|ontology| ontology.roots(self.view.root_list()))
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|child| self.visible(graph, *child))
                .map(TreeNode::Resource)
                .collect(),
            TreeNode::Resource(id) => graph
                .resource(id)
                .map(Resource::children)
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|child| self.visible(graph, *child))
                .map(TreeNode::Resource)
                .collect(),
        }
    }

    #[must_use]
    pub fn child_count(&self, graph: &Graph, node: TreeNode) -> usize {
        self.children(graph, node).len()
    }

    #[must_use]
    pub fn child(&self, graph: &Graph, parent: TreeNode, index: usize) -> Option<TreeNode> {
        self.children(graph, parent).get(index).copied()
    }

    #[must_use]
    pub fn index_of_child(&self, graph: &Graph, parent: TreeNode, child: TreeNode) -> Option<usize> {
        self.children(graph, parent)
            .iter()
            .position(|candidate| *candidate == child)
    }

    #[must_use]
    pub fn is_leaf(&self, graph: &Graph, node: TreeNode) -> bool {
        self.child_count(graph, node) == 0
    }

    /// Path from the forest root to the parent of `node`. Root level
    /// resources hang under the ontology hosting their root entry, which is
    /// the user ontology for imported copies.
    #[must_use]
    pub fn path_to_parent(&self, graph: &Graph, node: TreeNode) -> Vec<TreeNode> {
        match node {
            TreeNode::Root => Vec::new(),
            TreeNode::Ontology(_) => vec![TreeNode::Root],
            TreeNode::Resource(id) => {
                let mut path = vec![TreeNode::Root];
                if let Some(host) = graph.root_host(id) {
                    path.push(TreeNode::Ontology(host));
                }
                path.extend(graph.parent_path(id).into_iter().map(TreeNode::Resource));
                path
            }
        }
    }

    /// Locates `node` for an event. `None` when the node is not visible in
    /// this view or not attached where its path says it is.
    #[must_use]
    pub fn event_for(
        &self,
        graph: &Graph,
        modification: Modification,
        node: TreeNode,
    ) -> Option<TreeEvent> {
        if node == TreeNode::Root {
            return Some(TreeEvent {
                view: self.view,
                modification,
                path: Vec::new(),
                index: 0,
                node,
            });
        }
        let path = self.path_to_parent(graph, node);
        let parent = path.last().copied()?;
        let index = self.index_of_child(graph, parent, node)?;
        Some(TreeEvent {
            view: self.view,
            modification,
            path,
            index,
            node,
        })
    }
}

/// Receives tree events of the views it was subscribed to.
pub trait ViewListener: Send + Sync {
    fn on_event(&self, event: &TreeEvent);
}

/// Logs every event at `trace` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceListener;

impl ViewListener for TraceListener {
    fn on_event(&self, event: &TreeEvent) {
        tracing::trace!(
            view = %event.view,
            modification = ?event.modification,
            node = ?event.node,
            index = event.index,
            depth = event.path.len(),
            "tree event"
        );
    }
}

/// The three projections of a document and the listeners attached to them.
#[derive(Default)]
pub struct Projections {
    listeners: Vec<Box<dyn ViewListener>>,
}

impl fmt::Debug for Projections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projections")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Projections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn projection(view: View) -> TreeProjection {
        TreeProjection::new(view)
    }

    pub fn subscribe(&mut self, listener: impl ViewListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Views that must hear about `node`.
    #[must_use]
    pub fn routes(graph: &Graph, node: TreeNode) -> &'static [View] {
        match node {
            TreeNode::Root | TreeNode::Ontology(_) => &View::ALL,
            TreeNode::Resource(id) => graph.kind_of(id).map(View::routed).unwrap_or_default(),
        }
    }

    /// Builds the events of every routed view without sending them. Used to
    /// capture `Removed` events before the node is detached.
    #[must_use]
    pub fn capture(graph: &Graph, modification: Modification, node: TreeNode) -> Vec<TreeEvent> {
        Self::routes(graph, node)
            .iter()
            .filter_map(|view| TreeProjection::new(*view).event_for(graph, modification, node))
            .collect()
    }

    pub fn dispatch(&self, events: &[TreeEvent]) {
        for event in events {
            for listener in &self.listeners {
                listener.on_event(event);
            }
        }
    }

    /// Computes and sends the events for `node` in its current position.
    pub fn fire(&self, graph: &Graph, modification: Modification, node: TreeNode) -> Vec<TreeEvent> {
        let events = Self::capture(graph, modification, node);
        self.dispatch(&events);
        events
    }
}
