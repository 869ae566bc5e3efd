//! Drag and drop between the three views.
//!
//! A gesture is resolved against [`RULES`] in order; the first rule whose
//! predicate holds is applied. Gestures no rule accepts change nothing.

use crate::{
    ontology::{Graph, GraphError, LangString, NodeRef, ResourceId, ResourceKind},
    projection::{Modification, Projections, TreeEvent, TreeNode, View},
};

/// A node dragged from one view and dropped on a node of another (or the
/// same) view. `modifier` is the alt/ctrl key state at drop time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropGesture {
    pub source_view: View,
    pub source: NodeRef,
    pub target_view: View,
    pub target: NodeRef,
    pub modifier: bool,
}

impl DropGesture {
    #[must_use]
    pub fn new(source_view: View, source: NodeRef, target_view: View, target: NodeRef) -> Self {
        Self {
            source_view,
            source,
            target_view,
            target,
            modifier: false,
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: bool) -> Self {
        self.modifier = modifier;
        self
    }

    fn same_view(&self) -> bool {
        self.source_view == self.target_view
    }
}

/// What a gesture did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// The graph changed; `expand` is the node a view should reveal.
    Applied {
        rule: &'static str,
        expand: NodeRef,
        events: Vec<TreeEvent>,
    },
    /// A rule matched but decided to leave the graph as it is.
    Ignored { rule: &'static str },
    NoMatch,
}

impl DropOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    #[must_use]
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Self::Applied { rule, .. } | Self::Ignored { rule } => Some(rule),
            Self::NoMatch => None,
        }
    }
}

/// Mutable state a rule works on.
pub struct DropContext<'a> {
    pub graph: &'a mut Graph,
    pub projections: &'a Projections,
    /// Language of labels created by a drop.
    pub language: &'a str,
}

impl DropContext<'_> {
    fn capture(&self, modification: Modification, node: impl Into<TreeNode>) -> Vec<TreeEvent> {
        Projections::capture(&*self.graph, modification, node.into())
    }

    fn fire(&self, modification: Modification, node: impl Into<TreeNode>) -> Vec<TreeEvent> {
        self.projections.fire(&*self.graph, modification, node.into())
    }

    /// Resolves a dropped resource as the value of a domain or range: the
    /// resource itself when the user ontology owns it, a reference copy
    /// otherwise.
    fn referenced(&mut self, source: ResourceId) -> Result<ResourceId, GraphError> {
        if is_user_owned(&*self.graph, source) {
            Ok(source)
        } else {
            self.graph.copy_only_ref(source)
        }
    }
}

type Predicate = fn(&Graph, &DropGesture) -> bool;
type Action = fn(&mut DropContext<'_>, &DropGesture) -> Result<DropOutcome, GraphError>;

/// One row of the resolution table.
pub struct DropRule {
    pub name: &'static str,
    pub applies: Predicate,
    pub apply: Action,
}

pub const RULES: [DropRule; 6] = [
    DropRule {
        name: "create_property",
        applies: creates_property,
        apply: create_property,
    },
    DropRule {
        name: "set_domain",
        applies: sets_domain,
        apply: set_domain,
    },
    DropRule {
        name: "set_range",
        applies: sets_range,
        apply: set_range,
    },
    DropRule {
        name: "ignore_self_or_ontology",
        applies: is_self_or_ontology,
        apply: ignore,
    },
    DropRule {
        name: "move_to_ontology_root",
        applies: moves_to_root,
        apply: move_to_root,
    },
    DropRule {
        name: "nest_or_inverse",
        applies: nests,
        apply: nest,
    },
];

/// Applies the first matching rule of [`RULES`].
///
/// # Errors
///
/// Returns a [`GraphError`] when a matched rule fails on the graph. The
/// graph is left as the failing step found it.
pub fn resolve(ctx: &mut DropContext<'_>, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
    for rule in &RULES {
        if (rule.applies)(&*ctx.graph, gesture) {
            tracing::debug!(rule = rule.name, ?gesture, "drop rule matched");
            return (rule.apply)(ctx, gesture);
        }
    }
    tracing::debug!(?gesture, "no drop rule matched");
    Ok(DropOutcome::NoMatch)
}

fn kind(graph: &Graph, node: NodeRef) -> Option<ResourceKind> {
    node.as_resource().and_then(|id| graph.kind_of(id))
}

fn is_user_owned(graph: &Graph, id: ResourceId) -> bool {
    graph
        .resource(id)
        .is_some_and(|resource| resource.owner() == graph.user_ontology())
}

// domain -> range: a new property connecting both

fn creates_property(graph: &Graph, gesture: &DropGesture) -> bool {
    gesture.source_view == View::Domain
        && gesture.target_view == View::Range
        && kind(graph, gesture.source) == Some(ResourceKind::Class)
        && kind(graph, gesture.target).is_some_and(ResourceKind::is_class_like)
}

fn create_property(ctx: &mut DropContext<'_>, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
    let (Some(domain), Some(range)) = (gesture.source.as_resource(), gesture.target.as_resource())
    else {
        return Ok(DropOutcome::NoMatch);
    };
    let range_name = ctx
        .graph
        .resource(range)
        .map(|resource| resource.local_name.clone())
        .ok_or(GraphError::MissingResource(range))?;

    let user = ctx.graph.user_ontology();
    let property =
        ctx.graph
            .create_resource(user, ResourceKind::Property, format!("has{range_name}"))?;
    if let Some(resource) = ctx.graph.resource_mut(property) {
        resource.label = LangString::single(ctx.language, format!("has {range_name}"));
    }
    ctx.graph.set_domain(property, Some(domain))?;
    ctx.graph.set_range(property, Some(range))?;
    ctx.graph.add_root(user, property)?;

    let events = ctx.fire(Modification::Inserted, property);
    Ok(DropOutcome::Applied {
        rule: "create_property",
        expand: NodeRef::Ontology(user),
        events,
    })
}

// class -> user property: domain or range assignment

fn assigns_to_property(graph: &Graph, gesture: &DropGesture, from: View) -> bool {
    gesture.source_view == from
        && gesture.target_view == View::Property
        && kind(graph, gesture.source).is_some_and(ResourceKind::is_class_like)
        && kind(graph, gesture.target) == Some(ResourceKind::Property)
        && gesture
            .target
            .as_resource()
            .is_some_and(|target| is_user_owned(graph, target))
}

fn sets_domain(graph: &Graph, gesture: &DropGesture) -> bool {
    assigns_to_property(graph, gesture, View::Domain)
}

fn sets_range(graph: &Graph, gesture: &DropGesture) -> bool {
    assigns_to_property(graph, gesture, View::Range)
}

fn set_domain(ctx: &mut DropContext<'_>, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
    assign(ctx, gesture, "set_domain", Graph::set_domain)
}

fn set_range(ctx: &mut DropContext<'_>, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
    assign(ctx, gesture, "set_range", Graph::set_range)
}

fn assign(
    ctx: &mut DropContext<'_>,
    gesture: &DropGesture,
    rule: &'static str,
    setter: fn(&mut Graph, ResourceId, Option<ResourceId>) -> Result<(), GraphError>,
) -> Result<DropOutcome, GraphError> {
    let (Some(source), Some(property)) = (gesture.source.as_resource(), gesture.target.as_resource())
    else {
        return Ok(DropOutcome::NoMatch);
    };
    let value = ctx.referenced(source)?;
    setter(ctx.graph, property, Some(value))?;
    let events = ctx.fire(Modification::Changed, property);
    Ok(DropOutcome::Applied {
        rule,
        expand: NodeRef::Resource(property),
        events,
    })
}

// no-ops

fn is_self_or_ontology(_: &Graph, gesture: &DropGesture) -> bool {
    gesture.source == gesture.target || gesture.source.as_ontology().is_some()
}

fn ignore(_: &mut DropContext<'_>, _: &DropGesture) -> Result<DropOutcome, GraphError> {
    Ok(DropOutcome::Ignored {
        rule: "ignore_self_or_ontology",
    })
}

// resource -> user ontology: re-root or import a reference copy

/// Whether the source kind lives in the tree shown by `view`.
fn in_view_family(graph: &Graph, view: View, node: NodeRef) -> bool {
    kind(graph, node)
        .and_then(ResourceKind::root_list)
        .is_some_and(|list| list == view.root_list())
}

fn moves_to_root(graph: &Graph, gesture: &DropGesture) -> bool {
    gesture.same_view()
        && gesture.target == NodeRef::Ontology(graph.user_ontology())
        && in_view_family(graph, gesture.source_view, gesture.source)
}

fn move_to_root(ctx: &mut DropContext<'_>, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
    let Some(source) = gesture.source.as_resource() else {
        return Ok(DropOutcome::NoMatch);
    };
    let user = ctx.graph.user_ontology();

    let mut events = Vec::new();
    let rooted = if is_user_owned(&*ctx.graph, source) {
        events.extend(ctx.capture(Modification::Removed, source));
        ctx.graph.detach(source);
        source
    } else {
        ctx.graph.copy_only_ref(source)?
    };
    ctx.projections.dispatch(&events);
    ctx.graph.add_root(user, rooted)?;
    events.extend(ctx.fire(Modification::Inserted, rooted));

    Ok(DropOutcome::Applied {
        rule: "move_to_ontology_root",
        expand: NodeRef::Resource(rooted),
        events,
    })
}

// resource -> resource: subclass / subproperty, or inverse with modifier

fn nests(graph: &Graph, gesture: &DropGesture) -> bool {
    let Some(target) = gesture.target.as_resource() else {
        return false;
    };
    let target_open = graph
        .resource(target)
        .is_some_and(|resource| resource.imported || resource.owner() == graph.user_ontology());
    gesture.same_view()
        && target_open
        && in_view_family(graph, gesture.source_view, gesture.source)
        && in_view_family(graph, gesture.target_view, gesture.target)
}

fn nest(ctx: &mut DropContext<'_>, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
    let (Some(source), Some(target)) = (gesture.source.as_resource(), gesture.target.as_resource())
    else {
        return Ok(DropOutcome::NoMatch);
    };

    if gesture.modifier {
        let both_properties = ctx.graph.kind_of(source) == Some(ResourceKind::Property)
            && ctx.graph.kind_of(target) == Some(ResourceKind::Property);
        if !both_properties {
            return Ok(DropOutcome::Ignored {
                rule: "nest_or_inverse",
            });
        }
        let user = ctx.graph.user_ontology();
        ctx.graph.add_inverse_of(user, source, target)?;
        let events = ctx.fire(Modification::Changed, source);
        return Ok(DropOutcome::Applied {
            rule: "nest_or_inverse",
            expand: NodeRef::Resource(target),
            events,
        });
    }

    if ctx.graph.is_descendant(target, source) {
        tracing::debug!(%source, %target, "drop would create a cycle");
        return Ok(DropOutcome::Ignored {
            rule: "nest_or_inverse",
        });
    }

    let mut events = ctx.capture(Modification::Removed, source);
    ctx.projections.dispatch(&events);
    ctx.graph.add_child(target, source)?;
    events.extend(ctx.fire(Modification::Inserted, source));
    Ok(DropOutcome::Applied {
        rule: "nest_or_inverse",
        expand: NodeRef::Resource(target),
        events,
    })
}
