use std::sync::{Arc, Mutex};

use insta::assert_snapshot;
use rdfs_studio::{
    editor::{dnd::DropGesture, Editor, ResourceDraft},
    ontology::{Graph, ResourceId, ResourceKind},
    projection::{Modification, Projections, TreeEvent, TreeNode, TreeProjection, View, ViewListener},
};

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<TreeEvent>>>);

impl Recorder {
    fn take(&self) -> Vec<TreeEvent> {
        std::mem::take(&mut *self.0.lock().expect("recorder lock"))
    }
}

impl ViewListener for Recorder {
    fn on_event(&self, event: &TreeEvent) {
        self.0.lock().expect("recorder lock").push(event.clone());
    }
}

fn create(editor: &mut Editor, kind: ResourceKind, name: &str) -> ResourceId {
    editor
        .create_resource(ResourceDraft::new(kind, name))
        .expect("create resource")
        .expect("resource id")
}

fn walk(graph: &Graph, projection: &TreeProjection, node: TreeNode, depth: usize, lines: &mut Vec<String>) {
    for child in projection.children(graph, node) {
        let name = match child {
            TreeNode::Ontology(id) => graph.ontology(id).map(|onto| onto.prefix.clone()),
            TreeNode::Resource(id) => graph.resource(id).map(|resource| resource.local_name.clone()),
            TreeNode::Root => None,
        };
        lines.push(format!("{}{}", "  ".repeat(depth), name.unwrap_or_default()));
        walk(graph, projection, child, depth + 1, lines);
    }
}

fn render(editor: &Editor, view: View) -> String {
    let mut lines = Vec::new();
    walk(
        editor.graph(),
        &Projections::projection(view),
        TreeNode::Root,
        0,
        &mut lines,
    );
    lines.join("\n")
}

fn sample() -> Editor {
    let mut editor = Editor::default();
    let person = create(&mut editor, ResourceKind::Class, "Person");
    let vehicle = create(&mut editor, ResourceKind::Class, "Vehicle");
    let car = create(&mut editor, ResourceKind::Class, "Car");
    create(&mut editor, ResourceKind::Datatype, "Money");
    for gesture in [
        DropGesture::new(View::Domain, car.into(), View::Domain, vehicle.into()),
        DropGesture::new(View::Domain, person.into(), View::Range, vehicle.into()),
    ] {
        assert!(editor.drag_and_drop(&gesture).expect("drop").is_applied());
    }
    editor
}

#[test]
fn views_project_the_same_graph_differently() {
    let editor = sample();

    assert_snapshot!(render(&editor, View::Domain), @r"
    ex
      Person
      Vehicle
        Car
    ");
    assert_snapshot!(render(&editor, View::Range), @r"
    ex
      Person
      Vehicle
        Car
      Money
    ");
    assert_snapshot!(render(&editor, View::Property), @r"
    ex
      hasVehicle
    ");
}

#[test]
fn events_reach_only_the_views_showing_the_node() {
    let mut editor = Editor::default();
    let recorder = Recorder::default();
    editor.subscribe(recorder.clone());
    let user = editor.user_ontology();

    let vehicle = create(&mut editor, ResourceKind::Class, "Vehicle");
    let events = recorder.take();
    let views: Vec<View> = events.iter().map(|event| event.view).collect();
    assert_eq!(views, vec![View::Domain, View::Range]);
    for event in &events {
        assert_eq!(event.modification, Modification::Inserted);
        assert_eq!(event.path, vec![TreeNode::Root, TreeNode::Ontology(user)]);
        assert_eq!(event.index, 0);
        assert_eq!(event.node, TreeNode::Resource(vehicle));
    }

    // Datatypes only show in the range view.
    let money = create(&mut editor, ResourceKind::Datatype, "Money");
    let events = recorder.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].view, View::Range);
    assert_eq!(events[0].index, 1);
    assert_eq!(events[0].node, TreeNode::Resource(money));
    assert_eq!(events[0].parent(), TreeNode::Ontology(user));
}
