use rdfs_studio::{
    collab::{ConnectionId, Hub},
    config::EditorConfig,
};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;

fn next(inbox: &mut UnboundedReceiver<String>) -> Value {
    let text = inbox.try_recv().expect("pending message");
    serde_json::from_str(&text).expect("json message")
}

fn drain(inbox: &mut UnboundedReceiver<String>) {
    while inbox.try_recv().is_ok() {}
}

/// Local names of the root classes of the user ontology in an `init` message.
fn root_classes(message: &Value) -> Vec<String> {
    assert_eq!(message["method"], "init");
    let ontologies = message["state"]["ontologies"]
        .as_array()
        .expect("ontologies");
    let user = ontologies
        .iter()
        .find(|ontology| ontology["isUser"] == true)
        .expect("user ontology");
    user["classes"]["children"]
        .as_array()
        .expect("children")
        .iter()
        .map(|child| child["localName"].as_str().expect("local name").to_string())
        .collect()
}

/// The most recent pending message, dropping the ones before it.
fn last(inbox: &mut UnboundedReceiver<String>) -> Value {
    let mut latest = None;
    while let Ok(text) = inbox.try_recv() {
        latest = Some(text);
    }
    serde_json::from_str(&latest.expect("pending message")).expect("json message")
}

fn user_ontology(message: &Value) -> &Value {
    assert_eq!(message["method"], "init");
    message["state"]["ontologies"]
        .as_array()
        .and_then(|ontologies| ontologies.iter().find(|ontology| ontology["isUser"] == true))
        .expect("user ontology")
}

/// A root resource of the user ontology by local name.
fn root<'a>(message: &'a Value, tree: &str, local_name: &str) -> &'a Value {
    user_ontology(message)[tree]["children"]
        .as_array()
        .and_then(|children| children.iter().find(|child| child["localName"] == local_name))
        .unwrap_or_else(|| panic!("missing {local_name} in {tree}"))
}

fn identities(values: &Value) -> Vec<u64> {
    values
        .as_array()
        .map(|values| values.iter().filter_map(|value| value["identity"].as_u64()).collect())
        .unwrap_or_default()
}

fn links(property: &Value) -> Vec<(u64, u64)> {
    property["links"]
        .as_array()
        .map(|links| {
            links
                .iter()
                .filter_map(|link| Some((link["subject"].as_u64()?, link["object"].as_u64()?)))
                .collect()
        })
        .unwrap_or_default()
}

async fn send(hub: &Hub, connection: ConnectionId, message: Value) {
    hub.handle(connection, &message.to_string()).await;
}

/// Sends a creating command and returns the identity announced to the author.
async fn create(
    hub: &Hub,
    connection: ConnectionId,
    inbox: &mut UnboundedReceiver<String>,
    message: Value,
) -> u64 {
    send(hub, connection, message).await;
    let created = next(inbox);
    assert_eq!(created["method"], "created");
    drain(inbox);
    created["resource"]["identity"].as_u64().expect("identity")
}

#[tokio::test]
async fn every_member_sees_every_change() {
    let hub = Hub::new("http://localhost:5150", EditorConfig::default());
    let room = hub.create_session();
    let (alice, mut alice_inbox) = hub.connect();
    let (bob, mut bob_inbox) = hub.connect();

    for connection in [alice, bob] {
        send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;
    }
    assert!(root_classes(&next(&mut alice_inbox)).is_empty());
    assert!(root_classes(&next(&mut bob_inbox)).is_empty());

    send(
        &hub,
        alice,
        json!({
            "method": "createResource",
            "resource": {"kind": "Class", "localName": "Vehicle", "label": {"en": "Vehicle"}}
        }),
    )
    .await;

    let created = next(&mut alice_inbox);
    assert_eq!(created["method"], "created");
    assert_eq!(created["resource"]["localName"], "Vehicle");
    let identity = created["resource"]["identity"].as_u64().expect("identity");
    assert_eq!(root_classes(&next(&mut alice_inbox)), vec!["Vehicle"]);

    // Only the author is told about the creation itself.
    assert_eq!(root_classes(&next(&mut bob_inbox)), vec!["Vehicle"]);
    assert!(bob_inbox.try_recv().is_err());

    send(
        &hub,
        bob,
        json!({"method": "removeResource", "identity": identity}),
    )
    .await;
    for inbox in [&mut alice_inbox, &mut bob_inbox] {
        let removed = next(inbox);
        assert_eq!(removed["method"], "removed");
        assert_eq!(removed["resource"]["identity"], identity);
        assert!(root_classes(&next(inbox)).is_empty());
    }
}

#[tokio::test]
async fn drag_and_drop_is_broadcast_as_full_state() {
    let hub = Hub::new("http://localhost:5150", EditorConfig::default());
    let room = hub.create_session();
    let (connection, mut inbox) = hub.connect();
    send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;
    drain(&mut inbox);

    let mut identities = Vec::new();
    for name in ["Vehicle", "Car"] {
        send(
            &hub,
            connection,
            json!({"method": "createResource", "resource": {"type": "Class", "localname": name}}),
        )
        .await;
        let created = next(&mut inbox);
        identities.push(created["resource"]["identity"].as_u64().expect("identity"));
        drain(&mut inbox);
    }

    send(
        &hub,
        connection,
        json!({
            "method": "dragAndDrop",
            "sourceView": "Domain",
            "sourceIdentity": identities[1],
            "targetView": "Domain",
            "targetIdentity": identities[0],
        }),
    )
    .await;
    let state = next(&mut inbox);
    assert_eq!(root_classes(&state), vec!["Vehicle"]);
    let user = state["state"]["ontologies"]
        .as_array()
        .and_then(|ontologies| ontologies.iter().find(|ontology| ontology["isUser"] == true))
        .expect("user ontology");
    let nested = &user["classes"]["children"][0]["children"][0];
    assert_eq!(nested["localName"], "Car");
    assert_eq!(nested["parent"]["identity"], identities[0]);
}

#[tokio::test]
async fn header_edits_reach_the_whole_room() {
    let hub = Hub::new("http://localhost:5150", EditorConfig::default());
    let room = hub.create_session();
    let (alice, mut alice_inbox) = hub.connect();
    let (bob, mut bob_inbox) = hub.connect();
    for connection in [alice, bob] {
        send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;
    }
    drain(&mut alice_inbox);
    drain(&mut bob_inbox);

    send(&hub, alice, json!({"method": "setOntologyPrefix", "value": "cars"})).await;
    for inbox in [&mut alice_inbox, &mut bob_inbox] {
        let message = next(inbox);
        assert_eq!(message["method"], "ontology");
        assert_eq!(message["prefix"], "cars");
    }
    let (prefix, turtle) = room.download().await.expect("download");
    assert_eq!(prefix, "cars");
    assert!(turtle.contains("@prefix cars:"));
}

#[tokio::test]
async fn configured_presets_are_loaded_into_new_sessions() {
    let settings = EditorConfig {
        presets: vec!["xsd".to_string()],
        ..EditorConfig::default()
    };
    let hub = Hub::new("http://localhost:5150", settings);
    let room = hub.create_session();
    let (connection, mut inbox) = hub.connect();
    send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;

    let init = next(&mut inbox);
    let prefixes: Vec<&str> = init["state"]["ontologies"]
        .as_array()
        .expect("ontologies")
        .iter()
        .filter_map(|ontology| ontology["prefix"].as_str())
        .collect();
    assert!(prefixes.contains(&"xsd"), "{prefixes:?}");
    assert!(prefixes.contains(&room.id()));
}

#[tokio::test]
async fn instances_and_links_reach_every_member() {
    let hub = Hub::new("http://localhost:5150", EditorConfig::default());
    let room = hub.create_session();
    let (alice, mut alice_inbox) = hub.connect();
    let (bob, mut bob_inbox) = hub.connect();
    for connection in [alice, bob] {
        send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;
    }
    drain(&mut alice_inbox);

    let person = create(
        &hub,
        alice,
        &mut alice_inbox,
        json!({"method": "createResource", "resource": {"kind": "Class", "label": {"en": "person"}}}),
    )
    .await;
    let mut properties = Vec::new();
    for name in ["knows", "mentors"] {
        let message = json!({"method": "createResource", "resource": {"kind": "Property", "localName": name}});
        properties.push(create(&hub, alice, &mut alice_inbox, message).await);
    }
    let [knows, mentors] = properties[..] else {
        panic!("two properties");
    };
    let mut people = Vec::new();
    for _ in 0..3 {
        let message = json!({"method": "createInstance", "classIdentity": person});
        people.push(create(&hub, alice, &mut alice_inbox, message).await);
    }
    let [ada, bea, cy] = people[..] else {
        panic!("three instances");
    };

    let state = last(&mut bob_inbox);
    let class = root(&state, "classes", "Person");
    assert_eq!(class["label"]["en"], "person");
    let mut seen = identities(&class["instances"]);
    seen.sort_unstable();
    let mut expected = people.clone();
    expected.sort_unstable();
    assert_eq!(seen, expected);
    assert_eq!(class["instances"][0]["kind"], "Instance");

    for (property, subject, object) in [(knows, ada, bea), (mentors, cy, ada), (knows, bea, cy)] {
        send(
            &hub,
            alice,
            json!({"method": "addLink", "property": property, "subject": subject, "object": object}),
        )
        .await;
    }
    let state = last(&mut bob_inbox);
    let mut known = links(root(&state, "properties", "knows"));
    known.sort_unstable();
    assert_eq!(known, vec![(ada, bea), (bea, cy)]);
    assert_eq!(links(root(&state, "properties", "mentors")), vec![(cy, ada)]);

    send(
        &hub,
        bob,
        json!({"method": "removeLink", "property": knows, "subject": bea, "object": cy}),
    )
    .await;
    let state = last(&mut alice_inbox);
    assert_eq!(links(root(&state, "properties", "knows")), vec![(ada, bea)]);
    drain(&mut bob_inbox);

    // Removing an instance drops it from its class and from every link.
    send(&hub, bob, json!({"method": "removeResource", "identity": ada})).await;
    let removed = next(&mut alice_inbox);
    assert_eq!(removed["method"], "removed");
    assert_eq!(removed["resource"]["identity"], ada);
    let state = next(&mut alice_inbox);
    let remaining = identities(&root(&state, "classes", "Person")["instances"]);
    assert_eq!(remaining.len(), 2);
    assert!(!remaining.contains(&ada));
    let knows_state = root(&state, "properties", "knows");
    let mentors_state = root(&state, "properties", "mentors");
    assert!(knows_state.get("links").is_none());
    assert!(mentors_state.get("links").is_none());
    assert_eq!(last(&mut bob_inbox), state);
}

#[tokio::test]
async fn imported_vocabularies_are_read_only() {
    let hub = Hub::new("http://localhost:5150", EditorConfig::default());
    let room = hub.create_session();
    let (connection, mut inbox) = hub.connect();
    send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;
    send(&hub, connection, json!({"method": "importPreset", "name": "foaf"})).await;
    let state = last(&mut inbox);
    let foaf = state["state"]["ontologies"]
        .as_array()
        .and_then(|ontologies| ontologies.iter().find(|ontology| ontology["prefix"] == "foaf"))
        .expect("foaf");
    let agent = foaf["classes"]["children"]
        .as_array()
        .and_then(|children| children.iter().find(|child| child["localName"] == "Agent"))
        .and_then(|agent| agent["identity"].as_u64())
        .expect("foaf:Agent");

    send(
        &hub,
        connection,
        json!({"method": "changeResource", "identity": agent, "field": "localName", "value": "Robot"}),
    )
    .await;
    send(&hub, connection, json!({"method": "removeResource", "identity": agent})).await;
    assert!(inbox.try_recv().is_err());

    room.read(|editor| {
        let graph = editor.graph();
        let person = graph
            .find_by_uri("http://xmlns.com/foaf/0.1/Person")
            .expect("foaf:Person");
        let parent = graph.resource(person).and_then(|person| person.parent());
        assert_eq!(parent.map(|id| id.get()), Some(agent));
        assert!(graph.find_by_uri("http://xmlns.com/foaf/0.1/Agent").is_some());
    })
    .await;
}

#[tokio::test]
async fn invalid_namespaces_are_not_applied() {
    let hub = Hub::new("http://localhost:5150", EditorConfig::default());
    let room = hub.create_session();
    let (connection, mut inbox) = hub.connect();
    send(&hub, connection, json!({"method": "join", "sessionId": room.id()})).await;
    drain(&mut inbox);

    send(&hub, connection, json!({"method": "setOntologyUri", "value": "no scheme here"})).await;
    assert!(inbox.try_recv().is_err());

    send(&hub, connection, json!({"method": "setOntologyUri", "value": "http://example.org/cars#"})).await;
    let message = next(&mut inbox);
    assert_eq!(message["method"], "ontology");
    assert_eq!(message["uri"], "http://example.org/cars#");
}
