//! Wire messages of the collaboration websocket.
//!
//! Every frame is a JSON object whose `method` field names the command (client
//! to server) or the notification (server to client).

use serde::{Deserialize, Serialize};

use crate::{
    editor::{ResetField, ResourceDraft, ResourceField},
    ontology::{LangString, ResourceKind},
    projection::View,
};

/// A command sent by a client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Join {
        session_id: String,
    },
    SetOntologyUri {
        value: String,
    },
    SetOntologyPrefix {
        value: String,
    },
    CreateResource {
        resource: ResourceInput,
    },
    ChangeResource {
        identity: u64,
        field: ResourceField,
        #[serde(default)]
        lang: String,
        value: String,
    },
    RemoveResource {
        identity: u64,
    },
    DragAndDrop {
        source_view: View,
        source_identity: u64,
        target_view: View,
        target_identity: u64,
        #[serde(default)]
        modifier: bool,
    },
    Reset {
        field: ResetField,
        identity: u64,
    },
    ImportPreset {
        #[serde(alias = "preset")]
        name: String,
    },
    CreateInstance {
        class_identity: u64,
    },
    AddLink {
        property: u64,
        subject: u64,
        object: u64,
    },
    RemoveLink {
        property: u64,
        subject: u64,
        object: u64,
    },
}

impl Command {
    /// Parses one text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for an unparsable envelope, an unknown method
    /// or a missing field.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// The wire method name, for logging.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::SetOntologyUri { .. } => "setOntologyUri",
            Self::SetOntologyPrefix { .. } => "setOntologyPrefix",
            Self::CreateResource { .. } => "createResource",
            Self::ChangeResource { .. } => "changeResource",
            Self::RemoveResource { .. } => "removeResource",
            Self::DragAndDrop { .. } => "dragAndDrop",
            Self::Reset { .. } => "reset",
            Self::ImportPreset { .. } => "importPreset",
            Self::CreateInstance { .. } => "createInstance",
            Self::AddLink { .. } => "addLink",
            Self::RemoveLink { .. } => "removeLink",
        }
    }
}

/// The resource descriptor of a `createResource` command.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInput {
    #[serde(alias = "type")]
    pub kind: ResourceKind,
    /// Derived from the label when blank.
    #[serde(default, alias = "localname")]
    pub local_name: String,
    #[serde(default)]
    pub label: LangString,
    #[serde(default)]
    pub comment: LangString,
    /// Owning class when `kind` is `Instance`.
    #[serde(default)]
    pub class_identity: Option<u64>,
}

impl ResourceInput {
    /// Converts the input into a draft, resolving the owning class with
    /// `class`.
    pub fn into_draft(
        self,
        class: impl FnOnce(u64) -> Option<crate::ontology::ResourceId>,
    ) -> ResourceDraft {
        let owner = self.class_identity.and_then(class);
        let mut draft = ResourceDraft::new(self.kind, self.local_name);
        draft.label = self.label;
        draft.comment = self.comment;
        draft.class = owner;
        draft
    }
}

/// A notification sent by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum ServerMessage {
    Init { state: StateSnapshot },
    Created { resource: ResourceDescriptor },
    Removed { resource: IdentityRef },
    Ontology { prefix: String, uri: String },
    Closed,
}

impl ServerMessage {
    /// Renders the message as one text frame.
    ///
    /// # Errors
    ///
    /// Fails only when a value cannot be represented as JSON.
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRef {
    pub identity: u64,
}

/// Full state of a document: every loaded ontology, the user ontology first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub ontologies: Vec<OntologyState>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyState {
    pub uri: String,
    pub prefix: String,
    pub identity: u64,
    pub index: usize,
    pub is_user: bool,
    pub classes: Forest,
    pub properties: Forest,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Forest {
    pub children: Vec<ResourceDescriptor>,
}

/// Serialized resource. `parent`, `domain` and `range` are shallow; only
/// `children` nests recursively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub identity: u64,
    pub kind: ResourceKind,
    pub imported: bool,
    pub owner_ontology_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub local_name: String,
    pub label: LangString,
    pub comment: LangString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<ResourceDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Box<ResourceDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Box<ResourceDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_of: Option<u64>,
    pub children: Vec<ResourceDescriptor>,
    /// Instances of a class, listed with the nesting children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<ResourceDescriptor>,
    /// Assertions of a property.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDescriptor>,
}

/// Serialized `subject property object` assertion. `value` carries the
/// lexical form when the object is a literal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDescriptor {
    pub subject: u64,
    pub object: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Command, ServerMessage};
    use crate::{editor::ResourceField, ontology::ResourceKind, projection::View};

    #[test]
    fn parses_drag_and_drop() {
        let command = Command::parse(
            r#"{"method":"dragAndDrop","sourceView":"Domain","sourceIdentity":3,"targetView":"Range","targetIdentity":4}"#,
        )
        .expect("command");
        assert_eq!(
            command,
            Command::DragAndDrop {
                source_view: View::Domain,
                source_identity: 3,
                target_view: View::Range,
                target_identity: 4,
                modifier: false,
            }
        );
    }

    #[test]
    fn accepts_legacy_field_names() {
        let command = Command::parse(
            r#"{"method":"createResource","resource":{"type":"Class","localname":"Vehicle","label":{"en":"Vehicle"}}}"#,
        )
        .expect("command");
        let Command::CreateResource { resource } = command else {
            panic!("expected createResource");
        };
        assert_eq!(resource.kind, ResourceKind::Class);
        assert_eq!(resource.local_name, "Vehicle");
        assert_eq!(resource.label.get("en"), Some("Vehicle"));

        let command = Command::parse(
            r#"{"method":"changeResource","identity":9,"field":"localname","value":"Car"}"#,
        )
        .expect("command");
        assert!(matches!(
            command,
            Command::ChangeResource { field: ResourceField::LocalName, ref lang, .. } if lang.is_empty()
        ));

        let command = Command::parse(
            r#"{"method":"createResource","resource":{"kind":"Property","label":{"en":"has part"}}}"#,
        )
        .expect("command");
        assert!(matches!(
            command,
            Command::CreateResource { ref resource } if resource.local_name.is_empty()
        ));

        let command = Command::parse(r#"{"method":"importPreset","preset":"foaf"}"#).expect("command");
        assert_eq!(command, Command::ImportPreset { name: "foaf".to_string() });
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"sessionId":"abc"}"#)]
    #[case(r#"{"method":"teleport"}"#)]
    #[case(r#"{"method":"join"}"#)]
    #[case(r#"{"method":"reset","field":"Label","identity":1}"#)]
    fn rejects_malformed_commands(#[case] text: &str) {
        assert!(Command::parse(text).is_err());
    }

    #[test]
    fn renders_server_envelopes() {
        let text = ServerMessage::Ontology {
            prefix: "ex".to_string(),
            uri: "http://example.com/ex".to_string(),
        }
        .to_text()
        .expect("json");
        assert_eq!(
            text,
            r#"{"method":"ontology","prefix":"ex","uri":"http://example.com/ex"}"#
        );
        assert_eq!(
            ServerMessage::Closed.to_text().expect("json"),
            r#"{"method":"closed"}"#
        );
    }
}
