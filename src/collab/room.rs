//! A session room: one shared editor and the connections watching it.

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use super::{
    protocol::{Command, IdentityRef, ServerMessage},
    state,
};
use crate::{
    editor::{Editor, HeaderField},
    ontology::{CodecError, NodeRef, OntologyId, ResourceId},
};

/// Sending half of a connection's outgoing frames.
pub type Outbox = mpsc::UnboundedSender<String>;

/// Identity of one websocket connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(pub(crate) u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Allocated, nobody joined yet.
    Created,
    Active,
    Closed,
}

struct Shared {
    editor: Editor,
    state: SessionState,
}

/// One collaborative document. The editor lock is held for the whole
/// mutation and the broadcast that follows it, so every member sees the
/// commands of the room in the same order.
pub struct Room {
    id: String,
    shared: Mutex<Shared>,
    members: DashMap<ConnectionId, Outbox>,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<String>, editor: Editor) -> Self {
        Self {
            id: id.into(),
            shared: Mutex::new(Shared {
                editor,
                state: SessionState::Created,
            }),
            members: DashMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn state(&self) -> SessionState {
        self.shared.lock().await.state
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_member(&self, connection: ConnectionId) -> bool {
        self.members.contains_key(&connection)
    }

    /// Runs `f` on the editor under the room lock.
    pub async fn read<R>(&self, f: impl FnOnce(&Editor) -> R) -> R {
        let shared = self.shared.lock().await;
        f(&shared.editor)
    }

    /// Adds a connection and sends it the full state. A closed room refuses
    /// new members.
    pub async fn join(&self, connection: ConnectionId, outbox: Outbox) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.state == SessionState::Closed {
            return false;
        }
        shared.state = SessionState::Active;
        let init = ServerMessage::Init {
            state: state::snapshot(shared.editor.graph()),
        };
        send(&outbox, &init);
        self.members.insert(connection, outbox);
        tracing::debug!(session_id = self.id, connection_id = %connection, "joined session");
        true
    }

    pub fn leave(&self, connection: ConnectionId) -> bool {
        self.members.remove(&connection).is_some()
    }

    /// Marks the room closed, notifies every member and returns them.
    pub async fn close(&self) -> Vec<ConnectionId> {
        let mut shared = self.shared.lock().await;
        shared.state = SessionState::Closed;
        self.broadcast(&ServerMessage::Closed);
        let members: Vec<ConnectionId> = self.members.iter().map(|entry| *entry.key()).collect();
        self.members.clear();
        members
    }

    /// Replaces the user ontology with an uploaded document.
    ///
    /// # Errors
    ///
    /// Returns the codec error; the document stays as it was.
    pub async fn upload(&self, bytes: &[u8], file_name: &str) -> Result<OntologyId, CodecError> {
        let mut shared = self.shared.lock().await;
        let id = shared.editor.upload(bytes, file_name)?;
        self.broadcast_state(&shared.editor);
        Ok(id)
    }

    /// Imports a document next to the user ontology.
    ///
    /// # Errors
    ///
    /// Returns the codec error; nothing is imported.
    pub async fn import(&self, bytes: &[u8], file_name: &str) -> Result<OntologyId, CodecError> {
        let mut shared = self.shared.lock().await;
        let id = shared.editor.import(bytes, file_name)?;
        self.broadcast_state(&shared.editor);
        Ok(id)
    }

    /// Serializes the user ontology, returning its prefix and the Turtle text.
    ///
    /// # Errors
    ///
    /// Fails when a term cannot be written as Turtle.
    pub async fn download(&self) -> Result<(String, String), CodecError> {
        let shared = self.shared.lock().await;
        let turtle = shared.editor.to_turtle()?;
        Ok((shared.editor.header().prefix, turtle))
    }

    /// Applies one command on behalf of `origin` and notifies the room.
    pub async fn apply(&self, origin: ConnectionId, command: Command) {
        let method = command.method();
        let mut shared = self.shared.lock().await;
        if shared.state == SessionState::Closed {
            tracing::debug!(session_id = self.id, method, "command on closed session dropped");
            return;
        }
        let editor = &mut shared.editor;

        match command {
            Command::Join { .. } => {
                tracing::debug!(session_id = self.id, "join reached the room");
            }
            Command::SetOntologyUri { value } => self.header(editor, HeaderField::Uri, value),
            Command::SetOntologyPrefix { value } => {
                self.header(editor, HeaderField::Prefix, value);
            }
            Command::CreateResource { resource } => {
                let draft = resource.into_draft(|identity| resource_of(editor, identity));
                match editor.create_resource(draft) {
                    Ok(Some(id)) => self.created(origin, editor, id),
                    Ok(None) => tracing::debug!(session_id = self.id, "resource not created"),
                    Err(err) => {
                        tracing::warn!(session_id = self.id, method, err.msg = %err, "command failed");
                    }
                }
            }
            Command::CreateInstance { class_identity } => {
                let Some(class) = resource_of(editor, class_identity) else {
                    return;
                };
                match editor.create_instance(class) {
                    Ok(id) => self.created(origin, editor, id),
                    Err(err) => {
                        tracing::warn!(session_id = self.id, method, err.msg = %err, "command failed");
                    }
                }
            }
            Command::ChangeResource {
                identity,
                field,
                lang,
                value,
            } => {
                if let Some(id) = resource_of(editor, identity) {
                    if editor.change_resource(id, field, &lang, value) {
                        self.broadcast_state(editor);
                    }
                }
            }
            Command::RemoveResource { identity } => {
                let removed = editor.resolve(identity).is_some_and(|node| editor.remove(node));
                if removed {
                    self.broadcast(&ServerMessage::Removed {
                        resource: IdentityRef { identity },
                    });
                    self.broadcast_state(editor);
                }
            }
            Command::DragAndDrop {
                source_view,
                source_identity,
                target_view,
                target_identity,
                modifier,
            } => {
                match editor.drag_and_drop_identities(
                    source_view,
                    source_identity,
                    target_view,
                    target_identity,
                    modifier,
                ) {
                    Ok(_) => self.broadcast_state(editor),
                    Err(err) => {
                        tracing::warn!(session_id = self.id, method, err.msg = %err, "command failed");
                    }
                }
            }
            Command::Reset { field, identity } => {
                if let Some(id) = resource_of(editor, identity) {
                    if editor.reset(field, id) {
                        self.broadcast_state(editor);
                    }
                }
            }
            Command::ImportPreset { name } => match editor.import_preset(&name) {
                Ok(_) => self.broadcast_state(editor),
                Err(err) => {
                    tracing::warn!(session_id = self.id, method, err.msg = %err, "command failed");
                }
            },
            Command::AddLink {
                property,
                subject,
                object,
            } => self.link(editor, true, [property, subject, object]),
            Command::RemoveLink {
                property,
                subject,
                object,
            } => self.link(editor, false, [property, subject, object]),
        }
    }

    fn link(&self, editor: &mut Editor, adding: bool, identities: [u64; 3]) {
        let [Some(property), Some(subject), Some(object)] =
            identities.map(|identity| resource_of(editor, identity))
        else {
            return;
        };
        let result = if adding {
            editor.add_link(property, subject, object)
        } else {
            editor.remove_link(property, subject, object)
        };
        match result {
            Ok(true) => self.broadcast_state(editor),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(session_id = self.id, adding, err.msg = %err, "link command failed");
            }
        }
    }

    fn created(&self, origin: ConnectionId, editor: &Editor, id: ResourceId) {
        if let Some(resource) = state::describe(editor.graph(), id) {
            if let Some(outbox) = self.members.get(&origin) {
                send(outbox.value(), &ServerMessage::Created { resource });
            }
        }
        self.broadcast_state(editor);
    }

    fn header(&self, editor: &mut Editor, field: HeaderField, value: String) {
        match editor.set_header(field, value) {
            Ok(()) => self.broadcast_header(editor),
            Err(err) => {
                tracing::warn!(session_id = self.id, ?field, err.msg = %err, "header edit rejected");
            }
        }
    }

    fn broadcast_header(&self, editor: &Editor) {
        let header = editor.header();
        self.broadcast(&ServerMessage::Ontology {
            prefix: header.prefix,
            uri: header.uri,
        });
    }

    fn broadcast_state(&self, editor: &Editor) {
        self.broadcast(&ServerMessage::Init {
            state: state::snapshot(editor.graph()),
        });
    }

    fn broadcast(&self, message: &ServerMessage) {
        let text = match message.to_text() {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(session_id = self.id, err.msg = %err, "could not serialize message");
                return;
            }
        };
        for member in self.members.iter() {
            if member.value().send(text.clone()).is_err() {
                tracing::debug!(session_id = self.id, connection_id = %member.key(), "member outbox closed");
            }
        }
    }
}

fn resource_of(editor: &Editor, identity: u64) -> Option<ResourceId> {
    editor.resolve(identity).and_then(NodeRef::as_resource)
}

fn send(outbox: &Outbox, message: &ServerMessage) {
    match message.to_text() {
        Ok(text) => {
            if outbox.send(text).is_err() {
                tracing::debug!("outbox closed");
            }
        }
        Err(err) => tracing::error!(err.msg = %err, "could not serialize message"),
    }
}
