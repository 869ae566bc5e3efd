//! Session registry and connection routing.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;
use rand::{distr::Alphanumeric, Rng};
use tokio::sync::mpsc;

use super::{
    protocol::Command,
    room::{ConnectionId, Outbox, Room},
};
use crate::{config, editor::Editor, projection::TraceListener};

const SESSION_ID_LENGTH: usize = 8;

struct Connection {
    outbox: Outbox,
    room: Option<String>,
}

/// Keeps `session -> room`, `room -> connections` and
/// `connection -> room` in agreement.
pub struct Hub {
    host: String,
    settings: config::EditorConfig,
    rooms: DashMap<String, Arc<Room>>,
    connections: DashMap<ConnectionId, Connection>,
    next_connection: AtomicU64,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("host", &self.host)
            .field("rooms", &self.rooms.len())
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

impl Hub {
    #[must_use]
    pub fn new(host: impl Into<String>, settings: config::EditorConfig) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            settings,
            rooms: DashMap::new(),
            connections: DashMap::new(),
            next_connection: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Allocates a session with a fresh editor. The user ontology takes the
    /// session id as prefix and `{host}/sessions/{id}/` as uri.
    pub fn create_session(&self) -> Arc<Room> {
        let id = loop {
            let candidate: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(SESSION_ID_LENGTH)
                .map(char::from)
                .collect();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut header = self.settings.header.clone();
        header.prefix.clone_from(&id);
        header.uri = format!("{}/sessions/{id}/", self.host);
        header.fragment = String::new();

        let mut editor = Editor::new(header, self.settings.language.clone());
        editor.subscribe(TraceListener);
        for preset in &self.settings.presets {
            if let Err(err) = editor.import_preset(preset) {
                tracing::warn!(session_id = id, preset, err.msg = %err, "preset not imported");
            }
        }

        let room = Arc::new(Room::new(id.clone(), editor));
        self.rooms.insert(id.clone(), room.clone());
        tracing::info!(session_id = id, "session created");
        room
    }

    #[must_use]
    pub fn room(&self, session_id: &str) -> Option<Arc<Room>> {
        self.rooms.get(session_id).map(|room| room.value().clone())
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.rooms.len()
    }

    /// Closes a session: members receive `closed` and lose their room.
    pub async fn close_session(&self, session_id: &str) -> bool {
        let Some((_, room)) = self.rooms.remove(session_id) else {
            return false;
        };
        for connection in room.close().await {
            if let Some(mut entry) = self.connections.get_mut(&connection) {
                entry.room = None;
            }
        }
        tracing::info!(session_id, "session closed");
        true
    }

    /// Registers a connection and returns the receiving half of its outbox.
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let (outbox, inbox) = mpsc::unbounded_channel();
        self.connections.insert(id, Connection { outbox, room: None });
        tracing::debug!(connection_id = %id, "connection opened");
        (id, inbox)
    }

    /// Removes a connection from its room and forgets it.
    pub fn disconnect(&self, connection: ConnectionId) {
        self.leave(connection);
        self.connections.remove(&connection);
        tracing::debug!(connection_id = %connection, "connection closed");
    }

    /// Room currently joined by `connection`.
    #[must_use]
    pub fn room_of(&self, connection: ConnectionId) -> Option<Arc<Room>> {
        let session_id = self.connections.get(&connection)?.room.clone()?;
        self.room(&session_id)
    }

    /// Detaches `connection` from its room, if any.
    pub fn leave(&self, connection: ConnectionId) -> bool {
        let Some(session_id) = self
            .connections
            .get_mut(&connection)
            .and_then(|mut entry| entry.room.take())
        else {
            return false;
        };
        self.room(&session_id)
            .is_some_and(|room| room.leave(connection))
    }

    /// Moves `connection` into the room of `session_id`. An unknown or closed
    /// session leaves the connection where it was.
    pub async fn join(&self, connection: ConnectionId, session_id: &str) -> bool {
        let Some(room) = self.room(session_id) else {
            tracing::warn!(connection_id = %connection, session_id, "join of unknown session dropped");
            return false;
        };
        let Some(outbox) = self
            .connections
            .get(&connection)
            .map(|entry| entry.outbox.clone())
        else {
            return false;
        };

        if !room.join(connection, outbox).await {
            return false;
        }
        let previous = self
            .connections
            .get_mut(&connection)
            .and_then(|mut entry| entry.room.replace(session_id.to_string()));
        // The session may have been closed while the room was joined.
        if !self.rooms.contains_key(session_id) {
            if let Some(mut entry) = self.connections.get_mut(&connection) {
                if entry.room.as_deref() == Some(session_id) {
                    entry.room = previous.clone().filter(|previous| previous != session_id);
                }
            }
            room.leave(connection);
            tracing::debug!(connection_id = %connection, session_id, "session closed during join");
            return false;
        }
        if let Some(previous) = previous.filter(|previous| previous != session_id) {
            if let Some(room) = self.room(&previous) {
                room.leave(connection);
            }
        }
        true
    }

    /// Parses and applies one text frame of `connection`. Malformed frames and
    /// commands of connections without a room are dropped.
    pub async fn handle(&self, connection: ConnectionId, text: &str) {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(connection_id = %connection, err.msg = %err, "malformed command dropped");
                return;
            }
        };
        tracing::debug!(connection_id = %connection, method = command.method(), "command received");

        if let Command::Join { session_id } = &command {
            self.join(connection, session_id).await;
            return;
        }
        let Some(room) = self.room_of(connection) else {
            tracing::warn!(
                connection_id = %connection,
                method = command.method(),
                "command outside of a session dropped"
            );
            return;
        };
        room.apply(connection, command).await;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::Hub;
    use crate::{collab::room::SessionState, config::EditorConfig};

    fn next(inbox: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Value {
        let text = inbox.try_recv().expect("message");
        serde_json::from_str(&text).expect("json")
    }

    #[tokio::test]
    async fn sessions_get_prefix_and_uri_from_id() {
        let hub = Hub::new("http://localhost:5150/", EditorConfig::default());
        let room = hub.create_session();
        assert_eq!(room.id().len(), 8);
        assert!(room.id().chars().all(|c| c.is_ascii_alphanumeric()));
        let header = room.read(crate::editor::Editor::header).await;
        assert_eq!(header.prefix, room.id());
        assert_eq!(
            header.uri,
            format!("http://localhost:5150/sessions/{}/", room.id())
        );
        assert_eq!(room.state().await, SessionState::Created);
    }

    #[tokio::test]
    async fn rejoining_moves_the_connection() {
        let hub = Hub::new("http://localhost", EditorConfig::default());
        let first = hub.create_session();
        let second = hub.create_session();
        let (connection, mut inbox) = hub.connect();

        assert!(hub.join(connection, first.id()).await);
        assert_eq!(next(&mut inbox)["method"], "init");
        assert_eq!(first.state().await, SessionState::Active);

        assert!(hub.join(connection, second.id()).await);
        assert!(!first.is_member(connection));
        assert!(second.is_member(connection));
        assert_eq!(hub.room_of(connection).map(|room| room.id().to_string()), Some(second.id().to_string()));

        hub.disconnect(connection);
        assert_eq!(second.member_count(), 0);
        assert!(hub.room_of(connection).is_none());
    }

    #[tokio::test]
    async fn unknown_session_and_malformed_frames_are_dropped() {
        let hub = Hub::new("http://localhost", EditorConfig::default());
        let (connection, mut inbox) = hub.connect();
        hub.handle(connection, r#"{"method":"join","sessionId":"nope"}"#).await;
        hub.handle(connection, "{").await;
        hub.handle(connection, r#"{"method":"setOntologyPrefix","value":"x"}"#).await;
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn closing_notifies_members() {
        let hub = Hub::new("http://localhost", EditorConfig::default());
        let room = hub.create_session();
        let (connection, mut inbox) = hub.connect();
        hub.join(connection, room.id()).await;
        let _ = next(&mut inbox);

        assert!(hub.close_session(room.id()).await);
        assert_eq!(next(&mut inbox)["method"], "closed");
        assert!(hub.room_of(connection).is_none());
        assert!(!hub.close_session(room.id()).await);
        assert_eq!(room.state().await, SessionState::Closed);
    }

    #[tokio::test]
    async fn closed_sessions_cannot_be_joined() {
        let hub = Hub::new("http://localhost", EditorConfig::default());
        let kept = hub.create_session();
        let closed = hub.create_session();
        let (connection, mut inbox) = hub.connect();
        assert!(hub.join(connection, kept.id()).await);
        let _ = next(&mut inbox);

        assert!(hub.close_session(closed.id()).await);
        assert!(!hub.join(connection, closed.id()).await);
        let outbox = hub
            .connections
            .get(&connection)
            .map(|entry| entry.outbox.clone())
            .expect("connection");
        assert!(!closed.join(connection, outbox).await);
        assert!(!closed.is_member(connection));
        assert!(kept.is_member(connection));
        assert_eq!(
            hub.room_of(connection).map(|room| room.id().to_string()),
            Some(kept.id().to_string())
        );
        assert!(inbox.try_recv().is_err());
    }
}
