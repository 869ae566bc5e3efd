//! Session lifecycle and document transfer routes.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use serde::Serialize;

use super::{format, Routes};
use crate::{
    app::AppContext,
    collab::{state, Room, SessionState, StateSnapshot},
    Error, Result,
};

const FILE_FIELD: &str = "file";
const DEFAULT_FILE_NAME: &str = "upload.ttl";

/// Public description of a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub prefix: String,
    pub uri: String,
    pub state: SessionState,
    pub members: usize,
    pub websocket: String,
}

impl SessionInfo {
    async fn of(room: &Room) -> Self {
        let header = room.read(crate::editor::Editor::header).await;
        Self {
            session_id: room.id().to_string(),
            prefix: header.prefix,
            uri: header.uri,
            state: room.state().await,
            members: room.member_count(),
            websocket: "/websocket".to_string(),
        }
    }
}

fn find(ctx: &AppContext, id: &str) -> Result<Arc<Room>> {
    ctx.hub.room(id).ok_or(Error::NotFound)
}

/// Reads the `file` part of a multipart upload.
async fn file_part(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map_or_else(|| DEFAULT_FILE_NAME.to_string(), ToString::to_string);
        let bytes = field.bytes().await?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(Error::BadRequest(format!("missing multipart field `{FILE_FIELD}`")))
}

async fn snapshot(room: &Room) -> StateSnapshot {
    room.read(|editor| state::snapshot(editor.graph())).await
}

/// Creates a session.
///
/// # Errors
///
/// Fails only when the response cannot be built.
pub async fn create(State(ctx): State<AppContext>) -> Result<Response> {
    let room = ctx.hub.create_session();
    format::render()
        .status(StatusCode::CREATED)
        .json(SessionInfo::of(&room).await)
}

/// Describes a session.
///
/// # Errors
///
/// `404` when the session does not exist.
pub async fn show(State(ctx): State<AppContext>, Path(id): Path<String>) -> Result<Response> {
    let room = find(&ctx, &id)?;
    format::json(SessionInfo::of(&room).await)
}

/// Closes a session; members receive `closed`.
///
/// # Errors
///
/// `404` when the session does not exist.
pub async fn remove(State(ctx): State<AppContext>, Path(id): Path<String>) -> Result<Response> {
    if !ctx.hub.close_session(&id).await {
        return Err(Error::NotFound);
    }
    format::render().status(StatusCode::NO_CONTENT).empty()
}

/// Replaces the user ontology of a session with the uploaded `file`.
///
/// # Errors
///
/// `404` for an unknown session, `400` without a `file` part, `422` when
/// the document does not parse.
pub async fn upload(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let room = find(&ctx, &id)?;
    let (file_name, bytes) = file_part(multipart).await?;
    room.upload(&bytes, &file_name).await?;
    tracing::info!(session_id = id, file_name, "document uploaded");
    format::json(snapshot(&room).await)
}

/// Imports the uploaded `file` next to the user ontology of a session.
///
/// # Errors
///
/// `404` for an unknown session, `400` without a `file` part, `422` when
/// the document does not parse.
pub async fn import(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let room = find(&ctx, &id)?;
    let (file_name, bytes) = file_part(multipart).await?;
    room.import(&bytes, &file_name).await?;
    tracing::info!(session_id = id, file_name, "document imported");
    format::json(snapshot(&room).await)
}

/// Sends the user ontology as a Turtle attachment named `{prefix}.ttl`.
///
/// # Errors
///
/// `404` for an unknown session.
pub async fn download(State(ctx): State<AppContext>, Path(id): Path<String>) -> Result<Response> {
    let room = find(&ctx, &id)?;
    let (prefix, turtle) = room.download().await?;
    format::render()
        .attachment(&format!("{prefix}.ttl"))
        .body("text/turtle; charset=utf-8", turtle)
}

pub fn routes() -> Routes {
    Routes::new()
        .add("/sessions", post(create))
        .add("/sessions/{id}", get(show).delete(remove))
        .add("/upload/{id}", post(upload))
        .add("/import/{id}", post(import))
        .add("/download/{id}", get(download))
}
