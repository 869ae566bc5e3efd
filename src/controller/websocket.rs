//! The collaboration websocket.
//!
//! Each socket gets a reader loop feeding the hub and a writer task draining
//! the connection's outbox.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};

use super::Routes;
use crate::{app::AppContext, collab::Hub};

/// Upgrades the request and serves the socket.
pub async fn upgrade(State(ctx): State<AppContext>, ws: WebSocketUpgrade) -> Response {
    let hub = ctx.hub.clone();
    ws.on_upgrade(move |socket| serve(hub, socket))
}

async fn serve(hub: Arc<Hub>, socket: WebSocket) {
    let (connection, mut inbox) = hub.connect();
    let (mut sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(text) = inbox.recv().await {
            if let Err(err) = sender.send(Message::Text(text.into())).await {
                tracing::debug!(connection_id = %connection, err.msg = %err, "websocket write failed");
                break;
            }
        }
        if let Err(err) = sender.close().await {
            tracing::debug!(connection_id = %connection, err.msg = %err, "websocket close failed");
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => hub.handle(connection, text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(connection_id = %connection, err.msg = %err, "websocket read failed");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    hub.disconnect(connection);
    writer.abort();
}

pub fn routes() -> Routes {
    Routes::new().add("/websocket", get(upgrade))
}
