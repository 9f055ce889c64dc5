//! Real-time notifications.
//!
//! Clients open a WebSocket on `/api/ws` with their access token. Each connection is joined to the room of the user
//! that owns the token (`user_<id>`). The engine publishes events when orders and memberships change; the hooks built
//! by [`notification_hooks`] turn those events into [`Notification`]s and the [`NotificationHub`] pushes them to every
//! connection in the recipient's room as `{"event":"notification","data":"<message>"}`.
//!
//! Delivery is best-effort. A user with no open connection simply misses the message.
use std::{collections::HashMap, sync::Arc};

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::future::FutureExt;
use log::*;
use mini_order_engine::events::{user_channel, EventHooks, Notification};
use serde::{Deserialize, Serialize};
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    Mutex,
};

use crate::{
    auth::{JwtClaims, Role},
    errors::ServerError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsFrame {
    pub event: String,
    pub data: serde_json::Value,
}

impl WsFrame {
    pub fn new<S: Into<String>>(event: &str, data: S) -> Self {
        Self { event: event.to_string(), data: serde_json::Value::String(data.into()) }
    }

    pub fn notification<S: Into<String>>(message: S) -> Self {
        Self::new("notification", message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new("error", message)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            error!("🔌️ Could not serialize a websocket frame. {e}");
            String::from(r#"{"event":"error","data":"internal error"}"#)
        })
    }
}

/// Tracks the open WebSocket connections of every room.
#[derive(Default)]
pub struct NotificationHub {
    rooms: Mutex<HashMap<String, Vec<UnboundedSender<String>>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection in `room`. Frames for the room arrive on the returned receiver.
    /// Connections in the room that have gone away are pruned first.
    pub async fn join(&self, room: &str) -> UnboundedReceiver<String> {
        let (sender, receiver) = unbounded_channel();
        let mut rooms = self.rooms.lock().await;
        let senders = rooms.entry(room.to_string()).or_default();
        senders.retain(|s| !s.is_closed());
        senders.push(sender);
        receiver
    }

    /// Drops the closed connections of `room`, and the room itself once nobody is left in it.
    pub async fn prune(&self, room: &str) {
        let mut rooms = self.rooms.lock().await;
        let Some(senders) = rooms.get_mut(room) else {
            return;
        };
        senders.retain(|s| !s.is_closed());
        if senders.is_empty() {
            rooms.remove(room);
            trace!("🔌️ Room {room} is empty and has been removed");
        }
    }

    /// Sends the notification to every live connection in the recipient's room and returns how many were reached.
    /// Connections that have gone away are pruned here.
    pub async fn deliver(&self, notification: &Notification) -> usize {
        let room = notification.channel();
        let frame = WsFrame::notification(notification.message.clone()).to_json();
        let mut rooms = self.rooms.lock().await;
        let Some(senders) = rooms.get_mut(&room) else {
            debug!("🔌️ Nobody is listening on {room}. Notification dropped.");
            return 0;
        };
        senders.retain(|s| s.send(frame.clone()).is_ok());
        let reached = senders.len();
        if senders.is_empty() {
            rooms.remove(&room);
        }
        trace!("🔌️ Notification delivered to {reached} connection(s) in {room}");
        reached
    }

    pub async fn connection_count(&self, room: &str) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(|s| s.iter().filter(|s| !s.is_closed()).count()).unwrap_or(0)
    }
}

async fn deliver_all(hub: Arc<NotificationHub>, notifications: Vec<Notification>) {
    for n in notifications {
        hub.deliver(&n).await;
    }
}

/// Event hooks that forward order and membership notifications to the hub. Verification codes are only logged; sending
/// email is left to a deployment-specific hook.
pub fn notification_hooks(hub: Arc<NotificationHub>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let h = Arc::clone(&hub);
    hooks.on_order_created(move |ev| deliver_all(Arc::clone(&h), ev.notifications()).boxed());
    let h = Arc::clone(&hub);
    hooks.on_order_status_changed(move |ev| deliver_all(Arc::clone(&h), ev.notifications()).boxed());
    let h = Arc::clone(&hub);
    hooks.on_membership_updated(move |ev| deliver_all(Arc::clone(&h), ev.notifications()).boxed());
    hooks.on_verification_code(|ev| {
        async move {
            info!("📬️ A {} verification code was issued for {}", ev.purpose, ev.email);
        }
        .boxed()
    });
    hooks
}

/// Answers a frame sent by the client. Joining one's own room is acknowledged; anything else is refused.
pub fn handle_client_frame(text: &str, room: &str) -> WsFrame {
    let frame = match serde_json::from_str::<WsFrame>(text) {
        Ok(f) => f,
        Err(e) => return WsFrame::error(format!("Invalid message. {e}")),
    };
    match (frame.event.as_str(), frame.data.as_str()) {
        ("join", Some(r)) if r == room => WsFrame::new("joined", room),
        ("join", _) => WsFrame::error("You can only join your own room"),
        (other, _) => WsFrame::error(format!("Unknown event: {other}")),
    }
}

crate::route!(notification_socket => Get "/ws" requires [Role::User]);
pub async fn notification_socket(
    req: HttpRequest,
    body: web::Payload,
    claims: JwtClaims,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    let (response, session, stream) =
        actix_ws::handle(&req, body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let room = user_channel(claims.sub);
    let outbox = hub.join(&room).await;
    info!("🔌️ New websocket connection for {room}");
    actix_web::rt::spawn(run_session(session, stream, room, outbox, hub));
    Ok(response)
}

async fn run_session(
    mut session: Session,
    mut stream: MessageStream,
    room: String,
    mut outbox: UnboundedReceiver<String>,
    hub: web::Data<NotificationHub>,
) {
    let mut close_reason = None;
    loop {
        tokio::select! {
            msg = stream.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_client_frame(&text, &room);
                    if session.text(reply.to_json()).await.is_err() {
                        break;
                    }
                },
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                },
                Some(Ok(Message::Close(reason))) => {
                    debug!("🔌️ Client in {room} closed the connection");
                    close_reason = reason;
                    break;
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    warn!("🔌️ Websocket protocol error in {room}. {e}");
                    break;
                },
                None => break,
            },
            frame = outbox.recv() => match frame {
                Some(frame) => {
                    if session.text(frame).await.is_err() {
                        break;
                    }
                },
                None => break,
            },
        }
    }
    debug!("🔌️ Websocket session for {room} ended");
    drop(outbox);
    hub.prune(&room).await;
    let _ = session.close(close_reason).await;
}
