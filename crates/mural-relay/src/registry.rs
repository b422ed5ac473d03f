//! Live sessions per role.
//!
//! Each connected socket is represented by its [`SessionId`] and an
//! [`Outbox`], the sending half of the queue its writer task drains.
//! Sessions are kept per role in registration order. A broadcast walks
//! that list in order and keeps going when one send fails.
//!
//! Outboxes are bounded by [`OUTBOX_CAPACITY`]. A session whose queue is
//! full or closed when a message is offered is dropped from the registry;
//! dropping its outbox ends the writer task, which closes the socket.

use mural_types::{Role, ServerMessage, SessionId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

/// Messages queued for one session before it is considered stalled.
pub const OUTBOX_CAPACITY: usize = 256;

/// Sending half of a session's outbound queue.
pub type Outbox = mpsc::Sender<ServerMessage>;

/// A fresh outbox and the receiver its writer task drains.
pub fn outbox() -> (Outbox, mpsc::Receiver<ServerMessage>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Sessions the message was queued for.
    pub delivered: usize,
    /// Sessions dropped because their queue was full or closed.
    pub failed: usize,
}

#[derive(Debug)]
struct Entry {
    session: SessionId,
    outbox: Outbox,
}

impl Entry {
    /// Queue `message` without waiting. `false` means the session must go.
    fn offer(&self, role: Role, message: &ServerMessage) -> bool {
        match self.outbox.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    session = %self.session,
                    %role,
                    kind = message.kind(),
                    "Outbox full, dropping stalled session"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    session = %self.session,
                    %role,
                    kind = message.kind(),
                    "Outbox closed, dropping session"
                );
                false
            }
        }
    }
}

/// Sessions currently connected, grouped by role.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    displays: Vec<Entry>,
    controllers: Vec<Entry>,
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    const fn list(&self, role: Role) -> &Vec<Entry> {
        match role {
            Role::Display => &self.displays,
            Role::Controller => &self.controllers,
        }
    }

    const fn list_mut(&mut self, role: Role) -> &mut Vec<Entry> {
        match role {
            Role::Display => &mut self.displays,
            Role::Controller => &mut self.controllers,
        }
    }

    /// Register `session` under `role`.
    ///
    /// Returns `false` and changes nothing if the session is already
    /// registered (under either role).
    pub fn register(&mut self, session: SessionId, role: Role, outbox: Outbox) -> bool {
        if self.role_of(session).is_some() {
            return false;
        }
        self.list_mut(role).push(Entry { session, outbox });
        debug!(%session, %role, count = self.count(role), "Session registered");
        true
    }

    /// Remove `session`. Returns the role it was registered under, or
    /// `None` if it was not registered.
    pub fn unregister(&mut self, session: SessionId) -> Option<Role> {
        for role in Role::ALL {
            let list = self.list_mut(role);
            if let Some(pos) = list.iter().position(|e| e.session == session) {
                list.remove(pos);
                debug!(%session, %role, count = self.count(role), "Session unregistered");
                return Some(role);
            }
        }
        None
    }

    /// The role `session` is registered under.
    pub fn role_of(&self, session: SessionId) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| self.list(*role).iter().any(|e| e.session == session))
    }

    /// Number of sessions registered under `role`.
    pub fn count(&self, role: Role) -> usize {
        self.list(role).len()
    }

    /// Session ids under `role`, in registration order.
    pub fn sessions(&self, role: Role) -> Vec<SessionId> {
        self.list(role).iter().map(|e| e.session).collect()
    }

    /// Queue `message` for every session of `role`, in registration order.
    ///
    /// A full or closed outbox counts as a failed delivery, removes that
    /// session and does not stop the remaining sends.
    pub fn broadcast(&mut self, role: Role, message: &ServerMessage) -> Delivery {
        let mut delivery = Delivery::default();
        self.list_mut(role).retain(|entry| {
            if entry.offer(role, message) {
                delivery.delivered = delivery.delivered.saturating_add(1);
                true
            } else {
                delivery.failed = delivery.failed.saturating_add(1);
                false
            }
        });
        trace!(%role, kind = message.kind(), delivered = delivery.delivered, "Broadcast");
        delivery
    }

    /// Queue `message` for the earliest registered session of `role` that
    /// accepts it. Returns the session it went to.
    ///
    /// Sessions passed over on the way are removed, as in
    /// [`broadcast`](Self::broadcast).
    pub fn send_first(&mut self, role: Role, message: &ServerMessage) -> Option<SessionId> {
        let mut sent = None;
        self.list_mut(role).retain(|entry| {
            if sent.is_some() {
                return true;
            }
            let accepted = entry.offer(role, message);
            if accepted {
                sent = Some(entry.session);
            }
            accepted
        });
        sent
    }
}
