mod status;
mod ws;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::{now_millis, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::presence_ws))
        .route("/{id}", get(status::status))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Online,
    Offline,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PresenceRecord {
    pub state: PresenceState,
    pub last_changed: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PresenceEvent {
    pub user_id: String,
    #[serde(flatten)]
    pub record: PresenceRecord,
}

struct Slot {
    sessions: HashSet<Uuid>,
    tx: watch::Sender<PresenceRecord>,
}

impl Slot {
    fn new() -> Slot {
        Slot {
            sessions: HashSet::new(),
            tx: watch::channel(PresenceRecord {
                state: PresenceState::Offline,
                last_changed: now_millis(),
            })
            .0,
        }
    }
}

/// Live presence, kept in process. A user is online iff their set of live
/// session ids is non-empty; each session removes only its own id on
/// disconnect, so one device closing does not take the user offline while
/// another is still connected.
#[derive(Clone)]
pub struct Presence {
    inner: Arc<Mutex<HashMap<String, Slot>>>,
    events: broadcast::Sender<PresenceEvent>,
}

impl Presence {
    pub fn new() -> Presence {
        Presence {
            inner: Arc::new(Mutex::new(HashMap::new())),
            events: broadcast::channel(64).0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.inner.lock().expect("presence registry poisoned")
    }

    fn publish(&self, slot: &Slot, user_id: &str, state: PresenceState) {
        let record = PresenceRecord {
            state,
            last_changed: now_millis(),
        };
        slot.tx.send_replace(record.clone());
        let _ = self.events.send(PresenceEvent {
            user_id: user_id.to_owned(),
            record,
        });
    }

    /// Registers a live session and arms its disconnect handler: dropping
    /// the returned ticket is the offline path, whatever tears the session
    /// down.
    pub fn connect(&self, user_id: &str) -> SessionTicket {
        let session_id = Uuid::now_v7();
        let mut map = self.lock();
        let slot = map.entry(user_id.to_owned()).or_insert_with(Slot::new);
        let was_empty = slot.sessions.is_empty();
        slot.sessions.insert(session_id);
        if was_empty {
            self.publish(slot, user_id, PresenceState::Online);
        }
        SessionTicket {
            presence: self.clone(),
            user_id: user_id.to_owned(),
            session_id,
        }
    }

    fn disconnect(&self, user_id: &str, session_id: Uuid) {
        let mut map = self.lock();
        if let Some(slot) = map.get_mut(user_id) {
            if slot.sessions.remove(&session_id) && slot.sessions.is_empty() {
                self.publish(slot, user_id, PresenceState::Offline);
            }
        }
    }

    /// Proactive offline on explicit sign-out; clears every live session.
    pub fn sign_out(&self, user_id: &str) {
        let mut map = self.lock();
        if let Some(slot) = map.get_mut(user_id) {
            if !slot.sessions.is_empty() {
                slot.sessions.clear();
                self.publish(slot, user_id, PresenceState::Offline);
            }
        }
    }

    /// The read model: the current record right away, then every change.
    /// Dropping the receiver is the teardown.
    pub fn subscribe(&self, user_id: &str) -> watch::Receiver<PresenceRecord> {
        let mut map = self.lock();
        map.entry(user_id.to_owned())
            .or_insert_with(Slot::new)
            .tx
            .subscribe()
    }

    pub fn snapshot(&self, user_id: &str) -> PresenceRecord {
        let map = self.lock();
        map.get(user_id)
            .map(|slot| slot.tx.borrow().clone())
            .unwrap_or(PresenceRecord {
                state: PresenceState::Offline,
                last_changed: 0,
            })
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.snapshot(user_id).state == PresenceState::Online
    }

    pub fn events(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }
}

impl Default for Presence {
    fn default() -> Presence {
        Presence::new()
    }
}

pub struct SessionTicket {
    presence: Presence,
    user_id: String,
    session_id: Uuid,
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        self.presence.disconnect(&self.user_id, self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn online_then_disconnect_observed_in_order() {
        let presence = Presence::new();
        let mut rx = presence.subscribe("u1");
        assert_eq!(rx.borrow_and_update().state, PresenceState::Offline);

        let ticket = presence.connect("u1");
        rx.changed().await.unwrap();
        let online = rx.borrow_and_update().clone();
        assert_eq!(online.state, PresenceState::Online);

        drop(ticket);
        rx.changed().await.unwrap();
        let offline = rx.borrow_and_update().clone();
        assert_eq!(offline.state, PresenceState::Offline);
        assert!(offline.last_changed >= online.last_changed);
    }

    #[tokio::test]
    async fn second_device_keeps_user_online() {
        let presence = Presence::new();
        let first = presence.connect("u1");
        let second = presence.connect("u1");
        assert!(presence.is_online("u1"));

        drop(first);
        assert!(presence.is_online("u1"));

        drop(second);
        assert!(!presence.is_online("u1"));
    }

    #[tokio::test]
    async fn sign_out_clears_every_session() {
        let presence = Presence::new();
        let _first = presence.connect("u1");
        let _second = presence.connect("u1");

        presence.sign_out("u1");
        assert!(!presence.is_online("u1"));

        // the tickets' later drops must not resurrect or re-publish
        drop(_first);
        drop(_second);
        assert!(!presence.is_online("u1"));
    }

    #[tokio::test]
    async fn subscribe_sees_current_state_immediately() {
        let presence = Presence::new();
        let _ticket = presence.connect("u1");
        let rx = presence.subscribe("u1");
        assert_eq!(rx.borrow().state, PresenceState::Online);
    }

    #[tokio::test]
    async fn unknown_user_snapshots_offline() {
        let presence = Presence::new();
        assert!(!presence.is_online("nobody"));
    }

    #[tokio::test]
    async fn transitions_fan_out_on_the_event_feed() {
        let presence = Presence::new();
        let mut events = presence.events();

        let ticket = presence.connect("u1");
        drop(ticket);

        let online = events.recv().await.unwrap();
        assert_eq!(online.user_id, "u1");
        assert_eq!(online.record.state, PresenceState::Online);

        let offline = events.recv().await.unwrap();
        assert_eq!(offline.record.state, PresenceState::Offline);
    }
}
