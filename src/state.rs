use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::admission::{Admission, AdmissionFlag};
use crate::room::{ConnId, Member, Room};

const MAX_LOG: usize = 10;

/// Shared server state. Cloning hands out another handle to the same
/// registry, admission flag and event log.
#[derive(Clone, Default)]
pub struct ServerState {
    shared: Arc<Shared>,
}

struct Shared {
    // One lock orders every membership mutation. Held only for the
    // mutation itself; message delivery under it is a channel send,
    // never socket I/O.
    rooms: Mutex<HashMap<String, Room>>,
    admission: AdmissionFlag,
    running: AtomicBool,
    next_conn_id: AtomicU64,
    events: Mutex<VecDeque<String>>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            admission: AdmissionFlag::default(),
            running: AtomicBool::new(true),
            next_conn_id: AtomicU64::new(1),
            events: Mutex::new(VecDeque::new()),
        }
    }
}

impl ServerState {
    pub fn next_conn_id(&self) -> ConnId {
        self.shared.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn admission(&self) -> Admission {
        self.shared.admission.get()
    }

    pub fn set_admission(&self, state: Admission) {
        self.shared.admission.set(state);
    }

    /// False once a full shutdown has been requested.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Relaxed)
    }

    /// Registers a member, creating the room on first join.
    pub fn join(&self, pin: &str, member: Member) {
        let name = member.name().to_string();

        {
            let mut rooms = self.shared.rooms.lock().unwrap();
            rooms.entry(pin.to_string()).or_default().add(member);
        }

        self.push_event(format!("{} joined room {}", name, pin));
    }

    /// Deregisters a member by connection id. Returns false if it was
    /// already gone (evicted, or its room was closed).
    pub fn leave(&self, pin: &str, id: ConnId) -> bool {
        let removed = {
            let mut rooms = self.shared.rooms.lock().unwrap();

            let Some(room) = rooms.get_mut(pin) else {
                return false;
            };

            let removed = room.remove(id);
            if room.is_empty() {
                rooms.remove(pin);
            }

            removed
        };

        match removed {
            Some(member) => {
                self.push_event(format!("{} left room {}", member.name(), pin));
                true
            }
            None => false,
        }
    }

    /// Queues `msg` for every current member of `pin` except `skip`.
    /// Members whose handler is gone are pruned on the way.
    pub fn broadcast(&self, pin: &str, msg: &str, skip: Option<ConnId>) {
        let mut rooms = self.shared.rooms.lock().unwrap();

        if let Some(room) = rooms.get_mut(pin) {
            room.deliver(msg, skip);
            if room.is_empty() {
                rooms.remove(pin);
            }
        }
    }

    /// Notifies every member and drops the room. False if the PIN is unknown.
    pub fn close_room(&self, pin: &str) -> bool {
        let room = self.shared.rooms.lock().unwrap().remove(pin);

        match room {
            Some(mut room) => {
                room.deliver("[server] The room has been closed.", None);
                self.push_event(format!("Room {} closed", pin));
                true
            }
            None => false,
        }
    }

    /// Kicks the first member named `name` out of `pin`. The victim gets a
    /// notice; its handler announces the departure when it tears down.
    pub fn evict(&self, pin: &str, name: &str) -> bool {
        let member = {
            let mut rooms = self.shared.rooms.lock().unwrap();

            let Some(room) = rooms.get_mut(pin) else {
                return false;
            };

            let member = room.remove_by_name(name);
            if room.is_empty() {
                rooms.remove(pin);
            }

            member
        };

        match member {
            Some(member) => {
                member.send("[server] You have been kicked from the room.");
                self.push_event(format!("{} kicked from room {}", name, pin));
                true
            }
            None => false,
        }
    }

    /// PIN and member names per room, sorted by PIN.
    pub fn list_rooms(&self) -> Vec<(String, Vec<String>)> {
        let rooms = self.shared.rooms.lock().unwrap();

        let mut listing: Vec<_> = rooms
            .iter()
            .map(|(pin, room)| (pin.clone(), room.names()))
            .collect();

        listing.sort_by(|a, b| a.0.cmp(&b.0));
        listing
    }

    /// Full shutdown: stop accepting and drop every member. Handlers
    /// observe their queue closing and tear down without a notice.
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
        self.shared.rooms.lock().unwrap().clear();
        self.push_event("Server shut down".to_string());
    }

    pub fn push_event(&self, entry: String) {
        let mut events = self.shared.events.lock().unwrap();

        if events.len() == MAX_LOG {
            events.pop_front();
        }
        events.push_back(entry);
    }

    /// Logged events, oldest first.
    pub fn recent_events(&self) -> Vec<String> {
        self.shared.events.lock().unwrap().iter().cloned().collect()
    }
}
