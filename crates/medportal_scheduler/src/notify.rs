// --- File: crates/medportal_scheduler/src/notify.rs ---
//! In-process notification relay.
//!
//! Each room is a tokio broadcast channel created on first subscription.
//! Publishing to a room nobody listens to is a no-op.

use medportal_common::models::Identity;
use medportal_common::services::{doctor_room, patient_room, AppointmentEvent, NotificationRelay};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct BroadcastRelay {
    capacity: usize,
    rooms: Mutex<HashMap<String, broadcast::Sender<AppointmentEvent>>>,
}

impl Default for BroadcastRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastRelay {
    /// `capacity` bounds the events buffered per room for slow subscribers.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<AppointmentEvent>>> {
        // A panic while holding the lock cannot leave the map inconsistent
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Join `room`, receiving every event published after this call.
    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<AppointmentEvent> {
        let mut rooms = self.rooms();
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live subscribers in `room`.
    pub fn subscriber_count(&self, room: &str) -> usize {
        self.rooms()
            .get(room)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl NotificationRelay for BroadcastRelay {
    fn publish(&self, room: &str, event: AppointmentEvent) -> usize {
        let mut rooms = self.rooms();
        let Some(sender) = rooms.get(room) else {
            debug!("No subscribers in room {}", room);
            return 0;
        };
        match sender.send(event) {
            Ok(delivered) => {
                debug!("Event delivered to {} subscriber(s) in {}", delivered, room);
                delivered
            }
            Err(_) => {
                // Every receiver is gone
                rooms.remove(room);
                0
            }
        }
    }
}

/// Whether `caller` may subscribe to `room`.
///
/// Only `doctor-{id}` and `patient-{id}` rooms exist. Doctors and patients may
/// join their own; administrators may join any.
pub fn can_join_room(caller: &Identity, room: &str) -> bool {
    let known_room = room
        .strip_prefix("doctor-")
        .or_else(|| room.strip_prefix("patient-"))
        .is_some_and(|id| id.parse::<i64>().is_ok());
    if !known_room {
        return false;
    }
    match *caller {
        Identity::Admin { .. } => true,
        Identity::Doctor { doctor_id } => room == doctor_room(doctor_id),
        Identity::Patient { patient_id } => room == patient_room(patient_id),
    }
}
