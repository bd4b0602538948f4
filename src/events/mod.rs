use std::sync::Mutex;

use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::domain::Id;

/// What changed in a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Event {
    PlayerAdded,
    PlayerUpdated,
    PlayerDeleted,
    TeamAdded,
    TeamUpdated,
    TeamDeleted,
    GamesAdded,
    GamesDeleted,
}

/// An event with the affected tournament and a snapshot of the changed data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event: Event,
    pub tournament: Id,
    pub data: Value,
}

impl Notification {
    pub fn new(event: Event, tournament: Id, data: Value) -> Self {
        Self {
            event,
            tournament,
            data,
        }
    }
}

/// Receives notifications once a change is committed
pub trait EventSink: Send + Sync {
    fn dispatch(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn dispatch(&self, notification: Notification) {
        info!(
            "Tournament #{}: {}",
            notification.tournament,
            serde_json::to_string(&notification.event).unwrap_or_default()
        );
    }
}

/// Keeps every notification, in dispatch order
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.notifications().iter().map(|n| n.event).collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn dispatch(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn dispatch(&self, notification: Notification) {
        (**self).dispatch(notification)
    }
}
