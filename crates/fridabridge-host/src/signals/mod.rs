//! Signal kinds, subscriber sinks, and the `on(kind, sink)` facade.

mod facade;

pub(crate) use facade::{arm, parse_signal, subscribe};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::types::{Child, FileMonitorEvent, Message, Output, Spawn};

/// Native signals the bridge can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Script `message`.
    Message,
    ChildAdded,
    SpawnAdded,
    Output,
    /// File monitor `change`.
    FileChange,
}

impl EventKind {
    /// Native signal name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::ChildAdded => "child-added",
            EventKind::SpawnAdded => "spawn-added",
            EventKind::Output => "output",
            EventKind::FileChange => "change",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "message" => Some(EventKind::Message),
            "child-added" => Some(EventKind::ChildAdded),
            "spawn-added" => Some(EventKind::SpawnAdded),
            "output" => Some(EventKind::Output),
            "change" => Some(EventKind::FileChange),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded record ready for delivery.
#[derive(Debug, Clone)]
pub enum Record {
    Message(Message),
    Child(Child),
    Spawn(Spawn),
    Output(Output),
    FileChange(FileMonitorEvent),
}

/// Result of offering a record to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Bounded buffer full; the record was dropped.
    Full,
    /// Receiver gone.
    Closed,
    /// Record type does not belong to this sink.
    Mismatch,
}

/// Registered delivery target for one event kind.
///
/// Sinks are bounded channels; delivery uses `try_send` so a slow reader can
/// never stall the dispatcher.
#[derive(Debug, Clone)]
pub enum Sink {
    Message(mpsc::Sender<Message>),
    Child(mpsc::Sender<Child>),
    Spawn(mpsc::Sender<Spawn>),
    Output(mpsc::Sender<Output>),
    FileChange(mpsc::Sender<FileMonitorEvent>),
}

impl Sink {
    pub fn kind(&self) -> EventKind {
        match self {
            Sink::Message(_) => EventKind::Message,
            Sink::Child(_) => EventKind::ChildAdded,
            Sink::Spawn(_) => EventKind::SpawnAdded,
            Sink::Output(_) => EventKind::Output,
            Sink::FileChange(_) => EventKind::FileChange,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Sink::Message(tx) => tx.is_closed(),
            Sink::Child(tx) => tx.is_closed(),
            Sink::Spawn(tx) => tx.is_closed(),
            Sink::Output(tx) => tx.is_closed(),
            Sink::FileChange(tx) => tx.is_closed(),
        }
    }

    pub fn offer(&self, record: Record) -> Delivery {
        match (self, record) {
            (Sink::Message(tx), Record::Message(r)) => offer(tx, r),
            (Sink::Child(tx), Record::Child(r)) => offer(tx, r),
            (Sink::Spawn(tx), Record::Spawn(r)) => offer(tx, r),
            (Sink::Output(tx), Record::Output(r)) => offer(tx, r),
            (Sink::FileChange(tx), Record::FileChange(r)) => offer(tx, r),
            _ => Delivery::Mismatch,
        }
    }
}

fn offer<T>(tx: &mpsc::Sender<T>, value: T) -> Delivery {
    match tx.try_send(value) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Full(_)) => Delivery::Full,
        Err(TrySendError::Closed(_)) => Delivery::Closed,
    }
}

impl From<mpsc::Sender<Message>> for Sink {
    fn from(tx: mpsc::Sender<Message>) -> Self {
        Sink::Message(tx)
    }
}

impl From<mpsc::Sender<Child>> for Sink {
    fn from(tx: mpsc::Sender<Child>) -> Self {
        Sink::Child(tx)
    }
}

impl From<mpsc::Sender<Spawn>> for Sink {
    fn from(tx: mpsc::Sender<Spawn>) -> Self {
        Sink::Spawn(tx)
    }
}

impl From<mpsc::Sender<Output>> for Sink {
    fn from(tx: mpsc::Sender<Output>) -> Self {
        Sink::Output(tx)
    }
}

impl From<mpsc::Sender<FileMonitorEvent>> for Sink {
    fn from(tx: mpsc::Sender<FileMonitorEvent>) -> Self {
        Sink::FileChange(tx)
    }
}
