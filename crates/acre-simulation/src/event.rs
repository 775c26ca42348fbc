use acre_core::LocationEvent;

use crate::clock::GameDate;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEventKind {
    /// Something a location reported about itself.
    Location {
        /// Name of the reporting location.
        location: String,
        /// The lifecycle event.
        event: LocationEvent,
    },
    /// A new day began and the day pass ran.
    DayStarted {
        /// The new date.
        date: GameDate,
    },
    /// The viewer moved to another location.
    ActiveLocationChanged {
        /// Previous active location, if any.
        from: Option<String>,
        /// New active location.
        to: String,
    },
}

impl SimEventKind {
    /// Name of the location the event concerns, if any.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Location { location, .. } => Some(location),
            Self::ActiveLocationChanged { to, .. } => Some(to),
            Self::DayStarted { .. } => None,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The frame during which this event occurred.
    pub frame: u64,
    /// The date on which this event occurred.
    pub date: GameDate,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create an event.
    pub fn new(frame: u64, date: GameDate, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            frame,
            date,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Events in recording order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// All events recorded during the given frame.
    pub fn events_at_frame(&self, frame: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.frame == frame).collect()
    }

    /// All events concerning the named location.
    pub fn events_for_location(&self, name: &str) -> Vec<&SimEvent> {
        self.events
            .iter()
            .filter(|e| e.kind.location() == Some(name))
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
