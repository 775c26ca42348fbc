use acre_core::{ContentSource, OccupantId};
use rand::rngs::StdRng;

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::event::{EventLog, SimEvent, SimEventKind};

/// Everything a pass needs besides the location it is updating.
///
/// Who is watching and which location is active are passed in explicitly;
/// no pass reaches for global state.
pub struct SimContext<'a> {
    /// Frame counter and calendar.
    pub clock: &'a SimClock,
    /// Run configuration.
    pub config: &'a SimConfig,
    /// Seeded generator shared by every pass.
    pub rng: &'a mut StdRng,
    /// Sink for simulation events.
    pub events: &'a mut EventLog,
    /// Map loader for lazy reloads. Without one, dirty maps stay dirty.
    pub content: Option<&'a dyn ContentSource>,
    /// The farmer the frame is rendered for.
    pub viewer: Option<OccupantId>,
    /// Name of the location being viewed.
    pub active_location: Option<&'a str>,
}

impl SimContext<'_> {
    /// Emit a simulation event stamped with the current frame and date.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events.push(SimEvent::new(
            self.clock.frame(),
            self.clock.date(),
            kind,
            description,
        ));
    }

    /// Current frame number.
    pub fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Milliseconds simulated by this frame.
    pub fn elapsed_ms(&self) -> u32 {
        self.config.frame_ms
    }

    /// Whether `location` is the one being viewed.
    pub fn is_active(&self, location: &str) -> bool {
        self.active_location == Some(location)
    }
}
