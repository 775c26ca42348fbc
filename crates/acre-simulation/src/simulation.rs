use acre_core::world::World;
use acre_core::{ContentSource, CoreError, Location, OccupantId};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::day::DayUpdatePass;
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEvent, SimEventKind};
use crate::frame;

/// The top-level simulation orchestrator.
///
/// Owns the world, clock, RNG and event log. Each frame runs the full pass
/// for the active location and the background pass for every loaded
/// location; [`Simulation::end_day`] rolls the calendar and runs the day pass
/// everywhere.
pub struct Simulation {
    world: World,
    clock: SimClock,
    rng: StdRng,
    events: EventLog,
    config: SimConfig,
    day_pass: DayUpdatePass,
    active: Option<String>,
    viewer: Option<OccupantId>,
    content: Option<Box<dyn ContentSource>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.clock.frame())
            .field("date", &self.clock.date())
            .field("active", &self.active)
            .field("locations", &self.world.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Simulation {
    /// Create a new simulation from a world and configuration.
    pub fn new(world: World, config: SimConfig) -> Self {
        let clock = SimClock::new(config.start_date, config.ms_per_ten_minutes);
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        Self {
            world,
            clock,
            rng,
            events,
            config,
            day_pass: DayUpdatePass::standard(),
            active: None,
            viewer: None,
            content: None,
        }
    }

    /// Attach a map loader for lazy reloads of dirty maps.
    pub fn with_content(mut self, content: impl ContentSource + 'static) -> Self {
        self.content = Some(Box::new(content));
        self
    }

    /// Replace the day pass, e.g. with a custom step order.
    pub fn with_day_pass(mut self, pass: DayUpdatePass) -> Self {
        self.day_pass = pass;
        self
    }

    /// Make a location the one being viewed. Interiors count.
    pub fn set_active_location(&mut self, name: &str) -> SimResult<()> {
        if self.world.find(name).is_none() {
            return Err(CoreError::LocationNotFound(name.to_string()).into());
        }
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }
        let from = self.active.replace(name.to_string());
        tracing::info!(from = ?from, to = name, "active_location_changed");
        let description = format!("viewing {name}");
        self.events.push(SimEvent::new(
            self.clock.frame(),
            self.clock.date(),
            SimEventKind::ActiveLocationChanged {
                from,
                to: name.to_string(),
            },
            description,
        ));
        Ok(())
    }

    /// Name of the location being viewed.
    pub fn active_location_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The location being viewed.
    pub fn active_location(&self) -> SimResult<&Location> {
        let name = self.active.as_deref().ok_or(SimError::NoActiveLocation)?;
        self.world
            .find(name)
            .ok_or_else(|| CoreError::LocationNotFound(name.to_string()).into())
    }

    /// The farmer frames are rendered for.
    pub fn set_viewer(&mut self, viewer: Option<OccupantId>) {
        self.viewer = viewer;
    }

    /// Hold time of day.
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Let time of day run again.
    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Advance the simulation by one frame.
    pub fn frame(&mut self) {
        let Self {
            world,
            clock,
            rng,
            events,
            config,
            active,
            viewer,
            content,
            ..
        } = self;
        clock.advance_frame(config.frame_ms);

        let mut ctx = SimContext {
            clock,
            config,
            rng,
            events,
            content: content.as_deref(),
            viewer: *viewer,
            active_location: active.as_deref(),
        };
        if let Some(name) = active.as_deref() {
            match world.find_mut(name) {
                Some(location) => {
                    frame::update_when_current(location, &mut ctx);
                }
                None => tracing::warn!(location = name, "active_location_missing"),
            }
        }
        for location in world.iter_mut() {
            frame::update_background(location, &mut ctx);
        }
        self.drain_location_events();
    }

    /// Advance the simulation by `n` frames.
    pub fn run_frames(&mut self, n: u64) {
        for _ in 0..n {
            self.frame();
        }
    }

    /// Roll over to the next morning and run the day pass on every location.
    pub fn end_day(&mut self) -> SimResult<()> {
        let date = self.clock.advance_day();
        let Self {
            world,
            clock,
            rng,
            events,
            config,
            active,
            viewer,
            content,
            day_pass,
            ..
        } = self;
        let mut ctx = SimContext {
            clock,
            config,
            rng,
            events,
            content: content.as_deref(),
            viewer: *viewer,
            active_location: active.as_deref(),
        };
        for location in world.iter_mut() {
            day_pass.run(location, &mut ctx)?;
        }
        self.drain_location_events();
        tracing::info!(%date, "day_started");
        self.events.push(SimEvent::new(
            self.clock.frame(),
            date,
            SimEventKind::DayStarted { date },
            format!("{date} begins"),
        ));
        Ok(())
    }

    /// Run `n` days back to back.
    pub fn run_days(&mut self, n: u32) -> SimResult<()> {
        for _ in 0..n {
            self.end_day()?;
        }
        Ok(())
    }

    fn drain_location_events(&mut self) {
        for location in self.world.iter_mut() {
            drain_events(location, &self.clock, &mut self.events);
        }
    }

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The simulated world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Frame counter and calendar.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Recorded events.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> World {
        self.world
    }

    /// Frames simulated so far.
    pub fn current_frame(&self) -> u64 {
        self.clock.frame()
    }
}

fn drain_events(location: &mut Location, clock: &SimClock, log: &mut EventLog) {
    let name = location.name().to_string();
    for event in location.drain_events() {
        let description = event.to_string();
        log.push(SimEvent::new(
            clock.frame(),
            clock.date(),
            SimEventKind::Location {
                location: name.clone(),
                event,
            },
            description,
        ));
    }
    for building in location.buildings_mut() {
        if let Some(interior) = building.interior_mut() {
            drain_events(interior, clock, log);
        }
    }
}
