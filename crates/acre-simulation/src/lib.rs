//! Tick scheduling for acre locations.
//!
//! A [`Simulation`] owns a [`acre_core::World`] plus the clock, seeded RNG and
//! event log. Every frame it runs the full pass for the viewed location and
//! the background pass for everything loaded; each night it runs the ordered
//! [`DayUpdatePass`] over every location and building interior.

/// In-game calendar and time of day.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Borrowed state handed to every pass.
pub mod context;
/// The ordered once-per-day pass and its steps.
pub mod day;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// The current-location and background frame passes.
pub mod frame;
/// Command-list scripted sequences.
pub mod script;
/// Top-level simulation orchestrator.
pub mod simulation;

/// Re-exports of [`clock::GameDate`] and [`clock::SimClock`].
pub use clock::{GameDate, SimClock};
/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of [`day::DayStep`] and [`day::DayUpdatePass`].
pub use day::{DayStep, DayUpdatePass};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::SimEvent`], and [`event::SimEventKind`].
pub use event::{EventLog, SimEvent, SimEventKind};
/// Re-exports of [`script::CommandScript`] and [`script::ScriptCommand`].
pub use script::{CommandScript, ScriptCommand};
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
