use std::fmt;

use crate::location::Location;

/// What a scripted sequence wants after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Run the next step within the same frame.
    Continue,
    /// Resume on the next frame.
    Yield,
    /// Done. The sequence is dropped.
    Finished,
}

/// A multi-step sequence driven one step at a time by the frame pass.
///
/// Implementations keep their own resumption cursor; they never block the
/// frame. The sequence is detached from its location while it runs, so it may
/// freely mutate the location through the normal add/remove contract.
pub trait ScriptedSequence: fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Execute the step at the current cursor and advance it.
    fn step(&mut self, location: &mut Location) -> StepOutcome;

    /// Index of the next step to run.
    fn cursor(&self) -> usize;
}
