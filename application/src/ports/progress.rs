//! Progress notification port
//!
//! Defines the interface for reporting progress during a discussion run.
//! Implementations live with whatever surface embeds the engine.

use conclave_domain::DiscussionPhase;

/// Callback for progress updates during discussion execution
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts, with the number of tasks it will run
    fn on_phase_start(&self, phase: &DiscussionPhase, total_tasks: usize);

    /// Called when one task (usually one role's call) completes
    fn on_task_complete(&self, phase: &DiscussionPhase, role: &str, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &DiscussionPhase);

    /// Called after CONSENSUS_CHECK with the level the round reached
    fn on_consensus_level(&self, _round: usize, _level: f64) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &DiscussionPhase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: &DiscussionPhase, _role: &str, _success: bool) {}
    fn on_phase_complete(&self, _phase: &DiscussionPhase) {}
}
