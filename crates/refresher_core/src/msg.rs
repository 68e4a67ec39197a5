#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Explicit start: run a cycle now.
    StartRequested,
    /// The refresh interval ran out while idle.
    TimerElapsed,
    /// Graceful shutdown was requested.
    StopRequested,
    /// The in-flight cycle returned.
    CycleFinished(CycleOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded { modules: usize },
    Failed,
    /// A stop arrived before the cycle did any work.
    Skipped,
}
