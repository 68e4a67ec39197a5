#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Run one full refresh cycle and report back with `Msg::CycleFinished`.
    RunCycle,
    /// Sleep until the next tick or a stop signal, whichever comes first.
    WaitForTick,
    /// Leave the scheduler loop.
    Shutdown,
}
