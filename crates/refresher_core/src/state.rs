#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Refreshing,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    pub phase: Phase,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub consecutive_failures: u32,
    pub last_module_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerState {
    phase: Phase,
    stop_pending: bool,
    successful_cycles: u64,
    failed_cycles: u64,
    consecutive_failures: u32,
    last_module_count: Option<usize>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stop_pending(&self) -> bool {
        self.stop_pending
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            phase: self.phase,
            successful_cycles: self.successful_cycles,
            failed_cycles: self.failed_cycles,
            consecutive_failures: self.consecutive_failures,
            last_module_count: self.last_module_count,
        }
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.phase = Phase::Refreshing;
    }

    pub(crate) fn request_stop(&mut self) {
        self.stop_pending = true;
    }

    pub(crate) fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    pub(crate) fn record_success(&mut self, modules: usize) {
        self.successful_cycles += 1;
        self.consecutive_failures = 0;
        self.last_module_count = Some(modules);
        self.phase = Phase::Idle;
    }

    pub(crate) fn abandon_cycle(&mut self) {
        self.phase = Phase::Idle;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_cycles += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.phase = Phase::Idle;
    }
}
