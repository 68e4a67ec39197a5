use crate::{CycleOutcome, Effect, Msg, Phase, SchedulerState};

/// Pure scheduler transition: applies a message to state and returns any effects.
///
/// Idle and Refreshing are the only live phases. A stop that arrives while a
/// cycle is in flight is parked until that cycle reports back.
pub fn update(mut state: SchedulerState, msg: Msg) -> (SchedulerState, Vec<Effect>) {
    let effects = match (state.phase(), msg) {
        (Phase::Stopped, _) => Vec::new(),
        (Phase::Idle, Msg::StartRequested | Msg::TimerElapsed) => {
            state.begin_cycle();
            vec![Effect::RunCycle]
        }
        (Phase::Idle, Msg::StopRequested) => {
            state.stop();
            vec![Effect::Shutdown]
        }
        (Phase::Refreshing, Msg::StopRequested) => {
            state.request_stop();
            Vec::new()
        }
        (Phase::Refreshing, Msg::CycleFinished(outcome)) => {
            match outcome {
                CycleOutcome::Succeeded { modules } => state.record_success(modules),
                CycleOutcome::Failed => state.record_failure(),
                CycleOutcome::Skipped => state.abandon_cycle(),
            }
            if state.stop_pending() {
                state.stop();
                vec![Effect::Shutdown]
            } else {
                vec![Effect::WaitForTick]
            }
        }
        // Never start a second cycle while one is running; stale completions are dropped.
        (Phase::Refreshing, Msg::StartRequested | Msg::TimerElapsed)
        | (Phase::Idle, Msg::CycleFinished(_)) => Vec::new(),
    };

    (state, effects)
}
