//! Refresher core: IO-free extraction, resolution, and scheduling logic.
//!
//! The pipeline is `extract_modules` → `resolve_operations`; the refresh loop
//! itself is the pure [`update`] state machine, driven by the engine crate.
mod brackets;
mod effect;
mod literal;
mod modules;
mod msg;
mod operations;
mod state;
mod update;

pub use brackets::{find_matching_brace, StructuralError};
pub use effect::Effect;
pub use literal::{decode_object_literal, quote_bare_keys, DecodeError, DecodedObject};
pub use modules::{extract_modules, ExtractError, ModuleId, ModuleTable};
pub use msg::{CycleOutcome, Msg};
pub use operations::{
    resolve_operations, ApiOperation, OperationDetails, OperationTable, ResolutionError,
};
pub use state::{Phase, SchedulerState, SchedulerStats};
pub use update::update;
