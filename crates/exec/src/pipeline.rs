use crate::error::Result;
use crate::output::OperatorOutput;

/// OperatorState is the operator lifecycle: created, running, suspended
/// pending an external response, and finally executed. Mirrors
/// `services/collection/executor.cpp`'s `is_executed()`/suspend-plan
/// contract — see `Executor` for how this crate drives it without a real
/// disk/WAL collaborator to suspend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    Created,
    Running,
    Suspended,
    Executed,
}

/// PipelineContext threads the bound parameters (and the owning session
/// id) through one plan's execution.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub session_id: u64,
    pub params: expr::ParamStorage,
}

impl PipelineContext {
    pub fn new(session_id: u64, params: expr::ParamStorage) -> Self {
        PipelineContext { session_id, params }
    }
}

/// Operator is the shared interface every physical-plan node implements:
/// an `on_execute` that may need more than one call to finish, and the
/// terminal output it leaves behind once `state()` reaches `Executed`.
pub trait Operator {
    /// Drives this operator one step forward, returning the state it is
    /// in *after* this call. `Running`/`Suspended` mean `on_execute` must
    /// be called again; `Executed` means `output()` is final.
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState>;

    fn state(&self) -> OperatorState;

    fn output(&self) -> Option<&OperatorOutput>;

    fn take_output(&mut self) -> Option<OperatorOutput>;
}
