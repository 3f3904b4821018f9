use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use vector::DataChunk;

/// RawData is a leaf operator that simply hands a pre-built chunk
/// downstream once — the source for INSERT's VALUES rows and for tests
/// that want to seed a plan without a backing table.
pub struct RawData {
    chunk: Option<DataChunk>,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl RawData {
    pub fn new(chunk: DataChunk) -> Self {
        RawData { chunk: Some(chunk), state: OperatorState::Created, output: None }
    }
}

impl Operator for RawData {
    fn on_execute(&mut self, _ctx: &mut PipelineContext) -> Result<OperatorState> {
        if self.state != OperatorState::Executed {
            let chunk = self.chunk.take().unwrap_or_else(|| DataChunk::new(&[], 0));
            self.output = Some(OperatorOutput::Chunk(chunk));
            self.state = OperatorState::Executed;
        }
        Ok(self.state)
    }

    fn state(&self) -> OperatorState {
        self.state
    }

    fn output(&self) -> Option<&OperatorOutput> {
        self.output.as_ref()
    }

    fn take_output(&mut self) -> Option<OperatorOutput> {
        self.output.take()
    }
}
