use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use std::cell::RefCell;
use std::rc::Rc;

/// Insert runs one batch of documents through `TableStorage::prepare_insert`
/// (schema inference/evolution included) and appends the resulting chunk
/// into the backing table in a single pass.
pub struct Insert {
    table_storage: Rc<RefCell<schema::TableStorage>>,
    documents: Vec<Option<serde_json::Value>>,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl Insert {
    pub fn new(table_storage: Rc<RefCell<schema::TableStorage>>, documents: Vec<Option<serde_json::Value>>) -> Self {
        Insert { table_storage, documents, state: OperatorState::Created, output: None }
    }
}

impl Operator for Insert {
    fn on_execute(&mut self, _ctx: &mut PipelineContext) -> Result<OperatorState> {
        let mut storage = self.table_storage.borrow_mut();
        let chunk = storage.prepare_insert(&self.documents)?;
        let mut append_state = storage.table_mut().initialize_append();
        if let Err(err) = storage.table_mut().append(&mut append_state, &chunk) {
            tracing::warn!(error = %err, "reverting partial append after storage failure");
            storage.table_mut().revert_append(append_state);
            return Err(err.into());
        }
        storage.table_mut().finalize_append(append_state);
        tracing::info!(rows = chunk.cardinality(), "insert operator finished");
        self.output = Some(OperatorOutput::Chunk(chunk));
        self.state = OperatorState::Executed;
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

#[cfg(test)]
mod tests {
    use super::*;
    use expr::ParamStorage;
    use schema::ExtractConfig;
    use serde_json::json;

    #[test]
    fn inserts_rows_and_evolves_schema() {
        let table_storage = Rc::new(RefCell::new(schema::TableStorage::new(ExtractConfig::default())));
        let docs = vec![Some(json!({"name": "ada", "rating": 5})), Some(json!({"name": "grace", "rating": 9}))];
        let mut insert = Insert::new(table_storage.clone(), docs);
        let mut ctx = PipelineContext::new(1, ParamStorage::default());

        assert_eq!(insert.on_execute(&mut ctx).unwrap(), OperatorState::Executed);
        let out = insert.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 2);
        assert_eq!(table_storage.borrow().table().row_count(), 2);
    }
}
