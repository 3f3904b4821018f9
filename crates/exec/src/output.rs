use vector::DataChunk;

/// OperatorOutput is what one operator hands its parent: a columnar batch
/// for the document-table/columns storage kinds, or a plain row of
/// documents for collections kept as loose documents.
#[derive(Debug, Clone)]
pub enum OperatorOutput {
    Chunk(DataChunk),
    Documents(Vec<serde_json::Value>),
}

impl OperatorOutput {
    pub fn chunk(&self) -> Option<&DataChunk> {
        match self {
            OperatorOutput::Chunk(c) => Some(c),
            OperatorOutput::Documents(_) => None,
        }
    }

    pub fn into_chunk(self) -> Option<DataChunk> {
        match self {
            OperatorOutput::Chunk(c) => Some(c),
            OperatorOutput::Documents(_) => None,
        }
    }

    pub fn documents(&self) -> Option<&[serde_json::Value]> {
        match self {
            OperatorOutput::Documents(d) => Some(d),
            OperatorOutput::Chunk(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OperatorOutput::Chunk(c) => c.cardinality() == 0,
            OperatorOutput::Documents(d) => d.is_empty(),
        }
    }
}
