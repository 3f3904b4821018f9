/// Error is the operator/executor layer's failure taxonomy: every
/// lower-crate error, plus the conditions that belong to this layer alone.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] schema::Error),

    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error(transparent)]
    Vector(#[from] vector::Error),

    #[error(transparent)]
    Value(#[from] value::Error),

    #[error(transparent)]
    Expr(#[from] expr::Error),

    #[error("the collection backing this plan was dropped mid-execution")]
    CollectionDropped,

    #[error("failed to create a physical plan: {0}")]
    CreatePhysicalPlanError(String),

    #[error("{0}")]
    OtherError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
