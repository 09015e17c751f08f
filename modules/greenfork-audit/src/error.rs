#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The repair-planner response could not be validated against the
    /// requested fields. Skips that recipe's repair pass; never aborts a scan.
    #[error("patch response unparsable: {0}")]
    PatchParse(String),

    #[error("text generation failed: {0}")]
    Generation(#[from] ai_client::AiError),

    #[error("store error: {0}")]
    Store(#[from] greenfork_store::StoreError),
}
