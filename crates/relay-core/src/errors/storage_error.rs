/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to save {entity}: {reason}")]
    SaveFailed { entity: String, reason: String },

    #[error("failed to update {entity} {id}: {reason}")]
    UpdateFailed {
        entity: String,
        id: String,
        reason: String,
    },

    #[error("failed to load {entity}: {reason}")]
    LoadFailed { entity: String, reason: String },
}
