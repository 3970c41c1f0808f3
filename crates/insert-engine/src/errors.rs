use promptdock_core_types::DockError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("trigger not present in composer text")]
    TriggerMissing,
    #[error("rich-text insertion is not implemented")]
    RichTextUnsupported,
    #[error("composer is detached")]
    Detached,
    #[error("page write failed: {0}")]
    Write(String),
}

impl From<InsertError> for DockError {
    fn from(err: InsertError) -> Self {
        DockError::new(err.to_string())
    }
}
