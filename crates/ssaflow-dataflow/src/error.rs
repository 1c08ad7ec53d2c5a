use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    /// Returned from a node hook to truncate the current branch.
    #[error("Branch aborted by hook")]
    Abort,

    #[error("Hook error: {0}")]
    Hook(String),

    #[error("IR error: {0}")]
    Ir(#[from] ssaflow_core::IrError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    pub fn is_abort(&self) -> bool {
        matches!(self, FlowError::Abort)
    }

    pub fn hook(message: impl Into<String>) -> Self {
        FlowError::Hook(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
